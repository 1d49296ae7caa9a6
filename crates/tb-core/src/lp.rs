//! Linear program description and solver seam.
//!
//! Balancers describe their program with [`LinearProblem`] (bounded
//! variables, range constraints, a linear objective) and hand it to an
//! [`LpSolver`]. [`GoodLpSolver`] solves it with `good_lp`'s pure-Rust
//! `microlp` backend; tests substitute their own solvers.

use good_lp::{
    Expression, ProblemVariables, Solution, SolverModel, Variable, constraint, default_solver,
    variable,
};

/// Handle to a variable of a [`LinearProblem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(usize);

impl VarId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Handle to a range constraint of a [`LinearProblem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstraintId(usize);

/// Optimisation direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Sense {
    #[default]
    Minimize,
    Maximize,
}

/// Inclusive bounds of a variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

/// `lower <= sum(coefficient * variable) <= upper`.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeConstraint {
    pub lower: f64,
    pub upper: f64,
    pub coefficients: Vec<(VarId, f64)>,
}

/// A bounded-variable linear program with range constraints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearProblem {
    variables: Vec<Bounds>,
    objective: Vec<f64>,
    constraints: Vec<RangeConstraint>,
    sense: Sense,
}

impl LinearProblem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable with `lower <= x <= upper` and a zero objective
    /// coefficient.
    pub fn add_variable(&mut self, lower: f64, upper: f64) -> VarId {
        self.variables.push(Bounds { lower, upper });
        self.objective.push(0.0);
        VarId(self.variables.len() - 1)
    }

    /// Adds an empty constraint `lower <= 0 <= upper`; fill it with
    /// [`set_coefficient`](Self::set_coefficient).
    pub fn add_range_constraint(&mut self, lower: f64, upper: f64) -> ConstraintId {
        self.constraints.push(RangeConstraint {
            lower,
            upper,
            coefficients: Vec::new(),
        });
        ConstraintId(self.constraints.len() - 1)
    }

    /// Sets the coefficient of `var` in `constraint`, replacing any earlier
    /// value.
    pub fn set_coefficient(&mut self, constraint: ConstraintId, var: VarId, coefficient: f64) {
        let coefficients = &mut self.constraints[constraint.0].coefficients;
        if let Some(entry) = coefficients.iter_mut().find(|(v, _)| *v == var) {
            entry.1 = coefficient;
        } else {
            coefficients.push((var, coefficient));
        }
    }

    pub fn set_objective_coefficient(&mut self, var: VarId, coefficient: f64) {
        self.objective[var.0] = coefficient;
    }

    pub fn minimize(&mut self) {
        self.sense = Sense::Minimize;
    }

    pub fn maximize(&mut self) {
        self.sense = Sense::Maximize;
    }

    pub fn variables(&self) -> &[Bounds] {
        &self.variables
    }

    pub fn constraints(&self) -> &[RangeConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &[f64] {
        &self.objective
    }

    pub const fn sense(&self) -> Sense {
        self.sense
    }
}

/// Result of solving a [`LinearProblem`].
#[derive(Debug, Clone, PartialEq)]
pub enum LpOutcome {
    /// One value per variable, indexed by [`VarId::index`].
    Optimal(Vec<f64>),
    /// No valid solution; carries the solver's reason.
    Infeasible(String),
}

/// Something that can solve a [`LinearProblem`].
pub trait LpSolver: Send + Sync {
    fn solve(&self, problem: &LinearProblem) -> LpOutcome;
}

/// [`LpSolver`] backed by `good_lp`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoodLpSolver;

impl LpSolver for GoodLpSolver {
    fn solve(&self, problem: &LinearProblem) -> LpOutcome {
        let mut vars = ProblemVariables::new();
        let handles: Vec<Variable> = problem
            .variables()
            .iter()
            .map(|bounds| vars.add(variable().min(bounds.lower).max(bounds.upper)))
            .collect();

        let objective = handles
            .iter()
            .zip(problem.objective())
            .fold(Expression::from(0.0), |acc, (var, coefficient)| {
                acc + *coefficient * *var
            });

        let mut model = match problem.sense() {
            Sense::Minimize => vars.minimise(objective),
            Sense::Maximize => vars.maximise(objective),
        }
        .using(default_solver);

        for range in problem.constraints() {
            let expr = range
                .coefficients
                .iter()
                .fold(Expression::from(0.0), |acc, (var, coefficient)| {
                    acc + *coefficient * handles[var.0]
                });
            let (lower, upper) = (range.lower, range.upper);
            model = model
                .with(constraint!(expr.clone() >= lower))
                .with(constraint!(expr <= upper));
        }

        match model.solve() {
            Ok(solution) => {
                LpOutcome::Optimal(handles.iter().map(|v| solution.value(*v)).collect())
            }
            Err(err) => LpOutcome::Infeasible(err.to_string()),
        }
    }
}
