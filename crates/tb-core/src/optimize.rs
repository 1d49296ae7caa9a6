//! Linear-programming balancer.
//!
//! For ticket `i` with real time `R`, estimate `E` and padding `f`:
//!
//! ```text
//!            0 <= f <= (1 + s)(E - R)    if E - R > 0
//!     -d * R     <= f <= 0               otherwise
//!
//!     W - sum(R) <= sum(f) <= one week
//!     minimise sum(f)
//! ```
//!
//! where `d` is the maximum discount, `s` the maximum slack and `W` the
//! weekly target. Minimising `sum(f)` is a linear stand-in for keeping each
//! `E / (R + f)` close to 1 while reaching the target. The bounds can be
//! jointly infeasible (every ticket already over its estimate and too little
//! slack), in which case the fallback balancer answers instead.
//!
//! Solved paddings are snapped up to the next grid step, so the floor still
//! holds and the report keeps the same granularity as the heuristic. Snapping
//! can exceed a ticket's upper bound by less than one step.

use std::fmt;

use crate::balance::{BalanceError, Balancer, PaddingAllocation, validate_tickets};
use crate::lp::{GoodLpSolver, LinearProblem, LpOutcome, LpSolver};
use crate::rounding::Grid;
use crate::ticket::Ticket;
use crate::time::{Minutes, WEEK_MINUTES};

/// Values within this distance of a whole minute are treated as that minute.
const MINUTE_TOLERANCE: f64 = 1e-6;

/// LP-based balancer with a mandatory fallback strategy.
pub struct OptimizingBalancer<S = GoodLpSolver> {
    /// Largest fraction of a ticket's real time that may be discounted.
    pub max_discount: f64,
    /// Extra fraction over the estimate gap that a ticket may be padded.
    pub max_slack: f64,
    /// Grid the solved paddings are snapped to.
    pub grid: Grid,
    solver: S,
    fallback: Box<dyn Balancer>,
}

impl<S> fmt::Debug for OptimizingBalancer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimizingBalancer")
            .field("max_discount", &self.max_discount)
            .field("max_slack", &self.max_slack)
            .field("grid", &self.grid)
            .finish_non_exhaustive()
    }
}

impl OptimizingBalancer<GoodLpSolver> {
    /// Creates a balancer solved by `good_lp`.
    pub fn new(
        max_discount: f64,
        max_slack: f64,
        grid: Grid,
        fallback: Box<dyn Balancer>,
    ) -> Self {
        Self::with_solver(max_discount, max_slack, grid, GoodLpSolver, fallback)
    }
}

impl<S: LpSolver> OptimizingBalancer<S> {
    pub fn with_solver(
        max_discount: f64,
        max_slack: f64,
        grid: Grid,
        solver: S,
        fallback: Box<dyn Balancer>,
    ) -> Self {
        Self {
            max_discount,
            max_slack,
            grid,
            solver,
            fallback,
        }
    }

    /// Builds the program; variable `i` is the padding of `tickets[i]`.
    #[allow(clippy::cast_precision_loss)]
    fn build_problem(&self, tickets: &[Ticket], weekly_target: Minutes) -> LinearProblem {
        let real_sum: Minutes = tickets.iter().map(|t| t.real).sum();

        let mut problem = LinearProblem::new();
        let floor = problem.add_range_constraint(
            (weekly_target - real_sum) as f64,
            WEEK_MINUTES as f64,
        );

        for ticket in tickets {
            let gap = (ticket.estimated - ticket.real) as f64;
            let var = if gap > 0.0 {
                problem.add_variable(0.0, (1.0 + self.max_slack) * gap)
            } else {
                problem.add_variable(-(ticket.real as f64) * self.max_discount, 0.0)
            };
            problem.set_objective_coefficient(var, 1.0);
            problem.set_coefficient(floor, var, 1.0);
        }

        problem.minimize();
        problem
    }
}

/// Converts an LP value to whole minutes, rounding up so the floor
/// constraint still holds.
#[allow(clippy::cast_possible_truncation)]
fn to_minutes(value: f64) -> Minutes {
    (value - MINUTE_TOLERANCE).ceil() as Minutes
}

impl<S: LpSolver> Balancer for OptimizingBalancer<S> {
    fn balance(
        &self,
        tickets: &[Ticket],
        weekly_target: Minutes,
    ) -> Result<Vec<PaddingAllocation>, BalanceError> {
        validate_tickets(tickets)?;

        let problem = self.build_problem(tickets, weekly_target);
        let values = match self.solver.solve(&problem) {
            LpOutcome::Optimal(values)
                if values.len() == tickets.len() && values.iter().all(|v| v.is_finite()) =>
            {
                values
            }
            LpOutcome::Optimal(values) => {
                tracing::warn!(
                    expected = tickets.len(),
                    got = values.len(),
                    "solver returned an invalid solution; using fallback balancer"
                );
                return self.fallback.balance(tickets, weekly_target);
            }
            LpOutcome::Infeasible(reason) => {
                tracing::warn!(%reason, "padding program infeasible; using fallback balancer");
                return self.fallback.balance(tickets, weekly_target);
            }
        };

        let paddings: Vec<PaddingAllocation> = tickets
            .iter()
            .zip(values)
            .map(|(ticket, value)| {
                let fake = self.grid.ceil_to_step(to_minutes(value)).max(-ticket.real);
                PaddingAllocation::new(ticket.name.clone(), fake)
            })
            .collect();

        tracing::debug!(weekly_target, ?paddings, "optimizing balance");
        Ok(paddings)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::balance::HeuristicBalancer;

    /// Solver that never finds a solution.
    struct InfeasibleSolver;

    impl LpSolver for InfeasibleSolver {
        fn solve(&self, _problem: &LinearProblem) -> LpOutcome {
            LpOutcome::Infeasible("no solution".to_string())
        }
    }

    /// Solver that returns fixed values and keeps the last problem it saw.
    struct FixedSolver {
        values: Vec<f64>,
        seen: Mutex<Option<LinearProblem>>,
    }

    impl FixedSolver {
        fn new(values: Vec<f64>) -> Self {
            Self {
                values,
                seen: Mutex::new(None),
            }
        }
    }

    impl LpSolver for FixedSolver {
        fn solve(&self, problem: &LinearProblem) -> LpOutcome {
            *self.seen.lock().unwrap() = Some(problem.clone());
            LpOutcome::Optimal(self.values.clone())
        }
    }

    fn heuristic() -> Box<dyn Balancer> {
        Box::new(HeuristicBalancer::default())
    }

    fn scenario_tickets() -> Vec<Ticket> {
        vec![
            Ticket::new("TicketA", 60, 60),
            Ticket::new("TicketB", 90, 120),
            Ticket::new("TicketC", 150, 60),
            Ticket::new("TicketD", 75, 60),
        ]
    }

    #[test]
    fn test_infeasible_solver_returns_fallback_result() {
        let tickets = scenario_tickets();
        let balancer = OptimizingBalancer::with_solver(
            0.75,
            0.25,
            Grid::default(),
            InfeasibleSolver,
            heuristic(),
        );

        let result = balancer.balance(&tickets, 480).unwrap();

        assert_eq!(result, HeuristicBalancer::default().balance(&tickets, 480).unwrap());
    }

    #[test]
    fn test_malformed_solution_returns_fallback_result() {
        let tickets = scenario_tickets();
        let solver = FixedSolver::new(vec![1.0]);
        let balancer =
            OptimizingBalancer::with_solver(0.75, 0.25, Grid::default(), solver, heuristic());

        let result = balancer.balance(&tickets, 480).unwrap();

        assert_eq!(result, HeuristicBalancer::default().balance(&tickets, 480).unwrap());
    }

    #[test]
    fn test_problem_bounds_follow_estimate_gap() {
        let tickets = vec![Ticket::new("under", 60, 100), Ticket::new("over", 200, 120)];
        let solver = FixedSolver::new(vec![0.0, 0.0]);
        let balancer =
            OptimizingBalancer::with_solver(0.5, 0.25, Grid::default(), solver, heuristic());

        balancer.balance(&tickets, 480).unwrap();

        let problem = balancer.solver.seen.lock().unwrap().clone().unwrap();
        let bounds = problem.variables();
        assert!((bounds[0].lower - 0.0).abs() < f64::EPSILON);
        assert!((bounds[0].upper - 50.0).abs() < f64::EPSILON);
        assert!((bounds[1].lower + 100.0).abs() < f64::EPSILON);
        assert!((bounds[1].upper - 0.0).abs() < f64::EPSILON);

        let floor = &problem.constraints()[0];
        assert!((floor.lower - 220.0).abs() < f64::EPSILON);
        assert!((floor.upper - 10_080.0).abs() < f64::EPSILON);
        assert_eq!(floor.coefficients.len(), 2);
        assert_eq!(problem.objective(), [1.0, 1.0]);
    }

    #[test]
    fn test_solution_values_snap_up_to_grid() {
        let tickets = vec![Ticket::new("a", 60, 100), Ticket::new("b", 200, 120)];
        let solver = FixedSolver::new(vec![37.000_000_1, -12.5]);
        let balancer =
            OptimizingBalancer::with_solver(0.5, 0.25, Grid::default(), solver, heuristic());

        let result = balancer.balance(&tickets, 240).unwrap();

        assert_eq!(
            result,
            vec![PaddingAllocation::new("a", 40), PaddingAllocation::new("b", -10)]
        );
    }

    #[test]
    fn test_minute_grid_keeps_whole_minutes() {
        let tickets = vec![Ticket::new("a", 60, 100), Ticket::new("b", 200, 120)];
        let solver = FixedSolver::new(vec![37.000_000_1, -12.5]);
        let balancer =
            OptimizingBalancer::with_solver(0.5, 0.25, Grid::new(0.0, 1.0), solver, heuristic());

        let result = balancer.balance(&tickets, 240).unwrap();

        assert_eq!(
            result,
            vec![PaddingAllocation::new("a", 37), PaddingAllocation::new("b", -12)]
        );
    }

    #[test]
    fn test_good_lp_meets_weekly_target_when_feasible() {
        let tickets = vec![Ticket::new("a", 60, 120), Ticket::new("b", 100, 90)];
        let balancer = OptimizingBalancer::new(0.25, 0.25, Grid::default(), heuristic());

        let result = balancer.balance(&tickets, 200).unwrap();

        let reported: Minutes = tickets
            .iter()
            .zip(&result)
            .map(|(ticket, padding)| ticket.real + padding.fake)
            .sum();
        assert!((200..=205).contains(&reported), "reported {reported}");
        assert!(result.iter().all(|p| p.fake % 5 == 0), "{result:?}");
        assert!((0..=75).contains(&result[0].fake));
        assert!((-25..=0).contains(&result[1].fake));
    }

    #[test]
    fn test_good_lp_falls_back_when_bounds_cannot_reach_target() {
        // Largest reachable padding is 37.5 minutes against a 105 minute gap.
        let tickets = scenario_tickets();
        let balancer = OptimizingBalancer::new(0.25, 0.25, Grid::default(), heuristic());

        let result = balancer.balance(&tickets, 480).unwrap();

        assert_eq!(result, HeuristicBalancer::default().balance(&tickets, 480).unwrap());
    }

    #[test]
    fn test_rejects_empty_input() {
        let balancer = OptimizingBalancer::with_solver(
            0.25,
            0.25,
            Grid::default(),
            InfeasibleSolver,
            heuristic(),
        );
        assert_eq!(balancer.balance(&[], 480), Err(BalanceError::NoTickets));
    }
}
