//! Three-point (PERT) estimation.
//!
//! Each subtask gets best/likely/worst guesses. Per subtask,
//! `EE = (best + 4 * likely + worst) / 6` and `SD = (worst - best) / 6`;
//! the task sums the EEs, combines SDs as the root of the summed squares,
//! and adds `risk * SD` for the final estimate.
//!
//! See <https://en.wikipedia.org/wiki/Three-point_estimation>.

use serde::Serialize;
use thiserror::Error;

use crate::time::Minutes;

/// Best, most likely and worst case guesses for one subtask, in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Guess {
    pub subtask: String,
    pub best: Minutes,
    pub likely: Minutes,
    pub worst: Minutes,
}

/// Expected value and standard deviation of one subtask, in minutes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtaskEstimate {
    pub subtask: String,
    pub ee: f64,
    pub sd: f64,
}

/// Aggregated task estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PertEstimate {
    pub subtasks: Vec<SubtaskEstimate>,
    /// Sum of subtask expected values.
    pub ee: f64,
    /// Combined standard deviation.
    pub sd: f64,
    /// Risk-adjusted estimate, `ee + risk * sd`.
    pub e: f64,
    /// `(e - ee) / ee` as a whole percentage; zero when `ee` is zero.
    pub risk_percent: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PertError {
    #[error("no subtask guesses provided")]
    Empty,
    #[error("negative guesses are not allowed (subtask: {0})")]
    NegativeGuess(String),
}

/// Estimates a task from its subtask guesses.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn estimate(guesses: &[Guess], risk: f64) -> Result<PertEstimate, PertError> {
    if guesses.is_empty() {
        return Err(PertError::Empty);
    }

    let subtasks = guesses
        .iter()
        .map(|guess| {
            if guess.best < 0 || guess.likely < 0 || guess.worst < 0 {
                return Err(PertError::NegativeGuess(guess.subtask.clone()));
            }
            let (best, likely, worst) = (
                guess.best as f64,
                guess.likely as f64,
                guess.worst as f64,
            );
            Ok(SubtaskEstimate {
                subtask: guess.subtask.clone(),
                ee: (best + 4.0 * likely + worst) / 6.0,
                sd: (worst - best) / 6.0,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let ee: f64 = subtasks.iter().map(|s| s.ee).sum();
    let sd = subtasks.iter().map(|s| s.sd * s.sd).sum::<f64>().sqrt();
    let e = ee + risk * sd;
    let risk_percent = if ee > 0.0 {
        ((e - ee) / ee * 100.0).round() as i64
    } else {
        0
    };

    tracing::debug!(ee, sd, e, risk, "pert estimate");
    Ok(PertEstimate {
        subtasks,
        ee,
        sd,
        e,
        risk_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guess(subtask: &str, best: Minutes, likely: Minutes, worst: Minutes) -> Guess {
        Guess {
            subtask: subtask.to_string(),
            best,
            likely,
            worst,
        }
    }

    #[test]
    fn test_hand_computed_estimate() {
        let guesses = vec![
            guess("analysis", 60, 135, 210),
            guess("implementation", 285, 300, 375),
            guess("testing", 450, 525, 540),
        ];

        let result = estimate(&guesses, 2.0).unwrap();

        let ees: Vec<f64> = result.subtasks.iter().map(|s| s.ee).collect();
        let sds: Vec<f64> = result.subtasks.iter().map(|s| s.sd).collect();
        for (got, want) in ees.iter().zip([135.0, 310.0, 515.0]) {
            assert!((got - want).abs() < 1e-9, "ee {got} != {want}");
        }
        for (got, want) in sds.iter().zip([25.0, 15.0, 15.0]) {
            assert!((got - want).abs() < 1e-9, "sd {got} != {want}");
        }
        assert!((result.ee - 960.0).abs() < 1e-9);
        assert!((result.sd - 1075_f64.sqrt()).abs() < 1e-9);
        assert!((result.e - (960.0 + 2.0 * 1075_f64.sqrt())).abs() < 1e-9);
        assert_eq!(result.risk_percent, 7);
    }

    #[test]
    fn test_zero_guesses_have_zero_risk() {
        let result = estimate(&[guess("noop", 0, 0, 0)], 2.0).unwrap();

        assert!(result.ee.abs() < f64::EPSILON);
        assert_eq!(result.risk_percent, 0);
    }

    #[test]
    fn test_negative_guess_errors() {
        let err = estimate(&[guess("design", -60, 30, 90)], 2.0).unwrap_err();
        assert_eq!(err, PertError::NegativeGuess("design".to_string()));
    }

    #[test]
    fn test_empty_guesses_error() {
        assert_eq!(estimate(&[], 1.0), Err(PertError::Empty));
    }
}
