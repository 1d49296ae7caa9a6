//! Grid rounding for reported durations.
//!
//! Worked-time aggregates and paddings are snapped onto a coarse grid
//! (multiples of 5 minutes by default) so arithmetic noise never surfaces in
//! the report.

use serde::{Deserialize, Serialize};

use crate::time::Minutes;

/// Rounds `value` to the nearest point of the grid `lower, lower + delta, ...`
/// where `delta = upper - lower`.
///
/// The grid is laid out inside each block of `10^(digits of delta)` units, so
/// with the default `0..5` grid, `7 -> 5`, `8 -> 10` and `97.5 -> 100`. Near a
/// block edge the nearest point may belong to the neighbouring block; ties
/// round away from zero. The sign of the input is preserved and zero stays
/// zero. Every result is a fixed point: rounding it again returns it.
///
/// Non-finite input, empty grids (`upper <= lower`) and offsets outside
/// `0..delta` return `value` unchanged.
pub fn round_to_grid(value: f64, lower: f64, upper: f64) -> f64 {
    let delta = upper - lower;
    if value == 0.0 || !value.is_finite() || delta.is_nan() || delta <= 0.0 {
        return value;
    }
    if !(0.0..delta).contains(&lower) {
        return value;
    }

    let scale = 10_f64.powi(digit_count(delta));
    let magnitude = value.abs();
    let base = scale * (magnitude / scale).floor();
    let remainder = magnitude - base;

    // Points inside one block: lower, lower + delta, ..., last.
    let last_step = ((scale - lower) / delta).ceil() - 1.0;
    let last = lower + last_step * delta;

    // Half-up rounding on the step count.
    let steps = ((remainder - lower) / delta + 0.5).floor();
    let nearest = if steps >= last_step {
        let next = scale + lower;
        if next - remainder <= remainder - last { next } else { last }
    } else if steps <= 0.0 && base >= scale {
        let previous = last - scale;
        if lower - remainder <= remainder - previous { lower } else { previous }
    } else {
        lower + steps.max(0.0) * delta
    };

    value.signum() * (base + nearest)
}

/// Number of characters in the shortest decimal rendering of `delta`.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn digit_count(delta: f64) -> i32 {
    delta.to_string().len() as i32
}

/// A rounding grid, carried through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub lower: f64,
    pub upper: f64,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            lower: 0.0,
            upper: 5.0,
        }
    }
}

impl Grid {
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Distance between neighbouring grid points.
    pub fn step(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn round(&self, value: f64) -> f64 {
        round_to_grid(value, self.lower, self.upper)
    }

    /// Rounds a fractional minute count and returns whole minutes.
    #[allow(clippy::cast_possible_truncation)]
    pub fn round_minutes(&self, value: f64) -> Minutes {
        self.round(value).round() as Minutes
    }

    /// Rounds `minutes` up to the next whole grid step, in minutes.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn ceil_to_step(&self, minutes: Minutes) -> Minutes {
        let step = self.step();
        if step <= 0.0 {
            return minutes;
        }
        ((minutes as f64 / step).ceil() * step).ceil() as Minutes
    }
}
