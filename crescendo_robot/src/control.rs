//! Closed-loop control primitives.
//!
//! Position control for the arm pivot: trapezoid-profiled reference,
//! PID on the profiled position error, arm feedforward on the profiled
//! state. Each component is disabled by setting its gains to zero.

pub mod feedforward;
pub mod pid;
pub mod profile;

/// Clamp `value` to `[-limit, limit]`; non-finite values map to zero.
#[inline]
pub fn clamp_symmetric(value: f64, limit: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let limit = limit.abs();
    value.clamp(-limit, limit)
}
