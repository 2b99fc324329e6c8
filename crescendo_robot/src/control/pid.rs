//! PID controller with backward Euler integration, derivative filter (Tf),
//! and anti-windup via back-calculation (Tt).
//!
//! Zero Ki disables integral; zero Kd disables derivative.

use crescendo_common::robot::config::ArmConfig;

/// PID gains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain (0 = disabled).
    pub ki: f64,
    /// Derivative gain (0 = disabled).
    pub kd: f64,
    /// Derivative filter time constant [s] (0 = unfiltered).
    pub tf: f64,
    /// Anti-windup tracking time constant [s] (0 = disabled).
    pub tt: f64,
    /// Output saturation limit, used by anti-windup.
    pub out_max: f64,
}

impl PidGains {
    /// Gains for the arm pivot loop.
    pub fn from_arm(config: &ArmConfig) -> Self {
        Self {
            kp: config.kp,
            ki: config.ki,
            kd: config.kd,
            tf: config.tf,
            tt: config.tt,
            out_max: config.out_max,
        }
    }
}

/// Stateful PID controller.
///
/// Preserves the integral accumulator and filtered derivative across
/// periods. Reset whenever the reference jumps or the loop is re-engaged so
/// stale integral never leaks into a new move.
#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    integral: f64,
    prev_error: Option<f64>,
    derivative_filtered: f64,
    prev_raw_output: f64,
}

impl PidController {
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            integral: 0.0,
            prev_error: None,
            derivative_filtered: 0.0,
            prev_raw_output: 0.0,
        }
    }

    #[inline]
    pub fn gains(&self) -> &PidGains {
        &self.gains
    }

    /// Clear integral and derivative history.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
        self.derivative_filtered = 0.0;
        self.prev_raw_output = 0.0;
    }

    /// Compute one period's output for `error = reference - measurement`.
    ///
    /// The result is unsaturated; clamping is done by the caller after the
    /// feedforward is added.
    pub fn calculate(&mut self, error: f64, dt: f64) -> f64 {
        if dt <= 0.0 || !error.is_finite() {
            return 0.0;
        }
        let g = self.gains;

        let p_term = g.kp * error;

        let i_term = if g.ki != 0.0 {
            let anti_windup = if g.tt > 0.0 && g.out_max > 0.0 {
                let saturated = self.prev_raw_output.clamp(-g.out_max, g.out_max);
                (saturated - self.prev_raw_output) / g.tt
            } else {
                0.0
            };
            self.integral += (g.ki * error + anti_windup) * dt;
            self.integral
        } else {
            self.integral = 0.0;
            0.0
        };

        // No derivative kick on the first period after a reset.
        let d_term = match self.prev_error {
            Some(prev) if g.kd != 0.0 => {
                let raw = (error - prev) / dt;
                if g.tf > 0.0 {
                    let alpha = dt / (g.tf + dt);
                    self.derivative_filtered += alpha * (raw - self.derivative_filtered);
                    g.kd * self.derivative_filtered
                } else {
                    g.kd * raw
                }
            }
            _ => 0.0,
        };

        self.prev_error = Some(error);
        let raw_output = p_term + i_term + d_term;
        self.prev_raw_output = raw_output;
        raw_output
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
