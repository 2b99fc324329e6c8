//! Feedforward models.
//!
//! Static friction (Ks × sign(v)), gravity (Kg × cos θ), velocity (Kv × v)
//! and acceleration (Ka × a) terms. Zero gains disable each component.

use std::f64::consts::TAU;

use crescendo_common::robot::config::ArmConfig;

/// Feedforward for a rotating arm acting against gravity.
///
/// ```text
/// ff = Ks × sign(v) + Kg × cos(θ) + Kv × v + Ka × a
/// ```
///
/// Positions are in rotations; θ is measured from horizontal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmFeedforward {
    pub ks: f64,
    pub kg: f64,
    pub kv: f64,
    pub ka: f64,
    /// Encoder reading at which the arm is horizontal [rot].
    pub horizontal_offset: f64,
}

impl ArmFeedforward {
    pub fn from_arm(config: &ArmConfig) -> Self {
        Self {
            ks: config.ks,
            kg: config.kg,
            kv: config.kv,
            ka: config.ka,
            horizontal_offset: config.horizontal_offset,
        }
    }

    /// Feedforward voltage for the given profiled state.
    #[inline]
    pub fn calculate(&self, position: f64, velocity: f64, acceleration: f64) -> f64 {
        let mut output = 0.0;
        if self.ks != 0.0 && velocity != 0.0 {
            output += self.ks * velocity.signum();
        }
        if self.kg != 0.0 {
            output += self.kg * ((position - self.horizontal_offset) * TAU).cos();
        }
        if self.kv != 0.0 {
            output += self.kv * velocity;
        }
        if self.ka != 0.0 {
            output += self.ka * acceleration;
        }
        output
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
