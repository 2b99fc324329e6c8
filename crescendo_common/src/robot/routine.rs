//! Autonomous routine declarations.
//!
//! A routine is an ordered list of steps referring to named commands by
//! string. The robot crate compiles each routine into a command sequence.
//!
//! ```toml
//! [[routines]]
//! name = "center blue"
//! steps = [
//!     { command = "Shoot" },
//!     { parallel = ["Intake", "Down"] },
//!     { drive = [{ seconds = 1.5, vx = 1.2 }] },
//!     { timeout = 2.0, command = "amp" },
//!     { wait = 0.25 },
//! ]
//! ```

use serde::{Deserialize, Serialize};

/// One timed chassis-speed segment produced by an external path planner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriveSegment {
    /// Segment duration [s].
    pub seconds: f64,
    #[serde(default)]
    pub vx: f64,
    #[serde(default)]
    pub vy: f64,
    #[serde(default)]
    pub omega: f64,
}

/// One step of a routine.
///
/// Variant order matters for untagged matching: `Timeout` must precede
/// `Command` because both carry a `command` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoutineStep {
    /// Run a named command, giving up after `timeout` seconds.
    Timeout { timeout: f64, command: String },
    /// Run a named command to completion.
    Command { command: String },
    /// Pause for `wait` seconds.
    Wait { wait: f64 },
    /// Run named commands together until all finish.
    Parallel { parallel: Vec<String> },
    /// Run named commands together until the first finishes.
    Race { race: Vec<String> },
    /// Follow precomputed drive segments in order.
    Drive { drive: Vec<DriveSegment> },
}

impl RoutineStep {
    /// Named commands referenced by this step.
    pub fn command_names(&self) -> Vec<&str> {
        match self {
            Self::Timeout { command, .. } | Self::Command { command } => vec![command.as_str()],
            Self::Parallel { parallel: names } | Self::Race { race: names } => {
                names.iter().map(String::as_str).collect()
            }
            Self::Wait { .. } | Self::Drive { .. } => Vec::new(),
        }
    }

    /// Check numeric fields and group sizes.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Timeout { timeout, .. } => {
                if !timeout.is_finite() || *timeout <= 0.0 {
                    return Err(format!("timeout {timeout} must be finite and > 0"));
                }
            }
            Self::Wait { wait } => {
                if !wait.is_finite() || *wait < 0.0 {
                    return Err(format!("wait {wait} must be finite and >= 0"));
                }
            }
            Self::Parallel { parallel: names } | Self::Race { race: names } => {
                if names.is_empty() {
                    return Err("command group cannot be empty".to_string());
                }
            }
            Self::Drive { drive } => {
                for seg in drive {
                    if !seg.seconds.is_finite() || seg.seconds <= 0.0 {
                        return Err(format!("drive segment seconds {} must be > 0", seg.seconds));
                    }
                    if !(seg.vx.is_finite() && seg.vy.is_finite() && seg.omega.is_finite()) {
                        return Err("drive segment speeds must be finite".to_string());
                    }
                }
            }
            Self::Command { .. } => {}
        }
        Ok(())
    }
}

/// A named autonomous routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineConfig {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<RoutineStep>,
}

// ─── Tests ──────────────────────────────────────────────────────────
