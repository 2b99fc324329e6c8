//! Prelude module for common re-exports.
//!
//! ```rust
//! use crescendo_common::prelude::*;
//! ```

use std::time::Duration;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::robot::config::RobotConfig;

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{NOMINAL_VOLTAGE, PERIOD_MS, SUBSYSTEM_COUNT};

// ─── Hardware ───────────────────────────────────────────────────────
pub use crate::hal::{ChassisSpeeds, ControlType, DigitalInput, DriveBase, HalError, MotorController};

// ─── Input / Subsystems / Telemetry ─────────────────────────────────
pub use crate::input::{Axis, Button, InputSnapshot, Pov};
pub use crate::subsystem::{Requirements, SubsystemId};
pub use crate::telemetry::{Telemetry, TelemetryValue};

/// Default scheduling period as Duration.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(PERIOD_MS as u64);
