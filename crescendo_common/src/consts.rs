//! System-wide constants for the Crescendo workspace.
//!
//! Single source of truth for numeric limits and default paths.
//! Imported by every crate in the workspace.

/// Number of exclusive subsystems on the robot.
pub const SUBSYSTEM_COUNT: usize = 4;

/// Default scheduling period in milliseconds (50 Hz).
pub const PERIOD_MS: u32 = 20;

/// Minimum accepted scheduling period in milliseconds.
pub const PERIOD_MS_MIN: u32 = 1;

/// Maximum accepted scheduling period in milliseconds.
pub const PERIOD_MS_MAX: u32 = 100;

/// Nominal battery voltage; the natural clamp for voltage-controlled outputs.
pub const NOMINAL_VOLTAGE: f64 = 12.0;

/// Number of driver-station controller ports.
pub const MAX_CONTROLLERS: usize = 6;

/// Number of analog axes reported per controller.
pub const MAX_AXES_PER_CONTROLLER: usize = 6;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/robot.toml";
