//! Hardware boundary traits and error types.
//!
//! Motor-controller firmware, its onboard velocity/position loops, sensors and
//! the swerve drive library are external collaborators. This module defines
//! the narrow interface the control core consumes:
//!
//! - [`MotorController`] - reference setting and encoder feedback
//! - [`DigitalInput`] - boolean sensors (beam breaks)
//! - [`DriveBase`] - chassis-speed drivetrain
//! - [`HalError`] - communication failures reported by any of the above
//!
//! # Failure contract
//!
//! Implementations report failures through `Result`; they never panic. The
//! control core converts every `HalError` into a safe output for the period
//! (held output or the non-capturing branch) and surfaces it via telemetry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for hardware operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HalError {
    /// Device did not answer on the bus.
    #[error("Device disconnected: {device}")]
    Disconnected { device: &'static str },

    /// Device answered too late for this period.
    #[error("Device timeout: {device}")]
    Timeout { device: &'static str },

    /// Device reported an internal fault.
    #[error("Device fault on {device}: code {code}")]
    Fault { device: &'static str, code: u16 },
}

/// Closed-loop mode requested from a motor controller's onboard firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlType {
    /// Reference is a velocity [rpm].
    Velocity,
    /// Reference is a position [rotations].
    Position,
    /// Reference is an applied voltage [V].
    Voltage,
}

/// A smart motor controller with an integrated encoder.
pub trait MotorController {
    /// Device name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Command a new reference in the given control mode.
    fn set_reference(&mut self, value: f64, control: ControlType) -> Result<(), HalError>;

    /// Encoder position [rotations].
    fn position(&self) -> Result<f64, HalError>;

    /// Encoder velocity [rpm].
    fn velocity(&self) -> Result<f64, HalError>;
}

/// A boolean sensor such as a beam break.
pub trait DigitalInput {
    fn name(&self) -> &'static str;

    /// Current sensor level; `true` means an object is present.
    fn get(&self) -> Result<bool, HalError>;
}

/// Desired robot motion in the plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChassisSpeeds {
    /// Forward velocity [m/s].
    pub vx: f64,
    /// Leftward velocity [m/s].
    pub vy: f64,
    /// Counter-clockwise angular velocity [rad/s].
    pub omega: f64,
}

impl ChassisSpeeds {
    pub const ZERO: Self = Self {
        vx: 0.0,
        vy: 0.0,
        omega: 0.0,
    };

    pub const fn new(vx: f64, vy: f64, omega: f64) -> Self {
        Self { vx, vy, omega }
    }
}

/// Drivetrain backend (module kinematics and odometry live behind it).
pub trait DriveBase {
    /// Apply chassis speeds for this period.
    fn drive(&mut self, speeds: ChassisSpeeds, field_relative: bool) -> Result<(), HalError>;

    /// Reset the gyro so the current heading reads zero.
    fn zero_gyro(&mut self) -> Result<(), HalError>;

    /// Switch module motors between brake and coast.
    fn set_motor_brake(&mut self, brake: bool) -> Result<(), HalError>;

    /// Current heading [rad].
    fn heading(&self) -> Result<f64, HalError>;
}
