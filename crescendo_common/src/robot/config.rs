//! Robot configuration structures.
//!
//! All config types use `serde::Deserialize` for TOML loading. Every section
//! is `#[serde(default)]`, so a minimal file only overrides what it names.
//! Gains, offsets and presets are configuration, not part of the control
//! algorithms; [`RobotConfig::validate`] rejects malformed sets at startup.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ConfigLoader, SharedConfig};
use crate::consts::{NOMINAL_VOLTAGE, PERIOD_MS, PERIOD_MS_MAX, PERIOD_MS_MIN};

use super::routine::RoutineConfig;

// ─── Top-Level Config ───────────────────────────────────────────────

/// Top-level robot configuration.
///
/// Loaded from TOML at startup and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotConfig {
    #[serde(default)]
    pub shared: SharedConfig,

    /// Scheduling period [ms] (default: 20).
    #[serde(default = "default_period_ms")]
    pub period_ms: u32,

    #[serde(default)]
    pub arm: ArmConfig,

    #[serde(default)]
    pub shooter: ShooterConfig,

    #[serde(default)]
    pub intake: IntakeConfig,

    #[serde(default)]
    pub drive: DriveConfig,

    #[serde(default)]
    pub operator: OperatorConfig,

    /// Autonomous routines, selectable by name.
    #[serde(default)]
    pub routines: Vec<RoutineConfig>,
}

fn default_period_ms() -> u32 {
    PERIOD_MS
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::default(),
            period_ms: PERIOD_MS,
            arm: ArmConfig::default(),
            shooter: ShooterConfig::default(),
            intake: IntakeConfig::default(),
            drive: DriveConfig::default(),
            operator: OperatorConfig::default(),
            routines: Vec::new(),
        }
    }
}

impl RobotConfig {
    /// Load from a TOML file and validate.
    pub fn load_validated(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from a TOML string and validate.
    pub fn from_toml_validated(content: &str) -> Result<Self, ConfigError> {
        let config = Self::from_toml(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Scheduling period in seconds.
    #[inline]
    pub fn period_s(&self) -> f64 {
        f64::from(self.period_ms) / 1000.0
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        if self.period_ms < PERIOD_MS_MIN || self.period_ms > PERIOD_MS_MAX {
            return Err(invalid(format!(
                "period_ms {} out of range [{}, {}]",
                self.period_ms, PERIOD_MS_MIN, PERIOD_MS_MAX
            )));
        }
        self.arm.validate().map_err(|e| invalid(format!("arm: {e}")))?;
        self.shooter
            .validate()
            .map_err(|e| invalid(format!("shooter: {e}")))?;
        self.intake
            .validate()
            .map_err(|e| invalid(format!("intake: {e}")))?;
        self.drive
            .validate()
            .map_err(|e| invalid(format!("drive: {e}")))?;
        self.operator
            .validate()
            .map_err(|e| invalid(format!("operator: {e}")))?;
        self.validate_routines()
    }

    fn validate_routines(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for routine in &self.routines {
            if routine.name.trim().is_empty() {
                return Err(invalid("routine name cannot be empty".to_string()));
            }
            if !seen.insert(routine.name.as_str()) {
                return Err(invalid(format!("duplicate routine name '{}'", routine.name)));
            }
            for (i, step) in routine.steps.iter().enumerate() {
                step.validate()
                    .map_err(|e| invalid(format!("routine '{}' step {i}: {e}", routine.name)))?;
            }
        }
        Ok(())
    }
}

fn invalid(msg: String) -> ConfigError {
    ConfigError::ValidationError(msg)
}

fn finite(name: &str, value: f64) -> Result<(), String> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(format!("{name} must be finite, got {value}"))
    }
}

fn non_negative(name: &str, value: f64) -> Result<(), String> {
    finite(name, value)?;
    if value < 0.0 {
        return Err(format!("{name} must be >= 0, got {value}"));
    }
    Ok(())
}

fn positive(name: &str, value: f64) -> Result<(), String> {
    finite(name, value)?;
    if value <= 0.0 {
        return Err(format!("{name} must be > 0, got {value}"));
    }
    Ok(())
}

// ─── Arm ────────────────────────────────────────────────────────────

/// Arm pivot setpoint controller parameters. Positions in rotations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmConfig {
    /// Proportional gain [V/rot].
    pub kp: f64,
    /// Integral gain [V/(rot·s)] (0 = disabled).
    pub ki: f64,
    /// Derivative gain [V·s/rot] (0 = disabled).
    pub kd: f64,
    /// Derivative filter time constant [s] (0 = unfiltered).
    pub tf: f64,
    /// Anti-windup tracking time constant [s] (0 = disabled).
    pub tt: f64,
    /// Static friction feedforward [V].
    pub ks: f64,
    /// Gravity feedforward at horizontal [V].
    pub kg: f64,
    /// Velocity feedforward [V·s/rot].
    pub kv: f64,
    /// Acceleration feedforward [V·s²/rot].
    pub ka: f64,
    /// Output voltage clamp [V].
    pub out_max: f64,
    /// Motion profile velocity limit [rot/s].
    pub max_velocity: f64,
    /// Motion profile acceleration limit [rot/s²].
    pub max_acceleration: f64,
    /// At-target tolerance [rot].
    pub tolerance: f64,
    /// Arm angle at which the encoder reads zero, relative to horizontal [rot].
    pub horizontal_offset: f64,
    /// Stowed position [rot].
    pub stow: f64,
    /// Amp scoring position [rot].
    pub amp: f64,
    /// Flat speaker shot position [rot].
    pub shoot_flat: f64,
    /// Manual control voltage per unit stick deflection [V].
    pub manual_scale: f64,
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            kp: 24.0,
            ki: 0.0,
            kd: 0.4,
            tf: 0.0,
            tt: 0.0,
            ks: 0.1,
            kg: 0.35,
            kv: 2.0,
            ka: 0.05,
            out_max: NOMINAL_VOLTAGE,
            max_velocity: 1.0,
            max_acceleration: 2.0,
            tolerance: 0.01,
            horizontal_offset: 0.0,
            stow: 0.0,
            amp: 0.26,
            shoot_flat: 0.07,
            manual_scale: NOMINAL_VOLTAGE,
        }
    }
}

impl ArmConfig {
    pub fn validate(&self) -> Result<(), String> {
        for (name, v) in [
            ("kp", self.kp),
            ("ki", self.ki),
            ("kd", self.kd),
            ("tf", self.tf),
            ("tt", self.tt),
            ("ks", self.ks),
            ("kg", self.kg),
            ("kv", self.kv),
            ("ka", self.ka),
        ] {
            non_negative(name, v)?;
        }
        positive("out_max", self.out_max)?;
        if self.out_max > NOMINAL_VOLTAGE {
            return Err(format!(
                "out_max {} exceeds nominal voltage {NOMINAL_VOLTAGE}",
                self.out_max
            ));
        }
        positive("max_velocity", self.max_velocity)?;
        positive("max_acceleration", self.max_acceleration)?;
        positive("tolerance", self.tolerance)?;
        for (name, v) in [
            ("horizontal_offset", self.horizontal_offset),
            ("stow", self.stow),
            ("amp", self.amp),
            ("shoot_flat", self.shoot_flat),
            ("manual_scale", self.manual_scale),
        ] {
            finite(name, v)?;
        }
        Ok(())
    }
}

// ─── Shooter ────────────────────────────────────────────────────────

/// Flywheel and indexer velocity presets. Velocities in rpm.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShooterConfig {
    /// Flywheel idle speed.
    pub idle_rpm: f64,
    /// Left flywheel speaker shot speed.
    pub speaker_left_rpm: f64,
    /// Right flywheel speaker shot speed.
    pub speaker_right_rpm: f64,
    /// Indexer speed while feeding a shot.
    pub feed_rpm: f64,
    /// Flywheel speed while receiving a note from the source.
    pub receive_rpm: f64,
    /// Indexer inward speed while pulling a note in.
    pub pull_in_rpm: f64,
    /// Reference clamp for every velocity-controlled motor.
    pub max_rpm: f64,
    /// Scale from encoder units to reported speed.
    pub conversion_factor: f64,
    /// Flywheel "at speed" tolerance.
    pub speed_tolerance_rpm: f64,
}

impl Default for ShooterConfig {
    fn default() -> Self {
        Self {
            idle_rpm: 1000.0,
            speaker_left_rpm: 5200.0,
            speaker_right_rpm: 5100.0,
            feed_rpm: -600.0,
            receive_rpm: -600.0,
            pull_in_rpm: -600.0,
            max_rpm: 7000.0,
            conversion_factor: 1.0,
            speed_tolerance_rpm: 100.0,
        }
    }
}

impl ShooterConfig {
    pub fn validate(&self) -> Result<(), String> {
        positive("max_rpm", self.max_rpm)?;
        positive("conversion_factor", self.conversion_factor)?;
        positive("speed_tolerance_rpm", self.speed_tolerance_rpm)?;
        for (name, v) in [
            ("idle_rpm", self.idle_rpm),
            ("speaker_left_rpm", self.speaker_left_rpm),
            ("speaker_right_rpm", self.speaker_right_rpm),
            ("feed_rpm", self.feed_rpm),
            ("receive_rpm", self.receive_rpm),
            ("pull_in_rpm", self.pull_in_rpm),
        ] {
            finite(name, v)?;
            if v.abs() > self.max_rpm {
                return Err(format!("{name} {v} exceeds max_rpm {}", self.max_rpm));
            }
        }
        Ok(())
    }
}

// ─── Intake ─────────────────────────────────────────────────────────

/// Intake roller parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Roller voltage clamp [V].
    pub max_voltage: f64,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_voltage: NOMINAL_VOLTAGE,
        }
    }
}

impl IntakeConfig {
    pub fn validate(&self) -> Result<(), String> {
        positive("max_voltage", self.max_voltage)?;
        if self.max_voltage > NOMINAL_VOLTAGE {
            return Err(format!(
                "max_voltage {} exceeds nominal voltage {NOMINAL_VOLTAGE}",
                self.max_voltage
            ));
        }
        Ok(())
    }
}

// ─── Drive ──────────────────────────────────────────────────────────

/// Drivetrain speed limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Translational speed clamp [m/s].
    pub max_speed: f64,
    /// Rotational speed clamp [rad/s].
    pub max_angular_speed: f64,
    /// Interpret teleop sticks relative to the field.
    pub field_relative: bool,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            max_speed: 4.5,
            max_angular_speed: std::f64::consts::TAU,
            field_relative: true,
        }
    }
}

impl DriveConfig {
    pub fn validate(&self) -> Result<(), String> {
        positive("max_speed", self.max_speed)?;
        positive("max_angular_speed", self.max_angular_speed)
    }
}

// ─── Operator ───────────────────────────────────────────────────────

/// Controller ports and stick shaping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    pub pilot_port: u8,
    pub copilot_port: u8,
    pub left_x_deadband: f64,
    pub left_y_deadband: f64,
    pub right_x_deadband: f64,
    /// Voltage per unit trigger deflection [V].
    pub trigger_voltage: f64,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            pilot_port: 0,
            copilot_port: 1,
            left_x_deadband: 0.1,
            left_y_deadband: 0.1,
            right_x_deadband: 0.1,
            trigger_voltage: NOMINAL_VOLTAGE,
        }
    }
}

impl OperatorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.pilot_port == self.copilot_port {
            return Err(format!(
                "pilot and copilot share port {}",
                self.pilot_port
            ));
        }
        for (name, v) in [
            ("left_x_deadband", self.left_x_deadband),
            ("left_y_deadband", self.left_y_deadband),
            ("right_x_deadband", self.right_x_deadband),
        ] {
            non_negative(name, v)?;
            if v >= 1.0 {
                return Err(format!("{name} {v} must be < 1"));
            }
        }
        non_negative("trigger_voltage", self.trigger_voltage)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
