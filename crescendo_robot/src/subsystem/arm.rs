//! Arm pivot: profiled position control.
//!
//! Each period the goal is approached through a trapezoid profile; the
//! output voltage is PID on the profiled position error plus arm
//! feedforward on the profiled state, clamped to `±out_max`.
//!
//! ```text
//!  set_reference(goal)            |measured - goal| < tolerance
//!  ───────────────────▶ Seeking ──────────────────────────────▶ AtTarget
//!                         ▲                                       │
//!                         └────────── set_reference(new goal) ────┘
//! ```

use crescendo_common::hal::{ControlType, MotorController};
use crescendo_common::robot::config::ArmConfig;
use crescendo_common::telemetry::Telemetry;
use tracing::{debug, info, warn};

use crate::control::clamp_symmetric;
use crate::control::feedforward::ArmFeedforward;
use crate::control::pid::{PidController, PidGains};
use crate::control::profile::{Constraints, ProfileState, TrapezoidProfile};

/// Setpoint tracking state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetpointState {
    Seeking,
    AtTarget,
}

/// What the pivot is currently asked to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArmMode {
    /// No reference yet; motor unpowered.
    Neutral,
    /// Profiled position control toward a goal [rot].
    Setpoint { goal: f64 },
    /// Direct voltage from an operator [V].
    Manual { volts: f64 },
}

pub struct ArmSubsystem {
    motor: Box<dyn MotorController>,
    config: ArmConfig,
    dt: f64,
    pid: PidController,
    feedforward: ArmFeedforward,
    profile: TrapezoidProfile,
    mode: ArmMode,
    state: SetpointState,
    profiled: ProfileState,
    measured_position: f64,
    /// [rot/s]
    measured_velocity: f64,
    output: f64,
    read_failed: bool,
    faulted: bool,
}

impl ArmSubsystem {
    pub fn new(motor: Box<dyn MotorController>, config: &ArmConfig, dt: f64) -> Self {
        let measured_position = motor.position().unwrap_or(config.stow);
        Self {
            motor,
            config: config.clone(),
            dt,
            pid: PidController::new(PidGains::from_arm(config)),
            feedforward: ArmFeedforward::from_arm(config),
            profile: TrapezoidProfile::new(Constraints {
                max_velocity: config.max_velocity,
                max_acceleration: config.max_acceleration,
            }),
            mode: ArmMode::Neutral,
            state: SetpointState::AtTarget,
            profiled: ProfileState::new(measured_position, 0.0),
            measured_position,
            measured_velocity: 0.0,
            output: 0.0,
            read_failed: false,
            faulted: false,
        }
    }

    pub fn config(&self) -> &ArmConfig {
        &self.config
    }

    // ─── Control Methods ────────────────────────────────────────────

    /// Drive toward `goal` [rot].
    ///
    /// Re-issuing the current goal is a no-op; a new goal restarts the
    /// profile from the measured state and moves to `Seeking`.
    pub fn set_reference(&mut self, goal: f64) {
        if !goal.is_finite() {
            warn!("arm: ignoring non-finite reference");
            return;
        }
        if let ArmMode::Setpoint { goal: current } = self.mode {
            if current == goal {
                return;
            }
        }
        debug!("arm: reference {goal:.3} rot");
        self.mode = ArmMode::Setpoint { goal };
        self.state = SetpointState::Seeking;
        self.profiled = ProfileState::new(self.measured_position, self.measured_velocity);
        self.pid.reset();
    }

    /// Apply an operator voltage directly, bypassing the profile.
    pub fn manual_control(&mut self, volts: f64) {
        self.mode = ArmMode::Manual {
            volts: clamp_symmetric(volts, self.config.out_max),
        };
    }

    /// Hold the current position; an arm that was never commanded stays unpowered.
    pub fn idle(&mut self) {
        if let ArmMode::Manual { .. } = self.mode {
            self.set_reference(self.measured_position);
        }
    }

    /// Hold wherever the arm is right now.
    pub fn hold_position(&mut self) {
        if self.mode != ArmMode::Neutral {
            self.set_reference(self.measured_position);
        }
    }

    // ─── Queries ────────────────────────────────────────────────────

    /// `true` while a setpoint is still being approached.
    pub fn is_busy(&self) -> bool {
        matches!(self.mode, ArmMode::Setpoint { .. }) && self.state == SetpointState::Seeking
    }

    pub fn at_target(&self) -> bool {
        matches!(self.mode, ArmMode::Setpoint { .. }) && self.state == SetpointState::AtTarget
    }

    pub fn goal(&self) -> Option<f64> {
        match self.mode {
            ArmMode::Setpoint { goal } => Some(goal),
            _ => None,
        }
    }

    pub fn mode(&self) -> ArmMode {
        self.mode
    }

    pub fn setpoint_state(&self) -> SetpointState {
        self.state
    }

    pub fn position(&self) -> f64 {
        self.measured_position
    }

    /// Last voltage the motor accepted.
    pub fn output(&self) -> f64 {
        self.output
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    // ─── Periodic ───────────────────────────────────────────────────

    /// Read encoder feedback; on failure the last measurement is kept.
    pub fn sample(&mut self) {
        match (self.motor.position(), self.motor.velocity()) {
            (Ok(position), Ok(rpm)) => {
                self.measured_position = position;
                self.measured_velocity = rpm / 60.0;
                self.read_failed = false;
            }
            (Err(e), _) | (_, Err(e)) => {
                self.read_failed = true;
                self.enter_fault(&e.to_string());
            }
        }
    }

    /// Compute and write this period's voltage.
    pub fn apply(&mut self, telemetry: &mut Telemetry) {
        let volts = match self.mode {
            ArmMode::Neutral => 0.0,
            ArmMode::Manual { volts } => volts,
            ArmMode::Setpoint { goal } => self.compute_setpoint(goal),
        };
        let volts = clamp_symmetric(volts, self.config.out_max);

        match self.motor.set_reference(volts, ControlType::Voltage) {
            Ok(()) => {
                self.output = volts;
                if self.faulted && !self.read_failed {
                    self.faulted = false;
                    info!("arm: hardware communication restored");
                }
            }
            Err(e) => self.enter_fault(&e.to_string()),
        }

        telemetry.put("arm/position", self.measured_position);
        telemetry.put("arm/output", self.output);
        telemetry.put("arm/busy", self.is_busy());
        telemetry.put("arm/fault", self.faulted);
        if let Some(goal) = self.goal() {
            telemetry.put("arm/goal", goal);
        }
    }

    fn compute_setpoint(&mut self, goal: f64) -> f64 {
        let previous_velocity = self.profiled.velocity;
        self.profiled = self
            .profile
            .calculate(self.dt, self.profiled, ProfileState::new(goal, 0.0));
        let acceleration = (self.profiled.velocity - previous_velocity) / self.dt;

        let feedback = self
            .pid
            .calculate(self.profiled.position - self.measured_position, self.dt);
        let feedforward = self.feedforward.calculate(
            self.profiled.position,
            self.profiled.velocity,
            acceleration,
        );

        self.state = if (self.measured_position - goal).abs() < self.config.tolerance {
            SetpointState::AtTarget
        } else {
            SetpointState::Seeking
        };
        feedback + feedforward
    }

    fn enter_fault(&mut self, reason: &str) {
        if !self.faulted {
            warn!("arm: holding last output {:.2} V: {reason}", self.output);
            self.faulted = true;
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
