//! Shooter: two flywheels, an indexer and the indexer beam break.
//!
//! Flywheels and indexer run velocity loops on the motor controllers; this
//! subsystem only selects references. The beam break is sampled once per
//! period so every command sees the same note state within a period.

use crescendo_common::hal::{ControlType, DigitalInput, MotorController};
use crescendo_common::robot::config::ShooterConfig;
use crescendo_common::telemetry::Telemetry;
use tracing::{debug, info, warn};

use crate::control::clamp_symmetric;

/// Velocity references currently requested [rpm].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShooterReferences {
    pub left: f64,
    pub right: f64,
    pub indexer: f64,
}

pub struct ShooterSubsystem {
    left: Box<dyn MotorController>,
    right: Box<dyn MotorController>,
    indexer: Box<dyn MotorController>,
    beam_break: Box<dyn DigitalInput>,
    config: ShooterConfig,
    references: ShooterReferences,
    note_present: bool,
    sensor_fault: bool,
    left_rpm: f64,
    right_rpm: f64,
    write_fault: bool,
}

impl ShooterSubsystem {
    pub fn new(
        left: Box<dyn MotorController>,
        right: Box<dyn MotorController>,
        indexer: Box<dyn MotorController>,
        beam_break: Box<dyn DigitalInput>,
        config: &ShooterConfig,
    ) -> Self {
        Self {
            left,
            right,
            indexer,
            beam_break,
            config: config.clone(),
            references: ShooterReferences::default(),
            note_present: false,
            sensor_fault: false,
            left_rpm: 0.0,
            right_rpm: 0.0,
            write_fault: false,
        }
    }

    pub fn config(&self) -> &ShooterConfig {
        &self.config
    }

    // ─── Control Methods ────────────────────────────────────────────

    pub fn set_flywheels(&mut self, left_rpm: f64, right_rpm: f64) {
        self.references.left = clamp_symmetric(left_rpm, self.config.max_rpm);
        self.references.right = clamp_symmetric(right_rpm, self.config.max_rpm);
    }

    pub fn set_indexer(&mut self, rpm: f64) {
        self.references.indexer = clamp_symmetric(rpm, self.config.max_rpm);
    }

    /// Flywheels at idle speed, indexer stopped.
    pub fn idle_flywheels(&mut self) {
        self.set_flywheels(self.config.idle_rpm, self.config.idle_rpm);
        self.set_indexer(0.0);
    }

    /// Speaker presets on both flywheels and the indexer feeding.
    pub fn shoot_speaker(&mut self) {
        self.set_flywheels(self.config.speaker_left_rpm, self.config.speaker_right_rpm);
        self.set_indexer(self.config.feed_rpm);
    }

    /// Spin the flywheels backwards to take a note from the source.
    pub fn receive_note(&mut self) {
        self.set_flywheels(self.config.receive_rpm, self.config.receive_rpm);
        self.set_indexer(0.0);
    }

    pub fn stop_motors(&mut self) {
        self.references = ShooterReferences::default();
    }

    /// Operator kill: every shooter motor to zero.
    pub fn disable(&mut self) {
        info!("shooter: disabled");
        self.stop_motors();
    }

    /// Default behaviour when no command owns the shooter.
    pub fn idle(&mut self) {
        self.idle_flywheels();
    }

    /// Advance a note toward the beam break; returns `true` once it is captured.
    ///
    /// A present note stops the indexer, an absent one runs it at the
    /// pull-in speed. Idempotent within a period because the sensor is
    /// sampled once. A failed sensor read counts as absent.
    pub fn pull_note_in(&mut self) -> bool {
        if self.note_present {
            self.set_indexer(0.0);
            true
        } else {
            self.set_indexer(self.config.pull_in_rpm);
            false
        }
    }

    // ─── Queries ────────────────────────────────────────────────────

    /// Beam-break state sampled this period.
    pub fn note_present(&self) -> bool {
        self.note_present
    }

    pub fn sensor_fault(&self) -> bool {
        self.sensor_fault
    }

    pub fn references(&self) -> ShooterReferences {
        self.references
    }

    /// Measured left flywheel speed in output units.
    pub fn speed(&self) -> f64 {
        self.left_rpm * self.config.conversion_factor
    }

    /// Both flywheels within tolerance of non-zero references.
    pub fn at_speed(&self) -> bool {
        let tol = self.config.speed_tolerance_rpm;
        self.references.left != 0.0
            && self.references.right != 0.0
            && (self.left_rpm - self.references.left).abs() <= tol
            && (self.right_rpm - self.references.right).abs() <= tol
    }

    pub fn is_faulted(&self) -> bool {
        self.sensor_fault || self.write_fault
    }

    // ─── Periodic ───────────────────────────────────────────────────

    pub fn sample(&mut self) {
        match self.beam_break.get() {
            Ok(present) => {
                if present != self.note_present {
                    debug!("shooter: beam break {}", if present { "blocked" } else { "clear" });
                }
                self.note_present = present;
                if self.sensor_fault {
                    info!("shooter: beam break restored");
                    self.sensor_fault = false;
                }
            }
            Err(e) => {
                if !self.sensor_fault {
                    warn!("shooter: beam break unreadable, treating note as absent: {e}");
                    self.sensor_fault = true;
                }
                self.note_present = false;
            }
        }
        if let Ok(rpm) = self.left.velocity() {
            self.left_rpm = rpm;
        }
        if let Ok(rpm) = self.right.velocity() {
            self.right_rpm = rpm;
        }
    }

    pub fn apply(&mut self, telemetry: &mut Telemetry) {
        let r = self.references;
        let results = [
            self.left.set_reference(r.left, ControlType::Velocity),
            self.right.set_reference(r.right, ControlType::Velocity),
            self.indexer.set_reference(r.indexer, ControlType::Velocity),
        ];
        match results.into_iter().find_map(Result::err) {
            Some(e) => {
                if !self.write_fault {
                    warn!("shooter: motor write failed, controllers hold last reference: {e}");
                    self.write_fault = true;
                }
            }
            None => {
                if self.write_fault {
                    info!("shooter: motor communication restored");
                    self.write_fault = false;
                }
            }
        }

        telemetry.put("shooter/speed", self.speed());
        telemetry.put("shooter/left_reference", r.left);
        telemetry.put("shooter/right_reference", r.right);
        telemetry.put("shooter/indexer_reference", r.indexer);
        telemetry.put("shooter/note_present", self.note_present);
        telemetry.put("shooter/fault", self.is_faulted());
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
