//! Floor intake roller, driven open-loop by voltage.

use crescendo_common::hal::{ControlType, MotorController};
use crescendo_common::robot::config::IntakeConfig;
use crescendo_common::telemetry::Telemetry;
use tracing::{info, warn};

use crate::control::clamp_symmetric;

pub struct IntakeSubsystem {
    motor: Box<dyn MotorController>,
    config: IntakeConfig,
    voltage: f64,
    faulted: bool,
}

impl IntakeSubsystem {
    pub fn new(motor: Box<dyn MotorController>, config: &IntakeConfig) -> Self {
        Self {
            motor,
            config: config.clone(),
            voltage: 0.0,
            faulted: false,
        }
    }

    /// Request a roller voltage, clamped to `±max_voltage`.
    pub fn set_voltage(&mut self, volts: f64) {
        self.voltage = clamp_symmetric(volts, self.config.max_voltage);
    }

    pub fn idle(&mut self) {
        self.voltage = 0.0;
    }

    pub fn voltage(&self) -> f64 {
        self.voltage
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    pub fn apply(&mut self, telemetry: &mut Telemetry) {
        match self.motor.set_reference(self.voltage, ControlType::Voltage) {
            Ok(()) if self.faulted => {
                info!("intake: motor communication restored");
                self.faulted = false;
            }
            Ok(()) => {}
            Err(e) => {
                if !self.faulted {
                    warn!("intake: motor write failed: {e}");
                    self.faulted = true;
                }
            }
        }
        telemetry.put("intake/voltage", self.voltage);
        telemetry.put("intake/fault", self.faulted);
    }
}
