//! Robot subsystems.
//!
//! A subsystem owns its hardware and control law; commands talk to it only
//! through its control methods. Every period the scheduler calls
//! [`Subsystems::sample`] before any command runs and
//! [`Subsystems::apply`] after all commands have ticked.

pub mod arm;
pub mod drive;
pub mod intake;
pub mod shooter;

use crescendo_common::robot::config::RobotConfig;
use crescendo_common::subsystem::SubsystemId;
use crescendo_common::telemetry::Telemetry;

use crate::hal::Hardware;

pub use arm::ArmSubsystem;
pub use drive::DriveSubsystem;
pub use intake::IntakeSubsystem;
pub use shooter::ShooterSubsystem;

pub struct Subsystems {
    pub arm: ArmSubsystem,
    pub shooter: ShooterSubsystem,
    pub intake: IntakeSubsystem,
    pub drive: DriveSubsystem,
}

impl Subsystems {
    pub fn new(config: &RobotConfig, hardware: Hardware) -> Self {
        let dt = config.period_s();
        Self {
            arm: ArmSubsystem::new(hardware.arm_motor, &config.arm, dt),
            shooter: ShooterSubsystem::new(
                hardware.left_flywheel,
                hardware.right_flywheel,
                hardware.indexer,
                hardware.beam_break,
                &config.shooter,
            ),
            intake: IntakeSubsystem::new(hardware.intake_motor, &config.intake),
            drive: DriveSubsystem::new(hardware.drive_base, &config.drive),
        }
    }

    /// Read every sensor once for this period.
    pub fn sample(&mut self) {
        self.arm.sample();
        self.shooter.sample();
        self.drive.sample();
    }

    /// Compute control laws and write outputs.
    pub fn apply(&mut self, telemetry: &mut Telemetry) {
        self.arm.apply(telemetry);
        self.shooter.apply(telemetry);
        self.intake.apply(telemetry);
        self.drive.apply(telemetry);
    }

    /// Return one subsystem to its idle behaviour.
    pub fn idle(&mut self, id: SubsystemId) {
        match id {
            SubsystemId::Arm => self.arm.idle(),
            SubsystemId::Shooter => self.shooter.idle(),
            SubsystemId::Intake => self.intake.idle(),
            SubsystemId::Drive => self.drive.idle(),
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
