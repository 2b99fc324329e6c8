//! Hardware bundle consumed by the subsystems.
//!
//! The concrete devices are chosen at startup: vendor drivers on the robot,
//! [`sim`] devices everywhere else.

pub mod sim;

use crescendo_common::hal::{DigitalInput, DriveBase, MotorController};

/// Every device the subsystems own, boxed behind the hardware traits.
pub struct Hardware {
    pub arm_motor: Box<dyn MotorController>,
    pub left_flywheel: Box<dyn MotorController>,
    pub right_flywheel: Box<dyn MotorController>,
    pub indexer: Box<dyn MotorController>,
    pub beam_break: Box<dyn DigitalInput>,
    pub intake_motor: Box<dyn MotorController>,
    pub drive_base: Box<dyn DriveBase>,
}

impl std::fmt::Debug for Hardware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hardware")
            .field("arm_motor", &self.arm_motor.name())
            .field("left_flywheel", &self.left_flywheel.name())
            .field("right_flywheel", &self.right_flywheel.name())
            .field("indexer", &self.indexer.name())
            .field("beam_break", &self.beam_break.name())
            .field("intake_motor", &self.intake_motor.name())
            .finish_non_exhaustive()
    }
}
