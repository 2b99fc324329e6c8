//! Intake commands, including the floor-to-indexer handoff.

use crescendo_common::subsystem::Requirements;
use tracing::info;

use super::{Command, Operand};
use crate::context::RobotContext;

/// Drive the intake roller at an operator voltage until interrupted.
pub struct IntakeVoltage {
    name: String,
    volts: Operand,
}

impl IntakeVoltage {
    pub fn new(name: impl Into<String>, volts: impl Into<Operand>) -> Self {
        Self {
            name: name.into(),
            volts: volts.into(),
        }
    }
}

impl Command for IntakeVoltage {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        Requirements::INTAKE
    }

    fn tick(&mut self, ctx: &mut RobotContext) {
        let volts = self.volts.eval(ctx);
        ctx.subsystems.intake.set_voltage(volts);
    }

    fn end(&mut self, ctx: &mut RobotContext, _interrupted: bool) {
        ctx.subsystems.intake.idle();
    }
}

/// Pull a note from the intake into the indexer until the beam break sees it.
pub struct Handoff {
    intake_volts: f64,
    captured: bool,
}

impl Handoff {
    pub fn new(intake_volts: f64) -> Self {
        Self {
            intake_volts,
            captured: false,
        }
    }
}

impl Command for Handoff {
    fn name(&self) -> &str {
        "Handoff"
    }

    fn requirements(&self) -> Requirements {
        Requirements::INTAKE | Requirements::SHOOTER
    }

    fn start(&mut self, _ctx: &mut RobotContext) {
        self.captured = false;
    }

    fn tick(&mut self, ctx: &mut RobotContext) {
        let shooter = &mut ctx.subsystems.shooter;
        let idle = shooter.config().idle_rpm;
        shooter.set_flywheels(idle, idle);
        self.captured = shooter.pull_note_in();
        let volts = if self.captured { 0.0 } else { self.intake_volts };
        ctx.subsystems.intake.set_voltage(volts);
        ctx.telemetry.put("handoff/captured", self.captured);
    }

    fn is_finished(&self, _ctx: &RobotContext) -> bool {
        self.captured
    }

    fn end(&mut self, ctx: &mut RobotContext, interrupted: bool) {
        if self.captured {
            info!("handoff: note captured");
        }
        ctx.subsystems.intake.idle();
        if interrupted {
            ctx.subsystems.shooter.idle();
        } else {
            // Keep the indexer stopped on the captured note.
            ctx.subsystems.shooter.set_indexer(0.0);
        }
    }
}
