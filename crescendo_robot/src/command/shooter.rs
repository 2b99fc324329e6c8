//! Shooter and indexer commands.

use crescendo_common::subsystem::Requirements;
use tracing::debug;

use super::{Command, Operand};
use crate::context::RobotContext;

/// Spin the flywheels to a preset and feed once both are at speed.
///
/// In `fire_once` mode the command finishes when a note that was loaded at
/// start has left the beam break.
pub struct ShooterCommand {
    name: String,
    left_rpm: f64,
    right_rpm: f64,
    fire_once: bool,
    loaded: bool,
    fired: bool,
}

impl ShooterCommand {
    pub fn new(name: impl Into<String>, left_rpm: f64, right_rpm: f64) -> Self {
        Self {
            name: name.into(),
            left_rpm,
            right_rpm,
            fire_once: false,
            loaded: false,
            fired: false,
        }
    }

    pub fn fire_once(mut self) -> Self {
        self.fire_once = true;
        self
    }
}

impl Command for ShooterCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        Requirements::SHOOTER
    }

    fn start(&mut self, ctx: &mut RobotContext) {
        self.loaded = ctx.subsystems.shooter.note_present();
        self.fired = false;
        ctx.subsystems.shooter.set_flywheels(self.left_rpm, self.right_rpm);
        ctx.subsystems.shooter.set_indexer(0.0);
    }

    fn tick(&mut self, ctx: &mut RobotContext) {
        let shooter = &mut ctx.subsystems.shooter;
        shooter.set_flywheels(self.left_rpm, self.right_rpm);
        if shooter.at_speed() {
            let feed = shooter.config().feed_rpm;
            shooter.set_indexer(feed);
        } else {
            shooter.set_indexer(0.0);
        }
        if self.loaded && !shooter.note_present() && !self.fired {
            debug!("{}: note released", self.name);
            self.fired = true;
        }
    }

    fn is_finished(&self, _ctx: &RobotContext) -> bool {
        self.fire_once && (self.fired || !self.loaded)
    }

    fn end(&mut self, ctx: &mut RobotContext, _interrupted: bool) {
        ctx.subsystems.shooter.idle();
    }
}

/// Run the indexer at an operator-controlled speed with flywheels idling.
pub struct IndexingCommand {
    name: String,
    rpm: Operand,
}

impl IndexingCommand {
    pub fn new(name: impl Into<String>, rpm: impl Into<Operand>) -> Self {
        Self {
            name: name.into(),
            rpm: rpm.into(),
        }
    }
}

impl Command for IndexingCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        Requirements::SHOOTER
    }

    fn tick(&mut self, ctx: &mut RobotContext) {
        let rpm = self.rpm.eval(ctx);
        let shooter = &mut ctx.subsystems.shooter;
        let idle = shooter.config().idle_rpm;
        shooter.set_flywheels(idle, idle);
        shooter.set_indexer(rpm);
    }

    fn end(&mut self, ctx: &mut RobotContext, _interrupted: bool) {
        ctx.subsystems.shooter.idle();
    }
}
