//! Arm commands.

use crescendo_common::subsystem::Requirements;

use super::{Command, Operand};
use crate::context::RobotContext;

/// Drive the arm to a setpoint; finishes once it is within tolerance.
///
/// The target is re-evaluated every tick, so an axis operand retargets
/// continuously. Completing leaves the arm holding the goal; an
/// interruption holds wherever the arm is.
pub struct SetPointControl {
    name: String,
    target: Operand,
}

impl SetPointControl {
    pub fn new(name: impl Into<String>, target: impl Into<Operand>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
        }
    }
}

impl Command for SetPointControl {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        Requirements::ARM
    }

    fn start(&mut self, ctx: &mut RobotContext) {
        let goal = self.target.eval(ctx);
        ctx.subsystems.arm.set_reference(goal);
    }

    fn tick(&mut self, ctx: &mut RobotContext) {
        let goal = self.target.eval(ctx);
        ctx.subsystems.arm.set_reference(goal);
    }

    fn is_finished(&self, ctx: &RobotContext) -> bool {
        !ctx.subsystems.arm.is_busy()
    }

    fn end(&mut self, ctx: &mut RobotContext, interrupted: bool) {
        if interrupted {
            ctx.subsystems.arm.hold_position();
        }
    }
}

/// Operator voltage control of the arm; runs until interrupted.
pub struct ManualArmControl {
    volts: Operand,
}

impl ManualArmControl {
    pub fn new(volts: Operand) -> Self {
        Self { volts }
    }
}

impl Command for ManualArmControl {
    fn name(&self) -> &str {
        "ManualArmControl"
    }

    fn requirements(&self) -> Requirements {
        Requirements::ARM
    }

    fn tick(&mut self, ctx: &mut RobotContext) {
        let volts = self.volts.eval(ctx);
        ctx.subsystems.arm.manual_control(volts);
    }

    fn end(&mut self, ctx: &mut RobotContext, _interrupted: bool) {
        ctx.subsystems.arm.idle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subsystem::arm::ArmMode;
    use crescendo_common::input::InputSnapshot;
    use crescendo_common::robot::config::RobotConfig;
    use crescendo_common::telemetry::Telemetry;

    fn ctx() -> RobotContext {
        let (mut ctx, _) = RobotContext::simulated(&RobotConfig::default(), Telemetry::default());
        ctx.begin_period(InputSnapshot::default());
        ctx
    }

    #[test]
    fn setpoint_finishes_when_arm_settles() {
        let mut c = ctx();
        let mut cmd = SetPointControl::new("amp", 0.26);
        cmd.start(&mut c);
        let mut periods = 0;
        loop {
            c.begin_period(InputSnapshot::default());
            c.subsystems.sample();
            cmd.tick(&mut c);
            if cmd.is_finished(&c) {
                break;
            }
            c.subsystems.apply(&mut c.telemetry);
            periods += 1;
            assert!(periods < 200, "arm never settled");
        }
        assert!((c.subsystems.arm.position() - 0.26).abs() < 0.01);
        cmd.end(&mut c, false);
        assert_eq!(c.subsystems.arm.goal(), Some(0.26));
    }

    #[test]
    fn manual_control_reverts_to_hold() {
        let mut c = ctx();
        let mut cmd = ManualArmControl::new(Operand::Constant(4.0));
        cmd.start(&mut c);
        cmd.tick(&mut c);
        assert_eq!(c.subsystems.arm.mode(), ArmMode::Manual { volts: 4.0 });
        cmd.end(&mut c, true);
        assert!(matches!(c.subsystems.arm.mode(), ArmMode::Setpoint { .. }));
    }
}
