//! Operator bindings and default commands wired by the container.

use crescendo_common::input::{Axis, Button, InputSnapshot, Pov};
use crescendo_common::robot::config::RobotConfig;
use crescendo_common::subsystem::SubsystemId;
use crescendo_robot::container::RobotContainer;
use crescendo_robot::hal::sim::SimHandles;

use super::support::{SharedSink, axis, idle, pov, press};

const PILOT: u8 = 0;
const COPILOT: u8 = 1;

fn robot() -> (RobotContainer, SimHandles, SharedSink) {
    let sink = SharedSink::default();
    let (robot, sim) = RobotContainer::simulated(&RobotConfig::default(), sink.telemetry()).unwrap();
    (robot, sim, sink)
}

#[test]
fn handoff_stops_on_beam_break() {
    let (mut robot, sim, sink) = robot();
    robot.run_period(press(PILOT, Button::RightBumper));
    assert_eq!(sim.intake.reference(), -12.0);
    assert_eq!(sim.indexer.reference(), -600.0);
    assert_eq!(sim.left_flywheel.reference(), 1000.0);

    sim.beam_break.set_present(true);
    robot.run_period(press(PILOT, Button::RightBumper));
    assert_eq!(sim.intake.reference(), 0.0);
    assert_eq!(sim.indexer.reference(), 0.0);
    assert_eq!(sink.boolean("handoff/captured"), Some(true));

    // Still held: the restarted handoff sees the note and stays stopped.
    robot.run_period(press(PILOT, Button::RightBumper));
    assert_eq!(sim.indexer.reference(), 0.0);
    assert_eq!(sim.intake.reference(), 0.0);
}

#[test]
fn copilot_pov_moves_arm_between_presets() {
    let (mut robot, _, _) = robot();
    let arm = RobotConfig::default().arm;
    robot.run_period(pov(COPILOT, Pov::Up));
    assert_eq!(robot.ctx().subsystems.arm.goal(), Some(arm.amp));
    robot.run_period(idle());
    robot.run_period(pov(COPILOT, Pov::Right));
    assert_eq!(robot.ctx().subsystems.arm.goal(), Some(arm.shoot_flat));
    robot.run_period(idle());
    robot.run_period(pov(COPILOT, Pov::Down));
    assert_eq!(robot.ctx().subsystems.arm.goal(), Some(arm.stow));
}

#[test]
fn copilot_speaker_preset_while_held() {
    let (mut robot, sim, _) = robot();
    robot.run_period(press(COPILOT, Button::X));
    assert_eq!(sim.left_flywheel.reference(), 5200.0);
    assert_eq!(sim.right_flywheel.reference(), 5100.0);
    robot.run_period(idle());
    robot.run_period(idle());
    assert_eq!(sim.left_flywheel.reference(), 1000.0);
}

#[test]
fn copilot_a_disables_shooter_for_one_period() {
    let (mut robot, sim, _) = robot();
    robot.run_period(idle());
    assert_eq!(sim.left_flywheel.reference(), 1000.0);
    robot.run_period(press(COPILOT, Button::A));
    assert_eq!(sim.left_flywheel.reference(), 0.0);
    assert_eq!(sim.indexer.reference(), 0.0);
    robot.run_period(idle());
    assert_eq!(sim.left_flywheel.reference(), 1000.0);
}

#[test]
fn manual_arm_then_hold_on_release() {
    let (mut robot, sim, _) = robot();
    let mut input = press(COPILOT, Button::RightStick);
    if let Some(pad) = input.controller_mut(COPILOT) {
        pad.set_axis(Axis::RightY, 0.5);
    }
    let start = sim.arm.position();
    for _ in 0..5 {
        robot.run_period(input);
    }
    let expected = -(0.5 - 0.01) / 0.99 * 12.0;
    assert!((sim.arm.voltage() - expected).abs() < 1e-9);
    // Lowering from stow rests on the hard stop.
    assert_eq!(sim.arm.position(), start);

    robot.run_period(idle());
    let arm = &robot.ctx().subsystems.arm;
    let goal = arm.goal().unwrap();
    assert!((goal - arm.position()).abs() < 1e-12);
}

#[test]
fn manual_arm_ignores_upward_stick() {
    let (mut robot, sim, _) = robot();
    let mut input = press(COPILOT, Button::RightStick);
    if let Some(pad) = input.controller_mut(COPILOT) {
        pad.set_axis(Axis::RightY, -0.8);
    }
    robot.run_period(input);
    let s = robot.scheduler();
    let owner = s.owner(SubsystemId::Arm).unwrap();
    assert_eq!(s.name(owner), Some("ManualArmControl"));
    assert_eq!(sim.arm.voltage(), 0.0);
}

#[test]
fn pilot_aim_takes_drive_arm_and_shooter() {
    let (mut robot, sim, _) = robot();
    robot.run_period(press(PILOT, Button::X));
    let s = robot.scheduler();
    let aim = s.owner(SubsystemId::Drive).unwrap();
    assert_eq!(s.name(aim), Some("Aim"));
    assert_eq!(s.owner(SubsystemId::Arm), Some(aim));
    assert_eq!(s.owner(SubsystemId::Shooter), Some(aim));
    assert_eq!(sim.left_flywheel.reference(), 5200.0);
    assert_eq!(
        robot.ctx().subsystems.arm.goal(),
        Some(RobotConfig::default().arm.shoot_flat)
    );

    robot.run_period(idle());
    assert_ne!(robot.scheduler().owner(SubsystemId::Drive), Some(aim));
}

#[test]
fn defaults_follow_sticks_and_triggers() {
    let (mut robot, sim, _) = robot();
    let mut input = InputSnapshot::default();
    if let Some(pad) = input.controller_mut(PILOT) {
        pad.set_axis(Axis::LeftY, -1.0);
        pad.set_axis(Axis::LeftTrigger, 1.0);
        pad.set_axis(Axis::RightTrigger, 0.5);
    }
    // Only the pilot's right trigger drives the intake.
    if let Some(pad) = input.controller_mut(COPILOT) {
        pad.set_axis(Axis::RightTrigger, 1.0);
    }
    robot.run_period(input);
    assert!((sim.drive.speeds().vx - 4.5).abs() < 1e-9);
    assert_eq!(sim.drive.speeds().vy, 0.0);
    assert_eq!(sim.indexer.reference(), -600.0);
    assert_eq!(sim.intake.reference(), -6.0);
}

#[test]
fn pilot_y_resets_gyro_and_b_runs_intake() {
    let (mut robot, sim, _) = robot();
    robot.run_period(press(PILOT, Button::Y));
    robot.run_period(press(PILOT, Button::Y));
    assert_eq!(sim.drive.gyro_resets(), 1);

    robot.run_period(axis(PILOT, Axis::LeftX, 0.0));
    robot.run_period(press(PILOT, Button::B));
    assert_eq!(sim.intake.reference(), -12.0);
}
