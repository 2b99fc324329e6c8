//! Subsystem control laws, output limits and hardware-fault handling on
//! simulated devices.

use crescendo_common::hal::{ControlType, HalError};
use crescendo_common::input::Pov;
use crescendo_common::robot::config::RobotConfig;
use crescendo_common::telemetry::{Telemetry, TelemetryError, TelemetrySink, TelemetryValue};
use crescendo_robot::container::RobotContainer;
use crescendo_robot::context::RobotContext;

use super::support::{SharedSink, idle, pov};

fn disconnected(device: &'static str) -> Option<HalError> {
    Some(HalError::Disconnected { device })
}

#[test]
fn arm_voltage_stays_within_limit_under_aggressive_gains() {
    let mut config = RobotConfig::default();
    config.arm.kp = 1000.0;
    config.arm.kd = 50.0;
    config.arm.out_max = 10.0;
    let (mut robot, sim) = RobotContainer::simulated(&config, Telemetry::default()).unwrap();

    robot.run_period(pov(1, Pov::Up));
    for _ in 0..150 {
        robot.run_period(idle());
        assert!(sim.arm.voltage().abs() <= 10.0);
    }
    robot.run_period(pov(1, Pov::Down));
    for _ in 0..150 {
        robot.run_period(idle());
        assert!(sim.arm.voltage().abs() <= 10.0);
    }
}

#[test]
fn velocity_and_voltage_references_are_clamped() {
    let config = RobotConfig::default();
    let (mut ctx, sim) = RobotContext::simulated(&config, Telemetry::default());
    ctx.begin_period(idle());
    ctx.subsystems.shooter.set_flywheels(1.0e9, -1.0e9);
    ctx.subsystems.shooter.set_indexer(f64::NAN);
    ctx.subsystems.intake.set_voltage(-40.0);
    ctx.subsystems.apply(&mut ctx.telemetry);

    assert_eq!(sim.left_flywheel.reference(), config.shooter.max_rpm);
    assert_eq!(sim.right_flywheel.reference(), -config.shooter.max_rpm);
    assert_eq!(sim.indexer.reference(), 0.0);
    assert_eq!(sim.left_flywheel.control(), Some(ControlType::Velocity));
    assert_eq!(sim.intake.reference(), -config.intake.max_voltage);
    assert_eq!(sim.intake.control(), Some(ControlType::Voltage));
}

#[test]
fn arm_holds_last_output_through_hardware_fault() {
    let sink = SharedSink::default();
    let (mut robot, sim) =
        RobotContainer::simulated(&RobotConfig::default(), sink.telemetry()).unwrap();
    robot.run_period(pov(1, Pov::Up));
    for _ in 0..5 {
        robot.run_period(idle());
    }
    let held = sim.arm.voltage();
    let writes = sim.arm.writes();
    assert!(held > 0.0);

    sim.arm.set_fault(disconnected("arm"));
    for _ in 0..3 {
        robot.run_period(idle());
    }
    assert_eq!(sim.arm.writes(), writes);
    assert_eq!(robot.ctx().subsystems.arm.output(), held);
    assert_eq!(sink.boolean("arm/fault"), Some(true));
    assert!(robot.ctx().subsystems.arm.is_faulted());

    sim.arm.set_fault(None);
    robot.run_period(idle());
    assert!(!robot.ctx().subsystems.arm.is_faulted());
    assert_eq!(sink.boolean("arm/fault"), Some(false));
}

#[test]
fn unreadable_beam_break_counts_as_no_note() {
    let (mut ctx, sim) = RobotContext::simulated(&RobotConfig::default(), Telemetry::default());
    sim.beam_break.set_present(true);
    sim.beam_break.set_fault(disconnected("beam_break"));
    ctx.begin_period(idle());
    ctx.subsystems.sample();
    assert!(!ctx.subsystems.shooter.note_present());
    assert!(ctx.subsystems.shooter.sensor_fault());
    assert!(!ctx.subsystems.shooter.pull_note_in());
    assert_eq!(ctx.subsystems.shooter.references().indexer, -600.0);

    sim.beam_break.set_fault(None);
    ctx.subsystems.sample();
    assert!(ctx.subsystems.shooter.pull_note_in());
    assert_eq!(ctx.subsystems.shooter.references().indexer, 0.0);
    assert!(!ctx.subsystems.shooter.sensor_fault());
}

#[test]
fn pull_note_in_is_idempotent_within_a_period() {
    let (mut ctx, sim) = RobotContext::simulated(&RobotConfig::default(), Telemetry::default());
    ctx.begin_period(idle());
    ctx.subsystems.sample();
    let first = ctx.subsystems.shooter.pull_note_in();
    // Sensor changes mid-period are not seen until the next sample.
    sim.beam_break.set_present(true);
    let second = ctx.subsystems.shooter.pull_note_in();
    assert_eq!(first, second);
    assert_eq!(ctx.subsystems.shooter.references().indexer, -600.0);
}

struct DeadSink;

impl TelemetrySink for DeadSink {
    fn publish(&mut self, _key: &str, _value: TelemetryValue) -> Result<(), TelemetryError> {
        Err(TelemetryError::Unavailable("dashboard offline".into()))
    }
}

#[test]
fn failing_telemetry_never_changes_control() {
    let (mut quiet, quiet_sim) =
        RobotContainer::simulated(&RobotConfig::default(), Telemetry::new(Box::new(DeadSink)))
            .unwrap();
    let (mut loud, loud_sim) =
        RobotContainer::simulated(&RobotConfig::default(), Telemetry::default()).unwrap();
    for robot in [&mut quiet, &mut loud] {
        robot.run_period(pov(1, Pov::Up));
        for _ in 0..20 {
            robot.run_period(idle());
        }
    }
    assert_eq!(quiet_sim.arm.position(), loud_sim.arm.position());
    assert_eq!(quiet_sim.arm.voltage(), loud_sim.arm.voltage());
    assert!(quiet.ctx().telemetry.dropped() > 0);
    assert_eq!(loud.ctx().telemetry.dropped(), 0);
}

#[test]
fn scheduler_publishes_running_count() {
    let sink = SharedSink::default();
    let (mut robot, _) =
        RobotContainer::simulated(&RobotConfig::default(), sink.telemetry()).unwrap();
    robot.run_period(idle());
    assert_eq!(sink.number("scheduler/running"), Some(3.0));
    assert!(sink.number("arm/position").is_some());
    assert!(sink.number("shooter/speed").is_some());
}
