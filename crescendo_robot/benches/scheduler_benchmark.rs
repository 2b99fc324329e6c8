//! Scheduler period benchmark.
//!
//! Measures one full period (sample → triggers → defaults → tick → apply)
//! of the wired robot on simulated hardware, idle and with every operator
//! binding contested, plus the arm control law on its own.

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use crescendo_common::prelude::*;
use crescendo_robot::container::RobotContainer;
use crescendo_robot::control::feedforward::ArmFeedforward;
use crescendo_robot::control::pid::{PidController, PidGains};
use crescendo_robot::control::profile::{Constraints, ProfileState, TrapezoidProfile};


fn busy_inputs() -> InputSnapshot {
    let mut input = InputSnapshot::default();
    if let Some(pilot) = input.controller_mut(0) {
        pilot.press(Button::X);
        pilot.press(Button::B);
        pilot.set_axis(Axis::LeftY, -0.6);
        pilot.set_axis(Axis::RightX, 0.3);
    }
    if let Some(copilot) = input.controller_mut(1) {
        copilot.press(Button::X);
        copilot.press(Button::RightStick);
        copilot.set_axis(Axis::RightY, -0.4);
    }
    input
}

fn bench_idle_period(c: &mut Criterion) {
    let (mut robot, _sim) =
        RobotContainer::simulated(&RobotConfig::default(), Telemetry::default()).unwrap();
    c.bench_function("scheduler_period_idle", |b| {
        b.iter(|| robot.run_period(black_box(InputSnapshot::default())));
    });
}

fn bench_contested_period(c: &mut Criterion) {
    let (mut robot, _sim) =
        RobotContainer::simulated(&RobotConfig::default(), Telemetry::default()).unwrap();
    let mut cycle = 0u64;
    c.bench_function("scheduler_period_contested", |b| {
        b.iter(|| {
            cycle += 1;
            // Alternate so bindings keep starting and ending.
            let input = if cycle % 2 == 0 {
                busy_inputs()
            } else {
                InputSnapshot::default()
            };
            robot.run_period(black_box(input));
        });
    });
}

fn bench_arm_control_law(c: &mut Criterion) {
    let arm = RobotConfig::default().arm;
    let dt = DEFAULT_PERIOD.as_secs_f64();
    let profile = TrapezoidProfile::new(Constraints {
        max_velocity: arm.max_velocity,
        max_acceleration: arm.max_acceleration,
    });
    let ff = ArmFeedforward::from_arm(&arm);
    let mut pid = PidController::new(PidGains::from_arm(&arm));
    let mut state = ProfileState::new(0.0, 0.0);
    let goal = ProfileState::new(arm.amp, 0.0);
    let mut measured = 0.0;

    c.bench_function("arm_profile_pid_feedforward", |b| {
        b.iter(|| {
            let next = profile.calculate(dt, state, goal);
            let accel = (next.velocity - state.velocity) / dt;
            let volts = pid.calculate(next.position - measured, dt)
                + ff.calculate(next.position, next.velocity, accel);
            measured += (next.position - measured) * 0.5;
            state = if (goal.position - next.position).abs() < 1e-9 {
                ProfileState::new(0.0, 0.0)
            } else {
                next
            };
            black_box(volts)
        });
    });
}

criterion_group!(
    benches,
    bench_idle_period,
    bench_contested_period,
    bench_arm_control_law
);
criterion_main!(benches);
