//! Trigger bindings driven through the scheduler.

use crescendo_common::input::{Axis, Button};
use crescendo_common::subsystem::Requirements;
use crescendo_robot::scheduler::Scheduler;
use crescendo_robot::trigger::{ActivationRule, Condition};

use super::support::{Recorder, axis, count, idle, log, press, sim_ctx};

#[test]
fn while_true_runs_exactly_the_held_periods() {
    let (mut ctx, _) = sim_ctx();
    let log = log();
    let mut s = Scheduler::new();
    let id = s.register(Recorder::forever("held", Requirements::INTAKE, &log));
    s.bind(Condition::button(0, Button::B), ActivationRule::WhileTrue, id)
        .unwrap();

    let frames = [false, true, true, true, true, false, false];
    for down in frames {
        ctx.begin_period(if down { press(0, Button::B) } else { idle() });
        s.run(&mut ctx);
    }
    assert_eq!(count(&log, "held.start"), 1);
    assert_eq!(count(&log, "held.tick"), 4);
    assert_eq!(count(&log, "held.end(true)"), 1);
    assert!(!s.is_running(id));
}

#[test]
fn rising_edge_command_outlives_the_press() {
    let (mut ctx, _) = sim_ctx();
    let log = log();
    let mut s = Scheduler::new();
    let id = s.register(Recorder::new("tap", Requirements::ARM, Some(3), &log));
    s.bind(Condition::button(1, Button::A), ActivationRule::OnRisingEdge, id)
        .unwrap();

    ctx.begin_period(press(1, Button::A));
    s.run(&mut ctx);
    for _ in 0..4 {
        ctx.begin_period(idle());
        s.run(&mut ctx);
    }
    assert_eq!(count(&log, "tap.tick"), 3);
    assert_eq!(count(&log, "tap.end(false)"), 1);
}

#[test]
fn later_binding_wins_contested_subsystem() {
    let (mut ctx, _) = sim_ctx();
    let log = log();
    let mut s = Scheduler::new();
    let first = s.register(Recorder::forever("first", Requirements::SHOOTER, &log));
    let second = s.register(Recorder::forever("second", Requirements::SHOOTER, &log));
    s.bind(Condition::button(0, Button::X), ActivationRule::OnRisingEdge, first)
        .unwrap();
    s.bind(Condition::button(0, Button::X), ActivationRule::OnRisingEdge, second)
        .unwrap();

    ctx.begin_period(press(0, Button::X));
    s.run(&mut ctx);
    assert!(s.is_running(second));
    assert_eq!(count(&log, "first.end(true)"), 1);
    assert_eq!(count(&log, "first.tick"), 0);
}

#[test]
fn axis_threshold_and_note_conditions() {
    let (mut ctx, sim) = sim_ctx();
    let log = log();
    let mut s = Scheduler::new();
    let spin = s.register(Recorder::forever("spin", Requirements::SHOOTER, &log));
    let noted = s.register(Recorder::new("noted", Requirements::empty(), Some(1), &log));
    s.bind(
        Condition::AxisAbove {
            port: 1,
            axis: Axis::LeftTrigger,
            threshold: 0.5,
        },
        ActivationRule::WhileTrue,
        spin,
    )
    .unwrap();
    s.bind(Condition::NoteCaptured, ActivationRule::OnRisingEdge, noted)
        .unwrap();

    ctx.begin_period(axis(1, Axis::LeftTrigger, 0.4));
    s.run(&mut ctx);
    assert!(!s.is_running(spin));

    ctx.begin_period(axis(1, Axis::LeftTrigger, 0.9));
    s.run(&mut ctx);
    assert!(s.is_running(spin));

    sim.beam_break.set_present(true);
    ctx.begin_period(idle());
    s.run(&mut ctx);
    assert!(!s.is_running(spin));
    assert_eq!(count(&log, "noted.start"), 1);
}

#[test]
fn deregistered_command_is_unbound() {
    let (mut ctx, _) = sim_ctx();
    let log = log();
    let mut s = Scheduler::new();
    let id = s.register(Recorder::forever("gone", Requirements::DRIVE, &log));
    s.bind(Condition::button(0, Button::Y), ActivationRule::WhileTrue, id)
        .unwrap();
    s.deregister(id, &mut ctx);
    assert_eq!(s.binding_count(), 0);
    ctx.begin_period(press(0, Button::Y));
    s.run(&mut ctx);
    assert!(log.borrow().is_empty());
}
