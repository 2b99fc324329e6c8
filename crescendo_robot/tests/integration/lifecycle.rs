//! Command lifecycle and arbitration through the scheduler.

use crescendo_common::subsystem::{Requirements, SubsystemId};
use crescendo_robot::command::composite::{Parallel, Sequence};
use crescendo_robot::command::{CommandExt, CompositionError};
use crescendo_robot::scheduler::{ScheduleOutcome, Scheduler, SchedulerError};

use super::support::{Recorder, count, idle, log, position, sim_ctx};

#[test]
fn at_most_one_owner_per_subsystem() {
    let (mut ctx, _) = sim_ctx();
    let log = log();
    let mut s = Scheduler::new();
    let a = s.register(Recorder::forever("a", Requirements::ARM | Requirements::SHOOTER, &log));
    let b = s.register(Recorder::forever("b", Requirements::SHOOTER, &log));
    let c = s.register(Recorder::forever("c", Requirements::INTAKE, &log));

    assert_eq!(s.schedule(a, &mut ctx), ScheduleOutcome::Started);
    assert_eq!(s.schedule(c, &mut ctx), ScheduleOutcome::Started);
    assert_eq!(s.schedule(b, &mut ctx), ScheduleOutcome::Started);

    // `a` lost the shooter and, being one unit, the arm with it.
    assert!(!s.is_running(a));
    assert_eq!(s.owner(SubsystemId::Shooter), Some(b));
    assert_eq!(s.owner(SubsystemId::Arm), None);
    assert_eq!(s.owner(SubsystemId::Intake), Some(c));
    assert_eq!(s.running(), [c, b]);
}

#[test]
fn interrupted_end_completes_before_newcomer_starts() {
    let (mut ctx, _) = sim_ctx();
    let log = log();
    let mut s = Scheduler::new();
    let a = s.register(Recorder::forever("a", Requirements::ARM, &log));
    let b = s.register(Recorder::forever("b", Requirements::ARM, &log));
    s.schedule(a, &mut ctx);
    s.schedule(b, &mut ctx);
    assert_eq!(*log.borrow(), ["a.start", "a.end(true)", "b.start"]);
}

#[test]
fn non_interruptible_incumbent_refuses_newcomer() {
    let (mut ctx, _) = sim_ctx();
    let log = log();
    let mut s = Scheduler::new();
    let a = s.register(Recorder::forever("a", Requirements::ARM, &log).stubborn());
    let b = s.register(Recorder::forever("b", Requirements::ARM | Requirements::DRIVE, &log));
    s.schedule(a, &mut ctx);
    assert_eq!(
        s.schedule(b, &mut ctx),
        ScheduleOutcome::Refused {
            held_by: a,
            subsystem: SubsystemId::Arm
        }
    );
    assert!(s.is_running(a));
    assert_eq!(s.owner(SubsystemId::Drive), None);
    assert_eq!(count(&log, "b.start"), 0);
}

#[test]
fn finished_command_ends_normally_and_releases() {
    let (mut ctx, _) = sim_ctx();
    let log = log();
    let mut s = Scheduler::new();
    let a = s.register(Recorder::new("a", Requirements::INTAKE, Some(2), &log));
    s.schedule(a, &mut ctx);
    for _ in 0..3 {
        ctx.begin_period(idle());
        s.run(&mut ctx);
    }
    assert_eq!(*log.borrow(), ["a.start", "a.tick", "a.tick", "a.end(false)"]);
    assert_eq!(s.owner(SubsystemId::Intake), None);
}

#[test]
fn cancel_all_interrupts_everything() {
    let (mut ctx, _) = sim_ctx();
    let log = log();
    let mut s = Scheduler::new();
    let a = s.register(Recorder::forever("a", Requirements::ARM, &log));
    let b = s.register(Recorder::forever("b", Requirements::DRIVE, &log));
    s.schedule(a, &mut ctx);
    s.schedule(b, &mut ctx);
    s.cancel_all(&mut ctx);
    assert!(s.running().is_empty());
    assert_eq!(count(&log, "a.end(true)"), 1);
    assert_eq!(count(&log, "b.end(true)"), 1);
    assert!(!s.cancel(a, &mut ctx));
}

// ─── Sequences ──────────────────────────────────────────────────────

#[test]
fn sequence_runs_children_in_order() {
    let (mut ctx, _) = sim_ctx();
    let log = log();
    let mut s = Scheduler::new();
    let seq = Sequence::named(
        "seq",
        vec![
            Recorder::new("one", Requirements::ARM, Some(1), &log).boxed(),
            Recorder::new("two", Requirements::SHOOTER, Some(2), &log).boxed(),
        ],
    );
    let id = s.register(seq);
    s.schedule(id, &mut ctx);
    for _ in 0..4 {
        ctx.begin_period(idle());
        s.run(&mut ctx);
    }
    assert!(!s.is_running(id));
    let end_one = position(&log, "one.end(false)").unwrap();
    let start_two = position(&log, "two.start").unwrap();
    assert!(end_one < start_two);
    assert_eq!(count(&log, "two.tick"), 2);
    assert_eq!(count(&log, "two.end(false)"), 1);
}

#[test]
fn interrupting_a_sequence_ends_only_the_current_child() {
    let (mut ctx, _) = sim_ctx();
    let log = log();
    let mut s = Scheduler::new();
    let seq = s.register(Sequence::named(
        "seq",
        vec![
            Recorder::new("one", Requirements::ARM, Some(1), &log).boxed(),
            Recorder::forever("two", Requirements::ARM, &log).boxed(),
            Recorder::forever("three", Requirements::DRIVE, &log).boxed(),
        ],
    ));
    let intruder = s.register(Recorder::forever("intruder", Requirements::DRIVE, &log));
    s.schedule(seq, &mut ctx);
    for _ in 0..2 {
        ctx.begin_period(idle());
        s.run(&mut ctx);
    }
    // The group reserves the drive even though only `three` uses it.
    assert_eq!(s.owner(SubsystemId::Drive), Some(seq));
    s.schedule(intruder, &mut ctx);

    assert_eq!(count(&log, "two.end(true)"), 1);
    assert_eq!(count(&log, "three.start"), 0);
    assert_eq!(count(&log, "three.end(true)"), 0);
    assert_eq!(count(&log, "one.end(false)"), 1);
    assert_eq!(s.owner(SubsystemId::Arm), None);
}

// ─── Parallel Groups ────────────────────────────────────────────────

#[test]
fn parallel_reserves_union_until_group_ends() {
    let (mut ctx, _) = sim_ctx();
    let log = log();
    let mut s = Scheduler::new();
    let group = Parallel::all(vec![
        Recorder::new("quick", Requirements::ARM, Some(1), &log).boxed(),
        Recorder::new("slow", Requirements::SHOOTER, Some(3), &log).boxed(),
    ])
    .unwrap();
    let group = s.register(group);
    s.schedule(group, &mut ctx);
    ctx.begin_period(idle());
    s.run(&mut ctx);
    assert_eq!(count(&log, "quick.end(false)"), 1);
    assert_eq!(s.owner(SubsystemId::Arm), Some(group));

    for _ in 0..3 {
        ctx.begin_period(idle());
        s.run(&mut ctx);
    }
    assert!(!s.is_running(group));
    assert_eq!(s.owner(SubsystemId::Arm), None);
    assert_eq!(s.owner(SubsystemId::Shooter), None);
}

#[test]
fn overlapping_parallel_children_are_rejected() {
    let log = log();
    let err = Parallel::race(vec![
        Recorder::forever("x", Requirements::ARM, &log).boxed(),
        Recorder::forever("y", Requirements::ARM | Requirements::INTAKE, &log).boxed(),
    ])
    .unwrap_err();
    assert!(matches!(err, CompositionError::OverlappingRequirements { .. }));
}

#[test]
fn race_interrupts_losers() {
    let (mut ctx, _) = sim_ctx();
    let log = log();
    let mut s = Scheduler::new();
    let race = s.register(
        Recorder::new("winner", Requirements::ARM, Some(2), &log)
            .race_with(Recorder::forever("loser", Requirements::DRIVE, &log))
            .unwrap(),
    );
    s.schedule(race, &mut ctx);
    for _ in 0..3 {
        ctx.begin_period(idle());
        s.run(&mut ctx);
    }
    assert!(!s.is_running(race));
    assert_eq!(count(&log, "winner.end(false)"), 1);
    assert_eq!(count(&log, "loser.end(true)"), 1);
}

#[test]
fn non_interruptible_child_protects_its_group() {
    let (mut ctx, _) = sim_ctx();
    let log = log();
    let mut s = Scheduler::new();
    let group = s.register(
        Parallel::all(vec![
            Recorder::forever("soft", Requirements::ARM, &log).boxed(),
            Recorder::forever("hard", Requirements::DRIVE, &log)
                .stubborn()
                .boxed(),
        ])
        .unwrap(),
    );
    let other = s.register(Recorder::forever("other", Requirements::ARM, &log));
    s.schedule(group, &mut ctx);
    assert!(matches!(s.schedule(other, &mut ctx), ScheduleOutcome::Refused { .. }));
}

// ─── Defaults ───────────────────────────────────────────────────────

#[test]
fn default_runs_only_while_subsystem_is_free() {
    let (mut ctx, _) = sim_ctx();
    let log = log();
    let mut s = Scheduler::new();
    let default = s.register(Recorder::forever("default", Requirements::INTAKE, &log));
    s.set_default_command(SubsystemId::Intake, default).unwrap();
    let burst = s.register(Recorder::new("burst", Requirements::INTAKE, Some(1), &log));

    ctx.begin_period(idle());
    s.run(&mut ctx);
    assert!(s.is_running(default));

    s.schedule(burst, &mut ctx);
    assert_eq!(count(&log, "default.end(true)"), 1);
    ctx.begin_period(idle());
    s.run(&mut ctx);
    assert_eq!(count(&log, "burst.end(false)"), 1);
    assert!(!s.is_running(default));

    ctx.begin_period(idle());
    s.run(&mut ctx);
    assert!(s.is_running(default));
    assert_eq!(count(&log, "default.start"), 2);
}

#[test]
fn default_must_require_exactly_its_subsystem() {
    let log = log();
    let mut s = Scheduler::new();
    let wide = s.register(Recorder::forever("wide", Requirements::INTAKE | Requirements::ARM, &log));
    assert!(matches!(
        s.set_default_command(SubsystemId::Intake, wide),
        Err(SchedulerError::DefaultRequirementMismatch { .. })
    ));
}
