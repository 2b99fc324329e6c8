//! Autonomous routines resolved from configuration and run on simulated
//! hardware.

use std::fs;
use std::path::Path;

use crescendo_common::robot::config::RobotConfig;
use crescendo_common::robot::routine::{RoutineConfig, RoutineStep};
use crescendo_common::subsystem::SubsystemId;
use crescendo_robot::container::{ContainerError, RobotContainer};
use crescendo_robot::registry::RegistryError;

use tempfile::TempDir;

use super::support::{SharedSink, idle};

fn step(command: &str) -> RoutineStep {
    RoutineStep::Command {
        command: command.to_string(),
    }
}

fn config_with(name: &str, steps: Vec<RoutineStep>) -> RobotConfig {
    let mut config = RobotConfig::default();
    config.routines.push(RoutineConfig {
        name: name.to_string(),
        steps,
    });
    config
}

#[test]
fn shipped_configuration_builds_every_routine() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/robot.toml");
    let config = RobotConfig::load_validated(&path).unwrap();
    let sink = SharedSink::default();
    let (mut robot, _) = RobotContainer::simulated(&config, sink.telemetry()).unwrap();
    let names: Vec<String> = robot.routines().names().map(str::to_string).collect();
    assert!(names.iter().any(|n| n == "center blue"));
    for name in names {
        robot.chooser_mut().select(name.clone());
        assert!(robot.autonomous_init().unwrap().is_some(), "{name}");
    }
}

#[test]
fn unknown_routine_is_reported_not_run() {
    let (mut robot, _) =
        RobotContainer::simulated(&RobotConfig::default(), SharedSink::default().telemetry())
            .unwrap();
    robot.chooser_mut().select("top far");
    assert!(matches!(
        robot.autonomous_init(),
        Err(RegistryError::NotFound(name)) if name == "top far"
    ));
    assert!(robot.scheduler().running().is_empty());
}

#[test]
fn routine_naming_missing_command_fails_at_startup() {
    let config = config_with("broken", vec![step("Shoot"), step("Dance")]);
    let err = RobotContainer::simulated(&config, SharedSink::default().telemetry()).unwrap_err();
    assert!(matches!(
        err,
        ContainerError::Registry(RegistryError::UnknownCommand { ref command, .. }) if command == "Dance"
    ));
}

#[test]
fn routine_file_from_disk_is_selectable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("robot.toml");
    fs::write(
        &path,
        r#"
[[routines]]
name = "wait then stow"
steps = [{ wait = 0.1 }, { command = "Down" }]
"#,
    )
    .unwrap();
    let config = RobotConfig::load_validated(&path).unwrap();
    let (mut robot, _) =
        RobotContainer::simulated(&config, SharedSink::default().telemetry()).unwrap();
    robot.chooser_mut().select("wait then stow");
    let auto = robot.autonomous_init().unwrap().unwrap();
    assert!(robot.scheduler().running().contains(&auto));
}

#[test]
fn shoot_then_raise_arm() {
    let config = config_with("shoot and amp", vec![step("Shoot"), step("amp")]);
    let amp = config.arm.amp;
    let tolerance = config.arm.tolerance;
    let feed = config.shooter.feed_rpm;
    let sink = SharedSink::default();
    let (mut robot, sim) = RobotContainer::simulated(&config, sink.telemetry()).unwrap();

    sim.beam_break.set_present(true);
    robot.chooser_mut().select("shoot and amp");
    let auto = robot.autonomous_init().unwrap().unwrap();
    assert_eq!(robot.scheduler().owner(SubsystemId::Shooter), Some(auto));

    // Flywheels spin up before the indexer feeds.
    robot.run_period(idle());
    assert_eq!(sim.indexer.reference(), 0.0);
    let mut fed = false;
    for _ in 0..40 {
        robot.run_period(idle());
        if sim.indexer.reference() == feed {
            fed = true;
            break;
        }
    }
    assert!(fed, "indexer never fed");
    assert!(sim.left_flywheel.velocity() > 5000.0);

    // Note leaves; the arm step takes over.
    sim.beam_break.set_present(false);
    robot.run_period(idle());
    robot.run_period(idle());
    assert_eq!(robot.ctx().subsystems.arm.goal(), Some(amp));
    assert_eq!(
        robot.ctx().subsystems.shooter.references().left,
        config.shooter.idle_rpm
    );

    for _ in 0..200 {
        if !robot.scheduler().is_running(auto) {
            break;
        }
        robot.run_period(idle());
    }
    assert!(!robot.scheduler().is_running(auto));
    assert!((sim.arm.position() - amp).abs() < tolerance);
    assert_eq!(sink.boolean("arm/busy"), Some(false));
}

#[test]
fn shot_times_out_without_release() {
    let config = config_with("stuck", vec![step("Shoot")]);
    let (mut robot, sim) =
        RobotContainer::simulated(&config, SharedSink::default().telemetry()).unwrap();
    sim.beam_break.set_present(true);
    robot.chooser_mut().select("stuck");
    let auto = robot.autonomous_init().unwrap().unwrap();

    // Two seconds at 50 Hz.
    for _ in 0..99 {
        robot.run_period(idle());
    }
    assert!(robot.scheduler().is_running(auto));
    robot.run_period(idle());
    robot.run_period(idle());
    assert!(!robot.scheduler().is_running(auto));
}

#[test]
fn drive_segments_play_back_field_relative() {
    let config = config_with(
        "drive",
        vec![RoutineStep::Drive {
            drive: vec![crescendo_common::robot::routine::DriveSegment {
                seconds: 0.1,
                vx: 1.0,
                vy: 0.0,
                omega: 0.0,
            }],
        }],
    );
    let (mut robot, sim) =
        RobotContainer::simulated(&config, SharedSink::default().telemetry()).unwrap();
    robot.chooser_mut().select("drive");
    let auto = robot.autonomous_init().unwrap().unwrap();
    robot.run_period(idle());
    assert_eq!(sim.drive.speeds().vx, 1.0);
    assert!(sim.drive.field_relative());
    for _ in 0..10 {
        robot.run_period(idle());
    }
    assert!(!robot.scheduler().is_running(auto));
    // Drive default resumes with centred sticks.
    assert_eq!(sim.drive.speeds().vx, 0.0);
}

#[test]
fn oversized_drive_segment_runs_without_faulting() {
    let config = config_with(
        "long haul",
        vec![RoutineStep::Drive {
            drive: vec![crescendo_common::robot::routine::DriveSegment {
                seconds: 1e20,
                vx: 1.0,
                vy: 0.0,
                omega: 0.0,
            }],
        }],
    );
    assert!(config.validate().is_ok());
    let (mut robot, sim) =
        RobotContainer::simulated(&config, SharedSink::default().telemetry()).unwrap();
    robot.chooser_mut().select("long haul");
    let auto = robot.autonomous_init().unwrap().unwrap();
    for _ in 0..5 {
        robot.run_period(idle());
    }
    assert!(robot.scheduler().is_running(auto));
    assert_eq!(sim.drive.speeds().vx, 1.0);
}

#[test]
fn teleop_hands_subsystems_back_to_defaults() {
    let config = config_with("long wait", vec![RoutineStep::Wait { wait: 5.0 }, step("Down")]);
    let (mut robot, _) =
        RobotContainer::simulated(&config, SharedSink::default().telemetry()).unwrap();
    robot.chooser_mut().select("long wait");
    let auto = robot.autonomous_init().unwrap().unwrap();
    robot.run_period(idle());
    assert_eq!(robot.scheduler().owner(SubsystemId::Arm), Some(auto));
    assert_ne!(
        robot.scheduler().owner(SubsystemId::Drive),
        None,
        "drive default runs alongside"
    );

    robot.teleop_init();
    robot.run_period(idle());
    assert!(!robot.scheduler().is_running(auto));
    assert_eq!(robot.scheduler().owner(SubsystemId::Arm), None);
}
