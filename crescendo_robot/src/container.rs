//! Robot container: wires subsystems, commands, bindings and routines.
//!
//! The container owns the [`RobotContext`] and the [`Scheduler`] and is the
//! only place that knows the operator layout:
//!
//! | Controller | Input        | Rule      | Command                         |
//! |------------|--------------|-----------|---------------------------------|
//! | pilot      | B            | WhileTrue | intake at full reverse voltage  |
//! | pilot      | right bumper | WhileTrue | handoff                         |
//! | pilot      | Y            | OnRising  | zero gyro                       |
//! | pilot      | X            | WhileTrue | aim (drive + arm + shooter)     |
//! | copilot    | X            | WhileTrue | speaker preset                  |
//! | copilot    | A            | OnRising  | disable shooter                 |
//! | copilot    | POV ↓ → ↑    | OnRising  | arm stow / shoot flat / amp     |
//! | copilot    | right stick  | WhileTrue | manual arm (stick down only)    |

use std::time::Duration;

use crescendo_common::input::{Axis, Button, InputSnapshot, Pov};
use crescendo_common::robot::config::RobotConfig;
use crescendo_common::subsystem::{Requirements, SubsystemId};
use crescendo_common::telemetry::Telemetry;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::command::arm::{ManualArmControl, SetPointControl};
use crate::command::basic::{InstantCommand, PrintCommand};
use crate::command::composite::{EndPolicy, Parallel};
use crate::command::drive::TeleopDrive;
use crate::command::intake::{Handoff, IntakeVoltage};
use crate::command::shooter::{IndexingCommand, ShooterCommand};
use crate::command::{Command, CommandExt, CompositionError, Operand};
use crate::context::RobotContext;
use crate::hal::Hardware;
use crate::hal::sim::SimHandles;
use crate::registry::{AutoChooser, NamedCommands, RegistryError, RoutineRegistry};
use crate::scheduler::{CommandId, ScheduleOutcome, Scheduler, SchedulerError};
use crate::trigger::{ActivationRule, Condition};

/// Give up on a shot after this long even if the note never left.
const SHOOT_TIMEOUT: Duration = Duration::from_secs(2);

/// Deadband on the copilot's manual-arm stick.
const MANUAL_ARM_DEADBAND: f64 = 0.01;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Composition(#[from] CompositionError),
}

pub struct RobotContainer {
    ctx: RobotContext,
    scheduler: Scheduler,
    routines: RoutineRegistry,
    chooser: AutoChooser,
    auto_command: Option<CommandId>,
}

impl RobotContainer {
    pub fn new(
        config: &RobotConfig,
        hardware: Hardware,
        telemetry: Telemetry,
    ) -> Result<Self, ContainerError> {
        let ctx = RobotContext::new(config, hardware, telemetry);
        let mut routines = RoutineRegistry::new(named_commands(config)?);
        for routine in &config.routines {
            routines.register_steps(routine.clone())?;
        }

        let mut scheduler = Scheduler::new();
        configure_defaults(&mut scheduler, config)?;
        configure_bindings(&mut scheduler, config)?;
        info!(
            "robot container ready: {} bindings, {} routines",
            scheduler.binding_count(),
            routines.names().count()
        );

        Ok(Self {
            ctx,
            scheduler,
            routines,
            chooser: AutoChooser::new(),
            auto_command: None,
        })
    }

    /// Container over simulated hardware, with handles to every device.
    pub fn simulated(
        config: &RobotConfig,
        telemetry: Telemetry,
    ) -> Result<(Self, SimHandles), ContainerError> {
        let (hardware, handles) = Hardware::simulated(&config.arm, config.period_s());
        Ok((Self::new(config, hardware, telemetry)?, handles))
    }

    // ─── Mode Transitions ───────────────────────────────────────────

    /// Resolve the chooser's routine and schedule it.
    ///
    /// Returns `Ok(None)` when nothing is selected. A previous autonomous
    /// command is cancelled and dropped first.
    pub fn autonomous_init(&mut self) -> Result<Option<CommandId>, RegistryError> {
        self.drop_auto_command();
        // Commands read sensor state in `start`.
        self.ctx.subsystems.sample();
        let Some(command) = self.chooser.autonomous_command(&self.routines)? else {
            info!("no autonomous routine selected");
            return Ok(None);
        };
        let name = command.name().to_string();
        let id = self.scheduler.register(command);
        match self.scheduler.schedule(id, &mut self.ctx) {
            ScheduleOutcome::Started | ScheduleOutcome::AlreadyRunning => {
                info!("autonomous routine '{name}' scheduled");
            }
            outcome => warn!("autonomous routine '{name}' not started: {outcome:?}"),
        }
        self.auto_command = Some(id);
        Ok(Some(id))
    }

    /// Stop the autonomous routine so operator defaults take over.
    pub fn teleop_init(&mut self) {
        if let Some(id) = self.auto_command {
            if self.scheduler.cancel(id, &mut self.ctx) {
                debug!("autonomous routine cancelled for teleop");
            }
        }
    }

    /// End every running command.
    pub fn disabled_init(&mut self) {
        self.scheduler.cancel_all(&mut self.ctx);
    }

    /// Run one period with this period's operator inputs.
    pub fn run_period(&mut self, inputs: InputSnapshot) {
        self.ctx.begin_period(inputs);
        self.scheduler.run(&mut self.ctx);
    }

    pub fn set_motor_brake(&mut self, brake: bool) {
        self.ctx.subsystems.drive.set_motor_brake(brake);
    }

    fn drop_auto_command(&mut self) {
        if let Some(id) = self.auto_command.take() {
            self.scheduler.deregister(id, &mut self.ctx);
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────

    pub fn ctx(&self) -> &RobotContext {
        &self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut RobotContext {
        &mut self.ctx
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Scheduler together with the context it runs against.
    pub fn scheduler_mut(&mut self) -> (&mut Scheduler, &mut RobotContext) {
        (&mut self.scheduler, &mut self.ctx)
    }

    pub fn routines(&self) -> &RoutineRegistry {
        &self.routines
    }

    pub fn chooser_mut(&mut self) -> &mut AutoChooser {
        &mut self.chooser
    }

    pub fn auto_command(&self) -> Option<CommandId> {
        self.auto_command
    }
}

impl std::fmt::Debug for RobotContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RobotContainer")
            .field("ctx", &self.ctx)
            .field("scheduler", &self.scheduler)
            .field("auto_command", &self.auto_command)
            .finish_non_exhaustive()
    }
}

// ─── Named Commands ─────────────────────────────────────────────────

fn named_commands(config: &RobotConfig) -> Result<NamedCommands, RegistryError> {
    let arm = config.arm.clone();
    let shooter = config.shooter.clone();
    let intake_volts = -config.intake.max_voltage;
    let (left, right) = (shooter.speaker_left_rpm, shooter.speaker_right_rpm);

    let mut named = NamedCommands::new();
    named.register("Shoot", move || {
        Ok(ShooterCommand::new("Shoot", left, right)
            .fire_once()
            .with_timeout(SHOOT_TIMEOUT)
            .named("Shoot")
            .boxed())
    })?;
    named.register("Intake", move || {
        let children = vec![
            Handoff::new(intake_volts).boxed(),
            PrintCommand::new("Intake").boxed(),
        ];
        Ok(Parallel::with_policy("Intake", children, EndPolicy::All)?.boxed())
    })?;
    let feed_rpm = shooter.feed_rpm;
    named.register("RunIndexer", move || {
        Ok(IndexingCommand::new("RunIndexer", feed_rpm).boxed())
    })?;
    named.register("StopIndexer", || {
        Ok(InstantCommand::new("StopIndexer", Requirements::SHOOTER, |ctx| {
            ctx.subsystems.shooter.set_indexer(0.0)
        })
        .boxed())
    })?;
    let stow = arm.stow;
    named.register("Down", move || Ok(SetPointControl::new("Down", stow).boxed()))?;
    let amp = arm.amp;
    named.register("amp", move || Ok(SetPointControl::new("amp", amp).boxed()))?;
    let shoot_flat = arm.shoot_flat;
    named.register("Sniper", move || {
        let children = vec![
            SetPointControl::new("Sniper arm", shoot_flat).boxed(),
            ShooterCommand::new("Sniper shooter", left, right).boxed(),
        ];
        Ok(Parallel::with_policy("Sniper", children, EndPolicy::All)?.boxed())
    })?;
    Ok(named)
}

// ─── Teleop Wiring ──────────────────────────────────────────────────

fn pilot_drive(config: &RobotConfig) -> TeleopDrive {
    let op = &config.operator;
    let pilot = op.pilot_port;
    // Stick forward and left read negative.
    TeleopDrive::new(
        Operand::axis(pilot, Axis::LeftY, op.left_y_deadband, -1.0),
        Operand::axis(pilot, Axis::LeftX, op.left_x_deadband, -1.0),
        Operand::axis(pilot, Axis::RightX, op.right_x_deadband, -1.0),
        config.drive.field_relative,
    )
}

fn configure_defaults(scheduler: &mut Scheduler, config: &RobotConfig) -> Result<(), SchedulerError> {
    let op = &config.operator;

    let drive = scheduler.register(pilot_drive(config));
    scheduler.set_default_command(SubsystemId::Drive, drive)?;

    let intake = scheduler.register(IntakeVoltage::new(
        "IntakeTrigger",
        Operand::axis(op.pilot_port, Axis::RightTrigger, 0.0, -op.trigger_voltage),
    ));
    scheduler.set_default_command(SubsystemId::Intake, intake)?;

    let feed_rpm = config.shooter.feed_rpm;
    let indexer = scheduler.register(IndexingCommand::new(
        "IndexTriggers",
        Operand::Sum(vec![
            Operand::axis(op.pilot_port, Axis::LeftTrigger, 0.0, feed_rpm),
            Operand::axis(op.copilot_port, Axis::LeftTrigger, 0.0, feed_rpm),
        ]),
    ));
    scheduler.set_default_command(SubsystemId::Shooter, indexer)?;
    Ok(())
}

fn configure_bindings(scheduler: &mut Scheduler, config: &RobotConfig) -> Result<(), ContainerError> {
    let op = &config.operator;
    let (pilot, copilot) = (op.pilot_port, op.copilot_port);
    let shooter = &config.shooter;
    let arm = &config.arm;
    let intake_volts = -config.intake.max_voltage;

    // Pilot.
    let intake = scheduler.register(IntakeVoltage::new("IntakeFull", intake_volts));
    scheduler.bind(Condition::button(pilot, Button::B), ActivationRule::WhileTrue, intake)?;

    let handoff = scheduler.register(Handoff::new(intake_volts));
    scheduler.bind(
        Condition::button(pilot, Button::RightBumper),
        ActivationRule::WhileTrue,
        handoff,
    )?;

    let zero_gyro = scheduler.register(InstantCommand::new(
        "ZeroGyro",
        Requirements::DRIVE,
        |ctx| ctx.subsystems.drive.zero_gyro(),
    ));
    scheduler.bind(Condition::button(pilot, Button::Y), ActivationRule::OnRisingEdge, zero_gyro)?;

    let aim = Parallel::with_policy(
        "Aim",
        vec![
            pilot_drive(config).boxed(),
            SetPointControl::new("Aim arm", arm.shoot_flat).boxed(),
            ShooterCommand::new("Aim shooter", shooter.speaker_left_rpm, shooter.speaker_right_rpm)
                .boxed(),
        ],
        EndPolicy::All,
    )?;
    let aim = scheduler.register(aim);
    scheduler.bind(Condition::button(pilot, Button::X), ActivationRule::WhileTrue, aim)?;

    // Copilot.
    let speaker = scheduler.register(ShooterCommand::new(
        "Speaker",
        shooter.speaker_left_rpm,
        shooter.speaker_right_rpm,
    ));
    scheduler.bind(Condition::button(copilot, Button::X), ActivationRule::WhileTrue, speaker)?;

    let disable = scheduler.register(InstantCommand::new(
        "DisableShooter",
        Requirements::SHOOTER,
        |ctx| ctx.subsystems.shooter.disable(),
    ));
    scheduler.bind(Condition::button(copilot, Button::A), ActivationRule::OnRisingEdge, disable)?;

    for (direction, name, goal) in [
        (Pov::Down, "Stow", arm.stow),
        (Pov::Right, "ShootFlat", arm.shoot_flat),
        (Pov::Up, "Amp", arm.amp),
    ] {
        let id = scheduler.register(SetPointControl::new(name, goal));
        scheduler.bind(Condition::pov(copilot, direction), ActivationRule::OnRisingEdge, id)?;
    }

    // Only a downward stick drives the arm, and it drives it down.
    let manual = scheduler.register(ManualArmControl::new(Operand::positive_axis(
        copilot,
        Axis::RightY,
        MANUAL_ARM_DEADBAND,
        -arm.manual_scale,
    )));
    scheduler.bind(
        Condition::button(copilot, Button::RightStick),
        ActivationRule::WhileTrue,
        manual,
    )?;
    Ok(())
}

// ─── Tests ──────────────────────────────────────────────────────────
