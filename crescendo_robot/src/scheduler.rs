//! Cooperative command scheduler.
//!
//! One call to [`Scheduler::run`] is one period:
//!
//! 1. **Sample** - every subsystem reads its sensors once.
//! 2. **Triggers** - bindings are evaluated in declaration order and their
//!    schedule/cancel requests arbitrated.
//! 3. **Defaults** - subsystems left without an owner get their default
//!    command.
//! 4. **Tick** - running commands tick in start order; finished commands
//!    end normally and release their subsystems.
//! 5. **Apply** - subsystems compute control laws and write outputs.
//!
//! Arbitration: a newcomer whose requirements intersect a running command
//! either preempts it (the incumbent's `end(true)` completes before the
//! newcomer's `start`) or, when the incumbent is non-interruptible, is
//! refused.

pub mod ownership;

use crescendo_common::consts::SUBSYSTEM_COUNT;
use crescendo_common::subsystem::{Requirements, SubsystemId};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::command::{BoxedCommand, Command, InterruptionBehavior};
use crate::context::RobotContext;
use crate::trigger::{ActivationRule, Condition, TriggerAction, TriggerTable};

use self::ownership::{ClaimResult, OwnershipTable};

/// Handle to a command registered with the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(pub(crate) usize);

impl std::fmt::Display for CommandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of a scheduling request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// Conflicting commands (if any) were interrupted and the command started.
    Started,
    /// The command was already running; nothing changed.
    AlreadyRunning,
    /// A non-interruptible command holds a required subsystem.
    Refused {
        held_by: CommandId,
        subsystem: SubsystemId,
    },
    /// No command is registered under this id.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("Unknown command {0}")]
    UnknownCommand(CommandId),

    /// A default command must require exactly its subsystem.
    #[error("Default command '{command}' for {subsystem} must require exactly that subsystem")]
    DefaultRequirementMismatch {
        command: String,
        subsystem: SubsystemId,
    },
}

struct Slot {
    command: BoxedCommand,
    requirements: Requirements,
    interruption: InterruptionBehavior,
    running: bool,
}

#[derive(Default)]
pub struct Scheduler {
    slots: Vec<Option<Slot>>,
    /// Running commands in start order.
    running: Vec<CommandId>,
    ownership: OwnershipTable,
    defaults: [Option<CommandId>; SUBSYSTEM_COUNT],
    triggers: TriggerTable,
    actions: Vec<TriggerAction>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Registration ───────────────────────────────────────────────

    /// Take ownership of a command; requirements and interruption
    /// behaviour are captured now and fixed for its lifetime.
    pub fn register(&mut self, command: impl Command + 'static) -> CommandId {
        let command: BoxedCommand = Box::new(command);
        let slot = Slot {
            requirements: command.requirements(),
            interruption: command.interruption(),
            command,
            running: false,
        };
        let id = match self.slots.iter().position(Option::is_none) {
            Some(free) => {
                self.slots[free] = Some(slot);
                CommandId(free)
            }
            None => {
                self.slots.push(Some(slot));
                CommandId(self.slots.len() - 1)
            }
        };
        trace!("registered {} as {id}", self.name(id).unwrap_or("?"));
        id
    }

    /// Cancel (if running), unbind and drop a command.
    pub fn deregister(&mut self, id: CommandId, ctx: &mut RobotContext) {
        self.cancel(id, ctx);
        self.triggers.unbind(id);
        for default in &mut self.defaults {
            if *default == Some(id) {
                *default = None;
            }
        }
        if let Some(slot) = self.slots.get_mut(id.0) {
            *slot = None;
        }
    }

    pub fn set_default_command(
        &mut self,
        subsystem: SubsystemId,
        id: CommandId,
    ) -> Result<(), SchedulerError> {
        let slot = self.slot(id).ok_or(SchedulerError::UnknownCommand(id))?;
        if slot.requirements != subsystem.requirement() {
            return Err(SchedulerError::DefaultRequirementMismatch {
                command: slot.command.name().to_string(),
                subsystem,
            });
        }
        self.defaults[subsystem.index()] = Some(id);
        Ok(())
    }

    pub fn bind(
        &mut self,
        condition: Condition,
        rule: ActivationRule,
        id: CommandId,
    ) -> Result<(), SchedulerError> {
        if self.slot(id).is_none() {
            return Err(SchedulerError::UnknownCommand(id));
        }
        self.triggers.bind(condition, rule, id);
        Ok(())
    }

    // ─── Scheduling ─────────────────────────────────────────────────

    /// Start a command now, arbitrating against running commands.
    pub fn schedule(&mut self, id: CommandId, ctx: &mut RobotContext) -> ScheduleOutcome {
        let Some(slot) = self.slot(id) else {
            warn!("schedule: unknown command {id}");
            return ScheduleOutcome::Unknown;
        };
        if slot.running {
            return ScheduleOutcome::AlreadyRunning;
        }
        let requirements = slot.requirements;

        let claim = self.ownership.check(requirements, |holder| {
            self.slot(holder)
                .map_or(InterruptionBehavior::Interruptible, |s| s.interruption)
        });
        match claim {
            ClaimResult::Rejected { held_by, subsystem } => {
                debug!(
                    "{} refused: {subsystem} held by non-interruptible {}",
                    self.name(id).unwrap_or("?"),
                    self.name(held_by).unwrap_or("?"),
                );
                return ScheduleOutcome::Refused { held_by, subsystem };
            }
            ClaimResult::Preempt(conflicts) => {
                for holder in conflicts {
                    self.finish(holder, ctx, true);
                }
            }
            ClaimResult::Free => {}
        }

        self.ownership.claim(id, requirements);
        if let Some(slot) = self.slot_mut(id) {
            slot.running = true;
            debug!("start {}", slot.command.name());
            slot.command.start(ctx);
        }
        self.running.push(id);
        ScheduleOutcome::Started
    }

    /// Interrupt a running command. Returns `false` if it was not running.
    pub fn cancel(&mut self, id: CommandId, ctx: &mut RobotContext) -> bool {
        if self.is_running(id) {
            self.finish(id, ctx, true);
            true
        } else {
            false
        }
    }

    /// Interrupt every running command.
    pub fn cancel_all(&mut self, ctx: &mut RobotContext) {
        while let Some(&id) = self.running.first() {
            self.finish(id, ctx, true);
        }
    }

    /// Run one period. See the module docs for the phase order.
    pub fn run(&mut self, ctx: &mut RobotContext) {
        ctx.subsystems.sample();

        let mut actions = std::mem::take(&mut self.actions);
        actions.clear();
        self.triggers.poll(ctx, &mut actions);
        for action in &actions {
            match *action {
                TriggerAction::Schedule(id) => {
                    self.schedule(id, ctx);
                }
                TriggerAction::Cancel(id) => {
                    self.cancel(id, ctx);
                }
            }
        }
        self.actions = actions;

        for subsystem in SubsystemId::ALL {
            if self.ownership.owner(subsystem).is_some() {
                continue;
            }
            if let Some(default) = self.defaults[subsystem.index()] {
                self.schedule(default, ctx);
            }
        }

        let mut i = 0;
        while i < self.running.len() {
            let id = self.running[i];
            let finished = match self.slot_mut(id) {
                Some(slot) => {
                    slot.command.tick(ctx);
                    slot.command.is_finished(ctx)
                }
                None => true,
            };
            if finished {
                self.finish(id, ctx, false);
            } else {
                i += 1;
            }
        }

        ctx.subsystems.apply(&mut ctx.telemetry);
        ctx.telemetry.put("scheduler/running", self.running.len() as f64);
    }

    /// End a running command and release its subsystems.
    fn finish(&mut self, id: CommandId, ctx: &mut RobotContext, interrupted: bool) {
        if let Some(slot) = self.slot_mut(id) {
            if !slot.running {
                return;
            }
            slot.running = false;
            if interrupted {
                debug!("interrupt {}", slot.command.name());
            } else {
                debug!("finish {}", slot.command.name());
            }
            slot.command.end(ctx, interrupted);
        }
        self.ownership.release(id);
        self.running.retain(|&r| r != id);
    }

    // ─── Queries ────────────────────────────────────────────────────

    pub fn is_running(&self, id: CommandId) -> bool {
        self.slot(id).is_some_and(|s| s.running)
    }

    /// Running command holding `subsystem`.
    pub fn owner(&self, subsystem: SubsystemId) -> Option<CommandId> {
        self.ownership.owner(subsystem)
    }

    pub fn default_command(&self, subsystem: SubsystemId) -> Option<CommandId> {
        self.defaults[subsystem.index()]
    }

    pub fn name(&self, id: CommandId) -> Option<&str> {
        self.slot(id).map(|s| s.command.name())
    }

    /// Running commands in start order.
    pub fn running(&self) -> &[CommandId] {
        &self.running
    }

    pub fn binding_count(&self) -> usize {
        self.triggers.len()
    }

    fn slot(&self, id: CommandId) -> Option<&Slot> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, id: CommandId) -> Option<&mut Slot> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("registered", &self.slots.iter().flatten().count())
            .field("running", &self.running)
            .field("bindings", &self.triggers.len())
            .finish_non_exhaustive()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
