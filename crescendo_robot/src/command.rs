//! Commands: units of robot behaviour with a start/tick/finish/end lifecycle.
//!
//! ```text
//!   start ─▶ tick ─▶ is_finished? ──yes──▶ end(false)
//!             ▲           │
//!             └────no─────┘        (preempted) ──▶ end(true)
//! ```
//!
//! A command declares the subsystems it drives through
//! [`Command::requirements`]; the scheduler guarantees it is the only
//! running command driving them between `start` and `end`.
//!
//! - [`basic`] - instant, run-forever, print and wait commands
//! - [`composite`] - sequence and parallel (all / race / deadline) groups
//! - [`arm`], [`shooter`], [`intake`], [`drive`] - robot behaviours

pub mod arm;
pub mod basic;
pub mod composite;
pub mod drive;
pub mod intake;
pub mod shooter;

use std::time::Duration;

use crescendo_common::input::{Axis, apply_deadband};
use crescendo_common::subsystem::Requirements;
use thiserror::Error;

use crate::context::RobotContext;

use self::basic::{Named, NonInterruptible, WaitCommand};
use self::composite::{Parallel, Sequence};

/// What happens when a new command needs a subsystem this one holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterruptionBehavior {
    /// Yield: end with `interrupted = true` and let the newcomer start.
    #[default]
    Interruptible,
    /// Refuse the newcomer; keep running.
    NonInterruptible,
}

/// Command lifecycle.
///
/// All hooks receive the same context the scheduler owns for the period;
/// none may block. `end` must leave owned subsystems in a safe state.
pub trait Command {
    fn name(&self) -> &str;

    /// Subsystems driven by this command, fixed for its lifetime.
    fn requirements(&self) -> Requirements;

    fn interruption(&self) -> InterruptionBehavior {
        InterruptionBehavior::Interruptible
    }

    fn start(&mut self, _ctx: &mut RobotContext) {}

    fn tick(&mut self, _ctx: &mut RobotContext) {}

    /// Polled after every `tick`.
    fn is_finished(&self, _ctx: &RobotContext) -> bool {
        false
    }

    fn end(&mut self, _ctx: &mut RobotContext, _interrupted: bool) {}
}

pub type BoxedCommand = Box<dyn Command>;

impl<C: Command + ?Sized> Command for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn requirements(&self) -> Requirements {
        (**self).requirements()
    }

    fn interruption(&self) -> InterruptionBehavior {
        (**self).interruption()
    }

    fn start(&mut self, ctx: &mut RobotContext) {
        (**self).start(ctx)
    }

    fn tick(&mut self, ctx: &mut RobotContext) {
        (**self).tick(ctx)
    }

    fn is_finished(&self, ctx: &RobotContext) -> bool {
        (**self).is_finished(ctx)
    }

    fn end(&mut self, ctx: &mut RobotContext, interrupted: bool) {
        (**self).end(ctx, interrupted)
    }
}

/// Invalid command group.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    /// Two children of a parallel group drive the same subsystem.
    #[error("Parallel children '{first}' and '{second}' share a subsystem")]
    OverlappingRequirements { first: String, second: String },

    /// Race and deadline groups need at least one child.
    #[error("Command group '{0}' has no children")]
    Empty(String),

    /// Deadline index out of range.
    #[error("Deadline index {index} out of range for {len} children")]
    InvalidDeadline { index: usize, len: usize },
}

/// Decorators and combinators available on every command.
pub trait CommandExt: Command + Sized + 'static {
    fn boxed(self) -> BoxedCommand {
        Box::new(self)
    }

    /// Run `self`, then `next`.
    fn and_then(self, next: impl Command + 'static) -> Sequence {
        Sequence::new(vec![self.boxed(), next.boxed()])
    }

    /// Run alongside `other` until both finish.
    fn along_with(self, other: impl Command + 'static) -> Result<Parallel, CompositionError> {
        Parallel::all(vec![self.boxed(), other.boxed()])
    }

    /// Run alongside `other` until either finishes.
    fn race_with(self, other: impl Command + 'static) -> Result<Parallel, CompositionError> {
        Parallel::race(vec![self.boxed(), other.boxed()])
    }

    /// Interrupt `self` if it has not finished after `timeout`.
    fn with_timeout(self, timeout: Duration) -> Parallel {
        let name = format!("{} (timeout {:.2}s)", self.name(), timeout.as_secs_f64());
        // A wait requires nothing, so the pair can never overlap.
        Parallel::race_unchecked(vec![self.boxed(), WaitCommand::new(timeout).boxed()], name)
    }

    fn named(self, name: impl Into<String>) -> Named<Self> {
        Named::new(self, name)
    }

    /// Refuse preemption while running.
    fn non_interruptible(self) -> NonInterruptible<Self> {
        NonInterruptible::new(self)
    }
}

impl<C: Command + Sized + 'static> CommandExt for C {}

// ─── Operator Values ────────────────────────────────────────────────

/// A scalar evaluated each period: a constant or a shaped joystick axis.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Constant(f64),
    Axis {
        port: u8,
        axis: Axis,
        deadband: f64,
        scale: f64,
    },
    /// Like `Axis`, but zero unless the shaped reading is positive.
    PositiveAxis {
        port: u8,
        axis: Axis,
        deadband: f64,
        scale: f64,
    },
    Sum(Vec<Operand>),
}

impl Operand {
    pub fn axis(port: u8, axis: Axis, deadband: f64, scale: f64) -> Self {
        Self::Axis {
            port,
            axis,
            deadband,
            scale,
        }
    }

    pub fn positive_axis(port: u8, axis: Axis, deadband: f64, scale: f64) -> Self {
        Self::PositiveAxis {
            port,
            axis,
            deadband,
            scale,
        }
    }

    pub fn eval(&self, ctx: &RobotContext) -> f64 {
        match self {
            Self::Constant(v) => *v,
            Self::Axis {
                port,
                axis,
                deadband,
                scale,
            } => apply_deadband(ctx.inputs.axis(*port, *axis), *deadband) * scale,
            Self::PositiveAxis {
                port,
                axis,
                deadband,
                scale,
            } => apply_deadband(ctx.inputs.axis(*port, *axis), *deadband).max(0.0) * scale,
            Self::Sum(parts) => parts.iter().map(|p| p.eval(ctx)).sum(),
        }
    }
}

impl From<f64> for Operand {
    fn from(v: f64) -> Self {
        Self::Constant(v)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
