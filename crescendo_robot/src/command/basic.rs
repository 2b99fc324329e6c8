//! Building-block commands and decorators.

use std::time::Duration;

use crescendo_common::subsystem::Requirements;
use tracing::info;

use super::{Command, InterruptionBehavior};
use crate::context::RobotContext;

type Action = Box<dyn FnMut(&mut RobotContext)>;

/// Runs an action once in `start` and finishes immediately.
pub struct InstantCommand {
    name: String,
    requirements: Requirements,
    action: Action,
}

impl InstantCommand {
    pub fn new(
        name: impl Into<String>,
        requirements: Requirements,
        action: impl FnMut(&mut RobotContext) + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            requirements,
            action: Box::new(action),
        }
    }
}

impl Command for InstantCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        self.requirements
    }

    fn start(&mut self, ctx: &mut RobotContext) {
        (self.action)(ctx);
    }

    fn is_finished(&self, _ctx: &RobotContext) -> bool {
        true
    }
}

/// Runs an action every tick until interrupted, then idles its subsystems.
pub struct RunCommand {
    name: String,
    requirements: Requirements,
    action: Action,
}

impl RunCommand {
    pub fn new(
        name: impl Into<String>,
        requirements: Requirements,
        action: impl FnMut(&mut RobotContext) + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            requirements,
            action: Box::new(action),
        }
    }
}

impl Command for RunCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        self.requirements
    }

    fn tick(&mut self, ctx: &mut RobotContext) {
        (self.action)(ctx);
    }

    fn end(&mut self, ctx: &mut RobotContext, _interrupted: bool) {
        for id in self.requirements.subsystems() {
            ctx.subsystems.idle(id);
        }
    }
}

/// Logs a message and finishes.
pub struct PrintCommand {
    name: String,
    message: String,
}

impl PrintCommand {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            name: format!("Print({message})"),
            message,
        }
    }
}

impl Command for PrintCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        Requirements::empty()
    }

    fn start(&mut self, _ctx: &mut RobotContext) {
        info!("{}", self.message);
    }

    fn is_finished(&self, _ctx: &RobotContext) -> bool {
        true
    }
}

/// Finishes once `duration` of robot time has elapsed since `start`.
pub struct WaitCommand {
    name: String,
    duration: Duration,
    started_at: Duration,
}

impl WaitCommand {
    pub fn new(duration: Duration) -> Self {
        Self {
            name: format!("Wait({:.2}s)", duration.as_secs_f64()),
            duration,
            started_at: Duration::ZERO,
        }
    }

    /// Negative or NaN waits are zero; an unrepresentable wait never ends.
    pub fn from_secs(seconds: f64) -> Self {
        Self::new(Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::MAX))
    }
}

impl Command for WaitCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        Requirements::empty()
    }

    fn start(&mut self, ctx: &mut RobotContext) {
        self.started_at = ctx.now();
    }

    fn is_finished(&self, ctx: &RobotContext) -> bool {
        ctx.now().saturating_sub(self.started_at) >= self.duration
    }
}

// ─── Decorators ─────────────────────────────────────────────────────

/// Renames a command.
pub struct Named<C> {
    inner: C,
    name: String,
}

impl<C: Command> Named<C> {
    pub fn new(inner: C, name: impl Into<String>) -> Self {
        Self {
            inner,
            name: name.into(),
        }
    }
}

/// Makes a command refuse preemption.
pub struct NonInterruptible<C> {
    inner: C,
}

impl<C: Command> NonInterruptible<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

macro_rules! forward_lifecycle {
    () => {
        fn requirements(&self) -> Requirements {
            self.inner.requirements()
        }

        fn start(&mut self, ctx: &mut RobotContext) {
            self.inner.start(ctx)
        }

        fn tick(&mut self, ctx: &mut RobotContext) {
            self.inner.tick(ctx)
        }

        fn is_finished(&self, ctx: &RobotContext) -> bool {
            self.inner.is_finished(ctx)
        }

        fn end(&mut self, ctx: &mut RobotContext, interrupted: bool) {
            self.inner.end(ctx, interrupted)
        }
    };
}

impl<C: Command> Command for Named<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn interruption(&self) -> InterruptionBehavior {
        self.inner.interruption()
    }

    forward_lifecycle!();
}

impl<C: Command> Command for NonInterruptible<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn interruption(&self) -> InterruptionBehavior {
        InterruptionBehavior::NonInterruptible
    }

    forward_lifecycle!();
}

// ─── Tests ──────────────────────────────────────────────────────────
