//! Command groups.
//!
//! A group reserves the union of its children's requirements for its whole
//! lifetime, even while only some children are active. Groups forward the
//! lifecycle to their children; interrupting a group ends exactly the
//! children that are still running.

use crescendo_common::subsystem::Requirements;

use super::{BoxedCommand, Command, CompositionError, InterruptionBehavior};
use crate::context::RobotContext;

fn union(children: &[BoxedCommand]) -> Requirements {
    children
        .iter()
        .fold(Requirements::empty(), |acc, c| acc | c.requirements())
}

/// A group is non-interruptible when any child is.
fn combined_interruption(children: &[BoxedCommand]) -> InterruptionBehavior {
    if children
        .iter()
        .any(|c| c.interruption() == InterruptionBehavior::NonInterruptible)
    {
        InterruptionBehavior::NonInterruptible
    } else {
        InterruptionBehavior::Interruptible
    }
}

fn describe(kind: &str, children: &[BoxedCommand]) -> String {
    let names: Vec<&str> = children.iter().map(|c| c.name()).collect();
    format!("{kind}({})", names.join(", "))
}

// ─── Sequence ───────────────────────────────────────────────────────

/// Runs children one after another.
///
/// A child is started in the period its predecessor finishes and ticks
/// from the following period on; ticks never overlap.
pub struct Sequence {
    name: String,
    children: Vec<BoxedCommand>,
    requirements: Requirements,
    interruption: InterruptionBehavior,
    current: usize,
}

impl Sequence {
    pub fn new(children: Vec<BoxedCommand>) -> Self {
        let name = describe("Sequence", &children);
        Self::named(name, children)
    }

    pub fn named(name: impl Into<String>, children: Vec<BoxedCommand>) -> Self {
        Self {
            name: name.into(),
            requirements: union(&children),
            interruption: combined_interruption(&children),
            children,
            current: 0,
        }
    }

    /// Index of the active child (== len once finished).
    pub fn current_index(&self) -> usize {
        self.current
    }
}

impl Command for Sequence {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        self.requirements
    }

    fn interruption(&self) -> InterruptionBehavior {
        self.interruption
    }

    fn start(&mut self, ctx: &mut RobotContext) {
        self.current = 0;
        if let Some(first) = self.children.first_mut() {
            first.start(ctx);
        }
    }

    fn tick(&mut self, ctx: &mut RobotContext) {
        let Some(child) = self.children.get_mut(self.current) else {
            return;
        };
        child.tick(ctx);
        if child.is_finished(ctx) {
            child.end(ctx, false);
            self.current += 1;
            if let Some(next) = self.children.get_mut(self.current) {
                next.start(ctx);
            }
        }
    }

    fn is_finished(&self, _ctx: &RobotContext) -> bool {
        self.current >= self.children.len()
    }

    fn end(&mut self, ctx: &mut RobotContext, interrupted: bool) {
        if interrupted {
            if let Some(child) = self.children.get_mut(self.current) {
                child.end(ctx, true);
            }
        }
        self.current = self.children.len();
    }
}

impl std::fmt::Debug for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequence")
            .field("name", &self.name)
            .field("children", &self.children.len())
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

// ─── Parallel ───────────────────────────────────────────────────────

/// When a parallel group is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndPolicy {
    /// Every child has finished.
    All,
    /// A child finishes; every running child still ticks that period, then
    /// the rest are interrupted.
    Race,
    /// The child at this index finishes; the rest are interrupted.
    Deadline(usize),
}

struct Branch {
    command: BoxedCommand,
    running: bool,
}

/// Runs children concurrently. Children must not share subsystems.
pub struct Parallel {
    name: String,
    branches: Vec<Branch>,
    policy: EndPolicy,
    requirements: Requirements,
    interruption: InterruptionBehavior,
    decided: bool,
}

impl Parallel {
    pub fn all(children: Vec<BoxedCommand>) -> Result<Self, CompositionError> {
        let name = describe("Parallel", &children);
        Self::build(name, children, EndPolicy::All)
    }

    pub fn race(children: Vec<BoxedCommand>) -> Result<Self, CompositionError> {
        let name = describe("Race", &children);
        Self::build(name, children, EndPolicy::Race)
    }

    /// `deadline` decides when the group ends; `others` are interrupted then.
    pub fn deadline(
        deadline: BoxedCommand,
        others: Vec<BoxedCommand>,
    ) -> Result<Self, CompositionError> {
        let mut children = Vec::with_capacity(others.len() + 1);
        children.push(deadline);
        children.extend(others);
        let name = describe("Deadline", &children);
        Self::build(name, children, EndPolicy::Deadline(0))
    }

    pub fn with_policy(
        name: impl Into<String>,
        children: Vec<BoxedCommand>,
        policy: EndPolicy,
    ) -> Result<Self, CompositionError> {
        Self::build(name.into(), children, policy)
    }

    /// Race whose children are known to be disjoint.
    pub(crate) fn race_unchecked(children: Vec<BoxedCommand>, name: String) -> Self {
        Self::assemble(name, children, EndPolicy::Race)
    }

    fn build(
        name: String,
        children: Vec<BoxedCommand>,
        policy: EndPolicy,
    ) -> Result<Self, CompositionError> {
        match policy {
            EndPolicy::All => {}
            EndPolicy::Race if children.is_empty() => return Err(CompositionError::Empty(name)),
            EndPolicy::Race => {}
            EndPolicy::Deadline(index) if index >= children.len() => {
                return Err(CompositionError::InvalidDeadline {
                    index,
                    len: children.len(),
                });
            }
            EndPolicy::Deadline(_) => {}
        }

        for (i, a) in children.iter().enumerate() {
            for b in &children[i + 1..] {
                if a.requirements().intersects(b.requirements()) {
                    return Err(CompositionError::OverlappingRequirements {
                        first: a.name().to_string(),
                        second: b.name().to_string(),
                    });
                }
            }
        }
        Ok(Self::assemble(name, children, policy))
    }

    fn assemble(name: String, children: Vec<BoxedCommand>, policy: EndPolicy) -> Self {
        Self {
            name,
            requirements: union(&children),
            interruption: combined_interruption(&children),
            branches: children
                .into_iter()
                .map(|command| Branch {
                    command,
                    running: false,
                })
                .collect(),
            policy,
            decided: false,
        }
    }

    pub fn policy(&self) -> EndPolicy {
        self.policy
    }

    /// Children still running.
    pub fn running_count(&self) -> usize {
        self.branches.iter().filter(|b| b.running).count()
    }
}

impl Command for Parallel {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        self.requirements
    }

    fn interruption(&self) -> InterruptionBehavior {
        self.interruption
    }

    fn start(&mut self, ctx: &mut RobotContext) {
        self.decided = false;
        for branch in &mut self.branches {
            branch.command.start(ctx);
            branch.running = true;
        }
    }

    fn tick(&mut self, ctx: &mut RobotContext) {
        for (index, branch) in self.branches.iter_mut().enumerate() {
            if !branch.running {
                continue;
            }
            branch.command.tick(ctx);
            if branch.command.is_finished(ctx) {
                branch.command.end(ctx, false);
                branch.running = false;
                match self.policy {
                    EndPolicy::Race => self.decided = true,
                    EndPolicy::Deadline(d) if d == index => self.decided = true,
                    _ => {}
                }
            }
        }
        if self.policy == EndPolicy::All && self.branches.iter().all(|b| !b.running) {
            self.decided = true;
        }
    }

    fn is_finished(&self, _ctx: &RobotContext) -> bool {
        self.decided || (self.policy == EndPolicy::All && self.branches.is_empty())
    }

    fn end(&mut self, ctx: &mut RobotContext, _interrupted: bool) {
        // Normal end interrupts the losers of a race or deadline.
        for branch in &mut self.branches {
            if branch.running {
                branch.command.end(ctx, true);
                branch.running = false;
            }
        }
    }
}

impl std::fmt::Debug for Parallel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parallel")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("running", &self.running_count())
            .finish_non_exhaustive()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
