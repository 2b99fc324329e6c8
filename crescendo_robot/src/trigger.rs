//! Trigger bindings: predicates over inputs and sensors mapped to commands.
//!
//! Bindings are evaluated once per period, in declaration order, before
//! arbitration. Each binding remembers its previous value for edge
//! detection.
//!
//! | Rule           | false → true | true (held) | true → false |
//! |----------------|--------------|-------------|--------------|
//! | `OnRisingEdge` | schedule     | -           | -            |
//! | `WhileTrue`    | schedule     | schedule    | cancel       |

use crescendo_common::input::{Axis, Button, Pov};

use crate::context::RobotContext;
use crate::scheduler::CommandId;

/// A boolean predicate evaluated against the period's context.
pub enum Condition {
    Button { port: u8, button: Button },
    Pov { port: u8, direction: Pov },
    AxisAbove { port: u8, axis: Axis, threshold: f64 },
    AxisBelow { port: u8, axis: Axis, threshold: f64 },
    /// Indexer beam break reports a note.
    NoteCaptured,
    Not(Box<Condition>),
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Custom(Box<dyn Fn(&RobotContext) -> bool>),
}

impl Condition {
    pub fn button(port: u8, button: Button) -> Self {
        Self::Button { port, button }
    }

    pub fn pov(port: u8, direction: Pov) -> Self {
        Self::Pov { port, direction }
    }

    pub fn custom(predicate: impl Fn(&RobotContext) -> bool + 'static) -> Self {
        Self::Custom(Box::new(predicate))
    }

    pub fn evaluate(&self, ctx: &RobotContext) -> bool {
        match self {
            Self::Button { port, button } => ctx.inputs.button(*port, *button),
            Self::Pov { port, direction } => ctx.inputs.pov(*port, *direction),
            Self::AxisAbove {
                port,
                axis,
                threshold,
            } => ctx.inputs.axis(*port, *axis) > *threshold,
            Self::AxisBelow {
                port,
                axis,
                threshold,
            } => ctx.inputs.axis(*port, *axis) < *threshold,
            Self::NoteCaptured => ctx.subsystems.shooter.note_present(),
            Self::Not(inner) => !inner.evaluate(ctx),
            Self::All(parts) => parts.iter().all(|c| c.evaluate(ctx)),
            Self::Any(parts) => parts.iter().any(|c| c.evaluate(ctx)),
            Self::Custom(predicate) => predicate(ctx),
        }
    }
}

impl std::fmt::Debug for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Button { port, button } => write!(f, "Button({port}, {button:?})"),
            Self::Pov { port, direction } => write!(f, "Pov({port}, {direction:?})"),
            Self::AxisAbove {
                port,
                axis,
                threshold,
            } => write!(f, "AxisAbove({port}, {axis:?}, {threshold})"),
            Self::AxisBelow {
                port,
                axis,
                threshold,
            } => write!(f, "AxisBelow({port}, {axis:?}, {threshold})"),
            Self::NoteCaptured => f.write_str("NoteCaptured"),
            Self::Not(inner) => write!(f, "Not({inner:?})"),
            Self::All(parts) => f.debug_tuple("All").field(parts).finish(),
            Self::Any(parts) => f.debug_tuple("Any").field(parts).finish(),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// How a binding maps its condition onto a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationRule {
    /// Schedule once when the condition becomes true; the command then
    /// runs to completion regardless of the condition.
    OnRisingEdge,
    /// Schedule every period the condition holds; cancel when it clears.
    WhileTrue,
}

/// Request emitted by a binding for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAction {
    Schedule(CommandId),
    Cancel(CommandId),
}

#[derive(Debug)]
struct Binding {
    condition: Condition,
    rule: ActivationRule,
    command: CommandId,
    previous: bool,
}

#[derive(Debug, Default)]
pub struct TriggerTable {
    bindings: Vec<Binding>,
}

impl TriggerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding; its previous value starts false.
    pub fn bind(&mut self, condition: Condition, rule: ActivationRule, command: CommandId) {
        self.bindings.push(Binding {
            condition,
            rule,
            command,
            previous: false,
        });
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Drop every binding targeting `command`.
    pub fn unbind(&mut self, command: CommandId) {
        self.bindings.retain(|b| b.command != command);
    }

    /// Evaluate every binding and append the resulting actions in order.
    pub fn poll(&mut self, ctx: &RobotContext, actions: &mut Vec<TriggerAction>) {
        for binding in &mut self.bindings {
            let now = binding.condition.evaluate(ctx);
            let previous = std::mem::replace(&mut binding.previous, now);
            match (binding.rule, previous, now) {
                (ActivationRule::OnRisingEdge, false, true) => {
                    actions.push(TriggerAction::Schedule(binding.command));
                }
                (ActivationRule::WhileTrue, _, true) => {
                    actions.push(TriggerAction::Schedule(binding.command));
                }
                (ActivationRule::WhileTrue, true, false) => {
                    actions.push(TriggerAction::Cancel(binding.command));
                }
                _ => {}
            }
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
