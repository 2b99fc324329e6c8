//! Subsystem ownership table.
//!
//! Each subsystem is held by at most one running command. Acquisition
//! either succeeds, names the interruptible holders that must yield, or is
//! rejected with the blocking holder.

use crescendo_common::consts::SUBSYSTEM_COUNT;
use crescendo_common::subsystem::{Requirements, SubsystemId};
use heapless::Vec as FixedVec;

use super::CommandId;
use crate::command::InterruptionBehavior;

/// Holders that must be interrupted for a new claim (at most one per subsystem).
pub type Conflicts = FixedVec<CommandId, SUBSYSTEM_COUNT>;

/// Outcome of checking a claim against current holders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimResult {
    /// Nothing held; claim may proceed.
    Free,
    /// Every conflicting holder is interruptible.
    Preempt(Conflicts),
    /// A non-interruptible holder blocks the claim.
    Rejected {
        held_by: CommandId,
        subsystem: SubsystemId,
    },
}

#[derive(Debug, Clone, Default)]
pub struct OwnershipTable {
    owners: [Option<CommandId>; SUBSYSTEM_COUNT],
}

impl OwnershipTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn owner(&self, subsystem: SubsystemId) -> Option<CommandId> {
        self.owners[subsystem.index()]
    }

    /// Check `requirements` against current holders without changing anything.
    pub fn check(
        &self,
        requirements: Requirements,
        interruption_of: impl Fn(CommandId) -> InterruptionBehavior,
    ) -> ClaimResult {
        let mut conflicts = Conflicts::new();
        for subsystem in requirements.subsystems() {
            let Some(holder) = self.owner(subsystem) else {
                continue;
            };
            if interruption_of(holder) == InterruptionBehavior::NonInterruptible {
                return ClaimResult::Rejected {
                    held_by: holder,
                    subsystem,
                };
            }
            if !conflicts.contains(&holder) {
                // Capacity equals the subsystem count, so this cannot overflow.
                let _ = conflicts.push(holder);
            }
        }
        if conflicts.is_empty() {
            ClaimResult::Free
        } else {
            ClaimResult::Preempt(conflicts)
        }
    }

    /// Record `id` as holder of every subsystem in `requirements`.
    pub fn claim(&mut self, id: CommandId, requirements: Requirements) {
        for subsystem in requirements.subsystems() {
            self.owners[subsystem.index()] = Some(id);
        }
    }

    /// Release everything held by `id`.
    pub fn release(&mut self, id: CommandId) {
        for owner in &mut self.owners {
            if *owner == Some(id) {
                *owner = None;
            }
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
