//! Subsystem identities and requirement sets.
//!
//! A subsystem is an exclusive hardware resource group. Commands declare the
//! set of subsystems they require as a [`Requirements`] bitflag; the scheduler
//! uses set intersection to detect conflicts.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

use crate::consts::SUBSYSTEM_COUNT;

/// Identity of one exclusive subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum SubsystemId {
    /// Arm pivot joint (setpoint control).
    Arm = 0,
    /// Flywheel pair, indexer and indexer beam break (velocity control).
    Shooter = 1,
    /// Floor intake rollers (voltage control).
    Intake = 2,
    /// Drivetrain.
    Drive = 3,
}

const_assert!(SUBSYSTEM_COUNT <= 8);

impl SubsystemId {
    /// All subsystems in index order.
    pub const ALL: [Self; SUBSYSTEM_COUNT] = [Self::Arm, Self::Shooter, Self::Intake, Self::Drive];

    /// Dense index, usable for fixed-size per-subsystem tables.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Arm),
            1 => Some(Self::Shooter),
            2 => Some(Self::Intake),
            3 => Some(Self::Drive),
            _ => None,
        }
    }

    /// Short name used in logs and telemetry keys.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Arm => "arm",
            Self::Shooter => "shooter",
            Self::Intake => "intake",
            Self::Drive => "drive",
        }
    }

    /// The singleton requirement set for this subsystem.
    #[inline]
    pub const fn requirement(self) -> Requirements {
        Requirements::from_bits_truncate(1 << self as u8)
    }
}

impl std::fmt::Display for SubsystemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Set of subsystems a command requires exclusive use of.
    ///
    /// Immutable for the lifetime of a command instance.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Requirements: u8 {
        const ARM     = 1 << 0;
        const SHOOTER = 1 << 1;
        const INTAKE  = 1 << 2;
        const DRIVE   = 1 << 3;
    }
}

impl Requirements {
    /// Subsystems contained in this set, in index order.
    pub fn subsystems(self) -> impl Iterator<Item = SubsystemId> {
        SubsystemId::ALL
            .into_iter()
            .filter(move |id| self.contains(id.requirement()))
    }

    /// Returns true if this set contains the given subsystem.
    #[inline]
    pub const fn requires(self, id: SubsystemId) -> bool {
        self.contains(id.requirement())
    }
}

impl From<SubsystemId> for Requirements {
    fn from(id: SubsystemId) -> Self {
        id.requirement()
    }
}

impl FromIterator<SubsystemId> for Requirements {
    fn from_iter<I: IntoIterator<Item = SubsystemId>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |acc, id| acc | id.requirement())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
