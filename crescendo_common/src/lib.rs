//! Crescendo Common Library
//!
//! Shared, hardware-free types for the Crescendo robot workspace.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - System-wide constants
//! - [`hal`] - Hardware boundary traits (motors, sensors, drive base)
//! - [`input`] - Operator input snapshots
//! - [`robot`] - Robot configuration and autonomous routine declarations
//! - [`subsystem`] - Subsystem identities and requirement sets
//! - [`telemetry`] - Fire-and-forget diagnostic publishing
//! - [`prelude`] - Common re-exports for convenience

pub mod config;
pub mod consts;
pub mod hal;
pub mod input;
pub mod prelude;
pub mod robot;
pub mod subsystem;
pub mod telemetry;
