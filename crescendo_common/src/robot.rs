//! Robot-level configuration types.
//!
//! Gains, presets, operator shaping and autonomous routine declarations,
//! shared between the robot binary and offline tools.

pub mod config;
pub mod routine;
