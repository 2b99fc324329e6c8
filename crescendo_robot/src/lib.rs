//! # Crescendo Robot Library
//!
//! Control core of the Crescendo competition robot: a cooperative command
//! scheduler that arbitrates exclusive subsystems, closed-loop subsystem
//! control, operator trigger bindings and named autonomous routines.
//!
//! ## Period
//!
//! Everything runs on one thread at a fixed period (20 ms by default):
//! sample sensors → evaluate triggers → schedule defaults → tick commands →
//! apply control laws and write outputs → publish telemetry.
//!
//! ## Modules
//!
//! - [`control`] - PID, arm feedforward and trapezoid motion profile
//! - [`hal`] - hardware bundle and simulated devices
//! - [`subsystem`] - arm, shooter, intake and drive
//! - [`command`] - command lifecycle, composites and robot behaviours
//! - [`scheduler`] - arbitration and the per-period loop
//! - [`trigger`] - condition → command bindings
//! - [`registry`] - named commands, routines and the autonomous chooser
//! - [`container`] - wiring of the whole robot
//! - [`cycle`] - fixed-period runner

pub mod command;
pub mod container;
pub mod context;
pub mod control;
pub mod cycle;
pub mod hal;
pub mod registry;
pub mod scheduler;
pub mod subsystem;
pub mod trigger;
