//! Operator input snapshots.
//!
//! The driver-station input source is an external collaborator: once per
//! period it produces an [`InputSnapshot`] holding every controller's buttons,
//! axes and POV hat. All commands and trigger bindings active in a period
//! observe the same snapshot.

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_AXES_PER_CONTROLLER, MAX_CONTROLLERS};

/// Digital button on a gamepad-style controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Button {
    A = 1,
    B = 2,
    X = 3,
    Y = 4,
    LeftBumper = 5,
    RightBumper = 6,
    Back = 7,
    Start = 8,
    LeftStick = 9,
    RightStick = 10,
}

impl Button {
    #[inline]
    const fn mask(self) -> u16 {
        1 << (self as u8 - 1)
    }
}

/// Analog axis on a gamepad-style controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Axis {
    LeftX = 0,
    LeftY = 1,
    LeftTrigger = 2,
    RightTrigger = 3,
    RightX = 4,
    RightY = 5,
}

/// POV hat direction, in degrees clockwise from up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pov {
    Up,
    Right,
    Down,
    Left,
}

impl Pov {
    #[inline]
    pub const fn angle(self) -> u16 {
        match self {
            Self::Up => 0,
            Self::Right => 90,
            Self::Down => 180,
            Self::Left => 270,
        }
    }
}

/// One controller's state for one period.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControllerState {
    /// Bitmask of pressed buttons (bit `n - 1` for button index `n`).
    pub buttons: u16,
    /// Axis values in [-1, 1] (triggers in [0, 1]).
    pub axes: [f64; MAX_AXES_PER_CONTROLLER],
    /// POV hat angle in degrees, `None` when released.
    pub pov: Option<u16>,
}

impl ControllerState {
    #[inline]
    pub const fn button(&self, button: Button) -> bool {
        self.buttons & button.mask() != 0
    }

    /// Axis value; non-finite readings are reported as centered.
    #[inline]
    pub fn axis(&self, axis: Axis) -> f64 {
        let value = self.axes[axis as usize];
        if value.is_finite() { value } else { 0.0 }
    }

    #[inline]
    pub fn pov(&self, direction: Pov) -> bool {
        self.pov == Some(direction.angle())
    }

    pub fn press(&mut self, button: Button) {
        self.buttons |= button.mask();
    }

    pub fn release(&mut self, button: Button) {
        self.buttons &= !button.mask();
    }

    pub fn set_axis(&mut self, axis: Axis, value: f64) {
        self.axes[axis as usize] = value;
    }
}

/// Every controller's state for one period.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub controllers: [ControllerState; MAX_CONTROLLERS],
}

impl InputSnapshot {
    /// Controller on `port`; out-of-range ports read as a released controller.
    #[inline]
    pub fn controller(&self, port: u8) -> ControllerState {
        self.controllers
            .get(port as usize)
            .copied()
            .unwrap_or_default()
    }

    #[inline]
    pub fn button(&self, port: u8, button: Button) -> bool {
        self.controller(port).button(button)
    }

    #[inline]
    pub fn axis(&self, port: u8, axis: Axis) -> f64 {
        self.controller(port).axis(axis)
    }

    #[inline]
    pub fn pov(&self, port: u8, direction: Pov) -> bool {
        self.controller(port).pov(direction)
    }

    /// Mutable controller on `port`, for input sources and tests.
    pub fn controller_mut(&mut self, port: u8) -> Option<&mut ControllerState> {
        self.controllers.get_mut(port as usize)
    }
}

/// Source of per-period operator input (driver station).
pub trait InputSource {
    /// Sample all controllers for the coming period.
    fn poll(&mut self) -> InputSnapshot;
}

/// Zero `value` inside `±deadband` and rescale the remainder to reach ±1.
pub fn apply_deadband(value: f64, deadband: f64) -> f64 {
    if !value.is_finite() || value.abs() <= deadband {
        return 0.0;
    }
    if deadband >= 1.0 {
        return 0.0;
    }
    if value > 0.0 {
        (value - deadband) / (1.0 - deadband)
    } else {
        (value + deadband) / (1.0 - deadband)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
