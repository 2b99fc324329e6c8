//! Simulated devices for development and testing without a robot.
//!
//! Each device shares its state with a handle so tests and the sim binary
//! can observe commanded references, script sensor levels and inject
//! communication faults:
//!
//! - [`SimMotor`] - first-order velocity response to velocity/voltage references
//! - [`SimArm`] - gravity-loaded pivot driven by voltage, with hard stops
//! - [`SimBeamBreak`] - scriptable digital sensor
//! - [`SimDriveBase`] - chassis that integrates heading from commanded speeds
//!
//! Devices step their physics once per `set_reference`/`drive` call, which
//! the subsystems issue exactly once per period.

use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;

use crescendo_common::hal::{
    ChassisSpeeds, ControlType, DigitalInput, DriveBase, HalError, MotorController,
};
use crescendo_common::input::{InputSnapshot, InputSource};
use crescendo_common::robot::config::ArmConfig;
use tracing::{debug, info};

use super::Hardware;

/// Free speed used to convert voltage references into velocity [rpm].
const FREE_SPEED_RPM: f64 = 5600.0;

/// Fraction of the remaining velocity error closed per period.
const VELOCITY_RESPONSE: f64 = 0.35;

/// Arm hard stops [rot].
const ARM_MIN_POSITION: f64 = 0.0;
const ARM_MAX_POSITION: f64 = 0.35;

// ─── Velocity Motor ─────────────────────────────────────────────────

#[derive(Debug, Default)]
struct MotorState {
    reference: f64,
    control: Option<ControlType>,
    velocity: f64,
    position: f64,
    writes: u64,
    fault: Option<HalError>,
}

/// Simulated smart motor controller with an onboard velocity loop.
pub struct SimMotor {
    name: &'static str,
    dt: f64,
    state: Rc<RefCell<MotorState>>,
}

/// Observation and fault-injection handle for a [`SimMotor`].
#[derive(Clone)]
pub struct SimMotorHandle {
    state: Rc<RefCell<MotorState>>,
}

impl SimMotor {
    pub fn new(name: &'static str, dt: f64) -> (Self, SimMotorHandle) {
        let state = Rc::new(RefCell::new(MotorState::default()));
        let handle = SimMotorHandle {
            state: Rc::clone(&state),
        };
        (Self { name, dt, state }, handle)
    }
}

impl MotorController for SimMotor {
    fn name(&self) -> &'static str {
        self.name
    }

    fn set_reference(&mut self, value: f64, control: ControlType) -> Result<(), HalError> {
        let mut s = self.state.borrow_mut();
        if let Some(e) = &s.fault {
            return Err(e.clone());
        }
        let target = match control {
            ControlType::Velocity => value,
            ControlType::Voltage => value / crescendo_common::consts::NOMINAL_VOLTAGE * FREE_SPEED_RPM,
            ControlType::Position => s.velocity,
        };
        s.reference = value;
        s.control = Some(control);
        s.writes += 1;
        s.velocity += (target - s.velocity) * VELOCITY_RESPONSE;
        s.position += s.velocity / 60.0 * self.dt;
        Ok(())
    }

    fn position(&self) -> Result<f64, HalError> {
        let s = self.state.borrow();
        match &s.fault {
            Some(e) => Err(e.clone()),
            None => Ok(s.position),
        }
    }

    fn velocity(&self) -> Result<f64, HalError> {
        let s = self.state.borrow();
        match &s.fault {
            Some(e) => Err(e.clone()),
            None => Ok(s.velocity),
        }
    }
}

impl SimMotorHandle {
    /// Last reference the device accepted.
    pub fn reference(&self) -> f64 {
        self.state.borrow().reference
    }

    pub fn control(&self) -> Option<ControlType> {
        self.state.borrow().control
    }

    pub fn velocity(&self) -> f64 {
        self.state.borrow().velocity
    }

    /// Number of accepted writes.
    pub fn writes(&self) -> u64 {
        self.state.borrow().writes
    }

    /// Force the measured velocity (e.g. a flywheel already at speed).
    pub fn set_velocity(&self, rpm: f64) {
        self.state.borrow_mut().velocity = rpm;
    }

    /// Inject or clear a communication fault on reads and writes.
    pub fn set_fault(&self, fault: Option<HalError>) {
        self.state.borrow_mut().fault = fault;
    }
}

// ─── Arm Pivot ──────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct ArmState {
    position: f64,
    velocity: f64,
    voltage: f64,
    writes: u64,
    fault: Option<HalError>,
}

/// Simulated arm pivot.
///
/// ```text
/// a = (V - Kg × cos θ - Kv × v) / Ka
/// ```
pub struct SimArm {
    dt: f64,
    kg: f64,
    kv: f64,
    ka: f64,
    horizontal_offset: f64,
    state: Rc<RefCell<ArmState>>,
}

#[derive(Clone)]
pub struct SimArmHandle {
    state: Rc<RefCell<ArmState>>,
}

impl SimArm {
    /// Plant matching the configured arm characterisation.
    pub fn new(config: &ArmConfig, dt: f64) -> (Self, SimArmHandle) {
        let state = Rc::new(RefCell::new(ArmState {
            position: config.stow.clamp(ARM_MIN_POSITION, ARM_MAX_POSITION),
            ..ArmState::default()
        }));
        let handle = SimArmHandle {
            state: Rc::clone(&state),
        };
        let ka = if config.ka > 0.0 { config.ka } else { 0.05 };
        let sim = Self {
            dt,
            kg: config.kg,
            kv: config.kv,
            ka,
            horizontal_offset: config.horizontal_offset,
            state,
        };
        (sim, handle)
    }

    fn step(&self, s: &mut ArmState, voltage: f64) {
        let gravity = self.kg * ((s.position - self.horizontal_offset) * TAU).cos();
        let accel = (voltage - gravity - self.kv * s.velocity) / self.ka;
        s.velocity += accel * self.dt;
        s.position += s.velocity * self.dt;
        if s.position <= ARM_MIN_POSITION {
            s.position = ARM_MIN_POSITION;
            s.velocity = s.velocity.max(0.0);
        } else if s.position >= ARM_MAX_POSITION {
            s.position = ARM_MAX_POSITION;
            s.velocity = s.velocity.min(0.0);
        }
    }
}

impl MotorController for SimArm {
    fn name(&self) -> &'static str {
        "arm_pivot"
    }

    fn set_reference(&mut self, value: f64, control: ControlType) -> Result<(), HalError> {
        let mut s = self.state.borrow_mut();
        if let Some(e) = &s.fault {
            return Err(e.clone());
        }
        let voltage = match control {
            ControlType::Voltage => value,
            // The pivot is only ever driven open-loop by the arm subsystem.
            ControlType::Velocity | ControlType::Position => 0.0,
        };
        s.voltage = voltage;
        s.writes += 1;
        self.step(&mut s, voltage);
        Ok(())
    }

    fn position(&self) -> Result<f64, HalError> {
        let s = self.state.borrow();
        match &s.fault {
            Some(e) => Err(e.clone()),
            None => Ok(s.position),
        }
    }

    fn velocity(&self) -> Result<f64, HalError> {
        let s = self.state.borrow();
        match &s.fault {
            Some(e) => Err(e.clone()),
            None => Ok(s.velocity * 60.0),
        }
    }
}

impl SimArmHandle {
    pub fn position(&self) -> f64 {
        self.state.borrow().position
    }

    /// Last accepted voltage [V].
    pub fn voltage(&self) -> f64 {
        self.state.borrow().voltage
    }

    pub fn writes(&self) -> u64 {
        self.state.borrow().writes
    }

    pub fn set_position(&self, position: f64) {
        let mut s = self.state.borrow_mut();
        s.position = position;
        s.velocity = 0.0;
    }

    pub fn set_fault(&self, fault: Option<HalError>) {
        self.state.borrow_mut().fault = fault;
    }
}

// ─── Beam Break ─────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct BeamState {
    present: bool,
    fault: Option<HalError>,
}

pub struct SimBeamBreak {
    state: Rc<RefCell<BeamState>>,
}

#[derive(Clone)]
pub struct SimBeamBreakHandle {
    state: Rc<RefCell<BeamState>>,
}

impl SimBeamBreak {
    pub fn new() -> (Self, SimBeamBreakHandle) {
        let state = Rc::new(RefCell::new(BeamState::default()));
        let handle = SimBeamBreakHandle {
            state: Rc::clone(&state),
        };
        (Self { state }, handle)
    }
}

impl DigitalInput for SimBeamBreak {
    fn name(&self) -> &'static str {
        "indexer_beam_break"
    }

    fn get(&self) -> Result<bool, HalError> {
        let s = self.state.borrow();
        match &s.fault {
            Some(e) => Err(e.clone()),
            None => Ok(s.present),
        }
    }
}

impl SimBeamBreakHandle {
    /// Place or remove a note in front of the sensor.
    pub fn set_present(&self, present: bool) {
        self.state.borrow_mut().present = present;
    }

    pub fn set_fault(&self, fault: Option<HalError>) {
        self.state.borrow_mut().fault = fault;
    }
}

// ─── Drive Base ─────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct DriveState {
    speeds: ChassisSpeeds,
    field_relative: bool,
    heading: f64,
    brake: bool,
    gyro_resets: u32,
    fault: Option<HalError>,
}

pub struct SimDriveBase {
    dt: f64,
    state: Rc<RefCell<DriveState>>,
}

#[derive(Clone)]
pub struct SimDriveHandle {
    state: Rc<RefCell<DriveState>>,
}

impl SimDriveBase {
    pub fn new(dt: f64) -> (Self, SimDriveHandle) {
        let state = Rc::new(RefCell::new(DriveState::default()));
        let handle = SimDriveHandle {
            state: Rc::clone(&state),
        };
        (Self { dt, state }, handle)
    }
}

impl DriveBase for SimDriveBase {
    fn drive(&mut self, speeds: ChassisSpeeds, field_relative: bool) -> Result<(), HalError> {
        let mut s = self.state.borrow_mut();
        if let Some(e) = &s.fault {
            return Err(e.clone());
        }
        s.speeds = speeds;
        s.field_relative = field_relative;
        s.heading = (s.heading + speeds.omega * self.dt).rem_euclid(TAU);
        Ok(())
    }

    fn zero_gyro(&mut self) -> Result<(), HalError> {
        let mut s = self.state.borrow_mut();
        if let Some(e) = &s.fault {
            return Err(e.clone());
        }
        s.heading = 0.0;
        s.gyro_resets += 1;
        debug!("sim gyro zeroed");
        Ok(())
    }

    fn set_motor_brake(&mut self, brake: bool) -> Result<(), HalError> {
        let mut s = self.state.borrow_mut();
        if let Some(e) = &s.fault {
            return Err(e.clone());
        }
        s.brake = brake;
        Ok(())
    }

    fn heading(&self) -> Result<f64, HalError> {
        let s = self.state.borrow();
        match &s.fault {
            Some(e) => Err(e.clone()),
            None => Ok(s.heading),
        }
    }
}

impl SimDriveHandle {
    /// Last commanded chassis speeds.
    pub fn speeds(&self) -> ChassisSpeeds {
        self.state.borrow().speeds
    }

    pub fn field_relative(&self) -> bool {
        self.state.borrow().field_relative
    }

    pub fn heading(&self) -> f64 {
        self.state.borrow().heading
    }

    pub fn brake(&self) -> bool {
        self.state.borrow().brake
    }

    pub fn gyro_resets(&self) -> u32 {
        self.state.borrow().gyro_resets
    }

    pub fn set_fault(&self, fault: Option<HalError>) {
        self.state.borrow_mut().fault = fault;
    }
}

// ─── Assembled Robot ────────────────────────────────────────────────

/// Handles to every simulated device of a [`Hardware`] bundle.
#[derive(Clone)]
pub struct SimHandles {
    pub arm: SimArmHandle,
    pub left_flywheel: SimMotorHandle,
    pub right_flywheel: SimMotorHandle,
    pub indexer: SimMotorHandle,
    pub beam_break: SimBeamBreakHandle,
    pub intake: SimMotorHandle,
    pub drive: SimDriveHandle,
}

impl std::fmt::Debug for SimHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimHandles")
            .field("arm_position", &self.arm.position())
            .field("drive_speeds", &self.drive.speeds())
            .finish_non_exhaustive()
    }
}

impl Hardware {
    /// A fully simulated robot stepping every `dt` seconds.
    pub fn simulated(arm: &ArmConfig, dt: f64) -> (Self, SimHandles) {
        let (arm_motor, arm_h) = SimArm::new(arm, dt);
        let (left, left_h) = SimMotor::new("left_flywheel", dt);
        let (right, right_h) = SimMotor::new("right_flywheel", dt);
        let (indexer, indexer_h) = SimMotor::new("indexer", dt);
        let (beam, beam_h) = SimBeamBreak::new();
        let (intake, intake_h) = SimMotor::new("intake", dt);
        let (drive, drive_h) = SimDriveBase::new(dt);
        info!("Simulated hardware created (dt={dt}s)");

        let hardware = Self {
            arm_motor: Box::new(arm_motor),
            left_flywheel: Box::new(left),
            right_flywheel: Box::new(right),
            indexer: Box::new(indexer),
            beam_break: Box::new(beam),
            intake_motor: Box::new(intake),
            drive_base: Box::new(drive),
        };
        let handles = SimHandles {
            arm: arm_h,
            left_flywheel: left_h,
            right_flywheel: right_h,
            indexer: indexer_h,
            beam_break: beam_h,
            intake: intake_h,
            drive: drive_h,
        };
        (hardware, handles)
    }
}

// ─── Scripted Input ─────────────────────────────────────────────────

/// Replays a fixed sequence of input snapshots, then holds the last one.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: Vec<InputSnapshot>,
    cursor: usize,
}

impl ScriptedInput {
    pub fn new(frames: Vec<InputSnapshot>) -> Self {
        Self { frames, cursor: 0 }
    }

    /// Controllers at rest for every period.
    pub fn idle() -> Self {
        Self::default()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> InputSnapshot {
        let frame = self
            .frames
            .get(self.cursor)
            .or_else(|| self.frames.last())
            .copied()
            .unwrap_or_default();
        self.cursor = self.cursor.saturating_add(1);
        frame
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
