//! Shared fixtures: a recording command, a shared telemetry sink and
//! input helpers.

use std::cell::RefCell;
use std::rc::Rc;

use crescendo_common::input::{Axis, Button, InputSnapshot, Pov};
use crescendo_common::robot::config::RobotConfig;
use crescendo_common::subsystem::Requirements;
use crescendo_common::telemetry::{MemorySink, Telemetry, TelemetryError, TelemetrySink, TelemetryValue};
use crescendo_robot::command::{Command, InterruptionBehavior};
use crescendo_robot::context::RobotContext;
use crescendo_robot::hal::sim::SimHandles;

pub type Log = Rc<RefCell<Vec<String>>>;

pub fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

/// Command that records its lifecycle calls and finishes after `ticks`
/// ticks (`None` runs until interrupted).
pub struct Recorder {
    name: String,
    requirements: Requirements,
    interruption: InterruptionBehavior,
    ticks: Option<u32>,
    seen: u32,
    log: Log,
}

impl Recorder {
    pub fn new(name: &str, requirements: Requirements, ticks: Option<u32>, log: &Log) -> Self {
        Self {
            name: name.to_string(),
            requirements,
            interruption: InterruptionBehavior::Interruptible,
            ticks,
            seen: 0,
            log: Rc::clone(log),
        }
    }

    pub fn forever(name: &str, requirements: Requirements, log: &Log) -> Self {
        Self::new(name, requirements, None, log)
    }

    pub fn stubborn(mut self) -> Self {
        self.interruption = InterruptionBehavior::NonInterruptible;
        self
    }
}

impl Command for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        self.requirements
    }

    fn interruption(&self) -> InterruptionBehavior {
        self.interruption
    }

    fn start(&mut self, _ctx: &mut RobotContext) {
        self.seen = 0;
        self.log.borrow_mut().push(format!("{}.start", self.name));
    }

    fn tick(&mut self, _ctx: &mut RobotContext) {
        self.seen += 1;
        self.log.borrow_mut().push(format!("{}.tick", self.name));
    }

    fn is_finished(&self, _ctx: &RobotContext) -> bool {
        self.ticks.is_some_and(|t| self.seen >= t)
    }

    fn end(&mut self, _ctx: &mut RobotContext, interrupted: bool) {
        self.log
            .borrow_mut()
            .push(format!("{}.end({interrupted})", self.name));
    }
}

/// Number of log entries equal to `entry`.
pub fn count(log: &Log, entry: &str) -> usize {
    log.borrow().iter().filter(|e| *e == entry).count()
}

/// Position of the first log entry equal to `entry`.
pub fn position(log: &Log, entry: &str) -> Option<usize> {
    log.borrow().iter().position(|e| e == entry)
}

// ─── Telemetry ──────────────────────────────────────────────────────

/// Memory sink shared with the test body.
#[derive(Clone, Default)]
pub struct SharedSink(pub Rc<RefCell<MemorySink>>);

impl TelemetrySink for SharedSink {
    fn publish(&mut self, key: &str, value: TelemetryValue) -> Result<(), TelemetryError> {
        self.0.borrow_mut().publish(key, value)
    }
}

impl SharedSink {
    pub fn telemetry(&self) -> Telemetry {
        Telemetry::new(Box::new(self.clone()))
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.0.borrow().number(key)
    }

    pub fn boolean(&self, key: &str) -> Option<bool> {
        self.0.borrow().boolean(key)
    }
}

// ─── Context / Inputs ───────────────────────────────────────────────

pub fn sim_ctx() -> (RobotContext, SimHandles) {
    RobotContext::simulated(&RobotConfig::default(), Telemetry::default())
}

pub fn idle() -> InputSnapshot {
    InputSnapshot::default()
}

pub fn press(port: u8, button: Button) -> InputSnapshot {
    let mut input = InputSnapshot::default();
    if let Some(pad) = input.controller_mut(port) {
        pad.press(button);
    }
    input
}

pub fn pov(port: u8, direction: Pov) -> InputSnapshot {
    let mut input = InputSnapshot::default();
    if let Some(pad) = input.controller_mut(port) {
        pad.pov = Some(direction.angle());
    }
    input
}

pub fn axis(port: u8, axis: Axis, value: f64) -> InputSnapshot {
    let mut input = InputSnapshot::default();
    if let Some(pad) = input.controller_mut(port) {
        pad.set_axis(axis, value);
    }
    input
}
