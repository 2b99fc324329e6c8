//! Per-period state handed to every command.

use std::time::Duration;

use crescendo_common::input::InputSnapshot;
use crescendo_common::robot::config::RobotConfig;
use crescendo_common::telemetry::Telemetry;

use crate::hal::Hardware;
use crate::hal::sim::SimHandles;
use crate::subsystem::Subsystems;

/// Everything a command may observe or drive during one period.
pub struct RobotContext {
    pub subsystems: Subsystems,
    pub inputs: InputSnapshot,
    pub telemetry: Telemetry,
    period: Duration,
    periods: u64,
}

impl RobotContext {
    pub fn new(config: &RobotConfig, hardware: Hardware, telemetry: Telemetry) -> Self {
        Self {
            subsystems: Subsystems::new(config, hardware),
            inputs: InputSnapshot::default(),
            telemetry,
            period: Duration::from_millis(u64::from(config.period_ms)),
            periods: 0,
        }
    }

    /// Context over simulated hardware, with handles to every device.
    pub fn simulated(config: &RobotConfig, telemetry: Telemetry) -> (Self, SimHandles) {
        let (hardware, handles) = Hardware::simulated(&config.arm, config.period_s());
        (Self::new(config, hardware, telemetry), handles)
    }

    /// Install this period's operator inputs and advance the clock.
    pub fn begin_period(&mut self, inputs: InputSnapshot) {
        self.inputs = inputs;
        self.periods += 1;
    }

    /// Time since the first period began.
    pub fn now(&self) -> Duration {
        let elapsed = u32::try_from(self.periods.saturating_sub(1)).unwrap_or(u32::MAX);
        self.period.saturating_mul(elapsed)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Periods begun so far.
    pub fn periods(&self) -> u64 {
        self.periods
    }
}

impl std::fmt::Debug for RobotContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RobotContext")
            .field("periods", &self.periods)
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}
