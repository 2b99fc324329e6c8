//! Fixed-period cycle: poll inputs → run one scheduler period.
//!
//! With the `rt` feature the loop paces itself with
//! `clock_nanosleep(TIMER_ABSTIME)` on `CLOCK_MONOTONIC`, so a late period
//! does not shift the ones after it. Without it, `std::thread::sleep` gives
//! approximate pacing for simulation.
//!
//! An overrun is counted and logged; the robot keeps running. The loop
//! stops when the shared `running` flag clears or after `max_periods`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crescendo_common::input::InputSource;
use thiserror::Error;
use tracing::{debug, warn};

use crate::container::RobotContainer;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-period timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total periods executed.
    pub cycle_count: u64,
    /// Last period's body duration [ns].
    pub last_cycle_ns: i64,
    pub min_cycle_ns: i64,
    pub max_cycle_ns: i64,
    /// Running sum for average computation.
    pub sum_cycle_ns: i64,
    /// Periods whose body took longer than the period.
    pub overruns: u64,
    /// Maximum wake-up latency [ns] (time between expected and actual wake).
    pub max_latency_ns: i64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
        }
    }

    /// Record a period duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns = self.sum_cycle_ns.saturating_add(duration_ns);
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Average period time [ns] (0 if nothing recorded).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CycleError {
    /// Real-time setup or clock access failed.
    #[error("RT setup failed: {0}")]
    RtSetup(String),

    /// Period must be non-zero.
    #[error("Invalid period: {0:?}")]
    InvalidPeriod(Duration),
}

// ─── RT Setup ───────────────────────────────────────────────────────

/// Lock memory pages and pin the thread to `cpu_core`.
///
/// No-op when the `rt` feature is not enabled.
#[cfg(feature = "rt")]
pub fn rt_setup(cpu_core: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::sys::mman::{MlockallFlags, mlockall};
    use nix::unistd::Pid;

    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))?;
    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu_core)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu_core}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))?;
    Ok(())
}

#[cfg(not(feature = "rt"))]
pub fn rt_setup(_cpu_core: usize) -> Result<(), CycleError> {
    Ok(())
}

// ─── Cycle Runner ───────────────────────────────────────────────────

pub struct CycleRunner<I> {
    container: RobotContainer,
    input: I,
    period: Duration,
    max_periods: Option<u64>,
    running: Arc<AtomicBool>,
    stats: CycleStats,
}

impl<I: InputSource> CycleRunner<I> {
    pub fn new(
        container: RobotContainer,
        input: I,
        running: Arc<AtomicBool>,
    ) -> Result<Self, CycleError> {
        let period = container.ctx().period();
        if period.is_zero() {
            return Err(CycleError::InvalidPeriod(period));
        }
        Ok(Self {
            container,
            input,
            period,
            max_periods: None,
            running,
            stats: CycleStats::new(),
        })
    }

    /// Stop after `periods` periods.
    pub fn with_max_periods(mut self, periods: u64) -> Self {
        self.max_periods = Some(periods);
        self
    }

    pub fn container(&self) -> &RobotContainer {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut RobotContainer {
        &mut self.container
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub fn into_container(self) -> RobotContainer {
        self.container
    }

    /// Run periods until stopped.
    pub fn run(&mut self) -> Result<(), CycleError> {
        #[cfg(feature = "rt")]
        {
            self.run_rt_loop()
        }

        #[cfg(not(feature = "rt"))]
        {
            self.run_sim_loop()
        }
    }

    fn should_continue(&self) -> bool {
        self.running.load(Ordering::Relaxed)
            && self.max_periods.is_none_or(|max| self.stats.cycle_count < max)
    }

    fn cycle_body(&mut self) {
        let inputs = self.input.poll();
        self.container.run_period(inputs);
    }

    fn note_duration(&mut self, duration_ns: i64, latency_ns: i64) {
        self.stats.record(duration_ns, latency_ns);
        let budget_ns = self.period.as_nanos() as i64;
        if duration_ns > budget_ns {
            self.stats.overruns += 1;
            warn!(
                "period {} overran: {duration_ns}ns > {budget_ns}ns",
                self.stats.cycle_count
            );
        }
    }

    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self) -> Result<(), CycleError> {
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let period_ns = self.period.as_nanos() as i64;
        let mut next_wake = clock_gettime(clock)
            .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;

        while self.should_continue() {
            let cycle_start = clock_gettime(clock)
                .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;
            let wake_latency_ns = timespec_diff_ns(&cycle_start, &next_wake).abs();

            self.cycle_body();

            let cycle_end = clock_gettime(clock)
                .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;
            self.note_duration(timespec_diff_ns(&cycle_end, &cycle_start), wake_latency_ns);

            next_wake = timespec_add_ns(next_wake, period_ns);
            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
        debug!("cycle loop stopped after {} periods", self.stats.cycle_count);
        Ok(())
    }

    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self) -> Result<(), CycleError> {
        use std::time::Instant;

        while self.should_continue() {
            let cycle_start = Instant::now();
            self.cycle_body();
            let elapsed = cycle_start.elapsed();
            self.note_duration(elapsed.as_nanos() as i64, 0);

            if let Some(remaining) = self.period.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }
        debug!("cycle loop stopped after {} periods", self.stats.cycle_count);
        Ok(())
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    while nanos < 0 {
        secs -= 1;
        nanos += 1_000_000_000;
    }
    TimeSpec::new(secs, nanos)
}

/// Difference (a - b) in nanoseconds.
#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}

// ─── Tests ──────────────────────────────────────────────────────────
