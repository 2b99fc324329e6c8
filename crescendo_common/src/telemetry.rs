//! Fire-and-forget telemetry.
//!
//! Subsystems and commands publish scalar, boolean and text diagnostics under
//! string keys. A sink may fail (dashboard disconnected, buffer full); the
//! [`Telemetry`] wrapper swallows and counts those failures so that publishing
//! can never influence control output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

/// A single published diagnostic value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TelemetryValue {
    Number(f64),
    Boolean(bool),
    Text(String),
}

impl From<f64> for TelemetryValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for TelemetryValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for TelemetryValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// Publishing failure reported by a sink.
#[derive(Debug, Clone, Error)]
pub enum TelemetryError {
    #[error("Telemetry sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for diagnostic values (dashboard, network tables, log).
pub trait TelemetrySink {
    fn publish(&mut self, key: &str, value: TelemetryValue) -> Result<(), TelemetryError>;
}

/// Sink that keeps the latest value per key; serialisable as a JSON snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemorySink {
    values: BTreeMap<String, TelemetryValue>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&TelemetryValue> {
        self.values.get(key)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        match self.values.get(key) {
            Some(TelemetryValue::Number(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn boolean(&self, key: &str) -> Option<bool> {
        match self.values.get(key) {
            Some(TelemetryValue::Boolean(v)) => Some(*v),
            _ => None,
        }
    }

    /// JSON object of every key's latest value.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.values)
    }
}

impl TelemetrySink for MemorySink {
    fn publish(&mut self, key: &str, value: TelemetryValue) -> Result<(), TelemetryError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Sink that forwards every value to `tracing` at TRACE level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn publish(&mut self, key: &str, value: TelemetryValue) -> Result<(), TelemetryError> {
        trace!(target: "telemetry", key, ?value);
        Ok(())
    }
}

/// Publishing front-end owned by the robot context.
pub struct Telemetry {
    sink: Box<dyn TelemetrySink>,
    dropped: u64,
}

impl Telemetry {
    pub fn new(sink: Box<dyn TelemetrySink>) -> Self {
        Self { sink, dropped: 0 }
    }

    /// Publish a value; failures are counted, never returned.
    pub fn put(&mut self, key: &str, value: impl Into<TelemetryValue>) {
        if let Err(e) = self.sink.publish(key, value.into()) {
            self.dropped += 1;
            trace!("telemetry drop for {key}: {e}");
        }
    }

    /// Number of values the sink refused.
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new(Box::new(TracingSink))
    }
}

impl std::fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telemetry")
            .field("dropped", &self.dropped)
            .finish_non_exhaustive()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
