//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through
//! the [`EventSink`](super::ports::EventSink) port. Adapters on the
//! other side decide what to do with them — log to serial, push to a
//! dashboard, etc.

use serde::Serialize;

use crate::net::LinkState;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The application service has started.
    Started,

    /// The network machine transitioned between states.
    NetStateChanged { from: LinkState, to: LinkState },

    /// A configuration update was accepted and persisted.
    ConfigApplied { setpoint_changed: bool },

    /// Periodic status snapshot.
    Telemetry(TelemetryData),
}

/// A point-in-time status snapshot suitable for logging or the JSON
/// status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryData {
    pub at_ms: u64,
    pub net: LinkState,
    pub setpoint_c: f32,
    /// Latest probe reading; `None` while the probe is faulted.
    pub input_c: Option<f32>,
    /// PID output: heater on-time per window, in milliseconds.
    pub output_ms: f32,
    pub heating: bool,
    /// Output as a whole duty-cycle percentage.
    pub duty_percent: f32,
    /// Samples currently held in the history log.
    pub history_len: usize,
}
