//! Port traits — the boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (probe, heater, radio, config store, event sinks)
//! implement these traits. The domain consumes them via generics, so
//! the core never touches hardware directly.

use crate::config::SystemConfig;
use crate::error::{ConfigError, NetError};

// ───────────────────────────────────────────────────────────────
// Temperature probe (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the boiler temperature probe.
pub trait TemperaturePort {
    /// One reading in °C, or `None` when the probe is faulted or the
    /// raw value is outside the physically plausible range. A `None`
    /// must never be acted upon as a temperature.
    fn read(&mut self) -> Option<f32>;
}

// ───────────────────────────────────────────────────────────────
// Heater actuator (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the heater element. Binary on/off only — the
/// time-proportioning happens in the control loop, not in hardware.
pub trait HeaterPort {
    fn set(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// WiFi radio (driven adapter: domain ↔ network stack)
// ───────────────────────────────────────────────────────────────

/// Radio operations the network state machine drives.
pub trait WifiPort {
    /// Begin joining the given network in station mode. Non-blocking;
    /// progress is observed via [`link_up`](Self::link_up).
    fn start_join(&mut self, hostname: &str, ssid: &str, password: &str) -> Result<(), NetError>;

    /// Whether the station link is currently established.
    fn link_up(&mut self) -> bool;

    /// Tear down any station association.
    fn disconnect(&mut self);

    /// Start hosting the fallback access point. Returns `false` if the
    /// AP could not be brought up.
    fn start_ap(&mut self, ssid: &str, password: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Configuration store (driven adapter: domain ↔ persistence)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before persisting: invalid values are
/// rejected with [`ConfigError::ValidationFailed`], never silently
/// clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log, HTTP
/// push, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
