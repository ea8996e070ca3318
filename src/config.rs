//! System configuration parameters.
//!
//! All tunable parameters for the BrewTherm controller in a single
//! struct with centralized validation. Values are persisted via the
//! NVS config adapter and can be changed at runtime through the
//! partial-update path ([`ConfigUpdate`]).

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Core system configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Control ---
    /// Boiler temperature setpoint (°C). Open interval (0, 130).
    pub setpoint_c: f32,
    /// Proportional gain Kp.
    pub kp: f32,
    /// Integral time Tn (seconds); 0 disables the integral term.
    pub tn_secs: f32,
    /// Derivative time Tv (seconds).
    pub tv_secs: f32,

    // --- Network (station join) ---
    /// Hostname announced when joining an existing network.
    pub join_hostname: String<32>,
    /// SSID of the network to join. Length ≤ 1 means "host our own
    /// network instead".
    pub join_ssid: String<32>,
    /// WPA2 passphrase for the join network (empty for open networks).
    pub join_password: String<64>,

    // --- Network (access-point fallback) ---
    /// SSID of the fallback access point this device hosts.
    pub ap_ssid: String<32>,
    /// WPA2 passphrase of the fallback access point.
    pub ap_password: String<64>,

    // --- Timing ---
    /// Control loop tick interval (milliseconds).
    pub control_step_ms: u64,
    /// Duty-cycle window (milliseconds). Resolution = step / window.
    pub control_window_ms: u64,
    /// PID re-evaluation period (milliseconds).
    pub pid_sample_ms: u64,
    /// Network state machine tick interval (milliseconds).
    pub net_check_interval_ms: u64,
    /// History sampling interval (milliseconds).
    pub history_interval_ms: u64,
    /// Status / telemetry interval (milliseconds).
    pub status_interval_ms: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Control — gains proven on single-boiler espresso machines
            setpoint_c: 96.0,
            kp: 69.0,
            tn_secs: 399.0,
            tv_secs: 0.0,

            // Network
            join_hostname: str_field("brewtherm"),
            join_ssid: String::new(),
            join_password: String::new(),
            ap_ssid: str_field("brewtherm"),
            ap_password: str_field("brewtherm42"),

            // Timing
            control_step_ms: 10,      // 1% duty resolution
            control_window_ms: 1000,
            pid_sample_ms: 100,
            net_check_interval_ms: 1000,
            history_interval_ms: 1000,
            status_interval_ms: 1000,
        }
    }
}

fn str_field<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    let _ = out.push_str(s);
    out
}

impl SystemConfig {
    /// Range-check every field. Called by the config store before
    /// persisting and by [`apply`](Self::apply) before committing a
    /// partial update.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.setpoint_c > 0.0 && self.setpoint_c < 130.0) {
            return Err(ConfigError::ValidationFailed(
                "setpoint_c must be strictly between 0 and 130",
            ));
        }
        if self.kp < 0.0 || self.tn_secs < 0.0 || self.tv_secs < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "pid tunings must be non-negative",
            ));
        }
        if self.join_hostname.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "join_hostname must not be empty",
            ));
        }
        if self.ap_ssid.is_empty() {
            return Err(ConfigError::ValidationFailed("ap_ssid must not be empty"));
        }
        validate_passphrase(&self.join_password, "join_password must be 8-64 bytes or empty")?;
        validate_passphrase(&self.ap_password, "ap_password must be 8-64 bytes or empty")?;
        if self.control_step_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "control_step_ms must be non-zero",
            ));
        }
        if self.control_window_ms < self.control_step_ms {
            return Err(ConfigError::ValidationFailed(
                "control_window_ms must be >= control_step_ms",
            ));
        }
        if self.pid_sample_ms == 0 || self.pid_sample_ms > self.control_window_ms {
            return Err(ConfigError::ValidationFailed(
                "pid_sample_ms must be in 1..=control_window_ms",
            ));
        }
        if self.net_check_interval_ms == 0
            || self.history_interval_ms == 0
            || self.status_interval_ms == 0
        {
            return Err(ConfigError::ValidationFailed(
                "task intervals must be non-zero",
            ));
        }
        Ok(())
    }

    /// Apply a partial update, validate-then-commit.
    ///
    /// The update is merged into a candidate copy first; if the
    /// candidate fails validation, `self` is left untouched and the
    /// rejection reason is returned.
    pub fn apply(&mut self, update: &ConfigUpdate) -> Result<ChangeSet, ConfigError> {
        let mut candidate = self.clone();
        update.merge_into(&mut candidate);
        candidate.validate()?;

        let changes = ChangeSet {
            changed: candidate != *self,
            setpoint_changed: (candidate.setpoint_c - self.setpoint_c).abs() > f32::EPSILON,
        };
        *self = candidate;
        Ok(changes)
    }
}

fn validate_passphrase(pw: &str, reason: &'static str) -> Result<(), ConfigError> {
    if pw.is_empty() || (8..=64).contains(&pw.len()) {
        Ok(())
    } else {
        Err(ConfigError::ValidationFailed(reason))
    }
}

// ---------------------------------------------------------------------------
// Partial updates
// ---------------------------------------------------------------------------

/// A partial configuration update, typically deserialized from the
/// JSON body of the config mutation endpoint. Absent fields leave the
/// current value in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    pub setpoint_c: Option<f32>,
    pub kp: Option<f32>,
    pub tn_secs: Option<f32>,
    pub tv_secs: Option<f32>,
    pub join_hostname: Option<String<32>>,
    pub join_ssid: Option<String<32>>,
    pub join_password: Option<String<64>>,
    pub ap_ssid: Option<String<32>>,
    pub ap_password: Option<String<64>>,
}

impl ConfigUpdate {
    /// Parse an update from a JSON document.
    pub fn from_json(body: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(body).map_err(|_| ConfigError::Corrupted)
    }

    fn merge_into(&self, target: &mut SystemConfig) {
        if let Some(v) = self.setpoint_c {
            target.setpoint_c = v;
        }
        if let Some(v) = self.kp {
            target.kp = v;
        }
        if let Some(v) = self.tn_secs {
            target.tn_secs = v;
        }
        if let Some(v) = self.tv_secs {
            target.tv_secs = v;
        }
        if let Some(v) = &self.join_hostname {
            target.join_hostname = v.clone();
        }
        if let Some(v) = &self.join_ssid {
            target.join_ssid = v.clone();
        }
        if let Some(v) = &self.join_password {
            target.join_password = v.clone();
        }
        if let Some(v) = &self.ap_ssid {
            target.ap_ssid = v.clone();
        }
        if let Some(v) = &self.ap_password {
            target.ap_password = v.clone();
        }
    }
}

/// What an accepted [`ConfigUpdate`] actually changed. The caller uses
/// this to decide whether to persist and whether to reload the control
/// loop's setpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeSet {
    /// At least one field differs from the previous configuration.
    pub changed: bool,
    /// The setpoint specifically changed (triggers a control reload).
    pub setpoint_changed: bool,
}
