//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (HTTP config
//! endpoint, serial console) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.

use crate::config::ConfigUpdate;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Apply a partial configuration update: validate, persist, and
    /// reload the control setpoint if it changed.
    ApplyConfig(ConfigUpdate),

    /// Re-read the setpoint from the current configuration without
    /// changing anything else.
    ReloadSetpoint,

    /// Set PID gains directly (takes effect immediately, not persisted).
    SetTunings { kp: f32, ki: f32, kd: f32 },

    /// Set PID gains in physical form: gain Kp, integral time Tn (s),
    /// derivative time Tv (s).
    SetTuningsPhysical { kp: f32, tn: f32, tv: f32 },
}
