//! Heater control loop — time-proportioned PID actuation.
//!
//! Every control tick samples the temperature probe, runs one PID
//! evaluation, and converts the continuous output into an on/off
//! decision for the current duty-cycle window:
//!
//! ```text
//!  window_start                                window_start + window
//!       │◀──────────── output (ms on) ───────────▶│
//!       ├──────────────────────────┬──────────────┤
//!       │         heater ON        │  heater OFF  │
//!       └──────────────────────────┴──────────────┘
//! ```
//!
//! The heater is on for the first `output` milliseconds of each window
//! and off for the remainder — low-frequency PWM whose resolution is
//! `control_step_ms / control_window_ms`.

pub mod pid;

use log::{debug, warn};
use serde::Serialize;

use crate::app::ports::{HeaterPort, TemperaturePort};
use crate::config::SystemConfig;
use pid::Pid;

/// The heater control loop. Owns the PID state and the duty-cycle
/// window bookkeeping; hardware access goes through the port traits
/// passed into [`tick`](Self::tick).
pub struct HeaterControl {
    pid: Pid,
    input: Option<f32>,
    output: f32,
    heating: bool,
    window_start: u64,
    window_ms: u64,
    /// Edge detection for the sensor-fault warning log.
    fault_logged: bool,
}

impl HeaterControl {
    /// Build the control loop from persisted configuration.
    /// `now_ms` anchors the first duty-cycle window.
    pub fn new(config: &SystemConfig, now_ms: u64) -> Self {
        let mut pid = Pid::new(0.0, 0.0, 0.0, config.setpoint_c, config.pid_sample_ms);
        pid.set_tunings_physical(config.kp, config.tn_secs, config.tv_secs);
        pid.set_limits(0.0, config.control_window_ms as f32);

        Self {
            pid,
            input: None,
            output: 0.0,
            heating: false,
            window_start: now_ms,
            window_ms: config.control_window_ms,
            fault_logged: false,
        }
    }

    /// Copy the externally-configured setpoint into the control state.
    /// Takes effect on the next tick.
    pub fn reload(&mut self, config: &SystemConfig) {
        self.pid.set_target(config.setpoint_c);
        debug!("control: setpoint reloaded to {:.1}°C", config.setpoint_c);
    }

    /// Set PID gains directly.
    pub fn set_tunings(&mut self, kp: f32, ki: f32, kd: f32) {
        self.pid.set_tunings(kp, ki, kd);
    }

    /// Set PID gains in physical form (Kp, integral time Tn, derivative
    /// time Tv, both in seconds).
    pub fn set_tunings_physical(&mut self, kp: f32, tn: f32, tv: f32) {
        self.pid.set_tunings_physical(kp, tn, tv);
    }

    /// Run one control cycle: advance the window, sample the probe,
    /// evaluate the PID, decide the duty state, drive the heater.
    pub fn tick(
        &mut self,
        now_ms: u64,
        probe: &mut impl TemperaturePort,
        heater: &mut impl HeaterPort,
    ) {
        // Advance the window by exactly one width once it has elapsed.
        // Never resynchronise to `now_ms`: clock-read jitter must not
        // shift the duty-cycle base.
        if now_ms.saturating_sub(self.window_start) > self.window_ms {
            self.window_start += self.window_ms;
        }

        self.input = probe.read();

        self.heating = false;
        match self.input {
            Some(celsius) => {
                if self.fault_logged {
                    self.fault_logged = false;
                    debug!("control: probe recovered at {celsius:.1}°C");
                }
                self.output = self.pid.compute(celsius, now_ms);
                self.heating = self.output > now_ms.saturating_sub(self.window_start) as f32;
            }
            None => {
                // Probe fault: heater stays off and the PID is not
                // evaluated, so its integral state is frozen until a
                // valid reading resumes.
                if !self.fault_logged {
                    self.fault_logged = true;
                    warn!("control: no valid probe reading, heater forced off");
                }
            }
        }

        heater.set(self.heating);
    }

    /// Read-only view of the control state for the status API.
    pub fn snapshot(&self) -> ControlSnapshot {
        ControlSnapshot {
            setpoint_c: self.pid.target(),
            input_c: self.input,
            output_ms: self.output,
            heating: self.heating,
            duty_percent: (self.output / self.window_ms as f32 * 100.0).floor(),
        }
    }

    #[cfg(test)]
    fn integral(&self) -> f32 {
        self.pid.integral()
    }
}

/// Point-in-time view of the control loop, serializable for the
/// status endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ControlSnapshot {
    pub setpoint_c: f32,
    /// Latest probe reading; `None` while the probe is faulted.
    pub input_c: Option<f32>,
    /// PID output: heater on-time per window, in milliseconds.
    pub output_ms: f32,
    pub heating: bool,
    /// Output expressed as a whole duty-cycle percentage.
    pub duty_percent: f32,
}
