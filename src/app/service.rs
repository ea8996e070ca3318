//! Application service — the domain core.
//!
//! [`AppService`] owns the control loop, the network state machine,
//! the history log, and the live configuration. It exposes one entry
//! point per scheduled task plus [`handle_command`] for externally
//! requested actions. All I/O flows through port traits injected at
//! call sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  TemperaturePort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!  WifiPort       ◀──▶ │        AppService        │
//!  HeaterPort     ◀─── │  control · net · history │ ◀── ConfigPort
//!                      └──────────────────────────┘
//! ```

use core::fmt;

use log::info;

use crate::config::SystemConfig;
use crate::control::{ControlSnapshot, HeaterControl};
use crate::error::ConfigError;
use crate::history::HistoryLog;
use crate::net::{NetSnapshot, NetworkMonitor};

use super::commands::AppCommand;
use super::events::{AppEvent, TelemetryData};
use super::ports::{ConfigPort, EventSink, HeaterPort, TemperaturePort, WifiPort};

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: SystemConfig,
    control: HeaterControl,
    net: NetworkMonitor,
    history: HistoryLog,
}

impl AppService {
    /// Construct the service from persisted configuration. `now_ms`
    /// anchors the control loop's first duty-cycle window.
    pub fn new(config: SystemConfig, now_ms: u64) -> Self {
        let control = HeaterControl::new(&config, now_ms);
        Self {
            config,
            control,
            net: NetworkMonitor::new(),
            history: HistoryLog::new(),
        }
    }

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started);
        info!(
            "service: started, setpoint {:.1}°C, window {} ms",
            self.config.setpoint_c, self.config.control_window_ms
        );
    }

    // ── Scheduled task entry points ───────────────────────────

    /// Control task (fast cadence): one heater control cycle.
    pub fn tick_control(
        &mut self,
        now_ms: u64,
        probe: &mut impl TemperaturePort,
        heater: &mut impl HeaterPort,
    ) {
        self.control.tick(now_ms, probe, heater);
    }

    /// Network task (slow cadence): one connectivity check.
    pub fn tick_net(&mut self, wifi: &mut impl WifiPort, sink: &mut impl EventSink) {
        let before = self.net.state();
        self.net.tick(&self.config, wifi);
        let after = self.net.state();
        // Attempt-counter increments stay within `Joining`; only a real
        // state change is worth an event.
        if core::mem::discriminant(&after) != core::mem::discriminant(&before) {
            sink.emit(&AppEvent::NetStateChanged {
                from: before,
                to: after,
            });
        }
    }

    /// History task: sample the probe into the circular log. Invalid
    /// readings are recorded as-is so gaps remain visible in the dump.
    pub fn tick_history(&mut self, now_ms: u64, probe: &mut impl TemperaturePort) {
        self.history.record(now_ms, probe.read());
    }

    /// Status task: emit one telemetry snapshot.
    pub fn tick_status(&mut self, now_ms: u64, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Telemetry(self.telemetry(now_ms)));
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command. Returns the rejection reason for
    /// invalid configuration input; the caller renders it to the
    /// requester (e.g. as an HTTP 400 body).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        store: &impl ConfigPort,
        sink: &mut impl EventSink,
    ) -> Result<(), ConfigError> {
        match cmd {
            AppCommand::ApplyConfig(update) => {
                let changes = self.config.apply(&update)?;
                if changes.changed {
                    store.save(&self.config)?;
                }
                if changes.setpoint_changed {
                    self.control.reload(&self.config);
                }
                if changes.changed {
                    sink.emit(&AppEvent::ConfigApplied {
                        setpoint_changed: changes.setpoint_changed,
                    });
                }
                Ok(())
            }
            AppCommand::ReloadSetpoint => {
                self.control.reload(&self.config);
                Ok(())
            }
            AppCommand::SetTunings { kp, ki, kd } => {
                self.control.set_tunings(kp, ki, kd);
                info!("service: tunings set to Kp={kp} Ki={ki} Kd={kd}");
                Ok(())
            }
            AppCommand::SetTuningsPhysical { kp, tn, tv } => {
                self.control.set_tunings_physical(kp, tn, tv);
                info!("service: tunings set to Kp={kp} Tn={tn}s Tv={tv}s");
                Ok(())
            }
        }
    }

    // ── Read-only status surface ──────────────────────────────

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn control_snapshot(&self) -> ControlSnapshot {
        self.control.snapshot()
    }

    pub fn net_snapshot(&self) -> NetSnapshot {
        self.net.snapshot()
    }

    /// Render the history log as CSV (`time,temperature` header plus
    /// one row per sample, oldest first).
    pub fn write_history_csv(&self, out: &mut impl fmt::Write) -> fmt::Result {
        self.history.write_csv(out)
    }

    fn telemetry(&self, now_ms: u64) -> TelemetryData {
        let control = self.control.snapshot();
        TelemetryData {
            at_ms: now_ms,
            net: self.net.state(),
            setpoint_c: control.setpoint_c,
            input_c: control.input_c,
            output_ms: control.output_ms,
            heating: control.heating,
            duty_percent: control.duty_percent,
            history_len: self.history.len(),
        }
    }
}
