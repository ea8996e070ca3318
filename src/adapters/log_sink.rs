//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART / USB-CDC in production). This is the serial status
//! presenter: the once-a-second telemetry event becomes the classic
//! status line with network state, setpoint, temperature, and heater
//! duty.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::net::LinkState;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                let temp = match t.input_c {
                    Some(c) => format!("{c:.2}°C"),
                    None => "--".to_string(),
                };
                info!(
                    "STATUS | net={} | set={:.2}°C | temp={temp} | heater={:.0}%",
                    describe_net(t.net),
                    t.setpoint_c,
                    t.duty_percent,
                );
            }
            AppEvent::NetStateChanged { from, to } => {
                info!("NET | {from:?} -> {to:?}");
            }
            AppEvent::ConfigApplied { setpoint_changed } => {
                info!("CONFIG | applied (setpoint_changed={setpoint_changed})");
            }
            AppEvent::Started => {
                info!("START | service up");
            }
        }
    }
}

fn describe_net(state: LinkState) -> String {
    match state {
        LinkState::Init => "loading".into(),
        LinkState::Joining { attempts } => format!("connecting (since {attempts}s)"),
        LinkState::Joined => "connected".into(),
        LinkState::Serving => "serving".into(),
        LinkState::Failed => "failed".into(),
    }
}
