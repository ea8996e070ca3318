//! BrewTherm firmware — main entry point.
//!
//! Composition root: loads persisted configuration, builds every
//! component, registers the periodic tasks, and drives the cooperative
//! run loop.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                   │
//! │                                                          │
//! │  TemperatureSensor  HeaterDriver  WifiAdapter            │
//! │  NvsAdapter         LogEventSink  Clock                  │
//! │                                                          │
//! │  ─────────────── Port Trait Boundary ───────────────     │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │            AppService (pure logic)                 │  │
//! │  │  HeaterControl · NetworkMonitor · HistoryLog       │  │
//! │  └────────────────────────────────────────────────────┘  │
//! │                                                          │
//! │  TaskTable (cooperative run loop, single thread)         │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! One execution context drives everything: each scheduled tick runs
//! to completion before the next is considered, so shared state needs
//! no locking.

use anyhow::{Context, Result, anyhow};
use log::{info, warn};

use brewtherm::adapters::log_sink::LogEventSink;
use brewtherm::adapters::nvs::NvsAdapter;
use brewtherm::adapters::time::Clock;
use brewtherm::adapters::wifi::WifiAdapter;
use brewtherm::app::ports::ConfigPort;
use brewtherm::app::service::AppService;
use brewtherm::config::SystemConfig;
use brewtherm::drivers::heater::HeaterDriver;
use brewtherm::pins;
use brewtherm::scheduler::{TaskId, TaskTable};
use brewtherm::sensors::TemperatureSensor;

struct TaskIds {
    control: TaskId,
    net: TaskId,
    history: TaskId,
    status: TaskId,
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("BrewTherm v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = NvsAdapter::new().map_err(|e| anyhow!("NVS init failed: {e}"))?;
    let config = match nvs.load() {
        Ok(cfg) => {
            info!("config loaded from NVS");
            cfg
        }
        Err(e) => {
            warn!("config load failed ({e}), using defaults");
            SystemConfig::default()
        }
    };

    // ── 3. Peripherals and adapters ───────────────────────────
    let peripherals =
        esp_idf_hal::peripherals::Peripherals::take().context("peripherals already taken")?;
    // pins::HEATER_GPIO — the SSR drive pin.
    let heater_pin = esp_idf_hal::gpio::PinDriver::output(peripherals.pins.gpio4)?;
    let mut heater = HeaterDriver::new(heater_pin);
    // The ZACwire decode ISR on pins::TEMP_PROBE_GPIO feeds the probe
    // cell; until its first frame arrives the probe reads as faulted
    // and the control loop holds the heater off.
    let mut probe = TemperatureSensor::new(pins::TEMP_PROBE_GPIO);
    let mut wifi = WifiAdapter::new();
    let mut sink = LogEventSink::new();
    let clock = Clock::new();

    // ── 4. Application service ────────────────────────────────
    let mut service = AppService::new(config, clock.now_ms());
    service.start(&mut sink);

    // ── 5. Task registration ──────────────────────────────────
    let now = clock.now_ms();
    let mut tasks = TaskTable::new();
    let cfg = service.config();
    let ids = TaskIds {
        control: tasks
            .add("control", cfg.control_step_ms, now)
            .ok_or_else(|| anyhow!("task table full"))?,
        net: tasks
            .add("net", cfg.net_check_interval_ms, now)
            .ok_or_else(|| anyhow!("task table full"))?,
        history: tasks
            .add("history", cfg.history_interval_ms, now)
            .ok_or_else(|| anyhow!("task table full"))?,
        status: tasks
            .add("status", cfg.status_interval_ms, now)
            .ok_or_else(|| anyhow!("task table full"))?,
    };

    // ── 6. Cooperative run loop ───────────────────────────────
    loop {
        let now = clock.now_ms();
        while let Some(id) = tasks.next_due(now) {
            if id == ids.control {
                service.tick_control(now, &mut probe, &mut heater);
            } else if id == ids.net {
                service.tick_net(&mut wifi, &mut sink);
            } else if id == ids.history {
                service.tick_history(now, &mut probe);
            } else if id == ids.status {
                service.tick_status(now, &mut sink);
            }
        }

        let idle = tasks.sleep_hint(clock.now_ms());
        if idle > 0 {
            esp_idf_hal::delay::FreeRtos::delay_ms(idle as u32);
        }
    }
}
