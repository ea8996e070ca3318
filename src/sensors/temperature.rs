//! TSic boiler temperature probe.
//!
//! The probe pushes one frame every ~100 ms on its single-wire bus.
//! The decode path (edge ISR on the probe GPIO) publishes the latest
//! frame into a lock-free cell; reading the sensor is a plain atomic
//! load, so the control tick never blocks on the bus.
//!
//! ## Dual-target design
//!
//! On ESP-IDF the cell is fed from the ZACwire edge ISR installed at
//! boot. On host/test it is fed through [`sim_set_celsius`] /
//! [`sim_set_fault`] for injection.
//!
//! ## Validity policy
//!
//! Raw values outside [0, 150] °C and missed/corrupt frames map to
//! `None` at this boundary — the plausible range for a boiler probe;
//! anything else is a wiring or decode artifact that must never reach
//! the PID.

use core::sync::atomic::{AtomicI32, Ordering};

use log::debug;

use crate::app::ports::TemperaturePort;
use crate::error::SensorError;

/// Latest decoded frame in milli-degrees C; [`FRAME_FAULT`] marks a
/// missed or corrupt frame.
static LATEST_MILLI_C: AtomicI32 = AtomicI32::new(FRAME_FAULT);

const FRAME_FAULT: i32 = i32::MIN;

/// Lowest plausible probe reading (°C).
const PLAUSIBLE_MIN_C: f32 = 0.0;
/// Highest plausible probe reading (°C).
const PLAUSIBLE_MAX_C: f32 = 150.0;

/// Publish a decoded frame. Lock-free — safe to call from the decode
/// ISR.
pub fn publish_milli_c(milli_c: i32) {
    LATEST_MILLI_C.store(milli_c, Ordering::Release);
}

/// Mark the current frame as missed/corrupt (decode timeout, parity
/// failure). Lock-free — safe to call from the decode ISR.
pub fn publish_fault() {
    LATEST_MILLI_C.store(FRAME_FAULT, Ordering::Release);
}

/// Test/simulation injection: set the probe reading in °C.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_celsius(celsius: f32) {
    publish_milli_c((celsius * 1000.0) as i32);
}

/// Test/simulation injection: fault the probe.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_fault() {
    publish_fault();
}

/// The boiler temperature probe.
pub struct TemperatureSensor {
    _probe_gpio: i32,
}

impl TemperatureSensor {
    pub fn new(probe_gpio: i32) -> Self {
        Self {
            _probe_gpio: probe_gpio,
        }
    }

    fn read_raw(&self) -> Result<f32, SensorError> {
        let milli = LATEST_MILLI_C.load(Ordering::Acquire);
        if milli == FRAME_FAULT {
            return Err(SensorError::HardwareFault);
        }
        let celsius = milli as f32 / 1000.0;
        if !(PLAUSIBLE_MIN_C..=PLAUSIBLE_MAX_C).contains(&celsius) {
            return Err(SensorError::OutOfRange);
        }
        Ok(celsius)
    }
}

impl TemperaturePort for TemperatureSensor {
    fn read(&mut self) -> Option<f32> {
        match self.read_raw() {
            Ok(celsius) => Some(celsius),
            Err(e) => {
                debug!("probe: invalid reading ({e})");
                None
            }
        }
    }
}
