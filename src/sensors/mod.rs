//! Sensor subsystem.
//!
//! One probe on this board: the boiler temperature sensor. Validity
//! policy lives at this boundary — everything above it only ever sees
//! `Option<f32>`.

pub mod temperature;

pub use temperature::TemperatureSensor;
