//! Heater SSR driver.
//!
//! Binary on/off output driving the solid-state relay on
//! [`pins::HEATER_GPIO`](crate::pins::HEATER_GPIO). Time-proportioning
//! happens in the control loop; this driver is a dumb actuator.
//!
//! Generic over [`embedded_hal::digital::OutputPin`] so the same code
//! drives an `esp-idf-hal` `PinDriver` on target and a test pin on the
//! host.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::HeaterPort;

pub struct HeaterDriver<P: OutputPin> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> HeaterDriver<P> {
    /// Wrap an output pin. The heater starts off — never trust the
    /// pin's power-on level.
    pub fn new(mut pin: P) -> Self {
        if pin.set_low().is_err() {
            warn!("heater: failed to drive pin low at init");
        }
        Self { pin, on: false }
    }

    /// Commanded level (mirror of the last write).
    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl<P: OutputPin> HeaterPort for HeaterDriver<P> {
    fn set(&mut self, on: bool) {
        let result = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if result.is_err() {
            warn!("heater: GPIO write failed");
            return;
        }
        self.on = on;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    /// Host-side pin double recording every level written.
    #[derive(Default)]
    struct TestPin {
        high: bool,
        writes: u32,
    }

    impl embedded_hal::digital::ErrorType for TestPin {
        type Error = Infallible;
    }

    impl OutputPin for TestPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            self.writes += 1;
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn starts_off_regardless_of_pin_state() {
        let pin = TestPin {
            high: true,
            writes: 0,
        };
        let heater = HeaterDriver::new(pin);
        assert!(!heater.is_on());
        assert!(!heater.pin.high);
    }

    #[test]
    fn set_drives_the_pin() {
        let mut heater = HeaterDriver::new(TestPin::default());
        heater.set(true);
        assert!(heater.is_on());
        assert!(heater.pin.high);
        heater.set(false);
        assert!(!heater.is_on());
        assert!(!heater.pin.high);
    }
}
