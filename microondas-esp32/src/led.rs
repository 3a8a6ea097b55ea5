//! Board LED on GPIO2 as the service indicator

use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::{Gpio2, Output, PinDriver};
use microondas_mcu::Indicator;
use std::time::Duration;

pub struct Led {
    pin: PinDriver<'static, Gpio2, Output>,
}

impl Led {
    /// Take ownership of the pin, starting off
    pub fn new(mut pin: PinDriver<'static, Gpio2, Output>) -> Self {
        let _ = pin.set_low();
        Self { pin }
    }
}

impl Indicator for Led {
    fn set(&mut self, on: bool) {
        let _ = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
    }

    fn delay(&mut self, duration: Duration) {
        FreeRtos::delay_ms(duration.as_millis() as u32);
    }
}
