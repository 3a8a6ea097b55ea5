//! MAX6675 wiring: SO on GPIO19, CS on GPIO5, SCK on GPIO18

use esp_idf_svc::hal::delay::Ets;
use esp_idf_svc::hal::gpio::{Gpio18, Gpio19, Gpio5, Input, Output, PinDriver};
use esp_idf_svc::sys::EspError;
use microondas_mcu::SpiBits;

pub struct PinBus {
    cs: PinDriver<'static, Gpio5, Output>,
    sck: PinDriver<'static, Gpio18, Output>,
    so: PinDriver<'static, Gpio19, Input>,
}

impl PinBus {
    /// Idle the bus: CS high (deselected), SCK low
    pub fn new(
        mut cs: PinDriver<'static, Gpio5, Output>,
        mut sck: PinDriver<'static, Gpio18, Output>,
        so: PinDriver<'static, Gpio19, Input>,
    ) -> Result<Self, EspError> {
        cs.set_high()?;
        sck.set_low()?;
        Ok(Self { cs, sck, so })
    }
}

impl SpiBits for PinBus {
    type Error = EspError;

    fn select(&mut self, active: bool) -> Result<(), Self::Error> {
        // CS is active low
        if active {
            self.cs.set_low()
        } else {
            self.cs.set_high()
        }
    }

    fn clock(&mut self, high: bool) -> Result<(), Self::Error> {
        if high {
            self.sck.set_high()
        } else {
            self.sck.set_low()
        }
    }

    fn sample(&mut self) -> Result<bool, Self::Error> {
        Ok(self.so.is_high())
    }

    fn half_period(&mut self) {
        Ets::delay_us(10);
    }
}
