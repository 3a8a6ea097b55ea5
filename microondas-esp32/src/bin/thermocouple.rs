//! Thermocouple reader for ESP32
//!
//! Reads a type K thermocouple through a MAX6675 once a second and logs the
//! temperature in °C.

use esp_idf_svc::hal::{gpio::PinDriver, prelude::Peripherals};
use microondas_esp32::max6675::PinBus;
use microondas_mcu::{Max6675, TemperatureMonitor};

fn main() -> anyhow::Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    let bus = PinBus::new(
        PinDriver::output(pins.gpio5)?,
        PinDriver::output(pins.gpio18)?,
        PinDriver::input(pins.gpio19)?,
    )?;

    TemperatureMonitor::new(Max6675::new(bus)).run()
}
