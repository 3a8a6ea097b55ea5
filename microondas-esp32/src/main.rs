//! Smart Microondas BLE firmware for ESP32
//!
//! Advertises a GATT command service. A client writes text to the RX
//! characteristic and gets replies as TX notifications: `PING` is answered
//! with `PONG` and an LED pulse, any other text `T` with `OK:T`.
//!
//! Talk to it with the microondas-ble CLI.

use esp_idf_svc::{
    hal::{gpio::PinDriver, prelude::Peripherals},
    nvs::EspDefaultNvsPartition,
};
use log::*;
use microondas_esp32::{ble, led::Led};
use microondas_mcu::{event_queue, Config, TransportAdapter};

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("Starting Smart Microondas BLE...");

    let peripherals = Peripherals::take()?;
    // The BLE host keeps its state in NVS
    let _nvs = EspDefaultNvsPartition::take()?;

    // LED on GPIO2 (the built-in LED on most ESP32 dev boards)
    let led = Led::new(PinDriver::output(peripherals.pins.gpio2)?);
    info!("LED initialized on GPIO2");

    let config = Config::default();
    let (events, queue) = event_queue();
    let notifier = ble::start_ble_server(&config.device_name, events)?;

    info!("BLE initialized!");
    info!("Device name: {}", config.device_name);
    info!("Waiting for connection...");

    // Commands run here, one at a time, never inside a stack callback
    let mut adapter = TransportAdapter::new(config, notifier, led);
    adapter.run(queue);

    warn!("BLE event queue closed");
    Ok(())
}
