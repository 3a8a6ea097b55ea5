//! ESP32 drivers for the Smart Microondas service
//!
//! NimBLE GATT server, GPIO2 LED and a bit-banged MAX6675, each implementing
//! the matching `microondas_mcu` trait.

pub mod ble;
pub mod led;
pub mod max6675;
