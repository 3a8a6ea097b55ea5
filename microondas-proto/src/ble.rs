//! BLE GATT Service Protocol Constants for the Smart Microondas command service
//!
//! One service with two characteristics: the client writes text commands to
//! the RX characteristic and the device answers with notifications on TX.

/// Advertised device name
pub const DEVICE_NAME: &str = "Smart_Microondas_ESP32";

/// 16-bit service UUID
pub const SERVICE_UUID16: u16 = 0x00FF;

/// 16-bit RX characteristic UUID (write, peer -> device)
pub const RX_UUID16: u16 = 0xFF01;

/// 16-bit TX characteristic UUID (read/notify, device -> peer)
pub const TX_UUID16: u16 = 0xFF02;

/// BLE Service UUID: 0x00FF on the Bluetooth base UUID
pub const SERVICE_UUID: &str = "000000ff-0000-1000-8000-00805f9b34fb";

/// RX Characteristic UUID (write)
pub const RX_UUID: &str = "0000ff01-0000-1000-8000-00805f9b34fb";

/// TX Characteristic UUID (read/notify)
pub const TX_UUID: &str = "0000ff02-0000-1000-8000-00805f9b34fb";

/// Largest payload carried by a single write or notification
pub const MAX_FRAME_LEN: usize = 500;

/// ATT MTU the device asks for, enough to carry a full frame
pub const LOCAL_MTU: u16 = 517;

/// Text commands and fixed replies
pub mod commands {
    /// Liveness check, answered with [`PONG`] and an LED pulse
    pub const PING: &str = "PING";

    pub const PONG: &str = "PONG";

    /// Sent once to every newly connected peer
    pub const CONNECTED: &str = "CONNECTED";

    /// Prefix for the echo reply to any other text
    pub const OK_PREFIX: &str = "OK:";
}
