//! BLE Client for Smart Microondas devices
//!
//! Provides functions to scan for devices, and a [`Link`] that writes text
//! commands to the RX characteristic and reads replies from TX notifications.

use btleplug::api::bleuuid::uuid_from_u16;
use btleplug::api::{
    Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, ValueNotification,
    WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use microondas_proto::ble::{DEVICE_NAME, RX_UUID16, SERVICE_UUID16, TX_UUID16};
use microondas_proto::{MAX_FRAME_LEN, commands};

const SERVICE_UUID: Uuid = uuid_from_u16(SERVICE_UUID16);
const RX_UUID: Uuid = uuid_from_u16(RX_UUID16);
const TX_UUID: Uuid = uuid_from_u16(TX_UUID16);

/// How long to wait for a reply notification
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// How long `find_device` scans before giving up
const FIND_SCAN: Duration = Duration::from_secs(5);

type Notifications = Pin<Box<dyn Stream<Item = ValueNotification> + Send>>;

/// A discovered BLE device
#[derive(Debug, Clone)]
pub struct MicroondasDevice {
    pub name: String,
    pub address: String,
    pub rssi: Option<i16>,
    pub is_microondas: bool,
}

/// Match "Smart_Microondas_xxx" or "nimble [Smart_Microondas_xxx]" format
pub fn is_microondas_name(name: &str) -> bool {
    let prefix = device_prefix();
    name.starts_with(prefix) || name.contains(&format!("[{}", prefix))
}

/// "Smart_Microondas" out of "Smart_Microondas_ESP32"
fn device_prefix() -> &'static str {
    DEVICE_NAME
        .rsplit_once('_')
        .map(|(prefix, _)| prefix)
        .unwrap_or(DEVICE_NAME)
}

/// Get the default Bluetooth adapter
pub async fn get_adapter() -> Result<Adapter, Box<dyn std::error::Error>> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    adapters.into_iter().next().ok_or_else(|| "No Bluetooth adapter found".into())
}

/// Scan for BLE devices
///
/// Returns every discovered device; ours have `is_microondas = true`.
pub async fn scan(duration_secs: u64) -> Result<Vec<MicroondasDevice>, Box<dyn std::error::Error>> {
    let adapter = get_adapter().await?;

    adapter.start_scan(ScanFilter::default()).await?;
    tokio::time::sleep(Duration::from_secs(duration_secs)).await;

    let peripherals = adapter.peripherals().await?;
    let mut devices = Vec::new();

    for peripheral in peripherals {
        if let Some(props) = peripheral.properties().await? {
            let name = props.local_name.unwrap_or_else(|| "Unknown".to_string());
            let address = peripheral.address().to_string();
            let is_microondas =
                is_microondas_name(&name) || props.services.contains(&SERVICE_UUID);

            devices.push(MicroondasDevice {
                name,
                address,
                rssi: props.rssi,
                is_microondas,
            });
        }
    }

    adapter.stop_scan().await?;
    Ok(devices)
}

/// Find a device by name/address pattern, or find any Smart Microondas device
pub async fn find_device(target: Option<&str>) -> Result<Peripheral, Box<dyn std::error::Error>> {
    let adapter = get_adapter().await?;

    adapter.start_scan(ScanFilter::default()).await?;
    tokio::time::sleep(FIND_SCAN).await;

    let peripherals = adapter.peripherals().await?;

    for peripheral in peripherals {
        if let Some(props) = peripheral.properties().await? {
            let name = props.local_name.unwrap_or_default();
            let addr = peripheral.address().to_string();

            let matches = match target {
                Some(t) => name.contains(t) || addr.contains(t),
                None => is_microondas_name(&name),
            };

            if matches {
                adapter.stop_scan().await?;
                return Ok(peripheral);
            }
        }
    }

    adapter.stop_scan().await?;
    Err("No Smart Microondas device found".into())
}

/// An open connection with TX notifications enabled
pub struct Link {
    device: Peripheral,
    rx: Characteristic,
    notifications: Notifications,
}

impl Link {
    /// Connect, discover the command service and subscribe to replies
    ///
    /// # Arguments
    /// * `target` - Device name/address pattern, or None to find any device
    pub async fn connect(target: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let device = find_device(target).await?;

        device.connect().await?;
        device.discover_services().await?;

        let characteristics = device.characteristics();

        let rx = characteristics
            .iter()
            .find(|c| c.uuid == RX_UUID)
            .cloned()
            .ok_or("RX characteristic not found")?;

        let tx = characteristics
            .iter()
            .find(|c| c.uuid == TX_UUID)
            .cloned()
            .ok_or("TX characteristic not found")?;

        let notifications = device.notifications().await?;
        device.subscribe(&tx).await?;

        Ok(Self {
            device,
            rx,
            notifications,
        })
    }

    /// Name and address of the connected device
    pub async fn describe(&self) -> Result<String, Box<dyn std::error::Error>> {
        let name = self
            .device
            .properties()
            .await?
            .and_then(|p| p.local_name)
            .unwrap_or_else(|| "Unknown".to_string());
        Ok(format!("{} ({})", name, self.device.address()))
    }

    /// Wait for the next TX notification, as text
    pub async fn next_notification(
        &mut self,
        timeout: Duration,
    ) -> Result<String, Box<dyn std::error::Error>> {
        let deadline = Instant::now() + timeout;
        loop {
            let notification = tokio::time::timeout_at(deadline, self.notifications.next())
                .await
                .map_err(|_| "Timed out waiting for a notification")?
                .ok_or("Notification stream closed")?;

            if notification.uuid == TX_UUID {
                return Ok(String::from_utf8_lossy(&notification.value).into_owned());
            }
        }
    }

    /// Send one text command and return the device's reply
    pub async fn send(&mut self, text: &str) -> Result<String, Box<dyn std::error::Error>> {
        check_command(text)?;

        self.device
            .write(&self.rx, text.as_bytes(), WriteType::WithResponse)
            .await?;

        let deadline = Instant::now() + REPLY_TIMEOUT;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let reply = self.next_notification(remaining).await?;
            // the connect greeting can still be in flight; no command is answered with it
            if reply != commands::CONNECTED {
                return Ok(reply);
            }
        }
    }

    /// Send `PING`, expect `PONG`
    pub async fn ping(&mut self) -> Result<Duration, Box<dyn std::error::Error>> {
        let started = Instant::now();
        let reply = self.send(commands::PING).await?;
        if reply != commands::PONG {
            return Err(format!("Unexpected reply to PING: {:?}", reply).into());
        }
        Ok(started.elapsed())
    }

    pub async fn disconnect(self) -> Result<(), Box<dyn std::error::Error>> {
        self.device.disconnect().await?;
        Ok(())
    }
}

/// Commands the device would drop without replying
fn check_command(text: &str) -> Result<(), String> {
    if text.is_empty() {
        return Err("Command is empty".to_string());
    }
    if text.len() > MAX_FRAME_LEN {
        return Err(format!(
            "Command is {} bytes, the device accepts at most {}",
            text.len(),
            MAX_FRAME_LEN
        ));
    }
    Ok(())
}
