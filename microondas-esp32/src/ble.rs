//! BLE command service on the NimBLE stack
//!
//! Runs a GATT server with one write characteristic (RX) for text commands
//! and one notify characteristic (TX) for replies. Stack callbacks only push
//! events into the queue; the command worker owns the [`NimbleNotifier`].
//!
//! Uses UUIDs from microondas_proto::ble.

use esp32_nimble::utilities::mutex::Mutex;
use esp32_nimble::utilities::BleUuid;
use esp32_nimble::{
    BLEAdvertisementData, BLEAdvertising, BLECharacteristic, BLEDevice, BLEError, NimbleProperties,
};
use log::*;
use microondas_mcu::{EventSender, Notifier, PeerId};
use microondas_proto::ble::{LOCAL_MTU, RX_UUID16, SERVICE_UUID16, TX_UUID16};
use std::sync::Arc;

const SERVICE_UUID: BleUuid = BleUuid::from_uuid16(SERVICE_UUID16);
const RX_UUID: BleUuid = BleUuid::from_uuid16(RX_UUID16);
const TX_UUID: BleUuid = BleUuid::from_uuid16(TX_UUID16);

/// Notify side of the GATT server, handed to the command worker
pub struct NimbleNotifier {
    tx: Arc<Mutex<BLECharacteristic>>,
    advertising: &'static Mutex<BLEAdvertising>,
}

impl Notifier for NimbleNotifier {
    type Error = BLEError;

    fn notify(&mut self, peer: PeerId, data: &[u8]) -> Result<(), Self::Error> {
        debug!("notify conn {}: {} bytes", peer, data.len());
        self.tx.lock().set_value(data).notify();
        Ok(())
    }

    fn start_advertising(&mut self) -> Result<(), Self::Error> {
        self.advertising.lock().start()
    }
}

/// Start the BLE GATT server and begin advertising
///
/// Connect, disconnect and RX writes are forwarded to `events`.
pub fn start_ble_server(device_name: &str, events: EventSender) -> anyhow::Result<NimbleNotifier> {
    let ble_device = BLEDevice::take();

    // Set the device name (this is what shows up in BLE scans)
    BLEDevice::set_device_name(device_name).map_err(ble_error)?;
    ble_device.set_preferred_mtu(LOCAL_MTU).map_err(ble_error)?;

    let server = ble_device.get_server();
    // the worker restarts advertising once it has cleared the session
    server.advertise_on_disconnect(false);

    let connect_events = events.clone();
    server.on_connect(move |server, desc| {
        info!("BLE client connected");
        // Update connection parameters for better performance
        let _ = server.update_conn_params(desc.conn_handle(), 24, 48, 0, 60);
        connect_events.connected(desc.conn_handle());
    });

    let disconnect_events = events.clone();
    server.on_disconnect(move |_desc, reason| {
        info!("BLE client disconnected ({:?})", reason);
        disconnect_events.disconnected();
    });

    let service = server.create_service(SERVICE_UUID);

    // RX characteristic (write): commands from the client
    let rx_char = service
        .lock()
        .create_characteristic(RX_UUID, NimbleProperties::READ | NimbleProperties::WRITE);
    rx_char.lock().on_write(move |args| {
        events.write(args.recv_data());
    });

    // TX characteristic (read/notify): replies to the client
    let tx_char = service
        .lock()
        .create_characteristic(TX_UUID, NimbleProperties::READ | NimbleProperties::NOTIFY);

    // Start advertising
    let advertising = ble_device.get_advertising();
    advertising.lock().set_data(
        BLEAdvertisementData::new()
            .name(device_name)
            .add_service_uuid(SERVICE_UUID),
    ).map_err(ble_error)?;

    advertising.lock().start().map_err(ble_error)?;
    info!("Advertising started as '{}'", device_name);

    Ok(NimbleNotifier {
        tx: tx_char,
        advertising,
    })
}

fn ble_error(e: BLEError) -> anyhow::Error {
    anyhow::anyhow!("BLE error: {:?}", e)
}
