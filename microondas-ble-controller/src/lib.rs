//! Smart Microondas BLE Controller
//!
//! BLE client for sending text commands to Smart Microondas devices.
//!
//! # Example
//!
//! ```ignore
//! use microondas_ble_controller::ble;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Scan for devices
//!     let devices = ble::scan(5).await?;
//!     for device in &devices {
//!         println!("{} ({})", device.name, device.address);
//!     }
//!
//!     // Talk to the first device found
//!     let mut link = ble::Link::connect(None).await?;
//!     link.ping().await?;
//!     assert_eq!(link.send("hello").await?, "OK:hello");
//!     link.disconnect().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod ble;
