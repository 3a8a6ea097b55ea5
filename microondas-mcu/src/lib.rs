//! Smart Microondas MCU Library
//!
//! The BLE command service and the traits device firmware implements.
//!
//! This crate provides:
//! - Session tracking for the single connected peer
//! - The `PING` / echo command dispatcher
//! - A transport adapter driven by connect, disconnect and write events
//! - An event queue so stack callbacks never run commands themselves
//! - MAX6675 thermocouple decoding and a temperature monitor
//!
//! Nothing here touches hardware. Firmware supplies a [`Notifier`] for the
//! BLE stack, an [`Indicator`] for the LED and an [`SpiBits`] bus for the
//! thermocouple.

pub mod config;
pub mod dispatch;
pub mod event;
pub mod indicator;
pub mod session;
pub mod thermocouple;
pub mod transport;

pub use config::{Blink, Config};
pub use dispatch::Dispatcher;
pub use event::{Event, EventReceiver, EventSender, event_queue};
pub use indicator::Indicator;
pub use session::{PeerId, Session};
pub use thermocouple::{
    Max6675, Reading, SpiBits, TemperatureMonitor, Thermocouple, ThermocoupleError,
    decode_max6675,
};
pub use transport::{Notifier, SendError, TransportAdapter};

pub use microondas_proto::{ParseError, RawMessage, Request, Response};
