//! Service configuration
//!
//! `Config::default()` reproduces the stock firmware: 500 byte frames, a
//! 100 ms pulse on `PING`, three blinks and a `CONNECTED` greeting on connect.

use microondas_proto::{MAX_FRAME_LEN, ble::DEVICE_NAME, commands};
use std::time::Duration;

/// A repeated on/off pattern on the indicator output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blink {
    pub count: u32,
    pub on: Duration,
    /// Time spent off after each pulse; zero skips the wait
    pub off: Duration,
}

impl Blink {
    pub const fn new(count: u32, on: Duration, off: Duration) -> Self {
        Self { count, on, off }
    }

    /// A single pulse with no trailing wait
    pub const fn pulse(on: Duration) -> Self {
        Self::new(1, on, Duration::ZERO)
    }

    /// Wall time the pattern takes to play
    pub fn duration(&self) -> Duration {
        (self.on + self.off) * self.count
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub device_name: String,
    pub max_frame_len: usize,
    pub ping_pulse: Blink,
    pub connect_pattern: Blink,
    /// Wait between the connect pattern and the greeting
    pub connect_settle: Duration,
    /// Notification sent to each new peer, if any
    pub greeting: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_name: DEVICE_NAME.to_string(),
            max_frame_len: MAX_FRAME_LEN,
            ping_pulse: Blink::pulse(Duration::from_millis(100)),
            connect_pattern: Blink::new(3, Duration::from_millis(100), Duration::from_millis(100)),
            connect_settle: Duration::from_millis(500),
            greeting: Some(commands::CONNECTED.to_string()),
        }
    }
}

impl Config {
    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    pub fn with_ping_pulse(mut self, pulse: Blink) -> Self {
        self.ping_pulse = pulse;
        self
    }

    pub fn with_connect_pattern(mut self, pattern: Blink, settle: Duration) -> Self {
        self.connect_pattern = pattern;
        self.connect_settle = settle;
        self
    }

    pub fn with_greeting(mut self, greeting: Option<String>) -> Self {
        self.greeting = greeting;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_firmware() {
        let config = Config::default();
        assert_eq!(config.device_name, "Smart_Microondas_ESP32");
        assert_eq!(config.max_frame_len, 500);
        assert_eq!(config.ping_pulse.duration(), Duration::from_millis(100));
        assert_eq!(config.connect_pattern.duration(), Duration::from_millis(600));
        assert_eq!(config.greeting.as_deref(), Some("CONNECTED"));
    }

    #[test]
    fn builders_override_fields() {
        let config = Config::default()
            .with_max_frame_len(20)
            .with_greeting(None)
            .with_connect_pattern(Blink::pulse(Duration::ZERO), Duration::ZERO);
        assert_eq!(config.max_frame_len, 20);
        assert!(config.greeting.is_none());
        assert_eq!(config.connect_settle, Duration::ZERO);
    }
}
