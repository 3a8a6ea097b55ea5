//! Type K thermocouple readings through a MAX6675 converter
//!
//! The MAX6675 shifts out one 16-bit word per conversion, MSB first:
//!
//! ```text
//! bit 15     dummy (0)
//! bits 14-3  temperature, 0.25 °C per count
//! bit 2      thermocouple input open
//! bit 1      device id
//! bit 0      tri-state
//! ```

use log::*;
use std::time::Duration;

/// Startup wait before the first conversion is valid
pub const SETTLE: Duration = Duration::from_millis(500);

/// Time between readings
pub const READ_INTERVAL: Duration = Duration::from_millis(1000);

const OPEN_INPUT: u16 = 0x0004;

#[derive(Debug, thiserror::Error)]
pub enum ThermocoupleError<E: std::fmt::Debug> {
    #[error("thermocouple input is open")]
    OpenCircuit,
    #[error("bus error: {0:?}")]
    Bus(E),
}

/// Decode a conversion word to °C, `None` if the probe is disconnected
pub fn decode_max6675(raw: u16) -> Option<f32> {
    if raw & OPEN_INPUT != 0 {
        return None;
    }
    Some(f32::from(raw >> 3) * 0.25)
}

/// Anything that yields raw MAX6675 conversion words
pub trait Thermocouple {
    type Error: std::fmt::Debug;

    fn read_raw(&mut self) -> Result<u16, Self::Error>;

    fn read_celsius(&mut self) -> Reading<Self::Error> {
        let raw = self.read_raw().map_err(ThermocoupleError::Bus)?;
        decode_max6675(raw).ok_or(ThermocoupleError::OpenCircuit)
    }
}

pub type Reading<E> = Result<f32, ThermocoupleError<E>>;

/// Three-wire read-only SPI, driven one bit at a time
///
/// MCU-specific crates implement this over GPIO pins (CS, SCK, SO).
pub trait SpiBits {
    type Error: std::fmt::Debug;

    /// Drive chip select; `true` selects the device (CS low)
    fn select(&mut self, active: bool) -> Result<(), Self::Error>;

    fn clock(&mut self, high: bool) -> Result<(), Self::Error>;

    /// Sample the data line
    fn sample(&mut self) -> Result<bool, Self::Error>;

    /// Half clock period
    fn half_period(&mut self) {
        std::thread::sleep(Duration::from_micros(10));
    }
}

/// MAX6675 over a bit-banged bus
pub struct Max6675<B> {
    bus: B,
}

impl<B: SpiBits> Max6675<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn into_inner(self) -> B {
        self.bus
    }

    fn shift_in(&mut self) -> Result<u16, B::Error> {
        let mut word = 0u16;
        for _ in 0..16 {
            self.bus.clock(false)?;
            self.bus.half_period();
            word <<= 1;
            if self.bus.sample()? {
                word |= 1;
            }
            self.bus.clock(true)?;
            self.bus.half_period();
        }
        Ok(word)
    }
}

impl<B: SpiBits> Thermocouple for Max6675<B> {
    type Error = B::Error;

    fn read_raw(&mut self) -> Result<u16, Self::Error> {
        self.bus.select(true)?;
        self.bus.half_period();
        let word = self.shift_in();
        // release CS even if the transfer failed, it starts the next conversion
        let released = self.bus.select(false);
        let word = word?;
        released?;
        Ok(word)
    }
}

/// Periodic temperature logger
pub struct TemperatureMonitor<T> {
    sensor: T,
    interval: Duration,
}

impl<T: Thermocouple> TemperatureMonitor<T> {
    pub fn new(sensor: T) -> Self {
        Self {
            sensor,
            interval: READ_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Read once and log the result
    pub fn poll(&mut self) -> Reading<T::Error> {
        let reading = self.sensor.read_celsius();
        match &reading {
            Ok(celsius) => info!("Temperature: {:.2} °C", celsius),
            Err(e) => warn!("Failed to read temperature: {}", e),
        }
        reading
    }

    /// Log the banner, wait for the converter, then read forever
    pub fn run(&mut self) -> ! {
        info!("Temperature measurement system");
        info!("Type K thermocouple + MAX6675");
        std::thread::sleep(SETTLE);

        loop {
            let _ = self.poll();
            std::thread::sleep(self.interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[test]
    fn decodes_quarter_degrees() {
        assert_eq!(decode_max6675(0), Some(0.0));
        // 100 counts = 25.00 °C
        assert_eq!(decode_max6675(100 << 3), Some(25.0));
        assert_eq!(decode_max6675((101 << 3) | 0b010), Some(25.25));
        // full scale
        assert_eq!(decode_max6675(0x7ff8), Some(1023.75));
    }

    #[test]
    fn open_input_has_no_temperature() {
        assert_eq!(decode_max6675(0x0004), None);
        assert_eq!(decode_max6675((100 << 3) | 0x0004), None);
    }

    /// Serves a fixed word on the data line, MSB first
    #[derive(Default)]
    struct FakeBus {
        bits: VecDeque<bool>,
        selected: bool,
        selects: usize,
        fail_after: Option<usize>,
    }

    impl FakeBus {
        fn serving(word: u16) -> Self {
            Self {
                bits: (0..16).rev().map(|i| word & (1 << i) != 0).collect(),
                ..Default::default()
            }
        }
    }

    impl SpiBits for FakeBus {
        type Error = &'static str;

        fn select(&mut self, active: bool) -> Result<(), Self::Error> {
            self.selected = active;
            self.selects += 1;
            Ok(())
        }

        fn clock(&mut self, _high: bool) -> Result<(), Self::Error> {
            Ok(())
        }

        fn sample(&mut self) -> Result<bool, Self::Error> {
            if self.fail_after == Some(self.bits.len()) {
                return Err("bus fault");
            }
            self.bits.pop_front().ok_or("no more bits")
        }

        fn half_period(&mut self) {}
    }

    #[test]
    fn shifts_in_msb_first() {
        let mut sensor = Max6675::new(FakeBus::serving(0x0328));
        assert_eq!(sensor.read_raw(), Ok(0x0328));
        assert!(!sensor.into_inner().selected);

        let mut sensor = Max6675::new(FakeBus::serving(0x0328));
        assert_eq!(sensor.read_celsius().unwrap(), 25.25);
    }

    #[test]
    fn releases_chip_select_on_bus_error() {
        let mut bus = FakeBus::serving(0x0328);
        bus.fail_after = Some(8);
        let mut sensor = Max6675::new(bus);
        assert!(matches!(
            sensor.read_celsius(),
            Err(ThermocoupleError::Bus("bus fault"))
        ));
        let bus = sensor.into_inner();
        assert!(!bus.selected);
        assert_eq!(bus.selects, 2);
    }

    struct Scripted(VecDeque<Result<u16, &'static str>>);

    impl Thermocouple for Scripted {
        type Error = &'static str;

        fn read_raw(&mut self) -> Result<u16, Self::Error> {
            self.0.pop_front().unwrap_or(Err("exhausted"))
        }
    }

    #[test]
    fn monitor_keeps_going_after_failures() {
        let script = VecDeque::from([Ok(0x0004), Err("spi"), Ok(200 << 3)]);
        let mut monitor = TemperatureMonitor::new(Scripted(script));
        assert_eq!(monitor.interval(), Duration::from_secs(1));

        assert!(matches!(monitor.poll(), Err(ThermocoupleError::OpenCircuit)));
        assert!(matches!(monitor.poll(), Err(ThermocoupleError::Bus("spi"))));
        assert_eq!(monitor.poll().unwrap(), 50.0);
    }
}
