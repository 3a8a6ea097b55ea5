//! Indicator output (the board LED)

use crate::config::Blink;
use std::time::Duration;

/// Trait for a single on/off indicator
///
/// MCU-specific crates implement this over a GPIO pin.
pub trait Indicator {
    fn set(&mut self, on: bool);

    /// Hold the current level for `duration`
    fn delay(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }

    /// Play a blink pattern, leaving the output off
    fn blink(&mut self, pattern: &Blink) {
        for _ in 0..pattern.count {
            self.set(true);
            self.delay(pattern.on);
            self.set(false);
            if !pattern.off.is_zero() {
                self.delay(pattern.off);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Step {
        Set(bool),
        Delay(Duration),
    }

    /// Records levels and delays instead of sleeping
    #[derive(Debug, Default)]
    pub struct RecordingIndicator {
        pub steps: Vec<Step>,
    }

    impl RecordingIndicator {
        /// Number of rising edges seen
        pub fn pulses(&self) -> usize {
            self.steps.iter().filter(|s| **s == Step::Set(true)).count()
        }
    }

    impl Indicator for RecordingIndicator {
        fn set(&mut self, on: bool) {
            self.steps.push(Step::Set(on));
        }

        fn delay(&mut self, duration: Duration) {
            self.steps.push(Step::Delay(duration));
        }
    }

    #[test]
    fn pulse_has_no_trailing_delay() {
        let mut led = RecordingIndicator::default();
        led.blink(&Blink::pulse(Duration::from_millis(100)));
        assert_eq!(
            led.steps,
            vec![
                Step::Set(true),
                Step::Delay(Duration::from_millis(100)),
                Step::Set(false),
            ]
        );
    }

    #[test]
    fn pattern_repeats_and_ends_off() {
        let mut led = RecordingIndicator::default();
        let ms = Duration::from_millis(100);
        led.blink(&Blink::new(3, ms, ms));
        assert_eq!(led.pulses(), 3);
        assert_eq!(led.steps.len(), 12);
        assert_eq!(led.steps[10], Step::Set(false));
    }
}
