//! Audible result signaling
//!
//! [`AlertScheduler`] decides when a pattern is due; [`Buzzer`] plays it on the
//! transducer pin. Playing a pattern occupies the whole tick: the rig never
//! samples while a pulse is sounding.

use crate::config::AlertConfig;
use crate::experiment::ExperimentState;
use embassy_time::{Duration, Instant};
use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;

/// One step of a pattern: drive the transducer and hold for `duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    pub on: bool,
    pub duration: Duration,
}

impl Pulse {
    pub const fn on(ms: u64) -> Self {
        Self {
            on: true,
            duration: Duration::from_millis(ms),
        }
    }

    pub const fn off(ms: u64) -> Self {
        Self {
            on: false,
            duration: Duration::from_millis(ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPattern {
    pub steps: &'static [Pulse],
}

/// Two short beeps.
pub const PASS_PATTERN: AlertPattern = AlertPattern {
    steps: &[Pulse::on(100), Pulse::off(100), Pulse::on(100), Pulse::off(0)],
};

/// One long beep.
pub const FAIL_PATTERN: AlertPattern = AlertPattern {
    steps: &[Pulse::on(300), Pulse::off(0)],
};

pub struct AlertScheduler {
    config: AlertConfig,
    next_beep_at: Instant,
}

impl AlertScheduler {
    pub const fn new(config: AlertConfig) -> Self {
        Self {
            config,
            next_beep_at: Instant::from_ticks(0),
        }
    }

    /// Pattern to play this tick, if one is due.
    ///
    /// Outside Success/Fail the timer resets, so the first tick of a terminal
    /// state always sounds.
    pub fn tick(&mut self, state: ExperimentState, now: Instant) -> Option<AlertPattern> {
        if !state.is_terminal() {
            self.next_beep_at = Instant::from_ticks(0);
            return None;
        }
        let pattern = if state == ExperimentState::Success {
            PASS_PATTERN
        } else {
            FAIL_PATTERN
        };

        if now < self.next_beep_at {
            return None;
        }
        self.next_beep_at = now + self.config.cooldown;
        Some(pattern)
    }

    pub fn next_beep_at(&self) -> Instant {
        self.next_beep_at
    }
}

impl Default for AlertScheduler {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}

/// On/off transducer driven from one output pin.
pub struct Buzzer<P, D> {
    pin: P,
    delay: D,
}

impl<P: OutputPin, D: DelayNs> Buzzer<P, D> {
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    pub fn silence(&mut self) -> Result<(), P::Error> {
        self.pin.set_low()
    }

    /// Play every step of `pattern` in order, waiting out each pulse width.
    ///
    /// If a step cannot be driven the pattern is abandoned and the pin is
    /// pulled low once more, so a failed pattern never leaves the transducer on.
    pub async fn play(&mut self, pattern: &AlertPattern) -> Result<(), P::Error> {
        let result = self.play_steps(pattern).await;
        if result.is_err() {
            let _ = self.pin.set_low();
        }
        result
    }

    async fn play_steps(&mut self, pattern: &AlertPattern) -> Result<(), P::Error> {
        for step in pattern.steps {
            if step.on {
                self.pin.set_high()?;
            } else {
                self.pin.set_low()?;
            }
            let ms = u32::try_from(step.duration.as_millis()).unwrap_or(u32::MAX);
            if ms > 0 {
                self.delay.delay_ms(ms).await;
            }
        }
        Ok(())
    }
}
