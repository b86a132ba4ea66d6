//! Valve switch input
//!
//! The limit switch on the fill valve is wired active-low with a pull-up: a
//! low pin means the valve is open and the vessel is being pressurized. The
//! wiring already debounces the contact, so [`NoDebounce`] is the default;
//! [`StableFor`] can be dropped in where the hardware filtering is not enough.

use embassy_time::{Duration, Instant};
use embedded_hal::digital::InputPin;

/// Software debounce hook for the valve signal.
pub trait Debounce {
    /// Feed the raw "valve open" level seen at `now`, get the accepted level.
    fn update(&mut self, raw_open: bool, now: Instant) -> bool;
}

/// Pass the instantaneous pin level through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDebounce;

impl Debounce for NoDebounce {
    fn update(&mut self, raw_open: bool, _now: Instant) -> bool {
        raw_open
    }
}

/// Accept a new level only after it has been seen continuously for `window`.
#[derive(Debug, Clone, Copy)]
pub struct StableFor {
    window: Duration,
    accepted: bool,
    candidate: bool,
    candidate_since: Instant,
}

impl StableFor {
    /// Starts out with the valve reported closed.
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            accepted: false,
            candidate: false,
            candidate_since: Instant::from_ticks(0),
        }
    }
}

impl Debounce for StableFor {
    fn update(&mut self, raw_open: bool, now: Instant) -> bool {
        if raw_open != self.candidate {
            self.candidate = raw_open;
            self.candidate_since = now;
        }
        if self.candidate != self.accepted
            && now.saturating_duration_since(self.candidate_since) >= self.window
        {
            self.accepted = self.candidate;
        }
        self.accepted
    }
}

/// The valve limit switch on an active-low input pin.
pub struct ValveSwitch<P, B = NoDebounce> {
    pin: P,
    debounce: B,
}

impl<P: InputPin> ValveSwitch<P, NoDebounce> {
    pub fn new(pin: P) -> Self {
        Self::with_debounce(pin, NoDebounce)
    }
}

impl<P: InputPin, B: Debounce> ValveSwitch<P, B> {
    pub fn with_debounce(pin: P, debounce: B) -> Self {
        Self { pin, debounce }
    }

    /// `true` while the valve is open (pin pulled low).
    pub fn is_open(&mut self, now: Instant) -> Result<bool, P::Error> {
        let raw_open = self.pin.is_low()?;
        Ok(self.debounce.update(raw_open, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn test_switch_is_active_low() {
        let expectations = [
            PinTransaction::get(PinState::Low),
            PinTransaction::get(PinState::High),
        ];
        let mut pin = PinMock::new(&expectations);
        let mut valve = ValveSwitch::new(pin.clone());

        assert_eq!(valve.is_open(at(0)).unwrap(), true);
        assert_eq!(valve.is_open(at(1)).unwrap(), false);
        pin.done();
    }

    #[test]
    fn test_no_debounce_follows_every_sample() {
        let mut debounce = NoDebounce;
        assert!(debounce.update(true, at(0)));
        assert!(!debounce.update(false, at(0)));
        assert!(debounce.update(true, at(0)));
    }

    #[test]
    fn test_stable_for_rejects_bounce() {
        let mut debounce = StableFor::new(Duration::from_millis(20));
        assert!(!debounce.update(true, at(0)));
        assert!(!debounce.update(false, at(5)));
        assert!(!debounce.update(true, at(10)));
        assert!(!debounce.update(true, at(29)));
        assert!(debounce.update(true, at(30)));
    }

    #[test]
    fn test_stable_for_release() {
        let mut debounce = StableFor::new(Duration::from_millis(20));
        debounce.update(true, at(0));
        assert!(debounce.update(true, at(20)));
        assert!(debounce.update(false, at(25)));
        assert!(debounce.update(false, at(44)));
        assert!(!debounce.update(false, at(45)));
    }

    #[test]
    fn test_switch_with_debounce() {
        let expectations = [
            PinTransaction::get(PinState::Low),
            PinTransaction::get(PinState::Low),
        ];
        let mut pin = PinMock::new(&expectations);
        let mut valve =
            ValveSwitch::with_debounce(pin.clone(), StableFor::new(Duration::from_millis(50)));

        assert_eq!(valve.is_open(at(0)).unwrap(), false);
        assert_eq!(valve.is_open(at(50)).unwrap(), true);
        pin.done();
    }
}
