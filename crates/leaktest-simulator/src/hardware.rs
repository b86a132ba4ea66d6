//! Simulated bench hardware.
//!
//! Every peripheral reads from one shared [`Vessel`], so the three pressure
//! strategies all observe the same physical pressure in their own units.

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;
use std::time::Duration;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use embedded_hal::i2c::{self, ErrorKind, NoAcknowledgeSource, Operation};
use embedded_hal_async::delay::DelayNs;
use log::info;

use leaktest_core::sensors::{
    ADC_FULL_SCALE_COUNTS, ADC_REFERENCE_VOLTS, AnalogChannel, BRIDGE_CODE_MAX, BRIDGE_CODE_MIN,
    CompensatedPressure, DEFAULT_ADDRESS, FRAME_LEN, GAUGE_OFFSET_KPA, MEASURE_COMMAND,
    PA_PER_KPA, PRESSURE_MAX_KPA, PSI_TO_AT, TRANSDUCER_FULL_VOLTS, TRANSDUCER_SPAN_PSI,
    TRANSDUCER_ZERO_VOLTS,
};

/// Pressure the pump settles at, in kPa gauge.
const PUMP_TARGET_KPA: f32 = 90.0;

/// Fill rate while the valve is open.
const PUMP_RATE_KPA_PER_S: f32 = 15.0;

/// Loss rate with the leak enabled.
const LEAK_RATE_KPA_PER_S: f32 = 1.0;

/// One technical atmosphere in kPa.
const KPA_PER_AT: f32 = 98.0665;

/// Every Nth ADC conversion returns a spike, to exercise the median filter.
const ADC_SPIKE_EVERY: u32 = 13;

/// Fixed temperature code reported by the bridge sensor (about 25 °C).
const BRIDGE_TEMPERATURE_CODE: u16 = 0x6000;

/// Status byte of an idle, calibrated bridge sensor.
const BRIDGE_STATUS_IDLE: u8 = 0x18;

pub type SharedVessel = Rc<RefCell<Vessel>>;

/// The pressurized vessel under test.
#[derive(Debug, Default)]
pub struct Vessel {
    gauge_kpa: f32,
    valve_open: bool,
    leaking: bool,
    sensor_fault: bool,
}

impl Vessel {
    pub fn shared() -> SharedVessel {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Integrate the pressure over `dt`.
    pub fn advance(&mut self, dt: Duration) {
        let secs = dt.as_secs_f32();
        if self.valve_open {
            self.gauge_kpa = (self.gauge_kpa + PUMP_RATE_KPA_PER_S * secs).min(PUMP_TARGET_KPA);
        } else if self.leaking {
            self.gauge_kpa = (self.gauge_kpa - LEAK_RATE_KPA_PER_S * secs).max(0.0);
        }
    }

    pub fn gauge_kpa(&self) -> f32 {
        self.gauge_kpa
    }

    pub fn set_valve_open(&mut self, open: bool) {
        if open != self.valve_open {
            info!("Valve {}", if open { "opened" } else { "closed" });
        }
        self.valve_open = open;
    }

    pub fn toggle_leak(&mut self) {
        self.leaking = !self.leaking;
        info!("Leak {}", if self.leaking { "enabled" } else { "sealed" });
    }

    pub fn toggle_sensor_fault(&mut self) {
        self.sensor_fault = !self.sensor_fault;
        info!(
            "Sensor fault {}",
            if self.sensor_fault { "injected" } else { "cleared" }
        );
    }
}

/// 10-bit ADC wired to a ratiometric transducer on the vessel.
pub struct SimAdc {
    vessel: SharedVessel,
    conversions: u32,
}

impl SimAdc {
    pub fn new(vessel: SharedVessel) -> Self {
        Self {
            vessel,
            conversions: 0,
        }
    }
}

impl AnalogChannel for SimAdc {
    type Error = &'static str;

    async fn read_counts(&mut self) -> Result<u16, Self::Error> {
        let vessel = self.vessel.borrow();
        if vessel.sensor_fault {
            return Err("conversion timed out");
        }

        self.conversions = self.conversions.wrapping_add(1);
        if self.conversions % ADC_SPIKE_EVERY == 0 {
            return Ok(ADC_FULL_SCALE_COUNTS as u16 - 1);
        }

        let psi = vessel.gauge_kpa() / KPA_PER_AT / PSI_TO_AT;
        let volts = TRANSDUCER_ZERO_VOLTS
            + psi / TRANSDUCER_SPAN_PSI * (TRANSDUCER_FULL_VOLTS - TRANSDUCER_ZERO_VOLTS);
        let counts = (volts * ADC_FULL_SCALE_COUNTS / ADC_REFERENCE_VOLTS).round();
        Ok(counts.clamp(0.0, ADC_FULL_SCALE_COUNTS - 1.0) as u16)
    }
}

/// Compensated digital sensor reporting absolute pascals.
pub struct SimBarometer {
    vessel: SharedVessel,
}

impl SimBarometer {
    pub fn new(vessel: SharedVessel) -> Self {
        Self { vessel }
    }
}

impl CompensatedPressure for SimBarometer {
    type Error = &'static str;

    async fn pressure_pa(&mut self) -> Result<f32, Self::Error> {
        let vessel = self.vessel.borrow();
        if vessel.sensor_fault {
            return Err("no response");
        }
        Ok((vessel.gauge_kpa() + GAUGE_OFFSET_KPA) * PA_PER_KPA)
    }
}

/// I2C bus with a single bridge sensor at [`DEFAULT_ADDRESS`].
///
/// A measurement command latches the current vessel pressure; the next
/// frame read returns it.
pub struct SimBridgeBus {
    vessel: SharedVessel,
    latched: Option<[u8; FRAME_LEN]>,
}

impl SimBridgeBus {
    pub fn new(vessel: SharedVessel) -> Self {
        Self {
            vessel,
            latched: None,
        }
    }

    fn measure(&self) -> [u8; FRAME_LEN] {
        let kpa = self.vessel.borrow().gauge_kpa().clamp(0.0, PRESSURE_MAX_KPA);
        let span = (BRIDGE_CODE_MAX - BRIDGE_CODE_MIN) as f32;
        let code = BRIDGE_CODE_MIN + (kpa / PRESSURE_MAX_KPA * span) as u32;
        let [_, c2, c1, c0] = code.to_be_bytes();
        let [t1, t0] = BRIDGE_TEMPERATURE_CODE.to_be_bytes();
        [BRIDGE_STATUS_IDLE, c2, c1, c0, t1, t0]
    }
}

impl i2c::ErrorType for SimBridgeBus {
    type Error = ErrorKind;
}

impl embedded_hal_async::i2c::I2c for SimBridgeBus {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != DEFAULT_ADDRESS {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        if self.vessel.borrow().sensor_fault {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
        }

        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    if bytes[..] == [MEASURE_COMMAND] {
                        self.latched = Some(self.measure());
                    } else {
                        return Err(ErrorKind::Other);
                    }
                }
                Operation::Read(buf) => match self.latched.take() {
                    Some(frame) if buf.len() <= FRAME_LEN => {
                        buf.copy_from_slice(&frame[..buf.len()]);
                    }
                    _ => buf.fill(BRIDGE_STATUS_IDLE),
                },
            }
        }
        Ok(())
    }
}

/// Valve limit switch: pulled low while the valve is open.
pub struct SimValvePin {
    vessel: SharedVessel,
}

impl SimValvePin {
    pub fn new(vessel: SharedVessel) -> Self {
        Self { vessel }
    }
}

impl ErrorType for SimValvePin {
    type Error = Infallible;
}

impl InputPin for SimValvePin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.vessel.borrow().valve_open)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.vessel.borrow().valve_open)
    }
}

/// Buzzer transducer; logs instead of sounding.
#[derive(Default)]
pub struct SimBuzzerPin {
    on: bool,
}

impl ErrorType for SimBuzzerPin {
    type Error = Infallible;
}

impl OutputPin for SimBuzzerPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.on = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.on {
            info!("BEEP");
        }
        self.on = true;
        Ok(())
    }
}

/// Blocking delay on the host thread.
pub struct StdDelay;

impl DelayNs for StdDelay {
    async fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns.into()));
    }
}
