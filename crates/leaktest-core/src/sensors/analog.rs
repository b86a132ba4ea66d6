use super::{PressureSample, PressureSource, SensorError};
use crate::filter::MedianFilter;
use core::fmt::Debug;
use log::error;

/// 10-bit converter on a 5 V reference.
pub const ADC_FULL_SCALE_COUNTS: f32 = 1024.0;
pub const ADC_REFERENCE_VOLTS: f32 = 5.0;

// Ratiometric transducer: 0.5 V at 0 psi, 4.5 V at full scale.
pub const TRANSDUCER_ZERO_VOLTS: f32 = 0.5;
pub const TRANSDUCER_FULL_VOLTS: f32 = 4.5;
pub const TRANSDUCER_SPAN_PSI: f32 = 100.0;

/// psi to technical atmospheres (kgf/cm²).
pub const PSI_TO_AT: f32 = 0.070307;

/// Running-median window for the analog path.
pub const MEDIAN_WINDOW: usize = 7;

const _: () = assert!(TRANSDUCER_ZERO_VOLTS < TRANSDUCER_FULL_VOLTS);
const _: () = assert!(TRANSDUCER_FULL_VOLTS <= ADC_REFERENCE_VOLTS);

/// A single-channel analog-to-digital converter.
///
/// embedded-hal 1.0 has no ADC trait, so platforms implement this for their
/// one-shot channel.
pub trait AnalogChannel {
    type Error: Debug;

    /// Sample the channel and return raw converter counts.
    fn read_counts(&mut self) -> impl Future<Output = Result<u16, Self::Error>>;
}

pub fn counts_to_volts(counts: u16) -> f32 {
    counts as f32 * ADC_REFERENCE_VOLTS / ADC_FULL_SCALE_COUNTS
}

pub fn volts_to_at(volts: f32) -> f32 {
    (volts - TRANSDUCER_ZERO_VOLTS) * TRANSDUCER_SPAN_PSI
        / (TRANSDUCER_FULL_VOLTS - TRANSDUCER_ZERO_VOLTS)
        * PSI_TO_AT
}

/// Pressure from an analog transducer, median-filtered.
pub struct AnalogPressureSource<A> {
    adc: A,
    filter: MedianFilter<MEDIAN_WINDOW>,
}

impl<A: AnalogChannel> AnalogPressureSource<A> {
    pub fn new(adc: A) -> Self {
        Self {
            adc,
            filter: MedianFilter::new(),
        }
    }
}

impl<A: AnalogChannel> PressureSource for AnalogPressureSource<A> {
    const NAME: &'static str = "analog";
    const UNIT: &'static str = "at";

    async fn read(&mut self) -> Result<PressureSample, SensorError> {
        let counts = self.adc.read_counts().await.map_err(|e| {
            error!("ADC conversion failed: {:?}", e);
            SensorError::ReadFailed {
                sensor: "analog",
                operation: "sample ADC channel",
                details: "converter error",
            }
        })?;

        let raw = volts_to_at(counts_to_volts(counts));
        Ok(PressureSample::new(self.filter.put_get(raw)))
    }
}
