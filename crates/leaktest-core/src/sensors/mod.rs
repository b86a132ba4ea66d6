//! Pressure acquisition
//!
//! One deployment reads pressure through exactly one of three strategies, all
//! behind the [`PressureSource`] trait:
//!
//! - [`AnalogPressureSource`]: ADC counts of a ratiometric transducer,
//!   converted to technical atmospheres and smoothed by a running median
//! - [`EnvironmentalPressureSource`]: a compensated digital sensor reporting
//!   pascals, converted to gauge kPa
//! - [`BridgePressureSource`]: raw bridge code from an I2C bridge sensor,
//!   mapped to kPa by a two-point calibration

mod analog;
mod bridge;
mod environmental;

pub use analog::*;
pub use bridge::*;
pub use environmental::*;

use log::warn;
use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor} initialization failed: {details}")]
    InitializationFailed {
        sensor: &'static str,
        details: &'static str,
    },
    #[error("{sensor} failed to {operation}: {details}")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
        details: &'static str,
    },
    #[error("{sensor} returned {received} of {expected} bytes")]
    IncompleteFrame {
        sensor: &'static str,
        expected: usize,
        received: usize,
    },
}

/// A single pressure reading, in the unit of the source that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureSample {
    pub pressure: f32,
}

impl PressureSample {
    pub const fn new(pressure: f32) -> Self {
        Self { pressure }
    }
}

/// Trait for anything that can produce the current vessel pressure.
pub trait PressureSource {
    /// Short name used in log messages.
    const NAME: &'static str;

    /// Unit label shown next to the value, e.g. `"kPa"`.
    const UNIT: &'static str;

    /// Check once at startup that the hardware answers.
    fn init(&mut self) -> impl Future<Output = Result<(), SensorError>> {
        async { Ok(()) }
    }

    /// Produce the current pressure. Called once per tick.
    fn read(&mut self) -> impl Future<Output = Result<PressureSample, SensorError>>;
}

/// Read `source`, retrying once if the first attempt fails.
///
/// A second failure is returned as-is; the caller must treat the tick as
/// having no valid sample.
pub async fn read_with_retry<S: PressureSource>(
    source: &mut S,
) -> Result<PressureSample, SensorError> {
    match source.read().await {
        Ok(sample) => Ok(sample),
        Err(first) => {
            warn!("{} read failed ({}), retrying once", S::NAME, first);
            source.read().await
        }
    }
}
