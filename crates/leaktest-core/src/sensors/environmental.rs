use super::{PressureSample, PressureSource, SensorError};
use core::fmt::Debug;
use log::error;

pub const PA_PER_KPA: f32 = 1000.0;

/// Offset correction applied to the sensor's absolute reading: one standard
/// atmosphere, so the result is gauge pressure.
pub const GAUGE_OFFSET_KPA: f32 = 101.325;

/// A digital pressure sensor that already applies its own temperature
/// compensation (BMP/BME-class parts).
pub trait CompensatedPressure {
    type Error: Debug;

    /// Absolute pressure in pascals.
    fn pressure_pa(&mut self) -> impl Future<Output = Result<f32, Self::Error>>;
}

pub fn pascals_to_gauge_kpa(pascals: f32) -> f32 {
    pascals / PA_PER_KPA - GAUGE_OFFSET_KPA
}

/// Gauge pressure from a compensated sensor. No smoothing.
pub struct EnvironmentalPressureSource<S> {
    sensor: S,
}

impl<S: CompensatedPressure> EnvironmentalPressureSource<S> {
    pub fn new(sensor: S) -> Self {
        Self { sensor }
    }
}

impl<S: CompensatedPressure> PressureSource for EnvironmentalPressureSource<S> {
    const NAME: &'static str = "environmental";
    const UNIT: &'static str = "kPa";

    async fn init(&mut self) -> Result<(), SensorError> {
        self.sensor.pressure_pa().await.map(|_| ()).map_err(|e| {
            error!("Environmental sensor probe failed: {:?}", e);
            SensorError::InitializationFailed {
                sensor: "environmental",
                details: "sensor did not answer the first measurement",
            }
        })
    }

    async fn read(&mut self) -> Result<PressureSample, SensorError> {
        let pascals = self.sensor.pressure_pa().await.map_err(|e| {
            error!("Environmental sensor measurement failed: {:?}", e);
            SensorError::ReadFailed {
                sensor: "environmental",
                operation: "measure pressure",
                details: "bus communication error",
            }
        })?;

        Ok(PressureSample::new(pascals_to_gauge_kpa(pascals)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedBarometer;
    use embassy_futures::block_on;

    #[test]
    fn test_standard_atmosphere_reads_zero_gauge() {
        assert!(pascals_to_gauge_kpa(101_325.0).abs() < 1e-4);
        assert!((pascals_to_gauge_kpa(151_325.0) - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_read_is_unfiltered() {
        let mut source =
            EnvironmentalPressureSource::new(ScriptedBarometer::new(&[151_325.0, 301_325.0]));
        let first = block_on(source.read()).unwrap();
        let second = block_on(source.read()).unwrap();
        assert!((first.pressure - 50.0).abs() < 1e-3);
        assert!((second.pressure - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_init_fails_when_sensor_is_silent() {
        let mut source = EnvironmentalPressureSource::new(ScriptedBarometer::new(&[]));
        assert!(matches!(
            block_on(source.init()),
            Err(SensorError::InitializationFailed { .. })
        ));
    }

    #[test]
    fn test_read_failure_is_reported() {
        let mut source = EnvironmentalPressureSource::new(ScriptedBarometer::new(&[]));
        assert!(matches!(
            block_on(source.read()),
            Err(SensorError::ReadFailed {
                sensor: "environmental",
                ..
            })
        ));
    }
}
