use super::{PressureSample, PressureSource, SensorError};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use log::{debug, error, info, warn};

/// Default 7-bit bus address of the bridge sensor.
pub const DEFAULT_ADDRESS: u8 = 0x78;

/// Starts one combined pressure + temperature conversion.
pub const MEASURE_COMMAND: u8 = 0xAC;

/// Wait between the measurement command and reading the result.
pub const SETTLE_DELAY_MS: u32 = 200;

/// Response layout: status, 3-byte bridge code, 2-byte temperature code.
pub const FRAME_LEN: usize = 6;

/// Status bit set while a conversion is still in progress.
pub const STATUS_BUSY: u8 = 0x80;

// Two-point calibration: 10 % of full-scale counts is 0 kPa, 90 % is 100 kPa.
pub const BRIDGE_CODE_MIN: u32 = 1_677_722;
pub const BRIDGE_CODE_MAX: u32 = 15_099_494;
pub const PRESSURE_MIN_KPA: f32 = 0.0;
pub const PRESSURE_MAX_KPA: f32 = 100.0;

const _: () = assert!(BRIDGE_CODE_MIN < BRIDGE_CODE_MAX);
const _: () = assert!(BRIDGE_CODE_MAX < (1 << 24));
const _: () = assert!(PRESSURE_MIN_KPA < PRESSURE_MAX_KPA);

/// One decoded measurement frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeFrame {
    pub status: u8,
    /// 24-bit bridge code, big-endian on the wire.
    pub bridge_code: u32,
    /// 16-bit temperature code, big-endian on the wire. Not used for pressure.
    pub temperature_code: u16,
}

impl BridgeFrame {
    pub fn is_busy(&self) -> bool {
        self.status & STATUS_BUSY != 0
    }

    /// Decode a raw response. A frame shorter than [`FRAME_LEN`] is rejected
    /// rather than decoded from stale bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, SensorError> {
        if bytes.len() < FRAME_LEN {
            return Err(SensorError::IncompleteFrame {
                sensor: "bridge",
                expected: FRAME_LEN,
                received: bytes.len(),
            });
        }

        Ok(Self {
            status: bytes[0],
            bridge_code: u32::from_be_bytes([0, bytes[1], bytes[2], bytes[3]]),
            temperature_code: u16::from_be_bytes([bytes[4], bytes[5]]),
        })
    }
}

pub fn bridge_code_to_kpa(code: u32) -> f32 {
    let span_counts = (BRIDGE_CODE_MAX - BRIDGE_CODE_MIN) as f32;
    let offset_counts = code as f32 - BRIDGE_CODE_MIN as f32;
    PRESSURE_MIN_KPA + offset_counts * (PRESSURE_MAX_KPA - PRESSURE_MIN_KPA) / span_counts
}

/// Pressure from a raw bridge-code sensor on an I2C bus.
pub struct BridgePressureSource<I, D> {
    i2c: I,
    delay: D,
    address: u8,
    last_frame: Option<BridgeFrame>,
}

impl<I: I2c, D: DelayNs> BridgePressureSource<I, D> {
    pub fn new(i2c: I, delay: D) -> Self {
        Self::with_address(i2c, delay, DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
            last_frame: None,
        }
    }

    /// The most recent successfully decoded frame, including the temperature
    /// code.
    pub fn last_frame(&self) -> Option<BridgeFrame> {
        self.last_frame
    }
}

impl<I: I2c, D: DelayNs> PressureSource for BridgePressureSource<I, D> {
    const NAME: &'static str = "bridge";
    const UNIT: &'static str = "kPa";

    async fn init(&mut self) -> Result<(), SensorError> {
        let mut status = [0u8; 1];
        self.i2c.read(self.address, &mut status).await.map_err(|e| {
            error!("Bridge sensor at {:#04x} did not acknowledge: {:?}", self.address, e);
            SensorError::InitializationFailed {
                sensor: "bridge",
                details: "no acknowledge on status read",
            }
        })?;

        info!("Bridge sensor ready, status {:#04x}", status[0]);
        Ok(())
    }

    async fn read(&mut self) -> Result<PressureSample, SensorError> {
        self.i2c
            .write(self.address, &[MEASURE_COMMAND])
            .await
            .map_err(|e| {
                error!("Bridge measurement command failed: {:?}", e);
                SensorError::ReadFailed {
                    sensor: "bridge",
                    operation: "send measurement command",
                    details: "I2C communication error",
                }
            })?;

        self.delay.delay_ms(SETTLE_DELAY_MS).await;

        let mut buf = [0u8; FRAME_LEN];
        self.i2c.read(self.address, &mut buf).await.map_err(|e| {
            error!("Bridge frame read failed: {:?}", e);
            SensorError::ReadFailed {
                sensor: "bridge",
                operation: "read measurement frame",
                details: "I2C communication error or short read",
            }
        })?;

        let frame = BridgeFrame::decode(&buf)?;
        if frame.is_busy() {
            warn!("Bridge sensor still busy after settle, status {:#04x}", frame.status);
            return Err(SensorError::ReadFailed {
                sensor: "bridge",
                operation: "read measurement frame",
                details: "conversion not finished",
            });
        }
        debug!(
            "Bridge frame: status {:#04x}, code {}, temperature code {}",
            frame.status, frame.bridge_code, frame.temperature_code
        );
        self.last_frame = Some(frame);

        Ok(PressureSample::new(bridge_code_to_kpa(frame.bridge_code)))
    }
}
