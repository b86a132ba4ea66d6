//! Host-side fakes shared by the unit tests.

use crate::display::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX, StatusDisplay};
use crate::experiment::ExperimentState;
use crate::sensors::{
    AnalogChannel, CompensatedPressure, PressureSample, PressureSource, SensorError,
};
use core::cell::Cell;
use core::convert::Infallible;
use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{PointsIter, Rectangle},
};
use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};
use embedded_hal_async::delay::DelayNs;
use std::collections::VecDeque;
use std::rc::Rc;

/// ADC that returns the given counts in order, then errors.
pub struct ScriptedAdc {
    counts: VecDeque<u16>,
}

impl ScriptedAdc {
    pub fn new(counts: &[u16]) -> Self {
        Self {
            counts: counts.iter().copied().collect(),
        }
    }
}

impl AnalogChannel for ScriptedAdc {
    type Error = &'static str;

    async fn read_counts(&mut self) -> Result<u16, Self::Error> {
        self.counts.pop_front().ok_or("script exhausted")
    }
}

/// Compensated sensor that returns the given pascal readings, then errors.
pub struct ScriptedBarometer {
    readings: VecDeque<f32>,
}

impl ScriptedBarometer {
    pub fn new(readings: &[f32]) -> Self {
        Self {
            readings: readings.iter().copied().collect(),
        }
    }
}

impl CompensatedPressure for ScriptedBarometer {
    type Error = &'static str;

    async fn pressure_pa(&mut self) -> Result<f32, Self::Error> {
        self.readings.pop_front().ok_or("script exhausted")
    }
}

/// Pressure source driven by a fixed script of results.
pub struct ScriptedSource {
    script: VecDeque<Result<f32, SensorError>>,
    repeat: Option<f32>,
    responsive: bool,
    reads: usize,
}

impl ScriptedSource {
    pub fn new(script: &[Result<f32, SensorError>]) -> Self {
        Self {
            script: script.iter().copied().collect(),
            repeat: None,
            responsive: true,
            reads: 0,
        }
    }

    /// Always reads `pressure`.
    pub fn constant(pressure: f32) -> Self {
        Self {
            repeat: Some(pressure),
            ..Self::new(&[])
        }
    }

    /// Fails its startup probe.
    pub fn unresponsive() -> Self {
        Self {
            responsive: false,
            ..Self::new(&[])
        }
    }

    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl PressureSource for ScriptedSource {
    const NAME: &'static str = "scripted";
    const UNIT: &'static str = "kPa";

    async fn init(&mut self) -> Result<(), SensorError> {
        if self.responsive {
            Ok(())
        } else {
            Err(SensorError::InitializationFailed {
                sensor: Self::NAME,
                details: "no answer",
            })
        }
    }

    async fn read(&mut self) -> Result<PressureSample, SensorError> {
        self.reads += 1;
        let next = match (self.script.pop_front(), self.repeat) {
            (Some(result), _) => result,
            (None, Some(pressure)) => Ok(pressure),
            (None, None) => Err(SensorError::ReadFailed {
                sensor: Self::NAME,
                operation: "read",
                details: "script exhausted",
            }),
        };
        next.map(PressureSample::new)
    }
}

/// Delay that returns immediately and records what it was asked for.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    calls_ns: Vec<u64>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_ms(&self) -> u64 {
        self.calls_ns.iter().sum::<u64>() / 1_000_000
    }

    pub fn calls_ms(&self) -> Vec<u32> {
        self.calls_ns
            .iter()
            .map(|ns| (ns / 1_000_000) as u32)
            .collect()
    }
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.calls_ns.push(ns as u64);
    }

    async fn delay_us(&mut self, us: u32) {
        self.calls_ns.push(us as u64 * 1_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.calls_ns.push(ms as u64 * 1_000_000);
    }
}

/// Error returned by the fake pins when a fault is injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinFault;

impl digital::Error for PinFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Valve switch input whose level the test flips between ticks.
///
/// Clones share the same level.
#[derive(Debug, Clone, Default)]
pub struct SwitchPin {
    open: Rc<Cell<bool>>,
    broken: Rc<Cell<bool>>,
}

impl SwitchPin {
    /// Starts with the valve closed.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_open(&self, open: bool) {
        self.open.set(open);
    }

    /// While broken every read fails.
    pub fn set_broken(&self, broken: bool) {
        self.broken.set(broken);
    }

    fn level_open(&self) -> Result<bool, PinFault> {
        if self.broken.get() {
            return Err(PinFault);
        }
        Ok(self.open.get())
    }
}

impl ErrorType for SwitchPin {
    type Error = PinFault;
}

impl InputPin for SwitchPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.level_open().map(|open| !open)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.level_open()
    }
}

/// Output pin that remembers its level and counts low-to-high edges.
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct CountingPin {
    level: Rc<Cell<Option<bool>>>,
    rising_edges: Rc<Cell<usize>>,
    failing_lows: Rc<Cell<usize>>,
}

impl CountingPin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` calls to `set_low` fail without changing the level.
    pub fn fail_next_low(&self, count: usize) {
        self.failing_lows.set(count);
    }

    /// `None` until the pin is first driven.
    pub fn level(&self) -> Option<bool> {
        self.level.get()
    }

    pub fn rising_edges(&self) -> usize {
        self.rising_edges.get()
    }
}

impl ErrorType for CountingPin {
    type Error = PinFault;
}

impl OutputPin for CountingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let failing = self.failing_lows.get();
        if failing > 0 {
            self.failing_lows.set(failing - 1);
            return Err(PinFault);
        }
        self.level.set(Some(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if self.level.get() != Some(true) {
            self.rising_edges.set(self.rising_edges.get() + 1);
        }
        self.level.set(Some(true));
        Ok(())
    }
}

/// Display that keeps every rendered frame, or fails every call when broken.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    frames: Vec<(f32, ExperimentState)>,
    broken: bool,
}

impl RecordingDisplay {
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn frames(&self) -> &[(f32, ExperimentState)] {
        &self.frames
    }

    pub fn last(&self) -> Option<(f32, ExperimentState)> {
        self.frames.last().copied()
    }
}

impl StatusDisplay for RecordingDisplay {
    type Error = &'static str;

    fn init(&mut self) -> Result<(), Self::Error> {
        if self.broken {
            return Err("panel not responding");
        }
        Ok(())
    }

    fn render(&mut self, pressure: f32, state: ExperimentState) -> Result<(), Self::Error> {
        if self.broken {
            return Err("panel not responding");
        }
        self.frames.push((pressure, state));
        Ok(())
    }
}

/// In-memory monochrome panel with the rig display's geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: Vec<bool>,
}

impl FrameBuffer {
    const WIDTH: usize = DISPLAY_WIDTH_PX as usize;
    const HEIGHT: usize = DISPLAY_HEIGHT_PX as usize;

    pub fn new() -> Self {
        Self {
            pixels: vec![false; Self::WIDTH * Self::HEIGHT],
        }
    }

    pub fn fill_all(&mut self) {
        self.pixels.fill(true);
    }

    /// Coordinates of every lit pixel inside `area`, row by row.
    pub fn lit_pixels(&self, area: Rectangle) -> Vec<Point> {
        area.points()
            .filter(|p| self.get(*p).unwrap_or(false))
            .collect()
    }

    pub fn lit_in(&self, area: Rectangle) -> usize {
        self.lit_pixels(area).len()
    }

    fn index(point: Point) -> Option<usize> {
        let x = usize::try_from(point.x).ok()?;
        let y = usize::try_from(point.y).ok()?;
        (x < Self::WIDTH && y < Self::HEIGHT).then_some(y * Self::WIDTH + x)
    }

    fn get(&self, point: Point) -> Option<bool> {
        Self::index(point).map(|i| self.pixels[i])
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some(i) = Self::index(point) {
                self.pixels[i] = color.is_on();
            }
        }
        Ok(())
    }
}
