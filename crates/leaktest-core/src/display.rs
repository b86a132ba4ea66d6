//! Result display
//!
//! The rig only needs one screen: the current pressure in a large font and,
//! underneath, the unit and the status word. Anything that can draw that
//! implements [`StatusDisplay`]; [`OledPresenter`] does it on a 128×64
//! monochrome panel through embedded-graphics.

use crate::experiment::ExperimentState;
use core::fmt::{Debug, Write};
use embedded_graphics::{
    Drawable,
    mono_font::{
        MonoTextStyle,
        ascii::{FONT_6X10, FONT_10X20},
    },
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use heapless::String;

pub const DISPLAY_WIDTH_PX: u32 = 128;
pub const DISPLAY_HEIGHT_PX: u32 = 64;

/// Baseline of the large pressure value.
pub const VALUE_POSITION: Point = Point::new(0, 40);
/// Baseline of the unit label on the second line.
pub const UNIT_POSITION: Point = Point::new(0, 60);
/// Baseline of the status word on the second line.
pub const STATUS_POSITION: Point = Point::new(50, 60);

/// Shown when the value does not fit the layout.
const OVERFLOW_TEXT: &str = "-.---";

/// Sink for the per-tick (pressure, state) pair.
pub trait StatusDisplay {
    type Error: Debug;

    /// Called once at startup. An error here is fatal.
    fn init(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn render(&mut self, pressure: f32, state: ExperimentState) -> Result<(), Self::Error>;
}

/// Pressure with three decimals, e.g. `"1.234"`.
pub fn format_pressure(pressure: f32) -> String<12> {
    let mut text = String::new();
    if write!(text, "{:.3}", pressure).is_err() {
        text.clear();
        let _ = text.push_str(OVERFLOW_TEXT);
    }
    text
}

/// Two-line layout on a monochrome panel.
pub struct OledPresenter<D> {
    display: D,
    unit: &'static str,
}

impl<D> OledPresenter<D>
where
    D: DrawTarget<Color = BinaryColor>,
{
    pub fn new(display: D, unit: &'static str) -> Self {
        Self { display, unit }
    }

    pub fn display(&self) -> &D {
        &self.display
    }
}

impl<D> StatusDisplay for OledPresenter<D>
where
    D: DrawTarget<Color = BinaryColor>,
    D::Error: Debug,
{
    type Error = D::Error;

    fn init(&mut self) -> Result<(), Self::Error> {
        self.display.clear(BinaryColor::Off)
    }

    fn render(&mut self, pressure: f32, state: ExperimentState) -> Result<(), Self::Error> {
        self.display.clear(BinaryColor::Off)?;

        let large = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);
        let small = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);

        let value = format_pressure(pressure);
        Text::with_baseline(&value, VALUE_POSITION, large, Baseline::Alphabetic)
            .draw(&mut self.display)?;
        Text::with_baseline(self.unit, UNIT_POSITION, small, Baseline::Alphabetic)
            .draw(&mut self.display)?;
        Text::with_baseline(state.label(), STATUS_POSITION, small, Baseline::Alphabetic)
            .draw(&mut self.display)?;

        Ok(())
    }
}
