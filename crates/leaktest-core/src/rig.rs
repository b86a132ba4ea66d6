//! The leak-test rig control loop
//!
//! [`LeakTestRig`] owns every piece of the bench and runs one strictly
//! sequential tick at a time: sample → decide → render → alert.
//!
//! Per-tick failures never stop the loop. If no valid sample (or no valve
//! level) can be obtained, the experiment state is held for that tick and the
//! display keeps the last good reading. Only a failure during [`LeakTestRig::init`]
//! is fatal; callers pass it to [`halt`].

use crate::alert::{AlertPattern, AlertScheduler, Buzzer};
use crate::config::{AlertConfig, ExperimentConfig};
use crate::display::StatusDisplay;
use crate::experiment::{ExperimentController, ExperimentState};
use crate::sensors::{PressureSource, SensorError, read_with_retry};
use crate::valve::{Debounce, ValveSwitch};
use embassy_time::Instant;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::delay::DelayNs;
use log::{error, info, warn};
use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    #[error("pressure sensor not ready: {0}")]
    Sensor(SensorError),
    #[error("display did not acknowledge")]
    Display,
    #[error("alert output could not be driven")]
    Alert,
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Pressure sampled this tick, `None` if the sample was invalid.
    pub pressure: Option<f32>,
    pub state: ExperimentState,
    /// `true` if the state machine was not stepped this tick.
    pub held: bool,
    pub alert: Option<AlertPattern>,
}

pub struct LeakTestRig<S, P, B, X, O, D> {
    source: S,
    valve: ValveSwitch<P, B>,
    display: X,
    buzzer: Buzzer<O, D>,
    controller: ExperimentController,
    alerts: AlertScheduler,
    last_pressure: Option<f32>,
}

impl<S, P, B, X, O, D> LeakTestRig<S, P, B, X, O, D>
where
    S: PressureSource,
    P: InputPin,
    B: Debounce,
    X: StatusDisplay,
    O: OutputPin,
    D: DelayNs,
{
    pub fn new(
        source: S,
        valve: ValveSwitch<P, B>,
        display: X,
        buzzer: Buzzer<O, D>,
        config: ExperimentConfig,
    ) -> Self {
        Self::with_alert_config(source, valve, display, buzzer, config, AlertConfig::default())
    }

    pub fn with_alert_config(
        source: S,
        valve: ValveSwitch<P, B>,
        display: X,
        buzzer: Buzzer<O, D>,
        config: ExperimentConfig,
        alert_config: AlertConfig,
    ) -> Self {
        Self {
            source,
            valve,
            display,
            buzzer,
            controller: ExperimentController::new(config),
            alerts: AlertScheduler::new(alert_config),
            last_pressure: None,
        }
    }

    /// Bring up the hardware. Any error here means the bench must not run.
    pub async fn init(&mut self) -> Result<(), InitError> {
        self.buzzer.silence().map_err(|e| {
            error!("Alert pin init failed: {:?}", e);
            InitError::Alert
        })?;

        self.display.init().map_err(|e| {
            error!("Display init failed: {:?}", e);
            InitError::Display
        })?;

        self.source.init().await.map_err(InitError::Sensor)?;

        info!("Leak-test rig ready ({} source, unit {})", S::NAME, S::UNIT);
        Ok(())
    }

    /// Run one control-loop iteration at `now`.
    pub async fn tick(&mut self, now: Instant) -> TickReport {
        let pressure = match read_with_retry(&mut self.source).await {
            Ok(sample) => {
                info!("P = {:.3} {}", sample.pressure, S::UNIT);
                self.last_pressure = Some(sample.pressure);
                Some(sample.pressure)
            }
            Err(e) => {
                warn!("No valid sample this tick: {}", e);
                None
            }
        };

        let valve_open = match self.valve.is_open(now) {
            Ok(open) => Some(open),
            Err(e) => {
                warn!("Valve switch unreadable: {:?}", e);
                None
            }
        };

        let (state, held) = match (pressure, valve_open) {
            (Some(pressure), Some(open)) => (self.controller.step(pressure, open, now), false),
            _ => {
                warn!("Holding state {:?}", self.controller.state());
                (self.controller.state(), true)
            }
        };

        let shown = self.last_pressure.unwrap_or(f32::NAN);
        if let Err(e) = self.display.render(shown, state) {
            error!("Display render failed: {:?}", e);
        }

        let alert = self.alerts.tick(state, now);
        if let Some(pattern) = alert {
            if let Err(e) = self.buzzer.play(&pattern).await {
                error!("Alert playback failed: {:?}", e);
            }
        }

        TickReport {
            pressure,
            state,
            held,
            alert,
        }
    }

    pub fn state(&self) -> ExperimentState {
        self.controller.state()
    }

    pub fn controller(&self) -> &ExperimentController {
        &self.controller
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn display(&self) -> &X {
        &self.display
    }
}

/// Fail-stop after a fatal startup error: report it and never tick again.
pub fn halt(error: InitError) -> ! {
    error!("Fatal: {}. Halting.", error);
    loop {
        core::hint::spin_loop();
    }
}
