//! Experiment state machine
//!
//! One episode runs Start → Pump → Run → {Success | Fail}:
//!
//! ```text
//!            valve open            valve closed
//!   Start ───────────────> Pump ─────────────────> Run ──(p < threshold)──> Fail
//!     ^                     ^                       │
//!     │                     │                       └──(now >= deadline)──> Success
//!     └── power-up          └────── valve open, from any state ──────────────┘
//! ```
//!
//! The failure threshold and the deadline are fixed once, at the Pump → Run
//! transition, and cleared as soon as the valve reopens. Within Run the
//! threshold check runs before the deadline check, so a low reading fails the
//! episode even if the deadline has also passed. Success and Fail hold until
//! the valve reopens.

use crate::config::ExperimentConfig;
use embassy_time::Instant;
use log::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExperimentState {
    /// Powered up, no pumping seen yet
    #[default]
    Start,
    /// Valve open, vessel being pressurized
    Pump,
    /// Valve closed, watching for a pressure drop
    Run,
    /// Held pressure for the whole run
    Success,
    /// Pressure dropped below the failure threshold
    Fail,
}

impl ExperimentState {
    /// Status word shown on the display.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Start => "Wait",
            Self::Pump => "Pump",
            Self::Run => "Run",
            Self::Success => "Pass",
            Self::Fail => "Fail",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Fail)
    }
}

/// Parameters fixed at the start of a Run episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunEpisode {
    pub started_at: Instant,
    pub pressure_at_start: f32,
    pub failure_threshold: f32,
    pub deadline: Instant,
}

pub struct ExperimentController {
    config: ExperimentConfig,
    state: ExperimentState,
    episode: Option<RunEpisode>,
}

impl ExperimentController {
    pub const fn new(config: ExperimentConfig) -> Self {
        Self {
            config,
            state: ExperimentState::Start,
            episode: None,
        }
    }

    /// Advance the state machine by one tick and return the new state.
    pub fn step(&mut self, pressure: f32, valve_open: bool, now: Instant) -> ExperimentState {
        let next = if valve_open {
            self.episode = None;
            ExperimentState::Pump
        } else {
            match (self.state, self.episode) {
                (ExperimentState::Pump, _) => {
                    let episode = RunEpisode {
                        started_at: now,
                        pressure_at_start: pressure,
                        failure_threshold: self.config.policy.failure_threshold(pressure),
                        deadline: now + self.config.run_duration,
                    };
                    info!(
                        "Run started at {:.3}, failure threshold {:.3}, {} ms window",
                        pressure,
                        episode.failure_threshold,
                        self.config.run_duration.as_millis()
                    );
                    self.episode = Some(episode);
                    ExperimentState::Run
                }
                (ExperimentState::Run, Some(episode)) => {
                    let held_ms = now.saturating_duration_since(episode.started_at).as_millis();
                    if pressure < episode.failure_threshold {
                        info!(
                            "Pressure fell from {:.3} to {:.3} after {} ms",
                            episode.pressure_at_start, pressure, held_ms
                        );
                        ExperimentState::Fail
                    } else if now >= episode.deadline {
                        info!(
                            "Held {:.3} (started at {:.3}) for {} ms",
                            pressure, episode.pressure_at_start, held_ms
                        );
                        ExperimentState::Success
                    } else {
                        ExperimentState::Run
                    }
                }
                (state, _) => state,
            }
        };

        if next != self.state {
            info!("State {:?} -> {:?} at {:.3}", self.state, next, pressure);
        }
        self.state = next;
        next
    }

    pub fn state(&self) -> ExperimentState {
        self.state
    }

    /// The current (or just finished) Run episode, if any.
    pub fn episode(&self) -> Option<&RunEpisode> {
        self.episode.as_ref()
    }

    pub fn failure_threshold(&self) -> Option<f32> {
        self.episode.map(|e| e.failure_threshold)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.episode.map(|e| e.deadline)
    }
}
