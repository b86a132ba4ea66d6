//! Compile-time configuration for the leak-test rig.
//!
//! There is no configuration file and nothing is persisted: calibration
//! constants live next to the source that uses them, and the per-episode
//! policy lives here.
//!
//! Each acquisition strategy comes with its own failure policy. The analog and
//! environmental sources judge a leak relative to the pressure captured at Run
//! start, while the bridge sensor uses a fixed absolute floor. The asymmetry
//! reflects how much each sensor's calibration is trusted and must not be
//! unified.

use embassy_time::Duration;

// =============================================================================
// Episode timing
// =============================================================================

/// How long the vessel must hold pressure for the episode to pass.
pub const RUN_DURATION: Duration = Duration::from_millis(60_000);

/// Minimum spacing between two alert patterns while in Success or Fail.
pub const ALERT_COOLDOWN: Duration = Duration::from_millis(10_000);

// =============================================================================
// Failure policies per acquisition strategy
// =============================================================================

/// Allowed drop below the Run-start reading for the analog source (at).
pub const ANALOG_MARGIN_AT: f32 = 0.1;

/// Allowed drop below the Run-start reading for the environmental source (kPa).
pub const ENVIRONMENTAL_MARGIN_KPA: f32 = 1.0;

/// Absolute floor for the bridge sensor (kPa).
pub const BRIDGE_FLOOR_KPA: f32 = 40.0;

const _: () = assert!(ANALOG_MARGIN_AT > 0.0);
const _: () = assert!(ENVIRONMENTAL_MARGIN_KPA > 0.0);
const _: () = assert!(BRIDGE_FLOOR_KPA > 0.0);

/// How the failure threshold of a Run episode is derived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdPolicy {
    /// Fail once pressure drops more than this margin below the Run-start reading.
    MarginBelowStart(f32),
    /// Fail once pressure drops below this fixed floor.
    AbsoluteFloor(f32),
}

impl ThresholdPolicy {
    /// Failure threshold for an episode that starts at `pressure_at_start`.
    pub fn failure_threshold(self, pressure_at_start: f32) -> f32 {
        match self {
            Self::MarginBelowStart(margin) => pressure_at_start - margin,
            Self::AbsoluteFloor(floor) => floor,
        }
    }
}

/// Parameters of one experiment episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExperimentConfig {
    pub policy: ThresholdPolicy,
    pub run_duration: Duration,
}

impl ExperimentConfig {
    /// Preset for the analog transducer source.
    pub const fn analog() -> Self {
        Self {
            policy: ThresholdPolicy::MarginBelowStart(ANALOG_MARGIN_AT),
            run_duration: RUN_DURATION,
        }
    }

    /// Preset for the compensated environmental sensor source.
    pub const fn environmental() -> Self {
        Self {
            policy: ThresholdPolicy::MarginBelowStart(ENVIRONMENTAL_MARGIN_KPA),
            run_duration: RUN_DURATION,
        }
    }

    /// Preset for the raw bridge-code sensor source.
    pub const fn bridge() -> Self {
        Self {
            policy: ThresholdPolicy::AbsoluteFloor(BRIDGE_FLOOR_KPA),
            run_duration: RUN_DURATION,
        }
    }
}

/// Alert timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertConfig {
    pub cooldown: Duration,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cooldown: ALERT_COOLDOWN,
        }
    }
}
