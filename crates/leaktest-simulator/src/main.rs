//! Desktop simulator for the pneumatic leak-test rig.
//!
//! Runs the leaktest-core rig loop against a simulated vessel and shows the
//! 128×64 status panel in an SDL2 window via `embedded-graphics-simulator`.
//!
//! ```text
//! leaktest-simulator [analog|environmental|bridge]
//! ```
//!
//! # Key bindings
//!
//! | Key    | Action                               |
//! |--------|--------------------------------------|
//! | Space  | Hold to open the fill valve          |
//! | L      | Toggle the vessel leak               |
//! | F      | Toggle a pressure sensor fault       |
//! | Q      | Quit                                 |

mod hardware;

use std::time::{Duration, Instant};

use embassy_futures::block_on;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{
    BinaryColorTheme, OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window,
    sdl2::Keycode,
};
use env_logger::Env;
use log::{error, info};

use leaktest_core::alert::Buzzer;
use leaktest_core::config::ExperimentConfig;
use leaktest_core::display::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX, OledPresenter};
use leaktest_core::rig::{LeakTestRig, halt};
use leaktest_core::sensors::{
    AnalogPressureSource, BridgePressureSource, EnvironmentalPressureSource, PressureSource,
};
use leaktest_core::valve::ValveSwitch;

use hardware::{
    SharedVessel, SimAdc, SimBarometer, SimBridgeBus, SimBuzzerPin, SimValvePin, StdDelay, Vessel,
};

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 2;

/// Time between rig ticks.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
enum SourceKind {
    Analog,
    Environmental,
    Bridge,
}

impl SourceKind {
    fn from_arg(arg: Option<&str>) -> Option<Self> {
        match arg {
            None | Some("analog") => Some(Self::Analog),
            Some("environmental") => Some(Self::Environmental),
            Some("bridge") => Some(Self::Bridge),
            Some(_) => None,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let arg = std::env::args().nth(1);
    let Some(kind) = SourceKind::from_arg(arg.as_deref()) else {
        error!(
            "Unknown pressure source {:?}; expected analog, environmental or bridge",
            arg
        );
        std::process::exit(2);
    };

    info!("Starting leak-test simulator with the {:?} source", kind);
    info!(
        "Display: {}×{} (scale {}×)",
        DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX, WINDOW_SCALE
    );
    info!("Keys: Space=open valve  L=toggle leak  F=toggle sensor fault  Q=Quit");

    let vessel = Vessel::shared();
    match kind {
        SourceKind::Analog => run(
            AnalogPressureSource::new(SimAdc::new(vessel.clone())),
            ExperimentConfig::analog(),
            vessel,
        ),
        SourceKind::Environmental => run(
            EnvironmentalPressureSource::new(SimBarometer::new(vessel.clone())),
            ExperimentConfig::environmental(),
            vessel,
        ),
        SourceKind::Bridge => run(
            BridgePressureSource::new(SimBridgeBus::new(vessel.clone()), StdDelay),
            ExperimentConfig::bridge(),
            vessel,
        ),
    }

    info!("Simulator exiting");
}

fn run<S: PressureSource>(source: S, config: ExperimentConfig, vessel: SharedVessel) {
    let display = SimulatorDisplay::<BinaryColor>::new(Size::new(
        DISPLAY_WIDTH_PX,
        DISPLAY_HEIGHT_PX,
    ));
    let output_settings = OutputSettingsBuilder::new()
        .theme(BinaryColorTheme::OledBlue)
        .scale(WINDOW_SCALE)
        .build();
    let mut window = Window::new("Leak Test Simulator", &output_settings);

    let mut rig = LeakTestRig::new(
        source,
        ValveSwitch::new(SimValvePin::new(vessel.clone())),
        OledPresenter::new(display, S::UNIT),
        Buzzer::new(SimBuzzerPin::default(), StdDelay),
        config,
    );

    if let Err(e) = block_on(rig.init()) {
        halt(e);
    }

    // The SDL window is lazily initialized on the first `update()` call.
    // It must be updated once before `events()` or it will panic.
    window.update(rig.display().display());

    let mut last_advance = Instant::now();

    'running: loop {
        let tick_start = Instant::now();

        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,

                SimulatorEvent::KeyDown {
                    keycode, repeat, ..
                } => match keycode {
                    Keycode::Q | Keycode::Escape => break 'running,
                    Keycode::Space => vessel.borrow_mut().set_valve_open(true),
                    Keycode::L if !repeat => vessel.borrow_mut().toggle_leak(),
                    Keycode::F if !repeat => vessel.borrow_mut().toggle_sensor_fault(),
                    _ => {}
                },

                SimulatorEvent::KeyUp {
                    keycode: Keycode::Space,
                    ..
                } => vessel.borrow_mut().set_valve_open(false),

                _ => {}
            }
        }

        vessel.borrow_mut().advance(last_advance.elapsed());
        last_advance = Instant::now();

        block_on(rig.tick(embassy_time::Instant::now()));
        window.update(rig.display().display());

        let elapsed = tick_start.elapsed();
        if elapsed < TICK_INTERVAL {
            std::thread::sleep(TICK_INTERVAL - elapsed);
        }
    }
}
