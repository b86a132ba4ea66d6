//! Hardware-independent core library for the leak-test rig
//!
//! This crate contains all platform-agnostic logic of the pneumatic leak-test
//! bench: pressure acquisition strategies, the running-median filter, the
//! Start/Pump/Run/Success/Fail experiment state machine, the alert scheduler,
//! the OLED status layout, and the rig loop that ties them together once per
//! sampling tick.
//!
//! It is `#![no_std]` so it compiles on embedded targets and on desktop hosts
//! (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

pub mod alert;
pub mod config;
pub mod display;
pub mod experiment;
pub mod filter;
pub mod rig;
pub mod sensors;
pub mod valve;

#[cfg(test)]
mod test_support;
