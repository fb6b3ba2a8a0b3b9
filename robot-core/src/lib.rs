#![no_std]

// Control core for a small differential-drive robot.
//
// Every component here is hardware-agnostic: sensors, actuators, the binding
// store and the operator console are reached through traits so the same logic
// runs on the MCU firmware and inside the host emulator.

pub mod clock;
pub mod commands;
pub mod config;
pub mod decoder;
pub mod drive;
pub mod executor;
pub mod input;
pub mod line_follow;
pub mod robot;
pub mod safety;
pub mod scheduler;
pub mod status;
pub mod telemetry;
