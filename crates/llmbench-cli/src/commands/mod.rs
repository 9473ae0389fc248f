//! Front-end commands

pub mod devices;
pub mod interactive;
pub mod run;

pub use run::{run_devices, RunOptions};
