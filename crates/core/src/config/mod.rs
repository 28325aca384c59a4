//! Configuration for the withdrawal monitor.
//!
//! This module provides:
//! - Runtime configuration (target vault, state gateway, timing, failure policy)
//! - TOML file loading with `${VAR}` expansion
//! - Environment variable overrides

pub mod env;
mod monitor;

pub use monitor::{LogFormat, MonitorConfig};
