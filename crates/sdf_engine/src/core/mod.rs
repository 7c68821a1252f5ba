//! Core engine services
//!
//! Currently just configuration; engine-wide services that are neither
//! math nor physics land here.

pub mod config;

pub use config::{ConfigError, SimulationConfig};
