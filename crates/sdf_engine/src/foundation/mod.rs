//! Foundation utilities shared by every engine subsystem
//!
//! Math types, logging setup, and small helpers with no dependency on
//! the rest of the engine.

pub mod logging;
pub mod math;
