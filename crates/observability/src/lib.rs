//! # voxwire-observability
//!
//! Structured Logging fuer Voxwire via tracing-subscriber (Text oder JSON).

pub mod logging;

pub use logging::{logging_initialisieren, LogFormat};
