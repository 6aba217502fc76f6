//! Logging utilities.
//!
//! This module centralizes logger initialization. Everything else in the crate
//! writes through the standard `log` facade; GL driver messages use the `gl`
//! target so they can be filtered independently.

mod init;


pub use init::{init_logging, LoggingConfig};
