//! Logger setup for binaries embedding the context.
//!
//! The library itself only talks to the `log` facade.

mod init;

pub use init::{init_logging, LoggingConfig};
