//! Logging setup.
//!
//! The engine logs through the `log` facade; `env_logger` is the backend
//! installed by [`init_logging`].

mod init;

pub use init::{DEFAULT_FILTER, LoggingConfig, init_logging, resolve_filter};
