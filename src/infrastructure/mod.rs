//! Infrastructure layer
//!
//! Configuration loading and logging setup shared by the library and the
//! command line tool.

mod config;
mod logging;

pub use config::{Config, ConfigError, FILE_NAME, LOG_LEVEL_ENV};
pub use logging::init_logging;
