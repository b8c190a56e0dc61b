//! # pipeconv - CI/CD pipeline conversion
//!
//! pipeconv reads a pipeline definition written for one CI/CD platform,
//! projects it onto a platform-neutral model and renders that model for
//! another platform.
//!
//! ## Quick Start
//!
//! ```
//! use pipeconv::{Converter, Platform};
//!
//! let workflow = "
//! name: CI
//! on: push
//! jobs:
//!   build:
//!     runs-on: ubuntu-latest
//!     steps:
//!       - uses: actions/checkout@v4
//!       - run: npm test
//! ";
//!
//! let gitlab = Converter::new()
//!     .convert_str(Platform::GitHub, Platform::GitLab, workflow)
//!     .unwrap();
//! assert!(gitlab.contains("- npm test"));
//! ```
//!
//! ## Platforms
//!
//! | Platform | Parse | Generate |
//! |---|---|---|
//! | GitHub Actions | yes | yes |
//! | GitLab CI | yes | yes |
//! | CircleCI | yes | yes |
//! | Jenkins (declarative, `sh` steps) | yes | yes |
//! | Azure Pipelines | no | yes |
//! | Bitbucket Pipelines | no | no |
//!
//! ## Layout
//!
//! - [`pipeline`]: the model (`PipelineConfig`, `Job`, `Step`, ...), platforms and errors
//! - [`parsers`]: platform text to model
//! - [`generators`]: model to platform text
//! - [`converter`]: parse, generate and file I/O in one call
//! - [`infrastructure`]: configuration and logging

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod converter;
pub mod generators;
pub mod infrastructure;
pub mod parsers;
pub mod pipeline;

// Prelude module for common imports
pub mod prelude;

// Re-export commonly used types
pub use converter::{ConversionReport, Converter};
pub use generators::{PipelineGenerator, generator_for};
pub use infrastructure::{Config, ConfigError, init_logging};
pub use parsers::{PipelineParser, parser_for};
pub use pipeline::{
    Artifact, Cache, ConversionError, Environment, Job, Node, PipelineConfig, Platform, Result,
    Role, Service, Step, StepAction, Trigger, TriggerKind, Vars, detect_platform,
};

/// Version of the pipeconv crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
