//! Prelude module for common imports

// Model
pub use crate::pipeline::{
    Artifact, Cache, ConversionError, Environment, Job, PipelineConfig, Platform, Role, Service,
    Step, StepAction, Trigger, TriggerKind, Vars, detect_platform,
};

// Conversion
pub use crate::converter::{ConversionReport, Converter};
pub use crate::generators::{PipelineGenerator, generate, generator_for};
pub use crate::infrastructure::Config;
pub use crate::parsers::{PipelineParser, parse, parser_for};
