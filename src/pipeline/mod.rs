//! Pipeline intermediate representation
//!
//! Every parser produces a [`PipelineConfig`] and every generator consumes
//! one. The types here are plain values with no knowledge of any platform.

pub mod document;
pub mod errors;
pub mod platform;
pub mod steps;
pub mod types;


use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use document::Node;
pub use errors::{ConversionError, Result};
pub use platform::{Platform, Role, detect_platform};
pub use steps::{Step, StepAction};
pub use types::{Artifact, Cache, Job, PipelineConfig, Service, Trigger, TriggerKind};

/// Insertion-ordered string map with unique keys.
///
/// Used for environments and action inputs, so that generated output keeps
/// the order the variables had in the source document. Two maps are equal
/// only when they hold the same entries in the same order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vars(IndexMap<String, String>);

/// Pipeline and job level environment variables.
pub type Environment = Vars;

impl Vars {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a variable, builder style.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts a variable. An existing key keeps its position and gets the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Gets a variable by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for Vars {
    fn eq(&self, other: &Self) -> bool {
        self.0.iter().eq(other.0.iter())
    }
}

impl Eq for Vars {}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Vars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
