//! Typed document tree for structured pipeline sources
//!
//! Parsers never index into raw YAML values. They walk a [`Node`] whose
//! accessors return `None` (or an empty slice) when a key is missing or
//! has the wrong shape.

use super::Vars;
use serde_yaml::Value;

/// A mapping, sequence or scalar from a decoded document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Explicit null or empty value
    Null,
    /// String, number or boolean, kept in its textual form
    Scalar(String),
    /// Ordered list
    Sequence(Vec<Node>),
    /// Mapping with keys in document order
    Mapping(Vec<(String, Node)>),
}

impl Node {
    /// Decodes YAML text. Merge keys (`<<`) are resolved first.
    ///
    /// # Errors
    ///
    /// Returns the decoder error when the text is not valid YAML.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        let mut value: Value = serde_yaml::from_str(text)?;
        value.apply_merge()?;
        Ok(Self::from(value))
    }

    /// Value under `key`, if this is a mapping containing it
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Scalar text
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Scalar text under `key`
    #[must_use]
    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Node::as_str)
    }

    /// Sequence items; empty when this is not a sequence
    #[must_use]
    pub fn items(&self) -> &[Node] {
        match self {
            Self::Sequence(items) => items,
            _ => &[],
        }
    }

    /// Mapping entries in document order; empty when this is not a mapping
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Node)> {
        let entries: &[(String, Node)] = match self {
            Self::Mapping(entries) => entries,
            _ => &[],
        };
        entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// True for mappings
    #[must_use]
    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping(_))
    }

    /// Reads a scalar or a sequence of scalars as a list of strings.
    ///
    /// Both `needs: build` and `needs: [build, lint]` are common, so a
    /// lone scalar is treated as a one element list.
    #[must_use]
    pub fn string_list(&self) -> Vec<String> {
        match self {
            Self::Scalar(s) => vec![s.clone()],
            Self::Sequence(items) => items
                .iter()
                .filter_map(Node::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Reads a mapping of scalars. Entries with nested values are skipped.
    #[must_use]
    pub fn to_vars(&self) -> Vars {
        self.entries()
            .filter_map(|(k, v)| match v {
                Self::Scalar(s) => Some((k, s.as_str())),
                Self::Null => Some((k, "")),
                _ => None,
            })
            .collect()
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        _ => None,
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Sequence(items) => Self::Sequence(items.into_iter().map(Self::from).collect()),
            Value::Mapping(mapping) => Self::Mapping(
                mapping
                    .into_iter()
                    .filter_map(|(k, v)| scalar_text(&k).map(|k| (k, Self::from(v))))
                    .collect(),
            ),
            Value::Tagged(tagged) => Self::from(tagged.value),
            scalar => Self::Scalar(scalar_text(&scalar).unwrap_or_default()),
        }
    }
}
