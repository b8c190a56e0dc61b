//! Platform parsers
//!
//! Each parser turns one platform's pipeline text into a [`PipelineConfig`].
//! Parsers are independent of each other and of the generators.

mod circleci;
mod github_actions;
mod gitlab_ci;
mod jenkins;

pub use circleci::CircleCIParser;
pub use github_actions::GitHubActionsParser;
pub use gitlab_ci::GitLabCIParser;
pub use jenkins::JenkinsParser;

use crate::infrastructure::Config;
use crate::pipeline::{ConversionError, Node, PipelineConfig, Platform, Result, Role};

/// Turns platform text into the IR
pub trait PipelineParser {
    /// Platform this parser reads
    fn platform(&self) -> Platform;

    /// Parses `input`. Either the whole document is projected or an error
    /// is returned; there is no partial result.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::MalformedInput`] when the text cannot be decoded.
    fn parse(&self, input: &str) -> Result<PipelineConfig>;
}

/// Returns the parser for `platform`.
///
/// # Errors
///
/// Returns [`ConversionError::UnsupportedPlatform`] for platforms that are
/// generator targets only.
pub fn parser_for(platform: Platform, config: &Config) -> Result<Box<dyn PipelineParser>> {
    match platform {
        Platform::GitHub => Ok(Box::new(GitHubActionsParser::new(config))),
        Platform::GitLab => Ok(Box::new(GitLabCIParser::new(config))),
        Platform::CircleCI => Ok(Box::new(CircleCIParser::new(config))),
        Platform::Jenkins => Ok(Box::new(JenkinsParser::new(config))),
        Platform::Azure | Platform::Bitbucket => Err(ConversionError::UnsupportedPlatform {
            platform,
            role: Role::Source,
        }),
    }
}

/// Parses `input` as a `platform` pipeline.
///
/// # Errors
///
/// See [`parser_for`] and [`PipelineParser::parse`].
pub fn parse(platform: Platform, input: &str, config: &Config) -> Result<PipelineConfig> {
    parser_for(platform, config)?.parse(input)
}

/// Decodes a YAML document whose root must be a mapping. An empty
/// document is an empty mapping.
pub(crate) fn load_document(platform: Platform, input: &str) -> Result<Node> {
    let node = Node::from_yaml(input)
        .map_err(|source| ConversionError::MalformedInput { platform, source })?;
    match node {
        Node::Null => Ok(Node::Mapping(Vec::new())),
        node if node.is_mapping() => Ok(node),
        _ => Err(ConversionError::malformed(
            platform,
            "expected a mapping at the document root",
        )),
    }
}

/// Derives a service name from an image reference: `library/postgres:15` → `postgres`.
pub(crate) fn service_name_from_image(image: &str) -> String {
    let last = image.rsplit('/').next().unwrap_or(image);
    last.split([':', '@']).next().unwrap_or(last).to_string()
}
