//! Supported CI/CD platforms and path-based detection

use super::errors::ConversionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A CI/CD system the converter knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// GitHub Actions workflows
    GitHub,
    /// GitLab CI (`.gitlab-ci.yml`)
    GitLab,
    /// CircleCI (`.circleci/config.yml`)
    CircleCI,
    /// Jenkins declarative pipelines (`Jenkinsfile`)
    Jenkins,
    /// Azure Pipelines (`azure-pipelines.yml`)
    Azure,
    /// Bitbucket Pipelines (`bitbucket-pipelines.yml`)
    Bitbucket,
}

/// Top-level `.gitlab-ci.yml` keys that configure the pipeline rather
/// than define a job.
pub(crate) const GITLAB_KEYWORDS: &[&str] = &[
    "stages",
    "variables",
    "image",
    "default",
    "include",
    "workflow",
    "cache",
    "services",
    "before_script",
    "after_script",
];

/// Which side of a conversion a platform was requested for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Platform being parsed
    Source,
    /// Platform being generated
    Target,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Target => write!(f, "target"),
        }
    }
}

impl Platform {
    /// Every platform, in the order they are listed to users.
    pub const ALL: [Self; 6] = [
        Self::GitHub,
        Self::GitLab,
        Self::CircleCI,
        Self::Jenkins,
        Self::Azure,
        Self::Bitbucket,
    ];

    /// Short identifier used on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::GitLab => "gitlab",
            Self::CircleCI => "circleci",
            Self::Jenkins => "jenkins",
            Self::Azure => "azure",
            Self::Bitbucket => "bitbucket",
        }
    }

    /// Human readable product name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::GitHub => "GitHub Actions",
            Self::GitLab => "GitLab CI",
            Self::CircleCI => "CircleCI",
            Self::Jenkins => "Jenkins",
            Self::Azure => "Azure Pipelines",
            Self::Bitbucket => "Bitbucket Pipelines",
        }
    }

    /// Conventional locations of this platform's pipeline file, most common first.
    #[must_use]
    pub fn default_paths(self) -> &'static [&'static str] {
        match self {
            Self::GitHub => &[".github/workflows/ci.yml", ".github/workflows/main.yml"],
            Self::GitLab => &[".gitlab-ci.yml"],
            Self::CircleCI => &[".circleci/config.yml"],
            Self::Jenkins => &["Jenkinsfile"],
            Self::Azure => &["azure-pipelines.yml"],
            Self::Bitbucket => &["bitbucket-pipelines.yml"],
        }
    }

    /// Path a converted pipeline is written to when none is given.
    #[must_use]
    pub fn default_output_path(self) -> &'static str {
        self.default_paths()[0]
    }

    /// Whether a parser exists for this platform.
    #[must_use]
    pub fn can_parse(self) -> bool {
        matches!(
            self,
            Self::GitHub | Self::GitLab | Self::CircleCI | Self::Jenkins
        )
    }

    /// Whether a generator exists for this platform.
    #[must_use]
    pub fn can_generate(self) -> bool {
        !matches!(self, Self::Bitbucket)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "github" | "github-actions" | "gha" => Ok(Self::GitHub),
            "gitlab" | "gitlab-ci" => Ok(Self::GitLab),
            "circleci" | "circle" => Ok(Self::CircleCI),
            "jenkins" => Ok(Self::Jenkins),
            "azure" | "azure-pipelines" => Ok(Self::Azure),
            "bitbucket" => Ok(Self::Bitbucket),
            _ => Err(ConversionError::UnknownPlatform(s.to_string())),
        }
    }
}

/// Path fragments checked by [`detect_platform`], in precedence order.
const DETECTION_RULES: [(&str, Platform); 6] = [
    (".github/workflows", Platform::GitHub),
    (".gitlab-ci", Platform::GitLab),
    ("Jenkinsfile", Platform::Jenkins),
    (".circleci", Platform::CircleCI),
    ("azure-pipelines", Platform::Azure),
    ("bitbucket-pipelines", Platform::Bitbucket),
];

/// Infers the platform of a pipeline file from its path.
///
/// Backslashes are normalised to `/` first. The rules are tried in order
/// and the first fragment contained in the path wins, so
/// `.github/workflows/Jenkinsfile.yml` is GitHub, not Jenkins.
#[must_use]
pub fn detect_platform(path: impl AsRef<Path>) -> Option<Platform> {
    let normalized = path.as_ref().to_string_lossy().replace('\\', "/");
    DETECTION_RULES
        .iter()
        .find(|(fragment, _)| normalized.contains(fragment))
        .map(|(_, platform)| *platform)
}
