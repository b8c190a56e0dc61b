//! Platform generators
//!
//! Each generator renders a [`PipelineConfig`] as the target platform's
//! pipeline text. Generators are pure: the same IR always yields the same
//! bytes.
//!
//! Output is assembled line by line. Every key and value goes through
//! [`scalar`] or [`yaml_value`] so user text can never change the shape of
//! the document.

mod azure;
mod circleci;
mod github_actions;
mod gitlab_ci;
mod jenkins;

pub use azure::AzurePipelinesGenerator;
pub use circleci::CircleCIGenerator;
pub use github_actions::GitHubActionsGenerator;
pub use gitlab_ci::GitLabCIGenerator;
pub use jenkins::JenkinsGenerator;

use crate::pipeline::{ConversionError, Job, PipelineConfig, Platform, Result, Role, Vars};
use serde_yaml::Value;
use std::collections::{HashMap, HashSet};

/// Renders the IR as platform text
pub trait PipelineGenerator {
    /// Platform this generator writes
    fn platform(&self) -> Platform;

    /// Renders `config`.
    ///
    /// # Errors
    ///
    /// Generators for the built-in platforms never fail; the `Result`
    /// leaves room for targets that reject some IR shapes.
    fn generate(&self, config: &PipelineConfig) -> Result<String>;
}

/// Returns the generator for `platform`.
///
/// # Errors
///
/// Returns [`ConversionError::UnsupportedPlatform`] when there is no
/// generator for the platform.
pub fn generator_for(platform: Platform) -> Result<Box<dyn PipelineGenerator>> {
    match platform {
        Platform::GitHub => Ok(Box::new(GitHubActionsGenerator)),
        Platform::GitLab => Ok(Box::new(GitLabCIGenerator)),
        Platform::CircleCI => Ok(Box::new(CircleCIGenerator)),
        Platform::Azure => Ok(Box::new(AzurePipelinesGenerator)),
        Platform::Jenkins => Ok(Box::new(JenkinsGenerator)),
        Platform::Bitbucket => Err(ConversionError::UnsupportedPlatform {
            platform,
            role: Role::Target,
        }),
    }
}

/// Renders `config` as a `platform` pipeline.
///
/// # Errors
///
/// See [`generator_for`].
pub fn generate(platform: Platform, config: &PipelineConfig) -> Result<String> {
    generator_for(platform)?.generate(config)
}

/// Renders a single-line YAML scalar.
///
/// The text is emitted plain when a YAML reader gives it back unchanged
/// as a string, single-quoted otherwise. Text with line breaks or control
/// characters is double-quoted.
pub(crate) fn scalar(value: &str) -> String {
    if value.chars().any(|c| c.is_control() && c != '\t') {
        return double_quoted(value);
    }
    if reads_back_plain(value) {
        value.to_string()
    } else {
        quoted(value)
    }
}

/// Single-quoted YAML scalar.
pub(crate) fn quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn double_quoted(value: &str) -> String {
    // JSON strings are valid YAML double-quoted scalars
    serde_json::to_string(value).unwrap_or_else(|_| quoted(value))
}

fn reads_back_plain(value: &str) -> bool {
    if value.is_empty() || value.trim() != value {
        return false;
    }
    matches!(serde_yaml::from_str::<Value>(value), Ok(Value::String(s)) if s == value)
}

/// Renders the value part of a `key:` or `-` line, including the leading
/// space and the trailing newline.
///
/// Multi-line text becomes a literal block whose lines are indented by
/// `indent` spaces.
pub(crate) fn yaml_value(value: &str, indent: usize) -> String {
    if value.contains('\n') {
        if let Some(block) = literal_block(value, indent) {
            return block;
        }
    }
    format!(" {}\n", scalar(value))
}

/// Renders `value` as a literal block (`|`), choosing the chomping
/// indicator that preserves trailing newlines exactly.
///
/// Returns `None` for text a literal block cannot carry verbatim: a
/// leading indented line, whitespace-only lines or control characters.
pub(crate) fn literal_block(value: &str, indent: usize) -> Option<String> {
    let first_line = value.lines().find(|line| !line.is_empty());
    if first_line.is_some_and(|line| line.starts_with([' ', '\t']))
        || value.lines().any(|line| !line.is_empty() && line.trim().is_empty())
        || value.chars().any(|c| c.is_control() && c != '\n' && c != '\t')
    {
        return None;
    }

    let (indicator, body) = match value.strip_suffix('\n') {
        None => ("|-", value),
        Some(rest) if rest.ends_with('\n') => ("|+", rest),
        Some(rest) => ("|", rest),
    };

    let pad = " ".repeat(indent);
    let mut out = format!(" {indicator}\n");
    for line in body.split('\n') {
        if line.is_empty() {
            out.push('\n');
        } else {
            out.push_str(&pad);
            out.push_str(line);
            out.push('\n');
        }
    }
    Some(out)
}

/// Job identifier accepted by every target: lowercase ASCII letters,
/// digits, `-` and `_`.
pub(crate) fn sanitize_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "job".to_string()
    } else {
        sanitized
    }
}

/// Maps IR job names to the keys a generator writes.
///
/// Keys are sanitized, keywords of the target get a `job` suffix, and
/// names that collide after sanitizing are numbered in job order. Every
/// place a job is named (keys, stages, dependency lists) must go through
/// the same table.
#[derive(Debug)]
pub(crate) struct JobKeys {
    keys: HashMap<String, String>,
    sanitize: fn(&str) -> String,
    reserved: &'static [&'static str],
    separator: char,
}

impl JobKeys {
    /// Table with the default sanitizer and no reserved names.
    pub(crate) fn new(jobs: &[Job]) -> Self {
        Self::with_rules(jobs, sanitize_name, &[], '-')
    }

    pub(crate) fn with_rules(
        jobs: &[Job],
        sanitize: fn(&str) -> String,
        reserved: &'static [&'static str],
        separator: char,
    ) -> Self {
        let mut table = Self {
            keys: HashMap::new(),
            sanitize,
            reserved,
            separator,
        };
        let mut taken = HashSet::new();
        for job in jobs {
            if table.keys.contains_key(&job.name) {
                continue;
            }
            let base = table.base(&job.name);
            let mut key = base.clone();
            let mut n = 2;
            while taken.contains(&key) {
                key = format!("{base}{separator}{n}");
                n += 1;
            }
            taken.insert(key.clone());
            table.keys.insert(job.name.clone(), key);
        }
        table
    }

    fn base(&self, name: &str) -> String {
        let key = (self.sanitize)(name);
        if self.reserved.contains(&key.as_str()) {
            format!("{key}{}job", self.separator)
        } else {
            key
        }
    }

    /// Key for `name`. Names that are not jobs of the pipeline (dangling
    /// references) are sanitized but otherwise kept.
    pub(crate) fn key(&self, name: &str) -> String {
        self.keys
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.base(name))
    }

    /// Keys for a list of job references, in order.
    pub(crate) fn keys(&self, names: &[String]) -> Vec<String> {
        names.iter().map(|name| self.key(name)).collect()
    }
}

/// Writes `key:` followed by one entry per variable, or nothing when
/// `vars` is empty.
pub(crate) fn push_vars(out: &mut String, key: &str, vars: &Vars, indent: usize) {
    if vars.is_empty() {
        return;
    }
    let pad = " ".repeat(indent);
    out.push_str(&format!("{pad}{key}:\n"));
    for (name, value) in vars.iter() {
        out.push_str(&format!(
            "{pad}  {}:{}",
            scalar(name),
            yaml_value(value, indent + 4)
        ));
    }
}

/// Writes `key:` followed by a block sequence, or nothing when `items`
/// is empty.
pub(crate) fn push_list<S: AsRef<str>>(out: &mut String, key: &str, items: &[S], indent: usize) {
    if items.is_empty() {
        return;
    }
    let pad = " ".repeat(indent);
    out.push_str(&format!("{pad}{key}:\n"));
    for item in items {
        out.push_str(&format!("{pad}  - {}\n", scalar(item.as_ref())));
    }
}

/// Appends `item` unless it is already present.
pub(crate) fn push_unique(items: &mut Vec<String>, item: &str) {
    if !items.iter().any(|existing| existing == item) {
        items.push(item.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn read_back(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_plain_scalars_stay_plain() {
        for value in ["npm test", "ubuntu-latest", "node:20", "src/**", "echo 'hi'"] {
            assert_eq!(scalar(value), value);
        }
    }

    #[test]
    fn test_ambiguous_scalars_are_quoted() {
        assert_eq!(scalar("true"), "'true'");
        assert_eq!(scalar("18"), "'18'");
        assert_eq!(scalar(""), "''");
        assert_eq!(scalar("key: value"), "'key: value'");
        assert_eq!(scalar("# note"), "'# note'");
        assert_eq!(scalar("it's: x"), "'it''s: x'");
        assert_eq!(scalar("*"), "'*'");
        assert_eq!(scalar(" padded"), "' padded'");
    }

    #[test]
    fn test_scalars_read_back_verbatim() {
        for value in ["0 3 * * *", "[x]", "{{ checksum }}", "a #b", "- item", "null", "~", "%x"] {
            let doc = format!("k: {}\n", scalar(value));
            assert_eq!(read_back(&doc)["k"], Value::String(value.to_string()), "{value}");
        }
    }

    #[test]
    fn test_literal_block_chomping() {
        assert_eq!(literal_block("a\nb", 2).unwrap(), " |-\n  a\n  b\n");
        assert_eq!(literal_block("a\nb\n", 2).unwrap(), " |\n  a\n  b\n");
        assert_eq!(literal_block("a\n\n", 2).unwrap(), " |+\n  a\n\n");
    }

    #[test]
    fn test_yaml_value_multiline_reads_back() {
        for value in ["make\nmake test", "a\n\nb\n", "a\n\n", "  indented\nline", "x\n   \ny"] {
            let doc = format!("k:{}", yaml_value(value, 2));
            assert_eq!(read_back(&doc)["k"], Value::String(value.to_string()), "{value:?}");
        }
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Build Linux"), "build-linux");
        assert_eq!(sanitize_name("unit_tests"), "unit_tests");
        assert_eq!(sanitize_name("deploy@prod!"), "deploy-prod-");
        assert_eq!(sanitize_name("  "), "job");
    }

    #[test]
    fn test_job_keys_number_collisions() {
        let jobs = [
            Job::new("Build", "ubuntu-latest"),
            Job::new("build", "ubuntu-latest"),
            Job::new("a b", "ubuntu-latest"),
            Job::new("a-b", "ubuntu-latest"),
        ];
        let keys = JobKeys::new(&jobs);
        assert_eq!(keys.key("Build"), "build");
        assert_eq!(keys.key("build"), "build-2");
        assert_eq!(keys.key("a b"), "a-b");
        assert_eq!(keys.key("a-b"), "a-b-2");
        assert_eq!(keys.keys(&["a-b".to_string(), "Missing Job".to_string()]), ["a-b-2", "missing-job"]);
    }

    #[test]
    fn test_job_keys_suffix_reserved_names() {
        let jobs = [Job::new("stages", "ubuntu-latest"), Job::new("stages-job", "ubuntu-latest")];
        let keys = JobKeys::with_rules(&jobs, sanitize_name, &["stages"], '-');
        assert_eq!(keys.key("stages"), "stages-job");
        assert_eq!(keys.key("stages-job"), "stages-job-2");
    }

    #[test]
    fn test_push_vars_and_list() {
        let mut out = String::new();
        push_vars(&mut out, "env", &Vars::new().set("CI", "true").set("A", "b"), 2);
        push_list(&mut out, "needs", &["build"], 2);
        push_list::<&str>(&mut out, "empty", &[], 2);
        assert_eq!(out, "  env:\n    CI: 'true'\n    A: b\n  needs:\n    - build\n");
    }

    #[test]
    fn test_bitbucket_has_no_generator() {
        let err = generate(Platform::Bitbucket, &PipelineConfig::new("x")).unwrap_err();
        assert!(matches!(
            err,
            ConversionError::UnsupportedPlatform { role: Role::Target, .. }
        ));
    }

    #[test]
    fn test_generator_platforms_match() {
        for platform in Platform::ALL.into_iter().filter(|p| p.can_generate()) {
            assert_eq!(generator_for(platform).unwrap().platform(), platform);
        }
    }
}
