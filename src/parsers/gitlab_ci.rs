//! GitLab CI parser
//!
//! Reads `.gitlab-ci.yml`. Every top-level key that is not a global
//! keyword is a job.

use super::{PipelineParser, load_document, service_name_from_image};
use crate::infrastructure::Config;
use crate::pipeline::platform::GITLAB_KEYWORDS;
use crate::pipeline::{
    Artifact, Cache, Job, Node, PipelineConfig, Platform, Result, Service, Step, Trigger, Vars,
};
use tracing::debug;

/// Parser for GitLab CI configuration
#[derive(Debug, Clone)]
pub struct GitLabCIParser {
    default_runner: String,
    default_branch: String,
}

impl GitLabCIParser {
    /// Creates a parser using the configured runner and default branch
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            default_runner: config.default_runner.clone(),
            default_branch: config.default_branch.clone(),
        }
    }

    fn parse_job(&self, name: &str, body: &Node, defaults: &Node) -> Job {
        let runs_on = body
            .get("image")
            .or_else(|| defaults.get("image"))
            .and_then(image_name)
            .unwrap_or_else(|| self.default_runner.clone());

        let mut job = Job::new(name, runs_on);

        let before = body
            .get("before_script")
            .or_else(|| defaults.get("before_script"));
        job.steps = before
            .into_iter()
            .chain(body.get("script"))
            .flat_map(script_lines)
            .map(Step::run)
            .collect();

        job.depends_on = body
            .get("needs")
            .map(Node::items)
            .unwrap_or_default()
            .iter()
            .filter_map(|need| need.as_str().or_else(|| need.str("job")))
            .map(str::to_string)
            .collect();

        job.condition = body
            .get("rules")
            .map(Node::items)
            .unwrap_or_default()
            .iter()
            .find_map(|rule| rule.str("if"))
            .map(str::to_string);

        job.environment = body.get("variables").map(variables).unwrap_or_default();

        job.services = body
            .get("services")
            .map(Node::items)
            .unwrap_or_default()
            .iter()
            .filter_map(parse_service)
            .collect();

        if let Some(artifacts) = body.get("artifacts") {
            let paths = artifacts.get("paths").map(Node::string_list).unwrap_or_default();
            if !paths.is_empty() {
                let name = artifacts
                    .str("name")
                    .map_or_else(|| format!("{name}-artifacts"), str::to_string);
                job.artifacts.push(Artifact { name, paths });
            }
        }

        job.cache = match body.get("cache") {
            Some(Node::Sequence(entries)) => entries.iter().filter_map(parse_cache).collect(),
            Some(entry) => parse_cache(entry).into_iter().collect(),
            None => Vec::new(),
        };

        job
    }
}

impl PipelineParser for GitLabCIParser {
    fn platform(&self) -> Platform {
        Platform::GitLab
    }

    fn parse(&self, input: &str) -> Result<PipelineConfig> {
        let doc = load_document(Platform::GitLab, input)?;

        // Top-level image/before_script act like `default:` entries
        let defaults = match doc.get("default") {
            Some(default) if default.is_mapping() => default.clone(),
            _ => doc.clone(),
        };

        let mut config = PipelineConfig::new("Pipeline")
            .trigger(Trigger::push().with_branches([self.default_branch.clone()]));
        config.environment = doc.get("variables").map(variables).unwrap_or_default();

        for (key, body) in doc.entries() {
            if GITLAB_KEYWORDS.contains(&key) || key.starts_with('.') {
                continue;
            }
            if !body.is_mapping() {
                debug!(key, "skipping non-job top-level key");
                continue;
            }
            config.jobs.push(self.parse_job(key, body, &defaults));
        }

        debug!(jobs = config.jobs.len(), "parsed GitLab CI config");
        Ok(config)
    }
}

/// `script` is a string or a list whose entries may themselves be lists
/// (the result of YAML anchors).
fn script_lines(node: &Node) -> Vec<String> {
    match node {
        Node::Scalar(line) => vec![line.clone()],
        Node::Sequence(items) => items
            .iter()
            .flat_map(|item| match item {
                Node::Sequence(_) => item.string_list(),
                _ => item.as_str().map(str::to_string).into_iter().collect(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// `image: node:20` or `image: { name: node:20 }`
fn image_name(node: &Node) -> Option<String> {
    node.as_str()
        .or_else(|| node.str("name"))
        .map(str::to_string)
}

/// Variables are plain values or `{ value, description }` mappings.
fn variables(node: &Node) -> Vars {
    node.entries()
        .filter_map(|(key, value)| {
            value
                .as_str()
                .or_else(|| value.str("value"))
                .map(|value| (key, value))
        })
        .collect()
}

fn parse_service(node: &Node) -> Option<Service> {
    let image = image_name(node)?;
    let name = node
        .str("alias")
        .map_or_else(|| service_name_from_image(&image), str::to_string);
    let mut service = Service::new(name, image);
    service.env = node.get("variables").map(variables).unwrap_or_default();
    Some(service)
}

fn parse_cache(node: &Node) -> Option<Cache> {
    let paths = node.get("paths").map(Node::string_list).unwrap_or_default();
    if paths.is_empty() {
        return None;
    }
    let key = node.str("key").unwrap_or("default").to_string();
    Some(Cache { key, paths })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> PipelineConfig {
        GitLabCIParser::new(&Config::default()).parse(input).unwrap()
    }

    const CONFIG: &str = r#"
stages: [build, test, deploy]
variables:
  NODE_ENV: test
  DEPLOY_TOKEN:
    value: abc
    description: token
image: node:20
.template: &tpl
  tags: [docker]
build:
  <<: *tpl
  stage: build
  before_script:
    - npm ci
  script:
    - npm run build
  artifacts:
    name: dist
    paths: [dist/]
  cache:
    key: npm
    paths: [node_modules/]
test:
  stage: test
  image: { name: "node:18" }
  needs: [build]
  services:
    - postgres:15
    - name: redis:7
      alias: cache
  script: npm test
  rules:
    - when: manual
    - if: '$CI_COMMIT_BRANCH == "main"'
    - if: '$CI_PIPELINE_SOURCE == "schedule"'
deploy:
  stage: deploy
  needs:
    - job: test
  script:
    - ./deploy.sh
"#;

    #[test]
    fn test_jobs_exclude_reserved_and_hidden_keys() {
        let config = parse(CONFIG);
        let names: Vec<_> = config.jobs.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["build", "test", "deploy"]);
    }

    #[test]
    fn test_default_trigger_and_variables() {
        let config = parse(CONFIG);
        assert_eq!(config.name, "Pipeline");
        assert_eq!(config.triggers, vec![Trigger::push().with_branches(["main"])]);
        assert_eq!(config.environment.get("NODE_ENV"), Some("test"));
        assert_eq!(config.environment.get("DEPLOY_TOKEN"), Some("abc"));
    }

    #[test]
    fn test_script_lines_become_run_steps() {
        let config = parse(CONFIG);
        let build: Vec<_> = config.jobs[0].steps.iter().filter_map(Step::command).collect();
        assert_eq!(build, vec!["npm ci", "npm run build"]);

        let test: Vec<_> = config.jobs[1].steps.iter().filter_map(Step::command).collect();
        assert_eq!(test, vec!["npm test"]);
    }

    #[test]
    fn test_needs_in_both_forms() {
        let config = parse(CONFIG);
        assert_eq!(config.jobs[1].depends_on, vec!["build"]);
        assert_eq!(config.jobs[2].depends_on, vec!["test"]);
    }

    #[test]
    fn test_first_rule_if_is_condition() {
        let config = parse(CONFIG);
        assert_eq!(
            config.jobs[1].condition.as_deref(),
            Some("$CI_COMMIT_BRANCH == \"main\"")
        );
        assert!(config.jobs[0].condition.is_none());
    }

    #[test]
    fn test_image_becomes_runs_on() {
        let config = parse(CONFIG);
        assert_eq!(config.jobs[0].runs_on, "node:20");
        assert_eq!(config.jobs[1].runs_on, "node:18");

        let bare = parse("build:\n  script: [make]\n");
        assert_eq!(bare.jobs[0].runs_on, "ubuntu-latest");
    }

    #[test]
    fn test_services_artifacts_cache() {
        let config = parse(CONFIG);
        let services = &config.jobs[1].services;
        assert_eq!(services[0].name, "postgres");
        assert_eq!(services[1].name, "cache");
        assert_eq!(services[1].image, "redis:7");

        assert_eq!(
            config.jobs[0].artifacts,
            vec![Artifact { name: "dist".into(), paths: vec!["dist/".into()] }]
        );
        assert_eq!(
            config.jobs[0].cache,
            vec![Cache { key: "npm".into(), paths: vec!["node_modules/".into()] }]
        );
    }

    #[test]
    fn test_nested_script_lists_are_flattened() {
        let config = parse(
            ".setup: &setup\n  - apt-get update\n  - apt-get install -y jq\njob:\n  script:\n    - *setup\n    - jq --version\n",
        );
        let lines: Vec<_> = config.jobs[0].steps.iter().filter_map(Step::command).collect();
        assert_eq!(lines, vec!["apt-get update", "apt-get install -y jq", "jq --version"]);
    }

    #[test]
    fn test_malformed_yaml_is_error() {
        let result = GitLabCIParser::new(&Config::default()).parse("build: {script: [");
        assert!(result.is_err());
    }
}
