//! GitLab CI generator
//!
//! Renders the IR as `.gitlab-ci.yml`. Every job gets a stage of its own,
//! listed in declaration order; ordering between jobs comes from `needs`.

use super::{JobKeys, PipelineGenerator, push_list, push_vars, sanitize_name, scalar, yaml_value};
use crate::pipeline::platform::GITLAB_KEYWORDS;
use crate::pipeline::{Job, PipelineConfig, Platform, Result, Step, StepAction, Vars};
use tracing::debug;

/// Script line emitted for jobs with nothing to run, since GitLab rejects
/// jobs without a script.
const EMPTY_SCRIPT: &str = "echo 'no steps to run'";

/// Generator for GitLab CI configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct GitLabCIGenerator;

impl PipelineGenerator for GitLabCIGenerator {
    fn platform(&self) -> Platform {
        Platform::GitLab
    }

    fn generate(&self, config: &PipelineConfig) -> Result<String> {
        let mut yaml = String::new();

        if !config.environment.is_empty() {
            push_vars(&mut yaml, "variables", &config.environment, 0);
            yaml.push('\n');
        }

        // Jobs named after a global keyword get a `-job` suffix
        let keys = JobKeys::with_rules(&config.jobs, sanitize_name, GITLAB_KEYWORDS, '-');
        let stages: Vec<String> = config.jobs.iter().map(|job| keys.key(&job.name)).collect();
        push_list(&mut yaml, "stages", &stages, 0);

        for job in &config.jobs {
            yaml.push('\n');
            push_job(&mut yaml, job, &keys);
        }

        debug!(jobs = config.jobs.len(), "generated GitLab CI config");
        Ok(yaml)
    }
}

fn push_job(yaml: &mut String, job: &Job, keys: &JobKeys) {
    let name = scalar(&keys.key(&job.name));
    yaml.push_str(&format!("{name}:\n"));
    yaml.push_str(&format!("  stage: {name}\n"));

    if job.runs_on_image() {
        yaml.push_str(&format!("  image: {}\n", scalar(&job.runs_on)));
    }

    push_list(yaml, "needs", &keys.keys(&job.depends_on), 2);

    if let Some(condition) = &job.condition {
        yaml.push_str("  rules:\n");
        yaml.push_str(&format!("    - if:{}", yaml_value(condition, 8)));
    }

    push_vars(yaml, "variables", &job.environment, 2);

    if !job.services.is_empty() {
        yaml.push_str("  services:\n");
        for service in &job.services {
            yaml.push_str(&format!("    - name: {}\n", scalar(&service.image)));
            yaml.push_str(&format!("      alias: {}\n", scalar(&service.name)));
            push_vars(yaml, "variables", &service.env, 6);
            if !service.ports.is_empty() {
                debug!(service = %service.name, "GitLab services expose ports implicitly, dropping port list");
            }
        }
    }

    let mut script: Vec<String> = job.steps.iter().filter_map(|step| script_line(job, step)).collect();
    if script.is_empty() {
        script.push(EMPTY_SCRIPT.to_string());
    }
    yaml.push_str("  script:\n");
    for line in &script {
        yaml.push_str(&format!("    -{}", yaml_value(line, 6)));
    }

    if let Some(first) = job.artifacts.first() {
        let paths: Vec<&str> = job
            .artifacts
            .iter()
            .flat_map(|artifact| artifact.paths.iter().map(String::as_str))
            .collect();
        yaml.push_str("  artifacts:\n");
        yaml.push_str(&format!("    name: {}\n", scalar(&first.name)));
        push_list(yaml, "paths", &paths, 4);
    }

    if !job.cache.is_empty() {
        yaml.push_str("  cache:\n");
        for cache in &job.cache {
            yaml.push_str(&format!("    - key: {}\n", scalar(&cache.key)));
            push_list(yaml, "paths", &cache.paths, 6);
        }
    }
}

/// Shell line for one step, or `None` when the step has no GitLab
/// equivalent.
fn script_line(job: &Job, step: &Step) -> Option<String> {
    if step.is_noop() {
        return None;
    }
    if !step.env.is_empty() || step.condition.is_some() {
        debug!(job = %job.name, step = %step, "GitLab script lines carry no env or condition, dropping them");
    }
    match &step.action {
        StepAction::Run { command } => Some(match &step.working_directory {
            Some(dir) => format!("cd {} && {command}", shell_words::quote(dir)),
            None => command.clone(),
        }),
        StepAction::Uses { id, with } => {
            let line = action_command(id, with);
            if line.is_none() {
                debug!(job = %job.name, action = %id, "dropping checkout, GitLab clones the repository itself");
            }
            line
        }
    }
}

/// Shell equivalent of a well-known action.
fn action_command(id: &str, with: &Vars) -> Option<String> {
    if id.contains("checkout") {
        return None;
    }
    if id.contains("setup-node") {
        let version = with.get("node-version").unwrap_or("18");
        return Some(format!("nvm install {version} && nvm use {version}"));
    }
    if id.contains("setup-python") {
        let version = with.get("python-version").unwrap_or("3.11");
        return Some(format!("pyenv install {version} && pyenv global {version}"));
    }
    if id.contains("setup-go") {
        return Some("# Go setup - use a Go image for this job".to_string());
    }
    Some(format!("# Action: {id} (manual conversion needed)"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Artifact, Cache, Service};
    use pretty_assertions::assert_eq;
    use serde_yaml::Value;

    fn generate(config: &PipelineConfig) -> String {
        GitLabCIGenerator.generate(config).unwrap()
    }

    fn read(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_checkout_dropped_and_run_kept() {
        let config = PipelineConfig::new("CI").job(
            Job::new("build", "ubuntu-latest")
                .step(Step::uses("actions/checkout@v4"))
                .step(Step::run("npm test")),
        );
        assert_eq!(
            generate(&config),
            "stages:\n  - build\n\nbuild:\n  stage: build\n  script:\n    - npm test\n"
        );
    }

    #[test]
    fn test_stages_follow_job_order() {
        let config = PipelineConfig::new("CI")
            .job(Job::new("lint", "ubuntu-latest").step(Step::run("make lint")))
            .job(Job::new("build", "ubuntu-latest").step(Step::run("make")))
            .job(Job::new("test", "ubuntu-latest").needs("build").step(Step::run("make test")));
        let doc = read(&generate(&config));
        assert_eq!(doc["stages"], read("[lint, build, test]"));
        assert_eq!(doc["test"]["needs"], read("[build]"));
        assert_eq!(doc["test"]["stage"], "test");
    }

    #[test]
    fn test_action_table() {
        let config = PipelineConfig::new("CI").job(
            Job::new("build", "ubuntu-latest")
                .step(Step::uses("actions/setup-node@v4").with_input("node-version", "20"))
                .step(Step::uses("actions/setup-python@v5"))
                .step(Step::uses("actions/setup-go@v5"))
                .step(Step::uses("docker/login-action@v3")),
        );
        let doc = read(&generate(&config));
        let script = &doc["build"]["script"];
        assert_eq!(script[0], "nvm install 20 && nvm use 20");
        assert_eq!(script[1], "pyenv install 3.11 && pyenv global 3.11");
        assert!(script[2].as_str().unwrap().starts_with("# Go setup"));
        assert_eq!(script[3], "# Action: docker/login-action@v3 (manual conversion needed)");
    }

    #[test]
    fn test_empty_job_gets_placeholder_script() {
        let config = PipelineConfig::new("CI")
            .job(Job::new("noop", "ubuntu-latest").step(Step::uses("actions/checkout@v4")));
        let doc = read(&generate(&config));
        assert_eq!(doc["noop"]["script"], read("[\"echo 'no steps to run'\"]"));
    }

    #[test]
    fn test_image_rules_variables() {
        let mut job = Job::new("test", "node:20")
            .when("$CI_COMMIT_BRANCH == \"main\"")
            .step(Step::run("npm test").in_dir("web"));
        job.environment = Vars::new().set("NODE_ENV", "test");
        let config = PipelineConfig {
            environment: Vars::new().set("GLOBAL", "1"),
            ..PipelineConfig::new("CI").job(job)
        };
        let doc = read(&generate(&config));
        assert_eq!(doc["variables"]["GLOBAL"], "1");
        let test = &doc["test"];
        assert_eq!(test["image"], "node:20");
        assert_eq!(test["rules"][0]["if"], "$CI_COMMIT_BRANCH == \"main\"");
        assert_eq!(test["variables"]["NODE_ENV"], "test");
        assert_eq!(test["script"][0], "cd web && npm test");
    }

    #[test]
    fn test_services_artifacts_cache() {
        let mut job = Job::new("build", "ubuntu-latest").step(Step::run("make"));
        job.services.push(Service::new("db", "postgres:15"));
        job.artifacts.push(Artifact { name: "dist".into(), paths: vec!["dist/".into()] });
        job.artifacts.push(Artifact { name: "logs".into(), paths: vec!["logs/".into()] });
        job.cache.push(Cache { key: "npm".into(), paths: vec!["node_modules/".into()] });

        let doc = read(&generate(&PipelineConfig::new("CI").job(job)));
        let build = &doc["build"];
        assert_eq!(build["services"][0]["name"], "postgres:15");
        assert_eq!(build["services"][0]["alias"], "db");
        assert_eq!(build["artifacts"]["name"], "dist");
        assert_eq!(build["artifacts"]["paths"], read("[dist/, logs/]"));
        assert_eq!(build["cache"][0]["key"], "npm");
    }

    #[test]
    fn test_keyword_job_names_are_suffixed() {
        let config = PipelineConfig::new("CI")
            .job(Job::new("stages", "ubuntu-latest").step(Step::run("make")))
            .job(Job::new("image", "ubuntu-latest").needs("stages").step(Step::run("make image")));
        let doc = read(&generate(&config));
        assert_eq!(doc["stages"], read("[stages-job, image-job]"));
        assert_eq!(doc["stages-job"]["stage"], "stages-job");
        assert_eq!(doc["image-job"]["needs"], read("[stages-job]"));
        assert!(doc.get("image").is_none());
    }

    #[test]
    fn test_colliding_job_names_get_distinct_keys() {
        let config = PipelineConfig::new("CI")
            .job(Job::new("a b", "ubuntu-latest").step(Step::run("make")))
            .job(Job::new("a-b", "ubuntu-latest").needs("a b").step(Step::run("make test")));
        let doc = read(&generate(&config));
        assert_eq!(doc["stages"], read("[a-b, a-b-2]"));
        assert_eq!(doc["a-b-2"]["needs"], read("[a-b]"));
    }

    #[test]
    fn test_working_directory_is_shell_quoted() {
        let config = PipelineConfig::new("CI").job(
            Job::new("build", "ubuntu-latest")
                .step(Step::run("make").in_dir("my app"))
                .step(Step::run("ls").in_dir("web")),
        );
        let doc = read(&generate(&config));
        assert_eq!(doc["build"]["script"][0], "cd 'my app' && make");
        assert_eq!(doc["build"]["script"][1], "cd web && ls");
    }

    #[test]
    fn test_multiline_script_item() {
        let config = PipelineConfig::new("CI")
            .job(Job::new("build", "ubuntu-latest").step(Step::run("./configure\nmake\n")));
        let doc = read(&generate(&config));
        assert_eq!(doc["build"]["script"][0], "./configure\nmake\n");
    }
}
