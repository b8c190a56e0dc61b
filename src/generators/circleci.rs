//! CircleCI generator
//!
//! Renders the IR as `.circleci/config.yml` (version 2.1) with a single
//! workflow carrying the job dependencies.

use super::{JobKeys, PipelineGenerator, push_list, push_vars, sanitize_name, scalar, yaml_value};
use crate::pipeline::{Job, PipelineConfig, Platform, Result, Step, StepAction, Vars};
use tracing::debug;

/// Executor image for jobs that do not name their own image.
pub const DEFAULT_IMAGE: &str = "cimg/base:stable";

/// Generator for CircleCI configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct CircleCIGenerator;

impl PipelineGenerator for CircleCIGenerator {
    fn platform(&self) -> Platform {
        Platform::CircleCI
    }

    fn generate(&self, config: &PipelineConfig) -> Result<String> {
        let mut yaml = String::from("version: 2.1\n\n");
        yaml.push_str(if config.jobs.is_empty() { "jobs: {}\n" } else { "jobs:\n" });

        let keys = JobKeys::new(&config.jobs);
        for job in &config.jobs {
            push_job(&mut yaml, job, &keys.key(&job.name), &config.environment);
        }

        yaml.push_str("\nworkflows:\n");
        yaml.push_str(&format!("  {}:\n", scalar(&workflow_name(&config.name))));
        yaml.push_str("    jobs:\n");
        for job in &config.jobs {
            let name = scalar(&keys.key(&job.name));
            if job.depends_on.is_empty() {
                yaml.push_str(&format!("      - {name}\n"));
            } else {
                yaml.push_str(&format!("      - {name}:\n"));
                push_list(&mut yaml, "requires", &keys.keys(&job.depends_on), 10);
            }
        }

        debug!(jobs = config.jobs.len(), "generated CircleCI config");
        Ok(yaml)
    }
}

/// `version` is a reserved key under `workflows`.
fn workflow_name(name: &str) -> String {
    match sanitize_name(name).as_str() {
        "job" | "version" => "main".to_string(),
        other => other.to_string(),
    }
}

fn push_job(yaml: &mut String, job: &Job, key: &str, global_env: &Vars) {
    yaml.push_str(&format!("  {}:\n", scalar(key)));

    let image = if job.runs_on_image() { job.runs_on.as_str() } else { DEFAULT_IMAGE };
    yaml.push_str("    docker:\n");
    yaml.push_str(&format!("      - image: {}\n", scalar(image)));
    for service in &job.services {
        yaml.push_str(&format!("      - image: {}\n", scalar(&service.image)));
        push_vars(yaml, "environment", &service.env, 8);
    }

    // CircleCI has no pipeline-level environment
    let environment: Vars = global_env.iter().chain(job.environment.iter()).collect();
    push_vars(yaml, "environment", &environment, 4);

    if job.condition.is_some() {
        debug!(job = %job.name, "CircleCI jobs have no condition, dropping it");
    }

    yaml.push_str("    steps:\n");
    if !job.has_checkout() {
        yaml.push_str("      - checkout\n");
    }
    for step in &job.steps {
        push_step(yaml, job, step);
    }

    for cache in &job.cache {
        yaml.push_str("      - save_cache:\n");
        yaml.push_str(&format!("          key: {}\n", scalar(&cache.key)));
        push_list(yaml, "paths", &cache.paths, 10);
    }

    for artifact in &job.artifacts {
        for path in &artifact.paths {
            yaml.push_str("      - store_artifacts:\n");
            yaml.push_str(&format!("          path: {}\n", scalar(path)));
            yaml.push_str(&format!("          destination: {}\n", scalar(&artifact.name)));
        }
    }
}

fn push_step(yaml: &mut String, job: &Job, step: &Step) {
    match &step.action {
        _ if step.is_noop() => {}
        StepAction::Uses { .. } if step.is_checkout() => yaml.push_str("      - checkout\n"),
        StepAction::Uses { id, with } if is_circleci_command(id) => {
            if step.name.is_some() || !step.env.is_empty() || step.condition.is_some() {
                debug!(job = %job.name, command = %id, "CircleCI commands take parameters only, dropping step options");
            }
            if with.is_empty() {
                yaml.push_str(&format!("      - {}\n", scalar(id)));
            } else {
                yaml.push_str(&format!("      - {}:\n", scalar(id)));
                for (key, value) in with.iter() {
                    yaml.push_str(&format!("          {}:{}", scalar(key), yaml_value(value, 12)));
                }
            }
        }
        StepAction::Uses { id, .. } => {
            debug!(job = %job.name, action = %id, "no CircleCI equivalent for action, dropping it");
        }
        StepAction::Run { command } => {
            yaml.push_str("      - run:\n");
            if let Some(name) = &step.name {
                yaml.push_str(&format!("          name: {}\n", scalar(name)));
            }
            yaml.push_str(&format!("          command:{}", yaml_value(command, 12)));
            push_vars(yaml, "environment", &step.env, 10);
            if let Some(dir) = &step.working_directory {
                yaml.push_str(&format!("          working_directory: {}\n", scalar(dir)));
            }
        }
    }
}

/// Orb commands (`node/install-packages`) and plain command names. GitHub
/// action refs (`owner/repo@v1`) and local actions (`./path`) are not.
fn is_circleci_command(id: &str) -> bool {
    !id.contains('@') && !id.starts_with('.')
}
