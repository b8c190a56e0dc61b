//! GitHub Actions generator
//!
//! Renders the IR as a workflow file for `.github/workflows/`.

use super::{JobKeys, PipelineGenerator, push_list, push_unique, push_vars, scalar, yaml_value};
use crate::pipeline::{
    Job, PipelineConfig, Platform, Result, Service, Step, StepAction, Trigger, TriggerKind,
};
use tracing::debug;

/// Checkout action inserted into jobs that do not check out the repository.
pub const CHECKOUT_ACTION: &str = "actions/checkout@v4";

/// Runner used for jobs whose `runs_on` is a container image.
const IMAGE_RUNNER: &str = "ubuntu-latest";

/// Generator for GitHub Actions workflows
#[derive(Debug, Clone, Copy, Default)]
pub struct GitHubActionsGenerator;

impl PipelineGenerator for GitHubActionsGenerator {
    fn platform(&self) -> Platform {
        Platform::GitHub
    }

    fn generate(&self, config: &PipelineConfig) -> Result<String> {
        let mut yaml = String::new();

        let name = if config.name.is_empty() { "CI" } else { &config.name };
        yaml.push_str(&format!("name: {}\n\n", scalar(name)));

        push_triggers(&mut yaml, &config.triggers);
        yaml.push('\n');

        if !config.environment.is_empty() {
            push_vars(&mut yaml, "env", &config.environment, 0);
            yaml.push('\n');
        }

        yaml.push_str("jobs:\n");
        let keys = JobKeys::new(&config.jobs);
        for (i, job) in config.jobs.iter().enumerate() {
            if i > 0 {
                yaml.push('\n');
            }
            push_job(&mut yaml, job, &keys);
        }

        debug!(jobs = config.jobs.len(), "generated GitHub Actions workflow");
        Ok(yaml)
    }
}

/// Events are grouped: all push triggers share one `push` entry, all
/// schedules one `schedule` list. No triggers renders the same as a single
/// unfiltered push trigger.
fn push_triggers(yaml: &mut String, triggers: &[Trigger]) {
    let default_push = [Trigger::push()];
    let triggers = if triggers.is_empty() { &default_push[..] } else { triggers };

    yaml.push_str("on:\n");
    for (kind, event) in [
        (TriggerKind::Push, "push"),
        (TriggerKind::PullRequest, "pull_request"),
    ] {
        let matching: Vec<&Trigger> = triggers.iter().filter(|t| t.kind == kind).collect();
        if matching.is_empty() {
            continue;
        }
        let mut branches = Vec::new();
        let mut paths = Vec::new();
        for trigger in matching {
            trigger.branches.iter().for_each(|b| push_unique(&mut branches, b));
            trigger.paths.iter().for_each(|p| push_unique(&mut paths, p));
        }
        yaml.push_str(&format!("  {event}:\n"));
        push_list(yaml, "branches", &branches, 4);
        push_list(yaml, "paths", &paths, 4);
    }

    let crons: Vec<&str> = triggers
        .iter()
        .filter(|t| t.kind == TriggerKind::Schedule)
        .filter_map(|t| t.cron.as_deref())
        .collect();
    if !crons.is_empty() {
        yaml.push_str("  schedule:\n");
        for cron in crons {
            yaml.push_str(&format!("    - cron: {}\n", scalar(cron)));
        }
    }

    if triggers.iter().any(|t| t.kind == TriggerKind::Manual) {
        yaml.push_str("  workflow_dispatch:\n");
    }
}

fn push_job(yaml: &mut String, job: &Job, keys: &JobKeys) {
    yaml.push_str(&format!("  {}:\n", scalar(&keys.key(&job.name))));

    if job.runs_on_image() {
        yaml.push_str(&format!("    # converted from container image: {}\n", job.runs_on));
        yaml.push_str(&format!("    runs-on: {IMAGE_RUNNER}\n"));
    } else {
        yaml.push_str(&format!("    runs-on: {}\n", scalar(&job.runs_on)));
    }

    push_list(yaml, "needs", &keys.keys(&job.depends_on), 4);

    if let Some(condition) = &job.condition {
        yaml.push_str(&format!("    if:{}", yaml_value(condition, 6)));
    }

    push_vars(yaml, "env", &job.environment, 4);

    if !job.services.is_empty() {
        yaml.push_str("    services:\n");
        for service in &job.services {
            push_service(yaml, service);
        }
    }

    yaml.push_str("    steps:\n");
    if !job.has_checkout() {
        yaml.push_str(&format!("      - uses: {CHECKOUT_ACTION}\n"));
    }
    for step in job.steps.iter().filter(|step| !step.is_noop()) {
        push_step(yaml, step);
    }
}

fn push_service(yaml: &mut String, service: &Service) {
    yaml.push_str(&format!("      {}:\n", scalar(&service.name)));
    yaml.push_str(&format!("        image: {}\n", scalar(&service.image)));
    push_list(yaml, "ports", &service.ports, 8);
    push_vars(yaml, "env", &service.env, 8);
}

/// Writes one `- ...` step item. The first key carries the dash.
fn push_step(yaml: &mut String, step: &Step) {
    let mut lines = Vec::new();

    if let Some(name) = &step.name {
        lines.push(format!("name: {}\n", scalar(name)));
    }
    match &step.action {
        StepAction::Uses { id, with } => {
            lines.push(format!("uses: {}\n", scalar(id)));
            if !with.is_empty() {
                let mut block = String::new();
                push_vars(&mut block, "with", with, 8);
                lines.push(block.trim_start().to_string());
            }
        }
        StepAction::Run { command } => {
            lines.push(format!("run:{}", yaml_value(command, 10)));
        }
    }
    if let Some(condition) = &step.condition {
        lines.push(format!("if:{}", yaml_value(condition, 10)));
    }
    if let Some(dir) = &step.working_directory {
        lines.push(format!("working-directory: {}\n", scalar(dir)));
    }
    if !step.env.is_empty() {
        let mut block = String::new();
        push_vars(&mut block, "env", &step.env, 8);
        lines.push(block.trim_start().to_string());
    }

    for (i, line) in lines.iter().enumerate() {
        yaml.push_str(if i == 0 { "      - " } else { "        " });
        yaml.push_str(line);
    }
}
