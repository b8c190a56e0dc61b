//! Azure Pipelines generator
//!
//! Renders the IR as `azure-pipelines.yml`: one stage holding one job per
//! IR job, so `dependsOn` and `condition` apply at stage level.

use super::{
    JobKeys, PipelineGenerator, literal_block, push_list, push_unique, push_vars, sanitize_name,
    scalar, yaml_value,
};
use crate::pipeline::{Job, PipelineConfig, Platform, Result, Step, StepAction, Trigger, TriggerKind};
use tracing::debug;

/// Hosted agent image used for every job.
const VM_IMAGE: &str = "ubuntu-latest";

/// Generator for Azure Pipelines
#[derive(Debug, Clone, Copy, Default)]
pub struct AzurePipelinesGenerator;

impl PipelineGenerator for AzurePipelinesGenerator {
    fn platform(&self) -> Platform {
        Platform::Azure
    }

    fn generate(&self, config: &PipelineConfig) -> Result<String> {
        let mut yaml = String::new();

        push_branch_trigger(&mut yaml, "trigger", &config.triggers, TriggerKind::Push);
        push_branch_trigger(&mut yaml, "pr", &config.triggers, TriggerKind::PullRequest);
        push_schedules(&mut yaml, &config.triggers);
        if config.triggers.iter().any(|t| t.kind == TriggerKind::Manual) {
            debug!("Azure runs can always be queued by hand, dropping manual trigger");
        }
        yaml.push('\n');

        if !config.environment.is_empty() {
            push_vars(&mut yaml, "variables", &config.environment, 0);
            yaml.push('\n');
        }

        yaml.push_str(&format!("pool:\n  vmImage: {VM_IMAGE}\n\n"));

        if config.jobs.is_empty() {
            yaml.push_str("stages: []\n");
        } else {
            yaml.push_str("stages:\n");
        }
        let keys = JobKeys::with_rules(&config.jobs, azure_identifier, &[], '_');
        for job in &config.jobs {
            push_stage(&mut yaml, job, &keys);
        }

        debug!(jobs = config.jobs.len(), "generated Azure Pipelines config");
        Ok(yaml)
    }
}

/// `trigger:` and `pr:` share a shape. A missing push trigger disables CI
/// runs; a missing pull request trigger leaves Azure's default in place.
fn push_branch_trigger(yaml: &mut String, key: &str, triggers: &[Trigger], kind: TriggerKind) {
    let matching: Vec<&Trigger> = triggers.iter().filter(|t| t.kind == kind).collect();
    if matching.is_empty() {
        if kind == TriggerKind::Push {
            yaml.push_str(&format!("{key}: none\n"));
        }
        return;
    }

    let mut branches = Vec::new();
    let mut paths = Vec::new();
    for trigger in &matching {
        trigger.branches.iter().for_each(|b| push_unique(&mut branches, b));
        trigger.paths.iter().for_each(|p| push_unique(&mut paths, p));
    }
    // A trigger without branch filters fires on every branch
    if branches.is_empty() || matching.iter().any(|t| t.branches.is_empty()) {
        branches = vec!["*".to_string()];
    }

    yaml.push_str(&format!("{key}:\n  branches:\n"));
    push_list(yaml, "include", &branches, 4);
    if !paths.is_empty() {
        yaml.push_str("  paths:\n");
        push_list(yaml, "include", &paths, 4);
    }
}

fn push_schedules(yaml: &mut String, triggers: &[Trigger]) {
    let schedules: Vec<(&Trigger, &str)> = triggers
        .iter()
        .filter(|t| t.kind == TriggerKind::Schedule)
        .filter_map(|t| t.cron.as_deref().map(|cron| (t, cron)))
        .collect();
    if schedules.is_empty() {
        return;
    }

    yaml.push_str("schedules:\n");
    for (i, (trigger, cron)) in schedules.into_iter().enumerate() {
        yaml.push_str(&format!("  - cron: {}\n", scalar(cron)));
        yaml.push_str(&format!("    displayName: Schedule {}\n", i + 1));
        if !trigger.branches.is_empty() {
            yaml.push_str("    branches:\n");
            push_list(yaml, "include", &trigger.branches, 6);
        }
        yaml.push_str("    always: true\n");
    }
}

/// Stage and job names may only hold letters, digits and `_`.
fn azure_identifier(name: &str) -> String {
    sanitize_name(name).replace('-', "_")
}

fn push_stage(yaml: &mut String, job: &Job, keys: &JobKeys) {
    let name = scalar(&keys.key(&job.name));
    yaml.push_str(&format!("  - stage: {name}\n"));

    // Without dependsOn a stage waits for the one before it
    let depends_on = keys.keys(&job.depends_on);
    if depends_on.is_empty() {
        yaml.push_str("    dependsOn: []\n");
    } else {
        push_list(yaml, "dependsOn", &depends_on, 4);
    }

    if let Some(condition) = &job.condition {
        yaml.push_str(&format!("    condition:{}", yaml_value(condition, 6)));
    }

    yaml.push_str("    jobs:\n");
    yaml.push_str(&format!("      - job: {name}\n"));
    if job.runs_on_image() {
        yaml.push_str(&format!("        container: {}\n", scalar(&job.runs_on)));
    }
    push_vars(yaml, "variables", &job.environment, 8);
    if !job.services.is_empty() {
        debug!(job = %job.name, "Azure service containers need a resources block, dropping services");
    }

    yaml.push_str("        steps:\n");
    yaml.push_str("          - checkout: self\n");
    for step in &job.steps {
        push_step(yaml, job, step);
    }
}

fn push_step(yaml: &mut String, job: &Job, step: &Step) {
    let StepAction::Run { command } = &step.action else {
        if !step.is_checkout() {
            debug!(job = %job.name, step = %step, "no Azure equivalent for action, dropping it");
        }
        return;
    };
    if step.is_noop() {
        return;
    }

    let mut script = command.clone();
    if !script.ends_with('\n') {
        script.push('\n');
    }
    let block = literal_block(&script, 14).unwrap_or_else(|| yaml_value(command, 14));
    yaml.push_str(&format!("          - script:{block}"));

    if let Some(name) = &step.name {
        yaml.push_str(&format!("            displayName: {}\n", scalar(name)));
    }
    if let Some(dir) = &step.working_directory {
        yaml.push_str(&format!("            workingDirectory: {}\n", scalar(dir)));
    }
    if let Some(condition) = &step.condition {
        yaml.push_str(&format!("            condition:{}", yaml_value(condition, 14)));
    }
    push_vars(yaml, "env", &step.env, 12);
}
