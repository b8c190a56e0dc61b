//! Jenkinsfile generator
//!
//! Renders the IR as a declarative pipeline: one stage per job, one `sh`
//! per shell step. Action steps have no Jenkins counterpart and are left
//! out.

use super::PipelineGenerator;
use crate::pipeline::{Job, PipelineConfig, Platform, Result, Step, StepAction, Vars};
use tracing::debug;

/// Generator for Jenkins declarative pipelines
#[derive(Debug, Clone, Copy, Default)]
pub struct JenkinsGenerator;

impl PipelineGenerator for JenkinsGenerator {
    fn platform(&self) -> Platform {
        Platform::Jenkins
    }

    fn generate(&self, config: &PipelineConfig) -> Result<String> {
        let mut jenkinsfile = String::from("pipeline {\n    agent any\n\n");

        if !config.environment.is_empty() {
            push_environment(&mut jenkinsfile, &config.environment, 1);
            jenkinsfile.push('\n');
        }

        jenkinsfile.push_str("    stages {\n");
        for (i, job) in config.jobs.iter().enumerate() {
            if i > 0 {
                jenkinsfile.push('\n');
            }
            push_stage(&mut jenkinsfile, job);
        }
        jenkinsfile.push_str("    }\n}\n");

        debug!(stages = config.jobs.len(), "generated Jenkinsfile");
        Ok(jenkinsfile)
    }
}

fn indent(level: usize) -> String {
    "    ".repeat(level)
}

/// Escapes text for a Groovy single-quoted string.
fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}

fn push_environment(out: &mut String, vars: &Vars, level: usize) {
    let pad = indent(level);
    out.push_str(&format!("{pad}environment {{\n"));
    for (key, value) in vars.iter() {
        out.push_str(&format!("{pad}    {key} = '{}'\n", escape(value)));
    }
    out.push_str(&format!("{pad}}}\n"));
}

fn push_stage(out: &mut String, job: &Job) {
    out.push_str(&format!("        stage('{}') {{\n", escape(&job.name)));

    if job.runs_on_image() {
        out.push_str("            agent {\n                docker {\n");
        out.push_str(&format!("                    image '{}'\n", escape(&job.runs_on)));
        out.push_str("                }\n            }\n");
    }
    if let Some(condition) = &job.condition {
        let condition = condition.split_whitespace().collect::<Vec<_>>().join(" ");
        out.push_str(&format!("            // condition: {condition}\n"));
    }
    if !job.depends_on.is_empty() {
        out.push_str(&format!(
            "            // needs: {}\n",
            job.depends_on.join(", ")
        ));
    }
    if !job.environment.is_empty() {
        push_environment(out, &job.environment, 3);
    }

    out.push_str("            steps {\n");
    let mut rendered = 0;
    for step in &job.steps {
        if push_step(out, job, step) {
            rendered += 1;
        }
    }
    if rendered == 0 {
        out.push_str("                echo 'no steps to run'\n");
    }
    out.push_str("            }\n        }\n");
}

/// Writes one step; returns whether anything was written.
fn push_step(out: &mut String, job: &Job, step: &Step) -> bool {
    let StepAction::Run { command } = &step.action else {
        debug!(job = %job.name, step = %step, "no Jenkins equivalent for action, dropping it");
        return false;
    };
    if step.is_noop() {
        return false;
    }

    let mut level = 4;
    let mut closers = Vec::new();
    if let Some(dir) = &step.working_directory {
        out.push_str(&format!("{}dir('{}') {{\n", indent(level), escape(dir)));
        closers.push(level);
        level += 1;
    }
    if !step.env.is_empty() {
        let entries: Vec<String> = step
            .env
            .iter()
            .map(|(key, value)| format!("'{}'", escape(&format!("{key}={value}"))))
            .collect();
        out.push_str(&format!("{}withEnv([{}]) {{\n", indent(level), entries.join(", ")));
        closers.push(level);
        level += 1;
    }

    push_sh(out, command, level);

    for level in closers.into_iter().rev() {
        out.push_str(&format!("{}}}\n", indent(level)));
    }
    true
}

fn push_sh(out: &mut String, command: &str, level: usize) {
    let pad = indent(level);
    let command = command.trim_end_matches('\n');
    if !command.contains('\n') {
        out.push_str(&format!("{pad}sh '{}'\n", escape(command)));
        return;
    }

    out.push_str(&format!("{pad}sh '''\n"));
    for line in command.lines() {
        if line.trim().is_empty() {
            out.push('\n');
        } else {
            out.push_str(&format!("{pad}    {}\n", escape(line)));
        }
    }
    out.push_str(&format!("{pad}'''\n"));
}
