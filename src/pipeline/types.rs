//! Core types for the pipeline IR
//!
//! This module contains the platform-neutral structure of a CI/CD
//! pipeline: triggers, jobs and what jobs own.

#![allow(clippy::must_use_candidate, clippy::return_self_not_must_use)]

use super::{Step, Vars};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Root of the IR
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    /// Display name
    pub name: String,

    /// What starts a run
    #[serde(default)]
    pub triggers: Vec<Trigger>,

    /// Pipeline wide environment
    #[serde(default, skip_serializing_if = "Vars::is_empty")]
    pub environment: Vars,

    /// Jobs in declaration order
    #[serde(default)]
    pub jobs: Vec<Job>,
}

impl PipelineConfig {
    /// Creates an empty pipeline
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a trigger
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    /// Adds a job
    pub fn job(mut self, job: Job) -> Self {
        self.jobs.push(job);
        self
    }

    /// Looks a job up by name
    pub fn find_job(&self, name: &str) -> Option<&Job> {
        self.jobs.iter().find(|job| job.name == name)
    }

    /// Total number of steps over all jobs
    pub fn step_count(&self) -> usize {
        self.jobs.iter().map(|job| job.steps.len()).sum()
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pipeline({}): {} jobs, {} steps",
            if self.name.is_empty() { "unnamed" } else { &self.name },
            self.jobs.len(),
            self.step_count()
        )
    }
}

/// Kind of event that starts a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// Commits pushed to a branch
    Push,
    /// Pull or merge request activity
    PullRequest,
    /// Cron schedule
    Schedule,
    /// Started by hand
    Manual,
}

/// A condition under which the pipeline runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    /// Trigger kind
    #[serde(rename = "type")]
    pub kind: TriggerKind,

    /// Branch patterns (push and pull request)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,

    /// Path patterns (push and pull request)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,

    /// Cron expression (schedule)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
}

impl Trigger {
    fn of(kind: TriggerKind) -> Self {
        Self {
            kind,
            branches: Vec::new(),
            paths: Vec::new(),
            cron: None,
        }
    }

    /// Push trigger on any branch
    pub fn push() -> Self {
        Self::of(TriggerKind::Push)
    }

    /// Pull request trigger on any branch
    pub fn pull_request() -> Self {
        Self::of(TriggerKind::PullRequest)
    }

    /// Cron schedule trigger
    pub fn schedule(cron: impl Into<String>) -> Self {
        Self {
            cron: Some(cron.into()),
            ..Self::of(TriggerKind::Schedule)
        }
    }

    /// Manual trigger
    pub fn manual() -> Self {
        Self::of(TriggerKind::Manual)
    }

    /// Restricts to branch patterns
    pub fn with_branches<I, S>(mut self, branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.branches = branches.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts to path patterns
    pub fn with_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths = paths.into_iter().map(Into::into).collect();
        self
    }
}

/// A named unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job name
    pub name: String,

    /// Runner label or container image
    pub runs_on: String,

    /// Jobs that must finish first, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    /// Job scoped environment
    #[serde(default, skip_serializing_if = "Vars::is_empty")]
    pub environment: Vars,

    /// Sidecar containers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<Service>,

    /// Steps in execution order
    #[serde(default)]
    pub steps: Vec<Step>,

    /// Files kept after the job
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,

    /// Cached directories
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cache: Vec<Cache>,

    /// Conditional expression, copied through untranslated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl Job {
    /// Creates a job with no steps
    pub fn new(name: impl Into<String>, runs_on: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            runs_on: runs_on.into(),
            depends_on: Vec::new(),
            environment: Vars::new(),
            services: Vec::new(),
            steps: Vec::new(),
            artifacts: Vec::new(),
            cache: Vec::new(),
            condition: None,
        }
    }

    /// Appends a step
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Adds a dependency
    pub fn needs(mut self, job: impl Into<String>) -> Self {
        self.depends_on.push(job.into());
        self
    }

    /// Sets the condition
    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// True when `runs_on` looks like a container image rather than a runner label
    pub fn runs_on_image(&self) -> bool {
        self.runs_on.contains('/') || self.runs_on.contains(':')
    }

    /// True when some step already checks out the repository
    pub fn has_checkout(&self) -> bool {
        self.steps.iter().any(Step::is_checkout)
    }
}

/// Sidecar container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Service name (hostname in most platforms)
    pub name: String,
    /// Container image
    pub image: String,
    /// Port specs such as `5432:5432`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    /// Container environment
    #[serde(default, skip_serializing_if = "Vars::is_empty")]
    pub env: Vars,
}

impl Service {
    /// Creates a service with no ports or env
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            ports: Vec::new(),
            env: Vars::new(),
        }
    }
}

/// Files to persist after a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Artifact name
    pub name: String,
    /// Path globs
    pub paths: Vec<String>,
}

/// Directories cached between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cache {
    /// Cache key expression
    pub key: String,
    /// Path globs
    pub paths: Vec<String>,
}
