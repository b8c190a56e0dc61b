//! Step types for pipeline jobs
//!
//! A step either invokes a reusable action or runs a shell command. The
//! two shapes are separate enum variants so a step can never carry both.

#![allow(clippy::must_use_candidate, clippy::return_self_not_must_use)]

use super::Vars;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a step does
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StepAction {
    /// Reusable action or plugin invocation
    Uses {
        /// Action identifier, e.g. `actions/setup-node@v4`
        id: String,
        /// Named inputs
        #[serde(default, skip_serializing_if = "Vars::is_empty")]
        with: Vars,
    },

    /// Literal shell command or script
    Run {
        /// Command text, possibly multi-line
        command: String,
    },
}

/// One action within a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Action or command
    #[serde(flatten)]
    pub action: StepAction,

    /// Step scoped environment
    #[serde(default, skip_serializing_if = "Vars::is_empty")]
    pub env: Vars,

    /// Conditional expression in the source platform's dialect
    #[serde(default, rename = "if", skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    /// Working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
}

impl Step {
    fn from_action(action: StepAction) -> Self {
        Self {
            name: None,
            action,
            env: Vars::new(),
            condition: None,
            working_directory: None,
        }
    }

    /// Creates a shell command step
    pub fn run(command: impl Into<String>) -> Self {
        Self::from_action(StepAction::Run {
            command: command.into(),
        })
    }

    /// Creates an action invocation step
    pub fn uses(id: impl Into<String>) -> Self {
        Self::from_action(StepAction::Uses {
            id: id.into(),
            with: Vars::new(),
        })
    }

    /// Sets the display name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds an action input. Ignored for run steps.
    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let StepAction::Uses { with, .. } = &mut self.action {
            with.insert(key, value);
        }
        self
    }

    /// Adds a step environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key, value);
        self
    }

    /// Sets the step condition
    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Sets the working directory
    pub fn in_dir(mut self, dir: impl Into<String>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// Shell command, for run steps
    pub fn command(&self) -> Option<&str> {
        match &self.action {
            StepAction::Run { command } => Some(command),
            StepAction::Uses { .. } => None,
        }
    }

    /// Action identifier, for action steps
    pub fn action_id(&self) -> Option<&str> {
        match &self.action {
            StepAction::Uses { id, .. } => Some(id),
            StepAction::Run { .. } => None,
        }
    }

    /// Action inputs; empty for run steps
    pub fn inputs(&self) -> Option<&Vars> {
        match &self.action {
            StepAction::Uses { with, .. } => Some(with),
            StepAction::Run { .. } => None,
        }
    }

    /// True for action steps whose identifier mentions `checkout`
    pub fn is_checkout(&self) -> bool {
        self.action_id().is_some_and(|id| id.contains("checkout"))
    }

    /// True when there is nothing to render
    pub fn is_noop(&self) -> bool {
        match &self.action {
            StepAction::Uses { id, .. } => id.trim().is_empty(),
            StepAction::Run { command } => command.trim().is_empty(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.action {
            StepAction::Uses { id, .. } => write!(f, "uses {id}"),
            StepAction::Run { command } => write!(f, "run {command}"),
        }
    }
}
