//! GitHub Actions parser
//!
//! Reads workflow YAML (`.github/workflows/*.yml`) into the IR.

use super::{PipelineParser, load_document};
use crate::infrastructure::Config;
use crate::pipeline::{
    Job, Node, PipelineConfig, Platform, Result, Service, Step, StepAction, Trigger,
};
use tracing::debug;

/// Parser for GitHub Actions workflows
#[derive(Debug, Clone)]
pub struct GitHubActionsParser {
    default_runner: String,
}

impl GitHubActionsParser {
    /// Creates a parser; jobs without `runs-on` get the configured default runner
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            default_runner: config.default_runner.clone(),
        }
    }

    fn parse_job(&self, name: &str, body: &Node) -> Job {
        let runs_on = body
            .get("runs-on")
            .and_then(|node| node.string_list().into_iter().next())
            .unwrap_or_else(|| self.default_runner.clone());

        let mut job = Job::new(name, runs_on);
        job.depends_on = body.get("needs").map(Node::string_list).unwrap_or_default();
        job.condition = body.str("if").map(str::to_string);
        job.environment = body.get("env").map(Node::to_vars).unwrap_or_default();
        job.services = body
            .get("services")
            .into_iter()
            .flat_map(Node::entries)
            .map(|(name, svc)| parse_service(name, svc))
            .collect();
        job.steps = body
            .get("steps")
            .map(Node::items)
            .unwrap_or_default()
            .iter()
            .filter(|node| node.is_mapping())
            .map(parse_step)
            .collect();
        job
    }
}

impl PipelineParser for GitHubActionsParser {
    fn platform(&self) -> Platform {
        Platform::GitHub
    }

    fn parse(&self, input: &str) -> Result<PipelineConfig> {
        let doc = load_document(Platform::GitHub, input)?;

        let mut config = PipelineConfig::new(doc.str("name").unwrap_or_default());
        config.triggers = doc.get("on").map(parse_triggers).unwrap_or_default();
        config.environment = doc.get("env").map(Node::to_vars).unwrap_or_default();
        config.jobs = doc
            .get("jobs")
            .into_iter()
            .flat_map(Node::entries)
            .filter(|(_, body)| body.is_mapping())
            .map(|(name, body)| self.parse_job(name, body))
            .collect();

        debug!(
            jobs = config.jobs.len(),
            triggers = config.triggers.len(),
            "parsed GitHub Actions workflow"
        );
        Ok(config)
    }
}

/// `on` may be a single event, a list of events or a mapping of event to filters.
fn parse_triggers(on: &Node) -> Vec<Trigger> {
    match on {
        Node::Scalar(event) => trigger_for_event(event, &Node::Null),
        Node::Sequence(events) => events
            .iter()
            .filter_map(Node::as_str)
            .flat_map(|event| trigger_for_event(event, &Node::Null))
            .collect(),
        Node::Mapping(_) => on
            .entries()
            .flat_map(|(event, body)| trigger_for_event(event, body))
            .collect(),
        Node::Null => Vec::new(),
    }
}

fn trigger_for_event(event: &str, body: &Node) -> Vec<Trigger> {
    match event {
        "push" => vec![with_filters(Trigger::push(), body)],
        "pull_request" | "pull_request_target" => vec![with_filters(Trigger::pull_request(), body)],
        "schedule" => body
            .items()
            .iter()
            .filter_map(|entry| entry.str("cron"))
            .map(Trigger::schedule)
            .collect(),
        "workflow_dispatch" => vec![Trigger::manual()],
        other => {
            debug!(event = other, "skipping GitHub event with no IR equivalent");
            Vec::new()
        }
    }
}

fn with_filters(trigger: Trigger, body: &Node) -> Trigger {
    let branches = body.get("branches").map(Node::string_list).unwrap_or_default();
    let paths = body.get("paths").map(Node::string_list).unwrap_or_default();
    trigger.with_branches(branches).with_paths(paths)
}

fn parse_service(name: &str, body: &Node) -> Service {
    let image = body
        .as_str()
        .or_else(|| body.str("image"))
        .unwrap_or_default();
    let mut service = Service::new(name, image);
    service.ports = body.get("ports").map(Node::string_list).unwrap_or_default();
    service.env = body.get("env").map(Node::to_vars).unwrap_or_default();
    service
}

fn parse_step(node: &Node) -> Step {
    let action = match (node.str("uses"), node.str("run")) {
        (Some(id), _) => StepAction::Uses {
            id: id.to_string(),
            with: node.get("with").map(Node::to_vars).unwrap_or_default(),
        },
        (None, Some(command)) => StepAction::Run {
            command: command.to_string(),
        },
        // Neither key: kept as an empty command so generators skip it
        (None, None) => StepAction::Run {
            command: String::new(),
        },
    };

    Step {
        name: node.str("name").map(str::to_string),
        action,
        env: node.get("env").map(Node::to_vars).unwrap_or_default(),
        condition: node.str("if").map(str::to_string),
        working_directory: node.str("working-directory").map(str::to_string),
    }
}
