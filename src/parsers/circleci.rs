//! CircleCI parser
//!
//! Reads `.circleci/config.yml` (version 2.1). Steps are read in order;
//! `workflows` supply the job dependencies.

use super::{PipelineParser, load_document, service_name_from_image};
use crate::infrastructure::Config;
use crate::pipeline::{
    Artifact, Cache, Job, Node, PipelineConfig, Platform, Result, Service, Step, StepAction,
    Trigger,
};
use tracing::debug;

/// Action used for CircleCI's built-in `checkout` step.
pub(crate) const CHECKOUT_ACTION: &str = "actions/checkout@v4";

/// Parser for CircleCI configuration
#[derive(Debug, Clone)]
pub struct CircleCIParser {
    default_runner: String,
}

impl CircleCIParser {
    /// Creates a parser; jobs without a docker executor get the default runner
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            default_runner: config.default_runner.clone(),
        }
    }

    fn parse_job(&self, name: &str, body: &Node) -> Job {
        let images = body.get("docker").map(Node::items).unwrap_or_default();
        let runs_on = images
            .first()
            .and_then(|entry| entry.str("image"))
            .map_or_else(|| self.default_runner.clone(), str::to_string);

        let mut job = Job::new(name, runs_on);
        job.environment = body.get("environment").map(Node::to_vars).unwrap_or_default();
        job.services = images
            .iter()
            .skip(1)
            .filter_map(|entry| {
                let image = entry.str("image")?;
                let mut service = Service::new(service_name_from_image(image), image);
                service.env = entry.get("environment").map(Node::to_vars).unwrap_or_default();
                Some(service)
            })
            .collect();

        for entry in body.get("steps").map(Node::items).unwrap_or_default() {
            read_step(&mut job, entry);
        }
        job
    }
}

impl PipelineParser for CircleCIParser {
    fn platform(&self) -> Platform {
        Platform::CircleCI
    }

    fn parse(&self, input: &str) -> Result<PipelineConfig> {
        let doc = load_document(Platform::CircleCI, input)?;

        let mut config = PipelineConfig::new("Pipeline").trigger(Trigger::push());
        config.jobs = doc
            .get("jobs")
            .into_iter()
            .flat_map(Node::entries)
            .filter(|(_, body)| body.is_mapping())
            .map(|(name, body)| self.parse_job(name, body))
            .collect();

        apply_workflow_requires(&mut config, &doc);

        debug!(jobs = config.jobs.len(), "parsed CircleCI config");
        Ok(config)
    }
}

/// Projects one positional step entry into the job.
fn read_step(job: &mut Job, entry: &Node) {
    match entry {
        Node::Scalar(command) if command == "checkout" => {
            job.steps.push(Step::uses(CHECKOUT_ACTION).named("Checkout"));
        }
        Node::Scalar(command) => job.steps.push(Step::uses(command.as_str())),
        Node::Mapping(_) => {
            for (kind, body) in entry.entries() {
                read_step_entry(job, kind, body);
            }
        }
        _ => {}
    }
}

fn read_step_entry(job: &mut Job, kind: &str, body: &Node) {
    match kind {
        "run" => {
            let step = match body {
                Node::Scalar(command) => Step::run(command.as_str()),
                _ => Step {
                    name: body.str("name").map(str::to_string),
                    action: StepAction::Run {
                        command: body.str("command").unwrap_or_default().to_string(),
                    },
                    env: body.get("environment").map(Node::to_vars).unwrap_or_default(),
                    condition: None,
                    working_directory: body.str("working_directory").map(str::to_string),
                },
            };
            job.steps.push(step);
        }
        "checkout" => job.steps.push(Step::uses(CHECKOUT_ACTION).named("Checkout")),
        "save_cache" => {
            let paths = body.get("paths").map(Node::string_list).unwrap_or_default();
            let key = body.str("key").unwrap_or("default").to_string();
            job.cache.push(Cache { key, paths });
        }
        "store_artifacts" => {
            let Some(path) = body.str("path") else {
                return;
            };
            let name = body.str("destination").unwrap_or("artifacts");
            match job.artifacts.iter_mut().find(|a| a.name == name) {
                Some(artifact) => artifact.paths.push(path.to_string()),
                None => job.artifacts.push(Artifact {
                    name: name.to_string(),
                    paths: vec![path.to_string()],
                }),
            }
        }
        "restore_cache" | "persist_to_workspace" | "attach_workspace" => {
            debug!(step = kind, job = %job.name, "skipping CircleCI workspace/cache step");
        }
        // Orb commands and other reusable commands
        other => {
            let mut step = Step::uses(other);
            if let StepAction::Uses { with, .. } = &mut step.action {
                *with = body.to_vars();
            }
            job.steps.push(step);
        }
    }
}

/// Reads `workflows.<name>.jobs[].<job>.requires` into `depends_on`.
fn apply_workflow_requires(config: &mut PipelineConfig, doc: &Node) {
    let workflows = doc
        .get("workflows")
        .into_iter()
        .flat_map(Node::entries)
        .filter(|(name, _)| *name != "version");

    for (_, workflow) in workflows {
        for entry in workflow.get("jobs").map(Node::items).unwrap_or_default() {
            for (name, settings) in entry.entries() {
                let requires = settings.get("requires").map(Node::string_list).unwrap_or_default();
                if let Some(job) = config.jobs.iter_mut().find(|job| job.name == name) {
                    for dep in requires {
                        if !job.depends_on.contains(&dep) {
                            job.depends_on.push(dep);
                        }
                    }
                }
            }
        }
    }
}
