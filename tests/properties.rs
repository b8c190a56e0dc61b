//! Property tests for parse/generate round trips.
//!
//! Each strategy builds pipelines restricted to what the platform can
//! express, so `parse(generate(p)) == p` must hold exactly.

use pipeconv::{
    Config, Job, PipelineConfig, Platform, Step, StepAction, Trigger, Vars, generators, parsers,
};
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::sample::{select, subsequence};
use serde_yaml::Value;

/// Top-level GitLab keywords; jobs named after them are renamed on output.
const GITLAB_KEYWORDS: [&str; 10] = [
    "stages",
    "variables",
    "image",
    "default",
    "include",
    "workflow",
    "cache",
    "services",
    "before_script",
    "after_script",
];

fn job_name() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-z][a-z0-9]{0,8}",
        1 => select(GITLAB_KEYWORDS.to_vec()).prop_map(str::to_string),
    ]
}

fn job_names() -> impl Strategy<Value = Vec<String>> {
    vec(job_name(), 1..5).prop_map(|names| {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        unique
    })
}

/// Name GitLab output uses for `name`.
fn gitlab_key(name: &str) -> String {
    if GITLAB_KEYWORDS.contains(&name) {
        format!("{name}-job")
    } else {
        name.to_string()
    }
}

/// `config` as GitLab hands it back: keyword job names renamed everywhere.
fn gitlab_renamed(mut config: PipelineConfig) -> PipelineConfig {
    for job in &mut config.jobs {
        job.name = gitlab_key(&job.name);
        job.depends_on = job.depends_on.iter().map(|d| gitlab_key(d)).collect();
    }
    config
}

/// Orb command steps, with or without parameters.
fn orb_step() -> impl Strategy<Value = Step> {
    ("[a-z]{1,6}/[a-z][a-z-]{0,12}[a-z]", env_vars()).prop_map(|(id, with)| {
        let mut step = Step::uses(id);
        if let StepAction::Uses { with: inputs, .. } = &mut step.action {
            *inputs = with;
        }
        step
    })
}

/// Multi-line shell script: unindented first line, nested lines below.
fn script() -> impl Strategy<Value = String> {
    vec(("( {2}| {4})?", "[a-z][ -~]{0,15}"), 2..5).prop_map(|lines| {
        lines
            .into_iter()
            .enumerate()
            .map(|(i, (indent, text))| if i == 0 { text } else { format!("{indent}{text}") })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

fn command() -> impl Strategy<Value = String> {
    "[a-z]([a-z0-9 ./_=-]{0,24}[a-z0-9])?"
}

fn env_vars() -> impl Strategy<Value = Vars> {
    vec(("[A-Z][A-Z0-9_]{0,6}", "[a-z0-9.-]{1,10}"), 0..3).prop_map(|pairs| pairs.into_iter().collect())
}

/// Jobs with run steps; each job may depend on any earlier job.
fn jobs(runs_on: &'static str) -> impl Strategy<Value = Vec<Job>> {
    job_names()
        .prop_filter("at least one job", |names| !names.is_empty())
        .prop_flat_map(move |names| {
            let count = names.len();
            let per_job: Vec<_> = (0..count)
                .map(|i| {
                    (
                        vec(command(), 1..4),
                        subsequence(names[..i].to_vec(), 0..=i),
                        env_vars(),
                    )
                })
                .collect();
            (Just(names), per_job)
        })
        .prop_map(move |(names, per_job)| {
            names
                .into_iter()
                .zip(per_job)
                .map(|(name, (commands, depends_on, environment))| {
                    let mut job = Job::new(name, runs_on);
                    job.steps = commands.into_iter().map(Step::run).collect();
                    job.depends_on = depends_on;
                    job.environment = environment;
                    job
                })
                .collect()
        })
}

fn round_trip(platform: Platform, config: &PipelineConfig) -> PipelineConfig {
    let text = generators::generate(platform, config).unwrap();
    parsers::parse(platform, &text, &Config::default()).unwrap()
}

proptest! {
    #[test]
    fn github_round_trip(
        jobs in jobs("ubuntu-latest"),
        branches in subsequence(vec!["main".to_string(), "develop".to_string(), "release/*".to_string()], 0..=3),
        environment in env_vars(),
    ) {
        let mut config = PipelineConfig::new("CI").trigger(Trigger::push().with_branches(branches));
        config.environment = environment;
        config.jobs = jobs
            .into_iter()
            .map(|mut job| {
                job.steps.insert(0, Step::uses("actions/checkout@v4"));
                job
            })
            .collect();

        prop_assert_eq!(round_trip(Platform::GitHub, &config), config);
    }

    #[test]
    fn gitlab_round_trip(jobs in jobs("ubuntu-latest"), environment in env_vars()) {
        let mut config = PipelineConfig::new("Pipeline").trigger(Trigger::push().with_branches(["main"]));
        config.environment = environment;
        config.jobs = jobs;

        prop_assert_eq!(round_trip(Platform::GitLab, &config), gitlab_renamed(config));
    }

    #[test]
    fn circleci_round_trip(jobs in jobs("cimg/base:stable"), orbs in vec(orb_step(), 0..3)) {
        let mut config = PipelineConfig::new("Pipeline").trigger(Trigger::push());
        config.jobs = jobs
            .into_iter()
            .map(|mut job| {
                job.steps.insert(0, Step::uses("actions/checkout@v4").named("Checkout"));
                for (i, orb) in orbs.iter().enumerate() {
                    job.steps.insert(1 + i, orb.clone());
                }
                job
            })
            .collect();

        prop_assert_eq!(round_trip(Platform::CircleCI, &config), config);
    }

    #[test]
    fn jenkins_round_trip(
        commands in vec(prop_oneof![3 => "[ -~]{1,30}", 1 => script()], 1..6),
    ) {
        let commands: Vec<String> = commands
            .into_iter()
            .filter(|c| !c.trim().is_empty())
            .collect();
        prop_assume!(!commands.is_empty());

        let mut job = Job::new("build", "ubuntu-latest");
        job.steps = commands.into_iter().map(Step::run).collect();
        let config = PipelineConfig::new("Pipeline").trigger(Trigger::push()).job(job);

        prop_assert_eq!(round_trip(Platform::Jenkins, &config), config);
    }

    /// Job order survives as GitLab `stages:` order.
    #[test]
    fn gitlab_stages_keep_job_order(jobs in jobs("ubuntu-latest")) {
        let names: Vec<String> = jobs.iter().map(|job| gitlab_key(&job.name)).collect();
        let mut config = PipelineConfig::new("CI");
        config.jobs = jobs;

        let text = generators::generate(Platform::GitLab, &config).unwrap();
        let doc: Value = serde_yaml::from_str(&text).unwrap();
        let stages: Vec<String> = doc["stages"]
            .as_sequence()
            .unwrap()
            .iter()
            .filter_map(|s| s.as_str().map(str::to_string))
            .collect();
        prop_assert_eq!(stages, names);
    }

    /// Regenerating a generated GitHub workflow never adds a second checkout.
    #[test]
    fn github_checkout_injected_once(jobs in jobs("ubuntu-latest")) {
        let mut config = PipelineConfig::new("CI");
        config.jobs = jobs;

        let first = generators::generate(Platform::GitHub, &config).unwrap();
        let reparsed = parsers::parse(Platform::GitHub, &first, &Config::default()).unwrap();
        let second = generators::generate(Platform::GitHub, &reparsed).unwrap();
        prop_assert_eq!(&first, &second);

        for job in &reparsed.jobs {
            prop_assert!(job.steps[0].is_checkout());
            prop_assert_eq!(job.steps.iter().filter(|s| s.is_checkout()).count(), 1);
        }
    }

    /// `depends_on` comes out of every YAML target unchanged.
    #[test]
    fn dependencies_emitted_verbatim(jobs in jobs("ubuntu-latest")) {
        let mut config = PipelineConfig::new("CI");
        config.jobs = jobs;

        for platform in [Platform::GitHub, Platform::GitLab, Platform::CircleCI] {
            let text = generators::generate(platform, &config).unwrap();
            let parsed = parsers::parse(platform, &text, &Config::default()).unwrap();
            for (original, parsed) in config.jobs.iter().zip(&parsed.jobs) {
                let expected: Vec<String> = if platform == Platform::GitLab {
                    original.depends_on.iter().map(|d| gitlab_key(d)).collect()
                } else {
                    original.depends_on.clone()
                };
                prop_assert_eq!(&expected, &parsed.depends_on);
            }
        }

        let azure: Value = serde_yaml::from_str(
            &generators::generate(Platform::Azure, &config).unwrap(),
        ).unwrap();
        for (job, stage) in config.jobs.iter().zip(azure["stages"].as_sequence().unwrap()) {
            let depends_on: Vec<String> = stage["dependsOn"]
                .as_sequence()
                .unwrap()
                .iter()
                .filter_map(|d| d.as_str().map(str::to_string))
                .collect();
            prop_assert_eq!(&job.depends_on, &depends_on);
        }
    }
}
