//! Jenkinsfile parser
//!
//! Jenkins pipelines are Groovy, so this is a line-oriented extraction
//! rather than a real parser: every `sh` line becomes a shell step of one
//! synthesized `build` job. Anything else in the script is ignored.

use super::PipelineParser;
use crate::infrastructure::Config;
use crate::pipeline::{Job, PipelineConfig, Platform, Result, Step, Trigger, Vars};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Name of the job all extracted steps are placed in.
pub const JENKINS_JOB_NAME: &str = "build";

/// `sh 'cmd'`, `sh "cmd"`, `sh('cmd')`, `sh script: 'cmd', returnStdout: true`
static SH_STEP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^sh\s*\(?\s*(?:script\s*:\s*)?(?:'(?P<single>.*)'|"(?P<double>.*)")\s*(?:,[^'"]*)?\)?\s*;?\s*$"#,
    )
    .expect("sh step pattern is valid")
});

/// `KEY = 'value'` inside an `environment { }` block
static ENV_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?P<key>[A-Za-z_][A-Za-z0-9_]*)\s*=\s*(?:'(?P<single>(?:[^'\\]|\\.)*)'|"(?P<double>[^"]*)"|(?P<raw>\S.*))$"#,
    )
    .expect("environment pattern is valid")
});

/// `image 'node:20'` inside a docker agent
static DOCKER_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^image\s+['"](?P<image>[^'"]+)['"]"#).expect("docker image pattern is valid")
});

/// Best-effort Jenkinsfile parser
#[derive(Debug, Clone)]
pub struct JenkinsParser {
    default_runner: String,
}

impl JenkinsParser {
    /// Creates a parser; the synthesized job runs on the default runner
    /// unless a docker agent image is found
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            default_runner: config.default_runner.clone(),
        }
    }
}

impl PipelineParser for JenkinsParser {
    fn platform(&self) -> Platform {
        Platform::Jenkins
    }

    fn parse(&self, input: &str) -> Result<PipelineConfig> {
        let extracted = extract(input);

        let mut job = Job::new(
            JENKINS_JOB_NAME,
            extracted
                .image
                .unwrap_or_else(|| self.default_runner.clone()),
        );
        job.steps = extracted.commands.into_iter().map(Step::run).collect();

        if job.steps.is_empty() {
            warn!("no sh steps found in Jenkinsfile, emitting a placeholder step");
            job.steps
                .push(Step::run("echo 'Converted from Jenkins - please review'").named("Build"));
        }

        let mut config = PipelineConfig::new("Pipeline").trigger(Trigger::push());
        config.environment = extracted.environment;
        config.jobs.push(job);

        debug!(steps = config.step_count(), "extracted Jenkins steps");
        Ok(config)
    }
}

#[derive(Debug, Default)]
struct Extracted {
    commands: Vec<String>,
    environment: Vars,
    image: Option<String>,
}

fn extract(input: &str) -> Extracted {
    let mut extracted = Extracted::default();
    let mut lines = input.lines();
    let mut env_depth: Option<usize> = None;

    while let Some(raw) = lines.next() {
        let line = raw.trim();
        if let Some(depth) = env_depth.as_mut() {
            if line.ends_with('{') {
                *depth += 1;
            } else if line.starts_with('}') {
                *depth -= 1;
                if *depth == 0 {
                    env_depth = None;
                }
            } else if let Some(caps) = ENV_ENTRY.captures(line) {
                let value = match caps.name("single") {
                    Some(single) => unescape_single_quoted(single.as_str()),
                    None => caps
                        .name("double")
                        .or_else(|| caps.name("raw"))
                        .map_or_else(String::new, |m| m.as_str().to_string()),
                };
                extracted.environment.insert(&caps["key"], value);
            }
            continue;
        }

        if line.starts_with("environment") && line.ends_with('{') {
            env_depth = Some(1);
            continue;
        }

        if extracted.image.is_none() {
            if let Some(caps) = DOCKER_IMAGE.captures(line) {
                extracted.image = Some(caps["image"].to_string());
                continue;
            }
        }

        if !(line.starts_with("sh ") || line.starts_with("sh(")) {
            continue;
        }

        if let Some(delimiter) = triple_quote(line) {
            // Block lines keep their indentation relative to each other
            let body: Vec<&str> = lines
                .by_ref()
                .take_while(|l| !l.trim_start().starts_with(delimiter))
                .collect();
            let body = dedent(&body);
            extracted.commands.push(if delimiter == "'''" {
                unescape_single_quoted(&body)
            } else {
                body
            });
        } else if let Some(command) = inline_triple_quote(line) {
            extracted.commands.push(command);
        } else {
            extracted.commands.push(shell_command(line));
        }
    }

    extracted
}

/// Text after `sh` and an optional opening parenthesis.
fn sh_argument(line: &str) -> &str {
    line.trim_start_matches("sh").trim_start_matches([' ', '('])
}

/// Returns the delimiter when `line` opens a multi-line `sh '''` block.
fn triple_quote(line: &str) -> Option<&'static str> {
    let rest = sh_argument(line);
    ["'''", "\"\"\""]
        .into_iter()
        .find(|delimiter| rest == *delimiter)
}

/// Body of a one-line `sh '''make all'''`.
fn inline_triple_quote(line: &str) -> Option<String> {
    let rest = sh_argument(line).trim_end_matches([' ', ';', ')']);
    let (delimiter, body) = ["'''", "\"\"\""].into_iter().find_map(|delimiter| {
        let body = rest.strip_prefix(delimiter)?.strip_suffix(delimiter)?;
        Some((delimiter, body))
    })?;
    Some(if delimiter == "'''" {
        unescape_single_quoted(body)
    } else {
        body.to_string()
    })
}

/// Joins block lines after removing the indentation they all share.
/// Whitespace-only lines become empty.
fn dedent(lines: &[&str]) -> String {
    let indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                line.chars().skip(indent).collect()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn shell_command(line: &str) -> String {
    if let Some(caps) = SH_STEP.captures(line) {
        if let Some(command) = caps.name("single") {
            return unescape_single_quoted(command.as_str());
        }
        if let Some(command) = caps.name("double") {
            return command.as_str().to_string();
        }
    }
    line.trim_start_matches("sh")
        .trim()
        .trim_matches(|c: char| matches!(c, '\'' | '"' | '(' | ')'))
        .to_string()
}

/// Undoes the `\\'` and `\\\\` escapes of a Groovy single-quoted string.
fn unescape_single_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && matches!(chars.peek(), Some('\'' | '\\')) {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> PipelineConfig {
        JenkinsParser::new(&Config::default()).parse(input).unwrap()
    }

    fn commands(config: &PipelineConfig) -> Vec<&str> {
        config.jobs[0].steps.iter().filter_map(Step::command).collect()
    }

    #[test]
    fn test_sh_lines_become_steps_of_build_job() {
        let config = parse(
            r#"
pipeline {
    agent any
    stages {
        stage('Build') {
            steps {
                sh 'make build'
            }
        }
        stage('Test') {
            steps {
                sh "make test"
                echo 'done'
            }
        }
    }
}
"#,
        );
        assert_eq!(config.jobs.len(), 1);
        assert_eq!(config.jobs[0].name, "build");
        assert_eq!(commands(&config), vec!["make build", "make test"]);
    }

    #[test]
    fn test_sh_call_forms() {
        let config = parse(
            "sh('npm ci')\nsh(script: 'npm test', returnStatus: true)\nsh script: \"npm run lint\"\nsh 'echo \"quoted\"'\n",
        );
        assert_eq!(
            commands(&config),
            vec!["npm ci", "npm test", "npm run lint", "echo \"quoted\""]
        );
    }

    #[test]
    fn test_multiline_sh_block() {
        let config = parse("steps {\n  sh '''\n    ./configure\n    make\n  '''\n  sh 'make install'\n}\n");
        assert_eq!(commands(&config), vec!["./configure\nmake", "make install"]);
    }

    #[test]
    fn test_multiline_block_keeps_relative_indentation() {
        let config = parse(
            "steps {\n    sh '''\n        if [ -f x ]; then\n          echo yes\n\n        fi\n    '''\n}\n",
        );
        assert_eq!(commands(&config), vec!["if [ -f x ]; then\n  echo yes\n\nfi"]);
    }

    #[test]
    fn test_inline_triple_quoted_sh() {
        let config = parse("sh '''make all'''\nsh(\"\"\"make test\"\"\")\n");
        assert_eq!(commands(&config), vec!["make all", "make test"]);
    }

    #[test]
    fn test_no_sh_lines_yields_placeholder() {
        let config = parse("pipeline { agent any }");
        let steps = &config.jobs[0].steps;
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].name.as_deref(), Some("Build"));
        assert!(steps[0].command().unwrap().contains("please review"));
    }

    #[test]
    fn test_environment_block_and_docker_agent() {
        let config = parse(
            "pipeline {\n  agent {\n    docker {\n      image 'node:20'\n    }\n  }\n  environment {\n    NODE_ENV = 'production'\n    REGION = \"eu-west-1\"\n    CREDS = credentials('aws')\n  }\n  stages {\n    stage('x') { steps { sh 'npm ci' } }\n  }\n}\n",
        );
        assert_eq!(config.jobs[0].runs_on, "node:20");
        assert_eq!(config.environment.get("NODE_ENV"), Some("production"));
        assert_eq!(config.environment.get("REGION"), Some("eu-west-1"));
        assert_eq!(config.environment.get("CREDS"), Some("credentials('aws')"));
    }

    #[test]
    fn test_escaped_quotes_are_unescaped() {
        let config = parse("sh 'echo it\\'s \\\\n'\n");
        assert_eq!(commands(&config), vec!["echo it's \\n"]);

        let config = parse(
            "environment {\n  GREETING = 'it\\'s'\n}\nsh '''\n  printf 'a\\\\tb'\n'''\n",
        );
        assert_eq!(config.environment.get("GREETING"), Some("it's"));
        assert_eq!(commands(&config), vec!["printf 'a\\tb'"]);
    }

    #[test]
    fn test_lines_not_starting_with_sh_are_ignored() {
        let config = parse("shell 'nope'\nbash 'nope'\n  sh 'yes'\n");
        assert_eq!(commands(&config), vec!["yes"]);
    }
}
