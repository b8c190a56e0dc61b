//! `pipeconv inspect` - Print the parsed pipeline model

use super::convert::resolve_source;
use anyhow::{Context, Result};
use pipeconv::{Config, Converter, PipelineConfig, Platform};
use std::path::Path;

/// Output format of `inspect`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

pub fn inspect(
    from: Option<Platform>,
    input: Option<&Path>,
    format: Format,
    config: Config,
) -> Result<String> {
    let (platform, path) = resolve_source(from, input, Path::new(""))?;
    let pipeline = Converter::with_config(config)
        .parse_file(platform, &path)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    render(&pipeline, format)
}

pub fn render(pipeline: &PipelineConfig, format: Format) -> Result<String> {
    match format {
        Format::Yaml => serde_yaml::to_string(pipeline).context("Failed to serialize pipeline"),
        Format::Json => {
            let mut json =
                serde_json::to_string_pretty(pipeline).context("Failed to serialize pipeline")?;
            json.push('\n');
            Ok(json)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeconv::{Job, Step};

    fn pipeline() -> PipelineConfig {
        PipelineConfig::new("CI").job(Job::new("build", "ubuntu-latest").step(Step::run("make")))
    }

    #[test]
    fn test_render_json() {
        let json = render(&pipeline(), Format::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["jobs"][0]["steps"][0]["command"], "make");
    }

    #[test]
    fn test_render_yaml_reads_back() {
        let yaml = render(&pipeline(), Format::Yaml).unwrap();
        let back: PipelineConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, pipeline());
    }

    #[test]
    fn test_inspect_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join(".gitlab-ci.yml");
        std::fs::write(&input, "test:\n  script: [make test]\n").unwrap();

        let yaml = inspect(None, Some(&input), Format::Yaml, Config::default()).unwrap();
        assert!(yaml.contains("command: make test"));
    }
}
