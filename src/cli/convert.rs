//! `pipeconv convert` - Convert a pipeline file between platforms

use anyhow::{Context, Result, bail};
use pipeconv::{Config, ConversionReport, Converter, Platform, detect_platform};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Arguments of one `convert` invocation
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub from: Option<Platform>,
    pub to: Platform,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub stdout: bool,
}

/// What `convert` produced
#[derive(Debug)]
pub enum ConvertOutcome {
    /// Converted text, for `--stdout`
    Printed(String),
    /// A file was written
    Written(ConversionReport),
}

pub fn run_convert(request: &ConvertRequest, config: Config) -> Result<ConvertOutcome> {
    let (from, input) = resolve_source(request.from, request.input.as_deref(), Path::new(""))?;
    let converter = Converter::with_config(config);

    if request.stdout {
        let text = std::fs::read_to_string(&input)
            .with_context(|| format!("Failed to read pipeline: {}", input.display()))?;
        let converted = converter
            .convert_str(from, request.to, &text)
            .with_context(|| format!("Failed to convert {}", input.display()))?;
        return Ok(ConvertOutcome::Printed(converted));
    }

    let output = request
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(request.to.default_output_path()));
    let report = converter
        .convert(from, request.to, &input, &output)
        .with_context(|| format!("Failed to convert {}", input.display()))?;
    Ok(ConvertOutcome::Written(report))
}

/// Works out the source platform and file.
///
/// An explicit platform wins; otherwise it is detected from the input
/// path. Without an input path, the platform's default locations under
/// `base` are tried in order.
pub fn resolve_source(
    from: Option<Platform>,
    input: Option<&Path>,
    base: &Path,
) -> Result<(Platform, PathBuf)> {
    let platform = match (from, input) {
        (Some(platform), _) => platform,
        (None, Some(path)) => detect_platform(path).with_context(|| {
            format!(
                "Cannot detect the platform of {}; pass --from",
                path.display()
            )
        })?,
        (None, None) => bail!("--from is required when --input is not given"),
    };

    if let Some(path) = input {
        return Ok((platform, path.to_path_buf()));
    }

    let candidates: Vec<PathBuf> = platform
        .default_paths()
        .iter()
        .map(|path| base.join(path))
        .collect();
    debug!(%platform, ?candidates, "probing default pipeline locations");
    match candidates.iter().find(|path| path.is_file()) {
        Some(path) => Ok((platform, path.clone())),
        None => bail!(
            "No {} pipeline found (looked for {}); pass --input",
            platform.display_name(),
            platform.default_paths().join(", ")
        ),
    }
}
