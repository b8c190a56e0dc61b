//! Conversion orchestration
//!
//! [`Converter`] ties a parser and a generator together and handles the
//! file I/O around them. Nothing is written unless parsing and generation
//! both succeed.

use crate::generators;
use crate::infrastructure::Config;
use crate::parsers;
use crate::pipeline::{ConversionError, PipelineConfig, Platform, Result, Role};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Converts pipelines between platforms
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: Config,
}

/// Summary of a completed file conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    /// Source platform
    pub from: Platform,
    /// Target platform
    pub to: Platform,
    /// File that was read
    pub input: PathBuf,
    /// File that was written
    pub output: PathBuf,
    /// Number of jobs converted
    pub jobs: usize,
    /// Number of steps across all jobs
    pub steps: usize,
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Converted {} ({}) -> {} ({}): {} jobs, {} steps",
            self.input.display(),
            self.from.display_name(),
            self.output.display(),
            self.to.display_name(),
            self.jobs,
            self.steps
        )
    }
}

impl Converter {
    /// Creates a converter with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a converter whose parsers use `config`
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Settings in use
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parses `input` as a `platform` pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::UnsupportedPlatform`] when there is no
    /// parser for `platform`, [`ConversionError::MalformedInput`] when the
    /// text cannot be decoded.
    pub fn parse(&self, platform: Platform, input: &str) -> Result<PipelineConfig> {
        let config = parsers::parse(platform, input, &self.config)?;
        debug!(%platform, jobs = config.jobs.len(), "parsed pipeline");
        Ok(config)
    }

    /// Renders `config` as a `platform` pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::UnsupportedPlatform`] when there is no
    /// generator for `platform`.
    pub fn generate(&self, platform: Platform, config: &PipelineConfig) -> Result<String> {
        generators::generate(platform, config)
    }

    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// As [`Converter::parse`], plus [`ConversionError::Io`] when the file
    /// cannot be read.
    pub fn parse_file(&self, platform: Platform, path: &Path) -> Result<PipelineConfig> {
        ensure_supported(platform, Role::Source)?;
        let input = std::fs::read_to_string(path).map_err(|e| ConversionError::io(path, e))?;
        self.parse(platform, &input)
    }

    /// Converts pipeline text without touching the filesystem.
    ///
    /// # Errors
    ///
    /// See [`Converter::parse`] and [`Converter::generate`].
    pub fn convert_str(&self, from: Platform, to: Platform, input: &str) -> Result<String> {
        ensure_supported(to, Role::Target)?;
        let config = self.parse(from, input)?;
        self.generate(to, &config)
    }

    /// Converts the file at `input` and writes the result to `output`,
    /// creating missing parent directories and replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns the first failure. Nothing is written when reading, parsing
    /// or generating fails.
    pub fn convert(
        &self,
        from: Platform,
        to: Platform,
        input: &Path,
        output: &Path,
    ) -> Result<ConversionReport> {
        ensure_supported(from, Role::Source)?;
        ensure_supported(to, Role::Target)?;

        info!(%from, %to, input = %input.display(), "converting pipeline");
        let config = self.parse_file(from, input)?;
        let text = self.generate(to, &config)?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConversionError::io(parent, e))?;
        }
        std::fs::write(output, text).map_err(|e| ConversionError::io(output, e))?;
        info!(output = %output.display(), "wrote converted pipeline");

        Ok(ConversionReport {
            from,
            to,
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            jobs: config.jobs.len(),
            steps: config.step_count(),
        })
    }
}

/// Rejects a platform before any I/O happens.
fn ensure_supported(platform: Platform, role: Role) -> Result<()> {
    let supported = match role {
        Role::Source => platform.can_parse(),
        Role::Target => platform.can_generate(),
    };
    if supported {
        Ok(())
    } else {
        Err(ConversionError::UnsupportedPlatform { platform, role })
    }
}
