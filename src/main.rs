//! pipeconv - Convert CI/CD pipelines between platforms
//!
//! ## Commands
//!
//! - `pipeconv convert` - Convert a pipeline file to another platform
//! - `pipeconv inspect` - Print the parsed, platform-neutral pipeline
//! - `pipeconv detect` - Detect a pipeline file's platform from its path
//! - `pipeconv platforms` - List supported platforms
//! - `pipeconv completions` - Generate shell completions
//!
//! ## Quick Start
//!
//! ```bash
//! # GitHub Actions workflow to GitLab CI
//! pipeconv convert --from=github --to=gitlab \
//!     --input=.github/workflows/ci.yml --output=.gitlab-ci.yml
//!
//! # Platform detected from the input path, result on stdout
//! pipeconv convert --to=github --input=Jenkinsfile --stdout
//!
//! # Show the parsed model
//! pipeconv inspect --from=circleci --format=json
//!
//! # Generate shell completions
//! pipeconv completions bash > /etc/bash_completion.d/pipeconv
//! ```
//!
//! Set `PIPECONV_DEBUG` for debug logging and `PIPECONV_VERBOSE` for the
//! full error chain on failure.

use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            if std::env::var("PIPECONV_VERBOSE").is_ok() {
                eprintln!("{e:?}");
            }
            ExitCode::FAILURE
        }
    }
}
