//! Command line interface for pipeconv
//!
//! - `convert`: Convert a pipeline file between platforms
//! - `inspect`: Print the parsed pipeline model
//! - `detect`: Guess a file's platform from its path
//! - `platforms`: List supported platforms
//! - `completions`: Generate shell completions

pub mod completions;
pub mod convert;
pub mod inspect;
pub mod platforms;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use pipeconv::{Config, Platform, init_logging};
use std::path::PathBuf;

/// CLI arguments for pipeconv
#[derive(Parser, Debug)]
#[command(name = "pipeconv")]
#[command(author, version, about = "Convert CI/CD pipelines between platforms", long_about = None)]
struct Args {
    /// Configuration file (defaults to ./pipeconv.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a pipeline from one platform to another
    Convert {
        /// Source platform (detected from --input when omitted)
        #[arg(long, value_enum)]
        from: Option<PlatformArg>,
        /// Target platform
        #[arg(long, value_enum)]
        to: PlatformArg,
        /// Input file (defaults to the source platform's usual location)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Output file (defaults to the target platform's usual location)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the result instead of writing it
        #[arg(long, conflicts_with = "output")]
        stdout: bool,
    },

    /// Print the platform-neutral model of a pipeline
    Inspect {
        /// Source platform (detected from --input when omitted)
        #[arg(long, value_enum)]
        from: Option<PlatformArg>,
        /// Input file (defaults to the source platform's usual location)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = InspectFormat::Yaml)]
        format: InspectFormat,
    },

    /// Detect the platform of a pipeline file from its path
    Detect {
        /// Pipeline file path
        path: PathBuf,
    },

    /// List platforms and whether they can be read or written
    Platforms,

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: ShellArg,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum PlatformArg {
    #[value(alias = "github-actions", alias = "gha")]
    Github,
    #[value(alias = "gitlab-ci")]
    Gitlab,
    #[value(alias = "circle")]
    Circleci,
    Jenkins,
    #[value(alias = "azure-pipelines")]
    Azure,
    Bitbucket,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Github => Platform::GitHub,
            PlatformArg::Gitlab => Platform::GitLab,
            PlatformArg::Circleci => Platform::CircleCI,
            PlatformArg::Jenkins => Platform::Jenkins,
            PlatformArg::Azure => Platform::Azure,
            PlatformArg::Bitbucket => Platform::Bitbucket,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum InspectFormat {
    Yaml,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ShellArg {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// Build the CLI command for completion generation
pub fn build_cli() -> clap::Command {
    Args::command()
}

/// Parse and execute CLI arguments
pub fn run() -> Result<()> {
    let args = Args::parse();

    let config = Config::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    if args.verbose || std::env::var("PIPECONV_DEBUG").is_ok() {
        init_logging("debug");
    } else {
        init_logging(&config.log_level);
    }

    match args.command {
        Command::Convert {
            from,
            to,
            input,
            output,
            stdout,
        } => {
            let request = convert::ConvertRequest {
                from: from.map(Platform::from),
                to: to.into(),
                input,
                output,
                stdout,
            };
            match convert::run_convert(&request, config)? {
                convert::ConvertOutcome::Printed(text) => print!("{text}"),
                convert::ConvertOutcome::Written(report) => println!("{report}"),
            }
        }
        Command::Inspect {
            from,
            input,
            format,
        } => {
            let format = match format {
                InspectFormat::Yaml => inspect::Format::Yaml,
                InspectFormat::Json => inspect::Format::Json,
            };
            let text = inspect::inspect(from.map(Platform::from), input.as_deref(), format, config)?;
            print!("{text}");
        }
        Command::Detect { path } => {
            let platform = pipeconv::detect_platform(&path).with_context(|| {
                format!("Could not detect a platform for: {}", path.display())
            })?;
            println!("{platform}");
        }
        Command::Platforms => {
            print!("{}", platforms::platform_table());
        }
        Command::Completions { shell, output } => {
            use clap_complete::Shell;

            let shell_enum = match shell {
                ShellArg::Bash => Shell::Bash,
                ShellArg::Zsh => Shell::Zsh,
                ShellArg::Fish => Shell::Fish,
                ShellArg::PowerShell => Shell::PowerShell,
                ShellArg::Elvish => Shell::Elvish,
            };

            let completions = completions::generate_completions(shell_enum)?;

            if let Some(output_path) = output {
                completions::save_completions(&completions, &output_path)?;
            } else {
                print!("{completions}");
            }
        }
    }

    Ok(())
}
