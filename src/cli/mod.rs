//! Command-line interface for srcgen.
//!
//! There is a single command: resolve one or more Maven coordinates, extract
//! the sources of each root and of its family, and run one annotation
//! processing pass over all of them.
//!
//! ```bash
//! # Generate into ./generated with the template next to codegen.js
//! srcgen --codegen ./templates/codegen.js --target ./generated com.example:api:1.4.0
//!
//! # Also take the sources of com.example:api-model, com.example:api-client, ...
//! srcgen --family prefix --target ./generated com.example:api:1.4.0
//!
//! # Only use what is already in the local repository
//! srcgen --offline --local-repository /var/cache/m2 com.example:api:1.4.0
//! ```
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug output
//! - `--quiet` - Suppress all output except errors
//! - `--config` - Path to a config file (also `SRCGEN_CONFIG`)
//!
//! Running without coordinates prints usage and exits successfully.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{CommandFactory, Parser};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use crate::artifact::Coordinate;
use crate::config::GlobalConfig;
use crate::core::SrcgenError;
use crate::generator::{DiagnosticKind, JavacProcessor, ProcessorOptions};
use crate::maven::{LocalRepository, MavenRepository};
use crate::pipeline::Pipeline;
use crate::resolver::{DependencyCollector, FamilyRule};

/// Runtime configuration derived from the global flags.
///
/// Kept apart from [`Cli`] so tests and embedders can choose a log level
/// without touching the process environment.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Filter directive for the log subscriber.
    ///
    /// When `None`, `RUST_LOG` is honoured and `info` is the fallback.
    pub log_level: Option<String>,

    /// Suppress progress lines on stdout.
    pub quiet: bool,

    /// Config file to load instead of the default location.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a stderr log subscriber for this configuration.
    ///
    /// Only the first call in a process has an effect.
    pub fn init_logging(&self) {
        let filter = match &self.log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .try_init();
    }
}

/// Resolve Maven artifacts and generate code from their sources.
#[derive(Parser, Debug)]
#[command(
    name = "srcgen",
    about = "Generate code from the sources of Maven artifacts",
    version,
    long_about = "Resolves each coordinate and its family of related artifacts, extracts their \
                  sources and runs one annotation processing pass (javac -proc:only) over them."
)]
pub struct Cli {
    /// Root coordinates, `groupId:artifactId[:extension[:classifier]]:version`
    #[arg(value_name = "COORDINATE")]
    coordinates: Vec<String>,

    /// Code generation template; its directory is put on the processor path
    #[arg(long, value_name = "FILE")]
    codegen: Option<PathBuf>,

    /// Directory the processor writes generated files to
    #[arg(long, value_name = "DIR")]
    target: Option<PathBuf>,

    /// Annotation processor class to run instead of discovering processors
    #[arg(long, value_name = "CLASS")]
    processor: Option<String>,

    /// Java compiler to use (default: `javac` on PATH)
    #[arg(long, value_name = "FILE")]
    javac: Option<PathBuf>,

    /// How dependencies are matched against a root's family
    #[arg(long, value_name = "RULE")]
    family: Option<FamilyRule>,

    /// Resolve from the local repository only
    #[arg(long)]
    offline: bool,

    /// Local repository directory (default: ~/.m2/repository)
    #[arg(long, value_name = "DIR")]
    local_repository: Option<PathBuf>,

    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    #[arg(short, long)]
    quiet: bool,

    #[arg(short, long, env = "SRCGEN_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Map the global flags onto a [`CliConfig`].
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            quiet: self.quiet,
            config_path: self.config.clone(),
        }
    }

    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        if self.coordinates.is_empty() {
            println!("Please provide an artifact to process");
            println!();
            Self::command().print_help()?;
            return Ok(());
        }

        config.init_logging();

        let roots = self.roots()?;
        // Checked before anything is downloaded
        let options = self.processor_options()?;

        let mut settings = GlobalConfig::load_with_optional(config.config_path.clone()).await?;
        self.apply_overrides(&mut settings);

        let mut javac = JavacProcessor::locate(settings.javac.as_deref())?;
        if let Some(class) = &self.processor {
            javac = javac.with_arg("-processor").with_arg(class.as_str());
        }

        let local = match &self.local_repository {
            Some(path) => path.clone(),
            None => settings.local_repository_path()?,
        };
        let repository =
            MavenRepository::new(LocalRepository::new(local), settings.remotes.clone(), settings.timeout())?
                .with_offline(settings.offline);
        let pipeline =
            Pipeline::new(DependencyCollector::new(repository), settings.family, settings.source_suffix.as_str());

        if !config.quiet {
            for root in &roots {
                println!("{} {}", "Resolving".cyan(), root);
            }
        }

        let report = pipeline.run(&roots, &javac, &options).await?;

        if !config.quiet {
            for diagnostic in &report.diagnostics {
                match diagnostic.kind {
                    DiagnosticKind::Warning => println!("{}", diagnostic.to_string().yellow()),
                    _ => println!("{diagnostic}"),
                }
            }
            println!(
                "{} Processed {} compilation unit(s) against {} classpath entries",
                "✓".green(),
                report.units,
                report.classpath_entries
            );
            if let Some(target) = &options.output_directory {
                println!("  Output: {}", target.display());
            }
        }

        Ok(())
    }

    fn roots(&self) -> Result<Vec<Coordinate>, SrcgenError> {
        self.coordinates.iter().map(|c| c.parse()).collect()
    }

    /// Validate `--target` and `--codegen` into processor options.
    fn processor_options(&self) -> Result<ProcessorOptions, SrcgenError> {
        let mut options = ProcessorOptions::default();

        if let Some(target) = &self.target {
            if !target.exists() {
                return Err(invalid(target, "does not exist"));
            }
            if !target.is_dir() {
                return Err(invalid(target, "is not a directory"));
            }
            options.output_directory = Some(std::path::absolute(target)?);
        }

        if let Some(codegen) = &self.codegen {
            if !codegen.exists() {
                return Err(invalid(codegen, "does not exist"));
            }
            if !codegen.is_file() {
                return Err(invalid(codegen, "is not a file"));
            }
            let codegen = std::path::absolute(codegen)?;
            if let Some(parent) = codegen.parent() {
                options.processor_path.push(parent.to_path_buf());
            }
        }

        Ok(options)
    }

    fn apply_overrides(&self, settings: &mut GlobalConfig) {
        if let Some(javac) = &self.javac {
            settings.javac = Some(javac.clone());
        }
        if let Some(family) = self.family {
            settings.family = family;
        }
        if self.offline {
            settings.offline = true;
        }
    }
}

fn invalid(path: &Path, reason: &str) -> SrcgenError {
    SrcgenError::InvalidConfiguration {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}
