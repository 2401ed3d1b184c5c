//! Error handling for srcgen
//!
//! Every failure that can end a run is a variant of [`SrcgenError`]. The run is
//! all-or-nothing: any of these errors aborts before (or during) the single
//! generation pass, and nothing is retried.
//!
//! # Error Categories
//!
//! - **Input**: [`SrcgenError::MalformedCoordinate`], [`SrcgenError::InvalidConfiguration`]
//! - **Resolution**: [`SrcgenError::ResolutionFailed`], [`SrcgenError::SourceArtifactNotFound`]
//! - **Extraction**: [`SrcgenError::ExtractionFailed`]
//! - **Generation**: [`SrcgenError::GenerationFailed`]
//!
//! Use [`user_friendly_error`] to turn any `anyhow::Error` coming out of the CLI
//! into an [`ErrorContext`] with a suggestion attached.
//!
//! # Examples
//!
//! ```rust,no_run
//! use srcgen_cli::core::{SrcgenError, user_friendly_error};
//!
//! let error = SrcgenError::SourceArtifactNotFound {
//!     coordinate: "io.vertx:vertx-core:4.5.0".to_string(),
//! };
//! user_friendly_error(anyhow::Error::from(error)).display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::generator::Diagnostic;

/// The main error type for srcgen operations.
#[derive(Error, Debug)]
pub enum SrcgenError {
    /// A coordinate string does not follow `group:artifact[:extension[:classifier]]:version`.
    #[error("Malformed coordinate '{coordinate}': {reason}")]
    MalformedCoordinate {
        /// The coordinate string as given
        coordinate: String,
        /// What is wrong with it
        reason: String,
    },

    /// The artifact resolution service failed for a root coordinate.
    ///
    /// Covers network errors, missing artifacts and checksum mismatches.
    #[error("Failed to resolve {coordinate}: {cause}")]
    ResolutionFailed {
        /// The requested root coordinate
        coordinate: String,
        /// The underlying resolution failure
        cause: String,
    },

    /// A root package has no `sources` variant in any repository.
    #[error("No sources artifact found for {coordinate}")]
    SourceArtifactNotFound {
        /// The requested root coordinate
        coordinate: String,
    },

    /// A source archive could not be opened or one of its entries could not be decoded.
    #[error("Failed to extract '{entry}' from {archive}: {cause}")]
    ExtractionFailed {
        /// Path of the archive on disk
        archive: String,
        /// Entry name inside the archive (empty when the archive itself failed)
        entry: String,
        /// The underlying failure
        cause: String,
    },

    /// A user supplied path (target directory, codegen file, javac) is unusable.
    #[error("Invalid configuration for {path}: {reason}")]
    InvalidConfiguration {
        /// The offending path
        path: String,
        /// Why it was rejected
        reason: String,
    },

    /// The generation pass reported failure.
    #[error("Code generation failed with {} diagnostic(s)", diagnostics.len())]
    GenerationFailed {
        /// Every diagnostic the processor reported
        diagnostics: Vec<Diagnostic>,
    },

    /// IO error from the standard library
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Anything else, with the full cause chain flattened into the message
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl Clone for SrcgenError {
    fn clone(&self) -> Self {
        match self {
            Self::MalformedCoordinate {
                coordinate,
                reason,
            } => Self::MalformedCoordinate {
                coordinate: coordinate.clone(),
                reason: reason.clone(),
            },
            Self::ResolutionFailed {
                coordinate,
                cause,
            } => Self::ResolutionFailed {
                coordinate: coordinate.clone(),
                cause: cause.clone(),
            },
            Self::SourceArtifactNotFound {
                coordinate,
            } => Self::SourceArtifactNotFound {
                coordinate: coordinate.clone(),
            },
            Self::ExtractionFailed {
                archive,
                entry,
                cause,
            } => Self::ExtractionFailed {
                archive: archive.clone(),
                entry: entry.clone(),
                cause: cause.clone(),
            },
            Self::InvalidConfiguration {
                path,
                reason,
            } => Self::InvalidConfiguration {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::GenerationFailed {
                diagnostics,
            } => Self::GenerationFailed {
                diagnostics: diagnostics.clone(),
            },
            // std::io::Error is not Clone
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// An error with an optional suggestion and details, ready to be shown to the user.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: SrcgenError,
    /// What the user can do about it
    pub suggestion: Option<String>,
    /// Extra explanation
    pub details: Option<String>,
}

impl ErrorContext {
    /// Wrap an error without suggestion or details.
    #[must_use]
    pub const fn new(error: SrcgenError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Attach a suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let SrcgenError::GenerationFailed {
            diagnostics,
        } = &self.error
        {
            for diagnostic in diagnostics {
                eprintln!("  {diagnostic}");
            }
        }

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with a suggestion where one is known.
///
/// [`SrcgenError`] values anywhere in the chain are recognised; everything else
/// becomes [`SrcgenError::Other`] carrying the full `Caused by:` chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(srcgen_error) = error.chain().find_map(|e| e.downcast_ref::<SrcgenError>()) {
        return create_error_context(srcgen_error.clone());
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(SrcgenError::InvalidConfiguration {
            path: "config.toml".to_string(),
            reason: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax of your srcgen configuration file");
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(SrcgenError::Other {
        message,
    })
}

fn create_error_context(error: SrcgenError) -> ErrorContext {
    match &error {
        SrcgenError::MalformedCoordinate { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Use the form group:artifact[:extension[:classifier]]:version, e.g. io.vertx:vertx-core:4.5.0"),

        SrcgenError::ResolutionFailed { cause, .. } => {
            let suggestion = if cause.contains("checksum") {
                "The downloaded file does not match its published checksum. Delete it from the local repository and retry"
            } else if cause.contains("not found") {
                "Check the coordinate spelling and version, and that the configured remotes publish it"
            } else {
                "Check your network connection and the remote repositories in ~/.srcgen/config.toml"
            };
            ErrorContext::new(error.clone()).with_suggestion(suggestion)
        }

        SrcgenError::SourceArtifactNotFound { coordinate } => {
            let details = format!("Generation needs the '{coordinate}' package to be published with a 'sources' classifier");
            ErrorContext::new(error.clone())
                .with_suggestion("Only packages that publish a sources jar can be processed")
                .with_details(details)
        }

        SrcgenError::ExtractionFailed { archive, .. } => {
            let suggestion = format!("The archive may be corrupt. Delete {archive} and run again to download it afresh");
            ErrorContext::new(error.clone()).with_suggestion(suggestion)
        }

        SrcgenError::InvalidConfiguration { .. } => ErrorContext::new(error.clone())
            .with_suggestion("--target must name an existing directory and --codegen an existing file"),

        SrcgenError::GenerationFailed { .. } => ErrorContext::new(error.clone())
            .with_details("The diagnostics above were reported by the annotation processing pass"),

        _ => ErrorContext::new(error.clone()),
    }
}
