//! The generation pass.
//!
//! A [`Processor`] consumes the compilation units and the classpath of a whole
//! run in one call, writes whatever it generates to disk, and reports
//! diagnostics. [`generate`] is the driver: it invokes the processor exactly
//! once and turns a failed pass into [`SrcgenError::GenerationFailed`].
//!
//! [`JavacProcessor`] runs the system Java compiler in annotation-processing-only
//! mode; tests plug in their own processors.

mod javac;

use std::fmt;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::classpath::Classpath;
use crate::core::SrcgenError;
use crate::sources::CompilationUnit;

pub use javac::{JavacProcessor, parse_diagnostics};

/// Severity of a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    Error,
    Warning,
    Note,
    Other,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Note => "note",
            Self::Other => "output",
        })
    }
}

/// A message reported by the generation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// Where the diagnostic points, usually `path:line`
    pub source: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{source}: {}: {}", self.kind, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// Options handed to the processor alongside the inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessorOptions {
    /// Root directory for generated files; the processor's default when `None`
    pub output_directory: Option<PathBuf>,
    /// Extra locations the processor implementation is loaded from
    pub processor_path: Vec<PathBuf>,
}

/// Everything one generation pass consumes.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub units: &'a [CompilationUnit],
    pub classpath: &'a Classpath,
    pub options: &'a ProcessorOptions,
}

/// What a processor reports back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// A pluggable generation pass.
#[allow(async_fn_in_trait)]
pub trait Processor {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Run the pass over `request` in process-annotations-only mode.
    async fn process(&self, request: &GenerationRequest<'_>) -> Result<ProcessOutcome, SrcgenError>;
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    /// Number of compilation units fed to the pass
    pub units: usize,
    /// Number of classpath entries
    pub classpath_entries: usize,
    /// Non-fatal diagnostics (warnings, notes)
    pub diagnostics: Vec<Diagnostic>,
}

/// Run `processor` once over `request`.
pub async fn generate<P: Processor>(
    processor: &P,
    request: &GenerationRequest<'_>,
) -> Result<GenerationReport, SrcgenError> {
    info!(
        "Running {} over {} compilation unit(s) with {} classpath entries",
        processor.name(),
        request.units.len(),
        request.classpath.len()
    );

    let ProcessOutcome {
        success,
        mut diagnostics,
    } = processor.process(request).await?;

    if !success {
        if diagnostics.is_empty() {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::Error,
                format!("{} reported failure without diagnostics", processor.name()),
            ));
        }
        return Err(SrcgenError::GenerationFailed {
            diagnostics,
        });
    }

    for diagnostic in diagnostics.iter().filter(|d| d.kind == DiagnosticKind::Warning) {
        warn!("{diagnostic}");
    }

    Ok(GenerationReport {
        units: request.units.len(),
        classpath_entries: request.classpath.len(),
        diagnostics,
    })
}
