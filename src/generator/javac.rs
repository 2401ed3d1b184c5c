//! Generation through the system Java compiler.
//!
//! Units are staged into a temporary directory under their logical names and
//! passed to `javac -proc:only` through an argument file. Annotation
//! processors found on the processor path (or, when none is given, on the
//! classpath) run once over the whole set; no class files are written.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::debug;

use super::{Diagnostic, DiagnosticKind, GenerationRequest, ProcessOutcome, Processor};
use crate::core::SrcgenError;

/// [`Processor`] backed by a `javac` executable.
#[derive(Debug, Clone)]
pub struct JavacProcessor {
    javac: PathBuf,
    extra_args: Vec<String>,
}

impl JavacProcessor {
    pub fn new(javac: impl Into<PathBuf>) -> Self {
        Self {
            javac: javac.into(),
            extra_args: Vec::new(),
        }
    }

    /// Use `explicit` when given (it must be an existing file), otherwise find `javac` on `PATH`.
    pub fn locate(explicit: Option<&Path>) -> Result<Self, SrcgenError> {
        match explicit {
            Some(path) if path.is_file() => Ok(Self::new(path)),
            Some(path) => Err(SrcgenError::InvalidConfiguration {
                path: path.display().to_string(),
                reason: "javac executable does not exist".to_string(),
            }),
            None => which::which("javac").map(Self::new).map_err(|e| {
                SrcgenError::InvalidConfiguration {
                    path: "javac".to_string(),
                    reason: format!("not found on PATH ({e})"),
                }
            }),
        }
    }

    /// Pass an additional raw option to the compiler.
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Compiler options for `request`, without the source list.
    pub fn arguments(&self, request: &GenerationRequest<'_>) -> Result<Vec<OsString>, SrcgenError> {
        let mut args: Vec<OsString> =
            vec!["-proc:only".into(), "-encoding".into(), "UTF-8".into()];

        if !request.classpath.is_empty() {
            args.push("-classpath".into());
            args.push(request.classpath.join(&[])?);
        }

        if !request.options.processor_path.is_empty() {
            args.push("-processorpath".into());
            args.push(request.classpath.join(&request.options.processor_path)?);
        }

        if let Some(dir) = &request.options.output_directory {
            let mut option = OsString::from("-AoutputDirectory=");
            option.push(dir.as_os_str());
            args.push(option);
        }

        args.extend(self.extra_args.iter().map(OsString::from));
        Ok(args)
    }
}

impl Processor for JavacProcessor {
    fn name(&self) -> &str {
        "javac"
    }

    async fn process(&self, request: &GenerationRequest<'_>) -> Result<ProcessOutcome, SrcgenError> {
        // Removed on drop, whatever happens below
        let staging = tempfile::Builder::new().prefix("srcgen-").tempdir()?;
        let source_root = staging.path().join("src");

        let mut listing = String::new();
        for unit in request.units {
            let path = source_root.join(unit.name());
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, unit.content()).await?;
            listing.push_str(&argfile_quote(&path));
            listing.push('\n');
        }

        let argfile = staging.path().join("sources.txt");
        tokio::fs::write(&argfile, listing).await?;

        let args = self.arguments(request)?;
        debug!("{} {:?} @{}", self.javac.display(), args, argfile.display());

        let mut at_file = OsString::from("@");
        at_file.push(argfile.as_os_str());

        let output = Command::new(&self.javac)
            .args(&args)
            .arg(at_file)
            .output()
            .await
            .map_err(|e| SrcgenError::InvalidConfiguration {
                path: self.javac.display().to_string(),
                reason: format!("failed to run javac: {e}"),
            })?;

        let mut diagnostics = parse_diagnostics(&String::from_utf8_lossy(&output.stdout));
        diagnostics.extend(parse_diagnostics(&String::from_utf8_lossy(&output.stderr)));

        Ok(ProcessOutcome {
            success: output.status.success(),
            diagnostics,
        })
    }
}

/// Argument files split on whitespace; quote and use forward slashes.
fn argfile_quote(path: &Path) -> String {
    format!("\"{}\"", path.display().to_string().replace('\\', "/"))
}

/// Split compiler output into diagnostics.
///
/// A line of the form `path:line: kind: message` (or `kind: message`) starts a
/// diagnostic; the source excerpt and caret lines that follow are appended to
/// it. Summary lines such as `2 errors` are dropped.
pub fn parse_diagnostics(output: &str) -> Vec<Diagnostic> {
    let mut diagnostics: Vec<Diagnostic> = Vec::new();

    for line in output.lines() {
        if line.trim().is_empty() || is_summary(line) {
            continue;
        }

        if let Some(diagnostic) = parse_header(line) {
            diagnostics.push(diagnostic);
        } else if let Some(last) = diagnostics.last_mut() {
            last.message.push('\n');
            last.message.push_str(line);
        } else {
            diagnostics.push(Diagnostic::new(DiagnosticKind::Other, line.trim()));
        }
    }

    diagnostics
}

fn parse_header(line: &str) -> Option<Diagnostic> {
    const KINDS: [(&str, DiagnosticKind); 4] = [
        ("error", DiagnosticKind::Error),
        ("warning", DiagnosticKind::Warning),
        ("Note", DiagnosticKind::Note),
        ("note", DiagnosticKind::Note),
    ];

    for (label, kind) in KINDS {
        let prefix = format!("{label}: ");
        if let Some(message) = line.strip_prefix(&prefix) {
            return Some(Diagnostic::new(kind, message));
        }
        let infix = format!(": {label}: ");
        if let Some(index) = line.find(&infix) {
            let source = &line[..index];
            let message = &line[index + infix.len()..];
            return Some(Diagnostic::new(kind, message).with_source(source));
        }
    }
    None
}

fn is_summary(line: &str) -> bool {
    let mut words = line.split_whitespace();
    matches!(
        (words.next(), words.next(), words.next()),
        (Some(n), Some("error" | "errors" | "warning" | "warnings"), None)
            if n.chars().all(|c| c.is_ascii_digit())
    )
}
