//! Data-quality diagnostics.
//!
//! Bad plan records never abort an analysis. They are dropped and a
//! [`Diagnostic`] is recorded instead, so the caller always gets a partial
//! result plus an explicit list of what was skipped and why.
//!
//! Codes are stable and grouped by default severity:
//!
//! | Prefix | Severity | Meaning |
//! |--------|----------|---------|
//! | `E` | Error | nothing left to analyze |
//! | `W` | Warning | record dropped |
//! | `I` | Info | record intentionally excluded |
//! | `H` | Hint | optimizer found nothing to suggest |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Hint,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Hint => "hint",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable diagnostic codes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// Plan has no valid tasks and no explicit project span
    E001EmptyPlan,
    /// Assignment references a task that does not exist (or was dropped)
    W001UnknownTask,
    /// Assignment references a resource that does not exist (or was dropped)
    W002UnknownResource,
    /// Missing or unparsable date
    W003InvalidDate,
    /// Finish date before start date
    W004ReversedSpan,
    /// Zero or negative work
    W005NonPositiveWork,
    /// Identifier defined more than once
    W006DuplicateId,
    /// Negative or non-finite max_units
    W007InvalidMaxUnits,
    /// Unparsable work or duration value
    W008InvalidWork,
    /// Resource flagged inactive and skipped
    I001InactiveResource,
    /// Resource with zero capacity excluded from utilization
    I002ZeroCapacity,
    /// No safe shift exists for an overloaded week
    H001NoSafeShift,
    /// No underutilized resource can take over an assignment
    H002NoReplacement,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::E001EmptyPlan => "E001",
            DiagnosticCode::W001UnknownTask => "W001",
            DiagnosticCode::W002UnknownResource => "W002",
            DiagnosticCode::W003InvalidDate => "W003",
            DiagnosticCode::W004ReversedSpan => "W004",
            DiagnosticCode::W005NonPositiveWork => "W005",
            DiagnosticCode::W006DuplicateId => "W006",
            DiagnosticCode::W007InvalidMaxUnits => "W007",
            DiagnosticCode::W008InvalidWork => "W008",
            DiagnosticCode::I001InactiveResource => "I001",
            DiagnosticCode::I002ZeroCapacity => "I002",
            DiagnosticCode::H001NoSafeShift => "H001",
            DiagnosticCode::H002NoReplacement => "H002",
        }
    }

    /// Severity implied by the code prefix
    pub fn default_severity(&self) -> Severity {
        match self.as_str().as_bytes().first() {
            Some(b'E') => Severity::Error,
            Some(b'W') => Severity::Warning,
            Some(b'I') => Severity::Info,
            _ => Severity::Hint,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recorded data-quality item
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    /// Identifier of the offending record (task, resource or `task->resource`)
    pub subject: Option<String>,
    pub notes: Vec<String>,
    pub hints: Vec<String>,
}

impl Diagnostic {
    /// Create a diagnostic with the code's default severity
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: code.default_severity(),
            message: message.into(),
            subject: None,
            notes: Vec::new(),
            hints: Vec::new(),
        }
    }

    /// Create a diagnostic forced to error severity
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            ..Self::new(code, message)
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)
    }
}

/// Sink for diagnostics
pub trait DiagnosticEmitter {
    fn emit(&mut self, diagnostic: Diagnostic);
}

/// Emitter that keeps everything in memory
#[derive(Debug, Default, Clone)]
pub struct CollectingEmitter {
    pub diagnostics: Vec<Diagnostic>,
}

impl CollectingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Number of diagnostics carrying a given code
    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.diagnostics.iter().filter(|d| d.code == code).count()
    }

    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticEmitter for CollectingEmitter {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
