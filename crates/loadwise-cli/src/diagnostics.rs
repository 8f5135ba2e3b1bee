//! Reporting of plan diagnostics on the command line.
//!
//! Ingestion and analysis hand back [`Diagnostic`] values; this module decides
//! how each one is shown and whether it fails the run:
//!
//! - `TerminalEmitter` prints rustc-style blocks to stderr
//! - `JsonEmitter` keeps them for the `"diagnostics"` array of the JSON document
//!
//! `--strict` raises warnings to errors and hints to warnings. `--quiet` hides
//! everything but errors. Hidden diagnostics still count, so the exit status
//! is the same with or without `--quiet`, and the same in both formats:
//!
//! | Status | When |
//! |--------|------|
//! | 0 | no diagnostic ends up as an error |
//! | 1 | at least one error, or the command itself failed |

use std::io::Write;
use std::process;

use loadwise_core::{Diagnostic, DiagnosticEmitter, Severity};
use serde::Serialize;

// ============================================================================
// Policy
// ============================================================================

/// Process status of a `loadwise` run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Failure = 1,
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code as u8)
    }
}

/// `--strict` / `--quiet` as given on the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticPolicy {
    pub strict: bool,
    pub quiet: bool,
}

/// What the policy makes of one diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub severity: Severity,
    pub visible: bool,
}

impl DiagnosticPolicy {
    pub fn judge(&self, severity: Severity) -> Verdict {
        let severity = match (self.strict, severity) {
            (true, Severity::Warning) => Severity::Error,
            (true, Severity::Hint) => Severity::Warning,
            (_, other) => other,
        };
        Verdict {
            severity,
            visible: !self.quiet || severity == Severity::Error,
        }
    }
}

/// Errors and warnings after policy, visible or not
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub errors: usize,
    pub warnings: usize,
}

impl Tally {
    fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Info | Severity::Hint => {}
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.errors == 0 {
            ExitCode::Success
        } else {
            ExitCode::Failure
        }
    }
}

// ============================================================================
// Terminal
// ============================================================================

/// Text block for one diagnostic, shown at `severity`
///
/// ```text
/// warning[W002]: assignment references unknown resource 'ghost'
///   --> api->ghost
///    |
///    = the resource is inactive
///    = hint: ...
/// ```
pub fn render_diagnostic(diagnostic: &Diagnostic, severity: Severity) -> String {
    let mut block = format!("{}[{}]: {}\n", severity, diagnostic.code, diagnostic.message);
    if let Some(subject) = &diagnostic.subject {
        block.push_str(&format!("  --> {}\n", subject));
    }
    if !diagnostic.notes.is_empty() {
        block.push_str("   |\n");
    }
    for note in &diagnostic.notes {
        block.push_str(&format!("   = {}\n", note));
    }
    for hint in &diagnostic.hints {
        block.push_str(&format!("   = hint: {}\n", hint));
    }
    block.push('\n');
    block
}

pub struct TerminalEmitter<W: Write> {
    out: W,
    policy: DiagnosticPolicy,
    tally: Tally,
}

impl<W: Write> TerminalEmitter<W> {
    pub fn new(out: W, policy: DiagnosticPolicy) -> Self {
        Self {
            out,
            policy,
            tally: Tally::default(),
        }
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn exit_code(&self) -> ExitCode {
        self.tally.exit_code()
    }
}

impl<W: Write> DiagnosticEmitter for TerminalEmitter<W> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        let verdict = self.policy.judge(diagnostic.severity);
        self.tally.record(verdict.severity);
        if verdict.visible {
            // a closed stderr is not worth failing the run over
            let _ = self.out.write_all(render_diagnostic(&diagnostic, verdict.severity).as_bytes());
        }
    }
}

// ============================================================================
// JSON
// ============================================================================

/// Diagnostic as it appears in JSON output, severity after policy
#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    pub code: String,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<String>,
}

pub struct JsonEmitter {
    policy: DiagnosticPolicy,
    tally: Tally,
    kept: Vec<JsonDiagnostic>,
}

impl JsonEmitter {
    pub fn new(policy: DiagnosticPolicy) -> Self {
        Self {
            policy,
            tally: Tally::default(),
            kept: Vec::new(),
        }
    }

    pub fn kept(&self) -> &[JsonDiagnostic] {
        &self.kept
    }

    pub fn exit_code(&self) -> ExitCode {
        self.tally.exit_code()
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::to_value(&self.kept).unwrap_or(serde_json::Value::Null)
    }
}

impl DiagnosticEmitter for JsonEmitter {
    fn emit(&mut self, diagnostic: Diagnostic) {
        let verdict = self.policy.judge(diagnostic.severity);
        self.tally.record(verdict.severity);
        if !verdict.visible {
            return;
        }
        let Diagnostic {
            code,
            message,
            subject,
            notes,
            hints,
            ..
        } = diagnostic;
        self.kept.push(JsonDiagnostic {
            code: code.to_string(),
            severity: verdict.severity,
            message,
            subject,
            notes,
            hints,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadwise_core::DiagnosticCode;

    const STRICT: DiagnosticPolicy = DiagnosticPolicy {
        strict: true,
        quiet: false,
    };
    const QUIET: DiagnosticPolicy = DiagnosticPolicy {
        strict: false,
        quiet: true,
    };

    fn ghost() -> Diagnostic {
        Diagnostic::new(
            DiagnosticCode::W002UnknownResource,
            "assignment references unknown resource 'ghost'",
        )
        .with_subject("api->ghost")
        .with_note("the resource is inactive")
        .with_hint("restore the resource or drop the assignment")
    }

    fn terminal(policy: DiagnosticPolicy, diagnostics: Vec<Diagnostic>) -> (String, Tally) {
        let mut buf = Vec::new();
        let mut emitter = TerminalEmitter::new(&mut buf, policy);
        for d in diagnostics {
            emitter.emit(d);
        }
        let tally = emitter.tally();
        (String::from_utf8(buf).unwrap(), tally)
    }

    #[test]
    fn policy_table() {
        let plain = DiagnosticPolicy::default();
        let cases = [
            (plain, Severity::Warning, Severity::Warning, true),
            (plain, Severity::Hint, Severity::Hint, true),
            (STRICT, Severity::Warning, Severity::Error, true),
            (STRICT, Severity::Hint, Severity::Warning, true),
            (STRICT, Severity::Info, Severity::Info, true),
            (QUIET, Severity::Warning, Severity::Warning, false),
            (QUIET, Severity::Error, Severity::Error, true),
        ];
        for (policy, given, severity, visible) in cases {
            assert_eq!(policy.judge(given), Verdict { severity, visible }, "{:?} {:?}", policy, given);
        }
    }

    #[test]
    fn rendered_block() {
        assert_eq!(
            render_diagnostic(&ghost(), Severity::Warning),
            "warning[W002]: assignment references unknown resource 'ghost'\n\
             \x20 --> api->ghost\n\
             \x20  |\n\
             \x20  = the resource is inactive\n\
             \x20  = hint: restore the resource or drop the assignment\n\n"
        );

        let bare = Diagnostic::new(DiagnosticCode::E001EmptyPlan, "plan is empty");
        assert_eq!(render_diagnostic(&bare, Severity::Error), "error[E001]: plan is empty\n\n");
    }

    #[test]
    fn strict_terminal_fails_the_run() {
        let (text, tally) = terminal(STRICT, vec![ghost()]);
        assert!(text.starts_with("error[W002]"));
        assert_eq!(tally, Tally { errors: 1, warnings: 0 });
        assert_eq!(tally.exit_code(), ExitCode::Failure);
    }

    #[test]
    fn quiet_hides_without_forgetting() {
        let (text, tally) = terminal(QUIET, vec![ghost()]);
        assert!(text.is_empty());
        assert_eq!(tally.warnings, 1);

        let both = DiagnosticPolicy {
            strict: true,
            quiet: true,
        };
        let (text, tally) = terminal(both, vec![ghost(), Diagnostic::new(DiagnosticCode::I001InactiveResource, "x")]);
        assert!(text.contains("error[W002]"));
        assert!(!text.contains("I001"));
        assert_eq!(tally.exit_code(), ExitCode::Failure);
    }

    #[test]
    fn json_keeps_policy_severity() {
        let mut emitter = JsonEmitter::new(STRICT);
        emitter.emit(ghost());
        emitter.emit(Diagnostic::new(DiagnosticCode::H001NoSafeShift, "no safe shift for dev"));

        let value = emitter.to_json_value();
        assert_eq!(value[0]["code"], "W002");
        assert_eq!(value[0]["severity"], "error");
        assert_eq!(value[0]["subject"], "api->ghost");
        assert_eq!(value[1]["severity"], "warning");
        assert!(value[1].get("subject").is_none());
        assert!(value[1].get("notes").is_none());
        assert_eq!(emitter.exit_code(), ExitCode::Failure);
    }

    #[test]
    fn hints_alone_never_fail() {
        let mut emitter = JsonEmitter::new(STRICT);
        emitter.emit(Diagnostic::new(DiagnosticCode::H002NoReplacement, "nobody fits"));
        assert_eq!(emitter.kept().len(), 1);
        assert_eq!(emitter.exit_code(), ExitCode::Success);
    }
}
