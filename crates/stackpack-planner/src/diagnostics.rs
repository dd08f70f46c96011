//! Diagnostics emitted while planning.
//!
//! The planner never logs through global state on the caller's behalf.
//! Callers pass a [`DiagnosticSink`]; [`TracingSink`] forwards into
//! `tracing` for the CLI.

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Batch/interval summary from a packing pass.
    Packing,
    /// Container counts from an allocation pass.
    Allocation,
    /// A reference was dropped because its target id does not exist.
    InvalidReference,
    /// A descriptor was left out because none of its references are valid.
    ExcludedDescriptor,
    /// An edge endpoint has no phase-1 container.
    UnresolvedEdge,
    /// Dependency wiring summary.
    Dependencies,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// The descriptor or edge the message is about, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Info => write!(f, "info: {}", self.message),
            Severity::Warning => write!(f, "warning: {}", self.message),
        }
    }
}

/// Receives diagnostics as they are produced.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: &Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        self.push(diagnostic.clone());
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&mut self, _diagnostic: &Diagnostic) {}
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&mut self, d: &Diagnostic) {
        let subject = d.subject.as_deref().unwrap_or("-");
        match d.severity {
            Severity::Info => info!(kind = ?d.kind, subject, "{}", d.message),
            Severity::Warning => warn!(kind = ?d.kind, subject, "{}", d.message),
        }
    }
}

/// Forwards to a sink and keeps a copy for the finished plan.
pub struct Diagnostics<'s> {
    sink: &'s mut dyn DiagnosticSink,
    recorded: Vec<Diagnostic>,
}

impl<'s> Diagnostics<'s> {
    pub fn new(sink: &'s mut dyn DiagnosticSink) -> Self {
        Self {
            sink,
            recorded: Vec::new(),
        }
    }

    pub fn info(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.record(Diagnostic {
            severity: Severity::Info,
            kind,
            subject: None,
            message: message.into(),
        });
    }

    pub fn warn(&mut self, kind: DiagnosticKind, subject: impl Into<String>, message: impl Into<String>) {
        self.record(Diagnostic {
            severity: Severity::Warning,
            kind,
            subject: Some(subject.into()),
            message: message.into(),
        });
    }

    fn record(&mut self, diagnostic: Diagnostic) {
        self.sink.emit(&diagnostic);
        self.recorded.push(diagnostic);
    }

    pub fn warning_count(&self) -> usize {
        self.recorded.iter().filter(|d| d.is_warning()).count()
    }

    pub fn into_recorded(self) -> Vec<Diagnostic> {
        self.recorded
    }
}
