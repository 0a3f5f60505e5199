//! Validation/transformation reporting.
//!
//! Passes never abort on the first problem: every finding is accumulated
//! as a [`Report`] so a single run can surface everything at once. Only
//! after a full traversal does the caller decide whether errors are fatal.

use sieve_core::{CoreError, Result};

use crate::dag::{Dag, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// One finding, anchored to the sexpr of the node it concerns.
#[derive(Debug, Clone)]
pub struct Report {
    pub severity: Severity,
    pub subject: String,
    pub message: String,
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}: {}", self.severity, self.subject, self.message)
    }
}

/// Accumulator for a whole pass.
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    reports: Vec<Report>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, subject: impl Into<String>, message: impl Into<String>) {
        self.reports.push(Report {
            severity: Severity::Error,
            subject: subject.into(),
            message: message.into(),
        });
    }

    pub fn warning(&mut self, subject: impl Into<String>, message: impl Into<String>) {
        self.reports.push(Report {
            severity: Severity::Warning,
            subject: subject.into(),
            message: message.into(),
        });
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.reports
            .iter()
            .any(|r| r.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.reports.len() - self.error_count()
    }

    /// Errors collected so far, as a result: `ValidationFailed` if any.
    pub fn check(&self) -> Result<()> {
        match self.error_count() {
            0 => Ok(()),
            errors => Err(CoreError::ValidationFailed { errors }),
        }
    }

    pub fn extend(&mut self, other: Reporter) {
        self.reports.extend(other.reports);
    }

    /// One line per report.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for report in &self.reports {
            out.push_str(&report.to_string());
            out.push('\n');
        }
        out
    }
}

/// Reporter view bound to a single node; what `validate`/`transform`
/// hooks receive.
pub struct NodeReporter<'a> {
    reporter: &'a mut Reporter,
    subject: String,
}

impl<'a> NodeReporter<'a> {
    pub fn new(reporter: &'a mut Reporter, dag: &Dag, node: NodeId) -> Self {
        let subject = dag.sexpr(node);
        Self { reporter, subject }
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.reporter.error(self.subject.clone(), message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.reporter.warning(self.subject.clone(), message);
    }
}
