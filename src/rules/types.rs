//! Type definitions for the migration check system.
//!
//! This module defines the core types used throughout the rule engine:
//! - [`Severity`] - How a matching check is reported (Warning, Error)
//! - [`CheckMode`] - Whether a check sees one statement or the whole batch
//! - [`Issue`] - A single finding with optional table and column context
//! - [`AnalysisReport`] - Errors, warnings and ignored issues of one run

use std::{collections::HashSet, fmt};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Set of check codes demoted to "ignored".
pub type ExcludeSet = HashSet<CompactString>;

/// Severity level of a matching check.
///
/// Ordered from lowest to highest severity for sorting purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Risky but often acceptable, does not fail the run unless promoted
    Warning,
    /// Backward-incompatible change that fails the run
    Error
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR")
        }
    }
}

/// Scope a check's predicate operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckMode {
    /// Evaluated against each statement on its own
    OneLiner,
    /// Evaluated once against the ordered statements of a migration
    Transaction
}

impl fmt::Display for CheckMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneLiner => write!(f, "one_liner"),
            Self::Transaction => write!(f, "transaction")
        }
    }
}

/// A single finding produced by a check or by the data-migration inspector.
///
/// The `code` is stable across dialects so one exclusion list applies to
/// every database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Check identifier (e.g., "NOT_NULL", "DROP_COLUMN")
    pub code:    CompactString,
    /// Human-readable description
    pub message: String,
    /// Table extracted from the offending statement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table:   Option<CompactString>,
    /// Column extracted from the offending statement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column:  Option<CompactString>
}

impl Issue {
    pub fn new(code: impl Into<CompactString>, message: impl Into<String>) -> Self {
        Self {
            code:    code.into(),
            message: message.into(),
            table:   None,
            column:  None
        }
    }

    /// Attach the table and column the issue concerns
    #[must_use]
    pub fn with_location(
        mut self,
        table: Option<CompactString>,
        column: Option<CompactString>
    ) -> Self {
        self.table = table;
        self.column = column;
        self
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(table) = &self.table {
            write!(f, " (table: {}", table)?;
            if let Some(column) = &self.column {
                write!(f, ", column: {}", column)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Classified issues of one analysis run.
///
/// Issues keep the order in which they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Issues that make the migration backward incompatible
    pub errors:   Vec<Issue>,
    /// Issues worth a second look
    pub warnings: Vec<Issue>,
    /// Issues whose code was explicitly excluded
    pub ignored:  Vec<Issue>
}

impl AnalysisReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// File an issue under ignored, errors or warnings.
    ///
    /// Exclusion wins over severity.
    pub fn record(&mut self, issue: Issue, severity: Severity, exclude_codes: &ExcludeSet) {
        if exclude_codes.contains(issue.code.as_str()) {
            self.ignored.push(issue);
            return;
        }
        match severity {
            Severity::Error => self.errors.push(issue),
            Severity::Warning => self.warnings.push(issue)
        }
    }

    /// Append every issue of `other`, keeping categories.
    pub fn merge(&mut self, other: AnalysisReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.ignored.extend(other.ignored);
    }

    /// Move warnings to errors.
    ///
    /// With `all` every warning is promoted; otherwise only warnings whose
    /// code appears in `codes`.
    pub fn promote_warnings(&mut self, all: bool, codes: &[String]) {
        if all {
            self.errors.append(&mut self.warnings);
            return;
        }
        if codes.is_empty() {
            return;
        }
        let (promoted, kept): (Vec<_>, Vec<_>) = self
            .warnings
            .drain(..)
            .partition(|w| codes.iter().any(|c| c == w.code.as_str()));
        self.errors.extend(promoted);
        self.warnings = kept;
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn ignored_count(&self) -> usize {
        self.ignored.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty() && self.ignored.is_empty()
    }

    /// Codes of all errors, in order
    pub fn error_codes(&self) -> Vec<&str> {
        self.errors.iter().map(|i| i.code.as_str()).collect()
    }

    /// Codes of all warnings, in order
    pub fn warning_codes(&self) -> Vec<&str> {
        self.warnings.iter().map(|i| i.code.as_str()).collect()
    }

    /// Codes of all ignored issues, in order
    pub fn ignored_codes(&self) -> Vec<&str> {
        self.ignored.iter().map(|i| i.code.as_str()).collect()
    }
}
