//! Migration-level linting.
//!
//! Combines the SQL rule set, the data-migration inspector and the ignore
//! rules into one verdict per migration, then applies the warning
//! promotion policy.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    data_migration::DataMigrationInspector,
    migration::Migration,
    rules::{AnalysisReport, ExcludeSet, Issue, RuleSet, Severity, analyse_sql_statements}
};

pub const RUNPYTHON_MIXED_OPERATIONS: &str = "RUNPYTHON_MIXED_OPERATIONS";

/// Which migrations are linted and how their issues are classified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinterOptions {
    /// Check codes whose issues are filed as ignored
    pub exclude_migration_tests: ExcludeSet,
    /// Warning codes promoted to errors
    pub warnings_as_errors:      Vec<String>,
    /// Promote every warning to an error
    pub all_warnings_as_errors:  bool,
    /// Only lint these apps, when non-empty
    pub include_apps:            Vec<String>,
    pub exclude_apps:            Vec<String>,
    /// Migration names skipped entirely
    pub ignore_name:             Vec<String>,
    pub ignore_name_contains:    Option<String>,
    /// Only lint these migration names, when non-empty
    pub include_name:            Vec<String>,
    pub include_name_contains:   Option<String>
}

/// Verdict for one migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LintStatus {
    /// No issue at all
    Ok,
    /// Only excluded issues
    OkIgnored,
    Warning,
    Error,
    /// Skipped by an ignore rule
    Ignore
}

impl LintStatus {
    /// Status implied by a classified report
    pub fn from_report(report: &AnalysisReport) -> Self {
        if !report.errors.is_empty() {
            Self::Error
        } else if !report.warnings.is_empty() {
            Self::Warning
        } else if !report.ignored.is_empty() {
            Self::OkIgnored
        } else {
            Self::Ok
        }
    }

    pub fn is_valid(self) -> bool {
        matches!(self, Self::Ok | Self::OkIgnored)
    }
}

impl fmt::Display for LintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::OkIgnored => write!(f, "OK (ignored)"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERR"),
            Self::Ignore => write!(f, "IGNORE")
        }
    }
}

/// Outcome of linting one migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintResult {
    pub app_label: String,
    pub name:      String,
    pub status:    LintStatus,
    #[serde(flatten)]
    pub report:    AnalysisReport,
    /// Replayed from the cache rather than linted
    #[serde(default)]
    pub cached:    bool
}

impl LintResult {
    pub fn new(app_label: impl Into<String>, name: impl Into<String>, report: AnalysisReport) -> Self {
        Self {
            app_label: app_label.into(),
            name:      name.into(),
            status:    LintStatus::from_report(&report),
            report,
            cached:    false
        }
    }

    pub fn ignored(app_label: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            app_label: app_label.into(),
            name:      name.into(),
            status:    LintStatus::Ignore,
            report:    AnalysisReport::new(),
            cached:    false
        }
    }

    pub fn has_errors(&self) -> bool {
        self.status == LintStatus::Error
    }
}

/// Lints migrations with one rule set and one set of options.
#[derive(Debug, Clone)]
pub struct MigrationLinter {
    rule_set: RuleSet,
    options:  LinterOptions
}

impl MigrationLinter {
    pub fn new(rule_set: RuleSet, options: LinterOptions) -> Self {
        Self {
            rule_set,
            options
        }
    }

    pub fn rule_set(&self) -> &RuleSet {
        &self.rule_set
    }

    pub fn options(&self) -> &LinterOptions {
        &self.options
    }

    /// Whether an ignore rule or an `ignore_migration` operation skips it
    pub fn should_ignore(&self, migration: &Migration) -> bool {
        let opts = &self.options;
        let app = migration.app_label.as_str();
        let name = migration.name.as_str();
        (!opts.include_apps.is_empty() && !opts.include_apps.iter().any(|a| a == app))
            || opts.exclude_apps.iter().any(|a| a == app)
            || migration.is_ignored_by_operation()
            || opts
                .ignore_name_contains
                .as_deref()
                .is_some_and(|part| name.contains(part))
            || opts
                .include_name_contains
                .as_deref()
                .is_some_and(|part| !name.contains(part))
            || opts.ignore_name.iter().any(|n| n == name)
            || (!opts.include_name.is_empty() && !opts.include_name.iter().any(|n| n == name))
    }

    /// Lint a migration, honouring the ignore rules
    pub fn lint(&self, migration: &Migration) -> LintResult {
        if self.should_ignore(migration) {
            debug!(app = %migration.app_label, name = %migration.name, "IGNORE");
            return LintResult::ignored(&migration.app_label, &migration.name);
        }
        let report = self.analyse(migration);
        LintResult::new(&migration.app_label, &migration.name, report)
    }

    /// Classified issues of a migration, promotion applied
    pub fn analyse(&self, migration: &Migration) -> AnalysisReport {
        let exclude = &self.options.exclude_migration_tests;
        let mut report = analyse_sql_statements(&self.rule_set, &migration.sql, exclude);
        report.merge(DataMigrationInspector::new(&self.rule_set, exclude).inspect(&migration.operations));

        let has_run_python = migration.operations.iter().any(|op| op.is_run_python());
        let has_schema = migration.operations.iter().any(|op| op.is_schema());
        if has_run_python && has_schema {
            report.record(
                Issue::new(
                    RUNPYTHON_MIXED_OPERATIONS,
                    "RunPython data migration is mixed with schema operations"
                ),
                Severity::Error,
                exclude
            );
        }

        report.promote_warnings(
            self.options.all_warnings_as_errors,
            &self.options.warnings_as_errors
        );
        report
    }
}

/// Counters over a linting run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintSummary {
    pub valid:     usize,
    pub erroneous: usize,
    pub warnings:  usize,
    pub ignored:   usize,
    pub total:     usize
}

impl LintSummary {
    pub fn from_results(results: &[LintResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.record(result.status);
        }
        summary
    }

    pub fn record(&mut self, status: LintStatus) {
        self.total += 1;
        match status {
            LintStatus::Ok | LintStatus::OkIgnored => self.valid += 1,
            LintStatus::Warning => self.warnings += 1,
            LintStatus::Error => self.erroneous += 1,
            LintStatus::Ignore => self.ignored += 1
        }
    }

    pub fn has_errors(&self) -> bool {
        self.erroneous > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules;

    #[test]
    fn test_status_precedence() {
        let none = ExcludeSet::new();
        let mut excluded = ExcludeSet::new();
        excluded.insert("X".into());
        let mut report = AnalysisReport::new();
        assert_eq!(LintStatus::from_report(&report), LintStatus::Ok);
        report.record(Issue::new("X", "x"), Severity::Error, &excluded);
        assert_eq!(LintStatus::from_report(&report), LintStatus::OkIgnored);
        report.record(Issue::new("W", "w"), Severity::Warning, &none);
        assert_eq!(LintStatus::from_report(&report), LintStatus::Warning);
        report.record(Issue::new("E", "e"), Severity::Error, &none);
        assert_eq!(LintStatus::from_report(&report), LintStatus::Error);
    }

    #[test]
    fn test_include_name_contains() {
        let linter = MigrationLinter::new(
            rules::base().clone(),
            LinterOptions {
                include_name_contains: Some("0002".into()),
                ..Default::default()
            }
        );
        assert!(linter.should_ignore(&Migration::new("app", "0001_initial")));
        assert!(!linter.should_ignore(&Migration::new("app", "0002_more")));
    }
}
