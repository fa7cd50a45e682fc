use tracing::debug;

use super::{AnalysisReport, Check, ExcludeSet, Issue, RuleSet, Severity};

/// Applies one rule set to the SQL of a single migration.
///
/// An analyser is meant to live for one migration: create it, call
/// [`Analyser::analyse`], take the report. Nothing is shared between
/// instances, so separate migrations can be analysed on separate threads.
///
/// # Example
///
/// ```
/// use migration_linter::rules::{self, Analyser, ExcludeSet};
///
/// let exclude = ExcludeSet::new();
/// let mut analyser = Analyser::new(rules::base(), &exclude);
/// analyser.analyse(&["RENAME TABLE a TO b;"]);
///
/// assert_eq!(analyser.report().error_codes(), vec!["RENAME_TABLE"]);
/// ```
#[derive(Debug)]
pub struct Analyser<'a> {
    rule_set:      &'a RuleSet,
    exclude_codes: &'a ExcludeSet,
    report:        AnalysisReport
}

impl<'a> Analyser<'a> {
    pub fn new(rule_set: &'a RuleSet, exclude_codes: &'a ExcludeSet) -> Self {
        Self {
            rule_set,
            exclude_codes,
            report: AnalysisReport::new()
        }
    }

    pub fn rule_set(&self) -> &RuleSet {
        self.rule_set
    }

    /// Run every check against the statements.
    ///
    /// One-liner checks see each statement in order, then transaction
    /// checks see the whole list once. Issues accumulate across calls.
    pub fn analyse<S: AsRef<str>>(&mut self, sql_statements: &[S]) {
        let statements: Vec<&str> = sql_statements.iter().map(AsRef::as_ref).collect();
        for sql in &statements {
            for check in self.rule_set.one_liner_checks() {
                if check.matches_statement(sql) {
                    let issue = Issue::new(check.code, check.message).with_location(
                        self.rule_set.detect_table(sql),
                        self.rule_set.detect_column(sql)
                    );
                    self.file(check, issue, sql);
                } else {
                    debug!(code = check.code, sql = *sql, "PASSED");
                }
            }
        }
        for check in self.rule_set.transaction_checks() {
            if check.matches_transaction(&statements) {
                self.file(check, Issue::new(check.code, check.message), "<transaction>");
            } else {
                debug!(code = check.code, "PASSED");
            }
        }
    }

    fn file(&mut self, check: &Check, issue: Issue, sql: &str) {
        let outcome = if self.exclude_codes.contains(check.code) {
            "IGNORED"
        } else {
            match check.severity {
                Severity::Error => "ERROR",
                Severity::Warning => "WARNING"
            }
        };
        debug!(code = check.code, sql, "{}", outcome);
        self.report
            .record(issue, check.severity, self.exclude_codes);
    }

    pub fn errors(&self) -> &[Issue] {
        &self.report.errors
    }

    pub fn warnings(&self) -> &[Issue] {
        &self.report.warnings
    }

    pub fn ignored(&self) -> &[Issue] {
        &self.report.ignored
    }

    pub fn report(&self) -> &AnalysisReport {
        &self.report
    }

    pub fn into_report(self) -> AnalysisReport {
        self.report
    }
}

/// Analyse one batch of statements with a fresh [`Analyser`]
pub fn analyse_sql_statements<S: AsRef<str>>(
    rule_set: &RuleSet,
    sql_statements: &[S],
    exclude_codes: &ExcludeSet
) -> AnalysisReport {
    let mut analyser = Analyser::new(rule_set, exclude_codes);
    analyser.analyse(sql_statements);
    analyser.into_report()
}
