//! Inspection of data migrations.
//!
//! Schema operations are covered by the SQL they generate. RunPython and
//! RunSQL operations carry their own code, so they get dedicated checks:
//!
//! | Code | Severity | Trigger |
//! |------|----------|---------|
//! | `RUNPYTHON_REVERSIBLE` | warning | no backward callback |
//! | `RUNPYTHON_ARGS_NAMING_CONVENTION` | warning | parameters are not `(apps, schema_editor)` |
//! | `RUNPYTHON_MODEL_IMPORT` | error | model used without `get_model` |
//! | `RUNPYTHON_MODEL_VARIABLE_NAME` | warning | variable named unlike the model class |
//! | `RUNSQL_REVERSIBLE` | warning | no reverse SQL |
//!
//! RunSQL statements additionally go through the dialect rule set.

pub mod callable;
mod model_access;
mod run_sql;

pub use callable::{Callable, FunctionSource};
pub use model_access::{Finding, MODEL_IMPORT, MODEL_VARIABLE_NAME, classify_model_access};
pub use run_sql::{SqlSource, SqlStatement};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    migration::Operation,
    rules::{AnalysisReport, ExcludeSet, Issue, RuleSet, Severity, analyse_sql_statements}
};

pub const RUNPYTHON_REVERSIBLE: &str = "RUNPYTHON_REVERSIBLE";
pub const RUNPYTHON_ARGS_NAMING_CONVENTION: &str = "RUNPYTHON_ARGS_NAMING_CONVENTION";
pub const RUNSQL_REVERSIBLE: &str = "RUNSQL_REVERSIBLE";

/// Parameter names data-migration callbacks are expected to declare
pub const EXPECTED_DATA_MIGRATION_ARGS: [&str; 2] = ["apps", "schema_editor"];

/// Callback operation running application code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunPython {
    pub code:         Callable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse_code: Option<Callable>
}

impl RunPython {
    pub fn reversible(&self) -> bool {
        self.reverse_code.is_some()
    }
}

/// Raw SQL operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSql {
    pub sql:         SqlSource,
    /// `None` makes the operation irreversible; a no-op source is reversible
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse_sql: Option<SqlSource>
}

impl RunSql {
    pub fn reversible(&self) -> bool {
        self.reverse_sql.is_some()
    }
}

/// Runs the data-migration checks of one migration.
#[derive(Debug, Clone, Copy)]
pub struct DataMigrationInspector<'a> {
    rule_set:      &'a RuleSet,
    exclude_codes: &'a ExcludeSet
}

impl<'a> DataMigrationInspector<'a> {
    pub fn new(rule_set: &'a RuleSet, exclude_codes: &'a ExcludeSet) -> Self {
        Self {
            rule_set,
            exclude_codes
        }
    }

    /// Inspect every RunPython and RunSQL operation, in order
    pub fn inspect(&self, operations: &[Operation]) -> AnalysisReport {
        let mut report = AnalysisReport::new();
        for operation in operations {
            match operation {
                Operation::RunPython(run_python) => report.merge(self.lint_run_python(run_python)),
                Operation::RunSql(run_sql) => report.merge(self.lint_run_sql(run_sql)),
                Operation::IgnoreMigration | Operation::Schema { .. } => {}
            }
        }
        report
    }

    pub fn lint_run_python(&self, run_python: &RunPython) -> AnalysisReport {
        let mut report = AnalysisReport::new();
        let name = run_python.code.name();
        debug!(function = name, "Inspecting RunPython");

        if !run_python.reversible() {
            report.record(
                Issue::new(
                    RUNPYTHON_REVERSIBLE,
                    format!("'{}': RunPython data migration is not reversible", name)
                ),
                Severity::Warning,
                self.exclude_codes
            );
        }

        if run_python.code.effective_params() != EXPECTED_DATA_MIGRATION_ARGS {
            report.record(
                Issue::new(
                    RUNPYTHON_ARGS_NAMING_CONVENTION,
                    format!(
                        "'{}': By convention, RunPython names the two arguments: apps, \
                         schema_editor",
                        name
                    )
                ),
                Severity::Warning,
                self.exclude_codes
            );
        }

        let callbacks = std::iter::once(&run_python.code).chain(run_python.reverse_code.as_ref());
        for callback in callbacks {
            for finding in classify_model_access(callback.discover()) {
                report.record(finding.issue, finding.severity, self.exclude_codes);
            }
        }
        report
    }

    pub fn lint_run_sql(&self, run_sql: &RunSql) -> AnalysisReport {
        let mut report = AnalysisReport::new();

        if !run_sql.reversible() {
            report.record(
                Issue::new(RUNSQL_REVERSIBLE, "RunSQL data migration is not reversible"),
                Severity::Warning,
                self.exclude_codes
            );
        }

        let sources = std::iter::once(&run_sql.sql).chain(run_sql.reverse_sql.as_ref());
        for source in sources.filter(|s| !s.is_noop()) {
            report.merge(analyse_sql_statements(
                self.rule_set,
                &source.statements(),
                self.exclude_codes
            ));
        }
        report
    }
}
