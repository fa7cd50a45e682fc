//! Rule engine classifying migration SQL by backward-compatibility risk.
//!
//! Generated SQL is matched against declarative [`Check`]s grouped into a
//! [`RuleSet`] per dialect. No SQL is parsed or executed; every check is a
//! text predicate.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌────────────────┐
//! │ Statements  │────▶│   Analyser   │────▶│ AnalysisReport │
//! └─────────────┘     └──────────────┘     └────────────────┘
//!                            │
//!                     ┌──────┴──────┐
//!                     │   RuleSet   │
//!                     │ (base + dialect overlay)
//!                     └─────────────┘
//! ```
//!
//! # Check modes
//!
//! - **One-liner** checks see each statement on its own
//! - **Transaction** checks see the ordered statements of the migration
//!
//! # Rule sets
//!
//! - [`base()`] - `RENAME_TABLE`, `NOT_NULL`, `DROP_COLUMN`, `DROP_TABLE`,
//!   `RENAME_COLUMN`, `ALTER_COLUMN`, `ADD_UNIQUE`
//! - [`mysql()`] - `ALTER_COLUMN` reads `MODIFY` definitions
//! - [`postgresql()`] - adds `CREATE_INDEX`, `CREATE_INDEX_EXCLUSIVE`,
//!   `DROP_INDEX`, `REINDEX` warnings
//! - [`sqlite()`] - reads the table rebuild sequence
//!
//! # Excluding checks
//!
//! Codes are shared by all dialects. Excluded codes still match, but their
//! issues are filed as ignored:
//!
//! ```toml
//! [linter]
//! exclude_migration_tests = ["CREATE_INDEX", "DROP_INDEX"]
//! ```

mod analyser;
pub mod base;
mod check;
pub mod mysql;
pub mod postgresql;
mod ruleset;
pub mod sqlite;
mod text;
mod types;

pub use analyser::{Analyser, analyse_sql_statements};
pub use check::{Check, Predicate, StatementPredicate, TransactionPredicate};
pub use ruleset::{Detector, RuleSet};
pub use types::{AnalysisReport, CheckMode, ExcludeSet, Issue, Severity};

/// Checks every dialect starts from
pub fn base() -> &'static RuleSet {
    &base::RULE_SET
}

pub fn mysql() -> &'static RuleSet {
    &mysql::RULE_SET
}

pub fn postgresql() -> &'static RuleSet {
    &postgresql::RULE_SET
}

pub fn sqlite() -> &'static RuleSet {
    &sqlite::RULE_SET
}
