//! # Migration Linter Library
//!
//! Classifies generated migration SQL and data-migration operations by
//! backward-compatibility risk.
//!
//! ```
//! use migration_linter::{
//!     rules::{ExcludeSet, analyse_sql_statements},
//!     selector::{CustomMapping, select}
//! };
//!
//! let rule_set = select(None, Some("postgresql"), &CustomMapping::new()).unwrap();
//! let report = analyse_sql_statements(
//!     &rule_set,
//!     &[r#"ALTER TABLE "book" DROP COLUMN "isbn" CASCADE;"#],
//!     &ExcludeSet::new()
//! );
//! assert_eq!(report.error_codes(), vec!["DROP_COLUMN"]);
//! ```

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data_migration;
pub mod error;
pub mod linter;
pub mod migration;
pub mod output;
pub mod rules;
pub mod selector;
