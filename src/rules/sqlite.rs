//! SQLite checks.
//!
//! SQLite cannot alter most column properties in place, so the migration
//! framework rebuilds the table: rename the old one (`__old`) or create a
//! `new__` copy, move the rows, drop the leftover. These checks read the
//! whole rebuild sequence instead of single statements.

use std::sync::LazyLock;

use regex::Regex;

use super::{
    Check, RuleSet, Severity, base,
    ruleset::Detector,
    text::{not_null_positions, table_created_in_batch}
};

static RENAME_TO_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ALTER TABLE .* RENAME TO").expect("valid regex"));

static DROP_TABLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*DROP TABLE (?:IF EXISTS )?"?([^"\s;]+)"?"#).expect("valid regex")
});

static CREATE_UNIQUE_INDEX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"CREATE UNIQUE INDEX .* ON (".*?")"#).expect("valid regex")
});

pub const RENAME_TABLE: Check = Check::one_liner(
    "RENAME_TABLE",
    "RENAMING tables",
    Severity::Error,
    renames_table
);

pub const DROP_TABLE: Check = Check::transaction(
    "DROP_TABLE",
    "DROPPING table",
    Severity::Error,
    drops_table_without_rebuild
);

pub const NOT_NULL: Check = Check::transaction(
    "NOT_NULL",
    "NOT NULL constraint on columns",
    Severity::Error,
    rebuilds_with_not_null
);

pub const ADD_UNIQUE: Check = Check::transaction(
    "ADD_UNIQUE",
    "ADDING unique constraint",
    Severity::Error,
    adds_unique_index_to_existing_table
);

pub const CHECKS: [Check; 4] = [RENAME_TABLE, DROP_TABLE, NOT_NULL, ADD_UNIQUE];

pub(crate) static RULE_SET: LazyLock<RuleSet> = LazyLock::new(|| {
    base::RULE_SET
        .overlay("sqlite", &CHECKS)
        .with_table_detector(Detector::On)
});

fn is_rebuild_rename(sql: &str) -> bool {
    sql.contains("__old") || sql.contains("new__")
}

fn renames_table(sql: &str) -> bool {
    RENAME_TO_REGEX.is_match(sql) && !is_rebuild_rename(sql)
}

/// Dropped `table` is the leftover of a rebuild: the batch creates it again,
/// creates its `new__` copy, or it is the `__old` copy of a created table.
fn is_rebuild_leftover(statements: &[&str], table: &str) -> bool {
    let created = |name: &str| table_created_in_batch(statements, &format!("\"{}\"", name));
    created(table)
        || created(&format!("new__{}", table))
        || table.strip_suffix("__old").is_some_and(created)
}

fn drops_table_without_rebuild(statements: &[&str]) -> bool {
    statements
        .iter()
        .filter_map(|sql| DROP_TABLE_REGEX.captures(sql))
        .filter_map(|caps| caps.get(1))
        .any(|table| !is_rebuild_leftover(statements, table.as_str()))
}

/// `NOT NULL` neither on the primary key nor backed by a default
fn has_bare_not_null(sql: &str) -> bool {
    not_null_positions(sql).any(|pos| {
        let rest = &sql[pos + "NOT NULL".len()..];
        !rest.starts_with(" PRIMARY") && !rest.starts_with(" DEFAULT")
    })
}

fn rebuilds_with_not_null(statements: &[&str]) -> bool {
    statements.iter().any(|sql| has_bare_not_null(sql))
        && statements
            .iter()
            .any(|sql| RENAME_TO_REGEX.is_match(sql) && is_rebuild_rename(sql))
}

fn adds_unique_index_to_existing_table(statements: &[&str]) -> bool {
    statements
        .iter()
        .filter_map(|sql| CREATE_UNIQUE_INDEX_REGEX.captures(sql))
        .filter_map(|caps| caps.get(1))
        .any(|table| !table_created_in_batch(statements, table.as_str()))
}
