//! PostgreSQL lock checks.
//!
//! Index builds and rebuilds take locks that block writes for their whole
//! duration. They are reported as warnings since many tables are small
//! enough for the lock to go unnoticed.

use std::sync::LazyLock;

use regex::Regex;

use super::{
    Check, RuleSet, Severity, base,
    text::{starts_with, table_created_in_batch}
};

static CREATE_INDEX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"CREATE (?:UNIQUE )?INDEX.*? ON ([^\s(]+)\s*\(").expect("valid regex")
});

pub const CREATE_INDEX: Check = Check::transaction(
    "CREATE_INDEX",
    "CREATE INDEX locks table",
    Severity::Warning,
    creates_blocking_index
);

pub const CREATE_INDEX_EXCLUSIVE: Check = Check::transaction(
    "CREATE_INDEX_EXCLUSIVE",
    "CREATE INDEX prolongs lock",
    Severity::Warning,
    creates_index_under_exclusive_lock
);

pub const DROP_INDEX: Check = Check::one_liner(
    "DROP_INDEX",
    "DROP INDEX locks table",
    Severity::Warning,
    drops_index
);

pub const REINDEX: Check = Check::one_liner(
    "REINDEX",
    "REINDEX locks table",
    Severity::Warning,
    reindexes
);

pub const CHECKS: [Check; 4] = [CREATE_INDEX, CREATE_INDEX_EXCLUSIVE, DROP_INDEX, REINDEX];

pub(crate) static RULE_SET: LazyLock<RuleSet> =
    LazyLock::new(|| base::RULE_SET.overlay("postgresql", &CHECKS));

fn is_concurrent(sql: &str) -> bool {
    sql.contains("INDEX CONCURRENTLY")
}

/// Non-concurrent index build on a table that already existed
fn creates_blocking_index(statements: &[&str]) -> bool {
    statements
        .iter()
        .filter(|sql| !is_concurrent(sql))
        .filter_map(|sql| CREATE_INDEX_REGEX.captures(sql))
        .filter_map(|caps| caps.get(1))
        .any(|table| !table_created_in_batch(statements, table.as_str()))
}

fn opens_transaction(sql: &str) -> bool {
    starts_with(sql, "BEGIN") || starts_with(sql, "START TRANSACTION")
}

fn closes_transaction(sql: &str) -> bool {
    ["COMMIT", "END", "ROLLBACK"]
        .iter()
        .any(|keyword| starts_with(sql, keyword))
}

/// `ALTER TABLE` forms that take an ACCESS EXCLUSIVE lock
fn takes_exclusive_lock(sql: &str) -> bool {
    starts_with(sql, "ALTER TABLE")
        && !sql.contains("VALIDATE CONSTRAINT")
        && !sql.contains("SET STATISTICS")
}

/// Inside an explicit transaction, an index build after an exclusive-lock
/// `ALTER TABLE` keeps that lock held until commit.
fn creates_index_under_exclusive_lock(statements: &[&str]) -> bool {
    let mut in_transaction = false;
    let mut holds_exclusive_lock = false;
    for sql in statements {
        if opens_transaction(sql) {
            in_transaction = true;
            holds_exclusive_lock = false;
        } else if closes_transaction(sql) {
            in_transaction = false;
            holds_exclusive_lock = false;
        } else if in_transaction {
            if takes_exclusive_lock(sql) {
                holds_exclusive_lock = true;
            } else if holds_exclusive_lock && starts_with(sql, "CREATE") && sql.contains("INDEX")
            {
                return true;
            }
        }
    }
    false
}

fn drops_index(sql: &str) -> bool {
    sql.contains("DROP INDEX") && !is_concurrent(sql)
}

fn reindexes(sql: &str) -> bool {
    starts_with(sql, "REINDEX")
}
