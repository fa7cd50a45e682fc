//! Checks shared by every dialect.
//!
//! Dialect modules overlay their own checks on top of [`CHECKS`], replacing
//! entries by code.

use std::sync::LazyLock;

use regex::Regex;

use super::{
    Check, RuleSet, Severity,
    text::{
        DefaultDirective, last_default_directive, sets_not_null, starts_with,
        table_created_in_batch, unique_target_table
    }
};

static RENAME_TABLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"RENAME TABLE|ALTER TABLE .* RENAME TO").expect("valid regex")
});

static RENAME_COLUMN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ALTER TABLE .* CHANGE|ALTER TABLE .* RENAME COLUMN").expect("valid regex")
});

static ALTER_COLUMN_TYPE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ALTER TABLE .* ALTER COLUMN .* TYPE").expect("valid regex")
});

pub const ALTER_COLUMN_MESSAGE: &str =
    "ALTERING columns (Could be backward compatible. You may ignore this migration.)";

pub const RENAME_TABLE: Check = Check::one_liner(
    "RENAME_TABLE",
    "RENAMING tables",
    Severity::Error,
    renames_table
);

pub const NOT_NULL: Check = Check::transaction(
    "NOT_NULL",
    "NOT NULL constraint on columns",
    Severity::Error,
    adds_not_null_without_default
);

pub const DROP_COLUMN: Check = Check::one_liner(
    "DROP_COLUMN",
    "DROPPING columns",
    Severity::Error,
    drops_column
);

pub const DROP_TABLE: Check = Check::one_liner(
    "DROP_TABLE",
    "DROPPING table",
    Severity::Error,
    drops_table
);

pub const RENAME_COLUMN: Check = Check::one_liner(
    "RENAME_COLUMN",
    "RENAMING columns",
    Severity::Error,
    renames_column
);

pub const ALTER_COLUMN: Check = Check::one_liner(
    "ALTER_COLUMN",
    ALTER_COLUMN_MESSAGE,
    Severity::Error,
    alters_column_type
);

pub const ADD_UNIQUE: Check = Check::transaction(
    "ADD_UNIQUE",
    "ADDING unique constraint",
    Severity::Error,
    adds_unique_to_existing_table
);

/// Base checks in evaluation order
pub const CHECKS: [Check; 7] = [
    RENAME_TABLE,
    NOT_NULL,
    DROP_COLUMN,
    DROP_TABLE,
    RENAME_COLUMN,
    ALTER_COLUMN,
    ADD_UNIQUE
];

pub(crate) static RULE_SET: LazyLock<RuleSet> = LazyLock::new(|| RuleSet::new("base", CHECKS));

fn renames_table(sql: &str) -> bool {
    RENAME_TABLE_REGEX.is_match(sql)
}

fn drops_column(sql: &str) -> bool {
    sql.contains("DROP COLUMN")
}

fn drops_table(sql: &str) -> bool {
    starts_with(sql, "DROP TABLE")
}

fn renames_column(sql: &str) -> bool {
    RENAME_COLUMN_REGEX.is_match(sql)
}

fn alters_column_type(sql: &str) -> bool {
    ALTER_COLUMN_TYPE_REGEX.is_match(sql)
}

/// A `NOT NULL` is added outside table or index creation and the batch's
/// last default directive is not `SET DEFAULT`.
fn adds_not_null_without_default(statements: &[&str]) -> bool {
    let adds_not_null = statements.iter().any(|sql| {
        sets_not_null(sql) && !starts_with(sql, "CREATE TABLE") && !starts_with(sql, "CREATE INDEX")
    });
    adds_not_null && last_default_directive(statements) != Some(DefaultDirective::Set)
}

fn adds_unique_to_existing_table(statements: &[&str]) -> bool {
    statements
        .iter()
        .filter_map(|sql| unique_target_table(sql))
        .any(|table| !table_created_in_batch(statements, table))
}
