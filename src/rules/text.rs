//! Text helpers shared by the dialect predicates.
//!
//! Generated migration SQL is upper-case and single-line per statement, so
//! the helpers match keywords case-sensitively, as the framework emits them.

use std::sync::LazyLock;

use regex::Regex;

static CREATE_UNIQUE_INDEX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"CREATE UNIQUE INDEX .*? ON ([^\s(]+)").expect("valid regex")
});

static ADD_UNIQUE_CONSTRAINT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ALTER TABLE (.*) ADD CONSTRAINT .* UNIQUE").expect("valid regex")
});

/// Statement begins with `prefix` once leading whitespace is dropped
pub fn starts_with(sql: &str, prefix: &str) -> bool {
    sql.trim_start().starts_with(prefix)
}

/// Whether some statement of the batch creates `table`.
///
/// `table` is compared verbatim, quotes included.
pub fn table_created_in_batch(statements: &[&str], table: &str) -> bool {
    let prefix = format!("CREATE TABLE {}", table);
    statements.iter().any(|sql| starts_with(sql, &prefix))
}

/// Table targeted by a unique constraint or unique index, if any
pub fn unique_target_table(sql: &str) -> Option<&str> {
    ADD_UNIQUE_CONSTRAINT_REGEX
        .captures(sql)
        .or_else(|| CREATE_UNIQUE_INDEX_REGEX.captures(sql))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// Byte offsets of every `NOT NULL` in the statement
pub fn not_null_positions(sql: &str) -> impl Iterator<Item = usize> + '_ {
    sql.match_indices("NOT NULL").map(|(pos, _)| pos)
}

/// Whether a `NOT NULL` constraint is being added, as opposed to dropped
pub fn sets_not_null(sql: &str) -> bool {
    not_null_positions(sql).any(|pos| !sql[..pos].ends_with("DROP "))
}

/// Default directive issued on a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultDirective {
    Set,
    Drop
}

/// Last `SET DEFAULT` / `DROP DEFAULT` directive of the batch.
///
/// Within one statement the directive appearing last wins.
pub fn last_default_directive(statements: &[&str]) -> Option<DefaultDirective> {
    statements.iter().rev().find_map(|sql| {
        let set = sql.rfind("SET DEFAULT");
        let drop = sql.rfind("DROP DEFAULT");
        match (set, drop) {
            (Some(s), Some(d)) if s > d => Some(DefaultDirective::Set),
            (Some(_), Some(_)) => Some(DefaultDirective::Drop),
            (Some(_), None) => Some(DefaultDirective::Set),
            (None, Some(_)) => Some(DefaultDirective::Drop),
            (None, None) => None
        }
    })
}
