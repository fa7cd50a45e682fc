use std::sync::LazyLock;

use regex::Regex;

use super::{Check, RuleSet, Severity, base, ruleset::Detector};

static MODIFY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ALTER TABLE .* MODIFY (.*)").expect("valid regex"));

/// `MODIFY` rewrites the column definition; only an explicit trailing `NULL`
/// is known to keep it backward compatible.
pub const ALTER_COLUMN: Check = Check::one_liner(
    "ALTER_COLUMN",
    base::ALTER_COLUMN_MESSAGE,
    Severity::Error,
    modifies_column
);

pub const CHECKS: [Check; 1] = [ALTER_COLUMN];

pub(crate) static RULE_SET: LazyLock<RuleSet> = LazyLock::new(|| {
    base::RULE_SET
        .overlay("mysql", &CHECKS)
        .with_column_detector(Detector::Modify)
});

fn modifies_column(sql: &str) -> bool {
    let Some(definition) = MODIFY_REGEX
        .captures(sql)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end().trim_end_matches(';').trim_end())
    else {
        return false;
    };
    definition.ends_with("NOT NULL") || !definition.ends_with(" NULL")
}
