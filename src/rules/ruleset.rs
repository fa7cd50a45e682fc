use std::sync::LazyLock;

use compact_str::CompactString;
use regex::Regex;
use smallvec::{SmallVec, smallvec};

use super::{Check, CheckMode};

static TABLE_IDENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)TABLE [`"'](.*?)[`"']"#).expect("valid regex"));

static COLUMN_IDENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)COLUMN [`"'](.*?)[`"']"#).expect("valid regex"));

static MODIFY_IDENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)MODIFY [`"'](.*?)[`"']"#).expect("valid regex"));

static ON_IDENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)ON [`"'](.*?)[`"']"#).expect("valid regex"));

/// Keyword preceding a quoted identifier an issue is reported against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detector {
    /// `TABLE "name"`
    Table,
    /// `COLUMN "name"`
    Column,
    /// `MODIFY "name"` (MySQL column changes)
    Modify,
    /// `ON "name"` (index targets)
    On
}

impl Detector {
    fn regex(self) -> &'static Regex {
        match self {
            Self::Table => &TABLE_IDENT_REGEX,
            Self::Column => &COLUMN_IDENT_REGEX,
            Self::Modify => &MODIFY_IDENT_REGEX,
            Self::On => &ON_IDENT_REGEX
        }
    }

    /// Identifier following the keyword, quotes stripped
    pub fn detect(self, sql: &str) -> Option<CompactString> {
        self.regex()
            .captures(sql)
            .and_then(|caps| caps.get(1))
            .map(|m| CompactString::from(m.as_str()))
    }
}

/// Named, ordered collection of checks for one dialect.
///
/// A rule set never changes once built. Dialects derive from the base set
/// through [`RuleSet::overlay`], which returns a new value.
#[derive(Debug, Clone)]
pub struct RuleSet {
    name:             CompactString,
    checks:           Vec<Check>,
    table_detectors:  SmallVec<[Detector; 2]>,
    column_detectors: SmallVec<[Detector; 2]>
}

impl RuleSet {
    /// Create a rule set with the default `TABLE` / `COLUMN` detectors
    pub fn new(name: impl Into<CompactString>, checks: impl IntoIterator<Item = Check>) -> Self {
        Self {
            name:             name.into(),
            checks:           checks.into_iter().collect(),
            table_detectors:  smallvec![Detector::Table],
            column_detectors: smallvec![Detector::Column]
        }
    }

    /// Derive a new rule set from this one.
    ///
    /// A check whose code already exists replaces the original at its
    /// position; any other check is appended. `self` is left untouched.
    pub fn overlay(&self, name: impl Into<CompactString>, checks: &[Check]) -> Self {
        let mut derived = self.clone();
        derived.name = name.into();
        for check in checks {
            match derived.checks.iter_mut().find(|c| c.code == check.code) {
                Some(slot) => *slot = *check,
                None => derived.checks.push(*check)
            }
        }
        derived
    }

    /// Add a fallback table detector, tried after the existing ones
    #[must_use]
    pub fn with_table_detector(mut self, detector: Detector) -> Self {
        self.table_detectors.push(detector);
        self
    }

    /// Add a fallback column detector, tried after the existing ones
    #[must_use]
    pub fn with_column_detector(mut self, detector: Detector) -> Self {
        self.column_detectors.push(detector);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Look up a check by code
    pub fn check(&self, code: &str) -> Option<&Check> {
        self.checks.iter().find(|c| c.code == code)
    }

    /// Codes in evaluation order
    pub fn codes(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.code).collect()
    }

    pub fn one_liner_checks(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| c.mode() == CheckMode::OneLiner)
    }

    pub fn transaction_checks(&self) -> impl Iterator<Item = &Check> {
        self.checks
            .iter()
            .filter(|c| c.mode() == CheckMode::Transaction)
    }

    /// First table name any detector finds in the statement
    pub fn detect_table(&self, sql: &str) -> Option<CompactString> {
        self.table_detectors.iter().find_map(|d| d.detect(sql))
    }

    /// First column name any detector finds in the statement
    pub fn detect_column(&self, sql: &str) -> Option<CompactString> {
        self.column_detectors.iter().find_map(|d| d.detect(sql))
    }
}
