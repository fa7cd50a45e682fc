//! Choice of the rule set that analyses a project's migrations.
//!
//! An explicit analyser name wins over the database engine. Names resolve
//! against the built-in dialects merged with a custom mapping; engines are
//! matched by substring (`django.db.backends.postgresql` selects
//! PostgreSQL).
//!
//! The dialect-neutral base rule set has no engine and no built-in name. A
//! custom mapping reaches it through its registry path,
//! `migration_linter::rules::Base`, e.g. `plain = "migration_linter::rules::Base"`
//! under `[analysers]`.
//!
//! ```
//! use migration_linter::selector::{CustomMapping, select};
//!
//! let rule_set = select(Some("django.db.backends.mysql"), None, &CustomMapping::new()).unwrap();
//! assert_eq!(rule_set.name(), "mysql");
//! ```

use std::fmt;

use compact_str::CompactString;
use indexmap::IndexMap;
use tracing::debug;

use crate::{
    error::AnalyserError,
    rules::{self, RuleSet}
};

/// Database dialect with a built-in rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Checks shared by all dialects, nothing dialect-specific. Only
    /// reachable through the `migration_linter::rules::Base` registry path.
    Default,
    MySql,
    PostgreSql,
    Sqlite
}

impl Dialect {
    /// Names accepted as explicit analyser, in listing order
    pub const BUILTIN_NAMES: [&'static str; 3] = ["sqlite", "mysql", "postgresql"];

    /// Infer the dialect from a database engine identifier.
    ///
    /// Matching is a case-insensitive substring test.
    pub fn infer(database: &str) -> Result<Self, AnalyserError> {
        let engine = database.to_lowercase();
        if engine.contains("mysql") {
            Ok(Self::MySql)
        } else if engine.contains("postgre") {
            Ok(Self::PostgreSql)
        } else if engine.contains("sqlite") {
            Ok(Self::Sqlite)
        } else {
            Err(AnalyserError::UnsupportedDialect(database.to_string()))
        }
    }

    /// Built-in dialect registered under an explicit analyser name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sqlite" => Some(Self::Sqlite),
            "mysql" => Some(Self::MySql),
            "postgresql" => Some(Self::PostgreSql),
            _ => None
        }
    }

    pub fn rule_set(self) -> &'static RuleSet {
        match self {
            Self::Default => rules::base(),
            Self::MySql => rules::mysql(),
            Self::PostgreSql => rules::postgresql(),
            Self::Sqlite => rules::sqlite()
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rule_set().name())
    }
}

/// Value of a custom analyser mapping entry.
#[derive(Debug, Clone)]
pub enum CustomAnalyser {
    /// Path of a loadable rule set, e.g. `migration_linter::rules::PostgreSql`
    Reference(String),
    /// Rule set supplied directly
    RuleSet(RuleSet)
}

impl From<&str> for CustomAnalyser {
    fn from(path: &str) -> Self {
        Self::Reference(path.to_string())
    }
}

impl From<RuleSet> for CustomAnalyser {
    fn from(rule_set: RuleSet) -> Self {
        Self::RuleSet(rule_set)
    }
}

/// Analyser name to custom analyser, in declaration order
pub type CustomMapping = IndexMap<String, CustomAnalyser>;

/// Rule sets that custom mapping references can load.
#[derive(Debug, Clone)]
pub struct RuleSetRegistry {
    entries: IndexMap<CompactString, RuleSet>
}

impl Default for RuleSetRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl RuleSetRegistry {
    pub fn empty() -> Self {
        Self {
            entries: IndexMap::new()
        }
    }

    /// Registry exposing the built-in rule sets under their paths
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for (path, dialect) in [
            ("migration_linter::rules::Base", Dialect::Default),
            ("migration_linter::rules::MySql", Dialect::MySql),
            ("migration_linter::rules::PostgreSql", Dialect::PostgreSql),
            ("migration_linter::rules::Sqlite", Dialect::Sqlite)
        ] {
            registry.register(path, dialect.rule_set().clone());
        }
        registry
    }

    /// Register a rule set under a `module::Name` path, replacing any
    /// previous entry
    pub fn register(&mut self, path: impl Into<CompactString>, rule_set: RuleSet) {
        self.entries.insert(path.into(), rule_set);
    }

    pub fn resolve(&self, path: &str) -> Option<&RuleSet> {
        self.entries.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(CompactString::as_str)
    }
}

/// Whether `path` has the `module::Name` shape of a loadable reference
fn is_qualified_path(path: &str) -> bool {
    match path.rsplit_once("::") {
        Some((module, name)) => {
            !module.is_empty()
                && !name.is_empty()
                && path
                    .split("::")
                    .all(|segment| !segment.is_empty() && segment.chars().all(is_ident_char))
        }
        None => false
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Picks a rule set from the database engine or an explicit name.
#[derive(Debug, Clone, Default)]
pub struct AnalyserSelector {
    registry: RuleSetRegistry
}

impl AnalyserSelector {
    pub fn new(registry: RuleSetRegistry) -> Self {
        Self {
            registry
        }
    }

    pub fn registry(&self) -> &RuleSetRegistry {
        &self.registry
    }

    /// Select the rule set for a project.
    ///
    /// With `sql_analyser` given, the name is looked up among the built-in
    /// names merged with `custom` (custom entries win). Otherwise the
    /// dialect is inferred from `database`. Fails before any SQL is
    /// analysed.
    pub fn select(
        &self,
        database: Option<&str>,
        sql_analyser: Option<&str>,
        custom: &CustomMapping
    ) -> Result<RuleSet, AnalyserError> {
        let rule_set = match sql_analyser {
            Some(name) => self.select_by_name(name, custom)?,
            None => Dialect::infer(database.unwrap_or_default())?
                .rule_set()
                .clone()
        };
        debug!(rule_set = rule_set.name(), "Chosen SQL analyser");
        Ok(rule_set)
    }

    fn select_by_name(&self, name: &str, custom: &CustomMapping) -> Result<RuleSet, AnalyserError> {
        let loaded = self.load_custom_mapping(custom)?;
        if let Some(rule_set) = loaded.get(name) {
            return Ok(rule_set.clone());
        }
        if let Some(dialect) = Dialect::from_name(name) {
            return Ok(dialect.rule_set().clone());
        }
        let mut known: Vec<String> = Dialect::BUILTIN_NAMES
            .iter()
            .map(|n| n.to_string())
            .collect();
        for key in loaded.keys() {
            if !known.iter().any(|k| k == key) {
                known.push(key.clone());
            }
        }
        Err(AnalyserError::UnknownAnalyser {
            name: name.to_string(),
            known
        })
    }

    /// Resolve every custom entry, failing on the first malformed one
    fn load_custom_mapping(
        &self,
        custom: &CustomMapping
    ) -> Result<IndexMap<String, RuleSet>, AnalyserError> {
        custom
            .iter()
            .map(|(key, value)| {
                let rule_set = match value {
                    CustomAnalyser::RuleSet(rule_set) => rule_set.clone(),
                    CustomAnalyser::Reference(path) => self
                        .resolve_reference(path)
                        .ok_or_else(|| AnalyserError::MalformedCustomMapping {
                            key:   key.clone(),
                            value: path.clone()
                        })?
                };
                Ok((key.clone(), rule_set))
            })
            .collect()
    }

    fn resolve_reference(&self, path: &str) -> Option<RuleSet> {
        if !is_qualified_path(path) {
            return None;
        }
        self.registry.resolve(path).cloned()
    }
}

/// Select with the built-in registry
pub fn select(
    database: Option<&str>,
    sql_analyser: Option<&str>,
    custom: &CustomMapping
) -> Result<RuleSet, AnalyserError> {
    AnalyserSelector::default().select(database, sql_analyser, custom)
}
