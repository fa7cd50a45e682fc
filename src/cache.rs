//! On-disk cache of lint outcomes.
//!
//! Entries are keyed by the SHA-256 of the migration file, so an edited
//! migration is linted again. One cache file exists per project and rule
//! set. Each run reads the previous file and writes a fresh one holding only
//! the migrations seen in this run, which prunes stale entries.
//!
//! The file records a fingerprint of the rule set and the options that
//! change classification; a mismatch discards every previous entry.

use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf}
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::{
    error::{AppResult, cache_error},
    linter::{LintResult, LintStatus, LinterOptions},
    rules::AnalysisReport
};

/// Cached verdict of one migration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedOutcome {
    pub status: LintStatus,
    #[serde(flatten)]
    pub report: AnalysisReport
}

impl CachedOutcome {
    pub fn from_result(result: &LintResult) -> Self {
        Self {
            status: result.status,
            report: result.report.clone()
        }
    }

    /// Rebuild the result for a migration, marked as cached
    pub fn replay(&self, app_label: &str, name: &str) -> LintResult {
        LintResult {
            app_label: app_label.to_string(),
            name:      name.to_string(),
            status:    self.status,
            report:    self.report.clone(),
            cached:    true
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    fingerprint: String,
    #[serde(default)]
    entries:     IndexMap<String, CachedOutcome>
}

/// Old entries read at start, new entries written at the end.
#[derive(Debug)]
pub struct LintCache {
    path:        PathBuf,
    fingerprint: String,
    old:         HashMap<String, CachedOutcome>,
    new:         IndexMap<String, CachedOutcome>
}

/// Hex SHA-256 of file contents
pub fn digest(contents: &[u8]) -> String {
    hex::encode(Sha256::digest(contents))
}

/// Fingerprint of everything that changes how issues are classified
pub fn fingerprint(rule_set: &str, options: &LinterOptions) -> String {
    let mut excluded: Vec<&str> = options
        .exclude_migration_tests
        .iter()
        .map(|c| c.as_str())
        .collect();
    excluded.sort_unstable();
    let mut promoted: Vec<&str> = options
        .warnings_as_errors
        .iter()
        .map(String::as_str)
        .collect();
    promoted.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(env!("CARGO_PKG_VERSION"));
    hasher.update([0u8]);
    hasher.update(rule_set);
    hasher.update([0u8]);
    hasher.update(excluded.join(","));
    hasher.update([0u8]);
    hasher.update(promoted.join(","));
    hasher.update([u8::from(options.all_warnings_as_errors)]);
    hex::encode(hasher.finalize())
}

/// `$XDG_CACHE_HOME/migration-linter`, else `~/.cache/migration-linter`
pub fn default_cache_dir() -> Option<PathBuf> {
    env::var_os("XDG_CACHE_HOME")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))
        .map(|dir| dir.join("migration-linter"))
}

/// File name of a project's cache, `<project>_<rule set>.json`
pub fn cache_file_name(project: &str, rule_set: &str) -> String {
    let sanitize = |s: &str| -> String {
        s.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect()
    };
    format!("{}_{}.json", sanitize(project), sanitize(rule_set))
}

impl LintCache {
    /// Load the cache at `path`.
    ///
    /// A missing, unreadable or outdated file yields an empty cache.
    pub fn load(path: impl Into<PathBuf>, fingerprint: impl Into<String>) -> Self {
        let path = path.into();
        let fingerprint = fingerprint.into();
        let old = match read_cache_file(&path) {
            Ok(Some(file)) if file.fingerprint == fingerprint => file.entries.into_iter().collect(),
            Ok(Some(_)) => {
                debug!(path = %path.display(), "Cache fingerprint changed, discarding entries");
                HashMap::new()
            }
            Ok(None) => HashMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable cache");
                HashMap::new()
            }
        };
        Self {
            path,
            fingerprint,
            old,
            new: IndexMap::new()
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Outcome cached by a previous run
    pub fn get(&self, digest: &str) -> Option<&CachedOutcome> {
        self.old.get(digest)
    }

    /// Keep an outcome for the next run
    pub fn insert(&mut self, digest: impl Into<String>, outcome: CachedOutcome) {
        self.new.insert(digest.into(), outcome);
    }

    pub fn len(&self) -> usize {
        self.new.len()
    }

    pub fn is_empty(&self) -> bool {
        self.new.is_empty()
    }

    /// Write the entries of this run, replacing the previous file
    pub fn save(&self) -> AppResult<()> {
        let display = self.path.display().to_string();
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).map_err(|e| cache_error(&display, e.to_string()))?;
        }
        let file = CacheFile {
            fingerprint: self.fingerprint.clone(),
            entries:     self.new.clone()
        };
        let json =
            serde_json::to_string_pretty(&file).map_err(|e| cache_error(&display, e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| cache_error(&display, e.to_string()))?;
        debug!(path = %self.path.display(), entries = self.new.len(), "Cache saved");
        Ok(())
    }
}

fn read_cache_file(path: &Path) -> AppResult<Option<CacheFile>> {
    let display = path.display().to_string();
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(cache_error(&display, e.to_string()))
    };
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|e| cache_error(&display, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_stable_hex() {
        let d = digest(b"ALTER TABLE a DROP COLUMN b;");
        assert_eq!(d.len(), 64);
        assert_eq!(d, digest(b"ALTER TABLE a DROP COLUMN b;"));
        assert_ne!(d, digest(b"ALTER TABLE a DROP COLUMN c;"));
    }

    #[test]
    fn test_fingerprint_ignores_code_order() {
        let a = LinterOptions {
            warnings_as_errors: vec!["A".into(), "B".into()],
            ..Default::default()
        };
        let b = LinterOptions {
            warnings_as_errors: vec!["B".into(), "A".into()],
            ..Default::default()
        };
        assert_eq!(fingerprint("postgresql", &a), fingerprint("postgresql", &b));
        assert_ne!(fingerprint("postgresql", &a), fingerprint("mysql", &a));
    }

    #[test]
    fn test_cache_file_name_is_sanitized() {
        assert_eq!(cache_file_name("/srv/app", "postgresql"), "_srv_app_postgresql.json");
    }
}
