//! Migration files read from disk.
//!
//! Two layouts are accepted:
//!
//! - `.sql`: the SQL generated for one migration, one statement per line.
//!   Blank lines and `--` comments are dropped.
//! - `.json` / `.yaml` / `.yml`: a manifest carrying the generated SQL and
//!   the migration's operations.
//!
//! ```yaml
//! app_label: library
//! name: 0004_backfill_titles
//! sql:
//!   - ALTER TABLE "library_book" ADD COLUMN "title" varchar(100) NULL;
//! operations:
//!   - kind: schema
//!     description: Add field title to book
//!   - kind: run_python
//!     code:
//!       function:
//!         name: backfill_titles
//!         params: [apps, schema_editor]
//!         source: |
//!           def backfill_titles(apps, schema_editor):
//!               Book = apps.get_model("library", "Book")
//!               Book.objects.update(title="")
//! ```
//!
//! The app label defaults to the directory holding `migrations/` and the
//! name to the file stem.

use std::{
    fs,
    path::{Path, PathBuf}
};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::{
    data_migration::{RunPython, RunSql},
    error::{AppResult, file_read_error, migration_parse_error}
};

/// File extensions read as migrations
pub const MIGRATION_EXTENSIONS: [&str; 4] = ["sql", "json", "yaml", "yml"];

/// Operation declared by a migration, as far as linting cares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    RunPython(RunPython),
    RunSql(RunSql),
    /// Marker operation excluding the migration from linting
    IgnoreMigration,
    /// Any schema operation; its effect is already in the generated SQL
    Schema {
        #[serde(default)]
        description: String
    }
}

impl Operation {
    pub fn is_run_python(&self) -> bool {
        matches!(self, Self::RunPython(_))
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }
}

/// A migration identified by app label and name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Migration {
    pub app_label:  String,
    pub name:       String,
    /// Generated SQL statements, in order
    #[serde(default)]
    pub sql:        Vec<String>,
    #[serde(default)]
    pub operations: Vec<Operation>
}

#[derive(Deserialize)]
struct Manifest {
    app_label:  Option<String>,
    name:       Option<String>,
    #[serde(default)]
    sql:        Vec<String>,
    #[serde(default)]
    operations: Vec<Operation>
}

impl Migration {
    pub fn new(app_label: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            app_label:  app_label.into(),
            name:       name.into(),
            sql:        Vec::new(),
            operations: Vec::new()
        }
    }

    #[must_use]
    pub fn with_sql<I, S>(mut self, sql: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>
    {
        self.sql = sql.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_operations(mut self, operations: Vec<Operation>) -> Self {
        self.operations = operations;
        self
    }

    /// Read and parse a migration file
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let contents =
            fs::read_to_string(path).map_err(|e| file_read_error(&path.display().to_string(), e))?;
        Self::parse(path, &contents)
    }

    /// Parse migration contents, using `path` for its extension and identity
    pub fn parse(path: &Path, contents: &str) -> AppResult<Self> {
        let display = path.display().to_string();
        let (app_label, name) = identity_from_path(path);
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let manifest: Manifest = match extension.as_str() {
            "sql" => {
                return Ok(Self::new(app_label, name).with_sql(split_sql(contents)));
            }
            "json" => serde_json::from_str(contents)
                .map_err(|e| migration_parse_error(&display, e.to_string()))?,
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| migration_parse_error(&display, e.to_string()))?,
            other => {
                return Err(migration_parse_error(
                    &display,
                    format!("unsupported file extension '{}'", other)
                ));
            }
        };
        Ok(Self {
            app_label:  manifest.app_label.unwrap_or(app_label),
            name:       manifest.name.unwrap_or(name),
            sql:        manifest.sql,
            operations: manifest.operations
        })
    }

    pub fn is_ignored_by_operation(&self) -> bool {
        self.operations
            .iter()
            .any(|op| matches!(op, Operation::IgnoreMigration))
    }
}

/// Split generated SQL into statements, one per non-comment line
pub fn split_sql(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("--"))
        .map(String::from)
        .collect()
}

/// App label and migration name implied by a file path
fn identity_from_path(path: &Path) -> (String, String) {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir_name = |p: Option<&Path>| {
        p.and_then(Path::file_name)
            .map(|s| s.to_string_lossy().into_owned())
    };
    let parent = path.parent();
    let app_label = match dir_name(parent) {
        Some(dir) if dir == "migrations" => {
            dir_name(parent.and_then(Path::parent)).unwrap_or(dir)
        }
        Some(dir) => dir,
        None => String::new()
    };
    (app_label, name)
}

fn is_migration_file(path: &Path) -> bool {
    let supported = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| MIGRATION_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
    let is_init = path
        .file_name()
        .is_some_and(|n| n.to_string_lossy().contains("__init__"));
    supported && !is_init
}

/// Collect migration files from files and directories.
///
/// Directories are walked recursively. Explicit file paths are kept even
/// with an unknown extension so that parsing reports them.
pub fn discover(paths: &[PathBuf]) -> AppResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        let metadata =
            fs::metadata(path).map_err(|e| file_read_error(&path.display().to_string(), e))?;
        if !metadata.is_dir() {
            files.push(path.clone());
            continue;
        }
        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_migration_file(e.path()))
            .map(|e| e.into_path())
            .collect();
        found.sort();
        files.extend(found);
    }
    Ok(files)
}
