use std::fs;

use migration_linter::{
    config::{Config, QuietLevel},
    selector::{CustomAnalyser, select}
};
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert!(config.linter.database.is_none());
    assert!(config.linter.sql_analyser.is_none());
    assert!(config.linter.exclude_migration_tests.is_empty());
    assert!(!config.linter.all_warnings_as_errors);
    assert!(!config.linter.no_cache);
    assert!(config.analysers.is_empty());
}

#[test]
fn test_parse_full_config() {
    let config = Config::parse(
        r#"
[linter]
database = "django.db.backends.postgresql"
exclude_migration_tests = ["CREATE_INDEX", "DROP_INDEX"]
warnings_as_errors = ["RUNPYTHON_REVERSIBLE"]
include_apps = ["library"]
ignore_name_contains = "squashed"
quiet = ["ok", "ignore"]
no_cache = true
cache_path = "/tmp/migration-linter"

[analysers]
legacy = "migration_linter::rules::MySql"
"#
    )
    .unwrap();

    assert_eq!(
        config.linter.database.as_deref(),
        Some("django.db.backends.postgresql")
    );
    assert_eq!(
        config.linter.exclude_migration_tests,
        vec!["CREATE_INDEX", "DROP_INDEX"]
    );
    assert_eq!(config.linter.warnings_as_errors, vec!["RUNPYTHON_REVERSIBLE"]);
    assert_eq!(config.linter.include_apps, vec!["library"]);
    assert_eq!(config.linter.ignore_name_contains.as_deref(), Some("squashed"));
    assert_eq!(config.linter.quiet, vec![QuietLevel::Ok, QuietLevel::Ignore]);
    assert!(config.linter.no_cache);
    assert_eq!(
        config.linter.cache_path.as_deref(),
        Some(std::path::Path::new("/tmp/migration-linter"))
    );
    assert_eq!(config.analysers.len(), 1);
}

#[test]
fn test_invalid_config() {
    assert!(Config::parse("[linter]\nno_cache = \"sometimes\"\n").is_err());
    assert!(Config::parse("[linter\n").is_err());
}

#[test]
fn test_custom_mapping_feeds_selector() {
    let config = Config::parse(
        r#"
[linter]
sql_analyser = "legacy"

[analysers]
legacy = "migration_linter::rules::MySql"
"#
    )
    .unwrap();
    let mapping = config.custom_mapping();
    assert!(matches!(
        mapping.get("legacy"),
        Some(CustomAnalyser::Reference(path)) if path == "migration_linter::rules::MySql"
    ));
    let rule_set = select(None, config.linter.sql_analyser.as_deref(), &mapping).unwrap();
    assert_eq!(rule_set.name(), "mysql");
}

#[test]
fn test_local_config_wins_over_home() {
    let dir = TempDir::new().unwrap();
    let home = dir.path().join("home.toml");
    let local = dir.path().join("local.toml");
    fs::write(&home, "[linter]\ndatabase = \"sqlite\"\n").unwrap();
    fs::write(&local, "[linter]\nsql_analyser = \"mysql\"\n").unwrap();

    let config = Config::load_files(Some(&home), &local).unwrap();
    assert_eq!(config.linter.sql_analyser.as_deref(), Some("mysql"));
    assert!(config.linter.database.is_none());
}

#[test]
fn test_home_config_used_without_local() {
    let dir = TempDir::new().unwrap();
    let home = dir.path().join("home.toml");
    fs::write(&home, "[linter]\ndatabase = \"sqlite\"\n").unwrap();

    let config = Config::load_files(Some(&home), &dir.path().join("missing.toml")).unwrap();
    assert_eq!(config.linter.database.as_deref(), Some("sqlite"));
}

#[test]
fn test_no_config_files() {
    let dir = TempDir::new().unwrap();
    let config = Config::load_files(None, &dir.path().join("missing.toml")).unwrap();
    assert!(config.linter.database.is_none());
}
