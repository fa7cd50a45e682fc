//! Application logic for the migration linter CLI.
//!
//! This module contains the core application logic separated from the main
//! entry point to enable testing.

use std::{
    env, fs,
    path::{Path, PathBuf}
};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    cache::{self, CachedOutcome, LintCache},
    cli::{AnalyserArgs, Format},
    config::{Config, QuietLevel},
    error::{AppResult, file_read_error},
    linter::{LintResult, LintSummary, LinterOptions, MigrationLinter},
    migration::{self, Migration},
    output::{OutputFormat, OutputOptions, format_lint_results, format_rule_set},
    rules::{self, RuleSet},
    selector::AnalyserSelector
};

/// Parameters for the lint command
#[derive(Debug, Clone, Default)]
pub struct LintParams {
    pub paths:                   Vec<PathBuf>,
    pub analyser:                AnalyserArgs,
    pub exclude_migration_tests: Vec<String>,
    /// `Some(vec![])` promotes every warning
    pub warnings_as_errors:      Option<Vec<String>>,
    pub include_apps:            Vec<String>,
    pub exclude_apps:            Vec<String>,
    pub ignore_name:             Vec<String>,
    pub ignore_name_contains:    Option<String>,
    pub include_name:            Vec<String>,
    pub include_name_contains:   Option<String>,
    pub no_cache:                bool,
    pub cache_path:              Option<PathBuf>,
    pub quiet:                   Vec<QuietLevel>,
    pub output_format:           Option<Format>,
    pub no_color:                bool
}

/// Parameters for the checks command
#[derive(Debug, Clone, Default)]
pub struct ChecksParams {
    pub analyser:      AnalyserArgs,
    pub output_format: Option<Format>,
    pub no_color:      bool
}

/// Result of a lint run containing all outputs
#[derive(Debug, Clone)]
pub struct LintOutcome {
    pub exit_code: i32,
    pub output:    String,
    pub results:   Vec<LintResult>,
    pub summary:   LintSummary
}

/// Convert CLI format to internal OutputFormat
pub fn convert_format(format: Option<Format>) -> OutputFormat {
    match format {
        Some(Format::Json) => OutputFormat::Json,
        Some(Format::Yaml) => OutputFormat::Yaml,
        Some(Format::Text) | None => OutputFormat::Text
    }
}

fn pick<T: Clone>(cli: &[T], config: &[T]) -> Vec<T> {
    if cli.is_empty() { config.to_vec() } else { cli.to_vec() }
}

/// Merge CLI parameters over the configuration file
pub fn build_linter_options(params: &LintParams, config: &Config) -> LinterOptions {
    let linter = &config.linter;
    let (warnings_as_errors, all_warnings_as_errors) = match &params.warnings_as_errors {
        Some(codes) if codes.is_empty() => (Vec::new(), true),
        Some(codes) => (codes.clone(), linter.all_warnings_as_errors),
        None => (linter.warnings_as_errors.clone(), linter.all_warnings_as_errors)
    };
    LinterOptions {
        exclude_migration_tests: pick(
            &params.exclude_migration_tests,
            &linter.exclude_migration_tests
        )
        .into_iter()
        .map(Into::into)
        .collect(),
        warnings_as_errors,
        all_warnings_as_errors,
        include_apps:            pick(&params.include_apps, &linter.include_apps),
        exclude_apps:            pick(&params.exclude_apps, &linter.exclude_apps),
        ignore_name:             pick(&params.ignore_name, &linter.ignore_name),
        ignore_name_contains:    params
            .ignore_name_contains
            .clone()
            .or_else(|| linter.ignore_name_contains.clone()),
        include_name:            pick(&params.include_name, &linter.include_name),
        include_name_contains:   params
            .include_name_contains
            .clone()
            .or_else(|| linter.include_name_contains.clone())
    }
}

/// Select the rule set from CLI arguments, falling back to the config
pub fn select_rule_set(analyser: &AnalyserArgs, config: &Config) -> AppResult<RuleSet> {
    let database = analyser
        .database
        .as_deref()
        .or(config.linter.database.as_deref());
    let sql_analyser = analyser
        .sql_analyser
        .as_deref()
        .or(config.linter.sql_analyser.as_deref());
    let rule_set =
        AnalyserSelector::default().select(database, sql_analyser, &config.custom_mapping())?;
    Ok(rule_set)
}

fn open_cache(params: &LintParams, config: &Config, linter: &MigrationLinter) -> Option<LintCache> {
    if params.no_cache || config.linter.no_cache {
        return None;
    }
    let dir = params
        .cache_path
        .clone()
        .or_else(|| config.linter.cache_path.clone())
        .or_else(cache::default_cache_dir)?;
    let project = env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "project".to_string());
    let rule_set = linter.rule_set().name();
    let path = dir.join(cache::cache_file_name(&project, rule_set));
    debug!(path = %path.display(), "Using cache");
    Some(LintCache::load(
        path,
        cache::fingerprint(rule_set, linter.options())
    ))
}

fn load_migration(path: &Path) -> AppResult<(Migration, String)> {
    let contents =
        fs::read_to_string(path).map_err(|e| file_read_error(&path.display().to_string(), e))?;
    let migration = Migration::parse(path, &contents)?;
    Ok((migration, cache::digest(contents.as_bytes())))
}

fn lint_one(
    linter: &MigrationLinter,
    cache: Option<&LintCache>,
    migration: &Migration,
    digest: &str
) -> (LintResult, Option<CachedOutcome>) {
    if linter.should_ignore(migration) {
        return (linter.lint(migration), None);
    }
    if let Some(outcome) = cache.and_then(|c| c.get(digest)) {
        debug!(app = %migration.app_label, name = %migration.name, "Cache hit");
        return (
            outcome.replay(&migration.app_label, &migration.name),
            Some(outcome.clone())
        );
    }
    let result = linter.lint(migration);
    let outcome = CachedOutcome::from_result(&result);
    (result, Some(outcome))
}

/// Run the lint command
pub fn run_lint(params: &LintParams, config: &Config) -> AppResult<LintOutcome> {
    let rule_set = select_rule_set(&params.analyser, config)?;
    let linter = MigrationLinter::new(rule_set, build_linter_options(params, config));
    let mut cache = open_cache(params, config, &linter);

    let files = migration::discover(&params.paths)?;
    info!(count = files.len(), rule_set = linter.rule_set().name(), "Linting migrations");
    let migrations = files
        .par_iter()
        .map(|path| load_migration(path))
        .collect::<AppResult<Vec<_>>>()?;

    let mut linted: Vec<(LintResult, Option<(String, CachedOutcome)>)> = migrations
        .par_iter()
        .map(|(migration, digest)| {
            let (result, outcome) = lint_one(&linter, cache.as_ref(), migration, digest);
            (result, outcome.map(|o| (digest.clone(), o)))
        })
        .collect();
    linted.sort_by(|(a, _), (b, _)| {
        (a.app_label.as_str(), a.name.as_str()).cmp(&(b.app_label.as_str(), b.name.as_str()))
    });

    let mut results = Vec::with_capacity(linted.len());
    for (result, outcome) in linted {
        if let (Some(cache), Some((digest, outcome))) = (cache.as_mut(), outcome) {
            cache.insert(digest, outcome);
        }
        results.push(result);
    }
    if let Some(cache) = &cache
        && let Err(e) = cache.save()
    {
        warn!(error = %e, "Failed to write cache");
    }

    let opts = OutputOptions {
        format:  convert_format(params.output_format),
        colored: !params.no_color,
        quiet:   pick(&params.quiet, &config.linter.quiet)
    };
    let summary = LintSummary::from_results(&results);
    Ok(LintOutcome {
        exit_code: if summary.has_errors() { 1 } else { 0 },
        output: format_lint_results(&results, &opts),
        results,
        summary
    })
}

/// Run the checks command
///
/// Without database or analyser the base rule set is listed.
pub fn run_checks(params: &ChecksParams, config: &Config) -> AppResult<String> {
    let has_selection = params.analyser.database.is_some()
        || params.analyser.sql_analyser.is_some()
        || config.linter.database.is_some()
        || config.linter.sql_analyser.is_some();
    let rule_set = if has_selection {
        select_rule_set(&params.analyser, config)?
    } else {
        rules::base().clone()
    };
    let opts = OutputOptions {
        format:  convert_format(params.output_format),
        colored: !params.no_color,
        quiet:   Vec::new()
    };
    Ok(format_rule_set(&rule_set, &opts))
}
