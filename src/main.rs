//! # Migration Linter
//!
//! Detect backward-incompatible schema migrations before they reach a live
//! database.
//!
//! `migration-linter` reads the SQL a web framework generates for each
//! migration, together with the migration's data operations, and flags
//! changes that break the code still running against the database during a
//! rolling deploy: dropped or renamed columns and tables, `NOT NULL` columns
//! without a default, unique constraints on populated tables, lock-heavy
//! index builds, and data migrations that cannot be reversed.
//!
//! # Quick Start
//!
//! ```bash
//! # Lint every migration below a directory
//! migration-linter lint --database django.db.backends.postgresql app/migrations
//!
//! # Force a rule set and ignore index warnings
//! migration-linter lint --sql-analyser mysql --exclude-migration-tests CREATE_INDEX app/
//!
//! # Machine-readable output
//! migration-linter lint --sql-analyser sqlite -f json app/migrations
//!
//! # Show the checks of a rule set
//! migration-linter checks --sql-analyser postgresql
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded from (in order of precedence):
//!
//! 1. Command-line arguments
//! 2. Environment variables (`MIGRATION_LINTER_DATABASE`,
//!    `MIGRATION_LINTER_SQL_ANALYSER`)
//! 3. `.migration-linter.toml` in current directory
//! 4. `~/.config/migration-linter/config.toml`
//!
//! ## Example Configuration
//!
//! ```toml
//! [linter]
//! database = "django.db.backends.postgresql"
//! exclude_migration_tests = ["CREATE_INDEX"]
//! warnings_as_errors = ["RUNPYTHON_REVERSIBLE"]
//! ignore_name_contains = "squashed"
//! ```
//!
//! # Checks
//!
//! | Code | Dialects | Severity | Description |
//! |------|----------|----------|-------------|
//! | RENAME_TABLE | all | error | Renaming a table |
//! | NOT_NULL | all | error | `NOT NULL` column without a default |
//! | DROP_COLUMN | all | error | Dropping a column |
//! | DROP_TABLE | all | error | Dropping a table |
//! | RENAME_COLUMN | all | error | Renaming a column |
//! | ALTER_COLUMN | all | error | Changing a column type |
//! | ADD_UNIQUE | all | error | Unique constraint on an existing table |
//! | CREATE_INDEX | postgresql | warning | Index build locks writes |
//! | CREATE_INDEX_EXCLUSIVE | postgresql | warning | Index build under an exclusive lock |
//! | DROP_INDEX | postgresql | warning | Non-concurrent index drop |
//! | REINDEX | postgresql | warning | Index rebuild locks writes |
//! | RUNPYTHON_* / RUNSQL_* | all | mixed | Data migration checks |
//!
//! # Exit Codes
//!
//! - `0` - No migration has errors
//! - `1` - At least one migration has errors, or the run failed
//!
//! # Logging
//!
//! Diagnostics go to stderr through `tracing`. `RUST_LOG` selects the
//! level; `--verbose` defaults it to `debug`.

use std::process;

use clap::Parser;
use migration_linter::{
    app::{ChecksParams, LintParams, run_checks, run_lint},
    cli::{Cli, Commands},
    config::Config,
    error::AppResult
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() {
    match run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run() -> AppResult<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Lint {
            paths,
            analyser,
            exclude_migration_tests,
            warnings_as_errors,
            include_apps,
            exclude_apps,
            ignore_name,
            ignore_name_contains,
            include_name,
            include_name_contains,
            no_cache,
            cache_path,
            quiet,
            output_format,
            verbose,
            no_color
        } => {
            init_tracing(verbose);
            let config = Config::load()?;
            let params = LintParams {
                paths,
                analyser,
                exclude_migration_tests,
                warnings_as_errors,
                include_apps,
                exclude_apps,
                ignore_name,
                ignore_name_contains,
                include_name,
                include_name_contains,
                no_cache,
                cache_path,
                quiet,
                output_format: Some(output_format),
                no_color
            };
            let outcome = run_lint(&params, &config)?;
            print!("{}", outcome.output);
            Ok(outcome.exit_code)
        }
        Commands::Checks {
            analyser,
            output_format,
            no_color
        } => {
            init_tracing(false);
            let config = Config::load()?;
            let params = ChecksParams {
                analyser,
                output_format: Some(output_format),
                no_color
            };
            println!("{}", run_checks(&params, &config)?);
            Ok(0)
        }
    }
}
