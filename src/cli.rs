use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::QuietLevel;

/// Migration Linter - Detect backward incompatible schema migrations
#[derive(Parser, Debug)]
#[command(name = "migration-linter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Lint migration files
    Lint {
        /// Migration files or directories to lint
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        analyser: AnalyserArgs,

        /// Check codes to ignore
        #[arg(long, value_delimiter = ',')]
        exclude_migration_tests: Vec<String>,

        /// Promote warnings to errors; without codes every warning is promoted
        #[arg(long, num_args = 0.., value_delimiter = ',')]
        warnings_as_errors: Option<Vec<String>>,

        /// Only lint these apps
        #[arg(long, value_delimiter = ',')]
        include_apps: Vec<String>,

        /// Skip these apps
        #[arg(long, value_delimiter = ',')]
        exclude_apps: Vec<String>,

        /// Skip migrations with these names
        #[arg(long, value_delimiter = ',')]
        ignore_name: Vec<String>,

        /// Skip migrations whose name contains this text
        #[arg(long)]
        ignore_name_contains: Option<String>,

        /// Only lint migrations with these names
        #[arg(long, value_delimiter = ',')]
        include_name: Vec<String>,

        /// Only lint migrations whose name contains this text
        #[arg(long)]
        include_name_contains: Option<String>,

        /// Do not read or write the cache
        #[arg(long)]
        no_cache: bool,

        /// Cache directory
        #[arg(long)]
        cache_path: Option<PathBuf>,

        /// Silence output categories
        #[arg(short, long, value_enum, num_args = 1.., value_delimiter = ',')]
        quiet: Vec<QuietLevel>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        output_format: Format,

        /// Enable debug logging
        #[arg(short, long)]
        verbose: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool
    },
    /// List the checks of the selected rule set
    Checks {
        #[command(flatten)]
        analyser: AnalyserArgs,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        output_format: Format,

        /// Disable colored output
        #[arg(long)]
        no_color: bool
    }
}

/// Options choosing the rule set
#[derive(Args, Debug, Clone, Default)]
pub struct AnalyserArgs {
    /// Database engine identifier, e.g. django.db.backends.postgresql
    #[arg(long, env = "MIGRATION_LINTER_DATABASE")]
    pub database: Option<String>,

    /// Analyser name, overrides the database engine
    #[arg(long, env = "MIGRATION_LINTER_SQL_ANALYSER")]
    pub sql_analyser: Option<String>
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
    Yaml
}
