pub use masterror::{AppError, AppResult};
use thiserror::Error;

/// Failure to resolve which rule set should analyse a migration.
///
/// Raised before any SQL is scanned, so a bad configuration never produces
/// partial results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyserError {
    /// Explicit analyser name matches neither a built-in nor a custom entry
    #[error("Unknown SQL analyser '{name}'. Known values: '{}'", .known.join("','"))]
    UnknownAnalyser {
        name:  String,
        known: Vec<String>
    },
    /// Engine identifier does not name any supported database
    #[error("Unsupported database vendor '{0}'. Try specifying an SQL analyser.")]
    UnsupportedDialect(String),
    /// Custom mapping value is neither a loadable rule set path nor a rule set
    #[error(
        "Custom mapping value for '{key}' must be a fully qualified SQL analyser path \
         or a rule set: '{value}'"
    )]
    MalformedCustomMapping {
        key:   String,
        value: String
    }
}

impl From<AnalyserError> for AppError {
    fn from(err: AnalyserError) -> Self {
        AppError::bad_request(err.to_string())
    }
}

/// Create file read error
pub fn file_read_error(path: &str, source: std::io::Error) -> AppError {
    AppError::internal(format!("Failed to read file '{}': {}", path, source))
}

/// Create migration parse error with optional position info
pub fn migration_parse_error(path: &str, message: impl Into<String>) -> AppError {
    let msg = message.into();
    AppError::bad_request(format_parse_error(
        &format!("Migration parse error in '{}'", path),
        &msg
    ))
}

/// Create config error
pub fn config_error(message: impl Into<String>) -> AppError {
    AppError::bad_request(message.into())
}

/// Create cache error
pub fn cache_error(path: &str, message: impl Into<String>) -> AppError {
    AppError::internal(format!("Cache file '{}': {}", path, message.into()))
}

/// Format deserialization error with position highlighting
fn format_parse_error(prefix: &str, message: &str) -> String {
    // serde_json and serde_yaml report "... at line X column Y"
    if let Some(pos) = extract_position(message) {
        format!(
            "{} at line {}, column {}:\n  {}",
            prefix, pos.line, pos.column, message
        )
    } else {
        format!("{}:\n  {}", prefix, message)
    }
}

struct SourcePosition {
    line:   usize,
    column: usize
}

fn extract_position(message: &str) -> Option<SourcePosition> {
    let line_marker = "line ";
    let col_marker = " column ";

    let line_start = message.rfind(line_marker)?;
    let line_num_start = line_start + line_marker.len();
    let col_start = message[line_num_start..].find(col_marker)?;
    let line_str = &message[line_num_start..line_num_start + col_start];
    let col_num_start = line_num_start + col_start + col_marker.len();

    let col_end = message[col_num_start..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(message.len() - col_num_start);
    let col_str = &message[col_num_start..col_num_start + col_end];

    match (line_str.parse(), col_str.parse()) {
        (Ok(line), Ok(column)) => Some(SourcePosition { line, column }),
        _ => None
    }
}
