use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// One RunSQL entry: plain SQL, or SQL with `%s` parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlStatement {
    Plain(String),
    WithParams(String, Vec<Value>)
}

impl SqlStatement {
    /// SQL text with parameters substituted
    pub fn render(&self) -> String {
        match self {
            Self::Plain(sql) => sql.clone(),
            Self::WithParams(sql, params) => substitute_params(sql, params)
        }
    }
}

/// SQL of a RunSQL operation, forward or reverse.
///
/// An empty string or an empty list is a no-op and is not analysed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlSource {
    Single(String),
    Many(Vec<SqlStatement>)
}

impl SqlSource {
    pub fn is_noop(&self) -> bool {
        match self {
            Self::Single(sql) => sql.trim().is_empty(),
            Self::Many(statements) => statements.is_empty()
        }
    }

    /// Statements handed to the SQL analyser, in order
    pub fn statements(&self) -> Vec<String> {
        match self {
            Self::Single(sql) => vec![sql.clone()],
            Self::Many(statements) => statements.iter().map(SqlStatement::render).collect()
        }
    }
}

fn render_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        other => other.to_string()
    }
}

/// Replace each `%s` with the next parameter and `%%` with `%`.
///
/// Placeholders without a matching parameter are kept as-is.
fn substitute_params(sql: &str, params: &[Value]) -> String {
    let mut rendered = String::with_capacity(sql.len());
    let mut params = params.iter();
    let mut missing = 0usize;
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            rendered.push(c);
            continue;
        }
        match chars.peek() {
            Some('%') => {
                chars.next();
                rendered.push('%');
            }
            Some('s') => {
                chars.next();
                match params.next() {
                    Some(value) => rendered.push_str(&render_param(value)),
                    None => {
                        missing += 1;
                        rendered.push_str("%s");
                    }
                }
            }
            _ => rendered.push('%')
        }
    }
    if missing > 0 {
        warn!(sql, missing, "RunSQL statement has more placeholders than parameters");
    }
    rendered
}
