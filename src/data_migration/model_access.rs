//! Heuristic model-access checks over data-migration source text.
//!
//! Data migrations must use the historical model returned by
//! `apps.get_model(...)`; a model imported from application code reflects
//! the current schema, not the one at this point of the migration graph.
//! The checks below look at source text only. They can miss aliasing
//! through helpers and may flag names that merely end in `.objects`.

use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::Regex;

use super::callable::FunctionSource;
use crate::rules::{Issue, Severity};

pub const MODEL_IMPORT: &str = "RUNPYTHON_MODEL_IMPORT";
pub const MODEL_VARIABLE_NAME: &str = "RUNPYTHON_MODEL_VARIABLE_NAME";

static MODEL_USAGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^a-zA-Z0-9._]?([a-zA-Z0-9._]+?)\.objects").expect("valid regex")
});

static STRING_LITERAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']([^"']*)["']"#).expect("valid regex"));

/// Issue paired with the severity it is reported at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub issue:    Issue
}

/// Model identifiers used as `<name>.objects`, first use first.
///
/// Dotted accesses keep the leading identifier (`models.Book.objects`
/// yields `models`). The byte offset is that of the first use.
fn model_usages(source: &str) -> Vec<(usize, String)> {
    let mut seen = IndexSet::new();
    let mut usages = Vec::new();
    for caps in MODEL_USAGE_REGEX.captures_iter(source) {
        let Some(found) = caps.get(1) else {
            continue;
        };
        let base = found.as_str().split('.').next().unwrap_or_default();
        if base.is_empty() || !seen.insert(base.to_string()) {
            continue;
        }
        usages.push((found.start(), base.to_string()));
    }
    usages
}

/// Regex matching `<model> ... = <obj>.get_model(<args>)`, args captured
fn get_model_assignment(model: &str) -> Option<Regex> {
    Regex::new(&format!(
        r"\b{}\b[^\n=]*=\s*\w+\.get_model\(([^)]*)\)",
        regex::escape(model)
    ))
    .ok()
}

/// Class name passed to `get_model`, either `("app", "Model")` or
/// `("app.Model")`. `None` when no string literal is passed.
fn requested_class(args: &str) -> Option<&str> {
    let literals: Vec<&str> = STRING_LITERAL_REGEX
        .captures_iter(args)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();
    match literals.as_slice() {
        [] => None,
        [single] => single.rsplit('.').next(),
        [.., last] => Some(*last)
    }
}

/// Classify how a data-migration function accesses models.
///
/// - `RUNPYTHON_MODEL_IMPORT` (error): a model is used before any
///   `get_model` assignment to it
/// - `RUNPYTHON_MODEL_VARIABLE_NAME` (warning): the variable holding a
///   looked-up model is named differently from the requested class
pub fn classify_model_access(function: &FunctionSource) -> Vec<Finding> {
    let source = function.source.as_str();
    let mut findings = Vec::new();
    for (first_use, model) in model_usages(source) {
        let Some(assignment) = get_model_assignment(&model) else {
            continue;
        };
        let Some(caps) = assignment
            .captures(source)
            .filter(|caps| caps.get(0).is_some_and(|m| m.start() < first_use))
        else {
            findings.push(Finding {
                severity: Severity::Error,
                issue:    Issue::new(
                    MODEL_IMPORT,
                    format!(
                        "'{}': Could not find an 'apps.get_model(\"...\", \"{}\")' call. \
                         Importing the model directly is incorrect for data migrations.",
                        function.name, model
                    )
                )
            });
            continue;
        };
        let requested = caps.get(1).and_then(|args| requested_class(args.as_str()));
        if let Some(class) = requested
            && class != model
        {
            findings.push(Finding {
                severity: Severity::Warning,
                issue:    Issue::new(
                    MODEL_VARIABLE_NAME,
                    format!(
                        "'{}': Model variable name {} is different from the model class name \
                         that was found in the apps.get_model(...) call.",
                        function.name, model
                    )
                )
            });
        }
    }
    findings
}
