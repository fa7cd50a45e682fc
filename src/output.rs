use colored::Colorize;
use serde::Serialize;

use crate::{
    config::QuietLevel,
    linter::{LintResult, LintStatus, LintSummary},
    rules::{CheckMode, Issue, RuleSet, Severity}
};

/// Output format for results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml
}

/// Output options
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format:  OutputFormat,
    pub colored: bool,
    /// Categories left out of text output
    pub quiet:   Vec<QuietLevel>
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format:  OutputFormat::Text,
            colored: true,
            quiet:   Vec::new()
        }
    }
}

impl OutputOptions {
    fn is_quiet(&self, level: QuietLevel) -> bool {
        self.quiet.contains(&level)
    }
}

/// Lint run for serialization
#[derive(Debug, Serialize)]
pub struct LintReportOutput<'a> {
    pub migrations: &'a [LintResult],
    pub summary:    LintSummary
}

/// Check description for serialization
#[derive(Debug, Serialize)]
pub struct CheckInfo {
    pub code:     &'static str,
    pub mode:     CheckMode,
    pub severity: Severity,
    pub message:  &'static str
}

/// Rule set listing for serialization
#[derive(Debug, Serialize)]
pub struct RuleSetOutput<'a> {
    pub rule_set: &'a str,
    pub checks:   Vec<CheckInfo>
}

fn quiet_level(status: LintStatus) -> QuietLevel {
    match status {
        LintStatus::Ok => QuietLevel::Ok,
        LintStatus::OkIgnored | LintStatus::Ignore => QuietLevel::Ignore,
        LintStatus::Warning => QuietLevel::Warning,
        LintStatus::Error => QuietLevel::Error
    }
}

/// Format lint results based on output options
pub fn format_lint_results(results: &[LintResult], opts: &OutputOptions) -> String {
    let summary = LintSummary::from_results(results);
    match opts.format {
        OutputFormat::Json => serde_json::to_string_pretty(&LintReportOutput {
            migrations: results,
            summary
        })
        .unwrap_or_default(),
        OutputFormat::Yaml => serde_yaml::to_string(&LintReportOutput {
            migrations: results,
            summary
        })
        .unwrap_or_default(),
        OutputFormat::Text => {
            let mut output = String::new();
            for result in results {
                output.push_str(&format_text_result(result, opts));
            }
            output.push_str(&format_summary(&summary, opts));
            output
        }
    }
}

/// `(app, name)... STATUS` line followed by its issues
pub fn format_text_result(result: &LintResult, opts: &OutputOptions) -> String {
    let mut output = String::new();
    if !opts.is_quiet(quiet_level(result.status)) {
        let mut status = result.status.to_string();
        if result.cached {
            status.push_str(" (cached)");
        }
        let status = if opts.colored {
            match result.status {
                LintStatus::Ok => status.green().to_string(),
                LintStatus::OkIgnored | LintStatus::Ignore => status.blue().to_string(),
                LintStatus::Warning => status.yellow().to_string(),
                LintStatus::Error => status.red().bold().to_string()
            }
        } else {
            status
        };
        output.push_str(&format!("({}, {})... {}\n", result.app_label, result.name, status));
    }
    match result.status {
        LintStatus::Error => {
            push_errors(&mut output, &result.report.errors, opts);
            push_warnings(&mut output, &result.report.warnings, opts);
        }
        LintStatus::Warning => push_warnings(&mut output, &result.report.warnings, opts),
        LintStatus::OkIgnored => push_errors(&mut output, &result.report.ignored, opts),
        LintStatus::Ok | LintStatus::Ignore => {}
    }
    output
}

fn push_errors(output: &mut String, issues: &[Issue], opts: &OutputOptions) {
    if opts.is_quiet(QuietLevel::Error) {
        return;
    }
    for issue in issues {
        output.push_str(&format!("\t{}\n", issue));
    }
}

fn push_warnings(output: &mut String, issues: &[Issue], opts: &OutputOptions) {
    if opts.is_quiet(QuietLevel::Warning) {
        return;
    }
    for issue in issues {
        output.push_str(&format!("\t{}\n", issue.message));
    }
}

/// `*** Summary ***` block
pub fn format_summary(summary: &LintSummary, opts: &OutputOptions) -> String {
    let header = "*** Summary ***";
    let mut output = if opts.colored {
        format!("{}\n", header.bold())
    } else {
        format!("{}\n", header)
    };
    output.push_str(&format!("Valid migrations: {}/{}\n", summary.valid, summary.total));
    output.push_str(&format!(
        "Erroneous migrations: {}/{}\n",
        summary.erroneous, summary.total
    ));
    output.push_str(&format!(
        "Migrations with warnings: {}/{}\n",
        summary.warnings, summary.total
    ));
    output.push_str(&format!("Ignored migrations: {}/{}\n", summary.ignored, summary.total));
    output
}

/// Format the checks of a rule set
pub fn format_rule_set(rule_set: &RuleSet, opts: &OutputOptions) -> String {
    let listing = RuleSetOutput {
        rule_set: rule_set.name(),
        checks:   rule_set
            .checks()
            .iter()
            .map(|c| CheckInfo {
                code:     c.code,
                mode:     c.mode(),
                severity: c.severity,
                message:  c.message
            })
            .collect()
    };
    match opts.format {
        OutputFormat::Json => serde_json::to_string_pretty(&listing).unwrap_or_default(),
        OutputFormat::Yaml => serde_yaml::to_string(&listing).unwrap_or_default(),
        OutputFormat::Text => {
            let title = format!("Rule set: {}", listing.rule_set);
            let mut output = if opts.colored {
                format!("{}\n\n", title.cyan().bold())
            } else {
                format!("{}\n\n", title)
            };
            for check in &listing.checks {
                let severity = check.severity.to_string();
                let severity = match (opts.colored, check.severity) {
                    (true, Severity::Error) => severity.red().to_string(),
                    (true, Severity::Warning) => severity.yellow().to_string(),
                    (false, _) => severity
                };
                output.push_str(&format!(
                    "{:<24} {:<11} {:<7} {}\n",
                    check.code,
                    check.mode.to_string(),
                    severity,
                    check.message
                ));
            }
            output
        }
    }
}
