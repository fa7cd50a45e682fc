use super::{CheckMode, Severity};

/// Predicate over a single SQL statement.
pub type StatementPredicate = fn(&str) -> bool;

/// Predicate over the ordered statements of one migration.
pub type TransactionPredicate = fn(&[&str]) -> bool;

/// The test a check applies, tagged with the scope it needs.
#[derive(Debug, Clone, Copy)]
pub enum Predicate {
    OneLiner(StatementPredicate),
    Transaction(TransactionPredicate)
}

impl Predicate {
    pub const fn mode(&self) -> CheckMode {
        match self {
            Self::OneLiner(_) => CheckMode::OneLiner,
            Self::Transaction(_) => CheckMode::Transaction
        }
    }
}

/// Declarative rule matched against generated SQL.
///
/// Checks are plain values: pure predicate, stable code, fixed severity.
/// Rule sets copy them freely.
///
/// # Example
///
/// ```
/// use migration_linter::rules::{Check, CheckMode, Severity};
///
/// fn truncates(sql: &str) -> bool {
///     sql.starts_with("TRUNCATE")
/// }
///
/// const TRUNCATE: Check = Check::one_liner(
///     "TRUNCATE",
///     "TRUNCATE empties the table",
///     Severity::Error,
///     truncates
/// );
///
/// assert_eq!(TRUNCATE.mode(), CheckMode::OneLiner);
/// assert!(TRUNCATE.matches_statement("TRUNCATE \"users\";"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Check {
    /// Stable identifier shared by every dialect
    pub code:      &'static str,
    /// Message attached to the produced issue
    pub message:   &'static str,
    pub severity:  Severity,
    pub predicate: Predicate
}

impl Check {
    pub const fn one_liner(
        code: &'static str,
        message: &'static str,
        severity: Severity,
        predicate: StatementPredicate
    ) -> Self {
        Self {
            code,
            message,
            severity,
            predicate: Predicate::OneLiner(predicate)
        }
    }

    pub const fn transaction(
        code: &'static str,
        message: &'static str,
        severity: Severity,
        predicate: TransactionPredicate
    ) -> Self {
        Self {
            code,
            message,
            severity,
            predicate: Predicate::Transaction(predicate)
        }
    }

    pub const fn mode(&self) -> CheckMode {
        self.predicate.mode()
    }

    /// Evaluate a one-liner check. Transaction checks never match here.
    pub fn matches_statement(&self, sql: &str) -> bool {
        match self.predicate {
            Predicate::OneLiner(f) => f(sql),
            Predicate::Transaction(_) => false
        }
    }

    /// Evaluate a transaction check. One-liner checks never match here.
    pub fn matches_transaction(&self, statements: &[&str]) -> bool {
        match self.predicate {
            Predicate::Transaction(f) => f(statements),
            Predicate::OneLiner(_) => false
        }
    }
}
