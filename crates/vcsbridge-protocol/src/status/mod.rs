//! Per-command status aggregation.
//!
//! A [`VcsStatus`] collects the [`StatusItem`]s produced while one command
//! runs. The engine clears it before each command and flushes it into the
//! response afterwards, so items never leak between commands.

use serde::{Deserialize, Serialize};

/// Severity of a status item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The command, or part of it, failed.
    Error,
    /// A non-fatal problem.
    Warning,
    /// An informational message.
    Info,
    /// Diagnostic detail.
    Verbose,
}

/// One `{severity, message}` record describing part of a command's outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusItem {
    severity: Severity,
    message: String,
}

impl StatusItem {
    /// Creates an item with the given severity.
    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    /// Creates an error item.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Creates a warning item.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Creates an informational item.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// Creates a verbose item.
    #[must_use]
    pub fn verbose(message: impl Into<String>) -> Self {
        Self::new(Severity::Verbose, message)
    }

    /// Returns the severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the message text.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Returns `true` for error items.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Ordered status items for the current command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VcsStatus {
    items: Vec<StatusItem>,
}

impl VcsStatus {
    /// Creates an empty aggregate.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Removes every item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Appends one item and returns the aggregate for chaining.
    pub fn add(&mut self, item: StatusItem) -> &mut Self {
        self.items.push(item);
        self
    }

    /// Returns the items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[StatusItem] {
        &self.items
    }

    /// Returns `true` when no item has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns `true` when at least one error item has been added.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(StatusItem::is_error)
    }

    /// Counts the error items.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_error()).count()
    }
}

#[cfg(test)]
mod tests;
