//! Core types for per-item results and execution options

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a single create or delete did not go through.
///
/// These are reported per item and never abort the rest of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Create target already exists
    AlreadyExists,
    /// Delete target does not exist
    NotFound,
    /// The caller is not authorized for the operation
    PermissionDenied,
    /// The broker has no authorizer configured
    SecurityDisabled,
    /// The request itself was rejected (bad partition count, policy, ...)
    InvalidConfiguration,
    /// The transport failed partway through a batch; the item was not
    /// confirmed and may or may not have reached the broker
    Interrupted,
    /// Anything the adapter could not classify
    Other,
}

impl FailureKind {
    /// Short machine-friendly reason code
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyExists => "already-exists",
            Self::NotFound => "not-found",
            Self::PermissionDenied => "permission-denied",
            Self::SecurityDisabled => "security-disabled",
            Self::InvalidConfiguration => "invalid-configuration",
            Self::Interrupted => "interrupted",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of one create or delete request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The request succeeded
    Succeeded,
    /// The request failed for the given reason
    Failed { kind: FailureKind, message: String },
}

impl Outcome {
    /// Build a failure outcome
    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failed {
            kind,
            message: message.into(),
        }
    }

    /// Check if the outcome represents success
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Whether the batch broke off at this item
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self,
            Self::Failed {
                kind: FailureKind::Interrupted,
                ..
            }
        )
    }
}

/// One item of a batch together with what happened to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResult<T> {
    pub item: T,
    pub outcome: Outcome,
}

/// Per-item results of one `add` or `delete` call, in request order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult<T> {
    pub results: Vec<ItemResult<T>>,
}

impl<T> BatchResult<T> {
    /// Create an empty batch result
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
        }
    }

    /// Record the outcome for one item
    pub fn record(&mut self, item: T, outcome: Outcome) {
        self.results.push(ItemResult { item, outcome });
    }

    /// Items that went through
    pub fn succeeded(&self) -> impl Iterator<Item = &ItemResult<T>> {
        self.results.iter().filter(|r| r.outcome.is_success())
    }

    /// Items that did not go through
    pub fn failed(&self) -> impl Iterator<Item = &ItemResult<T>> {
        self.results.iter().filter(|r| !r.outcome.is_success())
    }

    /// Check if every item succeeded
    pub fn is_success(&self) -> bool {
        self.results.iter().all(|r| r.outcome.is_success())
    }

    /// Check if the batch broke off before every item was answered
    pub fn is_interrupted(&self) -> bool {
        self.results.iter().any(|r| r.outcome.is_interrupted())
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl<T> Default for BatchResult<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Which mutation runs first in apply mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyOrder {
    /// Create new resources, then remove old ones (no window without a resource)
    #[default]
    AddFirst,
    /// Remove old resources, then create new ones (needed to recreate in place)
    DeleteFirst,
}

impl ApplyOrder {
    /// Pick the order from a `--delete-first` style flag
    pub fn from_delete_first(delete_first: bool) -> Self {
        if delete_first {
            Self::DeleteFirst
        } else {
            Self::AddFirst
        }
    }
}

/// Options for execution
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteOptions {
    /// Check mode: compute and report only, never mutate
    pub check: bool,
    /// Mutation order in apply mode
    pub order: ApplyOrder,
}

/// The two mutation phases of an apply run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Add,
    Delete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => f.write_str("addition"),
            Self::Delete => f.write_str("deletion"),
        }
    }
}

/// Summary of execution results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub added: usize,
    pub deleted: usize,
    pub failed: usize,
}

impl ExecuteSummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.added + self.deleted
    }

    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}
