//! Error types for broker administration.
//!
//! Everything in here aborts the run. A single topic or ACL that cannot be
//! created or deleted is not an [`Error`]: it comes back as a per-item
//! [`reconcile::Outcome`] carrying a [`BrokerError`](crate::BrokerError)
//! derived reason.

use std::path::PathBuf;
use thiserror::Error;

/// Categories of fatal errors for user feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The definitions document is malformed
    Parse,
    /// The configuration file or profile is unusable
    Config,
    /// The broker could not be reached or refused the connection
    Connectivity,
    /// The broker answered with something the backend cannot interpret
    Protocol,
    /// The Kafka admin tools are not installed
    ToolNotFound,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Whether running the same command again may succeed without changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connectivity)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Parse => "Invalid definitions file",
            Self::Config => "Invalid configuration",
            Self::Connectivity => "Broker unreachable",
            Self::Protocol => "Unexpected broker response",
            Self::ToolNotFound => "Kafka tools not installed",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Parse => "Fix the definitions file at the reported line; nothing was sent to the broker",
            Self::Config => "Check config.yaml and the selected profile",
            Self::Connectivity => {
                "Check bootstrap_servers, security_protocol and credentials in the profile"
            }
            Self::Protocol => "Check that the broker and the admin tools are compatible versions",
            Self::ToolNotFound => "Set kafka_bin_dir in the profile or KAFKA_HOME in the environment",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that abort a command.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed line in the definitions document
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// Line number in the definitions document (1-indexed)
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// A cell names a value outside an enumeration
    #[error("unknown {kind} '{token}' at line {line}")]
    UnknownToken {
        /// Line number in the definitions document (1-indexed)
        line: usize,
        /// Which enumeration was being parsed
        kind: &'static str,
        /// The offending cell
        token: String,
    },

    /// The preamble has a key other than `schema_version`
    #[error("unknown metadata at line {line}: {text}")]
    UnknownMetadata {
        /// Line number in the definitions document (1-indexed)
        line: usize,
        /// The offending preamble line
        text: String,
    },

    /// Only schema version 1 is understood
    #[error("unsupported schema_version: {0}")]
    UnsupportedSchemaVersion(u32),

    /// A `---` delimiter the document needs is not there
    #[error("missing '---' delimiter after the {section}")]
    MissingDelimiter {
        /// The section the delimiter should close
        section: &'static str,
    },

    /// Definitions file not found at the specified path
    #[error("definitions file not found: {0}")]
    DefinitionsNotFound(PathBuf),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Broker unreachable, TLS or SASL handshake failed
    #[error("cannot reach broker: {message}")]
    Connectivity {
        /// Last meaningful line reported by the tool
        message: String,
    },

    /// The broker returned an error where none is allowed
    #[error("unexpected broker response: {message}")]
    Protocol {
        /// What was unexpected
        message: String,
    },

    /// An admin tool could not be located or started
    #[error("Kafka tool not found: {tool}")]
    ToolNotFound {
        /// Tool name, e.g. `kafka-topics.sh`
        tool: String,
    },

    /// Command execution failed
    #[error("command failed: {message}")]
    CommandFailed {
        /// Description of what command failed
        message: String,
        /// Standard error output from the failed command
        stderr: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Get the error category for user feedback.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Parse { .. }
            | Error::UnknownToken { .. }
            | Error::UnknownMetadata { .. }
            | Error::UnsupportedSchemaVersion(_)
            | Error::MissingDelimiter { .. }
            | Error::DefinitionsNotFound(_) => ErrorCategory::Parse,
            Error::Config(_) => ErrorCategory::Config,
            Error::Connectivity { .. } => ErrorCategory::Connectivity,
            Error::Protocol { .. } => ErrorCategory::Protocol,
            Error::ToolNotFound { .. } => ErrorCategory::ToolNotFound,
            _ => ErrorCategory::Other,
        }
    }

    /// Whether running the same command again may succeed without changes.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Shorthand for a parse error.
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Result type for broker administration.
pub type Result<T> = std::result::Result<T, Error>;
