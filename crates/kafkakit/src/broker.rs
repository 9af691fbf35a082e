//! Broker response codes.
//!
//! The broker answers every create, delete and describe request with an
//! error code, and "no error" is itself one of those codes. [`BrokerError`]
//! models that directly: a response is successful exactly when its code is
//! [`BrokerError::NoError`].

use crate::error::Error;
use reconcile::{FailureKind, Outcome};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kafka protocol error code of one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrokerError {
    NoError,
    UnknownTopicOrPartition,
    TopicAuthorizationFailed,
    GroupAuthorizationFailed,
    ClusterAuthorizationFailed,
    TopicAlreadyExists,
    InvalidPartitions,
    InvalidReplicationFactor,
    InvalidConfig,
    InvalidRequest,
    PolicyViolation,
    SecurityDisabled,
    /// Any failure the backend could not map to a code
    Unknown,
}

impl BrokerError {
    /// Numeric code as defined by the Kafka protocol.
    pub fn code(&self) -> i16 {
        match self {
            Self::Unknown => -1,
            Self::NoError => 0,
            Self::UnknownTopicOrPartition => 3,
            Self::TopicAuthorizationFailed => 29,
            Self::GroupAuthorizationFailed => 30,
            Self::ClusterAuthorizationFailed => 31,
            Self::TopicAlreadyExists => 36,
            Self::InvalidPartitions => 37,
            Self::InvalidReplicationFactor => 38,
            Self::InvalidConfig => 40,
            Self::InvalidRequest => 42,
            Self::PolicyViolation => 44,
            Self::SecurityDisabled => 54,
        }
    }

    /// Look up a numeric code; codes without a variant map to `Unknown`.
    pub fn from_code(code: i16) -> Self {
        match code {
            0 => Self::NoError,
            3 => Self::UnknownTopicOrPartition,
            29 => Self::TopicAuthorizationFailed,
            30 => Self::GroupAuthorizationFailed,
            31 => Self::ClusterAuthorizationFailed,
            36 => Self::TopicAlreadyExists,
            37 => Self::InvalidPartitions,
            38 => Self::InvalidReplicationFactor,
            40 => Self::InvalidConfig,
            42 => Self::InvalidRequest,
            44 => Self::PolicyViolation,
            54 => Self::SecurityDisabled,
            _ => Self::Unknown,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::NoError)
    }

    /// Per-item failure reason, `None` for `NoError`.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        let kind = match self {
            Self::NoError => return None,
            Self::TopicAlreadyExists => FailureKind::AlreadyExists,
            Self::UnknownTopicOrPartition => FailureKind::NotFound,
            Self::TopicAuthorizationFailed
            | Self::GroupAuthorizationFailed
            | Self::ClusterAuthorizationFailed => FailureKind::PermissionDenied,
            Self::SecurityDisabled => FailureKind::SecurityDisabled,
            Self::InvalidPartitions
            | Self::InvalidReplicationFactor
            | Self::InvalidConfig
            | Self::InvalidRequest
            | Self::PolicyViolation => FailureKind::InvalidConfiguration,
            Self::Unknown => FailureKind::Other,
        };
        Some(kind)
    }

    /// Find the response code named in admin tool output.
    ///
    /// The tools print the Java exception that carries the code, e.g.
    /// `org.apache.kafka.common.errors.TopicExistsException`.
    pub fn from_tool_output(stderr: &str) -> Option<Self> {
        const MARKERS: &[(&str, BrokerError)] = &[
            ("TopicExistsException", BrokerError::TopicAlreadyExists),
            ("already exists", BrokerError::TopicAlreadyExists),
            ("UnknownTopicOrPartitionException", BrokerError::UnknownTopicOrPartition),
            ("does not exist", BrokerError::UnknownTopicOrPartition),
            ("InvalidPartitionsException", BrokerError::InvalidPartitions),
            ("InvalidReplicationFactorException", BrokerError::InvalidReplicationFactor),
            ("InvalidConfigurationException", BrokerError::InvalidConfig),
            ("InvalidRequestException", BrokerError::InvalidRequest),
            ("PolicyViolationException", BrokerError::PolicyViolation),
            ("SecurityDisabledException", BrokerError::SecurityDisabled),
            ("No Authorizer is configured", BrokerError::SecurityDisabled),
            ("ClusterAuthorizationException", BrokerError::ClusterAuthorizationFailed),
            ("TopicAuthorizationException", BrokerError::TopicAuthorizationFailed),
            ("GroupAuthorizationException", BrokerError::GroupAuthorizationFailed),
        ];

        MARKERS
            .iter()
            .find(|(marker, _)| stderr.contains(marker))
            .map(|(_, code)| *code)
    }
}

impl fmt::Display for BrokerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoError => "NONE",
            Self::UnknownTopicOrPartition => "UNKNOWN_TOPIC_OR_PARTITION",
            Self::TopicAuthorizationFailed => "TOPIC_AUTHORIZATION_FAILED",
            Self::GroupAuthorizationFailed => "GROUP_AUTHORIZATION_FAILED",
            Self::ClusterAuthorizationFailed => "CLUSTER_AUTHORIZATION_FAILED",
            Self::TopicAlreadyExists => "TOPIC_ALREADY_EXISTS",
            Self::InvalidPartitions => "INVALID_PARTITIONS",
            Self::InvalidReplicationFactor => "INVALID_REPLICATION_FACTOR",
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::PolicyViolation => "POLICY_VIOLATION",
            Self::SecurityDisabled => "SECURITY_DISABLED",
            Self::Unknown => "UNKNOWN_SERVER_ERROR",
        };
        write!(f, "{name} ({})", self.code())
    }
}

/// Answer to one create or delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerResponse {
    pub error: BrokerError,
    /// Detail reported alongside a failure
    pub message: Option<String>,
}

impl BrokerResponse {
    /// A `NoError` response
    pub fn ok() -> Self {
        Self {
            error: BrokerError::NoError,
            message: None,
        }
    }

    /// A failed response with detail
    pub fn failed(error: BrokerError, message: impl Into<String>) -> Self {
        Self {
            error,
            message: Some(message.into()),
        }
    }

    /// Per-item outcome for the engine
    pub fn into_outcome(self) -> Outcome {
        match self.error.failure_kind() {
            None => Outcome::Succeeded,
            Some(kind) => Outcome::failed(
                kind,
                self.message.unwrap_or_else(|| self.error.to_string()),
            ),
        }
    }
}

/// Classify the stderr of a failed admin tool run.
///
/// Transport failures are fatal and come back as `Err`. Everything else is
/// an answer from the broker and becomes a response code, `Unknown` when the
/// output names no code.
pub fn classify_tool_failure(stderr: &str) -> Result<BrokerResponse, Error> {
    let message = summary_line(stderr);

    if is_connectivity_failure(stderr) {
        return Err(Error::Connectivity { message });
    }

    let error = BrokerError::from_tool_output(stderr).unwrap_or(BrokerError::Unknown);
    Ok(BrokerResponse::failed(error, message))
}

fn is_connectivity_failure(stderr: &str) -> bool {
    const MARKERS: &[&str] = &[
        "TimeoutException",
        "Timed out waiting",
        "Connection to node",
        "could not be established",
        "Broker may not be available",
        "No resolvable bootstrap urls",
        "SslAuthenticationException",
        "SaslAuthenticationException",
        "AuthenticationException",
        "UnknownHostException",
        "Failed to create new KafkaAdminClient",
    ];
    MARKERS.iter().any(|m| stderr.contains(m))
}

/// The most useful line of a stack-trace-heavy stderr.
///
/// Prefers the first line naming a Kafka exception, then the first
/// non-empty line.
fn summary_line(stderr: &str) -> String {
    let lines = stderr.lines().map(str::trim).filter(|l| !l.is_empty());
    let exception = lines
        .clone()
        .find(|l| l.contains("Exception") && !l.starts_with("at "));
    exception
        .or_else(|| lines.clone().next())
        .unwrap_or("no output")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for error in [
            BrokerError::NoError,
            BrokerError::UnknownTopicOrPartition,
            BrokerError::TopicAlreadyExists,
            BrokerError::SecurityDisabled,
            BrokerError::PolicyViolation,
        ] {
            assert_eq!(BrokerError::from_code(error.code()), error);
        }
        assert_eq!(BrokerError::from_code(999), BrokerError::Unknown);
    }

    #[test]
    fn test_no_error_is_success() {
        assert!(BrokerError::NoError.is_ok());
        assert_eq!(BrokerError::NoError.failure_kind(), None);
        assert_eq!(BrokerResponse::ok().into_outcome(), Outcome::Succeeded);
    }

    #[test]
    fn test_failure_kinds() {
        assert_eq!(
            BrokerError::TopicAlreadyExists.failure_kind(),
            Some(FailureKind::AlreadyExists)
        );
        assert_eq!(
            BrokerError::UnknownTopicOrPartition.failure_kind(),
            Some(FailureKind::NotFound)
        );
        assert_eq!(
            BrokerError::ClusterAuthorizationFailed.failure_kind(),
            Some(FailureKind::PermissionDenied)
        );
        assert_eq!(
            BrokerError::InvalidReplicationFactor.failure_kind(),
            Some(FailureKind::InvalidConfiguration)
        );
    }

    #[test]
    fn test_classify_topic_exists() {
        let stderr = "Error while executing topic command : Topic 'orders' already exists.\n\
                      [2024-01-01 10:00:00,000] ERROR org.apache.kafka.common.errors.TopicExistsException: Topic 'orders' already exists.\n";
        let response = classify_tool_failure(stderr).unwrap();

        assert_eq!(response.error, BrokerError::TopicAlreadyExists);
        assert!(response.message.unwrap().contains("TopicExistsException"));
    }

    #[test]
    fn test_classify_security_disabled() {
        let stderr = "Error while executing ACL command: org.apache.kafka.common.errors.SecurityDisabledException: No Authorizer is configured.\n";
        let response = classify_tool_failure(stderr).unwrap();
        assert_eq!(response.error, BrokerError::SecurityDisabled);
    }

    #[test]
    fn test_classify_missing_topic_on_delete() {
        let stderr = "Exception in thread \"main\" java.lang.IllegalArgumentException: Topic 'gone' does not exist as expected\n\tat kafka.admin.TopicCommand$.ensureTopicExists\n";
        let response = classify_tool_failure(stderr).unwrap();
        assert_eq!(response.error, BrokerError::UnknownTopicOrPartition);
    }

    #[test]
    fn test_classify_connectivity_is_fatal() {
        let stderr = "Error while executing topic command : Timed out waiting for a node assignment. Call: listTopics\n\
                      org.apache.kafka.common.errors.TimeoutException: Timed out waiting for a node assignment.\n";
        let err = classify_tool_failure(stderr).unwrap_err();
        assert!(matches!(err, Error::Connectivity { .. }));
    }

    #[test]
    fn test_classify_unrecognised_is_unknown() {
        let response = classify_tool_failure("something odd happened\n").unwrap();
        assert_eq!(response.error, BrokerError::Unknown);
        assert_eq!(response.message.as_deref(), Some("something odd happened"));
        assert!(matches!(
            response.into_outcome(),
            Outcome::Failed {
                kind: FailureKind::Other,
                ..
            }
        ));
    }
}
