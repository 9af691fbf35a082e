//! Backend abstraction for broker operations.
//!
//! The [`Backend`] trait is the transport under the per-kind stores,
//! allowing for different implementations (the Kafka admin tools, an
//! in-memory broker for tests).
//!
//! Methods return `Err` only for failures that make the backend
//! untrustworthy (unreachable broker, missing tools). A request the broker
//! answered, successfully or not, is `Ok` with its [`BrokerResponse`].

pub mod cli;
pub mod memory;

use crate::broker::{BrokerError, BrokerResponse};
use crate::error::Result;
use crate::types::{AclEntry, AclFilter, ConsumerGroup, GroupOffset, Topic};

/// Backend trait for broker operations.
pub trait Backend: Send + Sync {
    /// Describe every non-internal topic, with partition detail.
    fn describe_topics(&self) -> Result<Vec<Topic>>;

    /// Create one topic.
    fn create_topic(&self, topic: &Topic) -> Result<BrokerResponse>;

    /// Delete one topic by name.
    fn delete_topic(&self, name: &str) -> Result<BrokerResponse>;

    /// Describe ACL entries selected by `filter`.
    ///
    /// The broker reports an error code next to the entries; the caller
    /// decides what a code other than `NoError` means.
    fn describe_acls(&self, filter: &AclFilter) -> Result<(Vec<AclEntry>, BrokerError)>;

    /// Create one ACL entry.
    fn create_acl(&self, acl: &AclEntry) -> Result<BrokerResponse>;

    /// Delete one ACL entry.
    fn delete_acl(&self, acl: &AclEntry) -> Result<BrokerResponse>;

    /// List consumer group ids.
    fn list_consumer_groups(&self) -> Result<Vec<String>>;

    /// Describe one consumer group, including members and assignments.
    fn describe_consumer_group(&self, group_id: &str) -> Result<ConsumerGroup>;

    /// Committed offsets of one consumer group.
    fn list_consumer_group_offsets(&self, group_id: &str) -> Result<Vec<GroupOffset>>;
}
