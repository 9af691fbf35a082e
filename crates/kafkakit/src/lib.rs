//! # kafkakit
//!
//! Kafka topic and ACL administration as data.
//!
//! This crate provides:
//! - The resource model: topics, ACL entries, consumer groups and offsets
//! - The versioned definitions document and its table format
//! - Typed broker response codes
//! - Per-kind stores the [`reconcile`] engine plans and applies against
//!
//! ## Example
//!
//! ```no_run
//! use kafkakit::{Client, ConnectionConfig, Definitions};
//! use reconcile::{ExecuteOptions, NoProgress, execute, plan_against};
//! use std::path::Path;
//!
//! let client = Client::connect(&ConnectionConfig::plaintext(["localhost:9092"]))?;
//! let definitions = Definitions::load(Path::new("definitions/sample.csv"))?;
//!
//! let topics = client.topics();
//! let plan = plan_against(&topics, definitions.topics())?;
//! let options = ExecuteOptions { check: true, ..Default::default() };
//! execute(&topics, &plan, options, &mut NoProgress)?;
//! # Ok::<(), kafkakit::Error>(())
//! ```
//!
//! ## Failures
//!
//! A topic or ACL the broker refuses is reported per item with a
//! [`reconcile::FailureKind`]. Only failures that make the whole run
//! untrustworthy (parse errors, an unreachable broker, an unexpected
//! response) are an [`Error`].

pub mod backend;
pub mod broker;
pub mod connection;
pub mod definitions;
pub mod error;
pub mod rows;
pub mod store;
pub mod table;
pub mod types;

pub use broker::{BrokerError, BrokerResponse};
pub use connection::{ConnectionConfig, SaslMechanism, SecurityProtocol};
pub use definitions::{Definitions, SUPPORTED_SCHEMA_VERSION};
pub use error::{Error, ErrorCategory, Result};
pub use rows::Tabular;
pub use store::{AclStore, ConsumerGroupOffsetStore, ConsumerGroupStore, TopicStore};
pub use types::{
    AclEntry, AclFilter, AclOperation, AclPermissionType, ConsumerGroup, GroupMember, GroupOffset,
    PartitionInfo, PatternType, ResourceType, Topic, TopicAssignment,
};

use backend::{Backend, cli::CliBackend};

/// Entry point to one cluster.
///
/// The client owns a backend and hands out the per-kind stores, which
/// borrow it.
pub struct Client {
    backend: Box<dyn Backend>,
}

impl Client {
    /// Connect through the Kafka admin tools.
    ///
    /// Fails on an incomplete configuration; the broker itself is first
    /// contacted by the stores.
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        let backend = CliBackend::new(config)?;
        Ok(Self {
            backend: Box::new(backend),
        })
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn topics(&self) -> TopicStore<'_> {
        TopicStore::new(self.backend.as_ref())
    }

    pub fn acls(&self) -> AclStore<'_> {
        AclStore::new(self.backend.as_ref())
    }

    pub fn consumer_groups(&self) -> ConsumerGroupStore<'_> {
        ConsumerGroupStore::new(self.backend.as_ref())
    }

    pub fn consumer_group_offsets(&self) -> ConsumerGroupOffsetStore<'_> {
        ConsumerGroupOffsetStore::new(self.backend.as_ref())
    }
}
