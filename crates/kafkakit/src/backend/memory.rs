//! In-memory broker for tests and dry runs.
//!
//! Answers with the same response codes a real broker would, so the stores
//! and the engine can be exercised end to end without a cluster.

use crate::backend::Backend;
use crate::broker::{BrokerError, BrokerResponse};
use crate::error::{Error, Result};
use crate::types::{AclEntry, AclFilter, ConsumerGroup, GroupOffset, Topic};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct State {
    topics: Vec<Topic>,
    acls: Vec<AclEntry>,
    groups: Vec<ConsumerGroup>,
    offsets: Vec<GroupOffset>,
    security_disabled: bool,
    acl_list_error: Option<BrokerError>,
    /// Requests answered before the broker stops responding
    reachable_calls: Option<usize>,
    calls: Vec<String>,
}

/// Broker state held in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with these topics on the broker.
    #[must_use]
    pub fn with_topics(self, topics: impl IntoIterator<Item = Topic>) -> Self {
        self.lock().topics.extend(topics);
        self
    }

    /// Start with these ACL entries on the broker.
    #[must_use]
    pub fn with_acls(self, acls: impl IntoIterator<Item = AclEntry>) -> Self {
        self.lock().acls.extend(acls);
        self
    }

    /// Add a consumer group and its committed offsets.
    #[must_use]
    pub fn with_group(self, group: ConsumerGroup, offsets: Vec<GroupOffset>) -> Self {
        {
            let mut state = self.lock();
            state.groups.push(group);
            state.offsets.extend(offsets);
        }
        self
    }

    /// Behave like a broker without an authorizer.
    #[must_use]
    pub fn with_security_disabled(self) -> Self {
        self.lock().security_disabled = true;
        self
    }

    /// Report `error` next to every ACL listing.
    #[must_use]
    pub fn with_acl_list_error(self, error: BrokerError) -> Self {
        self.lock().acl_list_error = Some(error);
        self
    }

    /// Fail every request as if the broker could not be reached.
    #[must_use]
    pub fn unreachable(self) -> Self {
        self.unreachable_after(0)
    }

    /// Answer the first `calls` requests, then fail like a dropped connection.
    #[must_use]
    pub fn unreachable_after(self, calls: usize) -> Self {
        self.lock().reachable_calls = Some(calls);
        self
    }

    /// Topics currently on the broker
    pub fn topics(&self) -> Vec<Topic> {
        self.lock().topics.clone()
    }

    /// ACL entries currently on the broker
    pub fn acls(&self) -> Vec<AclEntry> {
        self.lock().acls.clone()
    }

    /// Every request received so far, e.g. `create_topic orders`
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a request and lock the state for answering it.
    fn request(&self, call: String) -> Result<MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.reachable_calls.is_some_and(|n| state.calls.len() > n) {
            return Err(Error::Connectivity {
                message: "Timed out waiting for a node assignment".to_string(),
            });
        }
        Ok(state)
    }
}

impl Backend for MemoryBackend {
    fn describe_topics(&self) -> Result<Vec<Topic>> {
        let state = self.request("describe_topics".to_string())?;
        Ok(state.topics.clone())
    }

    fn create_topic(&self, topic: &Topic) -> Result<BrokerResponse> {
        let mut state = self.request(format!("create_topic {}", topic.name))?;

        if state.topics.iter().any(|t| t.name == topic.name) {
            return Ok(BrokerResponse::failed(
                BrokerError::TopicAlreadyExists,
                format!("Topic '{}' already exists.", topic.name),
            ));
        }
        if topic.num_partitions == 0 {
            return Ok(BrokerResponse::failed(
                BrokerError::InvalidPartitions,
                "Number of partitions must be larger than 0.",
            ));
        }
        if topic.replication_factor == 0 {
            return Ok(BrokerResponse::failed(
                BrokerError::InvalidReplicationFactor,
                "Replication factor must be larger than 0.",
            ));
        }

        state.topics.push(Topic::new(
            topic.name.clone(),
            topic.num_partitions,
            topic.replication_factor,
        ));
        Ok(BrokerResponse::ok())
    }

    fn delete_topic(&self, name: &str) -> Result<BrokerResponse> {
        let mut state = self.request(format!("delete_topic {name}"))?;

        match state.topics.iter().position(|t| t.name == name) {
            Some(idx) => {
                state.topics.remove(idx);
                Ok(BrokerResponse::ok())
            }
            None => Ok(BrokerResponse::failed(
                BrokerError::UnknownTopicOrPartition,
                format!("Topic '{name}' does not exist as expected"),
            )),
        }
    }

    fn describe_acls(&self, filter: &AclFilter) -> Result<(Vec<AclEntry>, BrokerError)> {
        let state = self.request("describe_acls".to_string())?;

        if state.security_disabled {
            return Ok((Vec::new(), BrokerError::SecurityDisabled));
        }
        if let Some(error) = state.acl_list_error {
            return Ok((Vec::new(), error));
        }

        let entries = state
            .acls
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect();
        Ok((entries, BrokerError::NoError))
    }

    fn create_acl(&self, acl: &AclEntry) -> Result<BrokerResponse> {
        let mut state = self.request(format!("create_acl {acl}"))?;

        if state.security_disabled {
            return Ok(security_disabled());
        }
        if acl.has_filter_only_values() {
            return Ok(BrokerResponse::failed(
                BrokerError::InvalidRequest,
                format!("'{acl}' uses a value that is only valid when filtering"),
            ));
        }

        // Creating an existing entry is a no-op on the broker
        if !state.acls.contains(acl) {
            state.acls.push(acl.clone());
        }
        Ok(BrokerResponse::ok())
    }

    fn delete_acl(&self, acl: &AclEntry) -> Result<BrokerResponse> {
        let mut state = self.request(format!("delete_acl {acl}"))?;

        if state.security_disabled {
            return Ok(security_disabled());
        }

        state.acls.retain(|entry| entry != acl);
        Ok(BrokerResponse::ok())
    }

    fn list_consumer_groups(&self) -> Result<Vec<String>> {
        let state = self.request("list_consumer_groups".to_string())?;
        Ok(state.groups.iter().map(|g| g.group_id.clone()).collect())
    }

    fn describe_consumer_group(&self, group_id: &str) -> Result<ConsumerGroup> {
        let state = self.request(format!("describe_consumer_group {group_id}"))?;

        Ok(state
            .groups
            .iter()
            .find(|g| g.group_id == group_id)
            .cloned()
            .unwrap_or_else(|| ConsumerGroup {
                state: Some("Dead".to_string()),
                ..ConsumerGroup::listed(group_id)
            }))
    }

    fn list_consumer_group_offsets(&self, group_id: &str) -> Result<Vec<GroupOffset>> {
        let state = self.request(format!("list_consumer_group_offsets {group_id}"))?;

        Ok(state
            .offsets
            .iter()
            .filter(|o| o.group == group_id)
            .cloned()
            .collect())
    }
}

fn security_disabled() -> BrokerResponse {
    BrokerResponse::failed(
        BrokerError::SecurityDisabled,
        "No Authorizer is configured on the broker",
    )
}
