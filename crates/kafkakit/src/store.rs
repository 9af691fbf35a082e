//! Per-kind stores over a [`Backend`].
//!
//! [`TopicStore`] and [`AclStore`] implement [`reconcile::Store`] so the
//! engine can plan and apply against them. The consumer-group stores are
//! read-only.

use crate::backend::Backend;
use crate::broker::BrokerResponse;
use crate::error::{Error, Result};
use crate::types::{AclEntry, AclFilter, ConsumerGroup, GroupOffset, Topic};
use reconcile::{BatchResult, Collection, FailureKind, Outcome, Resource, Store};

/// Send one request per item and collect the answers.
///
/// A request that fails outright before anything was sent aborts with the
/// error. Once some item has been answered, a failing request instead marks
/// that item and every item after it as interrupted, so the caller still
/// sees what already reached the broker.
fn each<T, F>(items: &[T], mut request: F) -> Result<BatchResult<T>>
where
    T: Resource,
    F: FnMut(&T) -> Result<BrokerResponse>,
{
    let mut result = BatchResult::new();
    let mut pending = items.iter();
    while let Some(item) = pending.next() {
        let response = match request(item) {
            Ok(response) => response,
            Err(err) if result.is_empty() => return Err(err),
            Err(err) => {
                log::warn!("{} {}: {err}", T::KIND, item.id());
                result.record(
                    item.clone(),
                    Outcome::failed(FailureKind::Interrupted, err.to_string()),
                );
                for rest in pending.by_ref() {
                    result.record(
                        rest.clone(),
                        Outcome::failed(
                            FailureKind::Interrupted,
                            format!("not sent after {} {} failed", T::KIND, item.id()),
                        ),
                    );
                }
                break;
            }
        };

        if response.error.is_ok() {
            log::info!("{} {}: ok", T::KIND, item.id());
        } else {
            log::warn!("{} {}: {}", T::KIND, item.id(), response.error);
        }
        result.record(item.clone(), response.into_outcome());
    }
    Ok(result)
}

/// Topics on the cluster.
pub struct TopicStore<'a> {
    backend: &'a dyn Backend,
}

impl<'a> TopicStore<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }
}

impl Store<Topic> for TopicStore<'_> {
    type Error = Error;

    fn list(&self) -> Result<Collection<Topic>> {
        let topics = self.backend.describe_topics()?;
        log::debug!("listed {} topic(s)", topics.len());
        Ok(topics.into())
    }

    fn add(&self, items: &[Topic]) -> Result<BatchResult<Topic>> {
        each(items, |topic| self.backend.create_topic(topic))
    }

    fn delete(&self, items: &[Topic]) -> Result<BatchResult<Topic>> {
        each(items, |topic| self.backend.delete_topic(&topic.name))
    }
}

/// ACL entries on the cluster.
pub struct AclStore<'a> {
    backend: &'a dyn Backend,
}

impl<'a> AclStore<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    /// Entries selected by `filter`.
    ///
    /// The broker answers a listing with a response code; anything but
    /// `NoError` means the listing cannot be trusted and is an
    /// [`Error::Protocol`].
    pub fn list_filtered(&self, filter: &AclFilter) -> Result<Collection<AclEntry>> {
        let (entries, code) = self.backend.describe_acls(filter)?;
        if !code.is_ok() {
            return Err(Error::Protocol {
                message: format!("ACL listing answered {code}"),
            });
        }
        log::debug!("listed {} acl(s)", entries.len());
        Ok(entries.into())
    }
}

impl Store<AclEntry> for AclStore<'_> {
    type Error = Error;

    fn list(&self) -> Result<Collection<AclEntry>> {
        self.list_filtered(&AclFilter::any())
    }

    fn add(&self, items: &[AclEntry]) -> Result<BatchResult<AclEntry>> {
        each(items, |acl| self.backend.create_acl(acl))
    }

    fn delete(&self, items: &[AclEntry]) -> Result<BatchResult<AclEntry>> {
        each(items, |acl| self.backend.delete_acl(acl))
    }
}

/// Consumer groups on the cluster.
pub struct ConsumerGroupStore<'a> {
    backend: &'a dyn Backend,
}

impl<'a> ConsumerGroupStore<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    /// Groups known by id only, sorted
    pub fn list(&self) -> Result<Vec<ConsumerGroup>> {
        let mut ids = self.backend.list_consumer_groups()?;
        ids.sort();
        Ok(ids.into_iter().map(ConsumerGroup::listed).collect())
    }

    /// Every group with state, members and assignments
    pub fn describe_all(&self) -> Result<Vec<ConsumerGroup>> {
        self.list()?
            .iter()
            .map(|group| self.backend.describe_consumer_group(&group.group_id))
            .collect()
    }
}

/// Committed offsets of every consumer group.
pub struct ConsumerGroupOffsetStore<'a> {
    backend: &'a dyn Backend,
}

impl<'a> ConsumerGroupOffsetStore<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    /// Offsets ordered by group, topic and partition
    pub fn list(&self) -> Result<Vec<GroupOffset>> {
        let mut ids = self.backend.list_consumer_groups()?;
        ids.sort();

        let mut offsets = Vec::new();
        for id in &ids {
            let mut group = self.backend.list_consumer_group_offsets(id)?;
            group.sort_by(|a, b| (&a.topic, a.partition).cmp(&(&b.topic, b.partition)));
            offsets.extend(group);
        }
        Ok(offsets)
    }
}
