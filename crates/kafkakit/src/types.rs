//! Core types for Kafka resources.

use reconcile::Resource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

// =============================================================================
// Topics
// =============================================================================

/// A topic as declared or as reported by the broker.
///
/// Equality and hashing look at `name`, `num_partitions` and
/// `replication_factor` only. `partitions` is what the broker reported and
/// is carried for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    /// Topic name, unique within a cluster
    pub name: String,
    /// Number of partitions (positive)
    pub num_partitions: u32,
    /// Replicas per partition (positive)
    pub replication_factor: u16,
    /// Per-partition detail as reported by the broker
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partitions: Vec<PartitionInfo>,
}

impl Topic {
    /// Create a topic with the given layout and no broker detail.
    pub fn new(name: impl Into<String>, num_partitions: u32, replication_factor: u16) -> Self {
        Self {
            name: name.into(),
            num_partitions,
            replication_factor,
            partitions: Vec::new(),
        }
    }

    /// Build a topic from the partitions the broker reported.
    ///
    /// The partition count is the number of partitions and the replication
    /// factor is the replica count of the lowest-numbered partition.
    pub fn from_partitions(name: impl Into<String>, mut partitions: Vec<PartitionInfo>) -> Self {
        partitions.sort_by_key(|p| p.partition);
        let replication_factor = partitions
            .first()
            .map(|p| p.replicas.len() as u16)
            .unwrap_or(0);
        Self {
            name: name.into(),
            num_partitions: partitions.len() as u32,
            replication_factor,
            partitions,
        }
    }
}

impl PartialEq for Topic {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.num_partitions == other.num_partitions
            && self.replication_factor == other.replication_factor
    }
}

impl Eq for Topic {}

impl Hash for Topic {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.num_partitions.hash(state);
        self.replication_factor.hash(state);
    }
}

impl Resource for Topic {
    const KIND: &'static str = "topic";

    fn id(&self) -> String {
        self.name.clone()
    }

    fn order_leftovers(leftovers: &mut Vec<Self>) {
        leftovers.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (partitions: {}, replication: {})",
            self.name, self.num_partitions, self.replication_factor
        )
    }
}

/// One partition of a topic as reported by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionInfo {
    pub partition: i32,
    /// Broker id of the leader, -1 when there is none
    pub leader: i32,
    pub replicas: Vec<i32>,
    pub isr: Vec<i32>,
    pub offline_replicas: Vec<i32>,
    pub error_code: i16,
}

// =============================================================================
// ACL enumerations
// =============================================================================

/// Normalize a token for enumeration lookup.
///
/// Lookup is case-insensitive and ignores `_` and `-`, so `CLUSTER_ACTION`,
/// `ClusterAction` and `cluster-action` are the same token.
fn normalize(token: &str) -> String {
    token
        .trim()
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_uppercase)
        .collect()
}

/// Operation an ACL grants or denies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AclOperation {
    /// Filter-only: matches any operation
    Any,
    All,
    Read,
    Write,
    Create,
    Delete,
    Alter,
    Describe,
    ClusterAction,
    DescribeConfigs,
    AlterConfigs,
    IdempotentWrite,
    CreateTokens,
    DescribeTokens,
}

impl AclOperation {
    /// Canonical name, as rendered in tables
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "ANY",
            Self::All => "ALL",
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::Create => "CREATE",
            Self::Delete => "DELETE",
            Self::Alter => "ALTER",
            Self::Describe => "DESCRIBE",
            Self::ClusterAction => "CLUSTER_ACTION",
            Self::DescribeConfigs => "DESCRIBE_CONFIGS",
            Self::AlterConfigs => "ALTER_CONFIGS",
            Self::IdempotentWrite => "IDEMPOTENT_WRITE",
            Self::CreateTokens => "CREATE_TOKENS",
            Self::DescribeTokens => "DESCRIBE_TOKENS",
        }
    }

    /// Name expected by `kafka-acls.sh --operation`
    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::Any => "Any",
            Self::All => "All",
            Self::Read => "Read",
            Self::Write => "Write",
            Self::Create => "Create",
            Self::Delete => "Delete",
            Self::Alter => "Alter",
            Self::Describe => "Describe",
            Self::ClusterAction => "ClusterAction",
            Self::DescribeConfigs => "DescribeConfigs",
            Self::AlterConfigs => "AlterConfigs",
            Self::IdempotentWrite => "IdempotentWrite",
            Self::CreateTokens => "CreateTokens",
            Self::DescribeTokens => "DescribeTokens",
        }
    }

    /// Parse a token, returning `None` when it names no operation.
    pub fn parse(token: &str) -> Option<Self> {
        match normalize(token).as_str() {
            "ANY" => Some(Self::Any),
            "ALL" => Some(Self::All),
            "READ" => Some(Self::Read),
            "WRITE" => Some(Self::Write),
            "CREATE" => Some(Self::Create),
            "DELETE" => Some(Self::Delete),
            "ALTER" => Some(Self::Alter),
            "DESCRIBE" => Some(Self::Describe),
            "CLUSTERACTION" => Some(Self::ClusterAction),
            "DESCRIBECONFIGS" => Some(Self::DescribeConfigs),
            "ALTERCONFIGS" => Some(Self::AlterConfigs),
            "IDEMPOTENTWRITE" => Some(Self::IdempotentWrite),
            "CREATETOKENS" => Some(Self::CreateTokens),
            "DESCRIBETOKENS" => Some(Self::DescribeTokens),
            _ => None,
        }
    }

    /// Whether this value is only meaningful in a filter
    pub fn is_filter_only(&self) -> bool {
        matches!(self, Self::Any)
    }
}

impl fmt::Display for AclOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an ACL allows or denies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AclPermissionType {
    /// Filter-only: matches both
    Any,
    Deny,
    Allow,
}

impl AclPermissionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "ANY",
            Self::Deny => "DENY",
            Self::Allow => "ALLOW",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match normalize(token).as_str() {
            "ANY" => Some(Self::Any),
            "DENY" => Some(Self::Deny),
            "ALLOW" => Some(Self::Allow),
            _ => None,
        }
    }

    pub fn is_filter_only(&self) -> bool {
        matches!(self, Self::Any)
    }
}

impl fmt::Display for AclPermissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of resource an ACL applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    /// Filter-only: matches any resource type
    Any,
    Topic,
    Group,
    Cluster,
    TransactionalId,
    DelegationToken,
    User,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "ANY",
            Self::Topic => "TOPIC",
            Self::Group => "GROUP",
            Self::Cluster => "CLUSTER",
            Self::TransactionalId => "TRANSACTIONAL_ID",
            Self::DelegationToken => "DELEGATION_TOKEN",
            Self::User => "USER",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match normalize(token).as_str() {
            "ANY" => Some(Self::Any),
            "TOPIC" => Some(Self::Topic),
            "GROUP" => Some(Self::Group),
            "CLUSTER" => Some(Self::Cluster),
            "TRANSACTIONALID" => Some(Self::TransactionalId),
            "DELEGATIONTOKEN" => Some(Self::DelegationToken),
            "USER" => Some(Self::User),
            _ => None,
        }
    }

    pub fn is_filter_only(&self) -> bool {
        matches!(self, Self::Any)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an ACL's resource name is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternType {
    /// Filter-only: matches any pattern type
    Any,
    /// Filter-only: matches every pattern that applies to the filter's name
    Match,
    /// Exact name match (`*` is the wildcard)
    Literal,
    /// Name prefix match
    Prefixed,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "ANY",
            Self::Match => "MATCH",
            Self::Literal => "LITERAL",
            Self::Prefixed => "PREFIXED",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match normalize(token).as_str() {
            "ANY" => Some(Self::Any),
            "MATCH" => Some(Self::Match),
            "LITERAL" => Some(Self::Literal),
            "PREFIXED" => Some(Self::Prefixed),
            _ => None,
        }
    }

    pub fn is_filter_only(&self) -> bool {
        matches!(self, Self::Any | Self::Match)
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ACL entries
// =============================================================================

/// An access-control entry.
///
/// Two entries are the same entry exactly when all seven fields are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AclEntry {
    /// e.g. `User:Alice`
    pub principal: String,
    /// `*` means any host
    pub host: String,
    pub operation: AclOperation,
    pub permission_type: AclPermissionType,
    pub resource_type: ResourceType,
    /// `*` means any resource
    pub resource_name: String,
    pub pattern_type: PatternType,
}

impl AclEntry {
    /// An entry for `principal` with every other field at its default:
    /// host `*`, ALL, ALLOW on TOPIC `*`, LITERAL.
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            host: "*".to_string(),
            operation: AclOperation::All,
            permission_type: AclPermissionType::Allow,
            resource_type: ResourceType::Topic,
            resource_name: "*".to_string(),
            pattern_type: PatternType::Literal,
        }
    }

    /// Whether any field holds a value that is only legal in filters
    pub fn has_filter_only_values(&self) -> bool {
        self.operation.is_filter_only()
            || self.permission_type.is_filter_only()
            || self.resource_type.is_filter_only()
            || self.pattern_type.is_filter_only()
    }
}

impl Resource for AclEntry {
    const KIND: &'static str = "acl";

    fn id(&self) -> String {
        format!(
            "{} {} {} on {}:{}:{} from {}",
            self.principal,
            self.permission_type,
            self.operation,
            self.resource_type,
            self.pattern_type,
            self.resource_name,
            self.host
        )
    }
}

impl fmt::Display for AclEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

/// Selects ACL entries when listing.
///
/// `None` and the `ANY` variants match everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclFilter {
    pub principal: Option<String>,
    pub host: Option<String>,
    pub operation: AclOperation,
    pub permission_type: AclPermissionType,
    pub resource_type: ResourceType,
    pub resource_name: Option<String>,
    pub pattern_type: PatternType,
}

impl AclFilter {
    /// A filter that matches every entry
    pub fn any() -> Self {
        Self {
            principal: None,
            host: None,
            operation: AclOperation::Any,
            permission_type: AclPermissionType::Any,
            resource_type: ResourceType::Any,
            resource_name: None,
            pattern_type: PatternType::Any,
        }
    }

    /// Check if an entry is selected by this filter
    pub fn matches(&self, entry: &AclEntry) -> bool {
        let text_matches = |want: &Option<String>, have: &str| {
            want.as_deref().is_none_or(|want| want == have)
        };

        text_matches(&self.principal, &entry.principal)
            && text_matches(&self.host, &entry.host)
            && (self.operation == AclOperation::Any || self.operation == entry.operation)
            && (self.permission_type == AclPermissionType::Any
                || self.permission_type == entry.permission_type)
            && (self.resource_type == ResourceType::Any
                || self.resource_type == entry.resource_type)
            && self.pattern_matches(entry)
    }

    fn pattern_matches(&self, entry: &AclEntry) -> bool {
        match self.pattern_type {
            PatternType::Match => match &self.resource_name {
                None => true,
                Some(name) => match entry.pattern_type {
                    PatternType::Literal => {
                        entry.resource_name == *name || entry.resource_name == "*"
                    }
                    PatternType::Prefixed => name.starts_with(&entry.resource_name),
                    _ => false,
                },
            },
            PatternType::Any => self
                .resource_name
                .as_deref()
                .is_none_or(|name| name == entry.resource_name),
            exact => {
                exact == entry.pattern_type
                    && self
                        .resource_name
                        .as_deref()
                        .is_none_or(|name| name == entry.resource_name)
            }
        }
    }
}

impl Default for AclFilter {
    fn default() -> Self {
        Self::any()
    }
}

// =============================================================================
// Consumer groups
// =============================================================================

/// A consumer group and, when described, its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerGroup {
    pub group_id: String,
    /// e.g. `Stable`, `Empty`; `None` when only listed
    pub state: Option<String>,
    /// Partition assignment strategy, e.g. `range`
    pub protocol: Option<String>,
    /// Coordinator broker, e.g. `localhost:9092 (1)`
    pub coordinator: Option<String>,
    pub members: Vec<GroupMember>,
}

impl ConsumerGroup {
    /// A group known by id only
    pub fn listed(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            state: None,
            protocol: None,
            coordinator: None,
            members: Vec::new(),
        }
    }
}

/// One member of a consumer group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub member_id: String,
    pub client_id: String,
    pub host: String,
    /// Assigned partitions per topic
    pub assignment: Vec<TopicAssignment>,
}

/// Partitions of one topic assigned to a group member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicAssignment {
    pub topic: String,
    pub partitions: Vec<i32>,
}

/// Committed offset of one group on one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupOffset {
    pub group: String,
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub log_end_offset: Option<i64>,
    pub lag: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn partition(id: i32, replicas: &[i32]) -> PartitionInfo {
        PartitionInfo {
            partition: id,
            leader: replicas.first().copied().unwrap_or(-1),
            replicas: replicas.to_vec(),
            isr: replicas.to_vec(),
            offline_replicas: Vec::new(),
            error_code: 0,
        }
    }

    #[test]
    fn test_topic_equality_ignores_partition_detail() {
        let declared = Topic::new("orders", 2, 3);
        let reported =
            Topic::from_partitions("orders", vec![partition(0, &[1, 2, 3]), partition(1, &[2, 3, 1])]);

        assert_eq!(declared, reported);

        let mut set = HashSet::new();
        set.insert(declared);
        assert!(set.contains(&reported));
    }

    #[test]
    fn test_topic_from_partitions_uses_lowest_partition() {
        let topic =
            Topic::from_partitions("t", vec![partition(1, &[1]), partition(0, &[1, 2])]);

        assert_eq!(topic.num_partitions, 2);
        assert_eq!(topic.replication_factor, 2);
        assert_eq!(topic.partitions[0].partition, 0);
    }

    #[test]
    fn test_topic_leftovers_sorted_by_name() {
        let mut leftovers = vec![Topic::new("z", 1, 1), Topic::new("a", 1, 1)];
        Topic::order_leftovers(&mut leftovers);
        assert_eq!(leftovers[0].name, "a");
    }

    #[test]
    fn test_enum_parse_is_case_insensitive() {
        assert_eq!(AclOperation::parse("read"), Some(AclOperation::Read));
        assert_eq!(
            AclOperation::parse("ClusterAction"),
            Some(AclOperation::ClusterAction)
        );
        assert_eq!(
            AclOperation::parse("describe_configs"),
            Some(AclOperation::DescribeConfigs)
        );
        assert_eq!(AclPermissionType::parse(" Deny "), Some(AclPermissionType::Deny));
        assert_eq!(
            ResourceType::parse("transactional_id"),
            Some(ResourceType::TransactionalId)
        );
        assert_eq!(PatternType::parse("prefixed"), Some(PatternType::Prefixed));
    }

    #[test]
    fn test_enum_parse_rejects_unknown() {
        assert_eq!(AclOperation::parse("fly"), None);
        assert_eq!(AclPermissionType::parse("maybe"), None);
        assert_eq!(ResourceType::parse(""), None);
        assert_eq!(PatternType::parse("regex"), None);
    }

    #[test]
    fn test_enum_names_round_trip() {
        for op in [
            AclOperation::All,
            AclOperation::ClusterAction,
            AclOperation::IdempotentWrite,
        ] {
            assert_eq!(AclOperation::parse(op.as_str()), Some(op));
            assert_eq!(AclOperation::parse(op.tool_name()), Some(op));
        }
    }

    #[test]
    fn test_acl_entry_defaults() {
        let entry = AclEntry::new("User:Bob");
        assert_eq!(entry.host, "*");
        assert_eq!(entry.operation, AclOperation::All);
        assert_eq!(entry.permission_type, AclPermissionType::Allow);
        assert_eq!(entry.resource_type, ResourceType::Topic);
        assert_eq!(entry.resource_name, "*");
        assert_eq!(entry.pattern_type, PatternType::Literal);
        assert!(!entry.has_filter_only_values());
    }

    #[test]
    fn test_acl_equality_covers_every_field() {
        let a = AclEntry::new("User:Bob");
        let mut b = a.clone();
        b.host = "10.0.0.1".into();
        assert_ne!(a, b);
    }

    #[test]
    fn test_filter_any_matches_everything() {
        let mut entry = AclEntry::new("User:Bob");
        entry.resource_type = ResourceType::Group;
        assert!(AclFilter::any().matches(&entry));
    }

    #[test]
    fn test_filter_by_principal() {
        let filter = AclFilter {
            principal: Some("User:Alice".into()),
            ..AclFilter::any()
        };
        assert!(filter.matches(&AclEntry::new("User:Alice")));
        assert!(!filter.matches(&AclEntry::new("User:Bob")));
    }

    #[test]
    fn test_filter_match_pattern_applies_prefixes() {
        let mut prefixed = AclEntry::new("User:Bob");
        prefixed.resource_name = "orders-".into();
        prefixed.pattern_type = PatternType::Prefixed;

        let filter = AclFilter {
            resource_name: Some("orders-eu".into()),
            pattern_type: PatternType::Match,
            ..AclFilter::any()
        };

        assert!(filter.matches(&prefixed));
        // literal wildcard applies to every name
        assert!(filter.matches(&AclEntry::new("User:Bob")));

        let mut other = AclEntry::new("User:Bob");
        other.resource_name = "payments".into();
        assert!(!filter.matches(&other));
    }
}
