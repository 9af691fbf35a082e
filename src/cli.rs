use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use kafkakit::{AclEntry, AclOperation, AclPermissionType, PatternType, ResourceType};
use std::path::PathBuf;

/// Default location of the definitions document
pub const DEFAULT_DEFINITIONS: &str = "definitions/sample.csv";

#[derive(Parser)]
#[command(name = "kafka-admin")]
#[command(version)]
#[command(about = "Manage Kafka topics and ACLs from a definitions file", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to config.yaml
    #[arg(long, global = true, env = "KAFKA_ADMIN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Profile to use instead of default_profile
    #[arg(long, global = true, env = "KAFKA_ADMIN_PROFILE")]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage topics
    #[command(subcommand)]
    Topic(TopicCommand),

    /// Manage access-control entries
    #[command(subcommand)]
    Acl(AclCommand),

    /// Inspect consumer groups
    #[command(subcommand)]
    ConsumerGroups(ConsumerGroupsCommand),

    /// Inspect committed consumer group offsets
    #[command(subcommand)]
    ConsumerGroupOffsets(ConsumerGroupOffsetsCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Topic Commands
// ============================================================================

#[derive(Subcommand)]
pub enum TopicCommand {
    /// Create one topic
    Add {
        /// Topic name
        name: String,

        /// Number of partitions
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
        num_partitions: u32,

        /// Replication factor
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u16).range(1..))]
        replication_factor: u16,
    },

    /// Delete one topic
    Remove {
        /// Topic name
        name: String,
    },

    /// Print current topics, one row per partition
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reconcile topics against the definitions file
    Apply(ApplyArgs),
}

// ============================================================================
// ACL Commands
// ============================================================================

#[derive(Subcommand)]
pub enum AclCommand {
    /// Create one ACL entry (defaults to the User:Alice example entry)
    Add(AclEntryArgs),

    /// Delete one ACL entry (defaults to the User:Alice example entry)
    Remove(AclEntryArgs),

    /// Print current ACL entries
    List {
        /// Only entries for this principal
        #[arg(long)]
        principal: Option<String>,

        /// Only entries on this resource name
        #[arg(long)]
        resource_name: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reconcile ACL entries against the definitions file
    Apply(ApplyArgs),
}

/// Fields of a single ACL entry.
#[derive(Args)]
pub struct AclEntryArgs {
    /// Principal, e.g. User:Alice
    #[arg(long, default_value = "User:Alice")]
    pub principal: String,

    /// Host, `*` for any
    #[arg(long, default_value = "*")]
    pub host: String,

    /// Operation, e.g. READ, WRITE, ALL
    #[arg(long, default_value = "ALL", value_parser = parse_operation)]
    pub operation: AclOperation,

    /// ALLOW or DENY
    #[arg(long, default_value = "ALLOW", value_parser = parse_permission_type)]
    pub permission_type: AclPermissionType,

    /// Resource type, e.g. TOPIC, GROUP, CLUSTER
    #[arg(long, default_value = "TOPIC", value_parser = parse_resource_type)]
    pub resource_type: ResourceType,

    /// Resource name, `*` for any
    #[arg(long, default_value = "*")]
    pub resource_name: String,

    /// LITERAL or PREFIXED
    #[arg(long, default_value = "LITERAL", value_parser = parse_pattern_type)]
    pub pattern_type: PatternType,
}

impl AclEntryArgs {
    pub fn into_entry(self) -> AclEntry {
        AclEntry {
            principal: self.principal,
            host: self.host,
            operation: self.operation,
            permission_type: self.permission_type,
            resource_type: self.resource_type,
            resource_name: self.resource_name,
            pattern_type: self.pattern_type,
        }
    }
}

/// Options shared by `topic apply` and `acl apply`.
#[derive(Args)]
pub struct ApplyArgs {
    /// Definitions file
    #[arg(short = 'f', long, default_value = DEFAULT_DEFINITIONS)]
    pub definitions: PathBuf,

    /// Show the plan without changing anything
    #[arg(long)]
    pub check: bool,

    /// Delete before adding (needed to recreate a changed topic)
    #[arg(long)]
    pub delete_first: bool,
}

// ============================================================================
// Consumer Group Commands
// ============================================================================

#[derive(Subcommand)]
pub enum ConsumerGroupsCommand {
    /// List consumer groups
    List {
        /// Include state, members and assignments
        #[arg(long)]
        detail: bool,
    },
}

#[derive(Subcommand)]
pub enum ConsumerGroupOffsetsCommand {
    /// List committed offsets per group, topic and partition
    List,
}

// ============================================================================
// Value Parsers
// ============================================================================

fn creatable<T>(value: &str, parsed: Option<T>, filter_only: fn(&T) -> bool) -> Result<T, String> {
    match parsed {
        Some(v) if filter_only(&v) => Err(format!("'{value}' is only valid when filtering")),
        Some(v) => Ok(v),
        None => Err(format!("unknown value '{value}'")),
    }
}

fn parse_operation(value: &str) -> Result<AclOperation, String> {
    creatable(value, AclOperation::parse(value), AclOperation::is_filter_only)
}

fn parse_permission_type(value: &str) -> Result<AclPermissionType, String> {
    creatable(
        value,
        AclPermissionType::parse(value),
        AclPermissionType::is_filter_only,
    )
}

fn parse_resource_type(value: &str) -> Result<ResourceType, String> {
    creatable(value, ResourceType::parse(value), ResourceType::is_filter_only)
}

fn parse_pattern_type(value: &str) -> Result<PatternType, String> {
    creatable(value, PatternType::parse(value), PatternType::is_filter_only)
}
