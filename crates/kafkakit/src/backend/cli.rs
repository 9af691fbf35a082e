//! Backend driving the Kafka admin tools (`kafka-topics.sh` and friends).

use crate::backend::Backend;
use crate::broker::{BrokerError, BrokerResponse, classify_tool_failure};
use crate::connection::ConnectionConfig;
use crate::error::{Error, Result};
use crate::types::{
    AclEntry, AclFilter, AclOperation, AclPermissionType, ConsumerGroup, GroupMember,
    GroupOffset, PartitionInfo, PatternType, ResourceType, Topic, TopicAssignment,
};
use regex::Regex;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::LazyLock;
use tempfile::NamedTempFile;

const TOPICS_TOOL: &str = "kafka-topics.sh";
const ACLS_TOOL: &str = "kafka-acls.sh";
const GROUPS_TOOL: &str = "kafka-consumer-groups.sh";

/// Backend that executes the Kafka admin tools.
///
/// Credentials go into a private properties file passed with
/// `--command-config`; they never appear on a command line.
pub struct CliBackend {
    bootstrap: String,
    bin_dir: Option<PathBuf>,
    command_config: Option<NamedTempFile>,
}

impl CliBackend {
    /// Create a backend for one cluster.
    ///
    /// Tools are looked up in `kafka_bin_dir`, then `$KAFKA_HOME/bin`, then
    /// `PATH`.
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        config.validate()?;

        let command_config = match config.client_properties() {
            Some(properties) => {
                let mut file = tempfile::Builder::new()
                    .prefix("kafka-admin-")
                    .suffix(".properties")
                    .tempfile()?;
                file.write_all(properties.as_bytes())?;
                file.flush()?;
                Some(file)
            }
            None => None,
        };

        let bin_dir = config.kafka_bin_dir.clone().or_else(|| {
            std::env::var_os("KAFKA_HOME").map(|home| PathBuf::from(home).join("bin"))
        });

        log::debug!(
            "admin tools for {} ({}), bin dir {:?}",
            config.bootstrap(),
            config.security_protocol,
            bin_dir
        );

        Ok(Self {
            bootstrap: config.bootstrap(),
            bin_dir,
            command_config,
        })
    }

    /// Resolve a tool, accepting both `kafka-topics.sh` and `kafka-topics`.
    fn tool_path(&self, tool: &str) -> PathBuf {
        let bare = tool.trim_end_matches(".sh");

        if let Some(dir) = &self.bin_dir {
            return [tool, bare]
                .iter()
                .map(|name| dir.join(name))
                .find(|path| path.is_file())
                .unwrap_or_else(|| dir.join(tool));
        }

        find_on_path(tool)
            .or_else(|| find_on_path(bare))
            .unwrap_or_else(|| PathBuf::from(tool))
    }

    /// Run a tool against the cluster and return its raw output.
    fn run(&self, tool: &str, args: &[&str]) -> Result<Output> {
        let path = self.tool_path(tool);
        let mut command = Command::new(&path);
        command.arg("--bootstrap-server").arg(&self.bootstrap);
        if let Some(file) = &self.command_config {
            command.arg("--command-config").arg(file.path());
        }
        command.args(args);

        log::debug!("running {} {}", path.display(), args.join(" "));

        let output = command.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::ToolNotFound {
                    tool: tool.to_string(),
                }
            } else {
                Error::CommandFailed {
                    message: format!("failed to execute {tool}: {e}"),
                    stderr: String::new(),
                }
            }
        })?;

        log::trace!("{tool} exited with {}", output.status);
        Ok(output)
    }

    /// Run a read-only query. Any failure is fatal.
    fn query(&self, tool: &str, args: &[&str]) -> Result<String> {
        let output = self.run(tool, args)?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).to_string());
        }

        let text = combined_output(&output);
        let response = classify_tool_failure(&text)?;
        Err(Error::CommandFailed {
            message: format!("{tool} {} answered {}", args.join(" "), response.error),
            stderr: response.message.unwrap_or_default(),
        })
    }

    /// Run a mutation. A broker refusal is a response, not an error.
    fn mutate(&self, tool: &str, args: &[&str]) -> Result<BrokerResponse> {
        let output = self.run(tool, args)?;
        if output.status.success() {
            return Ok(BrokerResponse::ok());
        }

        let response = classify_tool_failure(&combined_output(&output))?;
        log::info!("{tool} refused: {}", response.error);
        Ok(response)
    }
}

impl Backend for CliBackend {
    fn describe_topics(&self) -> Result<Vec<Topic>> {
        let stdout = self.query(TOPICS_TOOL, &["--describe", "--exclude-internal"])?;
        parse_topic_description(&stdout)
    }

    fn create_topic(&self, topic: &Topic) -> Result<BrokerResponse> {
        let partitions = topic.num_partitions.to_string();
        let replication = topic.replication_factor.to_string();
        self.mutate(
            TOPICS_TOOL,
            &[
                "--create",
                "--topic",
                &topic.name,
                "--partitions",
                &partitions,
                "--replication-factor",
                &replication,
            ],
        )
    }

    fn delete_topic(&self, name: &str) -> Result<BrokerResponse> {
        // --topic takes a pattern; a dot in a name must not match any character
        let pattern = regex::escape(name);
        self.mutate(TOPICS_TOOL, &["--delete", "--topic", &pattern])
    }

    fn describe_acls(&self, filter: &AclFilter) -> Result<(Vec<AclEntry>, BrokerError)> {
        let output = self.run(ACLS_TOOL, &["--list"])?;

        if !output.status.success() {
            let response = classify_tool_failure(&combined_output(&output))?;
            return Ok((Vec::new(), response.error));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let entries = parse_acl_listing(&stdout)?
            .into_iter()
            .filter(|entry| filter.matches(entry))
            .collect();
        Ok((entries, BrokerError::NoError))
    }

    fn create_acl(&self, acl: &AclEntry) -> Result<BrokerResponse> {
        match acl_args(acl, "--add") {
            Some(args) => {
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                self.mutate(ACLS_TOOL, &args)
            }
            None => Ok(filter_only_refusal(acl)),
        }
    }

    fn delete_acl(&self, acl: &AclEntry) -> Result<BrokerResponse> {
        match acl_args(acl, "--remove") {
            Some(mut args) => {
                args.push("--force".to_string());
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                self.mutate(ACLS_TOOL, &args)
            }
            None => Ok(filter_only_refusal(acl)),
        }
    }

    fn list_consumer_groups(&self) -> Result<Vec<String>> {
        let stdout = self.query(GROUPS_TOOL, &["--list"])?;
        Ok(parse_group_list(&stdout))
    }

    fn describe_consumer_group(&self, group_id: &str) -> Result<ConsumerGroup> {
        let state = self.query(GROUPS_TOOL, &["--describe", "--group", group_id, "--state"])?;
        let members = self.query(
            GROUPS_TOOL,
            &["--describe", "--group", group_id, "--members", "--verbose"],
        )?;

        let mut group = parse_group_state(&state, group_id);
        group.members = parse_group_members(&members);
        Ok(group)
    }

    fn list_consumer_group_offsets(&self, group_id: &str) -> Result<Vec<GroupOffset>> {
        let stdout = self.query(GROUPS_TOOL, &["--describe", "--group", group_id, "--offsets"])?;
        parse_group_offsets(&stdout)
    }
}

fn find_on_path(name: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|path| path.is_file())
}

/// The tools print some errors on stdout and the stack trace on stderr.
fn combined_output(output: &Output) -> String {
    format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stderr),
        String::from_utf8_lossy(&output.stdout)
    )
}

fn filter_only_refusal(acl: &AclEntry) -> BrokerResponse {
    BrokerResponse::failed(
        BrokerError::InvalidRequest,
        format!("'{acl}' uses a value that is only valid when filtering"),
    )
}

// =============================================================================
// Argument builders
// =============================================================================

/// Arguments for `kafka-acls.sh` to add or remove exactly `acl`.
///
/// Returns `None` when the entry holds a filter-only value.
fn acl_args(acl: &AclEntry, action: &str) -> Option<Vec<String>> {
    let (principal_flag, host_flag) = match acl.permission_type {
        AclPermissionType::Allow => ("--allow-principal", "--allow-host"),
        AclPermissionType::Deny => ("--deny-principal", "--deny-host"),
        AclPermissionType::Any => return None,
    };

    if acl.operation == AclOperation::Any {
        return None;
    }

    let pattern = match acl.pattern_type {
        PatternType::Literal | PatternType::Prefixed => acl.pattern_type.as_str(),
        PatternType::Any | PatternType::Match => return None,
    };

    let mut args = vec![
        action.to_string(),
        principal_flag.to_string(),
        acl.principal.clone(),
        host_flag.to_string(),
        acl.host.clone(),
        "--operation".to_string(),
        acl.operation.tool_name().to_string(),
    ];

    let resource_flag = match acl.resource_type {
        ResourceType::Topic => "--topic",
        ResourceType::Group => "--group",
        ResourceType::TransactionalId => "--transactional-id",
        ResourceType::DelegationToken => "--delegation-token",
        ResourceType::User => "--user-principal",
        ResourceType::Cluster => "--cluster",
        ResourceType::Any => return None,
    };
    args.push(resource_flag.to_string());
    if acl.resource_type != ResourceType::Cluster {
        args.push(acl.resource_name.clone());
    }

    args.push("--resource-pattern-type".to_string());
    args.push(pattern.to_string());

    Some(args)
}

// =============================================================================
// Output parsers
// =============================================================================

/// Parse `kafka-topics.sh --describe` output.
///
/// Header lines carry `Topic`, `PartitionCount`, ...; partition lines carry
/// `Topic`, `Partition`, `Leader`, `Replicas`, `Isr` and sometimes
/// `Offline`. Both `Key: value` and the older `Key:value` spellings occur.
fn parse_topic_description(stdout: &str) -> Result<Vec<Topic>> {
    struct Described {
        name: String,
        partition_count: Option<u32>,
        replication_factor: Option<u16>,
        partitions: Vec<PartitionInfo>,
    }

    let mut described: Vec<Described> = Vec::new();

    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        let fields: Vec<(&str, &str)> = line
            .split('\t')
            .filter_map(|field| field.split_once(':'))
            .map(|(key, value)| (key.trim(), value.trim()))
            .collect();
        let field = |key: &str| fields.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);

        let Some(name) = field("Topic") else {
            log::debug!("skipping topic description line: {line}");
            continue;
        };

        if described.last().is_none_or(|d| d.name != name) {
            described.push(Described {
                name: name.to_string(),
                partition_count: None,
                replication_factor: None,
                partitions: Vec::new(),
            });
        }
        let Some(current) = described.last_mut() else {
            continue;
        };

        match field("Partition") {
            Some(partition) => {
                let leader = match field("Leader") {
                    None | Some("none") => -1,
                    Some(id) => parse_number(id, line)?,
                };
                current.partitions.push(PartitionInfo {
                    partition: parse_number(partition, line)?,
                    leader,
                    replicas: parse_ids(field("Replicas").unwrap_or(""), line)?,
                    isr: parse_ids(field("Isr").unwrap_or(""), line)?,
                    offline_replicas: parse_ids(field("Offline").unwrap_or(""), line)?,
                    error_code: 0,
                });
            }
            None => {
                current.partition_count = field("PartitionCount").and_then(|v| v.parse().ok());
                current.replication_factor =
                    field("ReplicationFactor").and_then(|v| v.parse().ok());
            }
        }
    }

    Ok(described
        .into_iter()
        .map(|d| {
            if d.partitions.is_empty() {
                Topic::new(
                    d.name,
                    d.partition_count.unwrap_or(0),
                    d.replication_factor.unwrap_or(0),
                )
            } else {
                Topic::from_partitions(d.name, d.partitions)
            }
        })
        .collect())
}

fn parse_number<N: std::str::FromStr>(value: &str, line: &str) -> Result<N> {
    value.parse().map_err(|_| Error::Protocol {
        message: format!("expected a number, got '{value}' in: {line}"),
    })
}

fn parse_ids(value: &str, line: &str) -> Result<Vec<i32>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| parse_number(id, line))
        .collect()
}

static ACL_RESOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ResourcePattern\(resourceType=(\w+), name=(.*), patternType=(\w+)\)")
        .expect("valid resource pattern regex")
});

static ACL_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(principal=(.*), host=(.*), operation=(\w+), permissionType=(\w+)\)")
        .expect("valid acl entry regex")
});

/// Parse `kafka-acls.sh --list` output.
///
/// ```text
/// Current ACLs for resource `ResourcePattern(resourceType=TOPIC, name=orders, patternType=LITERAL)`:
///     (principal=User:Bob, host=*, operation=READ, permissionType=ALLOW)
/// ```
fn parse_acl_listing(stdout: &str) -> Result<Vec<AclEntry>> {
    let mut entries = Vec::new();
    let mut resource: Option<(ResourceType, String, PatternType)> = None;

    for line in stdout.lines() {
        if let Some(caps) = ACL_RESOURCE.captures(line) {
            resource = Some((
                parse_token(&caps[1], ResourceType::parse, "resource type")?,
                caps[2].to_string(),
                parse_token(&caps[3], PatternType::parse, "pattern type")?,
            ));
            continue;
        }

        let Some(caps) = ACL_ENTRY.captures(line) else {
            continue;
        };
        let Some((resource_type, resource_name, pattern_type)) = &resource else {
            return Err(Error::Protocol {
                message: format!("ACL entry before any resource: {}", line.trim()),
            });
        };

        entries.push(AclEntry {
            principal: caps[1].to_string(),
            host: caps[2].to_string(),
            operation: parse_token(&caps[3], AclOperation::parse, "operation")?,
            permission_type: parse_token(&caps[4], AclPermissionType::parse, "permission type")?,
            resource_type: *resource_type,
            resource_name: resource_name.clone(),
            pattern_type: *pattern_type,
        });
    }

    Ok(entries)
}

fn parse_token<E>(token: &str, parse: fn(&str) -> Option<E>, kind: &str) -> Result<E> {
    parse(token).ok_or_else(|| Error::Protocol {
        message: format!("unknown {kind} '{token}' in ACL listing"),
    })
}

/// Parse `kafka-consumer-groups.sh --list` output.
fn parse_group_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Data rows following the `GROUP ...` header line, split on whitespace.
fn table_rows(stdout: &str) -> Vec<Vec<&str>> {
    stdout
        .lines()
        .skip_while(|l| l.split_whitespace().next() != Some("GROUP"))
        .skip(1)
        .map(|l| l.split_whitespace().collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect()
}

/// Parse `--describe --state` output.
///
/// `COORDINATOR (ID)` spans two cells and `ASSIGNMENT-STRATEGY` is blank
/// for an empty group.
fn parse_group_state(stdout: &str, group_id: &str) -> ConsumerGroup {
    let mut group = ConsumerGroup::listed(group_id);

    if let Some(cells) = table_rows(stdout).into_iter().find(|c| c[0] == group_id) {
        match cells.len() {
            6 => {
                group.coordinator = Some(format!("{} {}", cells[1], cells[2]));
                group.protocol = Some(cells[3].to_string());
                group.state = Some(cells[4].to_string());
            }
            5 => {
                group.coordinator = Some(format!("{} {}", cells[1], cells[2]));
                group.state = Some(cells[3].to_string());
            }
            _ => log::debug!("unexpected state row for {group_id}: {cells:?}"),
        }
    }

    group
}

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([^,()]+)\(([0-9,]*)\)").expect("valid assignment regex")
});

/// Parse `--describe --members --verbose` output.
fn parse_group_members(stdout: &str) -> Vec<GroupMember> {
    table_rows(stdout)
        .into_iter()
        .filter(|cells| cells.len() >= 4)
        .map(|cells| {
            let assignment = cells
                .get(5)
                .map(|raw| {
                    ASSIGNMENT
                        .captures_iter(raw)
                        .map(|caps| TopicAssignment {
                            topic: caps[1].to_string(),
                            partitions: caps[2]
                                .split(',')
                                .filter_map(|p| p.parse().ok())
                                .collect(),
                        })
                        .collect()
                })
                .unwrap_or_default();

            GroupMember {
                member_id: cells[1].to_string(),
                host: cells[2].to_string(),
                client_id: cells[3].to_string(),
                assignment,
            }
        })
        .collect()
}

/// Parse `--describe --offsets` output; partitions without a committed
/// offset are left out.
fn parse_group_offsets(stdout: &str) -> Result<Vec<GroupOffset>> {
    let optional = |value: &str, line: &str| -> Result<Option<i64>> {
        if value == "-" {
            Ok(None)
        } else {
            parse_number(value, line).map(Some)
        }
    };

    let mut offsets = Vec::new();
    for cells in table_rows(stdout) {
        if cells.len() < 6 {
            continue;
        }
        let line = cells.join(" ");
        let Some(offset) = optional(cells[3], &line)? else {
            continue;
        };

        offsets.push(GroupOffset {
            group: cells[0].to_string(),
            topic: cells[1].to_string(),
            partition: parse_number(cells[2], &line)?,
            offset,
            log_end_offset: optional(cells[4], &line)?,
            lag: optional(cells[5], &line)?,
        });
    }

    Ok(offsets)
}
