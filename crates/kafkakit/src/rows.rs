//! Conversion between resources and table rows.

use crate::error::{Error, Result};
use crate::table::{self, Record};
use crate::types::{
    AclEntry, AclOperation, AclPermissionType, PartitionInfo, PatternType, ResourceType, Topic,
};

/// A resource with a flat row form.
///
/// `from_record` is the inverse of `to_row` for every column, and fills in
/// defaults for blank optional cells.
pub trait Tabular: Sized {
    /// Column names in rendering order
    const COLUMNS: &'static [&'static str];

    /// Render the semantic fields, enumerations by name
    fn to_row(&self) -> Vec<String>;

    /// Build a value from one parsed row
    fn from_record(record: &Record) -> Result<Self>;
}

/// Render values as a table with a header row.
pub fn to_table<T: Tabular>(items: &[T]) -> String {
    let rows: Vec<Vec<String>> = items.iter().map(Tabular::to_row).collect();
    table::render(T::COLUMNS, &rows)
}

/// Render values as pretty-printed JSON for machine consumers.
pub fn to_json<T: serde::Serialize>(items: &[T]) -> Result<String> {
    Ok(serde_json::to_string_pretty(items)?)
}

/// Parse table text into values.
///
/// `first_line` is the document line the text starts on, so errors point at
/// the right place. A column the type does not know is an error.
pub fn from_table<T: Tabular>(text: &str, first_line: usize) -> Result<Vec<T>> {
    let table = table::parse(text, first_line)?;

    if let Some(unknown) = table
        .columns
        .iter()
        .find(|c| !T::COLUMNS.contains(&c.as_str()))
    {
        return Err(Error::parse(
            table.header_line,
            format!(
                "unknown column '{unknown}' (expected some of: {})",
                T::COLUMNS.join(", ")
            ),
        ));
    }

    table.records.iter().map(T::from_record).collect()
}

impl Tabular for Topic {
    const COLUMNS: &'static [&'static str] = &["name", "num_partitions", "replication_factor"];

    fn to_row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.num_partitions.to_string(),
            self.replication_factor.to_string(),
        ]
    }

    fn from_record(record: &Record) -> Result<Self> {
        let name = required(record, "name")?;
        let num_partitions = positive::<u32>(record, "num_partitions")?;
        let replication_factor = positive::<u16>(record, "replication_factor")?;
        Ok(Topic::new(name, num_partitions, replication_factor))
    }
}

impl Tabular for AclEntry {
    const COLUMNS: &'static [&'static str] = &[
        "principal",
        "resource_type",
        "resource_name",
        "pattern_type",
        "operation",
        "permission_type",
        "host",
    ];

    fn to_row(&self) -> Vec<String> {
        vec![
            self.principal.clone(),
            self.resource_type.as_str().to_string(),
            self.resource_name.clone(),
            self.pattern_type.as_str().to_string(),
            self.operation.as_str().to_string(),
            self.permission_type.as_str().to_string(),
            self.host.clone(),
        ]
    }

    fn from_record(record: &Record) -> Result<Self> {
        let mut entry = AclEntry::new(required(record, "principal")?);

        if let Some(host) = record.get("host") {
            entry.host = host.to_string();
        }
        if let Some(name) = record.get("resource_name") {
            entry.resource_name = name.to_string();
        }
        entry.operation = token(
            record,
            "operation",
            entry.operation,
            AclOperation::parse,
            AclOperation::is_filter_only,
        )?;
        entry.permission_type = token(
            record,
            "permission_type",
            entry.permission_type,
            AclPermissionType::parse,
            AclPermissionType::is_filter_only,
        )?;
        entry.resource_type = token(
            record,
            "resource_type",
            entry.resource_type,
            ResourceType::parse,
            ResourceType::is_filter_only,
        )?;
        entry.pattern_type = token(
            record,
            "pattern_type",
            entry.pattern_type,
            PatternType::parse,
            PatternType::is_filter_only,
        )?;

        Ok(entry)
    }
}

fn required<'a>(record: &'a Record, column: &str) -> Result<&'a str> {
    record
        .get(column)
        .ok_or_else(|| Error::parse(record.line(), format!("missing required column '{column}'")))
}

fn positive<N>(record: &Record, column: &str) -> Result<N>
where
    N: std::str::FromStr + PartialOrd + From<u8>,
{
    let Some(raw) = record.get(column) else {
        return Ok(N::from(1));
    };

    match raw.parse::<N>() {
        Ok(n) if n >= N::from(1) => Ok(n),
        _ => Err(Error::parse(
            record.line(),
            format!("{column} must be a positive integer, got '{raw}'"),
        )),
    }
}

fn token<E>(
    record: &Record,
    column: &'static str,
    default: E,
    parse: fn(&str) -> Option<E>,
    filter_only: fn(&E) -> bool,
) -> Result<E> {
    let Some(raw) = record.get(column) else {
        return Ok(default);
    };

    let value = parse(raw).ok_or_else(|| Error::UnknownToken {
        line: record.line(),
        kind: column,
        token: raw.to_string(),
    })?;

    if filter_only(&value) {
        return Err(Error::parse(
            record.line(),
            format!("{column} '{raw}' is only valid when filtering"),
        ));
    }

    Ok(value)
}

/// Columns of the per-partition topic rendering
pub const TOPIC_DETAIL_COLUMNS: &[&str] = &[
    "name",
    "num_partitions",
    "replication_factor",
    "partition_id",
    "leader",
    "replicas",
    "isr",
    "offline_replicas",
    "error_code",
];

/// Render topics with one row per partition.
///
/// Topic-level cells are filled on the first partition row of each topic
/// and left blank after that.
pub fn render_topic_detail(topics: &[Topic]) -> String {
    let mut rows = Vec::new();

    for topic in topics {
        let mut partitions: Vec<&PartitionInfo> = topic.partitions.iter().collect();
        partitions.sort_by_key(|p| p.partition);

        if partitions.is_empty() {
            let mut row = topic.to_row();
            row.resize(TOPIC_DETAIL_COLUMNS.len(), String::new());
            rows.push(row);
            continue;
        }

        for (idx, partition) in partitions.into_iter().enumerate() {
            let mut row = if idx == 0 {
                topic.to_row()
            } else {
                vec![String::new(); 3]
            };
            row.extend([
                partition.partition.to_string(),
                partition.leader.to_string(),
                id_list(&partition.replicas),
                id_list(&partition.isr),
                id_list(&partition.offline_replicas),
                partition.error_code.to_string(),
            ]);
            rows.push(row);
        }
    }

    table::render(TOPIC_DETAIL_COLUMNS, &rows)
}

fn id_list(ids: &[i32]) -> String {
    let joined: Vec<String> = ids.iter().map(ToString::to_string).collect();
    format!("[{}]", joined.join(" "))
}
