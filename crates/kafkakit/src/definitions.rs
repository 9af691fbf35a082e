//! Versioned definitions document.
//!
//! ```text
//! schema_version: 1
//! ---
//! name    , num_partitions, replication_factor
//! orders  , 3             , 2
//! ---
//! principal, resource_type, resource_name, pattern_type, operation, permission_type, host
//! User:Bob , TOPIC        , orders       , LITERAL     , READ     , ALLOW          , *
//! ```
//!
//! A line is a delimiter when it starts with `---`. The preamble only knows
//! `schema_version`; anything else there is an error.

use crate::error::{Error, Result};
use crate::rows::from_table;
use crate::types::{AclEntry, Topic};
use reconcile::Collection;
use std::path::Path;

/// The only schema version this crate reads
pub const SUPPORTED_SCHEMA_VERSION: u32 = 1;

/// Desired topics and ACLs, read once from a definitions document.
#[derive(Debug, Clone, PartialEq)]
pub struct Definitions {
    schema_version: u32,
    topics: Collection<Topic>,
    acls: Collection<AclEntry>,
}

impl Definitions {
    /// Read and parse a definitions file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::DefinitionsNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let definitions = Self::parse_str(&content)?;
        log::debug!(
            "loaded {} topic(s) and {} acl(s) from {}",
            definitions.topics.len(),
            definitions.acls.len(),
            path.display()
        );
        Ok(definitions)
    }

    /// Parse a definitions document.
    pub fn parse_str(content: &str) -> Result<Self> {
        let lines: Vec<&str> = content.lines().collect();
        let (schema_version, body_start) = parse_preamble(&lines)?;

        match schema_version {
            1 => parse_v1(&lines, body_start),
            other => Err(Error::UnsupportedSchemaVersion(other)),
        }
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Desired topics in document order
    pub fn topics(&self) -> &Collection<Topic> {
        &self.topics
    }

    /// Desired ACL entries in document order
    pub fn acls(&self) -> &Collection<AclEntry> {
        &self.acls
    }
}

fn is_delimiter(line: &str) -> bool {
    line.starts_with("---")
}

/// Returns the schema version and the index of the first line after `---`.
fn parse_preamble(lines: &[&str]) -> Result<(u32, usize)> {
    let mut schema_version = None;

    for (idx, raw) in lines.iter().enumerate() {
        let line_num = idx + 1;

        if is_delimiter(raw) {
            let version = schema_version
                .ok_or_else(|| Error::parse(line_num, "missing schema_version before '---'"))?;
            return Ok((version, idx + 1));
        }

        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_once(':') {
            Some((key, value)) if key.trim() == "schema_version" => {
                if schema_version.is_some() {
                    return Err(Error::parse(line_num, "schema_version given twice"));
                }
                let value = value.trim();
                let version = value.parse::<u32>().map_err(|_| {
                    Error::parse(line_num, format!("schema_version must be an integer, got '{value}'"))
                })?;
                schema_version = Some(version);
            }
            _ => {
                return Err(Error::UnknownMetadata {
                    line: line_num,
                    text: line.to_string(),
                });
            }
        }
    }

    Err(Error::MissingDelimiter {
        section: "preamble",
    })
}

fn parse_v1(lines: &[&str], body_start: usize) -> Result<Definitions> {
    let rest = &lines[body_start..];
    let split = rest.iter().position(|l| is_delimiter(l));

    let (topic_lines, acl_lines, acl_start) = match split {
        Some(pos) => (&rest[..pos], &rest[pos + 1..], body_start + pos + 1),
        None => (rest, &rest[rest.len()..], lines.len()),
    };

    if let Some(pos) = acl_lines.iter().position(|l| is_delimiter(l)) {
        return Err(Error::parse(
            acl_start + pos + 1,
            "unexpected '---' after the ACL section started",
        ));
    }

    let topics: Vec<Topic> = from_table(&topic_lines.join("\n"), body_start + 1)?;
    let acls: Vec<AclEntry> = from_table(&acl_lines.join("\n"), acl_start + 1)?;

    Ok(Definitions {
        schema_version: 1,
        topics: topics.into(),
        acls: acls.into(),
    })
}
