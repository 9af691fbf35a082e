//! End-to-end reconciliation against the in-memory broker
//!
//! Definitions are parsed from text or a temporary file, planned against a
//! `MemoryBackend` and applied through the `reconcile` driver.

use std::io::Write;

use kafkakit::backend::memory::MemoryBackend;
use kafkakit::{
    AclEntry, AclOperation, AclStore, Definitions, Error, ErrorCategory, ResourceType, Topic,
    TopicStore,
};
use reconcile::{
    ApplyOrder, ExecuteOptions, FailureKind, NoProgress, Outcome, Phase, Plan, execute,
    plan_against,
};
use std::path::Path;

// ============================================================================
// Test Helpers
// ============================================================================

const DEFINITIONS: &str = "\
schema_version: 1
---
# topics
name, num_partitions, replication_factor
t1  , 3             , 2
t2  , 1             , 1
---
principal, resource_type, resource_name, pattern_type, operation, permission_type, host
User:Bob , GROUP        , billing      ,             , READ     ,                ,
";

fn names(topics: &[Topic]) -> Vec<&str> {
    topics.iter().map(|t| t.name.as_str()).collect()
}

/// Load a definitions file and plan its topics, as `topic apply` does.
fn plan_topics(path: &Path, backend: &MemoryBackend) -> kafkakit::Result<Plan<Topic>> {
    let definitions = Definitions::load(path)?;
    plan_against(&TopicStore::new(backend), definitions.topics())
}

// ============================================================================
// Topics
// ============================================================================

#[test]
fn test_topic_plan_and_alignment() {
    let definitions = Definitions::parse_str(DEFINITIONS).unwrap();
    let backend =
        MemoryBackend::new().with_topics([Topic::new("t3", 1, 1), Topic::new("t2", 1, 1)]);

    let plan = plan_against(&TopicStore::new(&backend), definitions.topics()).unwrap();

    assert_eq!(plan.to_add.to_vec(), vec![Topic::new("t1", 3, 2)]);
    assert_eq!(plan.to_delete.to_vec(), vec![Topic::new("t3", 1, 1)]);
    assert_eq!(names(&plan.aligned_current), vec!["t2", "t3"]);
    assert_eq!(backend.calls(), vec!["describe_topics"]);
}

#[test]
fn test_check_mode_never_mutates() {
    let definitions = Definitions::parse_str(DEFINITIONS).unwrap();
    let backend = MemoryBackend::new().with_topics([Topic::new("t3", 1, 1)]);
    let topics = TopicStore::new(&backend);

    let plan = plan_against(&topics, definitions.topics()).unwrap();
    let options = ExecuteOptions {
        check: true,
        ..Default::default()
    };
    let report = execute(&topics, &plan, options, &mut NoProgress).unwrap();

    assert!(!report.applied);
    assert_eq!(backend.calls(), vec!["describe_topics"]);
    assert_eq!(backend.topics(), vec![Topic::new("t3", 1, 1)]);
}

#[test]
fn test_apply_reaches_desired_state() {
    let definitions = Definitions::parse_str(DEFINITIONS).unwrap();
    let backend = MemoryBackend::new().with_topics([Topic::new("t3", 1, 1)]);
    let topics = TopicStore::new(&backend);

    let plan = plan_against(&topics, definitions.topics()).unwrap();
    let report = execute(&topics, &plan, ExecuteOptions::default(), &mut NoProgress).unwrap();

    assert!(report.is_success());
    assert_eq!(report.phases, vec![Phase::Add, Phase::Delete]);
    assert_eq!(names(&backend.topics()), vec!["t1", "t2"]);

    let replan = plan_against(&topics, definitions.topics()).unwrap();
    assert!(!replan.has_changes());
}

#[test]
fn test_changed_topic_needs_delete_first() {
    let definitions = Definitions::parse_str(DEFINITIONS).unwrap();

    // Add first: the new t2 collides with the old one, which is then deleted
    let backend =
        MemoryBackend::new().with_topics([Topic::new("t1", 3, 2), Topic::new("t2", 4, 1)]);
    let topics = TopicStore::new(&backend);
    let plan = plan_against(&topics, definitions.topics()).unwrap();
    let report = execute(&topics, &plan, ExecuteOptions::default(), &mut NoProgress).unwrap();

    let failed: Vec<_> = report.additions.failed().collect();
    assert_eq!(failed.len(), 1);
    assert!(matches!(
        failed[0].outcome,
        Outcome::Failed {
            kind: FailureKind::AlreadyExists,
            ..
        }
    ));
    assert_eq!(report.deletions.succeeded().count(), 1);
    assert_eq!(names(&backend.topics()), vec!["t1"]);

    // Delete first: the old t2 is gone before the new one is created
    let backend =
        MemoryBackend::new().with_topics([Topic::new("t1", 3, 2), Topic::new("t2", 4, 1)]);
    let topics = TopicStore::new(&backend);
    let plan = plan_against(&topics, definitions.topics()).unwrap();
    let options = ExecuteOptions {
        order: ApplyOrder::DeleteFirst,
        ..Default::default()
    };
    let report = execute(&topics, &plan, options, &mut NoProgress).unwrap();

    assert!(report.is_success());
    assert_eq!(
        backend.topics(),
        vec![Topic::new("t1", 3, 2), Topic::new("t2", 1, 1)]
    );
}

#[test]
fn test_unreachable_broker_aborts_before_planning() {
    let definitions = Definitions::parse_str(DEFINITIONS).unwrap();
    let backend = MemoryBackend::new().unreachable();

    let err = plan_against(&TopicStore::new(&backend), definitions.topics()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Connectivity);
}

#[test]
fn test_connection_lost_mid_apply_reports_what_landed() {
    let definitions = Definitions::parse_str(DEFINITIONS).unwrap();
    // Answers the listing and the first create only
    let backend = MemoryBackend::new()
        .with_topics([Topic::new("t3", 1, 1)])
        .unreachable_after(2);
    let topics = TopicStore::new(&backend);

    let plan = plan_against(&topics, definitions.topics()).unwrap();
    let report = execute(&topics, &plan, ExecuteOptions::default(), &mut NoProgress).unwrap();

    assert_eq!(report.phases, vec![Phase::Add]);
    assert_eq!(report.additions.results[0].item.name, "t1");
    assert_eq!(report.additions.results[0].outcome, Outcome::Succeeded);
    assert!(report.additions.results[1].outcome.is_interrupted());
    assert!(report.is_interrupted());
    assert!(report.deletions.is_empty());
    assert_eq!(names(&backend.topics()), vec!["t3", "t1"]);
}

// ============================================================================
// ACLs
// ============================================================================

#[test]
fn test_acl_apply_with_defaults() {
    let definitions = Definitions::parse_str(DEFINITIONS).unwrap();
    let stale = AclEntry::new("User:Alice");
    let backend = MemoryBackend::new().with_acls([stale]);
    let acls = AclStore::new(&backend);

    let plan = plan_against(&acls, definitions.acls()).unwrap();
    assert_eq!(plan.to_add.len(), 1);
    assert_eq!(plan.to_delete.len(), 1);

    execute(&acls, &plan, ExecuteOptions::default(), &mut NoProgress).unwrap();

    let live = backend.acls();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].principal, "User:Bob");
    assert_eq!(live[0].resource_type, ResourceType::Group);
    assert_eq!(live[0].operation, AclOperation::Read);
    assert_eq!(live[0].host, "*");
}

#[test]
fn test_acl_listing_without_authorizer_is_fatal() {
    let definitions = Definitions::parse_str(DEFINITIONS).unwrap();
    let backend = MemoryBackend::new().with_security_disabled();

    let err = plan_against(&AclStore::new(&backend), definitions.acls()).unwrap_err();

    assert!(matches!(err, Error::Protocol { .. }), "{err}");
    assert_eq!(backend.calls(), vec!["describe_acls"]);
}

// ============================================================================
// Definitions
// ============================================================================

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(DEFINITIONS.as_bytes()).unwrap();

    let definitions = Definitions::load(file.path()).unwrap();
    assert_eq!(definitions.topics().len(), 2);
    assert_eq!(definitions.acls().len(), 1);
}

#[test]
fn test_unsupported_version_touches_nothing() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"schema_version: 2\n---\nname\nt1\n").unwrap();
    let backend = MemoryBackend::new();

    let err = plan_topics(file.path(), &backend).unwrap_err();

    assert!(matches!(err, Error::UnsupportedSchemaVersion(2)));
    assert_eq!(err.category(), ErrorCategory::Parse);
    assert!(backend.calls().is_empty());

    // The same path does reach the broker for a supported file
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(DEFINITIONS.as_bytes()).unwrap();
    plan_topics(file.path(), &backend).unwrap();
    assert_eq!(backend.calls(), vec!["describe_topics"]);
}
