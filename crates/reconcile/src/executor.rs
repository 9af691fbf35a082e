//! Apply driver - runs a plan against a store in check or apply mode

use crate::collection::Collection;
use crate::plan::Plan;
use crate::resource::Resource;
use crate::store::Store;
use crate::types::{ApplyOrder, BatchResult, ExecuteOptions, ExecuteSummary, Phase};

/// Progress callback for execution operations
///
/// Implement this trait to receive progress updates during execution.
pub trait ProgressCallback<T> {
    /// Called before a mutation phase runs
    fn on_phase_start(&mut self, phase: Phase, count: usize);

    /// Called with the per-item results once a phase finished
    fn on_phase_complete(&mut self, phase: Phase, result: &BatchResult<T>);
}

/// No-op progress callback
pub struct NoProgress;

impl<T> ProgressCallback<T> for NoProgress {
    fn on_phase_start(&mut self, _phase: Phase, _count: usize) {}
    fn on_phase_complete(&mut self, _phase: Phase, _result: &BatchResult<T>) {}
}

/// What an execution run did
#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteReport<T> {
    /// False in check mode, where no mutation was attempted
    pub applied: bool,
    /// Results of the add phase
    pub additions: BatchResult<T>,
    /// Results of the delete phase
    pub deletions: BatchResult<T>,
    /// Phases in the order they ran
    pub phases: Vec<Phase>,
}

impl<T> ExecuteReport<T> {
    fn checked() -> Self {
        Self {
            applied: false,
            additions: BatchResult::new(),
            deletions: BatchResult::new(),
            phases: Vec::new(),
        }
    }

    /// Counts of successful and failed mutations
    pub fn summary(&self) -> ExecuteSummary {
        ExecuteSummary {
            added: self.additions.succeeded().count(),
            deleted: self.deletions.succeeded().count(),
            failed: self.additions.failed().count() + self.deletions.failed().count(),
        }
    }

    /// Check if every attempted mutation went through
    pub fn is_success(&self) -> bool {
        self.additions.is_success() && self.deletions.is_success()
    }

    /// Check if a phase broke off partway, which also skips the next phase
    pub fn is_interrupted(&self) -> bool {
        self.additions.is_interrupted() || self.deletions.is_interrupted()
    }
}

/// List the current state from `store` and plan it against `desired`.
pub fn plan_against<T, S>(store: &S, desired: &Collection<T>) -> Result<Plan<T>, S::Error>
where
    T: Resource,
    S: Store<T>,
{
    let current = store.list()?;
    Ok(Plan::compute(desired, &current))
}

/// Execute a plan with the given options and progress callback
///
/// In check mode the store's mutating operations are never called. In apply
/// mode both phases run in the requested order; a per-item failure in the
/// first phase does not stop the second. There is no rollback: an `Err`
/// from the store aborts the run and whatever already went through stays.
/// A phase whose batch was interrupted is reported and then ends the run
/// the same way.
///
/// An empty phase still reports start and completion but never reaches the
/// store.
pub fn execute<T, S, P>(
    store: &S,
    plan: &Plan<T>,
    opts: ExecuteOptions,
    progress: &mut P,
) -> Result<ExecuteReport<T>, S::Error>
where
    T: Resource,
    S: Store<T>,
    P: ProgressCallback<T>,
{
    if opts.check {
        log::info!("check mode: {} {} change(s) not applied", plan.total_changes(), T::KIND);
        return Ok(ExecuteReport::checked());
    }

    let order = match opts.order {
        ApplyOrder::AddFirst => [Phase::Add, Phase::Delete],
        ApplyOrder::DeleteFirst => [Phase::Delete, Phase::Add],
    };

    let mut report = ExecuteReport {
        applied: true,
        ..ExecuteReport::checked()
    };

    for phase in order {
        let items = match phase {
            Phase::Add => &plan.to_add,
            Phase::Delete => &plan.to_delete,
        };

        progress.on_phase_start(phase, items.len());
        let result = run_phase(store, phase, items)?;
        progress.on_phase_complete(phase, &result);

        let interrupted = result.is_interrupted();
        match phase {
            Phase::Add => report.additions = result,
            Phase::Delete => report.deletions = result,
        }
        report.phases.push(phase);

        if interrupted {
            log::warn!("{} {} interrupted, not running the rest", T::KIND, phase);
            break;
        }
    }

    Ok(report)
}

fn run_phase<T, S>(store: &S, phase: Phase, items: &[T]) -> Result<BatchResult<T>, S::Error>
where
    T: Resource,
    S: Store<T>,
{
    if items.is_empty() {
        log::debug!("no {} {} to run", T::KIND, phase);
        return Ok(BatchResult::new());
    }

    log::info!("running {} of {} {}(s)", phase, items.len(), T::KIND);
    let result = match phase {
        Phase::Add => store.add(items)?,
        Phase::Delete => store.delete(items)?,
    };

    for failed in result.failed() {
        log::warn!("{} {} failed: {:?}", T::KIND, failed.item.id(), failed.outcome);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FailureKind, Outcome};
    use std::cell::RefCell;
    use std::fmt;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Item(&'static str);

    impl Resource for Item {
        const KIND: &'static str = "item";

        fn id(&self) -> String {
            self.0.to_string()
        }
    }

    #[derive(Debug)]
    struct Unreachable;

    impl fmt::Display for Unreachable {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("store unreachable")
        }
    }

    impl std::error::Error for Unreachable {}

    /// Store that records calls and rejects configured names on add
    #[derive(Default)]
    struct RecordingStore {
        current: Vec<Item>,
        existing: Vec<&'static str>,
        fail_add: bool,
        interrupt_at: Option<&'static str>,
        calls: RefCell<Vec<String>>,
    }

    impl Store<Item> for RecordingStore {
        type Error = Unreachable;

        fn list(&self) -> Result<Collection<Item>, Unreachable> {
            self.calls.borrow_mut().push("list".into());
            Ok(Collection::from(self.current.clone()))
        }

        fn add(&self, items: &[Item]) -> Result<BatchResult<Item>, Unreachable> {
            self.calls.borrow_mut().push(format!("add:{}", items.len()));
            if self.fail_add {
                return Err(Unreachable);
            }
            let mut result = BatchResult::new();
            let mut interrupted = false;
            for item in items {
                interrupted |= self.interrupt_at == Some(item.0);
                if interrupted {
                    result.record(
                        item.clone(),
                        Outcome::failed(FailureKind::Interrupted, "connection lost"),
                    );
                } else if self.existing.contains(&item.0) {
                    result.record(
                        item.clone(),
                        Outcome::failed(FailureKind::AlreadyExists, "already exists"),
                    );
                } else {
                    result.record(item.clone(), Outcome::Succeeded);
                }
            }
            Ok(result)
        }

        fn delete(&self, items: &[Item]) -> Result<BatchResult<Item>, Unreachable> {
            self.calls.borrow_mut().push(format!("delete:{}", items.len()));
            let mut result = BatchResult::new();
            for item in items {
                result.record(item.clone(), Outcome::Succeeded);
            }
            Ok(result)
        }
    }

    struct RecordingProgress(Vec<(Phase, usize)>);

    impl ProgressCallback<Item> for RecordingProgress {
        fn on_phase_start(&mut self, phase: Phase, count: usize) {
            self.0.push((phase, count));
        }

        fn on_phase_complete(&mut self, _phase: Phase, _result: &BatchResult<Item>) {}
    }

    fn plan(add: &[&'static str], delete: &[&'static str]) -> Plan<Item> {
        Plan {
            to_add: add.iter().map(|&n| Item(n)).collect(),
            to_delete: delete.iter().map(|&n| Item(n)).collect(),
            aligned_current: Collection::new(),
        }
    }

    fn apply(order: ApplyOrder) -> ExecuteOptions {
        ExecuteOptions {
            check: false,
            order,
        }
    }

    #[test]
    fn test_check_mode_never_mutates() {
        let store = RecordingStore::default();
        let opts = ExecuteOptions {
            check: true,
            order: ApplyOrder::DeleteFirst,
        };

        let report = execute(&store, &plan(&["a"], &["b"]), opts, &mut NoProgress).unwrap();

        assert!(!report.applied);
        assert!(report.phases.is_empty());
        assert!(store.calls.borrow().is_empty());
    }

    #[test]
    fn test_add_runs_before_delete_by_default() {
        let store = RecordingStore::default();

        let report = execute(
            &store,
            &plan(&["a"], &["b"]),
            apply(ApplyOrder::AddFirst),
            &mut NoProgress,
        )
        .unwrap();

        assert_eq!(*store.calls.borrow(), vec!["add:1", "delete:1"]);
        assert_eq!(report.phases, vec![Phase::Add, Phase::Delete]);
    }

    #[test]
    fn test_delete_first_runs_delete_before_add() {
        let store = RecordingStore::default();

        let report = execute(
            &store,
            &plan(&["a"], &["b"]),
            apply(ApplyOrder::DeleteFirst),
            &mut NoProgress,
        )
        .unwrap();

        assert_eq!(*store.calls.borrow(), vec!["delete:1", "add:1"]);
        assert_eq!(report.phases, vec![Phase::Delete, Phase::Add]);
    }

    #[test]
    fn test_item_failure_does_not_stop_delete() {
        let store = RecordingStore {
            existing: vec!["dup"],
            ..Default::default()
        };

        let report = execute(
            &store,
            &plan(&["fresh", "dup"], &["old"]),
            apply(ApplyOrder::AddFirst),
            &mut NoProgress,
        )
        .unwrap();

        assert_eq!(*store.calls.borrow(), vec!["add:2", "delete:1"]);
        assert_eq!(report.additions.len(), 2);
        assert_eq!(report.additions.results[0].outcome, Outcome::Succeeded);
        assert!(matches!(
            report.additions.results[1].outcome,
            Outcome::Failed {
                kind: FailureKind::AlreadyExists,
                ..
            }
        ));
        assert_eq!(report.deletions.succeeded().count(), 1);

        let summary = report.summary();
        assert_eq!(summary.added, 1);
        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.failed, 1);
        assert!(!report.is_success());
    }

    #[test]
    fn test_store_error_aborts_before_second_phase() {
        let store = RecordingStore {
            fail_add: true,
            ..Default::default()
        };

        let result = execute(
            &store,
            &plan(&["a"], &["b"]),
            apply(ApplyOrder::AddFirst),
            &mut NoProgress,
        );

        assert!(result.is_err());
        assert_eq!(*store.calls.borrow(), vec!["add:1"]);
    }

    #[test]
    fn test_interrupted_phase_keeps_results_and_stops() {
        let store = RecordingStore {
            interrupt_at: Some("b"),
            ..Default::default()
        };

        let report = execute(
            &store,
            &plan(&["a", "b", "c"], &["old"]),
            apply(ApplyOrder::AddFirst),
            &mut NoProgress,
        )
        .unwrap();

        assert_eq!(*store.calls.borrow(), vec!["add:3"]);
        assert_eq!(report.phases, vec![Phase::Add]);
        assert_eq!(report.additions.results[0].outcome, Outcome::Succeeded);
        assert!(report.is_interrupted());
        assert_eq!(report.summary().added, 1);
        assert_eq!(report.summary().failed, 2);
    }

    #[test]
    fn test_empty_phase_skips_store_but_reports_progress() {
        let store = RecordingStore::default();
        let mut progress = RecordingProgress(Vec::new());

        execute(
            &store,
            &plan(&[], &["b"]),
            apply(ApplyOrder::AddFirst),
            &mut progress,
        )
        .unwrap();

        assert_eq!(*store.calls.borrow(), vec!["delete:1"]);
        assert_eq!(progress.0, vec![(Phase::Add, 0), (Phase::Delete, 1)]);
    }

    #[test]
    fn test_plan_against_lists_once() {
        let store = RecordingStore {
            current: vec![Item("b"), Item("c")],
            ..Default::default()
        };
        let desired: Collection<Item> = vec![Item("a"), Item("b")].into();

        let plan = plan_against(&store, &desired).unwrap();

        assert_eq!(*store.calls.borrow(), vec!["list"]);
        assert_eq!(plan.to_add.to_vec(), vec![Item("a")]);
        assert_eq!(plan.to_delete.to_vec(), vec![Item("c")]);
    }
}
