//! Reconciliation plan - what to add, what to delete, and how to line up the diff

use crate::collection::Collection;
use crate::resource::Resource;

/// The outcome of comparing a desired collection against a current one.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan<T> {
    /// Desired values missing from the current state (`desired - current`)
    pub to_add: Collection<T>,
    /// Current values not declared anywhere (`current - desired`)
    pub to_delete: Collection<T>,
    /// A permutation of the current collection lined up against desired
    pub aligned_current: Collection<T>,
}

impl<T: Resource> Plan<T> {
    /// Compute the plan for one resource kind.
    ///
    /// Neither input is modified.
    pub fn compute(desired: &Collection<T>, current: &Collection<T>) -> Self {
        let to_add = desired.subtract(current);
        let to_delete = current.subtract(desired);
        let aligned_current = align(desired, current);

        log::debug!(
            "{} plan: {} to add, {} to delete ({} desired, {} current)",
            T::KIND,
            to_add.len(),
            to_delete.len(),
            desired.len(),
            current.len()
        );

        Self {
            to_add,
            to_delete,
            aligned_current,
        }
    }

    /// Whether anything would be added or deleted
    pub fn has_changes(&self) -> bool {
        !self.to_add.is_empty() || !self.to_delete.is_empty()
    }

    /// Total number of mutations the plan asks for
    pub fn total_changes(&self) -> usize {
        self.to_add.len() + self.to_delete.len()
    }
}

/// Reorder `current` so unchanged values sit where `desired` has them.
///
/// Walks `desired` in order and, for each value, moves the first equal value
/// still in the pool of `current` into the result. Whatever remains in the
/// pool is appended afterwards, ordered by [`Resource::order_leftovers`].
/// The result is always a permutation of `current`.
pub fn align<T: Resource>(desired: &Collection<T>, current: &Collection<T>) -> Collection<T> {
    let mut pool: Vec<T> = current.to_vec();
    let mut aligned = Vec::with_capacity(pool.len());

    for wanted in desired {
        if let Some(pos) = pool.iter().position(|candidate| candidate == wanted) {
            aligned.push(pool.remove(pos));
        }
    }

    T::order_leftovers(&mut pool);
    aligned.extend(pool);

    Collection::from(aligned)
}
