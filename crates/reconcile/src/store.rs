//! Store trait - the contract through which live state is observed and mutated
//!
//! One store exists per resource kind. The engine only ever talks to this
//! trait, so the transport behind it (admin tools, a wire client, an
//! in-memory map in tests) is interchangeable.

use crate::collection::Collection;
use crate::types::BatchResult;

/// Observe and mutate the live state of one resource kind.
///
/// `Err` is reserved for failures that make the store itself untrustworthy
/// (unreachable broker, unexpected response shape). A single item that
/// cannot be created or deleted is reported inside the [`BatchResult`]
/// instead, and the rest of the batch still runs. Stores never retry.
pub trait Store<T> {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch the complete current state
    fn list(&self) -> Result<Collection<T>, Self::Error>;

    /// Request creation of each item
    fn add(&self, items: &[T]) -> Result<BatchResult<T>, Self::Error>;

    /// Request removal of each item
    fn delete(&self, items: &[T]) -> Result<BatchResult<T>, Self::Error>;
}
