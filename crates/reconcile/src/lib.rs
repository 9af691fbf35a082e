//! # Reconcile
//!
//! Value-based reconciliation of declared state against live state.
//!
//! ## Core Concepts
//!
//! - **Resource**: a plain value; two resources are the same exactly when they compare equal
//! - **Collection**: an ordered sequence of resources with value subtraction
//! - **Plan**: the add-set, the delete-set and the current state lined up against the desired one
//! - **Store**: the contract through which live state is listed, created and removed
//! - **Executor**: runs a plan in check or apply mode, add-first or delete-first
//!
//! ## Example
//!
//! ```ignore
//! use reconcile::{execute, plan_against, ExecuteOptions, NoProgress};
//!
//! let plan = plan_against(&store, &desired)?;
//! println!("{} to add, {} to delete", plan.to_add.len(), plan.to_delete.len());
//!
//! let report = execute(&store, &plan, ExecuteOptions::default(), &mut NoProgress)?;
//! for failed in report.additions.failed() {
//!     eprintln!("{:?}", failed);
//! }
//! ```
//!
//! Per-item failures are data, not errors: they come back inside
//! [`BatchResult`] and never abort the rest of a run. Only a store that
//! cannot be trusted any more returns `Err`.

pub mod collection;
pub mod executor;
pub mod plan;
pub mod resource;
pub mod store;
pub mod types;

// Re-export main types at crate root
pub use collection::Collection;
pub use executor::{ExecuteReport, NoProgress, ProgressCallback, execute, plan_against};
pub use plan::{Plan, align};
pub use resource::Resource;
pub use store::Store;
pub use types::{
    ApplyOrder, BatchResult, ExecuteOptions, ExecuteSummary, FailureKind, ItemResult, Outcome,
    Phase,
};
