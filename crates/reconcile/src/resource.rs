//! Resource trait for reconciled values
//!
//! A resource is a plain value: two resources are the same resource exactly
//! when they compare equal. There is no separate identity, so a changed
//! attribute shows up as one deletion plus one addition.

use std::fmt;

/// A value that can be declared, observed and reconciled.
///
/// # Example
///
/// ```
/// use reconcile::Resource;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Queue {
///     name: String,
///     depth: u32,
/// }
///
/// impl Resource for Queue {
///     const KIND: &'static str = "queue";
///
///     fn id(&self) -> String {
///         self.name.clone()
///     }
/// }
/// ```
pub trait Resource: Clone + PartialEq + fmt::Debug {
    /// Resource kind, used in log lines and summaries (e.g. "topic")
    const KIND: &'static str;

    /// Human-readable label for a single value
    ///
    /// Only used for display; equality never looks at it.
    fn id(&self) -> String;

    /// Order the values of `current` that no desired value claimed.
    ///
    /// They are appended after the aligned part of the reordered current
    /// collection. The default keeps their original relative order.
    fn order_leftovers(_leftovers: &mut Vec<Self>) {}
}
