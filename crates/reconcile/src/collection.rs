//! Ordered collections of resource values

use crate::resource::Resource;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, Sub};

/// An ordered sequence of resource values.
///
/// Insertion order is preserved and is what the diff display shows, but
/// membership questions (`contains`, [`Collection::subtract`]) are answered by
/// value equality only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Collection<T> {
    /// Create an empty collection
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append a value, keeping insertion order
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Consume the collection and return the underlying values
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: Resource> Collection<T> {
    /// Every element of `self` whose value does not appear anywhere in `other`.
    ///
    /// Each element is tested on its own, so duplicates in `self` are all kept
    /// or all dropped together; this is not a multiset difference. Order
    /// follows `self`.
    pub fn subtract(&self, other: &Self) -> Self {
        self.items
            .iter()
            .filter(|item| !other.items.contains(*item))
            .cloned()
            .collect()
    }

    /// Same multiset of values, ignoring order
    pub fn same_values(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mut pool: Vec<&T> = other.items.iter().collect();
        for item in &self.items {
            match pool.iter().position(|candidate| *candidate == item) {
                Some(pos) => {
                    pool.remove(pos);
                }
                None => return false,
            }
        }
        true
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for Collection<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> From<Vec<T>> for Collection<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T> FromIterator<T> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> Extend<T> for Collection<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Resource> Sub for &Collection<T> {
    type Output = Collection<T>;

    fn sub(self, other: Self) -> Collection<T> {
        self.subtract(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Item(&'static str, u32);

    impl Resource for Item {
        const KIND: &'static str = "item";

        fn id(&self) -> String {
            self.0.to_string()
        }
    }

    fn items(values: &[(&'static str, u32)]) -> Collection<Item> {
        values.iter().map(|&(n, v)| Item(n, v)).collect()
    }

    #[test]
    fn test_subtract_keeps_order_of_left() {
        let a = items(&[("c", 1), ("a", 1), ("b", 1)]);
        let b = items(&[("a", 1)]);
        assert_eq!(a.subtract(&b), items(&[("c", 1), ("b", 1)]));
    }

    #[test]
    fn test_subtract_compares_every_field() {
        let a = items(&[("a", 1)]);
        let b = items(&[("a", 2)]);
        assert_eq!(a.subtract(&b), a);
    }

    #[test]
    fn test_subtract_is_not_multiset_difference() {
        let a = items(&[("a", 1), ("a", 1), ("b", 1)]);
        let b = items(&[("a", 1)]);
        // both copies of "a" go, even though b holds only one
        assert_eq!(a.subtract(&b), items(&[("b", 1)]));
    }

    #[test]
    fn test_sub_operator() {
        let a = items(&[("a", 1), ("b", 1)]);
        let b = items(&[("b", 1)]);
        assert_eq!(&a - &b, items(&[("a", 1)]));
    }

    #[test]
    fn test_same_values_ignores_order() {
        let a = items(&[("a", 1), ("b", 1), ("a", 1)]);
        let b = items(&[("b", 1), ("a", 1), ("a", 1)]);
        assert!(a.same_values(&b));
        assert!(!a.same_values(&items(&[("a", 1), ("b", 1), ("b", 1)])));
    }
}
