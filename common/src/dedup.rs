//! Order-preserving duplicate removal.

use std::collections::HashSet;
use std::hash::Hash;

/// Remove duplicates from `items`, keeping the first occurrence of each.
///
/// # Examples
///
/// ```
/// use texpack_common::dedup::rm_dup;
///
/// assert_eq!(rm_dup(["b", "a", "b", "c", "a"]), vec!["b", "a", "c"]);
/// ```
pub fn rm_dup<T, I>(items: I) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    T: Eq + Hash + Clone,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
