#[cfg(not(feature = "std"))]
use alloc::collections::{BTreeMap, BTreeSet};
#[cfg(feature = "std")]
use std::collections::{HashMap, HashSet};

#[cfg(feature = "std")]
pub(crate) type KeyMap<K, V> = HashMap<K, V>;
#[cfg(not(feature = "std"))]
pub(crate) type KeyMap<K, V> = BTreeMap<K, V>;

#[cfg(feature = "std")]
pub(crate) type KeySet<K> = HashSet<K>;
#[cfg(not(feature = "std"))]
pub(crate) type KeySet<K> = BTreeSet<K>;

/// Identity of a row, tree node or relation member.
///
/// With `std` this is `Hash + Eq`; without it the crate falls back to ordered
/// collections and requires `Ord`.
#[cfg(feature = "std")]
pub trait Identity: core::hash::Hash + Eq + Clone {}
#[cfg(feature = "std")]
impl<T: core::hash::Hash + Eq + Clone> Identity for T {}

#[cfg(not(feature = "std"))]
pub trait Identity: Ord + Clone {}
#[cfg(not(feature = "std"))]
impl<T: Ord + Clone> Identity for T {}
