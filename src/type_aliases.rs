// SPDX-License-Identifier: MPL-2.0

//! Publicly exported type aliases.

use std::hash::BuildHasherDefault;

use rustc_hash::FxHasher;

use crate::DependencyProvider;

/// Map implementation used by the library.
pub type Map<K, V> = rustc_hash::FxHashMap<K, V>;

/// Set implementation used by the library.
pub type Set<V> = rustc_hash::FxHashSet<V>;

/// The ranges that each dependency of a package version must lie in.
///
/// Insertion-ordered so that a provider hands dependencies back in a stable
/// order, which keeps resolution deterministic (see
/// [resolve](crate::resolve)).
pub type DependencyConstraints<P, VS> = indexmap::IndexMap<P, VS, BuildHasherDefault<FxHasher>>;

/// Concrete dependencies picked by the library during [resolve](crate::resolve)
/// from [DependencyConstraints].
pub type SelectedDependencies<DP> =
    Map<<DP as DependencyProvider>::P, <DP as DependencyProvider>::V>;
