//! Sort and filter tokens composed by finders.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Direction of one sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Legal sort keys of one finder kind.
///
/// Each variant knows its public name and the physical column a backend
/// orders by, so no name lookup happens at execution time.
pub trait SortCriterion: Copy + Eq + Debug + Send + Sync + 'static {
    /// Every declared key, in declaration order.
    const ALL: &'static [Self];

    /// Public key name, e.g. `path`.
    fn name(self) -> &'static str;

    /// Physical column the key maps to.
    fn column(self) -> &'static str;

    /// Resolves a public key name; `None` for keys this kind does not declare.
    fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|criterion| criterion.name() == name)
    }
}

/// "Sort by `criterion` in `direction`".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec<C> {
    pub criterion: C,
    pub direction: SortDirection,
}

/// Pagination window. `limit = None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
    pub offset: u32,
    pub limit: Option<u32>,
}

/// One active filter: a declared name bound to a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub name: &'static str,
    pub value: String,
}

/// The toggleable filters of one finder kind.
///
/// Implementations list one optional field per filter; all set filters
/// combine conjunctively.
pub trait FilterSet: Clone + Default + Eq + Debug + Send + Sync + 'static {
    /// Every declared filter name.
    const NAMES: &'static [&'static str];

    /// Sets (`Some`) or clears (`None`) the filter called `name`.
    ///
    /// Returns `false`, leaving `self` untouched, when `name` is not declared.
    fn set(&mut self, name: &str, value: Option<String>) -> bool;

    /// Currently set filters, in declaration order.
    fn active(&self) -> Vec<FilterSpec>;
}
