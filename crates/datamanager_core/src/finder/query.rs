//! Finder kinds, accumulated query state and the collaborator seams.

use super::spec::{FilterSet, SortCriterion, SortSpec, Window};
use crate::repo::RepoResult;
use std::fmt::Debug;

/// Describes one queryable entity kind.
pub trait FinderKind: Copy + Eq + Debug + Send + Sync + 'static {
    /// Name used in errors and log events.
    const NAME: &'static str;
    type Sort: SortCriterion;
    type Filters: FilterSet;
    /// Raw persisted record produced by the backend.
    type Raw;
    /// Domain value handed to callers.
    type Model;
}

/// Everything a finder has accumulated before execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinderQuery<K: FinderKind> {
    /// First entry is the primary key.
    pub sorts: Vec<SortSpec<K::Sort>>,
    pub filters: K::Filters,
    pub window: Window,
    /// Ask the backend to load the one-to-many relation with each row.
    pub prefetch: bool,
}

impl<K: FinderKind> Default for FinderQuery<K> {
    fn default() -> Self {
        Self {
            sorts: Vec::new(),
            filters: K::Filters::default(),
            window: Window::default(),
            prefetch: false,
        }
    }
}

/// Compiles and runs finder queries against a store.
pub trait QueryBackend<K: FinderKind>: Send + Sync {
    /// Returns the rows matching every filter, ordered and paginated.
    fn execute(&self, query: &FinderQuery<K>) -> RepoResult<Vec<K::Raw>>;

    /// Counts the rows matching every filter, ignoring pagination.
    fn count(&self, query: &FinderQuery<K>) -> RepoResult<u64>;
}

/// Converts a raw persisted record into a domain value.
pub trait DomainMapper<R>: Send + Sync {
    type Model;

    fn to_model(&self, raw: R) -> Self::Model;
}
