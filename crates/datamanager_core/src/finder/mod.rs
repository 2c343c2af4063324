//! Composable finders: immutable query builders with deferred execution.
//!
//! # Responsibility
//! - Accumulate sort, filter and pagination constraints through cloned
//!   builder calls.
//! - Delegate compilation and execution to a [`QueryBackend`] and map raw
//!   rows through a [`DomainMapper`].
//!
//! # Invariants
//! - A finder is never mutated after construction.
//! - Filters combine conjunctively; setting a filter twice keeps the latest.
//! - Foreign sort keys and filter names are rejected at call time.

mod backups;
mod chain;
mod managed_files;
mod query;
mod spec;
mod stream;

pub use backups::{BackupFilters, BackupFinder, BackupSort, Backups};
pub use chain::{Finder, STREAM_PAGE_SIZE};
pub use managed_files::{ManagedFileFilters, ManagedFileFinder, ManagedFileSort, ManagedFiles};
pub use query::{DomainMapper, FinderKind, FinderQuery, QueryBackend};
pub use spec::{FilterSet, FilterSpec, SortCriterion, SortDirection, SortSpec, Window};
pub use stream::FinderStream;
