//! Immutable finder chain and its terminal operations.
//!
//! # Invariants
//! - Every mutator returns a new `Finder`; the receiver is never changed.
//! - Terminal operations never cache: calling one twice executes twice.
//! - Rows are mapped in backend order; nothing is dropped or reordered.

use super::query::{DomainMapper, FinderKind, FinderQuery, QueryBackend};
use super::spec::{FilterSet, SortCriterion, SortDirection, SortSpec};
use super::stream::FinderStream;
use crate::repo::{RepoError, RepoResult};
use log::{error, info, trace};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Instant;

/// Rows fetched per backend round-trip by [`Finder::stream`].
pub const STREAM_PAGE_SIZE: u32 = 100;

pub(crate) type SharedBackend<K> = Arc<dyn QueryBackend<K>>;
pub(crate) type SharedMapper<K> =
    Arc<dyn DomainMapper<<K as FinderKind>::Raw, Model = <K as FinderKind>::Model>>;

/// Composable, immutable query over one entity kind.
pub struct Finder<K: FinderKind> {
    query: FinderQuery<K>,
    backend: SharedBackend<K>,
    mapper: SharedMapper<K>,
}

impl<K: FinderKind> Finder<K> {
    /// Creates an unconstrained finder over `backend`.
    pub fn new(backend: SharedBackend<K>, mapper: SharedMapper<K>) -> Self {
        Self {
            query: FinderQuery::default(),
            backend,
            mapper,
        }
    }

    /// The accumulated sort, filter and pagination state.
    pub fn query(&self) -> &FinderQuery<K> {
        &self.query
    }

    fn cloned_with(&self, query: FinderQuery<K>) -> Self {
        Self {
            query,
            backend: Arc::clone(&self.backend),
            mapper: Arc::clone(&self.mapper),
        }
    }

    /// Appends a sort key; earlier keys take precedence.
    pub fn sort(&self, criterion: K::Sort, direction: SortDirection) -> Self {
        let mut query = self.query.clone();
        query.sorts.push(SortSpec {
            criterion,
            direction,
        });
        self.cloned_with(query)
    }

    /// Appends a sort key given by its public name.
    ///
    /// # Errors
    /// - `UnknownSortKey` when this kind does not declare `name`.
    pub fn sort_by_name(&self, name: &str, direction: SortDirection) -> RepoResult<Self> {
        let criterion = K::Sort::from_name(name).ok_or_else(|| RepoError::UnknownSortKey {
            kind: K::NAME,
            key: name.to_string(),
        })?;
        Ok(self.sort(criterion, direction))
    }

    /// Sets (`Some`) or clears (`None`) one named filter.
    ///
    /// Setting the same name twice keeps only the latest value.
    ///
    /// # Errors
    /// - `UnknownFilterKey` when this kind does not declare `name`.
    pub fn with_filter(&self, name: &str, value: Option<&str>) -> RepoResult<Self> {
        let unknown = || RepoError::UnknownFilterKey {
            kind: K::NAME,
            key: name.to_string(),
        };
        if !K::Filters::NAMES.iter().any(|declared| *declared == name) {
            return Err(unknown());
        }
        let mut query = self.query.clone();
        if !query.filters.set(name, value.map(str::to_string)) {
            return Err(unknown());
        }
        Ok(self.cloned_with(query))
    }

    /// Filter names accepted by [`Finder::with_filter`], in declaration order.
    pub fn filter_names() -> &'static [&'static str] {
        K::Filters::NAMES
    }

    pub(crate) fn with_filters(&self, update: impl FnOnce(&mut K::Filters)) -> Self {
        let mut query = self.query.clone();
        update(&mut query.filters);
        self.cloned_with(query)
    }

    /// Caps the number of results; `None` removes the cap.
    pub fn limit(&self, max: impl Into<Option<u32>>) -> Self {
        let mut query = self.query.clone();
        query.window.limit = max.into();
        self.cloned_with(query)
    }

    /// Skips the first `first` results.
    pub fn offset(&self, first: u32) -> Self {
        let mut query = self.query.clone();
        query.window.offset = first;
        self.cloned_with(query)
    }

    /// Asks the backend to deliver the one-to-many relation with each row.
    ///
    /// Mapped values then carry an already computed relation and never hit
    /// the relationship loader.
    pub fn prefetch_relations(&self, enabled: bool) -> Self {
        let mut query = self.query.clone();
        query.prefetch = enabled;
        self.cloned_with(query)
    }

    /// Executes the query and maps every row.
    ///
    /// # Errors
    /// - Any backend failure aborts the whole call; no partial results.
    pub fn results(&self) -> RepoResult<Vec<K::Model>> {
        let started_at = Instant::now();
        let rows = self.backend.execute(&self.query).map_err(|err| {
            error!(
                "event=finder_results module=finder status=error kind={} duration_ms={} error={err}",
                K::NAME,
                started_at.elapsed().as_millis()
            );
            err
        })?;

        let models = rows
            .into_iter()
            .map(|raw| self.mapper.to_model(raw))
            .collect::<Vec<_>>();
        info!(
            "event=finder_results module=finder status=ok kind={} count={} duration_ms={}",
            K::NAME,
            models.len(),
            started_at.elapsed().as_millis()
        );
        trace!(
            "event=finder_results module=finder kind={} query={:?}",
            K::NAME,
            self.query
        );
        Ok(models)
    }

    /// Counts the matching rows, ignoring pagination.
    pub fn count(&self) -> RepoResult<u64> {
        let started_at = Instant::now();
        let count = self.backend.count(&self.query).map_err(|err| {
            error!(
                "event=finder_count module=finder status=error kind={} error={err}",
                K::NAME
            );
            err
        })?;
        info!(
            "event=finder_count module=finder status=ok kind={} count={count} duration_ms={}",
            K::NAME,
            started_at.elapsed().as_millis()
        );
        Ok(count)
    }

    /// Returns a single-pass, pull-based sequence over the results.
    pub fn stream(&self) -> FinderStream<K> {
        self.stream_with_page_size(STREAM_PAGE_SIZE)
    }

    /// Like [`Finder::stream`], fetching `page_size` rows per round-trip.
    pub fn stream_with_page_size(&self, page_size: u32) -> FinderStream<K> {
        FinderStream::new(
            self.query.clone(),
            Arc::clone(&self.backend),
            Arc::clone(&self.mapper),
            page_size,
        )
    }
}

impl<K: FinderKind> Clone for Finder<K> {
    fn clone(&self) -> Self {
        self.cloned_with(self.query.clone())
    }
}

/// Finders are equal when their accumulated query state is equal.
impl<K: FinderKind> PartialEq for Finder<K> {
    fn eq(&self, other: &Self) -> bool {
        self.query == other.query
    }
}

impl<K: FinderKind> Debug for Finder<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Finder")
            .field("kind", &K::NAME)
            .field("sorts", &self.query.sorts)
            .field("filters", &self.query.filters.active())
            .field("window", &self.query.window)
            .field("prefetch", &self.query.prefetch)
            .finish()
    }
}
