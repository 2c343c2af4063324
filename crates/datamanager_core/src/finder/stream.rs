//! Pull-based, page-at-a-time iteration over finder results.

use super::chain::{SharedBackend, SharedMapper};
use super::query::{FinderKind, FinderQuery};
use super::spec::Window;
use crate::repo::RepoResult;
use log::debug;
use std::collections::VecDeque;

/// Single-pass iterator returned by [`super::Finder::stream`].
///
/// Each page is fetched on demand in its own backend call, so dropping the
/// iterator early cancels the remaining work. After the first error the
/// stream ends.
pub struct FinderStream<K: FinderKind> {
    query: FinderQuery<K>,
    backend: SharedBackend<K>,
    mapper: SharedMapper<K>,
    page_size: u32,
    next_offset: u32,
    remaining: Option<u32>,
    buffer: VecDeque<K::Raw>,
    exhausted: bool,
}

impl<K: FinderKind> FinderStream<K> {
    pub(crate) fn new(
        query: FinderQuery<K>,
        backend: SharedBackend<K>,
        mapper: SharedMapper<K>,
        page_size: u32,
    ) -> Self {
        let Window { offset, limit } = query.window;
        Self {
            query,
            backend,
            mapper,
            page_size: page_size.max(1),
            next_offset: offset,
            remaining: limit,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    fn fetch_page(&mut self) -> RepoResult<()> {
        let wanted = match self.remaining {
            Some(0) => {
                self.exhausted = true;
                return Ok(());
            }
            Some(remaining) => remaining.min(self.page_size),
            None => self.page_size,
        };

        let mut page_query = self.query.clone();
        page_query.window = Window {
            offset: self.next_offset,
            limit: Some(wanted),
        };
        let rows = self.backend.execute(&page_query)?;
        let fetched = u32::try_from(rows.len()).unwrap_or(u32::MAX);
        debug!(
            "event=finder_page module=finder status=ok kind={} offset={} count={fetched}",
            K::NAME,
            self.next_offset
        );

        self.next_offset = self.next_offset.saturating_add(fetched);
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(fetched);
        }
        if fetched < wanted {
            self.exhausted = true;
        }
        self.buffer.extend(rows);
        Ok(())
    }
}

impl<K: FinderKind> Iterator for FinderStream<K> {
    type Item = RepoResult<K::Model>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(err) = self.fetch_page() {
                self.exhausted = true;
                return Some(Err(err));
            }
        }
        let raw = self.buffer.pop_front()?;
        Some(Ok(self.mapper.to_model(raw)))
    }
}

#[cfg(test)]
mod tests {
    use crate::finder::chain::tests::{finder_over, WordBackend, WordSort};
    use crate::finder::spec::SortDirection;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn backend() -> Arc<WordBackend> {
        Arc::new(WordBackend::new(&[
            "a", "b", "c", "d", "e", "f", "g", "h", "i", "j",
        ]))
    }

    #[test]
    fn stream_yields_same_sequence_as_results() {
        let backend = backend();
        let finder = finder_over(&backend).sort(WordSort::Text, SortDirection::Descending);

        let streamed = finder
            .stream_with_page_size(3)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(streamed, finder.results().unwrap());
    }

    #[test]
    fn stream_honors_offset_and_limit() {
        let backend = backend();
        let streamed = finder_over(&backend)
            .sort(WordSort::Text, SortDirection::Ascending)
            .offset(2)
            .limit(5)
            .stream_with_page_size(2)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(streamed, vec!["C", "D", "E", "F", "G"]);
    }

    #[test]
    fn stream_fetches_pages_lazily() {
        let backend = backend();
        let mut stream = finder_over(&backend)
            .sort(WordSort::Text, SortDirection::Ascending)
            .stream_with_page_size(4);
        assert_eq!(backend.executions.load(Ordering::SeqCst), 0);

        assert_eq!(stream.next().unwrap().unwrap(), "A");
        assert_eq!(backend.executions.load(Ordering::SeqCst), 1);

        for _ in 0..3 {
            stream.next().unwrap().unwrap();
        }
        assert_eq!(backend.executions.load(Ordering::SeqCst), 1);
        assert_eq!(stream.next().unwrap().unwrap(), "E");
        assert_eq!(backend.executions.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn zero_limit_streams_nothing_without_touching_the_backend() {
        let backend = backend();
        let mut stream = finder_over(&backend).limit(0).stream();
        assert!(stream.next().is_none());
        assert_eq!(backend.executions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stream_ends_after_an_error() {
        let mut failing = WordBackend::new(&["a"]);
        failing.fail = true;
        let mut stream = finder_over(&Arc::new(failing)).stream();
        assert!(stream.next().unwrap().is_err());
        assert!(stream.next().is_none());
    }
}
