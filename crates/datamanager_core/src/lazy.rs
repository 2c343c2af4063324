//! Deferred, memoizing value holder for one-to-many relations.
//!
//! # Responsibility
//! - Hold a producer that is run on first access only.
//! - Expose realization state without forcing the producer.
//!
//! # Invariants
//! - A successful producer run happens at most once per instance, also
//!   under concurrent `get()` calls: the first caller runs the producer,
//!   the others block until it finishes and observe its outcome.
//! - A failing producer leaves the value unset; the next `get()` retries.
//! - `Debug`, `PartialEq` and `Serialize` never run the producer.

use once_cell::sync::OnceCell;
use serde::{Serialize, Serializer};
use std::fmt::{Debug, Formatter};

const NOT_COMPUTED: &str = "<not yet computed>";

type Producer<T, E> = Box<dyn Fn() -> Result<T, E> + Send + Sync>;

/// A value computed on first access and cached afterwards.
pub struct LazyValue<T, E = crate::repo::RepoError> {
    state: State<T, E>,
}

enum State<T, E> {
    Ready(T),
    Deferred {
        cell: OnceCell<T>,
        producer: Producer<T, E>,
    },
}

impl<T, E> LazyValue<T, E> {
    /// Creates an unrealized value backed by `producer`.
    pub fn new<F>(producer: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        Self {
            state: State::Deferred {
                cell: OnceCell::new(),
                producer: Box::new(producer),
            },
        }
    }

    /// Creates a value that is already realized.
    ///
    /// Used when the backend delivered the relation together with its owner.
    pub fn ready(value: T) -> Self {
        Self {
            state: State::Ready(value),
        }
    }

    /// Returns the value, running the producer if this is the first access.
    ///
    /// # Errors
    /// - Propagates the producer error unchanged; the value stays unset.
    pub fn get(&self) -> Result<&T, E> {
        match &self.state {
            State::Ready(value) => Ok(value),
            State::Deferred { cell, producer } => cell.get_or_try_init(|| producer()),
        }
    }

    /// Returns the value only if it has already been computed.
    pub fn get_if_initialized(&self) -> Option<&T> {
        match &self.state {
            State::Ready(value) => Some(value),
            State::Deferred { cell, .. } => cell.get(),
        }
    }

    /// Reports whether `get()` has completed successfully at least once.
    pub fn is_initialized(&self) -> bool {
        self.get_if_initialized().is_some()
    }
}

impl<T: Debug, E> Debug for LazyValue<T, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.get_if_initialized() {
            Some(value) => f.debug_tuple("LazyValue").field(value).finish(),
            None => write!(f, "LazyValue({NOT_COMPUTED})"),
        }
    }
}

/// Two lazy values are equal when their realized content is equal; two
/// unrealized values compare equal to each other and unequal to any
/// realized one.
impl<T: PartialEq, E> PartialEq for LazyValue<T, E> {
    fn eq(&self, other: &Self) -> bool {
        self.get_if_initialized() == other.get_if_initialized()
    }
}

impl<T: Eq, E> Eq for LazyValue<T, E> {}

/// Serializes the realized content, or `null` when not yet computed.
impl<T: Serialize, E> Serialize for LazyValue<T, E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.get_if_initialized() {
            Some(value) => serializer.serialize_some(value),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LazyValue;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn counting(counter: &Arc<AtomicUsize>) -> LazyValue<Vec<u32>, String> {
        let counter = Arc::clone(counter);
        LazyValue::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(vec![1, 2, 3])
        })
    }

    #[test]
    fn get_runs_producer_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let value = counting(&calls);

        assert!(!value.is_initialized());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(value.get().unwrap(), &vec![1, 2, 3]);
        assert!(value.is_initialized());
        let first = value.get().unwrap() as *const Vec<u32>;
        let second = value.get().unwrap() as *const Vec<u32>;
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_producer_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let value: LazyValue<u32, String> = LazyValue::new(move || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            if attempt == 0 {
                Err("transient".to_string())
            } else {
                Ok(42)
            }
        });

        assert_eq!(value.get().unwrap_err(), "transient");
        assert!(!value.is_initialized());
        assert_eq!(*value.get().unwrap(), 42);
        assert_eq!(*value.get().unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn ready_value_never_calls_a_producer() {
        let value: LazyValue<&str, String> = LazyValue::ready("resident");
        assert!(value.is_initialized());
        assert_eq!(value.get_if_initialized(), Some(&"resident"));
        assert_eq!(*value.get().unwrap(), "resident");
    }

    #[test]
    fn ready_value_matches_a_realized_deferred_one() {
        let calls = Arc::new(AtomicUsize::new(0));
        let deferred = counting(&calls);
        let ready: LazyValue<Vec<u32>, String> = LazyValue::ready(vec![1, 2, 3]);

        assert!(ready != deferred);
        assert_eq!(format!("{ready:?}"), "LazyValue([1, 2, 3])");
        assert_eq!(serde_json::to_string(&ready).unwrap(), "[1,2,3]");

        deferred.get().unwrap();
        assert!(ready == deferred);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn debug_and_eq_do_not_force() {
        let calls = Arc::new(AtomicUsize::new(0));
        let left = counting(&calls);
        let right = counting(&calls);

        assert_eq!(format!("{left:?}"), "LazyValue(<not yet computed>)");
        assert!(left == right);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        left.get().unwrap();
        assert_eq!(format!("{left:?}"), "LazyValue([1, 2, 3])");
        assert!(left != right);
        right.get().unwrap();
        assert!(left == right);
    }

    #[test]
    fn serializes_null_until_realized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let value = counting(&calls);
        assert_eq!(serde_json::to_string(&value).unwrap(), "null");
        value.get().unwrap();
        assert_eq!(serde_json::to_string(&value).unwrap(), "[1,2,3]");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_first_access_runs_producer_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let value = Arc::new(counting(&calls));
        let barrier = Arc::new(Barrier::new(8));

        let handles = (0..8)
            .map(|_| {
                let value = Arc::clone(&value);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    value.get().unwrap().len()
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 3);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
