//! Storage seam.
//!
//! A [`CivicStore`] evaluates compiled predicates against the normalized
//! record store and returns records keyed by registered output field name.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::Serialize;

use crate::compiler::Predicate;
use crate::entity::EntityType;

/// A record as returned by a store: output field name to JSON value.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Result ordering. The store always breaks ties by `id` ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ordering {
    pub field: &'static str,
    pub descending: bool,
}

/// One page worth of work for a store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreQuery {
    pub entity: EntityType,
    pub predicate: Predicate,
    /// Output fields to materialize. Stores may return more.
    pub columns: Vec<&'static str>,
    pub order: Ordering,
    pub limit: u32,
    pub offset: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed stored record: {0}")]
    Malformed(String),
}

/// Read access to Open Civic Data records.
#[async_trait]
pub trait CivicStore: Send + Sync {
    /// Records matching `query.predicate`, ordered and sliced.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing store cannot be queried.
    async fn find(&self, query: &StoreQuery) -> Result<Vec<Record>, StoreError>;

    /// The record of `entity` with identifier `id`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing store cannot be queried.
    async fn find_by_id(
        &self,
        entity: EntityType,
        id: &str,
        columns: &[&'static str],
    ) -> Result<Option<Record>, StoreError>;
}

#[cfg(any(test, feature = "test-utils"))]
#[allow(clippy::expect_used)]
pub mod mock {
    //! Mock store for handler and executor tests

    use super::{async_trait, CivicStore, EntityType, Record, StoreError, StoreQuery};
    use std::sync::Mutex;

    /// Records every call and replays preset results.
    pub struct MockStore {
        /// Preset result for `find()`. Empty list when unset.
        pub find_result: Mutex<Option<Result<Vec<Record>, StoreError>>>,
        /// Preset result for `find_by_id()`. `None` when unset.
        pub find_by_id_result: Mutex<Option<Result<Option<Record>, StoreError>>>,
        /// Queries passed to `find()`.
        pub find_calls: Mutex<Vec<StoreQuery>>,
        /// `(entity, id)` pairs passed to `find_by_id()`.
        pub find_by_id_calls: Mutex<Vec<(EntityType, String)>>,
    }

    impl MockStore {
        #[must_use]
        pub const fn new() -> Self {
            Self {
                find_result: Mutex::new(None),
                find_by_id_result: Mutex::new(None),
                find_calls: Mutex::new(Vec::new()),
                find_by_id_calls: Mutex::new(Vec::new()),
            }
        }

        /// Make `find()` return `records`.
        pub fn set_records(&self, records: Vec<Record>) {
            *self.find_result.lock().expect("lock poisoned") = Some(Ok(records));
        }

        /// Make `find_by_id()` return `record`.
        pub fn set_record(&self, record: Option<Record>) {
            *self.find_by_id_result.lock().expect("lock poisoned") = Some(Ok(record));
        }

        /// Make every call fail as if the store were down.
        pub fn set_unavailable(&self, reason: &str) {
            *self.find_result.lock().expect("lock poisoned") =
                Some(Err(StoreError::Unavailable(reason.to_string())));
            *self.find_by_id_result.lock().expect("lock poisoned") =
                Some(Err(StoreError::Unavailable(reason.to_string())));
        }

        #[must_use]
        pub fn last_query(&self) -> Option<StoreQuery> {
            self.find_calls.lock().expect("lock poisoned").last().cloned()
        }

        #[must_use]
        pub fn call_count(&self) -> usize {
            self.find_calls.lock().expect("lock poisoned").len()
                + self.find_by_id_calls.lock().expect("lock poisoned").len()
        }
    }

    impl Default for MockStore {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl CivicStore for MockStore {
        async fn find(&self, query: &StoreQuery) -> Result<Vec<Record>, StoreError> {
            self.find_calls
                .lock()
                .expect("lock poisoned")
                .push(query.clone());
            self.find_result
                .lock()
                .expect("lock poisoned")
                .take()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn find_by_id(
            &self,
            entity: EntityType,
            id: &str,
            _columns: &[&'static str],
        ) -> Result<Option<Record>, StoreError> {
            self.find_by_id_calls
                .lock()
                .expect("lock poisoned")
                .push((entity, id.to_string()));
            self.find_by_id_result
                .lock()
                .expect("lock poisoned")
                .take()
                .unwrap_or(Ok(None))
        }
    }
}
