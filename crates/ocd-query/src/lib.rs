//! Query translation for the Open Civic Data API.
//!
//! Raw query parameters flow through four stages, each a separate module:
//!
//! 1. [`params`] / [`context`]: validate keys against the [`registry`] and
//!    build an immutable [`RequestContext`];
//! 2. [`compiler`]: turn bindings into one AND-combined [`Predicate`];
//! 3. [`executor`]: run the predicate through a [`CivicStore`] with ordering
//!    and pagination;
//! 4. [`projector`]: select fields and wrap results in the list envelope.
//!
//! The crate owns no database driver. Stores implement [`CivicStore`];
//! [`MemoryStore`] evaluates predicates over JSON documents.

#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::print_stdout,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]

pub mod compiler;
pub mod context;
pub mod entity;
pub mod error;
pub mod executor;
pub mod params;
pub mod projector;
pub mod registry;
pub mod store;

pub use compiler::{CompileOptions, FieldTest, Predicate};
pub use context::{Pagination, QuerySettings, RequestContext};
pub use entity::EntityType;
pub use error::{ErrorResponse, QueryError};
pub use params::QueryParams;
pub use projector::ListEnvelope;
pub use registry::Endpoint;
pub use store::{CivicStore, MemoryStore, Ordering, Record, StoreError, StoreQuery};
