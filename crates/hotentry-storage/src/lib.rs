//! Entry and tag stores for hotentry.
//!
//! [`PostgresStore`] runs the parameterized plans built in [`plan`];
//! [`InMemoryStore`] gives the same results without a database.

pub mod memory;
pub mod plan;
pub mod postgres;

pub use hotentry_core::{EntryStore, StorageError, TagStore};
pub use memory::InMemoryStore;
pub use plan::{Arg, PlanBuilder, PlanMode, QueryPlan};
pub use postgres::PostgresStore;
