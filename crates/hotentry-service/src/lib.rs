//! The hotentry list service: query validation, cached reads and tag
//! enrichment on top of the storage and cache crates.

pub mod error;
pub mod loader;
pub mod service;

pub use error::{Result, ServiceError};
pub use loader::TagLoader;
pub use service::ListService;
