//! `creamery-store` — abstract transactional record store.
//!
//! The core is written against one storage interface: versioned JSON records
//! with atomic, precondition-checked multi-record commits. One backing
//! adapter is provided (in-memory); SQL/document backends can implement
//! [`TxStore`] without touching business logic.

pub mod in_memory;
pub mod record;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use record::{Expected, RecordWrite, StoredRecord, decode};
pub use r#trait::{StoreError, TxStore};
