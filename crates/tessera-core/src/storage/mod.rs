//! # Storage Module
//!
//! Durable `PersistenceAdapter` backends.

mod redb_storage;

pub use redb_storage::{FILTER_STATE_TABLE, RedbStorage};
