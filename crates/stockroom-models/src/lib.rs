//! Shared data models for the Stockroom realtime store.
//!
//! This crate provides Serde-serializable types for:
//! - Schemaless inventory records and their store-assigned keys
//! - Change events emitted by collection subscriptions

pub mod event;
pub mod record;

// Re-export common types
pub use event::{ChangeEvent, ChangeEventKind};
pub use record::{validate_key, InvalidKeyError, Record, RecordId, MAX_KEY_BYTES};
