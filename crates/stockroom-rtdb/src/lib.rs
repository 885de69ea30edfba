//! Realtime Database access for the Stockroom services.
//!
//! This crate provides:
//! - A thin REST client for the hosted tree store (`RtdbClient`)
//! - Typed repositories for the units and materials collections
//! - Scoped change subscriptions over the streaming endpoint
//! - Error types that preserve store failures for callers

pub mod client;
pub mod error;
pub mod metrics;
pub mod path;
pub mod repos;
pub mod stream;
pub mod subscription;
pub mod types;

#[cfg(test)]
mod client_tests;

pub use client::{RtdbClient, RtdbConfig};
pub use error::{RtdbError, RtdbResult};
pub use path::{CollectionPath, NodePath};
pub use repos::{
    Collection, MaterialRepository, UnitRepository, MATERIALS_PATH, UNITS_PATH,
};
pub use stream::{EventStream, ServerEvent};
pub use subscription::Subscription;
pub use types::{PushResponse, StreamPayload};
