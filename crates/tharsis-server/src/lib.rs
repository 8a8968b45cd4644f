//! Tharsis Server - Authoritative multiplayer game service
//!
//! This crate wraps the rules engine in a concurrency-safe service:
//! games persist as versioned documents behind a [`GameStore`], every
//! submission runs under a per-game lock plus a compare-and-swap write,
//! and every state leaving the service is censored for its viewer.

pub mod config;
pub mod error;
pub mod service;
pub mod store;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use service::{GameService, GameView};
pub use store::{GameStore, MemoryStore, StoreError, StoredGame};
