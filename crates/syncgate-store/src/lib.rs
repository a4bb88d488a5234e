//! # SyncGate Store
//!
//! Storage abstraction for SyncGate principals. Provides a trait-based
//! interface for user and role documents with SQLite and in-memory
//! implementations.
//!
//! ## Overview
//!
//! The store module abstracts principal storage behind the
//! [`PrincipalStore`] trait, so the gateway is storage-agnostic. The primary
//! implementation is [`SqliteStore`], with [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`PrincipalStore`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use syncgate_store::{PrincipalStore, SqliteStore};
//!
//! async fn example() {
//!     let store = SqliteStore::open("principals.db").unwrap();
//!
//!     // Load a user with its roles resolved.
//!     if let Some(user) = store.load_user("alice").await.unwrap() {
//!         println!("{:?}", user.inherited_channels());
//!     }
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **JSON documents**: principals are stored as JSON keyed by `doc_id()`
//! - **Role version**: bumped on every role write so cached channel
//!   snapshots can be checked for staleness
//! - **Access view**: document-derived grants, merged earliest-wins

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::PrincipalStore;
