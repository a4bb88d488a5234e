//! # SyncGate Testkit
//!
//! Testing utilities for SyncGate.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Access vectors**: Stored documents with the answer a request against
//!   them must get
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Helper structs for setting up test scenarios
//!
//! ## Access Vectors
//!
//! ```rust
//! use syncgate_testkit::vectors::verify_all_vectors;
//!
//! for (name, error) in verify_all_vectors() {
//!     println!("{name}: {error}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use syncgate_auth::Principal;
//! use syncgate_testkit::generators::{user_from_params, UserParams};
//!
//! proptest! {
//!     #[test]
//!     fn explicit_grants_always_visible(params in any::<UserParams>()) {
//!         let user = user_from_params(&params);
//!         for channel in user.explicit_channels().channels() {
//!             prop_assert!(user.can_see_channel(channel));
//!         }
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use syncgate_testkit::fixtures::TestFixture;
//!
//! async fn example() {
//!     let fixture = TestFixture::new();
//!     fixture.role("staff", &["memos"]).await.unwrap();
//!     let user = fixture.user("pat", &["inbox"], &["staff"]).await.unwrap();
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{channels, TestFixture, DEFAULT_PASSWORD};
pub use generators::{user_from_params, UserParams};
pub use vectors::{all_vectors, verify_all_vectors, verify_vector, AccessVector, Expected};
