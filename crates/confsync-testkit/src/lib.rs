//! # Confsync Testkit
//!
//! Testing utilities for confsync.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Payload vectors**: Object lists with their exact wire bytes
//! - **Generators**: Proptest strategies for names, sets, metadata and workloads
//! - **Fixtures**: Multi-peer clusters with predictable prefixes
//!
//! ## Payload Vectors
//!
//! ```rust
//! use confsync_testkit::vectors::{all_vectors, verify_all_vectors};
//!
//! verify_all_vectors().unwrap();
//! for vector in all_vectors() {
//!     println!("{}: {}", vector.name, vector.payload_hex);
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use confsync_testkit::fixtures::{metadata, TestCluster};
//!
//! let mut cluster = TestCluster::new(2);
//! cluster.start_all();
//! cluster.publish(0, "weekly", metadata("planning"));
//! cluster.run_until(100);
//! assert!(cluster.discovered(1).contains_key("weekly"));
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{conference_names, metadata, peer_prefix, TestCluster, TestPeer};
pub use generators::{Op, SetParams};
pub use vectors::{all_vectors, verify_all_vectors, PayloadVector};
