//! # Confsync
//!
//! Serverless conference discovery: peers learn which conferences are
//! running by synchronizing a shared set of conference names, then check
//! each one with its host directly.
//!
//! ## Overview
//!
//! - **Discovery**: a [`confsync_sync::DigestSync`] keeps peers' sets of
//!   full conference names converging.
//! - **Liveness**: every newly seen name gets a liveness query. An answer
//!   makes the conference discovered and schedules the next query; a
//!   single timeout ends it.
//! - **Departure**: a host that stops a conference removes it from the
//!   shared set first and keeps answering "ended" for a short keep period
//!   before withdrawing its namespace.
//!
//! ## Usage
//!
//! ```rust
//! use confsync::{Cluster, DiscoveryConfig};
//! use confsync_core::{ConferenceMetadata, Name};
//!
//! let mut cluster = Cluster::new(DiscoveryConfig::default());
//! let alice = cluster.add_peer();
//! let bob = cluster.add_peer();
//! cluster.start_all().unwrap();
//!
//! let local = Name::parse("/ndn/alice").unwrap();
//! cluster
//!     .publish_conference(alice, "weekly", &local, ConferenceMetadata::new("planning"))
//!     .unwrap();
//! cluster.run_until(1000);
//!
//! let found = cluster.discovered(bob).unwrap();
//! assert_eq!(found["weekly"].full_name().to_string(), "/ndn/alice/weekly");
//! ```
//!
//! ## Re-exports
//!
//! - `confsync::core` - Names, digests, conference records
//! - `confsync::face` - Transport seam and in-memory network
//! - `confsync::sync` - Digest set synchronizer

pub mod cluster;
pub mod config;
pub mod engine;
pub mod error;
pub mod observer;
pub mod runtime;

// Re-export component crates
pub use confsync_core as core;
pub use confsync_face as face;
pub use confsync_sync as sync;

// Re-export main types for convenience
pub use cluster::Cluster;
pub use config::{DiscoveryConfig, DEFAULT_BROADCAST_PREFIX};
pub use engine::{ConferenceDiscovery, EnginePhase, ProbeState};
pub use error::{DiscoveryError, Result};
pub use observer::{
    ConferenceObserver, Notification, NotificationKind, NotificationLog, TracingObserver,
};
pub use runtime::ClusterHandle;

pub use confsync_core::{ConferenceInfo, ConferenceMetadata, Name, NodeId};
