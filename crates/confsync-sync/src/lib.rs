//! # Confsync Sync
//!
//! Digest set synchronizer: converges peers' views of a shared object set
//! over a name-addressed query/response transport.
//!
//! ## Overview
//!
//! Each peer keeps one discovery query outstanding for
//! `broadcast/<its digest>`. Any peer whose digest differs answers with its
//! full object list. A peer whose digest matches has nothing new to say, so
//! it parks the query in its [`PendingTable`] and answers it the moment its
//! own set changes.
//!
//! A newcomer queries with the `00` digest, which no real set produces, and
//! so receives a full snapshot from the first peer that hears it.
//!
//! ## Key Properties
//!
//! - **Snapshot, not merge**: a differing response is handed to the caller
//!   as a full remote list; the synchronizer never merges it
//! - **One query in flight**: re-issued after every response (following a
//!   short pause) and immediately after every timeout
//! - **Sans-IO**: every method runs to completion against a
//!   [`confsync_face::Face`]; nothing blocks
//!
//! ## Message Flow
//!
//! ```text
//! Newcomer                           Peer (digest D)
//!   |------ query /bc/00 ------------->|
//!   |<----- full list -----------------|
//!   |                                  |
//!   |------ query /bc/D -------------->|   (digests match: parked)
//!   |                                  |   ... peer publishes, digest D'
//!   |<----- full list -----------------|
//! ```

pub mod config;
pub mod error;
pub mod pending;
pub mod sync;

pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use pending::{PendingEntry, PendingTable};
pub use sync::{decode_snapshot, DigestSync, Outstanding, SyncPhase};
