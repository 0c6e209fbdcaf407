//! # Confsync Core
//!
//! Pure primitives for confsync: hierarchical names, the synchronized
//! object set, its digest, and the records exchanged about conferences.
//!
//! This crate contains no I/O, no timers, no networking.
//!
//! ## Key Types
//!
//! - [`Name`] - Hierarchical name (`/ndn/broadcast/discovery`)
//! - [`ObjectSet`] - Sorted, duplicate-free set of object names
//! - [`Digest`] - Summary of an [`ObjectSet`], or the newcomer sentinel
//! - [`ConferenceInfo`] - What a peer knows about one conference
//! - [`LivenessReply`] - Answer to a per-conference liveness query
//!
//! ## Payloads
//!
//! An object set travels as its entries, each terminated by `\n`, in
//! sorted order. The digest is Blake3 over exactly those bytes, so two
//! peers holding equal sets always agree on the digest. See [`payload`].

pub mod conference;
pub mod digest;
pub mod duration_ms;
pub mod error;
pub mod name;
pub mod object_set;
pub mod payload;
pub mod types;

pub use conference::{ConferenceInfo, ConferenceMetadata, LivenessReply};
pub use digest::{Digest, NEWCOMER_DIGEST};
pub use error::{CoreError, Result};
pub use name::Name;
pub use object_set::ObjectSet;
pub use payload::{decode_object_list, encode_object_list};
pub use types::{Millis, NodeId, QueryId, RegistrationId, TimerId};
