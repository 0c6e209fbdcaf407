//! # Confsync Face
//!
//! The seam between the discovery protocol and a name-addressed,
//! pull-based transport.
//!
//! ## Overview
//!
//! A consumer expresses a *query* for a name; any node that registered a
//! covering prefix may answer it with a *response*. There are no
//! connections and no addresses. The [`Face`] trait is what protocol code
//! calls; the driving loop hands back [`FaceEvent`]s carrying the typed
//! handles the face gave out.
//!
//! ## Key Types
//!
//! - [`Face`] - Operations available to protocol code
//! - [`FaceEvent`] - What the driving loop delivers back
//! - [`MemoryNetwork`] - Deterministic in-memory network on a virtual clock
//! - [`MemoryFace`] - One node's view of a [`MemoryNetwork`]
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//! use confsync_core::Name;
//! use confsync_face::{Face, FaceEvent, MemoryNetwork, Response};
//!
//! let mut network = MemoryNetwork::new();
//! let server = network.add_node();
//! let client = network.add_node();
//!
//! let prefix = Name::parse("/demo").unwrap();
//! network.face(server).unwrap().register_prefix(prefix.clone());
//! let query = network
//!     .face(client)
//!     .unwrap()
//!     .express_query(prefix.child("hello").unwrap(), Duration::from_secs(1));
//!
//! // The server sees the query and answers it.
//! let (node, event) = network.poll_until(0).unwrap();
//! assert_eq!(node, server);
//! if let FaceEvent::Query { query: incoming, .. } = event {
//!     let response = Response::new(incoming.name, &b"world"[..], Duration::ZERO);
//!     network.face(server).unwrap().put_response(response);
//! }
//!
//! // The client gets exactly one response.
//! let (node, event) = network.poll_until(0).unwrap();
//! assert_eq!(node, client);
//! assert!(matches!(event, FaceEvent::Response { query: q, .. } if q == query));
//! ```
//!
//! ## Design Notes
//!
//! - **Exactly once**: each outgoing query ends in one response or one timeout
//! - **Response cache**: answered names are cached for their freshness period
//!   and served without re-entering application code
//! - **Serial dispatch**: events are handed out one at a time, never reentrantly

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{FaceError, Result};
pub use memory::{MemoryFace, MemoryNetwork, QueryRecord, DEFAULT_QUERY_LOG_CAPACITY};
pub use traits::{Face, FaceEvent, IncomingQuery, Response};
