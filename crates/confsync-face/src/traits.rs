//! Face trait: the interface protocol code drives a transport through.
//!
//! Every method returns immediately. Outcomes arrive later as
//! [`FaceEvent`]s, delivered one at a time by whoever drives the face.

use std::time::Duration;

use bytes::Bytes;
use confsync_core::{Millis, Name, QueryId, RegistrationId, TimerId};

/// A response travelling back towards whoever asked for its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Name being answered.
    pub name: Name,
    /// Opaque payload.
    pub content: Bytes,
    /// How long the responder's cache may keep serving it.
    pub freshness: Duration,
}

impl Response {
    pub fn new(name: Name, content: impl Into<Bytes>, freshness: Duration) -> Self {
        Self {
            name,
            content: content.into(),
            freshness,
        }
    }
}

/// A query that reached this node through one of its registrations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingQuery {
    /// Name asked for.
    pub name: Name,
    /// Lifetime declared by the requester.
    pub lifetime: Duration,
    /// When the query arrived, on the face's clock.
    pub arrived_at: Millis,
}

impl IncomingQuery {
    /// Instant after which answering is pointless.
    pub fn expires_at(&self) -> Millis {
        let lifetime = u64::try_from(self.lifetime.as_millis()).unwrap_or(u64::MAX);
        self.arrived_at.saturating_add(lifetime)
    }
}

/// Something that happened on a face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaceEvent {
    /// An outgoing query was answered.
    Response { query: QueryId, response: Response },
    /// An outgoing query expired unanswered.
    Timeout { query: QueryId, name: Name },
    /// A query arrived under one of our registered prefixes.
    Query {
        registration: RegistrationId,
        query: IncomingQuery,
    },
    /// A scheduled timer fired.
    Timer { timer: TimerId },
    /// A prefix registration was refused.
    RegisterFailed {
        registration: RegistrationId,
        prefix: Name,
    },
}

/// Operations a name-addressed, pull-based transport offers.
///
/// Implementations never call back into protocol code from inside these
/// methods; everything they cause is reported as a later [`FaceEvent`].
pub trait Face {
    /// Current time on this face's clock.
    fn now(&self) -> Millis;

    /// Send a query for `name`.
    ///
    /// Exactly one `Response` or `Timeout` will be reported for the
    /// returned handle.
    fn express_query(&mut self, name: Name, lifetime: Duration) -> QueryId;

    /// Start serving queries under `prefix`.
    ///
    /// Refusal is reported later as `RegisterFailed`.
    fn register_prefix(&mut self, prefix: Name) -> RegistrationId;

    /// Stop serving a prefix. Returns false if the handle was not active.
    fn unregister_prefix(&mut self, registration: RegistrationId) -> bool;

    /// Publish a response.
    ///
    /// Answers every outstanding query for exactly this name that reached
    /// this node, and caches the response for its freshness period so
    /// repeated queries are answered without reaching application code.
    /// Returns how many outstanding queries were answered.
    fn put_response(&mut self, response: Response) -> usize;

    /// Fire a `Timer` event after `delay`.
    fn schedule(&mut self, delay: Duration) -> TimerId;

    /// Cancel a timer. Returns false if it already fired or was unknown.
    fn cancel_timer(&mut self, timer: TimerId) -> bool;
}
