//! In-memory implementation of the Face trait.
//!
//! A discrete-event network on a virtual millisecond clock. Nothing
//! happens until the driver polls; [`MemoryNetwork::poll_until`] hands out
//! the next event addressed to some node and advances the clock to it.
//! Same-instant events come out in the order they were scheduled.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, VecDeque};
use std::time::Duration;

use confsync_core::{Millis, Name, NodeId, QueryId, RegistrationId, TimerId};
use tracing::{debug, trace};

use crate::error::{FaceError, Result};
use crate::traits::{Face, FaceEvent, IncomingQuery, Response};

/// One query as it was expressed, kept for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRecord {
    /// When it was expressed.
    pub at: Millis,
    /// Who expressed it.
    pub origin: NodeId,
    /// Handle given to the origin.
    pub query: QueryId,
    /// Name asked for.
    pub name: Name,
}

/// Query records kept by default; older ones are dropped first.
pub const DEFAULT_QUERY_LOG_CAPACITY: usize = 4096;

/// Shared state for every node attached to the in-memory network.
pub struct MemoryNetwork {
    now: Millis,
    latency: Duration,
    next_handle: u64,
    next_seq: u64,
    nodes: BTreeMap<NodeId, NodeState>,
    /// Queries neither answered nor expired.
    outstanding: BTreeMap<QueryId, Outstanding>,
    /// Armed timers and their owners.
    timers: HashMap<TimerId, NodeId>,
    agenda: BinaryHeap<Reverse<Scheduled>>,
    denied: Vec<Name>,
    query_log: VecDeque<QueryRecord>,
    query_log_capacity: usize,
}

#[derive(Default)]
struct NodeState {
    registrations: BTreeMap<RegistrationId, Name>,
    cache: BTreeMap<Name, CachedResponse>,
}

impl NodeState {
    /// Longest registered prefix covering `name`.
    fn route(&self, name: &Name) -> Option<RegistrationId> {
        self.registrations
            .iter()
            .filter(|(_, prefix)| prefix.is_prefix_of(name))
            .max_by_key(|(_, prefix)| prefix.len())
            .map(|(id, _)| *id)
    }

    /// Fresh cached response for exactly `name`.
    fn cached(&self, name: &Name, now: Millis) -> Option<&Response> {
        self.cache
            .get(name)
            .filter(|entry| now < entry.expires_at)
            .map(|entry| &entry.response)
    }

    fn purge_cache(&mut self, now: Millis) {
        self.cache.retain(|_, entry| now < entry.expires_at);
    }
}

struct CachedResponse {
    response: Response,
    expires_at: Millis,
}

struct Outstanding {
    origin: NodeId,
    name: Name,
    lifetime: Duration,
    /// Nodes the query was handed to; only they can answer it.
    delivered_to: BTreeSet<NodeId>,
}

struct Scheduled {
    at: Millis,
    seq: u64,
    action: Action,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        (self.at, self.seq) == (other.at, other.seq)
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.at, self.seq).cmp(&(other.at, other.seq))
    }
}

enum Action {
    Forward(QueryId),
    Expire(QueryId),
    Fire { node: NodeId, timer: TimerId },
    Deliver { node: NodeId, event: FaceEvent },
}

fn millis(duration: Duration) -> Millis {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl MemoryNetwork {
    /// Create an empty network whose clock starts at zero.
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create an empty network whose clock starts at `now`.
    ///
    /// Pass Unix milliseconds to get wall-clock-like timestamps.
    pub fn starting_at(now: Millis) -> Self {
        Self {
            now,
            latency: Duration::ZERO,
            next_handle: 1,
            next_seq: 0,
            nodes: BTreeMap::new(),
            outstanding: BTreeMap::new(),
            timers: HashMap::new(),
            agenda: BinaryHeap::new(),
            denied: Vec::new(),
            query_log: VecDeque::new(),
            query_log_capacity: DEFAULT_QUERY_LOG_CAPACITY,
        }
    }

    /// Keep at most `capacity` query records. Zero turns recording off.
    pub fn with_query_log_capacity(mut self, capacity: usize) -> Self {
        self.query_log_capacity = capacity;
        self.query_log.truncate(capacity);
        self
    }

    /// One-way delay applied to queries and responses.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Current virtual time.
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Attach a new node.
    pub fn add_node(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.insert(id, NodeState::default());
        id
    }

    /// Ids of all attached nodes.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Borrow the face of one node.
    pub fn face(&mut self, node: NodeId) -> Result<MemoryFace<'_>> {
        if !self.nodes.contains_key(&node) {
            return Err(FaceError::UnknownNode(node));
        }
        Ok(MemoryFace {
            network: self,
            node,
        })
    }

    /// Refuse future registrations of names under `prefix`.
    pub fn deny_prefix(&mut self, prefix: Name) {
        self.denied.push(prefix);
    }

    /// Lift a refusal installed by [`deny_prefix`](Self::deny_prefix).
    pub fn allow_prefix(&mut self, prefix: &Name) {
        self.denied.retain(|denied| denied != prefix);
    }

    /// When the next scheduled item is due.
    pub fn next_deadline(&self) -> Option<Millis> {
        self.agenda.peek().map(|Reverse(scheduled)| scheduled.at)
    }

    /// Next event due no later than `deadline`.
    ///
    /// Returns `None` once nothing is due by then, leaving the clock at
    /// `deadline`.
    pub fn poll_until(&mut self, deadline: Millis) -> Option<(NodeId, FaceEvent)> {
        loop {
            let due = matches!(self.agenda.peek(), Some(Reverse(next)) if next.at <= deadline);
            if !due {
                self.now = self.now.max(deadline);
                return None;
            }
            let Reverse(scheduled) = self.agenda.pop()?;
            self.now = self.now.max(scheduled.at);

            match scheduled.action {
                Action::Forward(query) => self.forward(query),
                Action::Expire(query) => {
                    if let Some(entry) = self.outstanding.remove(&query) {
                        trace!(%query, name = %entry.name, "query expired");
                        return Some((
                            entry.origin,
                            FaceEvent::Timeout {
                                query,
                                name: entry.name,
                            },
                        ));
                    }
                }
                Action::Fire { node, timer } => {
                    if self.timers.remove(&timer).is_some() {
                        return Some((node, FaceEvent::Timer { timer }));
                    }
                }
                Action::Deliver { node, event } => return Some((node, event)),
            }
        }
    }

    /// Next event, however far in the future.
    pub fn poll_next(&mut self) -> Option<(NodeId, FaceEvent)> {
        while let Some(at) = self.next_deadline() {
            if let Some(hit) = self.poll_until(at) {
                return Some(hit);
            }
        }
        None
    }

    /// Prefixes currently registered by `node`.
    pub fn registrations(&self, node: NodeId) -> Vec<Name> {
        self.nodes
            .get(&node)
            .map(|state| state.registrations.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Names `node` would still answer from its cache.
    pub fn cached_names(&self, node: NodeId) -> Vec<Name> {
        let Some(state) = self.nodes.get(&node) else {
            return Vec::new();
        };
        state
            .cache
            .keys()
            .filter(|name| state.route(name).is_some() && state.cached(name, self.now).is_some())
            .cloned()
            .collect()
    }

    /// Number of queries neither answered nor expired.
    pub fn outstanding_queries(&self) -> usize {
        self.outstanding.len()
    }

    /// The most recently expressed queries, oldest first.
    pub fn query_log(&self) -> &VecDeque<QueryRecord> {
        &self.query_log
    }

    fn record(&mut self, record: QueryRecord) {
        if self.query_log_capacity == 0 {
            return;
        }
        while self.query_log.len() >= self.query_log_capacity {
            self.query_log.pop_front();
        }
        self.query_log.push_back(record);
    }

    /// Number of entries held in `node`'s cache, expired or not.
    pub fn cache_len(&self, node: NodeId) -> usize {
        self.nodes.get(&node).map_or(0, |state| state.cache.len())
    }

    fn alloc_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn push(&mut self, at: Millis, action: Action) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.agenda.push(Reverse(Scheduled { at, seq, action }));
    }

    fn latency_ms(&self) -> Millis {
        millis(self.latency)
    }

    /// Hand a query to every other node serving its name, unless a fresh
    /// cache entry on one of them answers it first.
    fn forward(&mut self, query: QueryId) {
        let Some(entry) = self.outstanding.get(&query) else {
            return;
        };
        let origin = entry.origin;
        let name = entry.name.clone();
        let lifetime = entry.lifetime;
        let now = self.now;

        let routes: Vec<(NodeId, RegistrationId)> = self
            .nodes
            .iter()
            .filter(|(id, _)| **id != origin)
            .filter_map(|(id, state)| state.route(&name).map(|registration| (*id, registration)))
            .collect();

        if routes.is_empty() {
            trace!(%query, %name, "no route");
            return;
        }
        for (id, _) in &routes {
            if let Some(state) = self.nodes.get_mut(id) {
                state.purge_cache(now);
            }
        }

        let cached = routes.iter().find_map(|(id, _)| {
            self.nodes
                .get(id)
                .and_then(|state| state.cached(&name, now))
                .map(|response| (*id, response.clone()))
        });
        if let Some((responder, response)) = cached {
            self.outstanding.remove(&query);
            trace!(%query, %name, %responder, "answered from cache");
            let at = now.saturating_add(self.latency_ms());
            self.push(
                at,
                Action::Deliver {
                    node: origin,
                    event: FaceEvent::Response { query, response },
                },
            );
            return;
        }

        for (node, registration) in routes {
            if let Some(entry) = self.outstanding.get_mut(&query) {
                entry.delivered_to.insert(node);
            }
            let incoming = IncomingQuery {
                name: name.clone(),
                lifetime,
                arrived_at: now,
            };
            self.push(
                now,
                Action::Deliver {
                    node,
                    event: FaceEvent::Query {
                        registration,
                        query: incoming,
                    },
                },
            );
        }
    }

    /// Answer every outstanding query for `response.name` handed to
    /// `responder`.
    fn satisfy(&mut self, responder: NodeId, response: &Response) -> usize {
        let answered: Vec<QueryId> = self
            .outstanding
            .iter()
            .filter(|(_, entry)| {
                entry.origin != responder
                    && entry.name == response.name
                    && entry.delivered_to.contains(&responder)
            })
            .map(|(id, _)| *id)
            .collect();

        let at = self.now.saturating_add(self.latency_ms());
        for query in &answered {
            if let Some(entry) = self.outstanding.remove(query) {
                self.push(
                    at,
                    Action::Deliver {
                        node: entry.origin,
                        event: FaceEvent::Response {
                            query: *query,
                            response: response.clone(),
                        },
                    },
                );
            }
        }
        answered.len()
    }
}

impl Default for MemoryNetwork {
    fn default() -> Self {
        Self::new()
    }
}

/// One node's face onto a [`MemoryNetwork`].
pub struct MemoryFace<'a> {
    network: &'a mut MemoryNetwork,
    node: NodeId,
}

impl MemoryFace<'_> {
    /// The node this face belongs to.
    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl Face for MemoryFace<'_> {
    fn now(&self) -> Millis {
        self.network.now
    }

    fn express_query(&mut self, name: Name, lifetime: Duration) -> QueryId {
        let network = &mut *self.network;
        let query = QueryId(network.alloc_handle());
        let now = network.now;

        network.record(QueryRecord {
            at: now,
            origin: self.node,
            query,
            name: name.clone(),
        });
        network.outstanding.insert(
            query,
            Outstanding {
                origin: self.node,
                name,
                lifetime,
                delivered_to: BTreeSet::new(),
            },
        );
        let forward_at = now.saturating_add(network.latency_ms());
        network.push(forward_at, Action::Forward(query));
        network.push(now.saturating_add(millis(lifetime)), Action::Expire(query));
        query
    }

    fn register_prefix(&mut self, prefix: Name) -> RegistrationId {
        let network = &mut *self.network;
        let registration = RegistrationId(network.alloc_handle());

        if network.denied.iter().any(|denied| denied.is_prefix_of(&prefix)) {
            debug!(node = %self.node, %prefix, "prefix registration refused");
            let now = network.now;
            network.push(
                now,
                Action::Deliver {
                    node: self.node,
                    event: FaceEvent::RegisterFailed {
                        registration,
                        prefix,
                    },
                },
            );
        } else if let Some(state) = network.nodes.get_mut(&self.node) {
            state.registrations.insert(registration, prefix);
        }
        registration
    }

    fn unregister_prefix(&mut self, registration: RegistrationId) -> bool {
        self.network
            .nodes
            .get_mut(&self.node)
            .map_or(false, |state| state.registrations.remove(&registration).is_some())
    }

    fn put_response(&mut self, response: Response) -> usize {
        let network = &mut *self.network;
        let now = network.now;

        if let Some(state) = network.nodes.get_mut(&self.node) {
            state.purge_cache(now);
        }
        if !response.freshness.is_zero() {
            if let Some(state) = network.nodes.get_mut(&self.node) {
                state.cache.insert(
                    response.name.clone(),
                    CachedResponse {
                        response: response.clone(),
                        expires_at: now.saturating_add(millis(response.freshness)),
                    },
                );
            }
        }
        network.satisfy(self.node, &response)
    }

    fn schedule(&mut self, delay: Duration) -> TimerId {
        let network = &mut *self.network;
        let timer = TimerId(network.alloc_handle());
        network.timers.insert(timer, self.node);
        let at = network.now.saturating_add(millis(delay));
        network.push(
            at,
            Action::Fire {
                node: self.node,
                timer,
            },
        );
        timer
    }

    fn cancel_timer(&mut self, timer: TimerId) -> bool {
        self.network.timers.remove(&timer).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(uri: &str) -> Name {
        Name::parse(uri).unwrap()
    }

    /// Drain every event due by `deadline`.
    fn drain(network: &mut MemoryNetwork, deadline: Millis) -> Vec<(NodeId, FaceEvent)> {
        let mut events = Vec::new();
        while let Some(event) = network.poll_until(deadline) {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_query_reaches_registered_node_only() {
        let mut network = MemoryNetwork::new();
        let origin = network.add_node();
        let server = network.add_node();
        let bystander = network.add_node();

        network.face(server).unwrap().register_prefix(name("/svc"));
        network.face(bystander).unwrap().register_prefix(name("/other"));
        network
            .face(origin)
            .unwrap()
            .express_query(name("/svc/item"), Duration::from_millis(100));

        let events = drain(&mut network, 0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, server);
        assert!(matches!(&events[0].1, FaceEvent::Query { query, .. } if query.name == name("/svc/item")));
    }

    #[test]
    fn test_origin_does_not_hear_itself() {
        let mut network = MemoryNetwork::new();
        let node = network.add_node();
        let mut face = network.face(node).unwrap();
        face.register_prefix(name("/loop"));
        let query = face.express_query(name("/loop/x"), Duration::from_millis(50));

        let events = drain(&mut network, 100);
        assert_eq!(
            events,
            vec![(
                node,
                FaceEvent::Timeout {
                    query,
                    name: name("/loop/x")
                }
            )]
        );
    }

    #[test]
    fn test_response_exactly_once() {
        let mut network = MemoryNetwork::new();
        let origin = network.add_node();
        let a = network.add_node();
        let b = network.add_node();
        network.face(a).unwrap().register_prefix(name("/svc"));
        network.face(b).unwrap().register_prefix(name("/svc"));
        let query = network
            .face(origin)
            .unwrap()
            .express_query(name("/svc/x"), Duration::from_millis(100));
        assert_eq!(drain(&mut network, 0).len(), 2);

        let first = Response::new(name("/svc/x"), &b"a"[..], Duration::ZERO);
        let second = Response::new(name("/svc/x"), &b"b"[..], Duration::ZERO);
        assert_eq!(network.face(a).unwrap().put_response(first), 1);
        assert_eq!(network.face(b).unwrap().put_response(second), 0);

        let events = drain(&mut network, 1000);
        assert_eq!(events.len(), 1);
        match &events[0] {
            (node, FaceEvent::Response { query: q, response }) => {
                assert_eq!(*node, origin);
                assert_eq!(*q, query);
                assert_eq!(&response.content[..], b"a");
            }
            other => panic!("expected response, got {other:?}"),
        }
        assert_eq!(network.outstanding_queries(), 0);
    }

    #[test]
    fn test_unanswered_query_times_out() {
        let mut network = MemoryNetwork::new();
        let origin = network.add_node();
        let query = network
            .face(origin)
            .unwrap()
            .express_query(name("/nobody"), Duration::from_millis(2000));

        assert!(drain(&mut network, 1999).is_empty());
        let events = drain(&mut network, 2000);
        assert_eq!(
            events,
            vec![(
                origin,
                FaceEvent::Timeout {
                    query,
                    name: name("/nobody")
                }
            )]
        );
        assert_eq!(network.now(), 2000);
    }

    #[test]
    fn test_cache_answers_without_reaching_application() {
        let mut network = MemoryNetwork::new();
        let origin = network.add_node();
        let server = network.add_node();
        network.face(server).unwrap().register_prefix(name("/svc"));
        network.face(server).unwrap().put_response(Response::new(
            name("/svc/x"),
            &b"cached"[..],
            Duration::from_millis(1000),
        ));

        let query = network
            .face(origin)
            .unwrap()
            .express_query(name("/svc/x"), Duration::from_millis(100));
        let events = drain(&mut network, 10);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], (node, FaceEvent::Response { query: q, .. }) if *node == origin && *q == query));
    }

    #[test]
    fn test_cache_expires_with_freshness() {
        let mut network = MemoryNetwork::new();
        let origin = network.add_node();
        let server = network.add_node();
        network.face(server).unwrap().register_prefix(name("/svc"));
        network.face(server).unwrap().put_response(Response::new(
            name("/svc/x"),
            &b"cached"[..],
            Duration::from_millis(100),
        ));
        assert_eq!(network.cached_names(server), vec![name("/svc/x")]);

        drain(&mut network, 100);
        assert!(network.cached_names(server).is_empty());

        network
            .face(origin)
            .unwrap()
            .express_query(name("/svc/x"), Duration::from_millis(100));
        let events = drain(&mut network, 100);
        assert!(matches!(&events[0], (node, FaceEvent::Query { .. }) if *node == server));
    }

    #[test]
    fn test_cache_unreachable_after_unregister() {
        let mut network = MemoryNetwork::new();
        let origin = network.add_node();
        let server = network.add_node();
        let registration = network.face(server).unwrap().register_prefix(name("/svc"));
        network.face(server).unwrap().put_response(Response::new(
            name("/svc/x"),
            &b"cached"[..],
            Duration::from_millis(10_000),
        ));
        assert!(network.face(server).unwrap().unregister_prefix(registration));
        assert!(!network.face(server).unwrap().unregister_prefix(registration));

        let query = network
            .face(origin)
            .unwrap()
            .express_query(name("/svc/x"), Duration::from_millis(100));
        let events = drain(&mut network, 200);
        assert_eq!(
            events,
            vec![(
                origin,
                FaceEvent::Timeout {
                    query,
                    name: name("/svc/x")
                }
            )]
        );
    }

    #[test]
    fn test_one_response_answers_aggregated_queries() {
        let mut network = MemoryNetwork::new();
        let first = network.add_node();
        let second = network.add_node();
        let server = network.add_node();
        network.face(server).unwrap().register_prefix(name("/svc"));
        network
            .face(first)
            .unwrap()
            .express_query(name("/svc/x"), Duration::from_millis(100));
        network
            .face(second)
            .unwrap()
            .express_query(name("/svc/x"), Duration::from_millis(100));
        assert_eq!(drain(&mut network, 0).len(), 2);

        let answered = network.face(server).unwrap().put_response(Response::new(
            name("/svc/x"),
            &b"both"[..],
            Duration::ZERO,
        ));
        assert_eq!(answered, 2);
    }

    #[test]
    fn test_unsolicited_response_is_dropped() {
        let mut network = MemoryNetwork::new();
        let origin = network.add_node();
        let server = network.add_node();
        let other = network.add_node();
        network.face(server).unwrap().register_prefix(name("/svc"));
        network
            .face(origin)
            .unwrap()
            .express_query(name("/svc/x"), Duration::from_millis(100));
        drain(&mut network, 0);

        // `other` never saw the query.
        let answered = network.face(other).unwrap().put_response(Response::new(
            name("/svc/x"),
            &b"nope"[..],
            Duration::ZERO,
        ));
        assert_eq!(answered, 0);
    }

    #[test]
    fn test_timer_fires_once_and_cancels() {
        let mut network = MemoryNetwork::new();
        let node = network.add_node();
        let fired = network.face(node).unwrap().schedule(Duration::from_millis(500));
        let cancelled = network.face(node).unwrap().schedule(Duration::from_millis(300));
        assert!(network.face(node).unwrap().cancel_timer(cancelled));

        let events = drain(&mut network, 1000);
        assert_eq!(events, vec![(node, FaceEvent::Timer { timer: fired })]);
        assert!(!network.face(node).unwrap().cancel_timer(fired));
    }

    #[test]
    fn test_denied_prefix_fails_registration() {
        let mut network = MemoryNetwork::new();
        let node = network.add_node();
        network.deny_prefix(name("/forbidden"));
        let registration = network
            .face(node)
            .unwrap()
            .register_prefix(name("/forbidden/room"));

        let events = drain(&mut network, 0);
        assert_eq!(
            events,
            vec![(
                node,
                FaceEvent::RegisterFailed {
                    registration,
                    prefix: name("/forbidden/room")
                }
            )]
        );
        assert!(network.registrations(node).is_empty());

        network.allow_prefix(&name("/forbidden"));
        network.face(node).unwrap().register_prefix(name("/forbidden/room"));
        assert_eq!(network.registrations(node), vec![name("/forbidden/room")]);
    }

    #[test]
    fn test_latency_delays_delivery() {
        let mut network = MemoryNetwork::new().with_latency(Duration::from_millis(20));
        let origin = network.add_node();
        let server = network.add_node();
        network.face(server).unwrap().register_prefix(name("/svc"));
        network
            .face(origin)
            .unwrap()
            .express_query(name("/svc/x"), Duration::from_millis(100));

        assert!(drain(&mut network, 19).is_empty());
        assert_eq!(drain(&mut network, 20).len(), 1);
    }

    #[test]
    fn test_unknown_node() {
        let mut network = MemoryNetwork::new();
        assert!(matches!(
            network.face(NodeId(9)),
            Err(FaceError::UnknownNode(NodeId(9)))
        ));
    }

    #[test]
    fn test_query_log() {
        let mut network = MemoryNetwork::starting_at(1_000);
        let node = network.add_node();
        let query = network
            .face(node)
            .unwrap()
            .express_query(name("/x"), Duration::from_millis(10));
        assert_eq!(
            network.query_log().iter().cloned().collect::<Vec<_>>(),
            vec![QueryRecord {
                at: 1_000,
                origin: node,
                query,
                name: name("/x"),
            }]
        );
    }

    #[test]
    fn test_query_log_keeps_most_recent() {
        let mut network = MemoryNetwork::new().with_query_log_capacity(3);
        let node = network.add_node();
        for i in 0..5 {
            network
                .face(node)
                .unwrap()
                .express_query(name(&format!("/q/{i}")), Duration::from_millis(10));
        }
        let names: Vec<String> = network
            .query_log()
            .iter()
            .map(|record| record.name.to_string())
            .collect();
        assert_eq!(names, vec!["/q/2", "/q/3", "/q/4"]);

        let mut quiet = MemoryNetwork::new().with_query_log_capacity(0);
        let node = quiet.add_node();
        quiet
            .face(node)
            .unwrap()
            .express_query(name("/q"), Duration::from_millis(10));
        assert!(quiet.query_log().is_empty());
    }

    #[test]
    fn test_expired_cache_entries_are_dropped() {
        let mut network = MemoryNetwork::new();
        let origin = network.add_node();
        let server = network.add_node();
        network.face(server).unwrap().register_prefix(name("/svc"));
        for i in 0..3 {
            network.face(server).unwrap().put_response(Response::new(
                name(&format!("/svc/{i}")),
                &b"old"[..],
                Duration::from_millis(100),
            ));
        }
        assert_eq!(network.cache_len(server), 3);

        drain(&mut network, 200);
        network.face(server).unwrap().put_response(Response::new(
            name("/svc/new"),
            &b"new"[..],
            Duration::from_millis(100),
        ));
        assert_eq!(network.cache_len(server), 1);

        drain(&mut network, 400);
        network
            .face(origin)
            .unwrap()
            .express_query(name("/svc/other"), Duration::from_millis(50));
        drain(&mut network, 400);
        assert_eq!(network.cache_len(server), 0);
    }
}
