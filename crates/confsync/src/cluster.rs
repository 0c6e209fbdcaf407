//! Several discovery engines sharing one in-memory network.
//!
//! The cluster is the driving loop: it polls the network and hands each
//! event to the engine running on the addressed node, one at a time.
//! Nodes without an engine can be added as observers; they record raw
//! events so tests can act as a plain transport client.

use std::collections::BTreeMap;
use std::time::Duration;

use confsync_core::{ConferenceInfo, ConferenceMetadata, Millis, Name, NodeId, QueryId};
use confsync_face::{Face, FaceEvent, MemoryNetwork};
use tracing::trace;

use crate::config::DiscoveryConfig;
use crate::engine::ConferenceDiscovery;
use crate::error::{DiscoveryError, Result};
use crate::observer::{ConferenceObserver, TracingObserver};

/// A set of peers on one [`MemoryNetwork`].
pub struct Cluster {
    network: MemoryNetwork,
    config: DiscoveryConfig,
    peers: BTreeMap<NodeId, ConferenceDiscovery>,
    observers: BTreeMap<NodeId, Vec<(Millis, FaceEvent)>>,
}

impl Cluster {
    /// Empty cluster on a fresh network.
    pub fn new(config: DiscoveryConfig) -> Self {
        Self::with_network(MemoryNetwork::new(), config)
    }

    /// Empty cluster on an existing network.
    pub fn with_network(network: MemoryNetwork, config: DiscoveryConfig) -> Self {
        Self {
            network,
            config,
            peers: BTreeMap::new(),
            observers: BTreeMap::new(),
        }
    }

    /// Add a peer that logs its notifications.
    pub fn add_peer(&mut self) -> NodeId {
        self.add_peer_with_observer(Box::new(TracingObserver))
    }

    /// Add a peer reporting to `observer`.
    pub fn add_peer_with_observer(&mut self, observer: Box<dyn ConferenceObserver + Send>) -> NodeId {
        let node = self.network.add_node();
        let engine = ConferenceDiscovery::with_observer(self.config.clone(), observer);
        self.peers.insert(node, engine);
        node
    }

    /// Add a node with no engine that records every event it receives.
    pub fn add_observer_node(&mut self) -> NodeId {
        let node = self.network.add_node();
        self.observers.insert(node, Vec::new());
        node
    }

    /// Events recorded by an observer node since the last call.
    pub fn take_events(&mut self, node: NodeId) -> Vec<(Millis, FaceEvent)> {
        self.observers
            .get_mut(&node)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Send a raw query from an observer node.
    pub fn express_query(&mut self, node: NodeId, name: Name, lifetime: Duration) -> Result<QueryId> {
        let mut face = self.network.face(node)?;
        Ok(face.express_query(name, lifetime))
    }

    pub fn start(&mut self, node: NodeId) -> Result<()> {
        let (engine, mut face) = self.engine_and_face(node)?;
        engine.start(&mut face)
    }

    /// Start every peer.
    pub fn start_all(&mut self) -> Result<()> {
        let nodes: Vec<NodeId> = self.peers.keys().copied().collect();
        for node in nodes {
            self.start(node)?;
        }
        Ok(())
    }

    pub fn publish_conference(
        &mut self,
        node: NodeId,
        name: &str,
        local_prefix: &Name,
        metadata: ConferenceMetadata,
    ) -> Result<bool> {
        let (engine, mut face) = self.engine_and_face(node)?;
        Ok(engine.publish_conference(&mut face, name, local_prefix, metadata))
    }

    pub fn stop_publishing_conference(
        &mut self,
        node: NodeId,
        name: &str,
        prefix: &Name,
    ) -> Result<bool> {
        let (engine, mut face) = self.engine_and_face(node)?;
        Ok(engine.stop_publishing_conference(&mut face, name, prefix))
    }

    pub fn shutdown(&mut self, node: NodeId) -> Result<()> {
        let (engine, mut face) = self.engine_and_face(node)?;
        engine.shutdown(&mut face);
        Ok(())
    }

    /// Process the next event, however far ahead. Returns false when
    /// nothing is scheduled.
    pub fn step(&mut self) -> bool {
        match self.network.poll_next() {
            Some((node, event)) => {
                self.dispatch(node, event);
                true
            }
            None => false,
        }
    }

    /// Process every event due up to `deadline` and move the clock there.
    pub fn run_until(&mut self, deadline: Millis) {
        while let Some((node, event)) = self.network.poll_until(deadline) {
            self.dispatch(node, event);
        }
    }

    /// Advance the clock by `duration`.
    pub fn run_for(&mut self, duration: Duration) {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self.run_until(self.now().saturating_add(millis));
    }

    fn dispatch(&mut self, node: NodeId, event: FaceEvent) {
        let now = self.network.now();
        if let Some(engine) = self.peers.get_mut(&node) {
            if let Ok(mut face) = self.network.face(node) {
                engine.handle_event(&mut face, event);
            }
        } else if let Some(events) = self.observers.get_mut(&node) {
            events.push((now, event));
        } else {
            trace!(%node, "dropping event for idle node");
        }
    }

    fn engine_and_face(
        &mut self,
        node: NodeId,
    ) -> Result<(&mut ConferenceDiscovery, confsync_face::MemoryFace<'_>)> {
        let engine = self
            .peers
            .get_mut(&node)
            .ok_or(DiscoveryError::UnknownPeer(node))?;
        let face = self.network.face(node)?;
        Ok((engine, face))
    }

    pub fn peer(&self, node: NodeId) -> Result<&ConferenceDiscovery> {
        self.peers.get(&node).ok_or(DiscoveryError::UnknownPeer(node))
    }

    pub fn peers(&self) -> impl Iterator<Item = (NodeId, &ConferenceDiscovery)> {
        self.peers.iter().map(|(node, engine)| (*node, engine))
    }

    pub fn discovered(&self, node: NodeId) -> Result<BTreeMap<String, ConferenceInfo>> {
        Ok(self.peer(node)?.discovered_conferences())
    }

    pub fn hosted(&self, node: NodeId) -> Result<BTreeMap<String, ConferenceInfo>> {
        Ok(self.peer(node)?.hosted_conferences())
    }

    pub fn now(&self) -> Millis {
        self.network.now()
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.network.next_deadline()
    }

    pub fn network(&self) -> &MemoryNetwork {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut MemoryNetwork {
        &mut self.network
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }
}
