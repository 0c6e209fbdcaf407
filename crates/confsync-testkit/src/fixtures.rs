//! Test fixtures and helpers.
//!
//! Common setup code for multi-peer scenarios.

use std::collections::BTreeMap;
use std::time::Duration;

use confsync::{
    Cluster, ConferenceDiscovery, DiscoveryConfig, Notification, NotificationKind,
    NotificationLog,
};
use confsync_core::{ConferenceInfo, ConferenceMetadata, Millis, Name, NodeId};
use confsync_face::MemoryNetwork;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One peer in a [`TestCluster`].
#[derive(Debug, Clone)]
pub struct TestPeer {
    pub node: NodeId,
    /// Local prefix its conferences are published under.
    pub prefix: Name,
    /// Everything its engine reported.
    pub log: NotificationLog,
}

/// A cluster of peers with predictable prefixes and recorded
/// notifications.
pub struct TestCluster {
    pub cluster: Cluster,
    pub peers: Vec<TestPeer>,
}

impl TestCluster {
    /// `count` peers with default configuration. None is started.
    pub fn new(count: usize) -> Self {
        Self::with_config(count, DiscoveryConfig::default())
    }

    pub fn with_config(count: usize, config: DiscoveryConfig) -> Self {
        Self::with_network(count, MemoryNetwork::new(), config)
    }

    pub fn with_network(count: usize, network: MemoryNetwork, config: DiscoveryConfig) -> Self {
        let mut cluster = Cluster::with_network(network, config);
        let peers = (0..count)
            .map(|i| {
                let log = NotificationLog::new();
                let node = cluster.add_peer_with_observer(Box::new(log.clone()));
                TestPeer {
                    node,
                    prefix: peer_prefix(i),
                    log,
                }
            })
            .collect();
        Self { cluster, peers }
    }

    /// Start every peer.
    pub fn start_all(&mut self) {
        self.cluster.start_all().expect("peers start");
    }

    pub fn start(&mut self, peer: usize) {
        let node = self.peers[peer].node;
        self.cluster.start(node).expect("peer starts");
    }

    pub fn node(&self, peer: usize) -> NodeId {
        self.peers[peer].node
    }

    pub fn engine(&self, peer: usize) -> &ConferenceDiscovery {
        self.cluster.peer(self.node(peer)).expect("peer exists")
    }

    /// Full name conference `name` gets when `peer` publishes it.
    pub fn full_name(&self, peer: usize, name: &str) -> Name {
        self.peers[peer].prefix.child(name).expect("valid conference name")
    }

    pub fn publish(&mut self, peer: usize, name: &str, metadata: ConferenceMetadata) -> bool {
        let TestPeer { node, prefix, .. } = &self.peers[peer];
        self.cluster
            .publish_conference(*node, name, prefix, metadata)
            .expect("peer exists")
    }

    pub fn stop(&mut self, peer: usize, name: &str) -> bool {
        let TestPeer { node, prefix, .. } = &self.peers[peer];
        self.cluster
            .stop_publishing_conference(*node, name, prefix)
            .expect("peer exists")
    }

    pub fn shutdown(&mut self, peer: usize) {
        let node = self.node(peer);
        self.cluster.shutdown(node).expect("peer exists");
    }

    pub fn discovered(&self, peer: usize) -> BTreeMap<String, ConferenceInfo> {
        self.engine(peer).discovered_conferences()
    }

    pub fn hosted(&self, peer: usize) -> BTreeMap<String, ConferenceInfo> {
        self.engine(peer).hosted_conferences()
    }

    /// Notifications of one kind reported by `peer`.
    pub fn notifications(&self, peer: usize, kind: NotificationKind) -> Vec<Notification> {
        self.peers[peer].log.of_kind(kind)
    }

    pub fn run_until(&mut self, deadline: Millis) {
        self.cluster.run_until(deadline);
    }

    pub fn run_for(&mut self, duration: Duration) {
        self.cluster.run_for(duration);
    }

    pub fn now(&self) -> Millis {
        self.cluster.now()
    }

    /// True if no peer lists one conference name as both hosted and
    /// discovered.
    pub fn maps_disjoint(&self) -> bool {
        self.cluster.peers().all(|(_, engine)| {
            let hosted = engine.hosted_conferences();
            engine
                .discovered_conferences()
                .keys()
                .all(|name| !hosted.contains_key(name))
        })
    }

    /// Times at which queries for `full_name` were sent.
    pub fn liveness_queries(&self, full_name: &Name) -> Vec<Millis> {
        self.cluster
            .network()
            .query_log()
            .iter()
            .filter(|record| &record.name == full_name)
            .map(|record| record.at)
            .collect()
    }
}

/// Local prefix of the `i`th peer: `/ndn/peer<i>`.
pub fn peer_prefix(i: usize) -> Name {
    Name::root()
        .child("ndn")
        .and_then(|ndn| ndn.child(&format!("peer{i}")))
        .expect("valid prefix")
}

/// Metadata with a description and an organizer.
pub fn metadata(description: &str) -> ConferenceMetadata {
    ConferenceMetadata::new(description).organizer("testkit")
}

/// `count` distinct conference names drawn from a seeded generator.
pub fn conference_names(seed: u64, count: usize) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut names = Vec::with_capacity(count);
    while names.len() < count {
        let name = format!("conf-{:06x}", rng.gen::<u32>() & 0xff_ffff);
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}
