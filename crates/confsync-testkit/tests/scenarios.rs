//! Multi-peer discovery scenarios on the in-memory network.
//!
//! Every timeline here runs with zero latency and default timing:
//! liveness probes every 2000 ms, 2000 ms query lifetime, 3000 ms keep
//! period.

use std::time::Duration;

use confsync::{DiscoveryConfig, NotificationKind, DEFAULT_BROADCAST_PREFIX};
use confsync_core::{LivenessReply, Name};
use confsync_face::{Face, FaceEvent, MemoryNetwork, Response};
use confsync_testkit::fixtures::{conference_names, metadata, peer_prefix, TestCluster};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn name(uri: &str) -> Name {
    Name::parse(uri).unwrap()
}

fn broadcast_prefix() -> Name {
    name(DEFAULT_BROADCAST_PREFIX)
}

// ─────────────────────────────────────────────────────────────────────────────
// Discovery
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_late_newcomer_learns_everything_at_once() {
    init_tracing();
    let mut cluster = TestCluster::new(2);
    cluster.start(0);
    assert!(cluster.publish(0, "a", metadata("first")));
    assert!(cluster.publish(0, "b", metadata("second")));
    cluster.run_until(1000);
    assert!(cluster.discovered(1).is_empty());

    cluster.start(1);
    cluster.run_until(1000);

    let found = cluster.discovered(1);
    assert_eq!(found.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(found["a"].metadata().description, "first");
    assert_eq!(found["b"].full_name(), &cluster.full_name(0, "b"));
    let discovered = cluster.notifications(1, NotificationKind::ConferenceDiscovered);
    assert_eq!(discovered.len(), 2);
    assert!(discovered.iter().all(|n| n.timestamp == 1000));
}

#[test]
fn test_parked_query_answered_when_set_changes() {
    let mut cluster = TestCluster::new(2);
    cluster.start_all();
    cluster.run_until(400);
    assert_eq!(cluster.engine(0).sync().pending_len(), 1);

    cluster.publish(0, "weekly", metadata("planning"));
    cluster.run_until(500);
    let discovered = cluster.notifications(1, NotificationKind::ConferenceDiscovered);
    assert_eq!(discovered.len(), 1);
    assert_eq!(discovered[0].timestamp, 400);
    assert_eq!(cluster.engine(0).sync().pending_len(), 0);
}

#[test]
fn test_expired_parked_query_not_answered() {
    let mut cluster = TestCluster::new(1);
    let observer = cluster.cluster.add_observer_node();
    cluster.start_all();

    let discovery = broadcast_prefix().child("00").unwrap();
    let short = cluster
        .cluster
        .express_query(observer, discovery.clone(), Duration::from_millis(300))
        .unwrap();
    let long = cluster
        .cluster
        .express_query(observer, discovery, Duration::from_millis(2000))
        .unwrap();

    cluster.run_until(500);
    cluster.publish(0, "weekly", metadata("planning"));
    cluster.run_until(600);

    let events = cluster.cluster.take_events(observer);
    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[0],
        (300, FaceEvent::Timeout { query, .. }) if *query == short
    ));
    match &events[1] {
        (500, FaceEvent::Response { query, response }) => {
            assert_eq!(*query, long);
            assert_eq!(&response.content[..], b"/ndn/peer0/weekly\n");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn test_three_peers_converge() {
    init_tracing();
    let mut cluster = TestCluster::new(3);
    cluster.start_all();
    cluster.publish(0, "alpha", metadata("a"));
    cluster.publish(1, "beta", metadata("b"));
    cluster.publish(2, "gamma", metadata("c"));
    cluster.run_until(20_000);

    for peer in 0..3 {
        assert_eq!(cluster.discovered(peer).len(), 2, "peer {peer}");
        assert_eq!(cluster.hosted(peer).len(), 1);
        assert_eq!(cluster.engine(peer).objects().len(), 3);
    }
    let digest = cluster.engine(0).digest();
    assert_eq!(cluster.engine(1).digest(), digest);
    assert_eq!(cluster.engine(2).digest(), digest);
    assert!(cluster.maps_disjoint());
}

#[test]
fn test_many_conferences_converge_and_end() {
    init_tracing();
    const PEERS: usize = 4;
    let names = conference_names(42, 12);
    let mut cluster = TestCluster::new(PEERS);
    cluster.start_all();
    for (i, conference) in names.iter().enumerate() {
        assert!(cluster.publish(i % PEERS, conference, metadata(conference)));
    }
    cluster.run_until(30_000);

    for peer in 0..PEERS {
        assert_eq!(cluster.hosted(peer).len(), 3, "peer {peer}");
        assert_eq!(cluster.discovered(peer).len(), 9, "peer {peer}");
        assert_eq!(cluster.engine(peer).digest(), cluster.engine(0).digest());
    }

    for conference in names.iter().step_by(PEERS) {
        assert!(cluster.stop(0, conference));
    }
    cluster.run_until(40_000);

    for peer in 1..PEERS {
        let discovered = cluster.discovered(peer);
        assert_eq!(discovered.len(), 6, "peer {peer}");
        assert!(names.iter().step_by(PEERS).all(|gone| !discovered.contains_key(gone)));
        assert_eq!(cluster.notifications(peer, NotificationKind::ConferenceEnded).len(), 3);
    }
    assert!(cluster.maps_disjoint());
}

// ─────────────────────────────────────────────────────────────────────────────
// Liveness
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_heartbeat_every_interval() {
    let mut cluster = TestCluster::new(2);
    cluster.start_all();
    cluster.publish(0, "weekly", metadata("planning"));
    let full = cluster.full_name(0, "weekly");

    cluster.run_until(1999);
    assert_eq!(cluster.liveness_queries(&full), vec![0]);
    cluster.run_until(2000);
    assert_eq!(cluster.liveness_queries(&full), vec![0, 2000]);
    cluster.run_until(6000);
    assert_eq!(cluster.liveness_queries(&full), vec![0, 2000, 4000, 6000]);
    assert!(cluster.notifications(1, NotificationKind::ConferenceEnded).is_empty());
}

#[test]
fn test_single_timeout_ends_conference() {
    let mut cluster = TestCluster::new(2);
    cluster.start_all();
    cluster.publish(0, "weekly", metadata("planning"));
    cluster.run_until(2100);
    cluster.shutdown(0);

    // The 4000 probe finds no route and lapses at 6000.
    cluster.run_until(5999);
    assert!(cluster.discovered(1).contains_key("weekly"));
    cluster.run_until(6000);
    assert!(cluster.discovered(1).is_empty());

    let ended = cluster.notifications(1, NotificationKind::ConferenceEnded);
    assert_eq!(ended.len(), 1);
    assert_eq!(ended[0].timestamp, 6000);
    assert!(!cluster.engine(1).objects().contains("/ndn/peer0/weekly"));
}

#[test]
fn test_graceful_stop_answers_ended_then_withdraws() {
    let mut cluster = TestCluster::new(1);
    let observer = cluster.cluster.add_observer_node();
    cluster.start_all();
    cluster.publish(0, "weekly", metadata("planning"));
    cluster.run_until(500);
    assert!(cluster.stop(0, "weekly"));
    assert_eq!(cluster.engine(0).retiring_conferences(), vec!["weekly"]);
    assert!(cluster.engine(0).objects().is_empty());

    let full = cluster.full_name(0, "weekly");
    cluster.run_until(1000);
    cluster
        .cluster
        .express_query(observer, full.clone(), Duration::from_millis(1000))
        .unwrap();
    cluster.run_until(1000);
    match cluster.cluster.take_events(observer).as_slice() {
        [(1000, FaceEvent::Response { response, .. })] => {
            assert_eq!(
                LivenessReply::decode(&response.content).unwrap(),
                LivenessReply::Ended
            );
        }
        other => panic!("unexpected events {other:?}"),
    }

    // Withdrawn at 3500.
    cluster.run_until(3600);
    assert!(cluster.engine(0).retiring_conferences().is_empty());
    assert_eq!(
        cluster.cluster.network().registrations(cluster.node(0)),
        vec![broadcast_prefix()]
    );
    cluster
        .cluster
        .express_query(observer, full, Duration::from_millis(500))
        .unwrap();
    cluster.run_until(4100);
    assert!(matches!(
        cluster.cluster.take_events(observer).as_slice(),
        [(4100, FaceEvent::Timeout { .. })]
    ));
}

#[test]
fn test_discovering_peer_sees_ended_marker() {
    let mut cluster = TestCluster::new(2);
    cluster.start_all();
    cluster.publish(0, "weekly", metadata("planning"));
    cluster.run_until(100);
    cluster.stop(0, "weekly");

    cluster.run_until(2000);
    let ended = cluster.notifications(1, NotificationKind::ConferenceEnded);
    assert_eq!(ended.len(), 1);
    assert_eq!(ended[0].timestamp, 2000);
    assert!(cluster.discovered(1).is_empty());
    assert!(cluster.engine(1).queried_names().is_empty());
}

#[test]
fn test_republish_during_keep_period() {
    let mut cluster = TestCluster::new(2);
    cluster.start_all();
    cluster.publish(0, "weekly", metadata("planning"));
    cluster.run_until(100);
    assert!(cluster.stop(0, "weekly"));
    cluster.run_until(500);
    assert!(cluster.publish(0, "weekly", metadata("planning again")));
    assert!(cluster.engine(0).retiring_conferences().is_empty());

    cluster.run_until(10_000);
    assert!(cluster.notifications(1, NotificationKind::ConferenceEnded).is_empty());
    assert_eq!(
        cluster.discovered(1)["weekly"].metadata().description,
        "planning again"
    );
    assert_eq!(cluster.cluster.network().registrations(cluster.node(0)).len(), 2);
}

#[test]
fn test_malformed_liveness_reply_counts_as_ongoing() {
    init_tracing();
    let mut cluster = TestCluster::new(1);
    let rogue = cluster.cluster.add_observer_node();
    {
        let mut face = cluster.cluster.network_mut().face(rogue).unwrap();
        face.register_prefix(broadcast_prefix());
        face.register_prefix(name("/ndn/rogue"));
    }
    cluster.start(0);
    cluster.run_until(0);

    let discovery = match cluster.cluster.take_events(rogue).as_slice() {
        [(0, FaceEvent::Query { query, .. })] => query.name.clone(),
        other => panic!("unexpected events {other:?}"),
    };
    cluster
        .cluster
        .network_mut()
        .face(rogue)
        .unwrap()
        .put_response(Response::new(discovery, &b"/ndn/rogue/party\n"[..], Duration::ZERO));
    cluster.run_until(0);

    let probe = cluster
        .cluster
        .take_events(rogue)
        .into_iter()
        .find_map(|(_, event)| match event {
            FaceEvent::Query { query, .. } if query.name == name("/ndn/rogue/party") => {
                Some(query.name)
            }
            _ => None,
        })
        .expect("liveness probe reached the rogue");
    cluster
        .cluster
        .network_mut()
        .face(rogue)
        .unwrap()
        .put_response(Response::new(probe, &b"\xffnot cbor"[..], Duration::ZERO));
    cluster.run_until(0);

    let found = cluster.discovered(0);
    assert_eq!(found["party"].metadata().description, "");
    assert_eq!(found["party"].prefix(), &name("/ndn/rogue"));

    // The rogue stays silent from here on.
    cluster.run_until(4000);
    let ended = cluster.notifications(0, NotificationKind::ConferenceEnded);
    assert_eq!(ended.len(), 1);
    assert_eq!(ended[0].timestamp, 4000);
}

// ─────────────────────────────────────────────────────────────────────────────
// Publishing
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_same_name_on_two_hosts_stays_exclusive() {
    let mut cluster = TestCluster::new(3);
    cluster.start_all();
    assert!(cluster.publish(0, "weekly", metadata("zero")));
    assert!(cluster.publish(1, "weekly", metadata("one")));
    cluster.run_until(10_000);

    assert!(cluster.maps_disjoint());
    assert!(cluster.discovered(0).is_empty());
    assert!(cluster.discovered(1).is_empty());
    let seen = cluster.discovered(2);
    assert_eq!(seen.len(), 1);
    let prefix = seen["weekly"].prefix().clone();
    assert!(prefix == peer_prefix(0) || prefix == peer_prefix(1));
}

#[test]
fn test_publish_rejects_known_names() {
    let mut cluster = TestCluster::new(2);
    cluster.start_all();
    assert!(cluster.publish(0, "weekly", metadata("planning")));
    assert!(!cluster.publish(0, "weekly", metadata("planning")));
    cluster.run_until(100);

    assert!(!cluster.publish(1, "weekly", metadata("mine")));
    assert!(cluster.hosted(1).is_empty());
    assert!(!cluster.stop(1, "weekly"));
    assert!(!cluster.publish(0, "bad/name", metadata("slash")));
}

#[test]
fn test_refused_conference_prefix_reports_add_failed() {
    let mut network = MemoryNetwork::new();
    network.deny_prefix(peer_prefix(0));
    let mut cluster = TestCluster::with_network(2, network, DiscoveryConfig::default());
    cluster.start_all();
    assert!(cluster.publish(0, "weekly", metadata("planning")));
    cluster.run_until(0);

    let failed = cluster.notifications(0, NotificationKind::ConferenceAddFailed);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].timestamp, 0);
    assert!(cluster.hosted(0).is_empty());
    assert!(cluster.engine(0).objects().is_empty());

    cluster.run_until(5000);
    assert!(cluster.discovered(1).is_empty());
    assert!(cluster.peers[1].log.snapshot().is_empty());
}

#[test]
fn test_refused_broadcast_prefix_reports_discovery_failed() {
    let mut network = MemoryNetwork::new();
    network.deny_prefix(broadcast_prefix());
    let mut cluster = TestCluster::with_network(1, network, DiscoveryConfig::default());
    cluster.start_all();
    cluster.run_until(0);

    let failed = cluster.notifications(0, NotificationKind::DiscoveryFailed);
    assert_eq!(failed.len(), 1);
    assert!(failed[0].message.contains(DEFAULT_BROADCAST_PREFIX));
}

#[test]
fn test_shutdown_withdraws_everything() {
    let mut cluster = TestCluster::new(2);
    cluster.start_all();
    cluster.publish(0, "weekly", metadata("planning"));
    cluster.run_until(100);
    cluster.shutdown(0);

    assert!(cluster.cluster.network().registrations(cluster.node(0)).is_empty());
    assert_eq!(cluster.hosted(0).len(), 1);
    assert!(!cluster.publish(0, "other", metadata("late")));
}
