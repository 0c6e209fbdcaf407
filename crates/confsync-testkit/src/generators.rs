//! Proptest generators for property-based testing.

use proptest::prelude::*;

use confsync_core::ConferenceMetadata;

/// Generate a conference name (a single name component).
pub fn conference_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}".prop_map(String::from)
}

/// Generate a full object name such as `/ndn/peer3/weekly`.
pub fn object_name() -> impl Strategy<Value = String> {
    ("[a-z]{1,8}", "[a-z0-9]{1,8}", conference_name())
        .prop_map(|(root, peer, conference)| format!("/{root}/{peer}/{conference}"))
}

/// Generate a list of object names, possibly with repeats.
pub fn object_list(max_len: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(object_name(), 0..=max_len)
}

/// Generate a list together with a shuffled copy of it.
pub fn shuffled_pair(max_len: usize) -> impl Strategy<Value = (Vec<String>, Vec<String>)> {
    object_list(max_len).prop_flat_map(|list| (Just(list.clone()), Just(list).prop_shuffle()))
}

/// Generate conference metadata.
pub fn metadata() -> impl Strategy<Value = ConferenceMetadata> {
    (
        ".{0,40}",
        proptest::option::of("[a-z]{1,12}"),
        proptest::option::of(0u64..=1_800_000_000_000u64),
        prop::collection::btree_map("[a-z]{1,6}", "[a-z0-9]{0,10}", 0..4),
    )
        .prop_map(|(description, organizer, started_at, attributes)| ConferenceMetadata {
            description,
            organizer,
            started_at,
            attributes,
        })
}

/// Parameters for a set and an object outside it.
#[derive(Debug, Clone)]
pub struct SetParams {
    pub objects: Vec<String>,
    pub extra: String,
}

impl Arbitrary for SetParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (object_list(16), object_name())
            .prop_filter("extra must be new", |(objects, extra)| !objects.contains(extra))
            .prop_map(|(objects, extra)| SetParams { objects, extra })
            .boxed()
    }
}

/// One step of a random publish/stop workload.
#[derive(Debug, Clone)]
pub enum Op {
    Publish { peer: usize, name: String },
    Stop { peer: usize, name: String },
    Wait { millis: u64 },
}

/// Generate a workload over `peers` peers and a small pool of names, so
/// collisions between peers are common.
pub fn ops(peers: usize, max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    let name = prop_oneof![Just("alpha"), Just("beta"), Just("gamma")].prop_map(String::from);
    let op = prop_oneof![
        (0..peers, name.clone()).prop_map(|(peer, name)| Op::Publish { peer, name }),
        (0..peers, name).prop_map(|(peer, name)| Op::Stop { peer, name }),
        (0u64..3000).prop_map(|millis| Op::Wait { millis }),
    ];
    prop::collection::vec(op, 0..=max_len)
}
