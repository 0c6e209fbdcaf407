//! Object-list payload vectors.
//!
//! The payload is what the digest is computed over, so every
//! implementation must produce these exact bytes.

use confsync_core::{decode_object_list, Digest, ObjectSet};
use serde::Serialize;

/// One payload vector.
#[derive(Debug, Clone, Serialize)]
pub struct PayloadVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Objects in insertion order, possibly unsorted or repeated.
    pub objects: &'static [&'static str],
    /// Expected payload (hex).
    pub payload_hex: &'static str,
    /// Whether the set is empty and so carries the newcomer digest.
    pub newcomer: bool,
}

/// Get all payload vectors.
pub fn all_vectors() -> Vec<PayloadVector> {
    vec![
        PayloadVector {
            name: "empty set",
            objects: &[],
            payload_hex: "",
            newcomer: true,
        },
        PayloadVector {
            name: "single conference",
            objects: &["/ndn/alice/weekly"],
            payload_hex: "2f6e646e2f616c6963652f7765656b6c790a",
            newcomer: false,
        },
        PayloadVector {
            name: "unsorted insertion",
            objects: &["/b/y", "/a/x"],
            payload_hex: "2f612f780a2f622f790a",
            newcomer: false,
        },
        PayloadVector {
            name: "repeated insertion",
            objects: &["/a/x", "/a/x"],
            payload_hex: "2f612f780a",
            newcomer: false,
        },
    ]
}

/// Check one vector. Returns a description of the first mismatch.
pub fn verify_vector(vector: &PayloadVector) -> Result<(), String> {
    let set: ObjectSet = vector.objects.iter().copied().collect();
    let payload = set.to_payload();
    let actual = hex::encode(&payload);
    if actual != vector.payload_hex {
        return Err(format!(
            "{}: payload {} != expected {}",
            vector.name, actual, vector.payload_hex
        ));
    }

    let decoded = decode_object_list(&payload).map_err(|e| format!("{}: {e}", vector.name))?;
    if !set.matches(&decoded) {
        return Err(format!("{}: decoded list differs from set", vector.name));
    }

    let digest = Digest::of(&set);
    if digest.is_newcomer() != vector.newcomer {
        return Err(format!("{}: unexpected digest {digest}", vector.name));
    }
    if digest != Digest::of_payload(&payload) {
        return Err(format!("{}: digest depends on more than the payload", vector.name));
    }
    Ok(())
}

/// Check every vector.
pub fn verify_all_vectors() -> Result<(), String> {
    all_vectors().iter().try_for_each(verify_vector)
}

/// All vectors as pretty JSON, for export to other implementations.
pub fn vectors_json() -> serde_json::Result<String> {
    serde_json::to_string_pretty(&all_vectors())
}
