//! Object-set digests.
//!
//! A digest is Blake3 over the object-list payload of a set. The empty set
//! never hashes: it is the newcomer digest `00`, which no real hash can
//! render to (hashes render as 64 hex characters). A peer that knows
//! nothing queries with `00`, and every peer holding anything sees a
//! different digest and answers with its full list.

use std::fmt;

use crate::error::{CoreError, Result};
use crate::name::Name;
use crate::object_set::ObjectSet;

/// Wire form of the newcomer digest.
pub const NEWCOMER_DIGEST: &str = "00";

/// Summary of an [`ObjectSet`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Digest {
    /// The empty set.
    Newcomer,
    /// Blake3 of a non-empty object-list payload.
    Hash([u8; 32]),
}

impl Digest {
    /// Digest of `objects`.
    pub fn of(objects: &ObjectSet) -> Self {
        Self::of_payload(&objects.to_payload())
    }

    /// Digest of an encoded object list.
    pub fn of_payload(payload: &[u8]) -> Self {
        if payload.is_empty() {
            Digest::Newcomer
        } else {
            Digest::Hash(*blake3::hash(payload).as_bytes())
        }
    }

    /// Parse the wire form carried as the last component of a query name.
    pub fn parse(s: &str) -> Result<Self> {
        if s == NEWCOMER_DIGEST {
            return Ok(Digest::Newcomer);
        }
        let bytes = hex::decode(s).map_err(|_| CoreError::InvalidDigest(s.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidDigest(s.to_string()))?;
        Ok(Digest::Hash(arr))
    }

    /// True for the newcomer sentinel.
    pub fn is_newcomer(&self) -> bool {
        matches!(self, Digest::Newcomer)
    }

    /// The discovery query name for this digest under `prefix`.
    pub fn query_name(&self, prefix: &Name) -> Name {
        let mut name = prefix.clone();
        name.push_trusted(self.to_string());
        name
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Digest::Newcomer => f.write_str(NEWCOMER_DIGEST),
            Digest::Hash(bytes) => f.write_str(&hex::encode(bytes)),
        }
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Digest::Newcomer => f.write_str("Digest(newcomer)"),
            Digest::Hash(bytes) => write!(f, "Digest({})", &hex::encode(bytes)[..16]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn object_names() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("/[a-z]{1,6}(/[a-z0-9]{1,6}){0,2}", 0..12)
    }

    #[test]
    fn test_empty_set_is_newcomer() {
        assert_eq!(Digest::of(&ObjectSet::new()), Digest::Newcomer);
        assert_eq!(Digest::Newcomer.to_string(), "00");
    }

    #[test]
    fn test_non_empty_set_hashes() {
        let set: ObjectSet = ["/a"].into_iter().collect();
        let digest = Digest::of(&set);
        assert!(!digest.is_newcomer());
        assert_eq!(digest.to_string().len(), 64);
    }

    #[test]
    fn test_parse_wire_forms() {
        assert_eq!(Digest::parse("00").unwrap(), Digest::Newcomer);

        let set: ObjectSet = ["/a", "/b"].into_iter().collect();
        let digest = Digest::of(&set);
        assert_eq!(Digest::parse(&digest.to_string()).unwrap(), digest);

        assert!(Digest::parse("").is_err());
        assert!(Digest::parse("zz").is_err());
        assert!(Digest::parse("abcd").is_err());
    }

    #[test]
    fn test_query_name() {
        let prefix = Name::parse("/ndn/broadcast").unwrap();
        let name = Digest::Newcomer.query_name(&prefix);
        assert_eq!(name.to_string(), "/ndn/broadcast/00");
    }

    proptest! {
        #[test]
        fn digest_ignores_insertion_order(names in object_names()) {
            let forward: ObjectSet = names.iter().map(String::as_str).collect();
            let backward: ObjectSet = names.iter().rev().map(String::as_str).collect();
            prop_assert_eq!(Digest::of(&forward), Digest::of(&backward));
        }

        #[test]
        fn digest_changes_when_object_added(
            names in object_names(),
            extra in "/[a-z]{1,6}/extra[0-9]{1,3}",
        ) {
            let set: ObjectSet = names.iter().map(String::as_str).collect();
            prop_assume!(!set.contains(&extra));
            let mut bigger = set.clone();
            bigger.insert(&extra);
            prop_assert_ne!(Digest::of(&set), Digest::of(&bigger));
        }

        #[test]
        fn digest_round_trips_through_wire_form(names in object_names()) {
            let set: ObjectSet = names.iter().map(String::as_str).collect();
            let digest = Digest::of(&set);
            prop_assert_eq!(Digest::parse(&digest.to_string()).unwrap(), digest);
        }
    }
}
