//! The synchronized object set.
//!
//! For conference discovery each object is the full name of a live
//! conference (`/ndn/alice/weekly`), kept as its URI string.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::payload::{decode_object_list, encode_object_list};

/// Sorted, duplicate-free set of object names.
///
/// Ordering only exists to keep the digest stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectSet {
    objects: BTreeSet<String>,
}

impl ObjectSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a set from an object-list payload.
    pub fn from_payload(bytes: &[u8]) -> Result<Self> {
        Ok(decode_object_list(bytes)?.into_iter().collect())
    }

    /// Insert an object.
    ///
    /// Returns false if the name is empty, contains a newline, or is
    /// already present.
    pub fn insert(&mut self, object: &str) -> bool {
        if object.is_empty() || object.contains('\n') {
            return false;
        }
        self.objects.insert(object.to_string())
    }

    /// Remove an object. Returns false if it was not present.
    pub fn remove(&mut self, object: &str) -> bool {
        self.objects.remove(object)
    }

    /// Check membership.
    pub fn contains(&self, object: &str) -> bool {
        self.objects.contains(object)
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True if the set holds nothing.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.objects.iter().map(String::as_str)
    }

    /// Objects in sorted order, owned.
    pub fn to_vec(&self) -> Vec<String> {
        self.objects.iter().cloned().collect()
    }

    /// True if `objects` names exactly the members of this set.
    ///
    /// `objects` must be sorted and duplicate-free, as produced by
    /// [`decode_object_list`].
    pub fn matches(&self, objects: &[String]) -> bool {
        self.objects.len() == objects.len() && self.objects.iter().eq(objects.iter())
    }

    /// Encode as an object-list payload.
    pub fn to_payload(&self) -> Vec<u8> {
        encode_object_list(self.iter())
    }
}

impl FromIterator<String> for ObjectSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = Self::new();
        for object in iter {
            set.insert(&object);
        }
        set
    }
}

impl<'a> FromIterator<&'a str> for ObjectSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = Self::new();
        for object in iter {
            set.insert(object);
        }
        set
    }
}
