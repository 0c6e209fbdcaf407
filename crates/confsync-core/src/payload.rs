//! Object-list payload codec.
//!
//! Format: each object name followed by `\n`, names in sorted order. The
//! empty set encodes to zero bytes. The digest is computed over these
//! exact bytes, which keeps it independent of insertion order.

use crate::error::{CoreError, Result};

/// Encode object names, each newline-terminated, in the order given.
///
/// Callers pass sorted names; [`crate::ObjectSet::to_payload`] does.
pub fn encode_object_list<'a, I>(objects: I) -> Vec<u8>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut buf = Vec::new();
    for object in objects {
        buf.extend_from_slice(object.as_bytes());
        buf.push(b'\n');
    }
    buf
}

/// Decode a payload into a sorted, duplicate-free list of object names.
///
/// Blank lines are skipped. Bytes that are not UTF-8 make the whole
/// payload malformed.
pub fn decode_object_list(bytes: &[u8]) -> Result<Vec<String>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| CoreError::MalformedPayload(format!("not UTF-8: {e}")))?;

    let mut objects: Vec<String> = text
        .split('\n')
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    objects.sort();
    objects.dedup();
    Ok(objects)
}
