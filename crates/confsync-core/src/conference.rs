//! Conference records and the liveness reply.
//!
//! A conference is known by its short name (`weekly`) and reachable under
//! its full name, the hosting peer's local prefix plus the short name
//! (`/ndn/alice/weekly`). Liveness replies travel as CBOR.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{CoreError, Result};
use crate::name::{validate_component, Name};
use crate::types::{Millis, RegistrationId};

/// Descriptive metadata a host attaches to its conference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConferenceMetadata {
    /// Free-form description shown to users.
    pub description: String,
    /// Who runs the conference, if known.
    #[serde(default)]
    pub organizer: Option<String>,
    /// When the conference started (Unix ms), if known.
    #[serde(default)]
    pub started_at: Option<Millis>,
    /// Application-defined attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ConferenceMetadata {
    /// Metadata with only a description.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    /// Set the organizer.
    pub fn organizer(mut self, organizer: impl Into<String>) -> Self {
        self.organizer = Some(organizer.into());
        self
    }

    /// Set the start time.
    pub fn started_at(mut self, at: Millis) -> Self {
        self.started_at = Some(at);
        self
    }

    /// Add an attribute.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// What a peer knows about one conference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConferenceInfo {
    name: String,
    prefix: Name,
    full_name: Name,
    metadata: ConferenceMetadata,
    registration: Option<RegistrationId>,
}

impl ConferenceInfo {
    /// Describe conference `name` hosted under `prefix`.
    pub fn new(name: &str, prefix: Name, metadata: ConferenceMetadata) -> Result<Self> {
        validate_component(name)?;
        let full_name = prefix.child(name)?;
        Ok(Self {
            name: name.to_string(),
            prefix,
            full_name,
            metadata,
            registration: None,
        })
    }

    /// Describe the conference reachable at `full_name`.
    pub fn from_full_name(full_name: Name, metadata: ConferenceMetadata) -> Result<Self> {
        let (Some(name), Some(prefix)) = (full_name.last(), full_name.parent()) else {
            return Err(CoreError::InvalidName(
                "the root name is not a conference".into(),
            ));
        };
        Ok(Self {
            name: name.to_string(),
            prefix,
            full_name,
            metadata,
            registration: None,
        })
    }

    /// Attach the registration serving this conference's namespace.
    pub fn with_registration(mut self, registration: RegistrationId) -> Self {
        self.registration = Some(registration);
        self
    }

    /// Short conference name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local prefix of the hosting peer.
    pub fn prefix(&self) -> &Name {
        &self.prefix
    }

    /// Prefix plus short name.
    pub fn full_name(&self) -> &Name {
        &self.full_name
    }

    pub fn metadata(&self) -> &ConferenceMetadata {
        &self.metadata
    }

    pub fn set_metadata(&mut self, metadata: ConferenceMetadata) {
        self.metadata = metadata;
    }

    /// Registration handle, present only for conferences hosted here.
    pub fn registration(&self) -> Option<RegistrationId> {
        self.registration
    }

    /// Detach and return the registration handle.
    pub fn take_registration(&mut self) -> Option<RegistrationId> {
        self.registration.take()
    }
}

/// Answer to a liveness query about one conference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LivenessReply {
    /// The conference is running.
    Ongoing(ConferenceMetadata),
    /// The host stopped the conference and is about to withdraw its name.
    Ended,
}

impl LivenessReply {
    /// Encode as CBOR.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(self, &mut buf)
            .map_err(|e| CoreError::EncodingError(e.to_string()))?;
        Ok(buf)
    }

    /// Decode from CBOR.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        ciborium::de::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
    }
}
