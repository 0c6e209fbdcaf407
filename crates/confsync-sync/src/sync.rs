//! Digest set synchronizer state machine.
//!
//! Keeps one discovery query outstanding under `broadcast/<digest>` and
//! serves the same namespace. A peer whose digest differs from the one in
//! a query answers with its full object list; a peer whose digest matches
//! parks the query until its own set changes.

use confsync_core::{decode_object_list, Digest, Name, ObjectSet, QueryId, RegistrationId, TimerId};
use confsync_face::{Face, IncomingQuery, Response};
use tracing::{debug, info, trace, warn};

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::pending::{PendingEntry, PendingTable};

/// Discovery work currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outstanding {
    /// A discovery query awaits its response or timeout.
    Query(QueryId),
    /// Waiting out the pause before the next query.
    Pausing(TimerId),
}

/// Lifecycle of a [`DigestSync`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Not started yet.
    Created,
    /// Serving the broadcast namespace with discovery work in flight.
    Listening {
        registration: RegistrationId,
        outstanding: Outstanding,
    },
    /// Shut down. Late events are ignored.
    Shutdown,
}

/// One peer's view of the shared object set.
pub struct DigestSync {
    config: SyncConfig,
    prefix: Name,
    objects: ObjectSet,
    digest: Digest,
    pending: PendingTable,
    phase: SyncPhase,
}

impl DigestSync {
    /// Create a synchronizer for the broadcast namespace `prefix`.
    pub fn new(prefix: Name, config: SyncConfig) -> Self {
        let pending = PendingTable::new(config.max_pending);
        Self {
            config,
            prefix,
            objects: ObjectSet::new(),
            digest: Digest::Newcomer,
            pending,
            phase: SyncPhase::Created,
        }
    }

    /// Register the broadcast namespace and send the first discovery query.
    ///
    /// The first query always carries the newcomer digest so any peer
    /// holding something answers with its full list. Calling this again
    /// while listening does nothing.
    pub fn start<F: Face>(&mut self, face: &mut F) -> Result<()> {
        match self.phase {
            SyncPhase::Listening { .. } => return Ok(()),
            SyncPhase::Shutdown => return Err(SyncError::ShutDown),
            SyncPhase::Created => {}
        }

        let registration = face.register_prefix(self.prefix.clone());
        let query = face.express_query(
            Digest::Newcomer.query_name(&self.prefix),
            self.config.query_lifetime,
        );
        info!(prefix = %self.prefix, "digest sync listening");
        self.phase = SyncPhase::Listening {
            registration,
            outstanding: Outstanding::Query(query),
        };
        Ok(())
    }

    /// Add an object and answer every parked query.
    ///
    /// Returns false if the name is empty or already present.
    pub fn publish_object<F: Face>(&mut self, face: &mut F, object: &str) -> bool {
        if !self.add_object(object, true) {
            return false;
        }
        self.satisfy_pending(face);
        true
    }

    /// Remove an object and answer every parked query.
    ///
    /// Returns false if the name was not present.
    pub fn stop_publishing_object<F: Face>(&mut self, face: &mut F, object: &str) -> bool {
        if !self.remove_object(object, true) {
            return false;
        }
        self.satisfy_pending(face);
        true
    }

    /// Add an object without touching parked queries.
    pub fn add_object(&mut self, object: &str, update_digest: bool) -> bool {
        if !self.objects.insert(object) {
            return false;
        }
        debug!(object, "object added");
        if update_digest {
            self.update_digest();
        }
        true
    }

    /// Remove an object without touching parked queries.
    pub fn remove_object(&mut self, object: &str, update_digest: bool) -> bool {
        if !self.objects.remove(object) {
            return false;
        }
        debug!(object, "object removed");
        if update_digest {
            self.update_digest();
        }
        true
    }

    /// Recompute the digest from the current set.
    pub fn update_digest(&mut self) {
        self.digest = Digest::of(&self.objects);
        trace!(digest = %self.digest, "digest updated");
    }

    /// Answer every live parked query whose digest no longer matches ours.
    ///
    /// Returns how many outstanding queries were answered.
    pub fn satisfy_pending<F: Face>(&mut self, face: &mut F) -> usize {
        if self.pending.is_empty() {
            return 0;
        }
        let stale = self.pending.take_stale(face.now(), &self.digest);
        if stale.is_empty() {
            return 0;
        }

        let payload = bytes::Bytes::from(self.objects.to_payload());
        let mut answered_names: Vec<Name> = Vec::new();
        let mut answered = 0;
        for entry in stale {
            if answered_names.contains(&entry.query.name) {
                continue;
            }
            let response = Response::new(
                entry.query.name.clone(),
                payload.clone(),
                self.config.response_freshness,
            );
            answered += face.put_response(response);
            answered_names.push(entry.query.name);
        }
        debug!(answered, digest = %self.digest, "pending queries satisfied");
        answered
    }

    /// Handle a query that arrived under the broadcast namespace.
    pub fn on_query<F: Face>(&mut self, face: &mut F, query: IncomingQuery) {
        if !matches!(self.phase, SyncPhase::Listening { .. }) {
            trace!(name = %query.name, "discarding query, not listening");
            return;
        }
        let is_discovery_name =
            query.name.len() == self.prefix.len() + 1 && self.prefix.is_prefix_of(&query.name);
        if !is_discovery_name {
            debug!(name = %query.name, "ignoring query outside the discovery namespace");
            return;
        }

        let requester = query.name.last().map(Digest::parse);
        match requester {
            Some(Ok(digest)) if digest == self.digest => {
                let now = face.now();
                let purged = self.pending.purge_expired(now);
                if purged > 0 {
                    trace!(purged, "expired pending queries dropped");
                }
                if let Some(evicted) = self.pending.insert(PendingEntry::new(query, digest)) {
                    warn!(name = %evicted.query.name, "pending table full, evicted oldest query");
                }
                debug!(pending = self.pending.len(), "query parked");
            }
            other => {
                if let Some(Err(e)) = other {
                    debug!(name = %query.name, error = %e, "unreadable requester digest, answering");
                }
                let response = Response::new(
                    query.name,
                    self.objects.to_payload(),
                    self.config.response_freshness,
                );
                debug!(name = %response.name, objects = self.objects.len(), "answering discovery query");
                face.put_response(response);
            }
        }
    }

    /// Handle the response to our discovery query.
    ///
    /// Returns the remote object list when it differs from the local set.
    /// The next query goes out after the configured pause either way.
    pub fn on_response<F: Face>(
        &mut self,
        face: &mut F,
        query: QueryId,
        response: &Response,
    ) -> Option<Vec<String>> {
        let SyncPhase::Listening {
            registration,
            outstanding,
        } = self.phase
        else {
            trace!(%query, "discarding late discovery response");
            return None;
        };
        if outstanding != Outstanding::Query(query) {
            trace!(%query, "discarding response to unknown query");
            return None;
        }

        let timer = face.schedule(self.config.query_interval);
        self.phase = SyncPhase::Listening {
            registration,
            outstanding: Outstanding::Pausing(timer),
        };

        match decode_snapshot(response) {
            Ok(remote) if self.objects.matches(&remote) => {
                trace!(digest = %self.digest, "remote snapshot matches");
                None
            }
            Ok(remote) => {
                debug!(objects = remote.len(), "remote snapshot differs");
                Some(remote)
            }
            Err(e) => {
                warn!(name = %response.name, error = %e, "malformed discovery response");
                None
            }
        }
    }

    /// Handle expiry of our discovery query: ask again right away.
    pub fn on_timeout<F: Face>(&mut self, face: &mut F, query: QueryId) -> bool {
        let SyncPhase::Listening {
            registration,
            outstanding,
        } = self.phase
        else {
            return false;
        };
        if outstanding != Outstanding::Query(query) {
            return false;
        }
        trace!(%query, "discovery query timed out");
        self.express(face, registration);
        true
    }

    /// Handle the end of the inter-query pause.
    pub fn on_timer<F: Face>(&mut self, face: &mut F, timer: TimerId) -> bool {
        let SyncPhase::Listening {
            registration,
            outstanding,
        } = self.phase
        else {
            return false;
        };
        if outstanding != Outstanding::Pausing(timer) {
            return false;
        }
        self.express(face, registration);
        true
    }

    /// Handle refusal of the broadcast registration.
    ///
    /// Returns true if the registration was ours. Discovery queries keep
    /// going; this peer just cannot be asked.
    pub fn on_register_failed(&mut self, registration: RegistrationId) -> bool {
        if !self.owns_registration(registration) {
            return false;
        }
        warn!(prefix = %self.prefix, "broadcast prefix registration failed");
        true
    }

    /// Withdraw the broadcast namespace and stop issuing queries.
    ///
    /// An outstanding query is left to lapse; its timeout is ignored.
    pub fn shutdown<F: Face>(&mut self, face: &mut F) {
        if let SyncPhase::Listening {
            registration,
            outstanding,
        } = self.phase
        {
            face.unregister_prefix(registration);
            if let Outstanding::Pausing(timer) = outstanding {
                face.cancel_timer(timer);
            }
            info!(prefix = %self.prefix, "digest sync shut down");
        }
        self.pending.clear();
        self.phase = SyncPhase::Shutdown;
    }

    fn express<F: Face>(&mut self, face: &mut F, registration: RegistrationId) {
        let name = self.digest.query_name(&self.prefix);
        trace!(%name, "expressing discovery query");
        let query = face.express_query(name, self.config.query_lifetime);
        self.phase = SyncPhase::Listening {
            registration,
            outstanding: Outstanding::Query(query),
        };
    }

    pub fn owns_query(&self, query: QueryId) -> bool {
        matches!(
            self.phase,
            SyncPhase::Listening { outstanding: Outstanding::Query(q), .. } if q == query
        )
    }

    pub fn owns_timer(&self, timer: TimerId) -> bool {
        matches!(
            self.phase,
            SyncPhase::Listening { outstanding: Outstanding::Pausing(t), .. } if t == timer
        )
    }

    pub fn owns_registration(&self, registration: RegistrationId) -> bool {
        matches!(
            self.phase,
            SyncPhase::Listening { registration: r, .. } if r == registration
        )
    }

    /// The discovery query currently outstanding, if any.
    pub fn outstanding_query(&self) -> Option<QueryId> {
        match self.phase {
            SyncPhase::Listening {
                outstanding: Outstanding::Query(query),
                ..
            } => Some(query),
            _ => None,
        }
    }

    pub fn objects(&self) -> &ObjectSet {
        &self.objects
    }

    pub fn digest(&self) -> Digest {
        self.digest
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop expired parked queries. Returns how many were dropped.
    pub fn purge_expired(&mut self, now: confsync_core::Millis) -> usize {
        self.pending.purge_expired(now)
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn broadcast_prefix(&self) -> &Name {
        &self.prefix
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }
}

/// Decode a discovery response into a sorted object list.
pub fn decode_snapshot(response: &Response) -> Result<Vec<String>> {
    Ok(decode_object_list(&response.content)?)
}
