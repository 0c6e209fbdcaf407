//! The conference discovery engine.
//!
//! Turns the synchronizer's remote snapshots into conference lifecycle
//! events. Every unknown name in a snapshot gets a liveness probe; a
//! conference is discovered when its probe is answered and ended when a
//! probe times out or the host says it is over. Names missing from a
//! snapshot are never removed on that basis alone.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use confsync_core::{
    ConferenceInfo, ConferenceMetadata, Digest, LivenessReply, Name, ObjectSet, QueryId,
    RegistrationId, TimerId,
};
use confsync_face::{Face, FaceEvent, IncomingQuery, Response};
use confsync_sync::DigestSync;
use tracing::{debug, info, trace, warn};

use crate::config::DiscoveryConfig;
use crate::error::{DiscoveryError, Result};
use crate::observer::{ConferenceObserver, Notification, NotificationKind, TracingObserver};

/// Liveness probe state for one full conference name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    /// A liveness query is outstanding.
    Querying(QueryId),
    /// Confirmed; the next query goes out when the timer fires.
    Waiting(TimerId),
}

/// Lifecycle of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Created,
    Running,
    Shutdown,
}

/// A stopped conference still answering liveness queries.
#[derive(Debug, Clone)]
struct Retiring {
    info: ConferenceInfo,
    registration: RegistrationId,
    timer: TimerId,
}

#[derive(Debug, Clone)]
enum TimerTask {
    /// Probe this full name again.
    Heartbeat(Name),
    /// Withdraw the namespace of this retiring conference.
    Withdraw(String),
}

/// Conference discovery for one peer.
pub struct ConferenceDiscovery {
    config: DiscoveryConfig,
    sync: DigestSync,
    observer: Box<dyn ConferenceObserver + Send>,
    /// Learned from remote peers, by conference name.
    discovered: BTreeMap<String, ConferenceInfo>,
    /// Published here, by conference name.
    hosted: BTreeMap<String, ConferenceInfo>,
    /// Stopped here, still inside the keep period.
    retiring: BTreeMap<String, Retiring>,
    /// Full names with a probe in flight or scheduled.
    queried: BTreeMap<Name, ProbeState>,
    probes: HashMap<QueryId, Name>,
    timers: HashMap<TimerId, TimerTask>,
    /// Conference namespace registrations, by conference name.
    registrations: HashMap<RegistrationId, String>,
    phase: EnginePhase,
}

impl ConferenceDiscovery {
    /// Create an engine that logs its notifications.
    pub fn new(config: DiscoveryConfig) -> Self {
        Self::with_observer(config, Box::new(TracingObserver))
    }

    /// Create an engine reporting to `observer`.
    pub fn with_observer(
        config: DiscoveryConfig,
        observer: Box<dyn ConferenceObserver + Send>,
    ) -> Self {
        let sync = DigestSync::new(config.broadcast_prefix.clone(), config.sync.clone());
        Self {
            config,
            sync,
            observer,
            discovered: BTreeMap::new(),
            hosted: BTreeMap::new(),
            retiring: BTreeMap::new(),
            queried: BTreeMap::new(),
            probes: HashMap::new(),
            timers: HashMap::new(),
            registrations: HashMap::new(),
            phase: EnginePhase::Created,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Public contract
    // ─────────────────────────────────────────────────────────────────────────

    /// Begin the discovery query cycle. Idempotent while running.
    pub fn start<F: Face>(&mut self, face: &mut F) -> Result<()> {
        match self.phase {
            EnginePhase::Running => return Ok(()),
            EnginePhase::Shutdown => return Err(DiscoveryError::ShutDown),
            EnginePhase::Created => {}
        }
        self.sync.start(face)?;
        self.phase = EnginePhase::Running;
        info!(prefix = %self.config.broadcast_prefix, "conference discovery started");
        Ok(())
    }

    /// Host conference `name` under `local_prefix`.
    ///
    /// Returns false if the name is already hosted or discovered, is not a
    /// valid name component, or the engine is shut down. A later refusal
    /// of the namespace registration undoes the publish and is reported as
    /// `CONFERENCE_ADD_FAILED`.
    pub fn publish_conference<F: Face>(
        &mut self,
        face: &mut F,
        name: &str,
        local_prefix: &Name,
        metadata: ConferenceMetadata,
    ) -> bool {
        if self.phase == EnginePhase::Shutdown {
            return false;
        }
        if self.hosted.contains_key(name) || self.discovered.contains_key(name) {
            debug!(conference = name, "publish rejected, name already known");
            return false;
        }
        let info = match ConferenceInfo::new(name, local_prefix.clone(), metadata) {
            Ok(info) => info,
            Err(e) => {
                warn!(conference = name, error = %e, "publish rejected");
                return false;
            }
        };

        if let Some(old) = self.retiring.remove(name) {
            debug!(conference = name, "re-published during keep period");
            face.cancel_timer(old.timer);
            self.timers.remove(&old.timer);
            face.unregister_prefix(old.registration);
            self.registrations.remove(&old.registration);
        }

        let full_name = info.full_name().clone();
        let registration = face.register_prefix(full_name.clone());
        self.registrations.insert(registration, name.to_string());
        self.sync.publish_object(face, &full_name.to_string());
        self.hosted
            .insert(name.to_string(), info.with_registration(registration));
        info!(conference = name, name = %full_name, "conference published");
        true
    }

    /// Stop hosting conference `name` published under `prefix`.
    ///
    /// The name leaves the shared set at once. Its namespace keeps
    /// answering liveness queries with an ended marker for the keep period
    /// and is withdrawn afterwards.
    pub fn stop_publishing_conference<F: Face>(
        &mut self,
        face: &mut F,
        name: &str,
        prefix: &Name,
    ) -> bool {
        let hosted_here = self
            .hosted
            .get(name)
            .map_or(false, |info| info.prefix() == prefix);
        if !hosted_here {
            debug!(conference = name, %prefix, "stop rejected, not hosted here");
            return false;
        }
        let Some(mut info) = self.hosted.remove(name) else {
            return false;
        };

        self.sync
            .stop_publishing_object(face, &info.full_name().to_string());

        if let Some(registration) = info.take_registration() {
            let timer = face.schedule(self.config.keep_period);
            self.timers
                .insert(timer, TimerTask::Withdraw(name.to_string()));
            self.retiring.insert(
                name.to_string(),
                Retiring {
                    info,
                    registration,
                    timer,
                },
            );
        }
        info!(conference = name, "conference stopped, namespace kept for the keep period");
        true
    }

    /// Release every registration and stop all query cycles.
    ///
    /// Outstanding queries lapse; their outcomes are ignored.
    pub fn shutdown<F: Face>(&mut self, face: &mut F) {
        if self.phase == EnginePhase::Shutdown {
            return;
        }
        self.sync.shutdown(face);
        for timer in self.timers.keys() {
            face.cancel_timer(*timer);
        }
        for registration in self.registrations.keys() {
            face.unregister_prefix(*registration);
        }
        self.timers.clear();
        self.registrations.clear();
        self.probes.clear();
        self.queried.clear();
        self.retiring.clear();
        for info in self.hosted.values_mut() {
            info.take_registration();
        }
        self.phase = EnginePhase::Shutdown;
        info!("conference discovery shut down");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Event routing
    // ─────────────────────────────────────────────────────────────────────────

    /// Dispatch one face event. Returns false if nothing here owned it.
    pub fn handle_event<F: Face>(&mut self, face: &mut F, event: FaceEvent) -> bool {
        if self.phase == EnginePhase::Shutdown {
            trace!(?event, "discarding event after shutdown");
            return false;
        }
        match event {
            FaceEvent::Response { query, response } => {
                if self.sync.owns_query(query) {
                    if let Some(remote) = self.sync.on_response(face, query, &response) {
                        self.on_remote_snapshot(face, remote);
                    }
                    true
                } else if let Some(full_name) = self.probes.remove(&query) {
                    self.on_liveness_reply(face, query, full_name, &response);
                    true
                } else {
                    trace!(%query, "discarding response to unknown query");
                    false
                }
            }
            FaceEvent::Timeout { query, name } => {
                if self.sync.on_timeout(face, query) {
                    true
                } else if let Some(full_name) = self.probes.remove(&query) {
                    self.on_liveness_timeout(face, query, full_name);
                    true
                } else {
                    trace!(%query, %name, "discarding timeout of unknown query");
                    false
                }
            }
            FaceEvent::Query {
                registration,
                query,
            } => {
                if self.sync.owns_registration(registration) {
                    self.sync.on_query(face, query);
                    true
                } else if self.registrations.contains_key(&registration) {
                    self.serve_liveness(face, registration, query);
                    true
                } else {
                    trace!(%registration, name = %query.name, "discarding query for unknown registration");
                    false
                }
            }
            FaceEvent::Timer { timer } => {
                if self.sync.on_timer(face, timer) {
                    return true;
                }
                match self.timers.remove(&timer) {
                    Some(TimerTask::Heartbeat(full_name)) => {
                        self.on_heartbeat(face, timer, full_name);
                        true
                    }
                    Some(TimerTask::Withdraw(name)) => {
                        self.on_withdraw(face, timer, &name);
                        true
                    }
                    None => {
                        trace!(%timer, "discarding unknown timer");
                        false
                    }
                }
            }
            FaceEvent::RegisterFailed {
                registration,
                prefix,
            } => {
                if self.sync.on_register_failed(registration) {
                    self.notify(
                        face,
                        NotificationKind::DiscoveryFailed,
                        format!("failed to register broadcast prefix {prefix}"),
                    );
                    true
                } else if let Some(name) = self.registrations.remove(&registration) {
                    self.on_conference_register_failed(face, registration, &name, &prefix);
                    true
                } else {
                    trace!(%registration, "discarding unknown registration failure");
                    false
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Change handling
    // ─────────────────────────────────────────────────────────────────────────

    /// Probe every name in a remote snapshot that is not yet known.
    fn on_remote_snapshot<F: Face>(&mut self, face: &mut F, remote: Vec<String>) {
        for object in remote {
            let full_name = match Name::parse(&object) {
                Ok(name) => name,
                Err(e) => {
                    warn!(object = %object, error = %e, "ignoring unparseable object name");
                    continue;
                }
            };
            if self.queried.contains_key(&full_name) {
                continue;
            }
            let Some(conference) = full_name.last() else {
                continue;
            };
            if self.is_own(conference, &full_name) {
                trace!(name = %full_name, "skipping own conference");
                continue;
            }
            if self.hosted.contains_key(conference) || self.discovered.contains_key(conference) {
                debug!(name = %full_name, "skipping conference name already in use");
                continue;
            }
            self.send_probe(face, full_name);
        }
    }

    fn is_own(&self, conference: &str, full_name: &Name) -> bool {
        self.hosted
            .get(conference)
            .map_or(false, |info| info.full_name() == full_name)
            || self
                .retiring
                .get(conference)
                .map_or(false, |r| r.info.full_name() == full_name)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Liveness probing
    // ─────────────────────────────────────────────────────────────────────────

    fn send_probe<F: Face>(&mut self, face: &mut F, full_name: Name) {
        let query = face.express_query(full_name.clone(), self.config.liveness_lifetime);
        debug!(name = %full_name, %query, "liveness query sent");
        self.probes.insert(query, full_name.clone());
        self.queried.insert(full_name, ProbeState::Querying(query));
    }

    fn on_liveness_reply<F: Face>(
        &mut self,
        face: &mut F,
        query: QueryId,
        full_name: Name,
        response: &Response,
    ) {
        if self.queried.get(&full_name) != Some(&ProbeState::Querying(query)) {
            trace!(name = %full_name, "discarding stale liveness reply");
            return;
        }

        let metadata = match LivenessReply::decode(&response.content) {
            Ok(LivenessReply::Ongoing(metadata)) => metadata,
            Ok(LivenessReply::Ended) => {
                self.end_conference(face, &full_name, "ended by its host");
                return;
            }
            Err(e) => {
                warn!(name = %full_name, error = %e, "malformed liveness reply, assuming ongoing");
                ConferenceMetadata::default()
            }
        };

        let Some(conference) = full_name.last().map(str::to_string) else {
            self.queried.remove(&full_name);
            return;
        };

        let known_here = self
            .discovered
            .get(&conference)
            .map(|info| info.full_name() == &full_name);
        match known_here {
            Some(true) => {
                if let Some(info) = self.discovered.get_mut(&conference) {
                    info.set_metadata(metadata);
                }
            }
            Some(false) => {
                debug!(name = %full_name, "conference name taken by another host, dropping probe");
                self.queried.remove(&full_name);
                return;
            }
            None if self.hosted.contains_key(&conference) => {
                debug!(name = %full_name, "conference name hosted here, dropping probe");
                self.queried.remove(&full_name);
                return;
            }
            None => {
                let info = match ConferenceInfo::from_full_name(full_name.clone(), metadata) {
                    Ok(info) => info,
                    Err(e) => {
                        warn!(name = %full_name, error = %e, "cannot record conference");
                        self.queried.remove(&full_name);
                        return;
                    }
                };
                self.discovered.insert(conference.clone(), info);
                self.sync.publish_object(face, &full_name.to_string());
                self.notify(
                    face,
                    NotificationKind::ConferenceDiscovered,
                    format!("conference {conference} discovered at {full_name}"),
                );
            }
        }

        let timer = face.schedule(self.config.heartbeat_interval);
        self.timers
            .insert(timer, TimerTask::Heartbeat(full_name.clone()));
        self.queried.insert(full_name, ProbeState::Waiting(timer));
    }

    fn on_liveness_timeout<F: Face>(&mut self, face: &mut F, query: QueryId, full_name: Name) {
        if self.queried.get(&full_name) != Some(&ProbeState::Querying(query)) {
            trace!(name = %full_name, "discarding stale liveness timeout");
            return;
        }
        self.end_conference(face, &full_name, "stopped answering");
    }

    fn on_heartbeat<F: Face>(&mut self, face: &mut F, timer: TimerId, full_name: Name) {
        if self.queried.get(&full_name) != Some(&ProbeState::Waiting(timer)) {
            trace!(name = %full_name, "discarding stale heartbeat");
            return;
        }
        self.send_probe(face, full_name);
    }

    /// Forget a probed name; if it had been discovered, report it ended.
    fn end_conference<F: Face>(&mut self, face: &mut F, full_name: &Name, reason: &str) {
        self.queried.remove(full_name);
        let Some(conference) = full_name.last() else {
            return;
        };
        let confirmed = self
            .discovered
            .get(conference)
            .map_or(false, |info| info.full_name() == full_name);
        if !confirmed {
            debug!(name = %full_name, reason, "unconfirmed conference dropped");
            return;
        }

        self.discovered.remove(conference);
        self.sync.stop_publishing_object(face, &full_name.to_string());
        let message = format!("conference {conference} at {full_name} {reason}");
        self.notify(face, NotificationKind::ConferenceEnded, message);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Hosted conferences
    // ─────────────────────────────────────────────────────────────────────────

    fn serve_liveness<F: Face>(
        &mut self,
        face: &mut F,
        registration: RegistrationId,
        query: IncomingQuery,
    ) {
        let Some(name) = self.registrations.get(&registration) else {
            return;
        };
        let reply = if let Some(info) = self
            .hosted
            .get(name)
            .filter(|info| info.registration() == Some(registration))
        {
            if query.name != *info.full_name() {
                trace!(name = %query.name, "ignoring query below conference name");
                return;
            }
            LivenessReply::Ongoing(info.metadata().clone())
        } else if let Some(retiring) = self
            .retiring
            .get(name)
            .filter(|r| r.registration == registration)
        {
            if query.name != *retiring.info.full_name() {
                trace!(name = %query.name, "ignoring query below retiring conference name");
                return;
            }
            LivenessReply::Ended
        } else {
            return;
        };

        match reply.encode() {
            Ok(content) => {
                trace!(name = %query.name, ?reply, "answering liveness query");
                face.put_response(Response::new(
                    query.name,
                    content,
                    self.config.liveness_freshness,
                ));
            }
            Err(e) => warn!(name = %query.name, error = %e, "cannot encode liveness reply"),
        }
    }

    fn on_withdraw<F: Face>(&mut self, face: &mut F, timer: TimerId, name: &str) {
        let current = self.retiring.get(name).map_or(false, |r| r.timer == timer);
        if !current {
            return;
        }
        if let Some(retiring) = self.retiring.remove(name) {
            face.unregister_prefix(retiring.registration);
            self.registrations.remove(&retiring.registration);
            info!(conference = name, name = %retiring.info.full_name(), "conference namespace withdrawn");
        }
    }

    fn on_conference_register_failed<F: Face>(
        &mut self,
        face: &mut F,
        registration: RegistrationId,
        name: &str,
        prefix: &Name,
    ) {
        let hosted_here = self
            .hosted
            .get(name)
            .map_or(false, |info| info.registration() == Some(registration));
        if hosted_here {
            if let Some(info) = self.hosted.remove(name) {
                self.sync
                    .stop_publishing_object(face, &info.full_name().to_string());
            }
            self.notify(
                face,
                NotificationKind::ConferenceAddFailed,
                format!("failed to register {prefix} for conference {name}"),
            );
            return;
        }
        if let Some(retiring) = self.retiring.remove(name) {
            face.cancel_timer(retiring.timer);
            self.timers.remove(&retiring.timer);
        }
    }

    fn notify<F: Face>(&mut self, face: &F, kind: NotificationKind, message: String) {
        self.observer.on_notification(Notification {
            kind,
            message,
            timestamp: face.now(),
        });
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Snapshot of the discovered conferences.
    pub fn discovered_conferences(&self) -> BTreeMap<String, ConferenceInfo> {
        self.discovered.clone()
    }

    /// Snapshot of the conferences hosted here.
    pub fn hosted_conferences(&self) -> BTreeMap<String, ConferenceInfo> {
        self.hosted.clone()
    }

    /// Look a conference up, discovered ones first.
    pub fn conference(&self, name: &str) -> Option<ConferenceInfo> {
        self.discovered
            .get(name)
            .or_else(|| self.hosted.get(name))
            .cloned()
    }

    pub fn hosted_count(&self) -> usize {
        self.hosted.len()
    }

    /// Conferences stopped here whose namespace is still served.
    pub fn retiring_conferences(&self) -> Vec<String> {
        self.retiring.keys().cloned().collect()
    }

    /// Probe state of one full name.
    pub fn liveness_state(&self, full_name: &Name) -> Option<ProbeState> {
        self.queried.get(full_name).copied()
    }

    /// Full names with a probe in flight or scheduled.
    pub fn queried_names(&self) -> Vec<Name> {
        self.queried.keys().cloned().collect()
    }

    pub fn digest(&self) -> Digest {
        self.sync.digest()
    }

    /// The shared object set as this peer holds it.
    pub fn objects(&self) -> &ObjectSet {
        self.sync.objects()
    }

    pub fn sync(&self) -> &DigestSync {
        &self.sync
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Human-readable listing of hosted and discovered conferences.
    pub fn conferences_to_string(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "hosted ({}):", self.hosted.len());
        for info in self.hosted.values() {
            let _ = writeln!(out, "  {} {}", info.full_name(), info.metadata().description);
        }
        let _ = writeln!(out, "discovered ({}):", self.discovered.len());
        for info in self.discovered.values() {
            let _ = writeln!(out, "  {} {}", info.full_name(), info.metadata().description);
        }
        out
    }
}
