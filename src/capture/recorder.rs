use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::clock::{Clock, Stopwatch};
use crate::event::{AppearanceRef, EventKind, EventLog};
use crate::session::{SessionId, SessionStore};

use super::appearance::{appearance_key, AppearanceArchive};
use super::source::{NotificationSource, SubscriptionId, WorldObserver};
use super::tracked::{ActorPresence, ChatMessage, ObjectPresence, TrackedActor, TrackedObject};
use super::CaptureError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    Idle,
    Recording,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderStatus {
    pub phase: CapturePhase,
    pub session_id: Option<SessionId>,
    /// A stopped recording exists that has not been saved
    pub unsaved: bool,
    pub event_count: usize,
    pub elapsed_ms: u64,
    pub tracked_actors: usize,
    pub tracked_objects: usize,
}

impl std::fmt::Display for RecorderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.phase {
            CapturePhase::Idle => write!(f, "recorder is not recording")?,
            CapturePhase::Recording => write!(
                f,
                "recorder is holding {} events over {} seconds",
                self.event_count,
                self.elapsed_ms / 1000
            )?,
        }
        write!(
            f,
            " (tracking {} actors, {} objects)",
            self.tracked_actors, self.tracked_objects
        )
    }
}

struct RecorderState {
    phase: CapturePhase,
    actors: BTreeMap<Uuid, TrackedActor>,
    objects: BTreeMap<Uuid, TrackedObject>,
    log: EventLog,
    stopwatch: Stopwatch,
    session_id: Option<SessionId>,
    unsaved: bool,
    /// Snapshots issued for actors that have since left, still owned by the
    /// current recording
    orphaned: Vec<AppearanceRef>,
    /// Next unused appearance version of each departed actor, so a returning
    /// actor never reuses a key within one recording
    departed_versions: BTreeMap<Uuid, u32>,
}

impl RecorderState {
    fn is_recording(&self) -> bool {
        self.phase == CapturePhase::Recording
    }
}

/// Capture engine.
///
/// Tracks every actor and object the host reports and, while recording,
/// appends an event whenever one of them materially changes. All
/// notification handlers and commands run under one lock, so concurrent
/// producers never interleave a read-modify-write and timestamps enter the
/// log in order.
pub struct Recorder {
    clock: Arc<dyn Clock>,
    appearances: Arc<dyn AppearanceArchive>,
    state: Mutex<RecorderState>,
}

impl Recorder {
    pub fn new(clock: Arc<dyn Clock>, appearances: Arc<dyn AppearanceArchive>) -> Self {
        Self {
            clock,
            appearances,
            state: Mutex::new(RecorderState {
                phase: CapturePhase::Idle,
                actors: BTreeMap::new(),
                objects: BTreeMap::new(),
                log: EventLog::new(),
                stopwatch: Stopwatch::new(),
                session_id: None,
                unsaved: false,
                orphaned: Vec::new(),
                departed_versions: BTreeMap::new(),
            }),
        }
    }

    /// Register with a host notification source
    pub fn attach(self: &Arc<Self>, source: &dyn NotificationSource) -> SubscriptionId {
        let observer: Arc<dyn WorldObserver> = self.clone();
        source.subscribe(observer)
    }

    pub fn detach(&self, source: &dyn NotificationSource, subscription: SubscriptionId) {
        if !source.unsubscribe(subscription) {
            tracing::debug!("recorder was not subscribed to this source");
        }
    }

    // ---- commands -------------------------------------------------------

    /// Begin a new recording. Every entity already tracked is written as a
    /// snapshot at t=0, followed by `SessionStart`.
    pub fn start_recording(&self) -> Result<SessionId, CaptureError> {
        let mut state = self.state.lock();
        if state.is_recording() {
            tracing::warn!("Error starting: recorder is already recording");
            return Err(CaptureError::AlreadyRecording);
        }
        if state.unsaved {
            tracing::info!(
                session_id = ?state.session_id.as_ref().map(SessionId::as_str),
                "overwriting unsaved recording"
            );
            self.discard_snapshots(&mut state);
        }
        state.orphaned.clear();
        state.departed_versions.clear();

        let session_id = SessionId::generate();
        let now = self.clock.now_ms();
        state.stopwatch.restart(now);
        state.phase = CapturePhase::Recording;
        state.unsaved = true;
        state.session_id = Some(session_id.clone());

        let RecorderState {
            actors,
            objects,
            log,
            ..
        } = &mut *state;
        log.clear();
        for actor in actors.values_mut() {
            actor.reset_appearances();
            let appearance = self.snapshot_appearance(&session_id, actor);
            log.record(
                0,
                EventKind::ActorAdded {
                    actor_id: actor.world_id,
                    first_name: actor.first_name.clone(),
                    last_name: actor.last_name.clone(),
                    appearance,
                },
            );
            log.record(
                0,
                EventKind::ActorMoved {
                    actor_id: actor.world_id,
                    motion: actor.motion,
                },
            );
            log.record(
                0,
                EventKind::ActorAnimationChanged {
                    actor_id: actor.world_id,
                    animations: actor.animations.clone(),
                },
            );
        }
        // Objects are assumed to already exist wherever this is replayed;
        // only their starting transforms matter.
        for object in objects.values() {
            log.record(
                0,
                EventKind::ObjectMoved {
                    object_id: object.object_id,
                    motion: object.motion,
                },
            );
        }
        log.record(0, EventKind::SessionStart);

        tracing::info!(
            session_id = %session_id,
            actors = actors.len(),
            objects = objects.len(),
            "Record Start"
        );
        Ok(session_id)
    }

    pub fn stop_recording(&self) -> Result<(), CaptureError> {
        let mut state = self.state.lock();
        if !state.is_recording() {
            tracing::warn!("Error stopping: recorder is not recording");
            return Err(CaptureError::NotRecording);
        }
        let now = self.clock.now_ms();
        let ts = state.stopwatch.elapsed(now);
        state.log.record(ts, EventKind::SessionEnd);
        state.stopwatch.stop(now);
        state.phase = CapturePhase::Idle;
        tracing::info!(
            events = state.log.len(),
            duration_ms = ts,
            "Record Stop"
        );
        Ok(())
    }

    /// Persist the stopped recording. Appearance bookkeeping is reset so the
    /// snapshots now belong to the saved session.
    pub fn save(&self, store: &SessionStore) -> Result<SessionId, CaptureError> {
        let mut state = self.state.lock();
        if state.is_recording() {
            tracing::warn!("Error saving session, recorder is still recording");
            return Err(CaptureError::StillRecording);
        }
        let session_id = match (&state.session_id, state.unsaved) {
            (Some(id), true) => id.clone(),
            _ => {
                tracing::warn!("Error saving session, there is no recorded session");
                return Err(CaptureError::NoRecording);
            }
        };

        store.save(&session_id, &state.log)?;
        for actor in state.actors.values_mut() {
            actor.reset_appearances();
        }
        state.orphaned.clear();
        state.departed_versions.clear();
        state.unsaved = false;
        Ok(session_id)
    }

    /// Abandon the current recording (running or stopped) and drop the
    /// appearance snapshots it issued
    pub fn discard(&self) {
        let mut state = self.state.lock();
        if state.is_recording() {
            let now = self.clock.now_ms();
            state.stopwatch.stop(now);
            state.phase = CapturePhase::Idle;
        }
        if state.unsaved {
            self.discard_snapshots(&mut state);
        }
        state.log.clear();
        state.unsaved = false;
        tracing::info!("discarded recording");
    }

    pub fn status(&self) -> RecorderStatus {
        let state = self.state.lock();
        RecorderStatus {
            phase: state.phase,
            session_id: state.session_id.clone(),
            unsaved: state.unsaved,
            event_count: state.log.len(),
            elapsed_ms: state.stopwatch.elapsed(self.clock.now_ms()),
            tracked_actors: state.actors.len(),
            tracked_objects: state.objects.len(),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.state.lock().is_recording()
    }

    /// Copy of the log captured so far
    pub fn log(&self) -> EventLog {
        self.state.lock().log.clone()
    }

    pub fn tracked_actor(&self, world_id: Uuid) -> Option<TrackedActor> {
        self.state.lock().actors.get(&world_id).cloned()
    }

    pub fn tracked_object(&self, object_id: Uuid) -> Option<TrackedObject> {
        self.state.lock().objects.get(&object_id).cloned()
    }

    // ---- notifications --------------------------------------------------

    pub fn handle_actor_added(&self, presence: &ActorPresence) {
        let mut state = self.state.lock();
        if state.actors.contains_key(&presence.world_id) {
            tracing::debug!(
                world_id = %presence.world_id,
                "Duplicate presence detected, not adding actor"
            );
            return;
        }
        let mut actor = TrackedActor::from(presence);
        if let Some(version) = state.departed_versions.remove(&actor.world_id) {
            actor.appearance_version = version;
        }
        let ts = self.elapsed(&state);

        if state.is_recording() {
            let appearance = match state.session_id.clone() {
                Some(session_id) => self.snapshot_appearance(&session_id, &mut actor),
                None => None,
            };
            state.log.record(
                ts,
                EventKind::ActorAdded {
                    actor_id: actor.world_id,
                    first_name: actor.first_name.clone(),
                    last_name: actor.last_name.clone(),
                    appearance,
                },
            );
            state.log.record(
                ts,
                EventKind::ActorMoved {
                    actor_id: actor.world_id,
                    motion: actor.motion,
                },
            );
            state.log.record(
                ts,
                EventKind::ActorAnimationChanged {
                    actor_id: actor.world_id,
                    animations: actor.animations.clone(),
                },
            );
        }

        state.actors.insert(actor.world_id, actor);
        tracing::info!(
            name = %format!("{} {}", presence.first_name, presence.last_name),
            tracked = state.actors.len(),
            "New presence"
        );
    }

    pub fn handle_actor_updated(&self, presence: &ActorPresence) {
        let mut state = self.state.lock();
        let ts = self.elapsed(&state);
        let recording = state.is_recording();
        let RecorderState { actors, log, .. } = &mut *state;
        let Some(actor) = actors.get_mut(&presence.world_id) else {
            tracing::trace!(world_id = %presence.world_id, "update for untracked actor");
            return;
        };

        if actor.update_motion(&presence.motion) && recording {
            log.record(
                ts,
                EventKind::ActorMoved {
                    actor_id: actor.world_id,
                    motion: actor.motion,
                },
            );
        }
        if actor.update_animations(&presence.animations) && recording {
            log.record(
                ts,
                EventKind::ActorAnimationChanged {
                    actor_id: actor.world_id,
                    animations: actor.animations.clone(),
                },
            );
        }
    }

    /// Appearance content is never diffed: every notification while
    /// recording archives a new versioned snapshot.
    pub fn handle_actor_appearance_changed(&self, world_id: Uuid) {
        let mut state = self.state.lock();
        if !state.is_recording() {
            return;
        }
        let ts = self.elapsed(&state);
        let Some(session_id) = state.session_id.clone() else {
            return;
        };
        let RecorderState { actors, log, .. } = &mut *state;
        let Some(actor) = actors.get_mut(&world_id) else {
            return;
        };

        actor.appearance_version += 1;
        if let Some(appearance) = self.snapshot_appearance(&session_id, actor) {
            log.record(
                ts,
                EventKind::ActorAppearanceChanged {
                    actor_id: world_id,
                    appearance,
                },
            );
        }
    }

    pub fn handle_actor_removed(&self, world_id: Uuid) {
        let mut state = self.state.lock();
        let Some(mut actor) = state.actors.remove(&world_id) else {
            return;
        };
        if state.is_recording() {
            let ts = self.elapsed(&state);
            state
                .log
                .record(ts, EventKind::ActorRemoved { actor_id: world_id });
        }
        if !actor.appearances.is_empty() {
            state.orphaned.append(&mut actor.appearances);
            state
                .departed_versions
                .insert(world_id, actor.appearance_version + 1);
        }
    }

    pub fn handle_object_added(&self, presence: &ObjectPresence) {
        let mut state = self.state.lock();
        // Hosts report the same object more than once while it loads
        if state.objects.contains_key(&presence.object_id) {
            return;
        }
        if state.is_recording() {
            let ts = self.elapsed(&state);
            state.log.record(
                ts,
                EventKind::ObjectAdded {
                    object_id: presence.object_id,
                    name: presence.name.clone(),
                },
            );
            state.log.record(
                ts,
                EventKind::ObjectMoved {
                    object_id: presence.object_id,
                    motion: presence.motion,
                },
            );
        }
        state
            .objects
            .insert(presence.object_id, TrackedObject::from(presence));
    }

    pub fn handle_object_updated(&self, presence: &ObjectPresence) {
        let mut state = self.state.lock();
        let ts = self.elapsed(&state);
        let recording = state.is_recording();
        let RecorderState { objects, log, .. } = &mut *state;
        let Some(object) = objects.get_mut(&presence.object_id) else {
            return;
        };
        if object.update_motion(&presence.motion) && recording {
            log.record(
                ts,
                EventKind::ObjectMoved {
                    object_id: object.object_id,
                    motion: object.motion,
                },
            );
        }
    }

    pub fn handle_object_removed(&self, object_id: Uuid) {
        let mut state = self.state.lock();
        if state.objects.remove(&object_id).is_none() {
            return;
        }
        if state.is_recording() {
            let ts = self.elapsed(&state);
            state.log.record(ts, EventKind::ObjectRemoved { object_id });
        }
    }

    pub fn handle_chat(&self, message: &ChatMessage) {
        if message.text.is_empty() {
            return;
        }
        let mut state = self.state.lock();
        if !state.is_recording() {
            return;
        }
        let ts = self.elapsed(&state);
        state.log.record(
            ts,
            EventKind::ChatBroadcast {
                speaker_id: message.speaker_id,
                text: message.text.clone(),
                channel: message.channel,
            },
        );
    }

    // ---- helpers --------------------------------------------------------

    fn elapsed(&self, state: &RecorderState) -> u64 {
        state.stopwatch.elapsed(self.clock.now_ms())
    }

    fn snapshot_appearance(
        &self,
        session_id: &SessionId,
        actor: &mut TrackedActor,
    ) -> Option<AppearanceRef> {
        let key = appearance_key(session_id, actor.world_id, actor.appearance_version);
        match self.appearances.snapshot_appearance(actor.world_id, &key) {
            Ok(appearance) => {
                actor.appearances.push(appearance.clone());
                Some(appearance)
            }
            Err(e) => {
                tracing::warn!(
                    world_id = %actor.world_id,
                    key = %key,
                    error = %e,
                    "failed to archive appearance"
                );
                None
            }
        }
    }

    fn discard_snapshots(&self, state: &mut RecorderState) {
        let mut issued = std::mem::take(&mut state.orphaned);
        for actor in state.actors.values_mut() {
            issued.append(&mut actor.appearances);
            actor.appearance_version = 0;
        }
        state.departed_versions.clear();
        for appearance in issued {
            if let Err(e) = self.appearances.discard_appearance(&appearance) {
                tracing::debug!(
                    appearance = %appearance,
                    error = %e,
                    "failed to discard appearance snapshot"
                );
            }
        }
    }
}

impl WorldObserver for Recorder {
    fn actor_added(&self, presence: &ActorPresence) {
        self.handle_actor_added(presence);
    }

    fn actor_updated(&self, presence: &ActorPresence) {
        self.handle_actor_updated(presence);
    }

    fn actor_appearance_changed(&self, world_id: Uuid) {
        self.handle_actor_appearance_changed(world_id);
    }

    fn actor_removed(&self, world_id: Uuid) {
        self.handle_actor_removed(world_id);
    }

    fn object_added(&self, object: &ObjectPresence) {
        self.handle_object_added(object);
    }

    fn object_updated(&self, object: &ObjectPresence) {
        self.handle_object_updated(object);
    }

    fn object_removed(&self, object_id: Uuid) {
        self.handle_object_removed(object_id);
    }

    fn chat(&self, message: &ChatMessage) {
        self.handle_chat(message);
    }
}
