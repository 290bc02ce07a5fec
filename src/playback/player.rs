use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::clock::{Clock, Stopwatch};
use crate::event::{EventKind, EventLog, Vec3};
use crate::session::{SessionCatalog, SessionId, SessionStore};

use super::dispatch::{Dispatch, DispatchError};
use super::identity::IdentityMap;
use super::PlaybackError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    Stopped,
    Loaded,
    Playing,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnomalyReason {
    /// The event names a recorded actor that has no live counterpart
    /// (never added, or already removed)
    UnmappedIdentity,
    /// `ActorAdded` for a recorded actor that is already live
    DuplicateActor,
    DispatchFailed(String),
}

/// An event that could not be applied. Playback skips it and continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackAnomaly {
    pub ts_ms: u64,
    pub event: &'static str,
    pub recorded_id: Uuid,
    pub reason: AnomalyReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Events consumed this tick, including skipped ones
    pub dispatched: usize,
    pub anomalies: Vec<PlaybackAnomaly>,
    /// Playback reached the end of the session and cleaned up
    pub finished: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStatus {
    pub phase: PlaybackPhase,
    pub session_id: Option<SessionId>,
    pub cursor: usize,
    pub total_events: usize,
    pub elapsed_ms: u64,
    pub live_actors: usize,
}

impl std::fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.phase, &self.session_id) {
            (PlaybackPhase::Stopped, _) | (_, None) => write!(f, "player is standing by"),
            (phase, Some(id)) => write!(
                f,
                "player is {} session {id} at {}ms ({}/{} events, {} actors)",
                match phase {
                    PlaybackPhase::Loaded => "holding",
                    PlaybackPhase::Paused => "paused in",
                    _ => "playing",
                },
                self.elapsed_ms,
                self.cursor,
                self.total_events,
                self.live_actors
            ),
        }
    }
}

enum Flow {
    Continue,
    SessionEnd,
}

struct PlayerState {
    phase: PlaybackPhase,
    session_id: Option<SessionId>,
    log: EventLog,
    cursor: usize,
    identities: IdentityMap,
    stopwatch: Stopwatch,
    anomalies: Vec<PlaybackAnomaly>,
}

/// Playback engine.
///
/// Replays a stored session against a [`Dispatch`] implementation as an
/// external frame source calls [`Player::tick`]. Commands and ticks share one
/// lock, so a `stop` racing a `tick` is observed either before the drain or
/// after it, never halfway through.
pub struct Player {
    store: SessionStore,
    dispatch: Arc<dyn Dispatch>,
    clock: Arc<dyn Clock>,
    state: Mutex<PlayerState>,
}

impl Player {
    pub fn new(store: SessionStore, dispatch: Arc<dyn Dispatch>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            dispatch,
            clock,
            state: Mutex::new(PlayerState {
                phase: PlaybackPhase::Stopped,
                session_id: None,
                log: EventLog::new(),
                cursor: 0,
                identities: IdentityMap::new(),
                stopwatch: Stopwatch::new(),
                anomalies: Vec::new(),
            }),
        }
    }

    pub fn list_sessions(&self) -> Result<SessionCatalog, PlaybackError> {
        Ok(self.store.list()?)
    }

    /// Load by raw id as typed by an operator
    pub fn load_named(&self, raw: &str) -> Result<(), PlaybackError> {
        let session_id = SessionId::parse(raw).map_err(|e| {
            tracing::warn!(raw, "Error loading session, malformed session id");
            PlaybackError::from(e)
        })?;
        self.load(&session_id)
    }

    /// Decode a stored session and replay its snapshot (everything up to and
    /// including `SessionStart`) immediately, so the world is populated before
    /// the clock starts.
    pub fn load(&self, session_id: &SessionId) -> Result<(), PlaybackError> {
        let mut state = self.state.lock();
        match state.phase {
            PlaybackPhase::Playing | PlaybackPhase::Paused => {
                tracing::warn!(session_id = %session_id, "Error loading session, playback in progress");
                return Err(PlaybackError::AlreadyPlaying);
            }
            PlaybackPhase::Loaded => self.unload(&mut state),
            PlaybackPhase::Stopped => {}
        }

        let log = self.store.load(session_id).map_err(|e| {
            tracing::warn!(session_id = %session_id, error = %e, "Error loading session");
            PlaybackError::from(e)
        })?;

        state.session_id = Some(session_id.clone());
        state.log = log;
        state.anomalies.clear();
        self.rewind_locked(&mut state);
        tracing::info!(
            session_id = %session_id,
            events = state.log.len(),
            snapshot_events = state.cursor,
            "Loaded session"
        );
        Ok(())
    }

    pub fn play(&self) -> Result<(), PlaybackError> {
        let mut state = self.state.lock();
        let now = self.clock.now_ms();
        match state.phase {
            PlaybackPhase::Loaded => state.stopwatch.restart(now),
            PlaybackPhase::Paused => state.stopwatch.resume(now),
            PlaybackPhase::Playing => {
                tracing::warn!("Error starting playback, already playing");
                return Err(PlaybackError::AlreadyPlaying);
            }
            PlaybackPhase::Stopped => {
                tracing::warn!("Error starting playback, no session loaded");
                return Err(PlaybackError::NothingLoaded);
            }
        }
        state.phase = PlaybackPhase::Playing;
        tracing::info!("Playback Start");
        Ok(())
    }

    pub fn pause(&self) -> Result<(), PlaybackError> {
        let mut state = self.state.lock();
        if state.phase != PlaybackPhase::Playing {
            tracing::warn!(phase = ?state.phase, "Error pausing, not playing");
            return Err(PlaybackError::NotPlaying);
        }
        let now = self.clock.now_ms();
        state.stopwatch.stop(now);
        state.phase = PlaybackPhase::Paused;
        Ok(())
    }

    /// Halt playback, delete every actor playback created and discard the
    /// session. A stopped session has to be loaded again.
    pub fn stop(&self) -> Result<(), PlaybackError> {
        let mut state = self.state.lock();
        if state.phase == PlaybackPhase::Stopped {
            tracing::warn!("Error stopping, not playing");
            return Err(PlaybackError::NotPlaying);
        }
        self.unload(&mut state);
        tracing::info!("Playback stopped");
        Ok(())
    }

    /// Return to the start of the loaded session with a freshly populated
    /// world.
    pub fn rewind(&self) -> Result<(), PlaybackError> {
        let mut state = self.state.lock();
        if state.phase == PlaybackPhase::Stopped {
            return Err(PlaybackError::NothingLoaded);
        }
        self.delete_dispatched(&mut state);
        self.rewind_locked(&mut state);
        Ok(())
    }

    /// Dispatch every event that is due. Safe to call at any cadence; late
    /// ticks replay the backlog in log order.
    pub fn tick(&self) -> TickReport {
        let mut state = self.state.lock();
        let mut report = TickReport::default();
        if state.phase != PlaybackPhase::Playing {
            return report;
        }

        let elapsed = state.stopwatch.elapsed(self.clock.now_ms());
        while state.cursor < state.log.len() {
            let index = state.cursor;
            let due = state.log.get(index).is_some_and(|e| e.ts_ms <= elapsed);
            if !due {
                break;
            }
            state.cursor += 1;
            report.dispatched += 1;
            match self.dispatch_at(&mut state, index) {
                Ok(Flow::Continue) => {}
                Ok(Flow::SessionEnd) => {
                    tracing::info!("Playback Completed");
                    report.finished = true;
                    break;
                }
                Err(anomaly) => {
                    state.anomalies.push(anomaly.clone());
                    report.anomalies.push(anomaly);
                }
            }
        }

        if !report.finished && state.cursor >= state.log.len() {
            tracing::warn!("session ended without SessionEnd, stopping playback");
            report.finished = true;
        }
        if report.finished {
            self.unload(&mut state);
        }
        report
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.state.lock().phase
    }

    pub fn status(&self) -> PlayerStatus {
        let state = self.state.lock();
        PlayerStatus {
            phase: state.phase,
            session_id: state.session_id.clone(),
            cursor: state.cursor,
            total_events: state.log.len(),
            elapsed_ms: state.stopwatch.elapsed(self.clock.now_ms()),
            live_actors: state.identities.len(),
        }
    }

    /// Anomalies seen since the last load
    pub fn anomalies(&self) -> Vec<PlaybackAnomaly> {
        self.state.lock().anomalies.clone()
    }

    pub fn dispatched_id(&self, recorded: Uuid) -> Option<Uuid> {
        self.state.lock().identities.resolve(recorded)
    }

    // ---- helpers --------------------------------------------------------

    /// Reset to the beginning of `state.log` and replay the snapshot
    fn rewind_locked(&self, state: &mut PlayerState) {
        state.cursor = 0;
        state.stopwatch.reset();
        state.phase = PlaybackPhase::Loaded;

        let Some(start) = state.log.session_start_index() else {
            tracing::warn!("session has no SessionStart, nothing to pre-populate");
            return;
        };
        while state.cursor <= start {
            let index = state.cursor;
            state.cursor += 1;
            if let Err(anomaly) = self.dispatch_at(state, index) {
                state.anomalies.push(anomaly);
            }
        }
    }

    fn unload(&self, state: &mut PlayerState) {
        self.delete_dispatched(state);
        let now = self.clock.now_ms();
        state.stopwatch.stop(now);
        state.log.clear();
        state.cursor = 0;
        state.session_id = None;
        state.phase = PlaybackPhase::Stopped;
    }

    fn delete_dispatched(&self, state: &mut PlayerState) {
        for dispatched in state.identities.drain_dispatched() {
            if let Err(e) = self.dispatch.delete_actor(dispatched) {
                tracing::warn!(actor = %dispatched, error = %e, "failed to delete actor");
            }
        }
    }

    fn dispatch_at(&self, state: &mut PlayerState, index: usize) -> Result<Flow, PlaybackAnomaly> {
        let PlayerState {
            log, identities, ..
        } = state;
        let Some(event) = log.get(index) else {
            return Ok(Flow::Continue);
        };
        let anomaly = |recorded_id: Uuid, reason: AnomalyReason| {
            tracing::warn!(
                ts_ms = event.ts_ms,
                event = event.kind_name(),
                recorded_id = %recorded_id,
                reason = ?reason,
                "skipping event during playback"
            );
            PlaybackAnomaly {
                ts_ms: event.ts_ms,
                event: event.kind_name(),
                recorded_id,
                reason,
            }
        };
        let failed = |recorded_id: Uuid, e: DispatchError| {
            anomaly(recorded_id, AnomalyReason::DispatchFailed(e.to_string()))
        };
        tracing::trace!(ts_ms = event.ts_ms, event = event.kind_name(), "dispatch");

        match &event.kind {
            EventKind::SessionStart => {
                tracing::info!("Playback reached live section");
            }
            EventKind::SessionEnd => return Ok(Flow::SessionEnd),
            EventKind::ActorAdded {
                actor_id,
                first_name,
                last_name,
                appearance,
            } => {
                if identities.contains(*actor_id) {
                    return Err(anomaly(*actor_id, AnomalyReason::DuplicateActor));
                }
                let position = initial_position(log, index, *actor_id);
                let dispatched = self
                    .dispatch
                    .create_actor(first_name, last_name, appearance.as_ref(), position)
                    .map_err(|e| failed(*actor_id, e))?;
                identities.insert(*actor_id, dispatched);
            }
            EventKind::ActorMoved { actor_id, motion } => {
                let target = identities
                    .resolve(*actor_id)
                    .ok_or_else(|| anomaly(*actor_id, AnomalyReason::UnmappedIdentity))?;
                self.dispatch
                    .move_actor(target, motion)
                    .map_err(|e| failed(*actor_id, e))?;
            }
            EventKind::ActorAppearanceChanged {
                actor_id,
                appearance,
            } => {
                let target = identities
                    .resolve(*actor_id)
                    .ok_or_else(|| anomaly(*actor_id, AnomalyReason::UnmappedIdentity))?;
                self.dispatch
                    .set_actor_appearance(target, appearance)
                    .map_err(|e| failed(*actor_id, e))?;
            }
            EventKind::ActorAnimationChanged {
                actor_id,
                animations,
            } => {
                let target = identities
                    .resolve(*actor_id)
                    .ok_or_else(|| anomaly(*actor_id, AnomalyReason::UnmappedIdentity))?;
                self.dispatch
                    .set_actor_animations(target, animations)
                    .map_err(|e| failed(*actor_id, e))?;
            }
            EventKind::ActorRemoved { actor_id } => {
                let target = identities
                    .remove(*actor_id)
                    .ok_or_else(|| anomaly(*actor_id, AnomalyReason::UnmappedIdentity))?;
                self.dispatch
                    .delete_actor(target)
                    .map_err(|e| failed(*actor_id, e))?;
            }
            EventKind::ObjectAdded { object_id, .. }
            | EventKind::ObjectMoved { object_id, .. }
            | EventKind::ObjectRemoved { object_id } => {
                // Objects already exist in the target region
                tracing::trace!(object_id = %object_id, event = event.kind_name(), "object event not dispatched");
            }
            EventKind::ChatBroadcast {
                speaker_id,
                text,
                channel,
            } => match identities.resolve(*speaker_id) {
                Some(target) => self
                    .dispatch
                    .say(target, text, *channel)
                    .map_err(|e| failed(*speaker_id, e))?,
                None => {
                    tracing::debug!(speaker_id = %speaker_id, "chat from an actor playback does not control");
                }
            },
        }
        Ok(Flow::Continue)
    }
}

/// Position from the `ActorMoved` recorded alongside an `ActorAdded`
fn initial_position(log: &EventLog, added_at: usize, actor_id: Uuid) -> Vec3 {
    let Some(added_ts) = log.get(added_at).map(|e| e.ts_ms) else {
        return Vec3::ZERO;
    };
    log.events()[added_at + 1..]
        .iter()
        .take_while(|e| e.ts_ms == added_ts)
        .find_map(|e| match &e.kind {
            EventKind::ActorMoved {
                actor_id: moved,
                motion,
            } if *moved == actor_id => Some(motion.position),
            _ => None,
        })
        .unwrap_or(Vec3::ZERO)
}
