//! Integration tests for the record → save → load → play cycle

use std::sync::Arc;

use super::common::fakes::{presence, DispatchCall, MemoryArchive, RecordingDispatch};
use aar::capture::{ChatMessage, NotificationSource, Recorder, WorldHub, WorldObserver};
use aar::event::{EventKind, EventLog, Vec3};
use aar::{ManualClock, MemoryStorage, PlaybackPhase, Player, SessionId, SessionStore};
use uuid::Uuid;

struct World {
    clock: Arc<ManualClock>,
    hub: WorldHub,
    archive: Arc<MemoryArchive>,
    recorder: Arc<Recorder>,
    store: SessionStore,
}

fn world() -> World {
    let clock = Arc::new(ManualClock::new());
    let archive = Arc::new(MemoryArchive::default());
    let recorder = Arc::new(Recorder::new(clock.clone(), archive.clone()));
    let hub = WorldHub::new();
    recorder.attach(&hub);
    World {
        clock,
        hub,
        archive,
        recorder,
        store: SessionStore::with_storage(Arc::new(MemoryStorage::new())),
    }
}

fn player(w: &World) -> (Player, Arc<RecordingDispatch>) {
    let dispatch = Arc::new(RecordingDispatch::new());
    let player = Player::new(w.store.clone(), dispatch.clone(), w.clock.clone());
    (player, dispatch)
}

/// Play until the session cleans itself up, ticking every `step` ms
fn play_out(player: &Player, clock: &ManualClock, step: u64) {
    player.play().expect("play");
    for _ in 0..1_000 {
        if player.tick().finished {
            return;
        }
        clock.advance(step);
    }
    panic!("playback did not finish");
}

#[test]
fn test_duplicate_move_is_not_replayed() {
    let w = world();
    let a = presence(1, "Ada", Vec3::ZERO);

    w.recorder.start_recording().unwrap();
    w.hub.actor_added(&a);

    w.clock.advance(10);
    let mut moved = a.clone();
    moved.motion.position = Vec3::new(1.0, 0.0, 0.0);
    w.hub.actor_updated(&moved);

    w.clock.advance(10);
    w.hub.actor_updated(&moved);

    w.clock.advance(10);
    w.recorder.stop_recording().unwrap();
    let id = w.recorder.save(&w.store).unwrap();

    let (player, dispatch) = player(&w);
    player.load(&id).unwrap();
    play_out(&player, &w.clock, 5);

    let calls = dispatch.calls();
    let Some(DispatchCall::Create {
        name, appearance, ..
    }) = calls.first()
    else {
        panic!("first call should create the actor: {calls:?}");
    };
    assert_eq!(name, "Ada Tester");
    assert_eq!(
        appearance.as_deref(),
        Some(format!("{id}-appearance-{}-0", a.world_id).as_str())
    );
    assert_eq!(dispatch.moves_to(Vec3::new(1.0, 0.0, 0.0)), 1);
    assert_eq!(dispatch.deleted(), dispatch.created());
    assert!(matches!(calls.last(), Some(DispatchCall::Delete(_))));
    assert_eq!(player.phase(), PlaybackPhase::Stopped);
}

#[test]
fn test_actors_present_at_start_are_populated_on_load() {
    let w = world();
    w.hub.actor_added(&presence(1, "Ada", Vec3::new(3.0, 4.0, 0.0)));
    w.hub.actor_added(&presence(2, "Bob", Vec3::new(9.0, 9.0, 0.0)));

    w.clock.set(60_000);
    let id = w.recorder.start_recording().unwrap();
    w.clock.advance(100);
    w.hub.actor_removed(Uuid::from_u128(2));
    w.clock.advance(100);
    w.recorder.stop_recording().unwrap();
    w.recorder.save(&w.store).unwrap();

    let (player, dispatch) = player(&w);
    player.load(&id).unwrap();

    let positions: Vec<Vec3> = dispatch
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            DispatchCall::Create { position, .. } => Some(position),
            _ => None,
        })
        .collect();
    assert_eq!(
        positions,
        vec![Vec3::new(3.0, 4.0, 0.0), Vec3::new(9.0, 9.0, 0.0)]
    );
    assert_eq!(player.phase(), PlaybackPhase::Loaded);

    play_out(&player, &w.clock, 50);
    assert_eq!(dispatch.deleted().len(), 2);
    assert_eq!(player.status().live_actors, 0);
}

#[test]
fn test_irregular_ticks_dispatch_in_order() {
    let w = world();
    let a = Uuid::from_u128(1);
    let mut log = EventLog::new();
    log.record(0, EventKind::SessionStart);
    log.record(
        0,
        EventKind::ActorAdded {
            actor_id: a,
            first_name: "Ada".into(),
            last_name: "Tester".into(),
            appearance: None,
        },
    );
    for (ts, x) in [(50, 1.0), (50, 2.0), (200, 3.0)] {
        log.record(
            ts,
            EventKind::ActorMoved {
                actor_id: a,
                motion: aar::event::ActorMotion::at(Vec3::new(x, 0.0, 0.0)),
            },
        );
    }
    let id = SessionId::parse("irregular").unwrap();
    w.store.save(&id, &log).unwrap();

    let (player, dispatch) = player(&w);
    player.load(&id).unwrap();
    player.play().unwrap();

    let mut drained = Vec::new();
    for at in [0, 30, 30, 120, 260] {
        w.clock.set(at);
        drained.push(player.tick().dispatched);
    }

    assert_eq!(drained, vec![1, 0, 0, 2, 1]);
    let xs: Vec<f32> = dispatch
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            DispatchCall::Move(_, p) => Some(p.x),
            _ => None,
        })
        .collect();
    assert_eq!(xs, vec![1.0, 2.0, 3.0]);
    // No SessionEnd: exhaustion still cleans up
    assert_eq!(player.phase(), PlaybackPhase::Stopped);
    assert_eq!(dispatch.deleted(), dispatch.created());
}

#[test]
fn test_chat_replays_through_created_actor() {
    let w = world();
    let a = presence(1, "Ada", Vec3::ZERO);
    w.hub.actor_added(&a);
    w.recorder.start_recording().unwrap();
    w.clock.advance(5);
    w.hub.chat(&ChatMessage {
        speaker_id: a.world_id,
        text: "hello world".into(),
        channel: 0,
    });
    w.hub.chat(&ChatMessage {
        speaker_id: a.world_id,
        text: String::new(),
        channel: 0,
    });
    w.clock.advance(5);
    w.recorder.stop_recording().unwrap();
    let id = w.recorder.save(&w.store).unwrap();

    let (player, dispatch) = player(&w);
    player.load(&id).unwrap();
    play_out(&player, &w.clock, 1);

    let said: Vec<String> = dispatch
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            DispatchCall::Say(_, text) => Some(text),
            _ => None,
        })
        .collect();
    assert_eq!(said, vec!["hello world".to_string()]);
}

#[test]
fn test_discard_releases_appearance_snapshots() {
    let w = world();
    w.recorder.start_recording().unwrap();
    w.hub.actor_added(&presence(1, "Ada", Vec3::ZERO));
    w.hub.actor_appearance_changed(Uuid::from_u128(1));
    w.recorder.stop_recording().unwrap();

    w.recorder.discard();

    let issued = w.archive.issued.lock().clone();
    assert_eq!(issued.len(), 2);
    assert_eq!(*w.archive.discarded.lock(), issued);
    assert!(w.store.list().unwrap().is_empty());
}

#[test]
fn test_detached_recorder_ignores_world() {
    let w = world();
    let hub = WorldHub::new();
    let subscription = w.recorder.attach(&hub);
    w.recorder.start_recording().unwrap();
    w.recorder.detach(&hub, subscription);

    hub.actor_added(&presence(5, "Eve", Vec3::ZERO));

    assert!(w.recorder.tracked_actor(Uuid::from_u128(5)).is_none());
    assert!(!hub.unsubscribe(subscription));
}
