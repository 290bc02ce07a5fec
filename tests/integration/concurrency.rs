//! Integration tests for notifications and commands arriving from many threads

use std::sync::Arc;
use std::thread;

use aar::capture::{Recorder, WorldHub, WorldObserver};
use aar::event::{EventKind, Vec3};
use aar::{ManualClock, MemoryStorage, PlaybackPhase, Player, SessionStore, SystemClock};

use super::common::fakes::{presence, MemoryArchive, RecordingDispatch};

#[test]
fn test_concurrent_producers_keep_log_ordered() {
    const PRODUCERS: u128 = 8;
    const UPDATES: u32 = 200;

    let clock = Arc::new(SystemClock::new());
    let recorder = Arc::new(Recorder::new(clock, Arc::new(MemoryArchive::default())));
    let hub = Arc::new(WorldHub::new());
    recorder.attach(hub.as_ref());
    recorder.start_recording().unwrap();

    let handles: Vec<_> = (1..=PRODUCERS)
        .map(|id| {
            let hub = hub.clone();
            thread::spawn(move || {
                let mut actor = presence(id, &format!("Bot{id}"), Vec3::ZERO);
                hub.actor_added(&actor);
                for step in 1..=UPDATES {
                    actor.motion.position = Vec3::new(step as f32, id as f32, 0.0);
                    hub.actor_updated(&actor);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("producer panicked");
    }
    recorder.stop_recording().unwrap();

    let log = recorder.log();
    assert!(log
        .events()
        .windows(2)
        .all(|pair| pair[0].ts_ms <= pair[1].ts_ms));

    let counts = log.kind_counts();
    assert_eq!(counts.get("ActorAdded"), Some(&(PRODUCERS as usize)));
    assert_eq!(
        counts.get("ActorMoved"),
        Some(&(PRODUCERS as usize * (UPDATES as usize + 1)))
    );
    assert!(matches!(
        log.events().last().map(|e| &e.kind),
        Some(EventKind::SessionEnd)
    ));
}

#[test]
fn test_stop_racing_ticks_leaves_no_actors_behind() {
    let clock = Arc::new(ManualClock::new());
    let recorder = Recorder::new(clock.clone(), Arc::new(MemoryArchive::default()));
    for id in 1..=20 {
        recorder.handle_actor_added(&presence(id, "Crowd", Vec3::new(id as f32, 0.0, 0.0)));
    }
    recorder.start_recording().unwrap();
    clock.advance(10_000);
    recorder.stop_recording().unwrap();
    let store = SessionStore::with_storage(Arc::new(MemoryStorage::new()));
    let id = recorder.save(&store).unwrap();

    let dispatch = Arc::new(RecordingDispatch::new());
    let player = Arc::new(Player::new(store, dispatch.clone(), clock.clone()));
    player.load(&id).unwrap();
    player.play().unwrap();

    let ticker = {
        let player = player.clone();
        let clock = clock.clone();
        thread::spawn(move || {
            for _ in 0..500 {
                clock.advance(1);
                player.tick();
            }
        })
    };
    player.stop().unwrap();
    ticker.join().expect("ticker panicked");

    assert_eq!(player.phase(), PlaybackPhase::Stopped);
    let mut created = dispatch.created();
    let mut deleted = dispatch.deleted();
    created.sort();
    deleted.sort();
    assert_eq!(created.len(), 20);
    assert_eq!(created, deleted);
}
