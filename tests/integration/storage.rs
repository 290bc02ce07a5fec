//! Integration tests for session persistence on disk

use std::sync::Arc;

use aar::codec::SessionCodec;
use aar::event::{ActorMotion, EventKind, EventLog, Vec3};
use aar::playback::PlaybackError;
use aar::session::list_sessions;
use aar::{DirStorage, MemoryStorage, Player, SessionId, SessionStore, Storage, SystemClock};
use tempfile::TempDir;
use uuid::Uuid;

use super::common::fakes::RecordingDispatch;

fn busy_log(moves: u32) -> EventLog {
    let actor = Uuid::from_u128(42);
    let mut log = EventLog::new();
    log.record(
        0,
        EventKind::ActorAdded {
            actor_id: actor,
            first_name: "Ada".into(),
            last_name: "Tester".into(),
            appearance: None,
        },
    );
    log.record(0, EventKind::SessionStart);
    for i in 0..moves {
        log.record(
            u64::from(i) * 10,
            EventKind::ActorMoved {
                actor_id: actor,
                motion: ActorMotion::at(Vec3::new(i as f32, (i * 7 % 13) as f32, 22.5)),
            },
        );
    }
    log.record(u64::from(moves) * 10, EventKind::SessionEnd);
    log
}

#[test]
fn test_catalog_counts_chunks_per_session() {
    let storage = MemoryStorage::new();
    for name in ["session:abc:0", "session:abc:1", "session:xyz:0"] {
        storage.write_text(name, "x").unwrap();
    }
    storage.write_text("unrelated", "x").unwrap();

    let catalog = list_sessions(&storage).unwrap();

    let entries: Vec<(String, usize)> = catalog
        .into_iter()
        .map(|(id, n)| (id.to_string(), n))
        .collect();
    assert_eq!(
        entries,
        vec![("abc".to_string(), 2), ("xyz".to_string(), 1)]
    );
}

#[test]
fn test_multi_chunk_session_survives_reopen() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let id = SessionId::parse("field-exercise_7").unwrap();
    let log = busy_log(200);

    {
        let storage = Arc::new(DirStorage::open(dir.path()).unwrap());
        let store = SessionStore::new(storage, SessionCodec::new(100));
        let chunks = store.save(&id, &log).unwrap();
        assert!(chunks > 1, "expected several chunks, got {chunks}");
    }

    let storage = Arc::new(DirStorage::open(dir.path()).unwrap());
    let store = SessionStore::new(storage.clone(), SessionCodec::new(100));
    let catalog = store.list().unwrap();
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.get(&id).copied(), store.chunk_count(&id).unwrap());

    let loaded = store.load(&id).unwrap();
    assert_eq!(loaded, log);
}

#[test]
fn test_missing_chunk_is_corrupt() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let storage = Arc::new(DirStorage::open(dir.path()).unwrap());
    let store = SessionStore::new(storage.clone(), SessionCodec::new(64));
    let id = SessionId::parse("gappy").unwrap();
    let chunks = store.save(&id, &busy_log(50)).unwrap();
    assert!(chunks >= 3);

    storage.delete("session:gappy:1").unwrap();

    let dispatch = Arc::new(RecordingDispatch::new());
    let player = Player::new(store, dispatch.clone(), Arc::new(SystemClock::new()));
    let err = player.load(&id).unwrap_err();
    assert!(matches!(err, PlaybackError::CorruptSession(_)), "{err}");
    assert!(dispatch.calls().is_empty());
}

#[test]
fn test_resave_shrinks_chunk_range() {
    let storage = Arc::new(MemoryStorage::new());
    let store = SessionStore::new(storage.clone(), SessionCodec::new(80));
    let id = SessionId::parse("shrink").unwrap();

    let long = store.save(&id, &busy_log(100)).unwrap();
    let short = store.save(&id, &busy_log(1)).unwrap();

    assert!(short < long);
    assert_eq!(store.chunk_count(&id).unwrap(), Some(short));
    assert_eq!(store.load(&id).unwrap(), busy_log(1));
}

#[test]
fn test_delete_and_purge() {
    let storage = Arc::new(MemoryStorage::new());
    let store = SessionStore::with_storage(storage.clone());
    let keep = SessionId::parse("keep").unwrap();
    let gone = SessionId::parse("gone").unwrap();
    store.save(&keep, &busy_log(3)).unwrap();
    store.save(&gone, &busy_log(3)).unwrap();

    store.delete(&gone).unwrap();
    assert_eq!(store.list().unwrap().keys().cloned().collect::<Vec<_>>(), vec![keep]);

    store.purge().unwrap();
    assert!(storage.is_empty());
}
