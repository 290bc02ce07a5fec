//! Integration tests for aar
//!
//! These tests drive recording, persistence and playback together.

#[path = "../common/mod.rs"]
pub mod common;

pub mod concurrency;
pub mod record_replay;
pub mod storage;
