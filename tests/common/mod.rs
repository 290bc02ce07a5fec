//! Shared test utilities for aar
//!
//! This module provides common helpers for integration tests:
//! - A dispatcher that records every call
//! - An in-memory appearance archive
//! - Presence builders

pub mod fakes;
