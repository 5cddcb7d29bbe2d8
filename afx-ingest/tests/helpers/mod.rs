//! Test helper utilities
//!
//! Shared fixtures for the afx-ingest integration tests

#![allow(dead_code)]

pub mod audio_generator;
pub mod db_utils;
pub mod mocks;

pub use audio_generator::{generate_test_library, generate_test_wav, AudioConfig};
pub use db_utils::{count_rows, create_test_db};
pub use mocks::{full_bundle, MemoryIndex, MockExtractor, RecordingStore};
