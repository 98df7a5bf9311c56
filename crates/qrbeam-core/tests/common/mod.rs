//! Common test utilities for `qrbeam` integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use qrbeam_core::session::ReceiveSession;

/// Create a temporary directory for test files.
///
/// The directory will be automatically cleaned up when the returned
/// `TempDir` is dropped.
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Create a test file with the given content.
pub fn create_test_file(dir: &std::path::Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directories");
    }
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Generate random bytes for testing.
pub fn random_bytes(size: usize) -> Vec<u8> {
    use rand::RngCore;
    let mut bytes = vec![0u8; size];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Feed records to a fresh session in the given order.
pub fn receive_in_order(records: &[String], order: &[usize]) -> ReceiveSession {
    let mut session = ReceiveSession::new();
    for &i in order {
        session.ingest(&records[i]);
    }
    session
}
