//! End-to-end tests for the sender/receiver protocol.
//!
//! These tests split buffers into records the way the sender does and
//! feed them to a receive session the way scans would arrive.

mod common;

use rand::seq::SliceRandom;

use qrbeam_core::chunk::{self, SourceFile};
use qrbeam_core::protocol::TransportRecord;
use qrbeam_core::sequence::Sequence;
use qrbeam_core::session::{IngestEvent, ReceiveSession, SessionState};
use qrbeam_core::Error;

use common::{create_temp_dir, create_test_file, random_bytes, receive_in_order};

/// Any buffer survives split then in-order ingest for several chunk sizes.
#[test]
fn test_round_trip_various_chunk_sizes() {
    let bytes = random_bytes(1000);

    for chunk_size in [1, 7, 128, 256, 999, 1000, 4096] {
        let sequence =
            Sequence::from_bytes(&bytes, "blob.bin", "application/octet-stream", Some(chunk_size))
                .expect("build sequence");

        let order: Vec<usize> = (0..sequence.len()).collect();
        let session = receive_in_order(sequence.records(), &order);

        assert!(session.is_complete(), "chunk size {chunk_size}");
        assert_eq!(session.assemble().expect("assemble"), bytes);
    }
}

/// Unit count is ceil(len / chunk_size).
#[test]
fn test_unit_count_matches_ceiling() {
    let source = SourceFile::new("a.bin", "application/octet-stream", 0);

    for (len, size, expected) in [(10, 3, 4), (9, 3, 3), (1, 256, 1), (0, 256, 0), (513, 512, 2)] {
        let records = chunk::split(&vec![0u8; len], size, &source).expect("split");
        assert_eq!(records.len(), expected, "len {len} size {size}");
    }
}

/// Shuffled arrival yields the same bytes as ordered arrival.
#[test]
fn test_permutation_independence() {
    let bytes = random_bytes(2000);
    let sequence = Sequence::from_bytes(&bytes, "photo.jpg", "image/jpeg", None).expect("sequence");
    assert_eq!(sequence.chunk_size(), chunk::MEDIA_CHUNK_SIZE);

    let mut order: Vec<usize> = (0..sequence.len()).collect();
    let mut rng = rand::thread_rng();

    for _ in 0..5 {
        order.shuffle(&mut rng);
        let session = receive_in_order(sequence.records(), &order);
        assert_eq!(session.assemble().expect("assemble"), bytes);
    }
}

/// Rescanning everything after completion changes nothing.
#[test]
fn test_ingest_is_idempotent() {
    let bytes = random_bytes(700);
    let sequence = Sequence::from_bytes(&bytes, "notes.txt", "text/plain", None).expect("sequence");

    let mut session = ReceiveSession::new();
    for record in sequence.records() {
        session.ingest(record);
    }
    let before = session.assemble().expect("assemble");

    for record in sequence.records() {
        let outcome = session.ingest(record);
        assert!(!outcome.accepted());
        assert!(matches!(
            outcome.events.as_slice(),
            [IngestEvent::DuplicateUnit { .. }]
        ));
    }

    assert_eq!(session.received_count() as usize, sequence.len());
    assert_eq!(session.assemble().expect("assemble"), before);
}

/// Units 0, 2 and 4 of 5 leave 1 and 3 missing.
#[test]
fn test_missing_units_reported() {
    let bytes = random_bytes(50);
    let sequence =
        Sequence::from_bytes(&bytes, "data.bin", "application/octet-stream", Some(10))
            .expect("sequence");
    assert_eq!(sequence.len(), 5);

    let session = receive_in_order(sequence.records(), &[0, 2, 4]);

    assert_eq!(session.state(), SessionState::Receiving);
    assert_eq!(session.missing_indices(), vec![1, 3]);

    match session.assemble() {
        Err(Error::MissingUnits { missing }) => assert_eq!(missing, vec![1, 3]),
        other => panic!("expected MissingUnits, got {other:?}"),
    }
}

/// Ten bytes at chunk size 3, received as 1, 0, 3 then 2.
#[test]
fn test_ten_byte_scenario() {
    let bytes: Vec<u8> = (1..=10).collect();
    let sequence =
        Sequence::from_bytes(&bytes, "ten.bin", "application/octet-stream", Some(3))
            .expect("sequence");

    let lengths: Vec<usize> = sequence
        .records()
        .iter()
        .map(|r| {
            let record = TransportRecord::parse(r).expect("parse");
            qrbeam_core::codec::decode(&record.data).expect("decode").len()
        })
        .collect();
    assert_eq!(lengths, vec![3, 3, 3, 1]);

    let mut session = ReceiveSession::new();
    for i in [1, 0, 3] {
        session.ingest(&sequence.records()[i]);
    }
    assert_eq!(session.missing_indices(), vec![2]);
    assert_eq!(session.state(), SessionState::Receiving);

    let outcome = session.ingest(&sequence.records()[2]);
    assert!(outcome.completed());
    assert_eq!(session.state(), SessionState::Complete);
    assert_eq!(session.assemble().expect("assemble"), bytes);
}

/// Garbage between valid scans is dropped without disturbing the session.
#[test]
fn test_malformed_scans_are_skipped() {
    let bytes = random_bytes(300);
    let sequence =
        Sequence::from_bytes(&bytes, "x.bin", "application/octet-stream", Some(100))
            .expect("sequence");

    let mut session = ReceiveSession::new();
    assert!(session.ingest("https://example.com").malformed());
    session.ingest(&sequence.records()[0]);
    assert!(session.ingest("{\"index\":1}").malformed());
    session.ingest(&sequence.records()[1]);
    session.ingest(&sequence.records()[2]);

    assert!(session.is_complete());
    assert_eq!(session.assemble().expect("assemble"), bytes);
}

/// A name without an extension gets one from the MIME type.
#[test]
fn test_extension_from_mime_type() {
    let sequence =
        Sequence::from_bytes(b"%PDF-1.4", "report", "application/pdf", None).expect("sequence");

    let mut session = ReceiveSession::new();
    session.ingest(&sequence.records()[0]);

    let metadata = session.metadata().expect("metadata");
    assert_eq!(metadata.file_extension.as_deref(), Some("pdf"));
    assert_eq!(metadata.output_file_name(), "report.pdf");
}

/// Reading from disk guesses the MIME type and keeps the file name.
#[test]
fn test_sequence_from_path() {
    let dir = create_temp_dir();
    let content = random_bytes(1500);
    let path = create_test_file(dir.path(), "song.mp3", &content);

    let sequence = Sequence::from_path(&path, None).expect("sequence");
    assert_eq!(sequence.source().name(), "song.mp3");
    assert_eq!(sequence.source().mime_type(), "audio/mpeg");
    assert_eq!(sequence.chunk_size(), chunk::MEDIA_CHUNK_SIZE);

    let order: Vec<usize> = (0..sequence.len()).rev().collect();
    let session = receive_in_order(sequence.records(), &order);
    let metadata = session.metadata().expect("metadata");

    assert_eq!(metadata.output_file_name(), "song.mp3");
    assert_eq!(session.assemble().expect("assemble"), content);
}

/// A missing file is reported, not panicked on.
#[test]
fn test_sequence_from_missing_path() {
    let dir = create_temp_dir();
    let result = Sequence::from_path(&dir.path().join("absent.txt"), None);
    assert!(matches!(result, Err(Error::FileNotFound(_))));
}

/// A second transfer only starts after a reset.
#[test]
fn test_reset_between_transfers() {
    let first = Sequence::from_bytes(b"first file", "a.txt", "text/plain", Some(4))
        .expect("sequence");
    let second = Sequence::from_bytes(b"second file!", "b.txt", "text/plain", Some(4))
        .expect("sequence");

    let mut session = ReceiveSession::new();
    for record in first.records() {
        session.ingest(record);
    }
    assert_eq!(session.assemble().expect("assemble"), b"first file");

    let outcome = session.ingest(&second.records()[0]);
    assert!(!outcome.accepted());

    session.reset();
    assert_eq!(session.state(), SessionState::Empty);
    for record in second.records() {
        session.ingest(record);
    }
    assert_eq!(session.assemble().expect("assemble"), b"second file!");
}
