//! Receiver-side accumulation of scanned units.
//!
//! A [`ReceiveSession`] is fed the text of every decoded QR code, in
//! whatever order and multiplicity the camera produces them, and tracks
//! which units of the transfer are present.
//!
//! ## States
//!
//! ```text
//!             first valid record          last missing unit
//!   Empty ───────────────────────▶ Receiving ─────────────────▶ Complete
//!     ▲                                 │                           │
//!     └──────────────── reset() ────────┴───────────────────────────┘
//! ```
//!
//! Every anomaly (unparseable code, metadata that disagrees with the first
//! record, a unit seen before) is reported as an [`IngestEvent`] and never
//! aborts the transfer. Only [`ReceiveSession::reset`] discards progress.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::assemble;
use crate::codec;
use crate::error::{Error, Result};
use crate::protocol::{FileMetadata, TransportRecord};

/// Lifecycle state of a receive session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No record seen yet
    Empty,
    /// Metadata known, some units still missing
    Receiving,
    /// Every unit present
    Complete,
}

/// Something that happened while ingesting one scanned payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestEvent {
    /// The payload was not a usable record and was dropped
    MalformedRecord {
        /// Why the payload was rejected
        reason: String,
    },
    /// First record of a transfer; its metadata was adopted
    Started {
        /// Adopted metadata
        metadata: FileMetadata,
    },
    /// The record's metadata disagrees with the adopted metadata
    MetadataMismatch {
        /// Metadata adopted from the first record
        expected: FileMetadata,
        /// Metadata carried by this record
        found: FileMetadata,
    },
    /// The unit was already present; nothing changed
    DuplicateUnit {
        /// Unit index
        index: u32,
    },
    /// A new unit was stored
    UnitAccepted {
        /// Unit index
        index: u32,
        /// Units held after this one
        received: u32,
    },
    /// Every unit is now present
    TransferComplete,
}

/// Progress checkpoints worth telling the operator about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Milestone {
    /// Units received
    pub received: u32,
    /// Units in the transfer
    pub total: u32,
}

impl Milestone {
    /// Progress as a whole percentage.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            100
        } else {
            ((f64::from(self.received) / f64::from(self.total)) * 100.0).round() as u32
        }
    }
}

/// Result of ingesting one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Events in the order they occurred
    pub events: Vec<IngestEvent>,
    /// Set when the accepted unit reached a progress checkpoint
    pub milestone: Option<Milestone>,
}

impl IngestOutcome {
    fn push(&mut self, event: IngestEvent) {
        self.events.push(event);
    }

    /// Whether a new unit was stored.
    #[must_use]
    pub fn accepted(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, IngestEvent::UnitAccepted { .. }))
    }

    /// Whether this payload completed the transfer.
    #[must_use]
    pub fn completed(&self) -> bool {
        self.events.contains(&IngestEvent::TransferComplete)
    }

    /// Whether the payload was dropped as malformed.
    #[must_use]
    pub fn malformed(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, IngestEvent::MalformedRecord { .. }))
    }
}

/// Receiver-side transfer session.
#[derive(Debug)]
pub struct ReceiveSession {
    /// Local identifier for log correlation, regenerated on reset
    id: Uuid,
    metadata: Option<FileMetadata>,
    units: BTreeMap<u32, Vec<u8>>,
    last_index: Option<u32>,
}

impl Default for ReceiveSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiveSession {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            metadata: None,
            units: BTreeMap::new(),
            last_index: None,
        }
    }

    /// Local session identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        match &self.metadata {
            None => SessionState::Empty,
            Some(_) if self.is_complete() => SessionState::Complete,
            Some(_) => SessionState::Receiving,
        }
    }

    /// Metadata adopted from the first record, if any.
    #[must_use]
    pub fn metadata(&self) -> Option<&FileMetadata> {
        self.metadata.as_ref()
    }

    /// Units in the transfer, or 0 before the first record.
    #[must_use]
    pub fn total_chunks(&self) -> u32 {
        self.metadata.as_ref().map_or(0, |m| m.total_chunks)
    }

    /// Units received so far.
    #[must_use]
    pub fn received_count(&self) -> u32 {
        u32::try_from(self.units.len()).unwrap_or(u32::MAX)
    }

    /// Index of the most recently accepted unit.
    #[must_use]
    pub fn last_index(&self) -> Option<u32> {
        self.last_index
    }

    /// Whether a given unit has been received.
    #[must_use]
    pub fn has_unit(&self, index: u32) -> bool {
        self.units.contains_key(&index)
    }

    /// Whether every unit of the transfer is present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.metadata.as_ref().is_some_and(|m| {
            self.units.len() == m.total_chunks as usize
                && (0..m.total_chunks).all(|i| self.units.contains_key(&i))
        })
    }

    /// Indices not yet received, ascending.
    ///
    /// Empty before the first record: without metadata there is no total
    /// to compare against, so check [`state`](Self::state) first.
    #[must_use]
    pub fn missing_indices(&self) -> Vec<u32> {
        self.metadata.as_ref().map_or_else(Vec::new, |m| {
            assemble::missing_indices(&self.units, m.total_chunks)
        })
    }

    /// Indices not yet received, ascending, produced on demand.
    ///
    /// Prefer this over [`missing_indices`](Self::missing_indices) when only
    /// the first few are shown.
    pub fn missing_iter(&self) -> impl Iterator<Item = u32> + '_ {
        let total = self.total_chunks();
        assemble::missing_iter(&self.units, total)
    }

    /// Number of indices not yet received.
    #[must_use]
    pub fn missing_count(&self) -> u32 {
        self.total_chunks().saturating_sub(self.received_count())
    }

    /// Overall progress as a percentage (0.0 - 100.0).
    #[must_use]
    pub fn progress_percentage(&self) -> f64 {
        match self.total_chunks() {
            0 => 0.0,
            total => (f64::from(self.received_count()) / f64::from(total)) * 100.0,
        }
    }

    /// Feed one scanned payload into the session.
    ///
    /// Never fails: anomalies are reported in the returned outcome and the
    /// session stays usable.
    pub fn ingest(&mut self, raw: &str) -> IngestOutcome {
        let mut outcome = IngestOutcome::default();

        let record = match TransportRecord::parse(raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(session = %self.id, error = %e, "Dropping unreadable code");
                outcome.push(IngestEvent::MalformedRecord {
                    reason: e.to_string(),
                });
                return outcome;
            }
        };

        let total_chunks = match &self.metadata {
            None => {
                let metadata = record.metadata();
                tracing::info!(
                    session = %self.id,
                    file_name = %metadata.file_name,
                    file_type = %metadata.file_type,
                    file_size = metadata.file_size,
                    total_chunks = metadata.total_chunks,
                    "Started receiving file"
                );
                let total = metadata.total_chunks;
                self.metadata = Some(metadata.clone());
                outcome.push(IngestEvent::Started { metadata });
                total
            }
            Some(expected) => {
                if !expected.matches(&record) {
                    tracing::warn!(
                        session = %self.id,
                        index = record.index,
                        expected_name = %expected.file_name,
                        found_name = %record.file_name,
                        expected_total = expected.total_chunks,
                        found_total = record.total_chunks,
                        "Record metadata differs from first record, keeping first"
                    );
                    outcome.push(IngestEvent::MetadataMismatch {
                        expected: expected.clone(),
                        found: record.metadata(),
                    });
                }
                expected.total_chunks
            }
        };

        if record.index >= total_chunks {
            outcome.push(IngestEvent::MalformedRecord {
                reason: format!(
                    "index {} out of range for {total_chunks} unit(s)",
                    record.index
                ),
            });
            return outcome;
        }

        if self.units.contains_key(&record.index) {
            tracing::debug!(session = %self.id, index = record.index, "Unit already received");
            outcome.push(IngestEvent::DuplicateUnit {
                index: record.index,
            });
            return outcome;
        }

        let bytes = match codec::decode(&record.data) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(session = %self.id, index = record.index, error = %e, "Dropping unit with bad payload");
                outcome.push(IngestEvent::MalformedRecord {
                    reason: e.to_string(),
                });
                return outcome;
            }
        };

        self.units.insert(record.index, bytes);
        self.last_index = Some(record.index);

        let received = self.received_count();
        tracing::debug!(
            session = %self.id,
            index = record.index,
            received,
            total = total_chunks,
            "Accepted unit"
        );
        outcome.push(IngestEvent::UnitAccepted {
            index: record.index,
            received,
        });

        if self.is_complete() {
            tracing::info!(session = %self.id, total = total_chunks, "All units received");
            outcome.push(IngestEvent::TransferComplete);
        } else if is_milestone(received, total_chunks) {
            outcome.milestone = Some(Milestone {
                received,
                total: total_chunks,
            });
        }

        outcome
    }

    /// Reassemble the file from the received units.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveTransfer`] before the first record, or
    /// [`Error::MissingUnits`] while units are still missing.
    pub fn assemble(&self) -> Result<Vec<u8>> {
        let metadata = self.metadata.as_ref().ok_or(Error::NoActiveTransfer)?;
        assemble::assemble(&self.units, metadata.total_chunks)
    }

    /// Discard all progress and return to [`SessionState::Empty`].
    pub fn reset(&mut self) {
        tracing::info!(
            session = %self.id,
            received = self.units.len(),
            "Receive session reset"
        );
        self.metadata = None;
        self.units.clear();
        self.last_index = None;
        self.id = Uuid::new_v4();
    }
}

/// First unit, every fifth unit, and the halfway point.
fn is_milestone(received: u32, total: u32) -> bool {
    received == 1 || received % 5 == 0 || received == total / 2
}
