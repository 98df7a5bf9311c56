//! Sender-side sequence of records and its playback cursor.
//!
//! A [`Sequence`] is produced once per file and never mutated; replacing
//! the file means building a new sequence. [`Playback`] is the only mutable
//! sender state: a cursor over the sequence that a cooperative timer
//! advances (see [`run_playback`]).

use std::path::Path;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::chunk::{self, SourceFile, LARGE_SEQUENCE_WARNING};
use crate::error::{Error, Result};
use crate::file;
use crate::{DEFAULT_PLAYBACK_INTERVAL_MS, MAX_PLAYBACK_INTERVAL_MS, MIN_PLAYBACK_INTERVAL_MS};

/// The ordered records for one file.
#[derive(Debug, Clone)]
pub struct Sequence {
    source: SourceFile,
    chunk_size: usize,
    records: Vec<String>,
}

impl Sequence {
    /// Build a sequence from an in-memory buffer.
    ///
    /// `chunk_size` overrides the size picked from the MIME type.
    ///
    /// # Errors
    ///
    /// Returns an error if the chunk size is zero or a record cannot be
    /// serialized.
    pub fn from_bytes(
        bytes: &[u8],
        file_name: &str,
        mime_type: &str,
        chunk_size: Option<usize>,
    ) -> Result<Self> {
        let source = SourceFile::new(file_name, mime_type, bytes.len() as u64);
        let chunk_size = chunk_size.unwrap_or_else(|| chunk::chunk_size_for(source.mime_type()));

        let estimated = chunk::estimate_unit_count(source.size(), chunk_size);
        if estimated > LARGE_SEQUENCE_WARNING as u64 {
            tracing::warn!(
                file_name = source.name(),
                units = estimated,
                "File needs many QR codes, transfer may take a long time"
            );
        }

        let records = chunk::split(bytes, chunk_size, &source)?;

        Ok(Self {
            source,
            chunk_size,
            records,
        })
    }

    /// Build a sequence from a file on disk.
    ///
    /// The MIME type is guessed from the file extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if the path does not exist, or an
    /// I/O error if it cannot be read.
    pub fn from_path(path: &Path, chunk_size: Option<usize>) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }

        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidPath(path.display().to_string()))?;
        let mime_type = file::guess_mime_type(path);

        Self::from_bytes(&bytes, file_name, &mime_type, chunk_size)
    }

    /// Metadata of the file this sequence carries.
    #[must_use]
    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    /// Bytes per unit.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Serialized records in index order.
    #[must_use]
    pub fn records(&self) -> &[String] {
        &self.records
    }

    /// Record at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.records.get(index).map(String::as_str)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the sequence has no records (the file was empty).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// What a playback tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Moved to the given index
    Advanced(usize),
    /// Wrapped from the last record back to 0
    Wrapped,
    /// Reached the end without looping; playback stopped
    Halted,
    /// Not playing; cursor unchanged
    Idle,
}

/// Playback cursor over a sequence.
#[derive(Debug, Clone)]
pub struct Playback {
    index: usize,
    len: usize,
    playing: bool,
    looping: bool,
    interval: Duration,
}

impl Playback {
    /// Create a paused, looping cursor at the first record.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            index: 0,
            len,
            playing: false,
            looping: true,
            interval: Duration::from_millis(DEFAULT_PLAYBACK_INTERVAL_MS),
        }
    }

    /// Current index.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of records the cursor moves over.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the cursor advances on ticks.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Whether playback wraps to the start after the last record.
    #[must_use]
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Time between frames.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Set the time between frames, clamped to 200 ms - 3 s.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval.clamp(
            Duration::from_millis(MIN_PLAYBACK_INTERVAL_MS),
            Duration::from_millis(MAX_PLAYBACK_INTERVAL_MS),
        );
    }

    /// Enable or disable looping.
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Flip looping.
    pub fn toggle_loop(&mut self) {
        self.looping = !self.looping;
    }

    /// Start playing. Restarts from the first record if parked on the last.
    pub fn play(&mut self) {
        if !self.playing && self.len > 0 && self.index >= self.len - 1 {
            self.index = 0;
        }
        self.playing = self.len > 0;
    }

    /// Stop advancing. Pausing a paused cursor does nothing.
    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Play if paused, pause if playing.
    pub fn toggle_play(&mut self) {
        if self.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Jump back to the first record.
    pub fn reset_to_first(&mut self) {
        self.index = 0;
    }

    /// Step forward manually, wrapping only when looping.
    pub fn next_frame(&mut self) {
        if self.index + 1 < self.len {
            self.index += 1;
        } else if self.looping {
            self.index = 0;
        }
    }

    /// Step back manually; stays at 0.
    pub fn previous_frame(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    /// Advance once on a timer tick.
    pub fn tick(&mut self) -> Tick {
        if !self.playing || self.len == 0 {
            return Tick::Idle;
        }

        if self.index + 1 < self.len {
            self.index += 1;
            Tick::Advanced(self.index)
        } else if self.looping {
            self.index = 0;
            Tick::Wrapped
        } else {
            self.playing = false;
            Tick::Halted
        }
    }
}

/// Why a playback loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEnd {
    /// The cancellation token fired
    Cancelled,
    /// The last record was shown and looping is off
    Finished,
}

/// Show the sequence frame by frame until halted or cancelled.
///
/// `on_frame` receives the index and record text of every frame shown,
/// starting with the cursor's current position. Cancellation takes effect
/// before the next frame, including the first: a token cancelled before
/// the call shows nothing.
///
/// # Errors
///
/// Returns [`Error::EmptyFile`] for an empty sequence, or the first error
/// returned by `on_frame`.
pub async fn run_playback<F>(
    sequence: &Sequence,
    playback: &mut Playback,
    token: &CancellationToken,
    mut on_frame: F,
) -> Result<PlaybackEnd>
where
    F: FnMut(usize, &str) -> Result<()>,
{
    playback.play();

    let Some(first) = sequence.get(playback.index()) else {
        return Err(Error::EmptyFile(sequence.source().name().to_string()));
    };
    if token.is_cancelled() {
        playback.pause();
        tracing::debug!(index = playback.index(), "Playback cancelled before start");
        return Ok(PlaybackEnd::Cancelled);
    }
    on_frame(playback.index(), first)?;

    let mut ticker = tokio::time::interval_at(
        tokio::time::Instant::now() + playback.interval(),
        playback.interval(),
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => {
                playback.pause();
                tracing::debug!(index = playback.index(), "Playback cancelled");
                return Ok(PlaybackEnd::Cancelled);
            }
            _ = ticker.tick() => {
                match playback.tick() {
                    Tick::Halted | Tick::Idle => {
                        tracing::debug!(index = playback.index(), "Playback finished");
                        return Ok(PlaybackEnd::Finished);
                    }
                    Tick::Advanced(_) | Tick::Wrapped => {
                        if let Some(record) = sequence.get(playback.index()) {
                            on_frame(playback.index(), record)?;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence(len: usize) -> Sequence {
        let bytes = vec![7u8; len * 4];
        Sequence::from_bytes(&bytes, "seven.bin", "application/octet-stream", Some(4)).unwrap()
    }

    #[test]
    fn test_sequence_from_bytes_sizes_by_type() {
        let seq = Sequence::from_bytes(&[0u8; 600], "a.txt", "text/plain", None).unwrap();
        assert_eq!(seq.chunk_size(), 512);
        assert_eq!(seq.len(), 2);

        let seq = Sequence::from_bytes(&[0u8; 600], "a.png", "image/png", None).unwrap();
        assert_eq!(seq.chunk_size(), 128);
        assert_eq!(seq.len(), 5);
    }

    #[test]
    fn test_sequence_empty_file() {
        let seq = Sequence::from_bytes(&[], "empty.txt", "text/plain", None).unwrap();
        assert!(seq.is_empty());
        assert_eq!(seq.get(0), None);
    }

    #[test]
    fn test_sequence_from_missing_path() {
        let result = Sequence::from_path(Path::new("/definitely/not/here.bin"), None);
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_playback_defaults() {
        let playback = Playback::new(3);
        assert_eq!(playback.index(), 0);
        assert!(!playback.is_playing());
        assert!(playback.is_looping());
        assert_eq!(playback.interval(), Duration::from_millis(200));
    }

    #[test]
    fn test_playback_tick_loops() {
        let mut playback = Playback::new(3);
        assert_eq!(playback.tick(), Tick::Idle);

        playback.play();
        assert_eq!(playback.tick(), Tick::Advanced(1));
        assert_eq!(playback.tick(), Tick::Advanced(2));
        assert_eq!(playback.tick(), Tick::Wrapped);
        assert_eq!(playback.index(), 0);
    }

    #[test]
    fn test_playback_tick_halts_without_loop() {
        let mut playback = Playback::new(2);
        playback.set_looping(false);
        playback.play();

        assert_eq!(playback.tick(), Tick::Advanced(1));
        assert_eq!(playback.tick(), Tick::Halted);
        assert_eq!(playback.index(), 1);
        assert!(!playback.is_playing());
    }

    #[test]
    fn test_play_from_last_restarts() {
        let mut playback = Playback::new(3);
        playback.next_frame();
        playback.next_frame();
        assert_eq!(playback.index(), 2);

        playback.play();
        assert_eq!(playback.index(), 0);
        assert!(playback.is_playing());
    }

    #[test]
    fn test_manual_navigation() {
        let mut playback = Playback::new(2);
        playback.previous_frame();
        assert_eq!(playback.index(), 0);

        playback.next_frame();
        playback.next_frame();
        assert_eq!(playback.index(), 0, "looping wraps on next");

        playback.toggle_loop();
        playback.next_frame();
        playback.next_frame();
        assert_eq!(playback.index(), 1, "no wrap without looping");

        playback.reset_to_first();
        assert_eq!(playback.index(), 0);
    }

    #[test]
    fn test_pause_is_idempotent() {
        let mut playback = Playback::new(2);
        playback.toggle_play();
        assert!(playback.is_playing());
        playback.pause();
        playback.pause();
        assert!(!playback.is_playing());
    }

    #[test]
    fn test_empty_playback_never_plays() {
        let mut playback = Playback::new(0);
        playback.play();
        assert!(!playback.is_playing());
        assert_eq!(playback.tick(), Tick::Idle);
    }

    #[test]
    fn test_interval_is_clamped() {
        let mut playback = Playback::new(1);
        playback.set_interval(Duration::from_millis(50));
        assert_eq!(playback.interval(), Duration::from_millis(200));
        playback.set_interval(Duration::from_secs(10));
        assert_eq!(playback.interval(), Duration::from_millis(3000));
        playback.set_interval(Duration::from_millis(750));
        assert_eq!(playback.interval(), Duration::from_millis(750));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_playback_finishes_without_loop() {
        let seq = sequence(3);
        let mut playback = Playback::new(seq.len());
        playback.set_looping(false);
        let token = CancellationToken::new();

        let mut shown = Vec::new();
        let end = run_playback(&seq, &mut playback, &token, |index, _| {
            shown.push(index);
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(end, PlaybackEnd::Finished);
        assert_eq!(shown, vec![0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_playback_loops_until_cancelled() {
        let seq = sequence(2);
        let mut playback = Playback::new(seq.len());
        let token = CancellationToken::new();

        let mut shown = Vec::new();
        let end = run_playback(&seq, &mut playback, &token, |index, _| {
            shown.push(index);
            if shown.len() == 5 {
                token.cancel();
                token.cancel();
            }
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(end, PlaybackEnd::Cancelled);
        assert_eq!(shown, vec![0, 1, 0, 1, 0]);
        assert!(!playback.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_playback_empty_sequence() {
        let seq = Sequence::from_bytes(&[], "empty", "", None).unwrap();
        let mut playback = Playback::new(0);
        let token = CancellationToken::new();

        let result = run_playback(&seq, &mut playback, &token, |_, _| Ok(())).await;
        assert!(matches!(result, Err(Error::EmptyFile(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_playback_precancelled() {
        let seq = sequence(3);
        let mut playback = Playback::new(seq.len());
        let token = CancellationToken::new();
        token.cancel();

        let mut frames = 0;
        let end = run_playback(&seq, &mut playback, &token, |_, _| {
            frames += 1;
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(end, PlaybackEnd::Cancelled);
        assert_eq!(frames, 0);
        assert!(!playback.is_playing());
    }
}
