//! Scan stream debouncing and statistics.
//!
//! A code that stays in front of the camera is decoded on many consecutive
//! frames. [`ScanDebouncer`] suppresses repeats of the payload currently
//! being settled so each code is handed to the session once per sighting.
//! This is timing based and keyed by raw text; it is separate from the
//! index based duplicate detection in [`crate::session`].

use std::time::{Duration, Instant};

/// Suppresses identical payloads arriving within a short window.
#[derive(Debug)]
pub struct ScanDebouncer {
    window: Duration,
    in_flight: Option<(String, Instant)>,
}

impl Default for ScanDebouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::DEFAULT_DEBOUNCE_WINDOW_MS))
    }
}

impl ScanDebouncer {
    /// Create a debouncer with the given suppression window.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            in_flight: None,
        }
    }

    /// The suppression window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Decide whether a payload scanned now should be processed.
    pub fn accept(&mut self, payload: &str) -> bool {
        self.accept_at(payload, Instant::now())
    }

    /// Decide whether a payload scanned at `now` should be processed.
    ///
    /// Returns `false` when `payload` equals the in-flight payload and the
    /// window since it was last seen has not elapsed. Each suppressed
    /// sighting restarts the window, so a code held in view is handed over
    /// once. Any other payload is accepted and becomes the new in-flight
    /// payload.
    pub fn accept_at(&mut self, payload: &str, now: Instant) -> bool {
        if let Some((last, since)) = &mut self.in_flight {
            if last == payload && now.saturating_duration_since(*since) < self.window {
                *since = now;
                tracing::trace!("Suppressed repeated scan");
                return false;
            }
        }

        self.in_flight = Some((payload.to_string(), now));
        true
    }

    /// Forget the in-flight payload.
    pub fn clear(&mut self) {
        self.in_flight = None;
    }
}

/// Counts scans to report a scanning rate.
#[derive(Debug, Clone)]
pub struct ScanStats {
    started_at: Instant,
    scans: u64,
}

impl Default for ScanStats {
    fn default() -> Self {
        Self::start()
    }
}

impl ScanStats {
    /// Start counting from now.
    #[must_use]
    pub fn start() -> Self {
        Self {
            started_at: Instant::now(),
            scans: 0,
        }
    }

    /// Record one processed scan.
    pub fn record_scan(&mut self) {
        self.scans += 1;
    }

    /// Scans recorded so far.
    #[must_use]
    pub fn scans(&self) -> u64 {
        self.scans
    }

    /// Time since counting started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Average scans per second, 0 if no time has passed.
    #[must_use]
    pub fn scans_per_second(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.scans as f64 / secs
        } else {
            0.0
        }
    }
}
