//! Single-tracker slot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use suffcal_adapters::MediaSource;

use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::tracker::PhotoTracker;

/// Holds the one photo tracker of a process.
///
/// Two trackers on the same store would download and handle photos twice,
/// so a second [`TrackerSlot::init`] fails. A failed construction frees
/// the slot again.
#[derive(Default)]
pub struct TrackerSlot {
    claimed: AtomicBool,
    tracker: OnceLock<PhotoTracker>,
}

impl TrackerSlot {
    /// Creates an empty slot.
    pub const fn new() -> Self {
        Self {
            claimed: AtomicBool::new(false),
            tracker: OnceLock::new(),
        }
    }

    /// Constructs the tracker.
    ///
    /// # Errors
    /// Returns `AlreadyInitialized` if a tracker exists or is being
    /// constructed, and any error of [`PhotoTracker::new`].
    pub async fn init(
        &self,
        config: TrackerConfig,
        source: Arc<dyn MediaSource>,
    ) -> Result<&PhotoTracker> {
        if self.claimed.swap(true, Ordering::SeqCst) {
            return Err(TrackerError::AlreadyInitialized);
        }

        let tracker = match PhotoTracker::new(config, source).await {
            Ok(tracker) => tracker,
            Err(e) => {
                self.claimed.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        if self.tracker.set(tracker).is_err() {
            return Err(TrackerError::AlreadyInitialized);
        }
        self.get()
    }

    /// Returns the tracker.
    pub fn get(&self) -> Result<&PhotoTracker> {
        self.tracker.get().ok_or(TrackerError::NotInitialized)
    }

    /// Returns true once a tracker was constructed.
    pub fn is_initialized(&self) -> bool {
        self.tracker.get().is_some()
    }
}
