//! Tracker configuration.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use suffcal_models::MediaType;

/// Default time between acquisition cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(240 * 60);

/// Default per-cycle download cap.
pub const DEFAULT_MAX_DOWNLOADS: usize = 20;

/// Login for the media network.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account used to log in.
    pub user: String,
    /// Password of that account.
    pub password: String,
}

impl Credentials {
    /// Creates credentials.
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Configuration for the photo tracker.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Handle of the tracked account.
    pub target_user: String,
    /// Login for the media network.
    pub credentials: Credentials,
    /// Directory holding the photo store.
    pub storage_root: PathBuf,
    /// Time between acquisition cycles.
    pub poll_interval: Duration,
    /// Maximum downloads per cycle, also the number of posts listed.
    pub max_downloads: usize,
    /// Only posts of this type are downloaded.
    pub media_type: MediaType,
    /// Whether to run acquisition in the background.
    pub auto_update: bool,
}

impl TrackerConfig {
    /// Creates a config with default scheduling.
    pub fn new(
        target_user: impl Into<String>,
        login_user: impl Into<String>,
        password: impl Into<String>,
        storage_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            target_user: target_user.into(),
            credentials: Credentials::new(login_user, password),
            storage_root: storage_root.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_downloads: DEFAULT_MAX_DOWNLOADS,
            media_type: MediaType::default(),
            auto_update: true,
        }
    }

    /// Sets the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the per-cycle download cap. Zero is raised to one.
    pub fn with_max_downloads(mut self, max: usize) -> Self {
        self.max_downloads = max.max(1);
        self
    }

    /// Sets the media type filter.
    pub fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = media_type;
        self
    }

    /// Enables or disables background acquisition.
    pub fn with_auto_update(mut self, auto_update: bool) -> Self {
        self.auto_update = auto_update;
        self
    }
}
