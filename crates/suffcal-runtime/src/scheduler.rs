//! Acquisition cycle.

use std::sync::Arc;

use tracing::{debug, info, trace};

use suffcal_adapters::MediaSource;
use suffcal_models::{MediaType, Photo, PhotoId, Post};
use suffcal_persistence::PhotoStore;

use crate::error::Result;

/// Outcome of one acquisition cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// Posts returned by the media source.
    pub listed: usize,
    /// Photos downloaded into the "new" area, newest first.
    pub downloaded: Vec<Photo>,
    /// Whether the cycle stopped at the cursor.
    pub reached_cursor: bool,
}

/// Downloads the posts of one account that are newer than the cursor.
pub struct Scheduler {
    source: Arc<dyn MediaSource>,
    store: PhotoStore,
    user_id: String,
    max_downloads: usize,
    media_type: MediaType,
}

impl Scheduler {
    /// Creates a scheduler for the account with the given network user id.
    pub fn new(
        source: Arc<dyn MediaSource>,
        store: PhotoStore,
        user_id: impl Into<String>,
        max_downloads: usize,
        media_type: MediaType,
    ) -> Self {
        Self {
            source,
            store,
            user_id: user_id.into(),
            max_downloads,
            media_type,
        }
    }

    /// Returns the photo store.
    pub fn store(&self) -> &PhotoStore {
        &self.store
    }

    /// Runs one acquisition cycle.
    ///
    /// Walks the newest posts, newest first, and downloads those of the
    /// configured media type until it reaches the cursor or the download
    /// cap. Every download of the cycle lands in one staging area and is
    /// admitted only once all of them succeeded; a failed cycle stores
    /// nothing and the next cycle starts from the same cursor.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let cursor = self.store.cursor()?;
        let posts = self
            .source
            .list_recent_media(&self.user_id, self.max_downloads)
            .await?;

        debug!(
            user_id = %self.user_id,
            listed = posts.len(),
            cursor = cursor.as_ref().map(PhotoId::as_str).unwrap_or("-"),
            "starting acquisition cycle"
        );

        let mut report = CycleReport {
            listed: posts.len(),
            ..CycleReport::default()
        };

        let staging = self.store.staging()?;
        let mut staged = Vec::new();

        for post in posts {
            if staged.len() >= self.max_downloads {
                debug!(cap = self.max_downloads, "download cap reached");
                break;
            }
            if let Some(ref cursor) = cursor {
                if is_known(&post, cursor) {
                    trace!(post = %post.id, "reached cursor");
                    report.reached_cursor = true;
                    break;
                }
            }
            if post.media_type != self.media_type {
                trace!(post = %post.id, media_type = %post.media_type, "skipping media type");
                continue;
            }
            if self.store.contains(&post.id)? {
                debug!(post = %post.id, "skipping already stored post");
                continue;
            }

            let downloaded = self.source.download_photo(&post.id, staging.path()).await?;
            trace!(post = %post.id, file = %downloaded.display(), "photo staged");
            staged.push(downloaded);
        }

        // Oldest first, so an interrupted admission never moves the cursor
        // past a photo still waiting in staging.
        for downloaded in staged.iter().rev() {
            let photo = self.store.admit(downloaded)?;
            debug!(photo = %photo.path.display(), "photo downloaded");
            report.downloaded.push(photo);
        }
        report.downloaded.reverse();

        if !report.downloaded.is_empty() {
            info!(count = report.downloaded.len(), "downloaded new photos");
        }
        Ok(report)
    }
}

/// Returns true if the post is the cursor or older than it.
fn is_known(post: &Post, cursor: &PhotoId) -> bool {
    post.id == *cursor || (post.id.is_numeric() && cursor.is_numeric() && post.id < *cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use suffcal_adapters::{AdapterError, Result as AdapterResult};
    use tempfile::tempdir;

    #[derive(Default)]
    struct FakeSource {
        posts: Mutex<Vec<Post>>,
        downloads: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl FakeSource {
        fn with_posts(ids: &[&str]) -> Self {
            let source = Self::default();
            source.set_posts(ids);
            source
        }

        fn set_posts(&self, ids: &[&str]) {
            *self.posts.lock().unwrap() = ids.iter().map(|id| Post::new(*id, MediaType::Photo)).collect();
        }

        fn downloads(&self) -> Vec<String> {
            self.downloads.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MediaSource for FakeSource {
        async fn login(&self, _user: &str, _password: &str) -> AdapterResult<()> {
            Ok(())
        }

        async fn logout(&self) -> AdapterResult<()> {
            Ok(())
        }

        async fn resolve_user_id(&self, _handle: &str) -> AdapterResult<String> {
            Ok("1".into())
        }

        async fn list_recent_media(&self, _user_id: &str, limit: usize) -> AdapterResult<Vec<Post>> {
            Ok(self.posts.lock().unwrap().iter().take(limit).cloned().collect())
        }

        async fn download_photo(&self, post: &PhotoId, destination: &Path) -> AdapterResult<PathBuf> {
            if self.fail_on == Some(post.as_str()) {
                return Err(AdapterError::InvalidResponse("broken download".into()));
            }
            self.downloads.lock().unwrap().push(post.to_string());
            let path = destination.join(format!("venue_{}.jpg", post));
            std::fs::write(&path, b"jpeg").unwrap();
            Ok(path)
        }
    }

    fn scheduler(source: &Arc<FakeSource>, store: &PhotoStore, max: usize) -> Scheduler {
        let source: Arc<dyn MediaSource> = source.clone();
        Scheduler::new(source, store.clone(), "1", max, MediaType::Photo)
    }

    #[tokio::test]
    async fn test_rerun_downloads_nothing() {
        let dir = tempdir().unwrap();
        let store = PhotoStore::open(dir.path()).unwrap();
        let source = Arc::new(FakeSource::with_posts(&["30", "20", "10"]));
        let scheduler = scheduler(&source, &store, 20);

        let first = scheduler.run_cycle().await.unwrap();
        assert_eq!(first.downloaded.len(), 3);
        assert!(!first.reached_cursor);

        let second = scheduler.run_cycle().await.unwrap();
        assert!(second.downloaded.is_empty());
        assert!(second.reached_cursor);
        assert_eq!(source.downloads(), vec!["30", "20", "10"]);
    }

    #[tokio::test]
    async fn test_only_posts_newer_than_cursor() {
        let dir = tempdir().unwrap();
        let store = PhotoStore::open(dir.path()).unwrap();
        let source = Arc::new(FakeSource::with_posts(&["20"]));
        let scheduler = scheduler(&source, &store, 20);
        scheduler.run_cycle().await.unwrap();

        // 15 was never seen but is older than the cursor
        source.set_posts(&["40", "30", "15", "20"]);
        let report = scheduler.run_cycle().await.unwrap();

        let ids: Vec<_> = report.downloaded.iter().map(|p| p.id.to_string()).collect();
        assert_eq!(ids, vec!["40", "30"]);
        assert_eq!(source.downloads(), vec!["20", "40", "30"]);
    }

    #[tokio::test]
    async fn test_cursor_survives_processing() {
        let dir = tempdir().unwrap();
        let store = PhotoStore::open(dir.path()).unwrap();
        let source = Arc::new(FakeSource::with_posts(&["2", "1"]));
        let scheduler = scheduler(&source, &store, 20);

        for photo in scheduler.run_cycle().await.unwrap().downloaded {
            store.mark_processed(&photo).unwrap();
        }
        let report = scheduler.run_cycle().await.unwrap();

        assert!(report.downloaded.is_empty());
        assert_eq!(source.downloads().len(), 2);
    }

    #[tokio::test]
    async fn test_cap_limits_downloads() {
        let dir = tempdir().unwrap();
        let store = PhotoStore::open(dir.path()).unwrap();
        let source = Arc::new(FakeSource::with_posts(&["5", "4", "3", "2", "1"]));
        let scheduler = scheduler(&source, &store, 2);

        let report = scheduler.run_cycle().await.unwrap();
        assert_eq!(report.listed, 2);
        assert_eq!(source.downloads(), vec!["5", "4"]);
    }

    #[tokio::test]
    async fn test_skips_other_media_types() {
        let dir = tempdir().unwrap();
        let store = PhotoStore::open(dir.path()).unwrap();
        let source = Arc::new(FakeSource::default());
        *source.posts.lock().unwrap() = vec![
            Post::new("3", MediaType::Video),
            Post::new("2", MediaType::Photo),
            Post::new("1", MediaType::Album),
        ];
        let scheduler = scheduler(&source, &store, 20);

        scheduler.run_cycle().await.unwrap();
        assert_eq!(source.downloads(), vec!["2"]);
    }

    #[tokio::test]
    async fn test_failed_download_stores_nothing_and_retries() {
        let dir = tempdir().unwrap();
        let store = PhotoStore::open(dir.path()).unwrap();
        let failing = Arc::new(FakeSource {
            fail_on: Some("8"),
            ..FakeSource::default()
        });
        failing.set_posts(&["9", "8", "7"]);

        assert!(scheduler(&failing, &store, 20).run_cycle().await.is_err());
        assert!(store.list_new().unwrap().is_empty());
        assert_eq!(store.cursor().unwrap(), None);

        let healthy = Arc::new(FakeSource::with_posts(&["9", "8", "7"]));
        let report = scheduler(&healthy, &store, 20).run_cycle().await.unwrap();

        let ids: Vec<_> = report.downloaded.iter().map(|p| p.id.to_string()).collect();
        assert_eq!(ids, vec!["9", "8", "7"]);
        assert_eq!(healthy.downloads(), vec!["9", "8", "7"]);
        let stored: Vec<_> = store.list_new().unwrap().into_iter().map(|p| p.id.to_string()).collect();
        assert_eq!(stored, vec!["9", "8", "7"]);
    }

    #[test]
    fn test_is_known() {
        let cursor = PhotoId::from("100");
        assert!(is_known(&Post::new("100", MediaType::Photo), &cursor));
        assert!(is_known(&Post::new("99", MediaType::Photo), &cursor));
        assert!(!is_known(&Post::new("101", MediaType::Photo), &cursor));
        assert!(!is_known(&Post::new("abc", MediaType::Photo), &cursor));
    }
}
