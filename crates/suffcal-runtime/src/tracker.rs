//! Photo tracker combining store, scheduler and handlers.

use std::sync::Arc;

use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use suffcal_adapters::MediaSource;
use suffcal_models::Photo;
use suffcal_persistence::PhotoStore;

use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::handler::{HandlerSet, MarkProcessed, PhotoHandler};
use crate::scheduler::Scheduler;

/// State shared with the background worker.
struct Shared {
    config: TrackerConfig,
    scheduler: Scheduler,
    handlers: RwLock<Vec<Arc<dyn PhotoHandler>>>,
    /// Serializes handler runs so a photo is never handled twice.
    trigger_lock: Mutex<()>,
}

impl Shared {
    fn store(&self) -> &PhotoStore {
        self.scheduler.store()
    }

    async fn trigger(&self) -> Result<usize> {
        let _guard = self.trigger_lock.lock().await;

        let handlers = self.handlers.read().await.clone();
        if handlers.is_empty() {
            debug!("no handlers registered");
            return Ok(0);
        }

        let pending = self.store().list_new()?;
        if pending.is_empty() {
            return Ok(0);
        }

        let handler = MarkProcessed::new(HandlerSet::new(handlers), self.store().clone());
        let mut handled = 0;
        for photo in &pending {
            match handler.handle(photo).await {
                Ok(()) => handled += 1,
                Err(e) => warn!(photo = %photo.path.display(), error = %e, "failed to process photo"),
            }
        }

        info!(handled, pending = pending.len(), "processed new photos");
        Ok(handled)
    }
}

/// Keeps the local store in sync with the tracked account.
///
/// Construction logs in, runs one acquisition cycle and, unless disabled,
/// starts background acquisition. Dropping the tracker stops the worker;
/// call [`PhotoTracker::shutdown`] to also close the network session.
pub struct PhotoTracker {
    shared: Arc<Shared>,
    source: Arc<dyn MediaSource>,
    worker: Mutex<Option<JoinHandle<()>>>,
    shutdown_tx: watch::Sender<bool>,
}

impl PhotoTracker {
    /// Creates a tracker.
    ///
    /// Creates the store directories if absent and blocks for the first
    /// acquisition cycle, whose errors are returned.
    pub async fn new(config: TrackerConfig, source: Arc<dyn MediaSource>) -> Result<Self> {
        source
            .login(&config.credentials.user, &config.credentials.password)
            .await?;
        let user_id = source.resolve_user_id(&config.target_user).await?;
        let store = PhotoStore::open(&config.storage_root)?;

        let scheduler = Scheduler::new(
            Arc::clone(&source),
            store,
            user_id,
            config.max_downloads,
            config.media_type,
        );

        let report = scheduler.run_cycle().await?;
        info!(
            target_user = %config.target_user,
            downloaded = report.downloaded.len(),
            "photo tracker initialized"
        );

        let auto_update = config.auto_update;
        let (shutdown_tx, _) = watch::channel(false);
        let tracker = Self {
            shared: Arc::new(Shared {
                config,
                scheduler,
                handlers: RwLock::new(Vec::new()),
                trigger_lock: Mutex::new(()),
            }),
            source,
            worker: Mutex::new(None),
            shutdown_tx,
        };

        if auto_update {
            tracker.start_background_work().await?;
        }
        Ok(tracker)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &TrackerConfig {
        &self.shared.config
    }

    /// Returns the photo store.
    pub fn store(&self) -> &PhotoStore {
        self.shared.store()
    }

    /// Adds a handler. Handlers run in registration order.
    pub async fn register_handler(&self, handler: Arc<dyn PhotoHandler>) {
        let mut handlers = self.shared.handlers.write().await;
        handlers.push(handler);
        debug!(count = handlers.len(), "handler registered");
    }

    /// Lists photos not yet handled, newest first.
    pub fn pending_photos(&self) -> Result<Vec<Photo>> {
        Ok(self.store().list_new()?)
    }

    /// Runs the handlers on every pending photo and marks each processed.
    ///
    /// Does nothing while no handler is registered. Returns the number of
    /// photos marked processed.
    pub async fn trigger_callbacks(&self) -> Result<usize> {
        self.shared.trigger().await
    }

    /// Runs one acquisition cycle now.
    pub async fn update(&self) -> Result<usize> {
        let report = self.shared.scheduler.run_cycle().await?;
        Ok(report.downloaded.len())
    }

    /// Returns true if background acquisition is running.
    pub async fn is_running(&self) -> bool {
        self.worker
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Starts background acquisition.
    pub async fn start_background_work(&self) -> Result<()> {
        let mut worker = self.worker.lock().await;
        if worker.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return Err(TrackerError::AlreadyRunning);
        }

        self.shutdown_tx.send_replace(false);
        let shared = Arc::clone(&self.shared);
        let shutdown_rx = self.shutdown_tx.subscribe();
        *worker = Some(tokio::spawn(run_worker(shared, shutdown_rx)));

        debug!(
            poll_interval_secs = self.shared.config.poll_interval.as_secs(),
            "background acquisition started"
        );
        Ok(())
    }

    /// Stops background acquisition.
    ///
    /// A cycle in progress is completed first.
    pub async fn stop_background_work(&self) -> Result<()> {
        self.shutdown_tx.send_replace(true);

        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle {
            debug!("waiting for acquisition worker to stop");
            handle
                .await
                .map_err(|e| TrackerError::Shutdown(format!("worker task panicked: {}", e)))?;
        }
        Ok(())
    }

    /// Stops background acquisition and closes the network session.
    pub async fn shutdown(&self) -> Result<()> {
        info!("shutting down photo tracker");
        self.stop_background_work().await?;
        self.source.logout().await?;
        info!("photo tracker stopped");
        Ok(())
    }
}

impl Drop for PhotoTracker {
    fn drop(&mut self) {
        self.shutdown_tx.send_replace(true);
    }
}

/// Background loop: sleep, cycle, trigger handlers.
///
/// Failed cycles are logged and retried after the next sleep.
async fn run_worker(shared: Arc<Shared>, mut shutdown: watch::Receiver<bool>) {
    let interval = shared.config.poll_interval;

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
        if *shutdown.borrow() {
            debug!("acquisition worker received shutdown signal");
            break;
        }

        match shared.scheduler.run_cycle().await {
            Ok(report) => debug!(downloaded = report.downloaded.len(), "acquisition cycle finished"),
            Err(e) => warn!(error = %e, "acquisition cycle failed"),
        }

        if let Err(e) = shared.trigger().await {
            warn!(error = %e, "failed to process new photos");
        }
    }

    debug!("acquisition worker stopped");
}
