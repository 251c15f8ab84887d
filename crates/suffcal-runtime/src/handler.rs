//! Photo handlers and the mark-processed decorator.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use suffcal_models::Photo;
use suffcal_persistence::PhotoStore;

/// Error returned by a handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Something to do with every new photo.
#[async_trait]
pub trait PhotoHandler: Send + Sync {
    /// Handles one photo from the "new" area.
    async fn handle(&self, photo: &Photo) -> Result<(), HandlerError>;
}

/// Registered handlers, run in registration order.
///
/// A failing handler is logged and does not stop the ones after it.
#[derive(Clone, Default)]
pub struct HandlerSet {
    handlers: Vec<Arc<dyn PhotoHandler>>,
}

impl HandlerSet {
    /// Creates a set from handlers in registration order.
    pub fn new(handlers: Vec<Arc<dyn PhotoHandler>>) -> Self {
        Self { handlers }
    }

    /// Returns the number of handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[async_trait]
impl PhotoHandler for HandlerSet {
    async fn handle(&self, photo: &Photo) -> Result<(), HandlerError> {
        let mut failures = 0;
        for (index, handler) in self.handlers.iter().enumerate() {
            if let Err(e) = handler.handle(photo).await {
                failures += 1;
                warn!(
                    photo = %photo.path.display(),
                    handler = index,
                    error = %e,
                    "photo handler failed"
                );
            }
        }

        if failures > 0 {
            return Err(format!("{} of {} handlers failed", failures, self.handlers.len()).into());
        }
        Ok(())
    }
}

/// Marks the photo processed after the inner handler ran, whatever its
/// outcome.
///
/// The inner error is logged and swallowed; only a failure to mark is
/// returned.
pub struct MarkProcessed<H> {
    inner: H,
    store: PhotoStore,
}

impl<H: PhotoHandler> MarkProcessed<H> {
    /// Wraps a handler.
    pub fn new(inner: H, store: PhotoStore) -> Self {
        Self { inner, store }
    }
}

#[async_trait]
impl<H: PhotoHandler> PhotoHandler for MarkProcessed<H> {
    async fn handle(&self, photo: &Photo) -> Result<(), HandlerError> {
        if let Err(e) = self.inner.handle(photo).await {
            warn!(photo = %photo.path.display(), error = %e, "marking photo processed despite handler failure");
        }

        let processed = self.store.mark_processed(photo)?;
        debug!(photo = %processed.path.display(), "photo processed");
        Ok(())
    }
}
