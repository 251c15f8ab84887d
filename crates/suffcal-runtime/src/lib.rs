//! Photo tracking runtime for Suffcal.
//!
//! This crate keeps the local photo store in sync with the tracked account
//! and hands every new photo to the registered handlers:
//! - `Scheduler` - one acquisition cycle: list, download, stop at the cursor
//! - `PhotoTracker` - owns the store, runs the scheduler in the background
//!   and triggers the handlers
//! - `TrackerSlot` - enforces a single tracker per process
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use suffcal_adapters::MediaBridgeClient;
//! use suffcal_runtime::{PhotoTracker, TrackerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TrackerConfig::new("venue", "me", "secret", "./downloads");
//!     let source = Arc::new(MediaBridgeClient::new("http://127.0.0.1:8000/")?);
//!
//!     // Runs the first acquisition cycle before returning
//!     let tracker = PhotoTracker::new(config, source).await?;
//!     tracker.register_handler(Arc::new(MyHandler)).await;
//!     tracker.trigger_callbacks().await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     tracker.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Key Concepts
//!
//! ## Cursor
//!
//! The newest photo already on disk. Posts come newest first, so a cycle
//! stops as soon as it reaches the cursor; nothing else records what was
//! seen.
//!
//! ## Handlers
//!
//! Every new photo is passed to all registered handlers in registration
//! order and then marked processed, whatever the handlers returned. A
//! failing handler is logged, not retried.

pub mod config;
pub mod error;
pub mod handler;
pub mod scheduler;
pub mod slot;
pub mod tracker;

pub use config::{Credentials, TrackerConfig};
pub use error::{Result, TrackerError};
pub use handler::{HandlerError, HandlerSet, MarkProcessed, PhotoHandler};
pub use scheduler::{CycleReport, Scheduler};
pub use slot::TrackerSlot;
pub use tracker::PhotoTracker;
