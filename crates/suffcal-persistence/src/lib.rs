//! Persistence layer for Suffcal.
//!
//! Photos live on disk in two sibling areas under a storage root, and the
//! file system itself is the only record of tracking state:
//!
//! ```text
//! root/
//! ├── new_photos/         # downloaded, waiting for handlers
//! ├── processed_photos/   # handled, never touched again
//! └── .staging/           # in-flight downloads
//! ```
//!
//! Downloads land in `.staging/` first and are renamed into `new_photos/`
//! only when complete, so a crash never leaves a partial file that looks
//! like a valid photo.
//!
//! # Example
//!
//! ```no_run
//! use suffcal_persistence::PhotoStore;
//!
//! let store = PhotoStore::open("/var/lib/suffcal").unwrap();
//! for photo in store.list_new().unwrap() {
//!     println!("pending: {}", photo);
//!     store.mark_processed(&photo).unwrap();
//! }
//! ```

pub mod atomic;
pub mod error;
pub mod photo_store;

pub use atomic::Staging;
pub use error::{PersistenceError, Result};
pub use photo_store::{PhotoStore, NEW_DIR, PROCESSED_DIR, STAGING_DIR};
