//! Photo store with "new" and "processed" areas.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use suffcal_models::{Photo, PhotoId};

use crate::atomic::{atomic_move, ensure_dir, reset_dir, Staging};
use crate::error::{PersistenceError, Result};

/// Directory holding downloaded photos that were not handled yet.
pub const NEW_DIR: &str = "new_photos";

/// Directory holding photos whose handlers already ran.
pub const PROCESSED_DIR: &str = "processed_photos";

/// Directory holding in-flight downloads.
pub const STAGING_DIR: &str = ".staging";

/// On-disk record of downloaded photos.
///
/// A photo id appears in at most one of the two areas at any time. Listings
/// are ordered newest first, where newer means a larger id.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    root: PathBuf,
    new_dir: PathBuf,
    processed_dir: PathBuf,
    staging_dir: PathBuf,
}

impl PhotoStore {
    /// Opens the store rooted at `root`, creating both areas if absent.
    ///
    /// Leftovers of interrupted downloads are discarded.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let store = Self {
            new_dir: root.join(NEW_DIR),
            processed_dir: root.join(PROCESSED_DIR),
            staging_dir: root.join(STAGING_DIR),
            root,
        };

        ensure_dir(&store.new_dir)?;
        ensure_dir(&store.processed_dir)?;
        reset_dir(&store.staging_dir)?;

        debug!(root = %store.root.display(), "photo store opened");
        Ok(store)
    }

    /// Returns the "new" area.
    pub fn new_dir(&self) -> &Path {
        &self.new_dir
    }

    /// Returns the "processed" area.
    pub fn processed_dir(&self) -> &Path {
        &self.processed_dir
    }

    /// Lists photos waiting for handlers, newest first.
    pub fn list_new(&self) -> Result<Vec<Photo>> {
        list_dir(&self.new_dir)
    }

    /// Lists handled photos, newest first.
    pub fn list_processed(&self) -> Result<Vec<Photo>> {
        list_dir(&self.processed_dir)
    }

    /// Returns the id of the most recently known photo.
    ///
    /// This is the newest photo in the "new" area, else the newest in the
    /// "processed" area. It is recomputed on every call so it always
    /// reflects the disk, including across restarts.
    pub fn cursor(&self) -> Result<Option<PhotoId>> {
        if let Some(photo) = self.list_new()?.into_iter().next() {
            return Ok(Some(photo.id));
        }
        Ok(self.list_processed()?.into_iter().next().map(|p| p.id))
    }

    /// Returns true if a photo with this id is in either area.
    pub fn contains(&self, id: &PhotoId) -> Result<bool> {
        Ok(self.list_new()?.iter().any(|p| &p.id == id)
            || self.list_processed()?.iter().any(|p| &p.id == id))
    }

    /// Creates a scratch directory for the downloads of one cycle.
    pub fn staging(&self) -> Result<Staging> {
        Staging::create_in(&self.staging_dir)
    }

    /// Moves a completed download into the "new" area.
    ///
    /// # Errors
    /// Returns `Duplicate` if a photo with the same id is already stored,
    /// and `InvalidData` if the file name carries no id.
    pub fn admit(&self, downloaded: &Path) -> Result<Photo> {
        let photo = Photo::from_path(downloaded).ok_or_else(|| {
            PersistenceError::InvalidData(format!(
                "file name has no photo id: {}",
                downloaded.display()
            ))
        })?;

        if self.contains(&photo.id)? {
            return Err(PersistenceError::Duplicate(photo.id.to_string()));
        }

        let admitted = photo.relocated(&self.new_dir);
        atomic_move(&photo.path, &admitted.path)?;

        debug!(id = %admitted.id, path = %admitted.path.display(), "photo admitted");
        Ok(admitted)
    }

    /// Moves a photo from "new" to "processed".
    ///
    /// Marking is irreversible. Marking a photo that is already processed
    /// returns its processed location without touching the disk.
    pub fn mark_processed(&self, photo: &Photo) -> Result<Photo> {
        let source = photo.relocated(&self.new_dir);
        let target = photo.relocated(&self.processed_dir);

        if !source.path.exists() {
            if target.path.exists() {
                debug!(id = %photo.id, "photo already processed");
                return Ok(target);
            }
            return Err(PersistenceError::NotFound {
                kind: "photo".to_string(),
                id: photo.id.to_string(),
            });
        }

        atomic_move(&source.path, &target.path)?;
        debug!(id = %photo.id, "photo marked processed");
        Ok(target)
    }
}

/// Lists stored photos in a directory, newest first.
fn list_dir(dir: &Path) -> Result<Vec<Photo>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir).map_err(|source| PersistenceError::ReadError {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut photos = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| PersistenceError::ReadError {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden || !path.is_file() {
            continue;
        }

        match Photo::from_path(&path) {
            Some(photo) => photos.push(photo),
            None => warn!(path = %path.display(), "ignoring file without photo id"),
        }
    }

    photos.sort_by(|a, b| b.id.cmp(&a.id).then_with(|| a.path.cmp(&b.path)));
    Ok(photos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn download(store: &PhotoStore, file_name: &str) -> Photo {
        let staging = store.staging().unwrap();
        let path = staging.path().join(file_name);
        fs::write(&path, b"jpeg").unwrap();
        store.admit(&path).unwrap()
    }

    #[test]
    fn test_open_creates_areas() {
        let dir = tempdir().unwrap();
        let store = PhotoStore::open(dir.path().join("insta")).unwrap();

        assert!(store.new_dir().is_dir());
        assert!(store.processed_dir().is_dir());
        assert!(store.list_new().unwrap().is_empty());
        assert!(store.cursor().unwrap().is_none());
    }

    #[test]
    fn test_admit_and_list_newest_first() {
        let dir = tempdir().unwrap();
        let store = PhotoStore::open(dir.path()).unwrap();

        download(&store, "venue_100.jpg");
        download(&store, "venue_1000.jpg");
        download(&store, "venue_99.jpg");

        let ids: Vec<String> = store
            .list_new()
            .unwrap()
            .into_iter()
            .map(|p| p.id.to_string())
            .collect();
        assert_eq!(ids, vec!["1000", "100", "99"]);
        assert_eq!(store.cursor().unwrap(), Some(PhotoId::from("1000")));
    }

    #[test]
    fn test_admit_rejects_duplicate_id() {
        let dir = tempdir().unwrap();
        let store = PhotoStore::open(dir.path()).unwrap();

        let photo = download(&store, "venue_7.jpg");
        store.mark_processed(&photo).unwrap();

        let staging = store.staging().unwrap();
        let again = staging.path().join("venue_7.jpg");
        fs::write(&again, b"jpeg").unwrap();

        let result = store.admit(&again);
        assert!(matches!(result, Err(PersistenceError::Duplicate(id)) if id == "7"));
    }

    #[test]
    fn test_mark_processed_moves_exactly_once() {
        let dir = tempdir().unwrap();
        let store = PhotoStore::open(dir.path()).unwrap();
        let photo = download(&store, "venue_5.jpg");

        let processed = store.mark_processed(&photo).unwrap();

        assert!(store.list_new().unwrap().is_empty());
        let listed = store.list_processed().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], processed);

        // A second mark is a no-op
        let again = store.mark_processed(&photo).unwrap();
        assert_eq!(again, processed);
        assert_eq!(store.list_processed().unwrap().len(), 1);
    }

    #[test]
    fn test_mark_processed_unknown_photo() {
        let dir = tempdir().unwrap();
        let store = PhotoStore::open(dir.path()).unwrap();
        let ghost = Photo::from_path(dir.path().join("venue_1.jpg")).unwrap();

        let result = store.mark_processed(&ghost);
        assert!(matches!(result, Err(PersistenceError::NotFound { .. })));
    }

    #[test]
    fn test_cursor_falls_back_to_processed() {
        let dir = tempdir().unwrap();
        let store = PhotoStore::open(dir.path()).unwrap();

        let older = download(&store, "venue_10.jpg");
        let newer = download(&store, "venue_11.jpg");
        store.mark_processed(&older).unwrap();
        store.mark_processed(&newer).unwrap();

        assert_eq!(store.cursor().unwrap(), Some(PhotoId::from("11")));
        assert!(store.contains(&PhotoId::from("10")).unwrap());
        assert!(!store.contains(&PhotoId::from("12")).unwrap());
    }

    #[test]
    fn test_listing_skips_hidden_and_directories() {
        let dir = tempdir().unwrap();
        let store = PhotoStore::open(dir.path()).unwrap();
        fs::write(store.new_dir().join(".DS_Store"), b"").unwrap();
        fs::create_dir(store.new_dir().join("nested_3")).unwrap();
        download(&store, "venue_4.jpg");

        let photos = store.list_new().unwrap();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].id.as_str(), "4");
    }

    #[test]
    fn test_open_discards_interrupted_downloads() {
        let dir = tempdir().unwrap();
        let partial = dir.path().join(STAGING_DIR).join("download-x");
        fs::create_dir_all(&partial).unwrap();
        fs::write(partial.join("venue_9.jpg"), b"ha").unwrap();

        let store = PhotoStore::open(dir.path()).unwrap();

        assert!(!partial.exists());
        assert!(store.cursor().unwrap().is_none());
    }
}
