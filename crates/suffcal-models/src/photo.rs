//! Photo and post types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::ids::PhotoId;

/// Kind of media attached to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// A single still image.
    #[default]
    Photo,
    /// A video or reel.
    Video,
    /// A carousel of several media items.
    Album,
}

impl MediaType {
    /// Maps the network's numeric media type code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Photo),
            2 => Some(Self::Video),
            8 => Some(Self::Album),
            _ => None,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Photo => write!(f, "photo"),
            Self::Video => write!(f, "video"),
            Self::Album => write!(f, "album"),
        }
    }
}

impl std::str::FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "photo" | "image" => Ok(Self::Photo),
            "video" | "reel" => Ok(Self::Video),
            "album" | "carousel" => Ok(Self::Album),
            other => Err(format!("unknown media type: {}", other)),
        }
    }
}

/// A post as listed by the media network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Network post identifier.
    pub id: PhotoId,
    /// Media discriminator.
    pub media_type: MediaType,
}

impl Post {
    /// Creates a new post.
    pub fn new(id: impl Into<PhotoId>, media_type: MediaType) -> Self {
        Self {
            id: id.into(),
            media_type,
        }
    }
}

/// A downloaded photo on disk.
///
/// Stored files are named `<name>_<id>.<ext>`. The name itself may contain
/// underscores; only the last segment of the stem is the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    /// Network post identifier.
    pub id: PhotoId,
    /// File name without the id suffix and extension.
    pub name: String,
    /// Current location on disk.
    pub path: PathBuf,
}

impl Photo {
    /// Derives a photo from a stored file path.
    ///
    /// Returns `None` if the path has no usable file stem.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let stem = path.file_stem()?.to_str()?;
        if stem.is_empty() {
            return None;
        }

        let (name, id) = match stem.rsplit_once('_') {
            Some((name, id)) => (name, id),
            None => ("", stem),
        };
        if id.is_empty() {
            return None;
        }

        Some(Self {
            id: PhotoId::from(id),
            name: name.to_string(),
            path,
        })
    }

    /// Returns the stored file name.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Returns a copy of this photo relocated into `dir`.
    pub fn relocated(&self, dir: &Path) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            path: dir.join(self.file_name()),
        }
    }
}

impl fmt::Display for Photo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path.display(), self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_from_path() {
        let photo = Photo::from_path("/data/new_photos/flyer_3120001.jpg").unwrap();
        assert_eq!(photo.id.as_str(), "3120001");
        assert_eq!(photo.name, "flyer");
        assert_eq!(photo.file_name(), "flyer_3120001.jpg");
    }

    #[test]
    fn test_photo_name_with_underscores() {
        let photo = Photo::from_path("summer_fest_2024_42.webp").unwrap();
        assert_eq!(photo.id.as_str(), "42");
        assert_eq!(photo.name, "summer_fest_2024");
    }

    #[test]
    fn test_photo_without_name() {
        let photo = Photo::from_path("77.jpg").unwrap();
        assert_eq!(photo.id.as_str(), "77");
        assert_eq!(photo.name, "");
    }

    #[test]
    fn test_photo_trailing_underscore_rejected() {
        assert!(Photo::from_path("flyer_.jpg").is_none());
    }

    #[test]
    fn test_relocated_keeps_identity() {
        let photo = Photo::from_path("/a/new/flyer_1.jpg").unwrap();
        let moved = photo.relocated(Path::new("/a/done"));
        assert_eq!(moved.id, photo.id);
        assert_eq!(moved.path, PathBuf::from("/a/done/flyer_1.jpg"));
    }

    #[test]
    fn test_media_type_codes() {
        assert_eq!(MediaType::from_code(1), Some(MediaType::Photo));
        assert_eq!(MediaType::from_code(8), Some(MediaType::Album));
        assert_eq!(MediaType::from_code(3), None);
        assert_eq!("Carousel".parse::<MediaType>(), Ok(MediaType::Album));
    }
}
