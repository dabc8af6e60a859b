//! Volume domain model

use crate::types::{Author, Library, LibraryId, Story, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VolumeId(Uuid);

impl VolumeId {
    /// Creates a new random VolumeId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a VolumeId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Returns the VolumeId as a string
    pub fn as_string(&self) -> String {
        self.0.to_string()
    }
}

impl Default for VolumeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VolumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Physical or digital medium a volume exists on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Media {
    Book,
    Kindle,
    Kobo,
    Returned,
    Unlimited,
}

impl Media {
    /// Returns the media kind as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Book => "Book",
            Self::Kindle => "Kindle",
            Self::Kobo => "Kobo",
            Self::Returned => "Returned",
            Self::Unlimited => "Unlimited",
        }
    }

    /// Parses a stored media kind
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Book" => Some(Self::Book),
            "Kindle" => Some(Self::Kindle),
            "Kobo" => Some(Self::Kobo),
            "Returned" => Some(Self::Returned),
            "Unlimited" => Some(Self::Unlimited),
            _ => None,
        }
    }
}

impl fmt::Display for Media {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A physical or digital object holding one or more stories
///
/// Volume names are unique within a library.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub id: VolumeId,
    pub library_id: LibraryId,
    pub name: String,
    pub isbn: Option<String>,
    pub location: Option<String>,
    pub media: Media,
    pub read: bool,
    pub notes: Option<String>,
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,

    // Eager-loaded relations
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub library: Option<Library>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub authors: Option<Vec<Author>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stories: Option<Vec<Story>>,
}

impl Volume {
    /// Creates a new volume in the given library
    pub fn new(library_id: LibraryId, name: impl Into<String>, media: Media) -> Self {
        let now = Timestamp::now();
        Self {
            id: VolumeId::new(),
            library_id,
            name: name.into(),
            isbn: None,
            location: None,
            media,
            read: false,
            notes: None,
            version: 1,
            created_at: now,
            updated_at: now,
            library: None,
            authors: None,
            stories: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_volume() {
        let library_id = LibraryId::new();
        let volume = Volume::new(library_id, "Collected Works", Media::Book);
        assert_eq!(volume.media, Media::Book);
        assert!(!volume.read);
        assert!(volume.location.is_none());
    }

    #[test]
    fn test_media_round_trip() {
        for media in [
            Media::Book,
            Media::Kindle,
            Media::Kobo,
            Media::Returned,
            Media::Unlimited,
        ] {
            assert_eq!(Media::parse(media.as_str()), Some(media));
        }
        assert_eq!(Media::parse("Betamax"), None);
    }
}
