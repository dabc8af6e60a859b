//! Story domain model

use crate::types::{Author, Library, LibraryId, Series, Timestamp, Volume};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a story
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoryId(Uuid);

impl StoryId {
    /// Creates a new random StoryId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a StoryId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Returns the StoryId as a string
    pub fn as_string(&self) -> String {
        self.0.to_string()
    }
}

impl Default for StoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A written work, independent of the physical volume(s) that carry it
///
/// Story names are unique within a library.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: StoryId,
    pub library_id: LibraryId,
    pub name: String,
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
    pub series: Option<Vec<Series>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub volumes: Option<Vec<Volume>>,
}

impl Story {
    /// Creates a new story in the given library
    pub fn new(library_id: LibraryId, name: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id: StoryId::new(),
            library_id,
            name: name.into(),
            notes: None,
            version: 1,
            created_at: now,
            updated_at: now,
            library: None,
            authors: None,
            series: None,
            volumes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_story() {
        let library_id = LibraryId::new();
        let story = Story::new(library_id, "Hunt the Wumpus");
        assert_eq!(story.library_id, library_id);
        assert_eq!(story.name, "Hunt the Wumpus");
    }
}
