//! Series domain model

use crate::types::{Author, Library, LibraryId, Story, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesId(Uuid);

impl SeriesId {
    /// Creates a new random SeriesId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a SeriesId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Returns the SeriesId as a string
    pub fn as_string(&self) -> String {
        self.0.to_string()
    }
}

impl Default for SeriesId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SeriesId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An ordered collection of related stories
///
/// Series names are unique within a library.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub id: SeriesId,
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
    pub stories: Option<Vec<Story>>,
}

impl Series {
    /// Creates a new series in the given library
    pub fn new(library_id: LibraryId, name: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id: SeriesId::new(),
            library_id,
            name: name.into(),
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
    fn test_new_series() {
        let library_id = LibraryId::new();
        let series = Series::new(library_id, "The Wumpus Chronicles");
        assert_eq!(series.library_id, library_id);
        assert_eq!(series.name, "The Wumpus Chronicles");
        assert_eq!(series.version, 1);
    }
}
