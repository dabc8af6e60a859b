//! Author domain model

use crate::types::{Library, LibraryId, Series, Story, Timestamp, Volume};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorId(Uuid);

impl AuthorId {
    /// Creates a new random AuthorId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an AuthorId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Returns the AuthorId as a string
    pub fn as_string(&self) -> String {
        self.0.to_string()
    }
}

impl Default for AuthorId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AuthorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A contributor of stories, series, and volumes within one library
///
/// The (first_name, last_name) pair is unique within a library.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: AuthorId,
    pub library_id: LibraryId,
    pub first_name: String,
    pub last_name: String,
    pub notes: Option<String>,
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,

    // Eager-loaded relations
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub library: Option<Library>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub series: Option<Vec<Series>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stories: Option<Vec<Story>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub volumes: Option<Vec<Volume>>,
}

impl Author {
    /// Creates a new author in the given library
    pub fn new(
        library_id: LibraryId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: AuthorId::new(),
            library_id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            notes: None,
            version: 1,
            created_at: now,
            updated_at: now,
            library: None,
            series: None,
            stories: None,
            volumes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_author() {
        let library_id = LibraryId::new();
        let author = Author::new(library_id, "Bam Bam", "Rubble");
        assert_eq!(author.library_id, library_id);
        assert_eq!(author.first_name, "Bam Bam");
        assert_eq!(author.last_name, "Rubble");
        assert_eq!(author.version, 1);
    }
}
