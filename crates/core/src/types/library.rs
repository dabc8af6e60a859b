//! Library domain model
//!
//! The root aggregate. Library names are unique across the whole catalog;
//! every other uniqueness rule is scoped to a single library.

use crate::types::{Author, Series, Story, Volume, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LibraryId(Uuid);

impl LibraryId {
    /// Creates a new random LibraryId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a LibraryId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Returns the LibraryId as a string
    pub fn as_string(&self) -> String {
        self.0.to_string()
    }
}

impl Default for LibraryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LibraryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named partition of the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    pub id: LibraryId,
    pub name: String,
    pub notes: Option<String>,
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,

    // Eager-loaded relations, attached on request and never persisted
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub authors: Option<Vec<Author>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub series: Option<Vec<Series>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stories: Option<Vec<Story>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub volumes: Option<Vec<Volume>>,
}

impl Library {
    /// Creates a new library with the given name
    pub fn new(name: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id: LibraryId::new(),
            name: name.into(),
            notes: None,
            version: 1,
            created_at: now,
            updated_at: now,
            authors: None,
            series: None,
            stories: None,
            volumes: None,
        }
    }
}
