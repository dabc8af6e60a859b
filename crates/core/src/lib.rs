//! Core domain types and errors for the Shelfmark catalog.
//!
//! Everything here is plain data: entity structs, id newtypes, and the
//! error taxonomy shared by the database and catalog layers.

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, ErrorCategory, Result};
pub use types::{
    Author, AuthorId, EntityKind, Library, LibraryId, Media, Series, SeriesId, Story, StoryId,
    Timestamp, Volume, VolumeId,
};
