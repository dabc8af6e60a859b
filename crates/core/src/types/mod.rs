//! Domain models for the catalog
//!
//! A `Library` is the root aggregate: every author, series, story, and
//! volume belongs to exactly one library, and all name-uniqueness and
//! relationship rules are scoped to it.

pub mod author;
pub mod common;
pub mod library;
pub mod series;
pub mod story;
pub mod volume;

pub use author::{Author, AuthorId};
pub use common::{EntityKind, Timestamp};
pub use library::{Library, LibraryId};
pub use series::{Series, SeriesId};
pub use story::{Story, StoryId};
pub use volume::{Media, Volume, VolumeId};
