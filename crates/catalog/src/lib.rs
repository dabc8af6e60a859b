//! Shelfmark Catalog Services
//!
//! The behavior layer between a transport and the database: per-entity
//! services with CRUD, name search, and relationship management, the
//! query-option composer, and the idempotent import engine.

pub mod import;
pub mod options;
mod relations;
pub mod services;
mod validate;

pub use import::{classify_media, ImportCounts, ImportRow, Importer};
pub use options::{compose, Include, QueryOptions};
pub use services::{
    AuthorPatch, AuthorService, LibraryPatch, LibraryService, SeriesPatch, SeriesService,
    StoryPatch, StoryService, VolumePatch, VolumeService,
};
