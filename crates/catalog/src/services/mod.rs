//! Catalog services
//!
//! One service per entity kind, each owning a handle to the pool. Reads
//! run on a plain connection; every mutation runs validate-then-write
//! inside a single transaction, so a failed step leaves no partial state.

mod attach;
mod authors;
mod libraries;
mod series;
mod stories;
mod volumes;

pub use authors::{AuthorPatch, AuthorService};
pub use libraries::{LibraryPatch, LibraryService};
pub use series::{SeriesPatch, SeriesService};
pub use stories::{StoryPatch, StoryService};
pub use volumes::{VolumePatch, VolumeService};

use shelfmark_core::{
    AppError, Author, AuthorId, EntityKind, Library, LibraryId, Result, Series, SeriesId, Story,
    StoryId, Volume, VolumeId,
};
use shelfmark_database::queries;
use shelfmark_database::DbPool;
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, Transaction};

pub(crate) async fn acquire(pool: &DbPool) -> Result<PoolConnection<Sqlite>> {
    pool.acquire()
        .await
        .map_err(|e| AppError::database("Failed to acquire connection", e))
}

pub(crate) async fn begin(pool: &DbPool) -> Result<Transaction<'static, Sqlite>> {
    pool.begin()
        .await
        .map_err(|e| AppError::database("Failed to begin transaction", e))
}

pub(crate) async fn commit(tx: Transaction<'_, Sqlite>) -> Result<()> {
    tx.commit()
        .await
        .map_err(|e| AppError::database("Failed to commit transaction", e))
}

pub(crate) async fn ensure_library(
    conn: &mut SqliteConnection,
    id: LibraryId,
) -> Result<Library> {
    queries::libraries::find(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found(EntityKind::Library, id))
}

pub(crate) async fn ensure_author(conn: &mut SqliteConnection, id: AuthorId) -> Result<Author> {
    queries::authors::find(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found(EntityKind::Author, id))
}

pub(crate) async fn ensure_series(conn: &mut SqliteConnection, id: SeriesId) -> Result<Series> {
    queries::series::find(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found(EntityKind::Series, id))
}

pub(crate) async fn ensure_story(conn: &mut SqliteConnection, id: StoryId) -> Result<Story> {
    queries::stories::find(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found(EntityKind::Story, id))
}

pub(crate) async fn ensure_volume(conn: &mut SqliteConnection, id: VolumeId) -> Result<Volume> {
    queries::volumes::find(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found(EntityKind::Volume, id))
}

/// Exact-name lookups resolve to exactly one entity; zero matches (or a
/// pathological several) is reported as a missing entity under the name
pub(crate) fn single<T>(
    mut items: Vec<T>,
    kind: EntityKind,
    name: impl std::fmt::Display,
) -> Result<T> {
    if items.len() == 1 {
        Ok(items.remove(0))
    } else {
        Err(AppError::not_found(kind, name))
    }
}
