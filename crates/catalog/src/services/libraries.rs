//! Library service

use crate::options::QueryOptions;
use crate::services::{acquire, attach, begin, commit, ensure_library, single};
use crate::validate;
use shelfmark_core::{AppError, Author, EntityKind, Library, LibraryId, Result, Series, Story, Volume};
use shelfmark_database::queries;
use shelfmark_database::{AuthorFilter, DbPool, NameFilter};
use serde::Deserialize;

/// Partial update for a library; absent fields keep their current values
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryPatch {
    pub name: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct LibraryService {
    pool: DbPool,
}

impl LibraryService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Lists libraries in name order
    pub async fn all(&self, options: &QueryOptions) -> Result<Vec<Library>> {
        let mut conn = acquire(&self.pool).await?;
        let mut items =
            queries::libraries::list(&mut conn, &NameFilter::Any, &options.page()).await?;
        attach::libraries(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn find(&self, id: LibraryId, options: &QueryOptions) -> Result<Library> {
        let mut conn = acquire(&self.pool).await?;
        let mut library = ensure_library(&mut conn, id).await?;
        attach::libraries(
            &mut conn,
            std::slice::from_mut(&mut library),
            &options.include,
        )
        .await?;
        Ok(library)
    }

    /// Finds the single library with exactly this name
    pub async fn exact(&self, name: &str, options: &QueryOptions) -> Result<Library> {
        let mut conn = acquire(&self.pool).await?;
        let items = queries::libraries::list(
            &mut conn,
            &NameFilter::Exact(name.to_string()),
            &options.page(),
        )
        .await?;
        let mut library = single(items, EntityKind::Library, name)?;
        attach::libraries(
            &mut conn,
            std::slice::from_mut(&mut library),
            &options.include,
        )
        .await?;
        Ok(library)
    }

    /// Lists libraries whose name contains the substring, case-insensitively
    pub async fn name(&self, substring: &str, options: &QueryOptions) -> Result<Vec<Library>> {
        let mut conn = acquire(&self.pool).await?;
        let mut items = queries::libraries::list(
            &mut conn,
            &NameFilter::Contains(substring.to_string()),
            &options.page(),
        )
        .await?;
        attach::libraries(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn insert(&self, library: Library) -> Result<Library> {
        let mut tx = begin(&self.pool).await?;
        validate::library(&mut tx, &library, None).await?;
        queries::libraries::insert(&mut tx, &library).await?;
        commit(tx).await?;

        log::info!("Created library '{}' ({})", library.name, library.id);
        Ok(library)
    }

    pub async fn update(&self, id: LibraryId, patch: LibraryPatch) -> Result<Library> {
        let mut tx = begin(&self.pool).await?;
        let mut candidate = ensure_library(&mut tx, id).await?;
        if let Some(name) = patch.name {
            candidate.name = name;
        }
        if let Some(notes) = patch.notes {
            candidate.notes = Some(notes);
        }

        validate::library(&mut tx, &candidate, Some(id)).await?;
        if queries::libraries::update(&mut tx, &candidate).await? == 0 {
            return Err(AppError::bad_request(format!("Cannot update Library {}", id)));
        }
        let updated = ensure_library(&mut tx, id).await?;
        commit(tx).await?;
        Ok(updated)
    }

    /// Deletes the library and, via cascade, everything it contains.
    /// Returns the entity as it was before deletion.
    pub async fn remove(&self, id: LibraryId) -> Result<Library> {
        let mut tx = begin(&self.pool).await?;
        let original = ensure_library(&mut tx, id).await?;
        if queries::libraries::delete(&mut tx, id).await? == 0 {
            return Err(AppError::not_found(EntityKind::Library, id));
        }
        commit(tx).await?;

        log::info!("Removed library '{}' ({})", original.name, original.id);
        Ok(original)
    }

    // Scoped child listings

    pub async fn authors(&self, id: LibraryId, options: &QueryOptions) -> Result<Vec<Author>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_library(&mut conn, id).await?;
        let mut items =
            queries::authors::list(&mut conn, Some(id), &AuthorFilter::Any, &options.page())
                .await?;
        attach::authors(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn series(&self, id: LibraryId, options: &QueryOptions) -> Result<Vec<Series>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_library(&mut conn, id).await?;
        let mut items =
            queries::series::list(&mut conn, Some(id), &NameFilter::Any, &options.page()).await?;
        attach::series(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn stories(&self, id: LibraryId, options: &QueryOptions) -> Result<Vec<Story>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_library(&mut conn, id).await?;
        let mut items =
            queries::stories::list(&mut conn, Some(id), &NameFilter::Any, &options.page()).await?;
        attach::stories(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn volumes(&self, id: LibraryId, options: &QueryOptions) -> Result<Vec<Volume>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_library(&mut conn, id).await?;
        let mut items =
            queries::volumes::list(&mut conn, Some(id), &NameFilter::Any, &options.page()).await?;
        attach::volumes(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }
}
