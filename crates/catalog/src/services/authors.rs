//! Author service

use crate::options::QueryOptions;
use crate::relations::{self, Edge};
use crate::services::{
    acquire, attach, begin, commit, ensure_author, ensure_series, ensure_story, ensure_volume,
    single,
};
use crate::validate;
use shelfmark_core::{
    AppError, Author, AuthorId, EntityKind, LibraryId, Result, Series, SeriesId, Story, StoryId,
    Volume, VolumeId,
};
use shelfmark_database::queries::{self, joins};
use shelfmark_database::{AuthorFilter, DbPool, NameFilter};
use serde::Deserialize;

/// Partial update for an author; absent fields keep their current values
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct AuthorService {
    pool: DbPool,
}

impl AuthorService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Lists all authors in canonical order (library, last name, first name)
    pub async fn all(&self, options: &QueryOptions) -> Result<Vec<Author>> {
        let mut conn = acquire(&self.pool).await?;
        let mut items =
            queries::authors::list(&mut conn, None, &AuthorFilter::Any, &options.page()).await?;
        attach::authors(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn find(&self, id: AuthorId, options: &QueryOptions) -> Result<Author> {
        let mut conn = acquire(&self.pool).await?;
        let mut author = ensure_author(&mut conn, id).await?;
        attach::authors(&mut conn, std::slice::from_mut(&mut author), &options.include).await?;
        Ok(author)
    }

    /// Finds the single author in the library with exactly this name pair
    pub async fn exact(
        &self,
        library_id: LibraryId,
        first_name: &str,
        last_name: &str,
        options: &QueryOptions,
    ) -> Result<Author> {
        let mut conn = acquire(&self.pool).await?;
        let filter = AuthorFilter::Exact {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        };
        let items =
            queries::authors::list(&mut conn, Some(library_id), &filter, &options.page()).await?;
        let mut author = single(
            items,
            EntityKind::Author,
            format!("{} {}", first_name, last_name),
        )?;
        attach::authors(&mut conn, std::slice::from_mut(&mut author), &options.include).await?;
        Ok(author)
    }

    /// Lists authors in the library whose first or last name contains the
    /// substring, case-insensitively
    pub async fn name(
        &self,
        library_id: LibraryId,
        substring: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Author>> {
        let mut conn = acquire(&self.pool).await?;
        let filter = AuthorFilter::Contains(substring.to_string());
        let mut items =
            queries::authors::list(&mut conn, Some(library_id), &filter, &options.page()).await?;
        attach::authors(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn insert(&self, author: Author) -> Result<Author> {
        let mut tx = begin(&self.pool).await?;
        validate::author(&mut tx, &author, None).await?;
        queries::authors::insert(&mut tx, &author).await?;
        commit(tx).await?;

        log::debug!(
            "Created author '{} {}' ({})",
            author.first_name,
            author.last_name,
            author.id
        );
        Ok(author)
    }

    pub async fn update(&self, id: AuthorId, patch: AuthorPatch) -> Result<Author> {
        let mut tx = begin(&self.pool).await?;
        let mut candidate = ensure_author(&mut tx, id).await?;
        if let Some(first_name) = patch.first_name {
            candidate.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            candidate.last_name = last_name;
        }
        if let Some(notes) = patch.notes {
            candidate.notes = Some(notes);
        }

        validate::author(&mut tx, &candidate, Some(id)).await?;
        if queries::authors::update(&mut tx, &candidate).await? == 0 {
            return Err(AppError::bad_request(format!("Cannot update Author {}", id)));
        }
        let updated = ensure_author(&mut tx, id).await?;
        commit(tx).await?;
        Ok(updated)
    }

    /// Deletes the author; associations are removed by cascade. Returns the
    /// entity as it was before deletion.
    pub async fn remove(&self, id: AuthorId) -> Result<Author> {
        let mut tx = begin(&self.pool).await?;
        let original = ensure_author(&mut tx, id).await?;
        if queries::authors::delete(&mut tx, id).await? == 0 {
            return Err(AppError::not_found(EntityKind::Author, id));
        }
        commit(tx).await?;
        Ok(original)
    }

    // Author -> Series

    pub async fn series(&self, id: AuthorId, options: &QueryOptions) -> Result<Vec<Series>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_author(&mut conn, id).await?;
        let mut items =
            queries::series::list_for_author(&mut conn, id, &NameFilter::Any, &options.page())
                .await?;
        attach::series(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn series_exact(
        &self,
        id: AuthorId,
        name: &str,
        options: &QueryOptions,
    ) -> Result<Series> {
        let mut conn = acquire(&self.pool).await?;
        ensure_author(&mut conn, id).await?;
        let items = queries::series::list_for_author(
            &mut conn,
            id,
            &NameFilter::Exact(name.to_string()),
            &options.page(),
        )
        .await?;
        let mut entry = single(items, EntityKind::Series, name)?;
        attach::series(&mut conn, std::slice::from_mut(&mut entry), &options.include).await?;
        Ok(entry)
    }

    pub async fn series_name(
        &self,
        id: AuthorId,
        substring: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Series>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_author(&mut conn, id).await?;
        let mut items = queries::series::list_for_author(
            &mut conn,
            id,
            &NameFilter::Contains(substring.to_string()),
            &options.page(),
        )
        .await?;
        attach::series(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    /// Associates a series with this author, returning the series
    pub async fn series_add(&self, id: AuthorId, series_id: SeriesId) -> Result<Series> {
        let mut tx = begin(&self.pool).await?;
        let author_id = id.as_string();
        let other_id = series_id.as_string();
        relations::associate(
            &mut tx,
            Edge {
                join: &joins::AUTHOR_SERIES,
                parent: EntityKind::Author,
                parent_id: &author_id,
                child: EntityKind::Series,
                child_id: &other_id,
            },
            None,
        )
        .await?;
        let entry = ensure_series(&mut tx, series_id).await?;
        commit(tx).await?;
        Ok(entry)
    }

    /// Dissociates a series from this author, returning the series
    pub async fn series_remove(&self, id: AuthorId, series_id: SeriesId) -> Result<Series> {
        let mut tx = begin(&self.pool).await?;
        let author_id = id.as_string();
        let other_id = series_id.as_string();
        relations::dissociate(
            &mut tx,
            Edge {
                join: &joins::AUTHOR_SERIES,
                parent: EntityKind::Author,
                parent_id: &author_id,
                child: EntityKind::Series,
                child_id: &other_id,
            },
        )
        .await?;
        let entry = ensure_series(&mut tx, series_id).await?;
        commit(tx).await?;
        Ok(entry)
    }

    // Author -> Stories

    pub async fn stories(&self, id: AuthorId, options: &QueryOptions) -> Result<Vec<Story>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_author(&mut conn, id).await?;
        let mut items =
            queries::stories::list_for_author(&mut conn, id, &NameFilter::Any, &options.page())
                .await?;
        attach::stories(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn stories_exact(
        &self,
        id: AuthorId,
        name: &str,
        options: &QueryOptions,
    ) -> Result<Story> {
        let mut conn = acquire(&self.pool).await?;
        ensure_author(&mut conn, id).await?;
        let items = queries::stories::list_for_author(
            &mut conn,
            id,
            &NameFilter::Exact(name.to_string()),
            &options.page(),
        )
        .await?;
        let mut story = single(items, EntityKind::Story, name)?;
        attach::stories(&mut conn, std::slice::from_mut(&mut story), &options.include).await?;
        Ok(story)
    }

    pub async fn stories_name(
        &self,
        id: AuthorId,
        substring: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Story>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_author(&mut conn, id).await?;
        let mut items = queries::stories::list_for_author(
            &mut conn,
            id,
            &NameFilter::Contains(substring.to_string()),
            &options.page(),
        )
        .await?;
        attach::stories(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn stories_add(&self, id: AuthorId, story_id: StoryId) -> Result<Story> {
        let mut tx = begin(&self.pool).await?;
        let author_id = id.as_string();
        let other_id = story_id.as_string();
        relations::associate(
            &mut tx,
            Edge {
                join: &joins::AUTHOR_STORIES,
                parent: EntityKind::Author,
                parent_id: &author_id,
                child: EntityKind::Story,
                child_id: &other_id,
            },
            None,
        )
        .await?;
        let story = ensure_story(&mut tx, story_id).await?;
        commit(tx).await?;
        Ok(story)
    }

    pub async fn stories_remove(&self, id: AuthorId, story_id: StoryId) -> Result<Story> {
        let mut tx = begin(&self.pool).await?;
        let author_id = id.as_string();
        let other_id = story_id.as_string();
        relations::dissociate(
            &mut tx,
            Edge {
                join: &joins::AUTHOR_STORIES,
                parent: EntityKind::Author,
                parent_id: &author_id,
                child: EntityKind::Story,
                child_id: &other_id,
            },
        )
        .await?;
        let story = ensure_story(&mut tx, story_id).await?;
        commit(tx).await?;
        Ok(story)
    }

    // Author -> Volumes

    pub async fn volumes(&self, id: AuthorId, options: &QueryOptions) -> Result<Vec<Volume>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_author(&mut conn, id).await?;
        let mut items =
            queries::volumes::list_for_author(&mut conn, id, &NameFilter::Any, &options.page())
                .await?;
        attach::volumes(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn volumes_exact(
        &self,
        id: AuthorId,
        name: &str,
        options: &QueryOptions,
    ) -> Result<Volume> {
        let mut conn = acquire(&self.pool).await?;
        ensure_author(&mut conn, id).await?;
        let items = queries::volumes::list_for_author(
            &mut conn,
            id,
            &NameFilter::Exact(name.to_string()),
            &options.page(),
        )
        .await?;
        let mut volume = single(items, EntityKind::Volume, name)?;
        attach::volumes(&mut conn, std::slice::from_mut(&mut volume), &options.include).await?;
        Ok(volume)
    }

    pub async fn volumes_name(
        &self,
        id: AuthorId,
        substring: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Volume>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_author(&mut conn, id).await?;
        let mut items = queries::volumes::list_for_author(
            &mut conn,
            id,
            &NameFilter::Contains(substring.to_string()),
            &options.page(),
        )
        .await?;
        attach::volumes(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn volumes_add(&self, id: AuthorId, volume_id: VolumeId) -> Result<Volume> {
        let mut tx = begin(&self.pool).await?;
        let author_id = id.as_string();
        let other_id = volume_id.as_string();
        relations::associate(
            &mut tx,
            Edge {
                join: &joins::AUTHOR_VOLUMES,
                parent: EntityKind::Author,
                parent_id: &author_id,
                child: EntityKind::Volume,
                child_id: &other_id,
            },
            None,
        )
        .await?;
        let volume = ensure_volume(&mut tx, volume_id).await?;
        commit(tx).await?;
        Ok(volume)
    }

    pub async fn volumes_remove(&self, id: AuthorId, volume_id: VolumeId) -> Result<Volume> {
        let mut tx = begin(&self.pool).await?;
        let author_id = id.as_string();
        let other_id = volume_id.as_string();
        relations::dissociate(
            &mut tx,
            Edge {
                join: &joins::AUTHOR_VOLUMES,
                parent: EntityKind::Author,
                parent_id: &author_id,
                child: EntityKind::Volume,
                child_id: &other_id,
            },
        )
        .await?;
        let volume = ensure_volume(&mut tx, volume_id).await?;
        commit(tx).await?;
        Ok(volume)
    }
}
