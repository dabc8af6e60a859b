//! Story service

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

/// Partial update for a story; absent fields keep their current values
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryPatch {
    pub name: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct StoryService {
    pool: DbPool,
}

impl StoryService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn all(&self, options: &QueryOptions) -> Result<Vec<Story>> {
        let mut conn = acquire(&self.pool).await?;
        let mut items =
            queries::stories::list(&mut conn, None, &NameFilter::Any, &options.page()).await?;
        attach::stories(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn find(&self, id: StoryId, options: &QueryOptions) -> Result<Story> {
        let mut conn = acquire(&self.pool).await?;
        let mut story = ensure_story(&mut conn, id).await?;
        attach::stories(&mut conn, std::slice::from_mut(&mut story), &options.include).await?;
        Ok(story)
    }

    /// Finds the single story in the library with exactly this name
    pub async fn exact(
        &self,
        library_id: LibraryId,
        name: &str,
        options: &QueryOptions,
    ) -> Result<Story> {
        let mut conn = acquire(&self.pool).await?;
        let items = queries::stories::list(
            &mut conn,
            Some(library_id),
            &NameFilter::Exact(name.to_string()),
            &options.page(),
        )
        .await?;
        let mut story = single(items, EntityKind::Story, name)?;
        attach::stories(&mut conn, std::slice::from_mut(&mut story), &options.include).await?;
        Ok(story)
    }

    /// Lists stories in the library whose name contains the substring,
    /// case-insensitively
    pub async fn name(
        &self,
        library_id: LibraryId,
        substring: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Story>> {
        let mut conn = acquire(&self.pool).await?;
        let mut items = queries::stories::list(
            &mut conn,
            Some(library_id),
            &NameFilter::Contains(substring.to_string()),
            &options.page(),
        )
        .await?;
        attach::stories(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn insert(&self, story: Story) -> Result<Story> {
        let mut tx = begin(&self.pool).await?;
        validate::story(&mut tx, &story, None).await?;
        queries::stories::insert(&mut tx, &story).await?;
        commit(tx).await?;

        log::debug!("Created story '{}' ({})", story.name, story.id);
        Ok(story)
    }

    pub async fn update(&self, id: StoryId, patch: StoryPatch) -> Result<Story> {
        let mut tx = begin(&self.pool).await?;
        let mut candidate = ensure_story(&mut tx, id).await?;
        if let Some(name) = patch.name {
            candidate.name = name;
        }
        if let Some(notes) = patch.notes {
            candidate.notes = Some(notes);
        }

        validate::story(&mut tx, &candidate, Some(id)).await?;
        if queries::stories::update(&mut tx, &candidate).await? == 0 {
            return Err(AppError::bad_request(format!("Cannot update Story {}", id)));
        }
        let updated = ensure_story(&mut tx, id).await?;
        commit(tx).await?;
        Ok(updated)
    }

    pub async fn remove(&self, id: StoryId) -> Result<Story> {
        let mut tx = begin(&self.pool).await?;
        let original = ensure_story(&mut tx, id).await?;
        if queries::stories::delete(&mut tx, id).await? == 0 {
            return Err(AppError::not_found(EntityKind::Story, id));
        }
        commit(tx).await?;
        Ok(original)
    }

    // Story -> Authors

    pub async fn authors(&self, id: StoryId, options: &QueryOptions) -> Result<Vec<Author>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_story(&mut conn, id).await?;
        let mut items =
            queries::authors::list_for_story(&mut conn, id, &AuthorFilter::Any, &options.page())
                .await?;
        attach::authors(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn authors_exact(
        &self,
        id: StoryId,
        first_name: &str,
        last_name: &str,
        options: &QueryOptions,
    ) -> Result<Author> {
        let mut conn = acquire(&self.pool).await?;
        ensure_story(&mut conn, id).await?;
        let filter = AuthorFilter::Exact {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        };
        let items =
            queries::authors::list_for_story(&mut conn, id, &filter, &options.page()).await?;
        let mut author = single(
            items,
            EntityKind::Author,
            format!("{} {}", first_name, last_name),
        )?;
        attach::authors(&mut conn, std::slice::from_mut(&mut author), &options.include).await?;
        Ok(author)
    }

    pub async fn authors_name(
        &self,
        id: StoryId,
        substring: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Author>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_story(&mut conn, id).await?;
        let filter = AuthorFilter::Contains(substring.to_string());
        let mut items =
            queries::authors::list_for_story(&mut conn, id, &filter, &options.page()).await?;
        attach::authors(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn authors_add(&self, id: StoryId, author_id: AuthorId) -> Result<Author> {
        let mut tx = begin(&self.pool).await?;
        let story_id = id.as_string();
        let other_id = author_id.as_string();
        relations::associate(
            &mut tx,
            Edge {
                join: &joins::AUTHOR_STORIES,
                parent: EntityKind::Story,
                parent_id: &story_id,
                child: EntityKind::Author,
                child_id: &other_id,
            },
            None,
        )
        .await?;
        let author = ensure_author(&mut tx, author_id).await?;
        commit(tx).await?;
        Ok(author)
    }

    pub async fn authors_remove(&self, id: StoryId, author_id: AuthorId) -> Result<Author> {
        let mut tx = begin(&self.pool).await?;
        let story_id = id.as_string();
        let other_id = author_id.as_string();
        relations::dissociate(
            &mut tx,
            Edge {
                join: &joins::AUTHOR_STORIES,
                parent: EntityKind::Story,
                parent_id: &story_id,
                child: EntityKind::Author,
                child_id: &other_id,
            },
        )
        .await?;
        let author = ensure_author(&mut tx, author_id).await?;
        commit(tx).await?;
        Ok(author)
    }

    // Story -> Series

    pub async fn series(&self, id: StoryId, options: &QueryOptions) -> Result<Vec<Series>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_story(&mut conn, id).await?;
        let mut items =
            queries::series::list_for_story(&mut conn, id, &NameFilter::Any, &options.page())
                .await?;
        attach::series(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn series_exact(
        &self,
        id: StoryId,
        name: &str,
        options: &QueryOptions,
    ) -> Result<Series> {
        let mut conn = acquire(&self.pool).await?;
        ensure_story(&mut conn, id).await?;
        let items = queries::series::list_for_story(
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
        id: StoryId,
        substring: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Series>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_story(&mut conn, id).await?;
        let mut items = queries::series::list_for_story(
            &mut conn,
            id,
            &NameFilter::Contains(substring.to_string()),
            &options.page(),
        )
        .await?;
        attach::series(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn series_add(&self, id: StoryId, series_id: SeriesId) -> Result<Series> {
        let mut tx = begin(&self.pool).await?;
        let story_id = id.as_string();
        let other_id = series_id.as_string();
        relations::associate(
            &mut tx,
            Edge {
                join: &joins::SERIES_STORIES,
                parent: EntityKind::Story,
                parent_id: &story_id,
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

    pub async fn series_remove(&self, id: StoryId, series_id: SeriesId) -> Result<Series> {
        let mut tx = begin(&self.pool).await?;
        let story_id = id.as_string();
        let other_id = series_id.as_string();
        relations::dissociate(
            &mut tx,
            Edge {
                join: &joins::SERIES_STORIES,
                parent: EntityKind::Story,
                parent_id: &story_id,
                child: EntityKind::Series,
                child_id: &other_id,
            },
        )
        .await?;
        let entry = ensure_series(&mut tx, series_id).await?;
        commit(tx).await?;
        Ok(entry)
    }

    // Story -> Volumes

    pub async fn volumes(&self, id: StoryId, options: &QueryOptions) -> Result<Vec<Volume>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_story(&mut conn, id).await?;
        let mut items =
            queries::volumes::list_for_story(&mut conn, id, &NameFilter::Any, &options.page())
                .await?;
        attach::volumes(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn volumes_exact(
        &self,
        id: StoryId,
        name: &str,
        options: &QueryOptions,
    ) -> Result<Volume> {
        let mut conn = acquire(&self.pool).await?;
        ensure_story(&mut conn, id).await?;
        let items = queries::volumes::list_for_story(
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
        id: StoryId,
        substring: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Volume>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_story(&mut conn, id).await?;
        let mut items = queries::volumes::list_for_story(
            &mut conn,
            id,
            &NameFilter::Contains(substring.to_string()),
            &options.page(),
        )
        .await?;
        attach::volumes(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn volumes_add(&self, id: StoryId, volume_id: VolumeId) -> Result<Volume> {
        let mut tx = begin(&self.pool).await?;
        let story_id = id.as_string();
        let other_id = volume_id.as_string();
        relations::associate(
            &mut tx,
            Edge {
                join: &joins::VOLUME_STORIES,
                parent: EntityKind::Story,
                parent_id: &story_id,
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

    pub async fn volumes_remove(&self, id: StoryId, volume_id: VolumeId) -> Result<Volume> {
        let mut tx = begin(&self.pool).await?;
        let story_id = id.as_string();
        let other_id = volume_id.as_string();
        relations::dissociate(
            &mut tx,
            Edge {
                join: &joins::VOLUME_STORIES,
                parent: EntityKind::Story,
                parent_id: &story_id,
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
