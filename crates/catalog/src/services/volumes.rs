//! Volume service

use crate::options::QueryOptions;
use crate::relations::{self, Edge};
use crate::services::{
    acquire, attach, begin, commit, ensure_author, ensure_story, ensure_volume, single,
};
use crate::validate;
use shelfmark_core::{
    AppError, Author, AuthorId, EntityKind, LibraryId, Media, Result, Story, StoryId, Volume,
    VolumeId,
};
use shelfmark_database::queries::{self, joins};
use shelfmark_database::{AuthorFilter, DbPool, NameFilter};
use serde::Deserialize;

/// Partial update for a volume; absent fields keep their current values
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumePatch {
    pub name: Option<String>,
    pub isbn: Option<String>,
    pub location: Option<String>,
    pub media: Option<Media>,
    pub read: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct VolumeService {
    pool: DbPool,
}

impl VolumeService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn all(&self, options: &QueryOptions) -> Result<Vec<Volume>> {
        let mut conn = acquire(&self.pool).await?;
        let mut items =
            queries::volumes::list(&mut conn, None, &NameFilter::Any, &options.page()).await?;
        attach::volumes(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn find(&self, id: VolumeId, options: &QueryOptions) -> Result<Volume> {
        let mut conn = acquire(&self.pool).await?;
        let mut volume = ensure_volume(&mut conn, id).await?;
        attach::volumes(&mut conn, std::slice::from_mut(&mut volume), &options.include).await?;
        Ok(volume)
    }

    /// Finds the single volume in the library with exactly this name
    pub async fn exact(
        &self,
        library_id: LibraryId,
        name: &str,
        options: &QueryOptions,
    ) -> Result<Volume> {
        let mut conn = acquire(&self.pool).await?;
        let items = queries::volumes::list(
            &mut conn,
            Some(library_id),
            &NameFilter::Exact(name.to_string()),
            &options.page(),
        )
        .await?;
        let mut volume = single(items, EntityKind::Volume, name)?;
        attach::volumes(&mut conn, std::slice::from_mut(&mut volume), &options.include).await?;
        Ok(volume)
    }

    /// Lists volumes in the library whose name contains the substring,
    /// case-insensitively
    pub async fn name(
        &self,
        library_id: LibraryId,
        substring: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Volume>> {
        let mut conn = acquire(&self.pool).await?;
        let mut items = queries::volumes::list(
            &mut conn,
            Some(library_id),
            &NameFilter::Contains(substring.to_string()),
            &options.page(),
        )
        .await?;
        attach::volumes(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn insert(&self, volume: Volume) -> Result<Volume> {
        let mut tx = begin(&self.pool).await?;
        validate::volume(&mut tx, &volume, None).await?;
        queries::volumes::insert(&mut tx, &volume).await?;
        commit(tx).await?;

        log::debug!("Created volume '{}' ({})", volume.name, volume.id);
        Ok(volume)
    }

    pub async fn update(&self, id: VolumeId, patch: VolumePatch) -> Result<Volume> {
        let mut tx = begin(&self.pool).await?;
        let mut candidate = ensure_volume(&mut tx, id).await?;
        if let Some(name) = patch.name {
            candidate.name = name;
        }
        if let Some(isbn) = patch.isbn {
            candidate.isbn = Some(isbn);
        }
        if let Some(location) = patch.location {
            candidate.location = Some(location);
        }
        if let Some(media) = patch.media {
            candidate.media = media;
        }
        if let Some(read) = patch.read {
            candidate.read = read;
        }
        if let Some(notes) = patch.notes {
            candidate.notes = Some(notes);
        }

        validate::volume(&mut tx, &candidate, Some(id)).await?;
        if queries::volumes::update(&mut tx, &candidate).await? == 0 {
            return Err(AppError::bad_request(format!("Cannot update Volume {}", id)));
        }
        let updated = ensure_volume(&mut tx, id).await?;
        commit(tx).await?;
        Ok(updated)
    }

    pub async fn remove(&self, id: VolumeId) -> Result<Volume> {
        let mut tx = begin(&self.pool).await?;
        let original = ensure_volume(&mut tx, id).await?;
        if queries::volumes::delete(&mut tx, id).await? == 0 {
            return Err(AppError::not_found(EntityKind::Volume, id));
        }
        commit(tx).await?;
        Ok(original)
    }

    // Volume -> Authors

    pub async fn authors(&self, id: VolumeId, options: &QueryOptions) -> Result<Vec<Author>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_volume(&mut conn, id).await?;
        let mut items =
            queries::authors::list_for_volume(&mut conn, id, &AuthorFilter::Any, &options.page())
                .await?;
        attach::authors(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn authors_exact(
        &self,
        id: VolumeId,
        first_name: &str,
        last_name: &str,
        options: &QueryOptions,
    ) -> Result<Author> {
        let mut conn = acquire(&self.pool).await?;
        ensure_volume(&mut conn, id).await?;
        let filter = AuthorFilter::Exact {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        };
        let items =
            queries::authors::list_for_volume(&mut conn, id, &filter, &options.page()).await?;
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
        id: VolumeId,
        substring: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Author>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_volume(&mut conn, id).await?;
        let filter = AuthorFilter::Contains(substring.to_string());
        let mut items =
            queries::authors::list_for_volume(&mut conn, id, &filter, &options.page()).await?;
        attach::authors(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn authors_add(&self, id: VolumeId, author_id: AuthorId) -> Result<Author> {
        let mut tx = begin(&self.pool).await?;
        let volume_id = id.as_string();
        let other_id = author_id.as_string();
        relations::associate(
            &mut tx,
            Edge {
                join: &joins::AUTHOR_VOLUMES,
                parent: EntityKind::Volume,
                parent_id: &volume_id,
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

    pub async fn authors_remove(&self, id: VolumeId, author_id: AuthorId) -> Result<Author> {
        let mut tx = begin(&self.pool).await?;
        let volume_id = id.as_string();
        let other_id = author_id.as_string();
        relations::dissociate(
            &mut tx,
            Edge {
                join: &joins::AUTHOR_VOLUMES,
                parent: EntityKind::Volume,
                parent_id: &volume_id,
                child: EntityKind::Author,
                child_id: &other_id,
            },
        )
        .await?;
        let author = ensure_author(&mut tx, author_id).await?;
        commit(tx).await?;
        Ok(author)
    }

    // Volume -> Stories

    pub async fn stories(&self, id: VolumeId, options: &QueryOptions) -> Result<Vec<Story>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_volume(&mut conn, id).await?;
        let mut items =
            queries::stories::list_for_volume(&mut conn, id, &NameFilter::Any, &options.page())
                .await?;
        attach::stories(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn stories_exact(
        &self,
        id: VolumeId,
        name: &str,
        options: &QueryOptions,
    ) -> Result<Story> {
        let mut conn = acquire(&self.pool).await?;
        ensure_volume(&mut conn, id).await?;
        let items = queries::stories::list_for_volume(
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
        id: VolumeId,
        substring: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Story>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_volume(&mut conn, id).await?;
        let mut items = queries::stories::list_for_volume(
            &mut conn,
            id,
            &NameFilter::Contains(substring.to_string()),
            &options.page(),
        )
        .await?;
        attach::stories(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn stories_add(&self, id: VolumeId, story_id: StoryId) -> Result<Story> {
        let mut tx = begin(&self.pool).await?;
        let volume_id = id.as_string();
        let other_id = story_id.as_string();
        relations::associate(
            &mut tx,
            Edge {
                join: &joins::VOLUME_STORIES,
                parent: EntityKind::Volume,
                parent_id: &volume_id,
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

    pub async fn stories_remove(&self, id: VolumeId, story_id: StoryId) -> Result<Story> {
        let mut tx = begin(&self.pool).await?;
        let volume_id = id.as_string();
        let other_id = story_id.as_string();
        relations::dissociate(
            &mut tx,
            Edge {
                join: &joins::VOLUME_STORIES,
                parent: EntityKind::Volume,
                parent_id: &volume_id,
                child: EntityKind::Story,
                child_id: &other_id,
            },
        )
        .await?;
        let story = ensure_story(&mut tx, story_id).await?;
        commit(tx).await?;
        Ok(story)
    }
}
