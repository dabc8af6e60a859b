//! Series service

use crate::options::QueryOptions;
use crate::relations::{self, Edge};
use crate::services::{
    acquire, attach, begin, commit, ensure_author, ensure_series, ensure_story, single,
};
use crate::validate;
use shelfmark_core::{
    AppError, Author, AuthorId, EntityKind, LibraryId, Result, Series, SeriesId, Story, StoryId,
};
use shelfmark_database::queries::{self, joins};
use shelfmark_database::{AuthorFilter, DbPool, NameFilter};
use serde::Deserialize;

/// Partial update for a series; absent fields keep their current values
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPatch {
    pub name: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct SeriesService {
    pool: DbPool,
}

impl SeriesService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn all(&self, options: &QueryOptions) -> Result<Vec<Series>> {
        let mut conn = acquire(&self.pool).await?;
        let mut items =
            queries::series::list(&mut conn, None, &NameFilter::Any, &options.page()).await?;
        attach::series(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn find(&self, id: SeriesId, options: &QueryOptions) -> Result<Series> {
        let mut conn = acquire(&self.pool).await?;
        let mut entry = ensure_series(&mut conn, id).await?;
        attach::series(&mut conn, std::slice::from_mut(&mut entry), &options.include).await?;
        Ok(entry)
    }

    /// Finds the single series in the library with exactly this name
    pub async fn exact(
        &self,
        library_id: LibraryId,
        name: &str,
        options: &QueryOptions,
    ) -> Result<Series> {
        let mut conn = acquire(&self.pool).await?;
        let items = queries::series::list(
            &mut conn,
            Some(library_id),
            &NameFilter::Exact(name.to_string()),
            &options.page(),
        )
        .await?;
        let mut entry = single(items, EntityKind::Series, name)?;
        attach::series(&mut conn, std::slice::from_mut(&mut entry), &options.include).await?;
        Ok(entry)
    }

    /// Lists series in the library whose name contains the substring,
    /// case-insensitively
    pub async fn name(
        &self,
        library_id: LibraryId,
        substring: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Series>> {
        let mut conn = acquire(&self.pool).await?;
        let mut items = queries::series::list(
            &mut conn,
            Some(library_id),
            &NameFilter::Contains(substring.to_string()),
            &options.page(),
        )
        .await?;
        attach::series(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn insert(&self, series: Series) -> Result<Series> {
        let mut tx = begin(&self.pool).await?;
        validate::series(&mut tx, &series, None).await?;
        queries::series::insert(&mut tx, &series).await?;
        commit(tx).await?;

        log::debug!("Created series '{}' ({})", series.name, series.id);
        Ok(series)
    }

    pub async fn update(&self, id: SeriesId, patch: SeriesPatch) -> Result<Series> {
        let mut tx = begin(&self.pool).await?;
        let mut candidate = ensure_series(&mut tx, id).await?;
        if let Some(name) = patch.name {
            candidate.name = name;
        }
        if let Some(notes) = patch.notes {
            candidate.notes = Some(notes);
        }

        validate::series(&mut tx, &candidate, Some(id)).await?;
        if queries::series::update(&mut tx, &candidate).await? == 0 {
            return Err(AppError::bad_request(format!("Cannot update Series {}", id)));
        }
        let updated = ensure_series(&mut tx, id).await?;
        commit(tx).await?;
        Ok(updated)
    }

    pub async fn remove(&self, id: SeriesId) -> Result<Series> {
        let mut tx = begin(&self.pool).await?;
        let original = ensure_series(&mut tx, id).await?;
        if queries::series::delete(&mut tx, id).await? == 0 {
            return Err(AppError::not_found(EntityKind::Series, id));
        }
        commit(tx).await?;
        Ok(original)
    }

    // Series -> Authors

    pub async fn authors(&self, id: SeriesId, options: &QueryOptions) -> Result<Vec<Author>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_series(&mut conn, id).await?;
        let mut items =
            queries::authors::list_for_series(&mut conn, id, &AuthorFilter::Any, &options.page())
                .await?;
        attach::authors(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn authors_exact(
        &self,
        id: SeriesId,
        first_name: &str,
        last_name: &str,
        options: &QueryOptions,
    ) -> Result<Author> {
        let mut conn = acquire(&self.pool).await?;
        ensure_series(&mut conn, id).await?;
        let filter = AuthorFilter::Exact {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        };
        let items =
            queries::authors::list_for_series(&mut conn, id, &filter, &options.page()).await?;
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
        id: SeriesId,
        substring: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Author>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_series(&mut conn, id).await?;
        let filter = AuthorFilter::Contains(substring.to_string());
        let mut items =
            queries::authors::list_for_series(&mut conn, id, &filter, &options.page()).await?;
        attach::authors(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn authors_add(&self, id: SeriesId, author_id: AuthorId) -> Result<Author> {
        let mut tx = begin(&self.pool).await?;
        let series_id = id.as_string();
        let other_id = author_id.as_string();
        relations::associate(
            &mut tx,
            Edge {
                join: &joins::AUTHOR_SERIES,
                parent: EntityKind::Series,
                parent_id: &series_id,
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

    pub async fn authors_remove(&self, id: SeriesId, author_id: AuthorId) -> Result<Author> {
        let mut tx = begin(&self.pool).await?;
        let series_id = id.as_string();
        let other_id = author_id.as_string();
        relations::dissociate(
            &mut tx,
            Edge {
                join: &joins::AUTHOR_SERIES,
                parent: EntityKind::Series,
                parent_id: &series_id,
                child: EntityKind::Author,
                child_id: &other_id,
            },
        )
        .await?;
        let author = ensure_author(&mut tx, author_id).await?;
        commit(tx).await?;
        Ok(author)
    }

    // Series -> Stories

    pub async fn stories(&self, id: SeriesId, options: &QueryOptions) -> Result<Vec<Story>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_series(&mut conn, id).await?;
        let mut items =
            queries::stories::list_for_series(&mut conn, id, &NameFilter::Any, &options.page())
                .await?;
        attach::stories(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    pub async fn stories_exact(
        &self,
        id: SeriesId,
        name: &str,
        options: &QueryOptions,
    ) -> Result<Story> {
        let mut conn = acquire(&self.pool).await?;
        ensure_series(&mut conn, id).await?;
        let items = queries::stories::list_for_series(
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
        id: SeriesId,
        substring: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Story>> {
        let mut conn = acquire(&self.pool).await?;
        ensure_series(&mut conn, id).await?;
        let mut items = queries::stories::list_for_series(
            &mut conn,
            id,
            &NameFilter::Contains(substring.to_string()),
            &options.page(),
        )
        .await?;
        attach::stories(&mut conn, &mut items, &options.include).await?;
        Ok(items)
    }

    /// Associates a story with this series. `ordinal` records the story's
    /// position within the series and is stored as given.
    pub async fn stories_add(
        &self,
        id: SeriesId,
        story_id: StoryId,
        ordinal: Option<i64>,
    ) -> Result<Story> {
        let mut tx = begin(&self.pool).await?;
        let series_id = id.as_string();
        let other_id = story_id.as_string();
        relations::associate(
            &mut tx,
            Edge {
                join: &joins::SERIES_STORIES,
                parent: EntityKind::Series,
                parent_id: &series_id,
                child: EntityKind::Story,
                child_id: &other_id,
            },
            ordinal,
        )
        .await?;
        let story = ensure_story(&mut tx, story_id).await?;
        commit(tx).await?;
        Ok(story)
    }

    pub async fn stories_remove(&self, id: SeriesId, story_id: StoryId) -> Result<Story> {
        let mut tx = begin(&self.pool).await?;
        let series_id = id.as_string();
        let other_id = story_id.as_string();
        relations::dissociate(
            &mut tx,
            Edge {
                join: &joins::SERIES_STORIES,
                parent: EntityKind::Series,
                parent_id: &series_id,
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
