//! Catalog import engine
//!
//! Reconciles raw spreadsheet rows against one target library. Every
//! acquire step is find-or-create and every associate step swallows the
//! already-associated failure, so re-importing the same file is harmless:
//! the second run creates nothing and only `count_rows` moves.

use crate::options::QueryOptions;
use crate::services::{AuthorService, SeriesService, StoryService, VolumeService};
use shelfmark_core::{
    AppError, Author, LibraryId, Media, Result, Series, Story, Volume,
};
use shelfmark_database::DbPool;
use serde::{Deserialize, Serialize};

/// Missing author name parts are normalized to this placeholder so the
/// find-or-create key stays stable across imports
const NAME_PLACEHOLDER: &str = "?";

/// Sentinel marking a volume as read
const READ_SENTINEL: &str = "x";

/// One raw catalog row, as handed over by the CSV reader
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRow {
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub name: Option<String>,
    pub year: Option<String>,
    #[serde(rename = "box")]
    pub box_label: Option<String>,
    pub read: Option<String>,
    pub series_name: Option<String>,
    pub series_ordinal: Option<String>,
    pub notes: Option<String>,
}

/// Running totals for one import; entity and association counters move
/// only when something was actually created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCounts {
    pub count_rows: u32,
    pub count_authors: u32,
    pub count_authors_series: u32,
    pub count_authors_stories: u32,
    pub count_authors_volumes: u32,
    pub count_series: u32,
    pub count_series_stories: u32,
    pub count_stories: u32,
    pub count_volumes: u32,
    pub count_volumes_stories: u32,
}

/// Classifies the spreadsheet's box/shelf column into a media kind.
/// Unrecognized values mean a physical book and the raw value is kept as
/// its location.
pub fn classify_media(value: Option<&str>) -> (Media, Option<String>) {
    match value {
        None => (Media::Book, None),
        Some("Kindle") => (Media::Kindle, None),
        Some("Kobo") => (Media::Kobo, None),
        Some("Returned") => (Media::Returned, None),
        Some("Unlimited") => (Media::Unlimited, None),
        Some(other) => (Media::Book, Some(other.to_string())),
    }
}

fn clean(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Maps an association result onto "did we create a new join row":
/// already-associated collapses to false, anything else propagates
fn absorb_duplicate<T>(result: Result<T>) -> Result<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(AppError::DuplicateAssociation { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

pub struct Importer {
    library_id: LibraryId,
    authors: AuthorService,
    series: SeriesService,
    stories: StoryService,
    volumes: VolumeService,
    counts: ImportCounts,
}

impl Importer {
    pub fn new(pool: DbPool, library_id: LibraryId) -> Self {
        Self {
            library_id,
            authors: AuthorService::new(pool.clone()),
            series: SeriesService::new(pool.clone()),
            stories: StoryService::new(pool.clone()),
            volumes: VolumeService::new(pool),
            counts: ImportCounts::default(),
        }
    }

    pub fn counts(&self) -> ImportCounts {
        self.counts
    }

    /// Processes one row. Rows must be processed sequentially; the
    /// counters assume no interleaved imports into the same library.
    pub async fn process_row(&mut self, row: &ImportRow) -> Result<()> {
        self.counts.count_rows += 1;

        let first_name = clean(&row.first_name).unwrap_or(NAME_PLACEHOLDER);
        let last_name = clean(&row.last_name).unwrap_or(NAME_PLACEHOLDER);
        let author = self.acquire_author(first_name, last_name).await?;

        // A row without a title carries no story or volume, but its
        // author/series link is still recorded below
        let title = clean(&row.name);
        let story = match title {
            Some(name) => Some(self.acquire_story(name).await?),
            None => None,
        };
        let volume = match title {
            Some(name) => Some(self.acquire_volume(name, row).await?),
            None => None,
        };

        if let Some(series_name) = clean(&row.series_name) {
            let series = self.acquire_series(series_name).await?;

            if absorb_duplicate(self.authors.series_add(author.id, series.id).await)? {
                self.counts.count_authors_series += 1;
            }
            if let Some(story) = &story {
                let ordinal = clean(&row.series_ordinal).and_then(|s| s.parse::<i64>().ok());
                if absorb_duplicate(self.series.stories_add(series.id, story.id, ordinal).await)? {
                    self.counts.count_series_stories += 1;
                }
            }
        }

        if let Some(story) = &story {
            if absorb_duplicate(self.authors.stories_add(author.id, story.id).await)? {
                self.counts.count_authors_stories += 1;
            }
            if let Some(volume) = &volume {
                if absorb_duplicate(self.volumes.stories_add(volume.id, story.id).await)? {
                    self.counts.count_volumes_stories += 1;
                }
            }
        }
        if let Some(volume) = &volume {
            if absorb_duplicate(self.authors.volumes_add(author.id, volume.id).await)? {
                self.counts.count_authors_volumes += 1;
            }
        }

        Ok(())
    }

    async fn acquire_author(&mut self, first_name: &str, last_name: &str) -> Result<Author> {
        match self
            .authors
            .exact(self.library_id, first_name, last_name, &QueryOptions::default())
            .await
        {
            Ok(author) => Ok(author),
            Err(AppError::NotFound { .. }) => {
                let author = self
                    .authors
                    .insert(Author::new(self.library_id, first_name, last_name))
                    .await?;
                self.counts.count_authors += 1;
                Ok(author)
            }
            Err(e) => Err(e),
        }
    }

    async fn acquire_series(&mut self, name: &str) -> Result<Series> {
        match self
            .series
            .exact(self.library_id, name, &QueryOptions::default())
            .await
        {
            Ok(series) => Ok(series),
            Err(AppError::NotFound { .. }) => {
                let series = self
                    .series
                    .insert(Series::new(self.library_id, name))
                    .await?;
                self.counts.count_series += 1;
                Ok(series)
            }
            Err(e) => Err(e),
        }
    }

    async fn acquire_story(&mut self, name: &str) -> Result<Story> {
        match self
            .stories
            .exact(self.library_id, name, &QueryOptions::default())
            .await
        {
            Ok(story) => Ok(story),
            Err(AppError::NotFound { .. }) => {
                let story = self
                    .stories
                    .insert(Story::new(self.library_id, name))
                    .await?;
                self.counts.count_stories += 1;
                Ok(story)
            }
            Err(e) => Err(e),
        }
    }

    async fn acquire_volume(&mut self, name: &str, row: &ImportRow) -> Result<Volume> {
        match self
            .volumes
            .exact(self.library_id, name, &QueryOptions::default())
            .await
        {
            Ok(volume) => Ok(volume),
            Err(AppError::NotFound { .. }) => {
                let (media, location) = classify_media(clean(&row.box_label));
                let mut volume = Volume::new(self.library_id, name, media);
                volume.location = location;
                volume.read = clean(&row.read) == Some(READ_SENTINEL);
                volume.notes = clean(&row.notes).map(str::to_string);

                let volume = self.volumes.insert(volume).await?;
                self.counts.count_volumes += 1;
                Ok(volume)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_media_mapping() {
        assert_eq!(classify_media(Some("Kindle")), (Media::Kindle, None));
        assert_eq!(classify_media(Some("Kobo")), (Media::Kobo, None));
        assert_eq!(classify_media(Some("Returned")), (Media::Returned, None));
        assert_eq!(classify_media(Some("Unlimited")), (Media::Unlimited, None));
        assert_eq!(classify_media(None), (Media::Book, None));

        // Anything else is a physical book stored at that location
        assert_eq!(
            classify_media(Some("Box 7")),
            (Media::Book, Some("Box 7".to_string()))
        );
    }

    #[test]
    fn test_counts_serialize_camel_case() {
        let counts = ImportCounts {
            count_rows: 2,
            count_authors: 1,
            ..ImportCounts::default()
        };
        let json = serde_json::to_value(counts).unwrap();
        assert_eq!(json["countRows"], 2);
        assert_eq!(json["countAuthors"], 1);
        assert_eq!(json["countVolumesStories"], 0);
    }

    #[test]
    fn test_absorb_duplicate_filters_only_duplicates() {
        assert!(absorb_duplicate(Ok(())).unwrap());
        assert!(!absorb_duplicate::<()>(Err(AppError::DuplicateAssociation {
            parent: "Author".into(),
            parent_id: "a".into(),
            child: "Story".into(),
            child_id: "s".into(),
        }))
        .unwrap());
        assert!(absorb_duplicate::<()>(Err(AppError::bad_request("other"))).is_err());
    }
}
