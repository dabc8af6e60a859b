//! Eager-load attachment
//!
//! Fills the optional relation fields on fetched entities according to the
//! caller's `Include` flags. Attached collections are complete and in
//! canonical order; the caller's pagination applies to the top-level
//! result only, never to attachments.

use crate::options::Include;
use shelfmark_core::{Author, Library, Result, Series, Story, Volume};
use shelfmark_database::queries;
use shelfmark_database::{AuthorFilter, NameFilter, Page};
use sqlx::SqliteConnection;

pub(crate) async fn libraries(
    conn: &mut SqliteConnection,
    items: &mut [Library],
    include: &Include,
) -> Result<()> {
    for library in items.iter_mut() {
        if include.authors {
            library.authors = Some(
                queries::authors::list(
                    conn,
                    Some(library.id),
                    &AuthorFilter::Any,
                    &Page::default(),
                )
                .await?,
            );
        }
        if include.series {
            library.series = Some(
                queries::series::list(conn, Some(library.id), &NameFilter::Any, &Page::default())
                    .await?,
            );
        }
        if include.stories {
            library.stories = Some(
                queries::stories::list(conn, Some(library.id), &NameFilter::Any, &Page::default())
                    .await?,
            );
        }
        if include.volumes {
            library.volumes = Some(
                queries::volumes::list(conn, Some(library.id), &NameFilter::Any, &Page::default())
                    .await?,
            );
        }
    }
    Ok(())
}

pub(crate) async fn authors(
    conn: &mut SqliteConnection,
    items: &mut [Author],
    include: &Include,
) -> Result<()> {
    for author in items.iter_mut() {
        if include.library {
            author.library = queries::libraries::find(conn, author.library_id).await?;
        }
        if include.series {
            author.series = Some(
                queries::series::list_for_author(
                    conn,
                    author.id,
                    &NameFilter::Any,
                    &Page::default(),
                )
                .await?,
            );
        }
        if include.stories {
            author.stories = Some(
                queries::stories::list_for_author(
                    conn,
                    author.id,
                    &NameFilter::Any,
                    &Page::default(),
                )
                .await?,
            );
        }
        if include.volumes {
            author.volumes = Some(
                queries::volumes::list_for_author(
                    conn,
                    author.id,
                    &NameFilter::Any,
                    &Page::default(),
                )
                .await?,
            );
        }
    }
    Ok(())
}

pub(crate) async fn series(
    conn: &mut SqliteConnection,
    items: &mut [Series],
    include: &Include,
) -> Result<()> {
    for entry in items.iter_mut() {
        if include.library {
            entry.library = queries::libraries::find(conn, entry.library_id).await?;
        }
        if include.authors {
            entry.authors = Some(
                queries::authors::list_for_series(
                    conn,
                    entry.id,
                    &AuthorFilter::Any,
                    &Page::default(),
                )
                .await?,
            );
        }
        if include.stories {
            entry.stories = Some(
                queries::stories::list_for_series(
                    conn,
                    entry.id,
                    &NameFilter::Any,
                    &Page::default(),
                )
                .await?,
            );
        }
    }
    Ok(())
}

pub(crate) async fn stories(
    conn: &mut SqliteConnection,
    items: &mut [Story],
    include: &Include,
) -> Result<()> {
    for story in items.iter_mut() {
        if include.library {
            story.library = queries::libraries::find(conn, story.library_id).await?;
        }
        if include.authors {
            story.authors = Some(
                queries::authors::list_for_story(
                    conn,
                    story.id,
                    &AuthorFilter::Any,
                    &Page::default(),
                )
                .await?,
            );
        }
        if include.series {
            story.series = Some(
                queries::series::list_for_story(conn, story.id, &NameFilter::Any, &Page::default())
                    .await?,
            );
        }
        if include.volumes {
            story.volumes = Some(
                queries::volumes::list_for_story(
                    conn,
                    story.id,
                    &NameFilter::Any,
                    &Page::default(),
                )
                .await?,
            );
        }
    }
    Ok(())
}

pub(crate) async fn volumes(
    conn: &mut SqliteConnection,
    items: &mut [Volume],
    include: &Include,
) -> Result<()> {
    for volume in items.iter_mut() {
        if include.library {
            volume.library = queries::libraries::find(conn, volume.library_id).await?;
        }
        if include.authors {
            volume.authors = Some(
                queries::authors::list_for_volume(
                    conn,
                    volume.id,
                    &AuthorFilter::Any,
                    &Page::default(),
                )
                .await?,
            );
        }
        if include.stories {
            volume.stories = Some(
                queries::stories::list_for_volume(
                    conn,
                    volume.id,
                    &NameFilter::Any,
                    &Page::default(),
                )
                .await?,
            );
        }
    }
    Ok(())
}
