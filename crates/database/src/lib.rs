//! Shelfmark Database Layer
//!
//! SQLite persistence for the catalog, using sqlx. Query functions take
//! `&mut SqliteConnection` so callers control the transactional scope; the
//! service layer in `shelfmark-catalog` wraps each multi-step mutation in
//! one transaction.

pub mod connection;
pub mod migrations;
pub mod queries;

pub use connection::{create_test_db, DbPool};
pub use migrations::{current_version, resync, run_migrations, verify_integrity};
pub use queries::{AuthorFilter, NameFilter, Page};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{authors, libraries, stories};
    use shelfmark_core::{AppError, Author, Library, Story};

    #[tokio::test]
    async fn test_full_database_workflow() -> Result<(), AppError> {
        let pool = create_test_db().await?;
        run_migrations(&pool).await?;

        let library = Library::new("Workflow Library");
        let mut conn = pool
            .acquire()
            .await
            .map_err(|e| AppError::database("acquire", e))?;
        libraries::insert(&mut conn, &library).await?;

        let author = Author::new(library.id, "Bam Bam", "Rubble");
        authors::insert(&mut conn, &author).await?;

        let story = Story::new(library.id, "Hunt the Wumpus");
        stories::insert(&mut conn, &story).await?;

        queries::joins::AUTHOR_STORIES
            .insert(&mut conn, &author.id.as_string(), &story.id.as_string(), None)
            .await?;

        let listed = stories::list_for_author(
            &mut conn,
            author.id,
            &NameFilter::Any,
            &Page::default(),
        )
        .await?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, story.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_cascade_delete_removes_join_rows() -> Result<(), AppError> {
        let pool = create_test_db().await?;
        run_migrations(&pool).await?;

        let library = Library::new("Cascade Library");
        let mut conn = pool
            .acquire()
            .await
            .map_err(|e| AppError::database("acquire", e))?;
        libraries::insert(&mut conn, &library).await?;

        let author = Author::new(library.id, "Fred", "Flintstone");
        authors::insert(&mut conn, &author).await?;
        let story = Story::new(library.id, "Quarry Days");
        stories::insert(&mut conn, &story).await?;

        queries::joins::AUTHOR_STORIES
            .insert(&mut conn, &author.id.as_string(), &story.id.as_string(), None)
            .await?;

        stories::delete(&mut conn, story.id).await?;

        let count = queries::joins::AUTHOR_STORIES
            .count(&mut conn, &author.id.as_string(), &story.id.as_string())
            .await?;
        assert_eq!(count, 0);

        Ok(())
    }
}
