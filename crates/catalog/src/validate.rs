//! Entity validation
//!
//! Runs inside the same transaction as the write it protects, so the
//! uniqueness counts and the insert/update see one consistent snapshot.

use shelfmark_core::{
    AppError, Author, AuthorId, Library, LibraryId, Result, Series, SeriesId, Story, StoryId,
    Volume, VolumeId,
};
use shelfmark_database::queries::{authors, libraries, series, stories, volumes};
use sqlx::SqliteConnection;

fn required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(field, "Is required"));
    }
    Ok(())
}

/// Fails Validation (not NotFound) when the referenced library is missing,
/// because a dangling libraryId on a payload is the caller's field error
async fn library_exists(conn: &mut SqliteConnection, library_id: LibraryId) -> Result<()> {
    libraries::find(conn, library_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| {
            AppError::validation("libraryId", format!("Missing Library {}", library_id))
        })
}

pub async fn library(
    conn: &mut SqliteConnection,
    library: &Library,
    exclude: Option<LibraryId>,
) -> Result<()> {
    required("name", &library.name)?;

    if libraries::count_name_conflicts(conn, &library.name, exclude).await? > 0 {
        return Err(AppError::validation(
            "name",
            format!("Name '{}' is already in use", library.name),
        ));
    }
    Ok(())
}

pub async fn author(
    conn: &mut SqliteConnection,
    author: &Author,
    exclude: Option<AuthorId>,
) -> Result<()> {
    required("firstName", &author.first_name)?;
    required("lastName", &author.last_name)?;
    library_exists(conn, author.library_id).await?;

    let conflicts = authors::count_name_conflicts(
        conn,
        author.library_id,
        &author.first_name,
        &author.last_name,
        exclude,
    )
    .await?;
    if conflicts > 0 {
        return Err(AppError::validation(
            "name",
            format!(
                "Name '{} {}' is already in use within this Library",
                author.first_name, author.last_name
            ),
        ));
    }
    Ok(())
}

pub async fn series(
    conn: &mut SqliteConnection,
    series: &Series,
    exclude: Option<SeriesId>,
) -> Result<()> {
    required("name", &series.name)?;
    library_exists(conn, series.library_id).await?;

    if series::count_name_conflicts(conn, series.library_id, &series.name, exclude).await? > 0 {
        return Err(AppError::validation(
            "name",
            format!(
                "Name '{}' is already in use within this Library",
                series.name
            ),
        ));
    }
    Ok(())
}

pub async fn story(
    conn: &mut SqliteConnection,
    story: &Story,
    exclude: Option<StoryId>,
) -> Result<()> {
    required("name", &story.name)?;
    library_exists(conn, story.library_id).await?;

    if stories::count_name_conflicts(conn, story.library_id, &story.name, exclude).await? > 0 {
        return Err(AppError::validation(
            "name",
            format!("Name '{}' is already in use within this Library", story.name),
        ));
    }
    Ok(())
}

pub async fn volume(
    conn: &mut SqliteConnection,
    volume: &Volume,
    exclude: Option<VolumeId>,
) -> Result<()> {
    required("name", &volume.name)?;
    library_exists(conn, volume.library_id).await?;

    if volumes::count_name_conflicts(conn, volume.library_id, &volume.name, exclude).await? > 0 {
        return Err(AppError::validation(
            "name",
            format!(
                "Name '{}' is already in use within this Library",
                volume.name
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfmark_database::{create_test_db, run_migrations, DbPool};

    async fn setup() -> (DbPool, Library) {
        let pool = create_test_db().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let lib = Library::new("Test Library");
        let mut conn = pool.acquire().await.unwrap();
        libraries::insert(&mut conn, &lib).await.unwrap();
        drop(conn);
        (pool, lib)
    }

    #[tokio::test]
    async fn test_required_name() {
        let (pool, lib) = setup().await;
        let mut conn = pool.acquire().await.unwrap();

        let blank = Story::new(lib.id, "   ");
        let err = story(&mut conn, &blank, None).await.unwrap_err();
        assert_eq!(err.to_string(), "name: Is required");
    }

    #[tokio::test]
    async fn test_missing_library_reference() {
        let (pool, _lib) = setup().await;
        let mut conn = pool.acquire().await.unwrap();

        let orphan = Author::new(LibraryId::new(), "Fred", "Flintstone");
        let err = author(&mut conn, &orphan, None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "libraryId"));
        assert!(err.to_string().contains("Missing Library"));
    }

    #[tokio::test]
    async fn test_author_name_unique_within_library() {
        let (pool, lib) = setup().await;
        let mut conn = pool.acquire().await.unwrap();

        let first = Author::new(lib.id, "Bam Bam", "Rubble");
        authors::insert(&mut conn, &first).await.unwrap();

        let twin = Author::new(lib.id, "Bam Bam", "Rubble");
        let err = author(&mut conn, &twin, None).await.unwrap_err();
        assert!(err
            .to_string()
            .contains("is already in use within this Library"));

        // Excluding the existing row is how updates validate themselves
        assert!(author(&mut conn, &first, Some(first.id)).await.is_ok());
    }

    #[tokio::test]
    async fn test_same_name_allowed_across_libraries() {
        let (pool, lib) = setup().await;
        let mut conn = pool.acquire().await.unwrap();

        let other = Library::new("Other Library");
        libraries::insert(&mut conn, &other).await.unwrap();

        let here = Series::new(lib.id, "Wumpus Saga");
        series::insert(&mut conn, &here).await.unwrap();

        let there = Series::new(other.id, "Wumpus Saga");
        assert!(series(&mut conn, &there, None).await.is_ok());
    }
}
