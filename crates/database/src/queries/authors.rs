//! Author database operations

use crate::queries::{qualify, AuthorFilter, Page};
use shelfmark_core::{AppError, Author, AuthorId, LibraryId, SeriesId, StoryId, Timestamp, VolumeId};
use sqlx::sqlite::SqliteRow;
use sqlx::SqliteConnection;

const COLUMNS: &str = "id, library_id, first_name, last_name, notes, version, created_at, updated_at";

/// Creates a new author row
pub async fn insert(conn: &mut SqliteConnection, author: &Author) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO authors (id, library_id, first_name, last_name, notes, version, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(author.id.as_string())
    .bind(author.library_id.as_string())
    .bind(&author.first_name)
    .bind(&author.last_name)
    .bind(&author.notes)
    .bind(author.version)
    .bind(author.created_at.as_millis())
    .bind(author.updated_at.as_millis())
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::database("Failed to create author", e))?;

    Ok(())
}

/// Gets an author by ID
pub async fn find(conn: &mut SqliteConnection, id: AuthorId) -> Result<Option<Author>, AppError> {
    let sql = format!("SELECT {} FROM authors WHERE id = ?", COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.as_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to fetch author", e))?;

    row.map(row_to_author).transpose()
}

/// Updates the allow-listed author columns, bumping version and updated_at.
/// Returns the number of rows matched.
pub async fn update(conn: &mut SqliteConnection, author: &Author) -> Result<u64, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE authors
        SET first_name = ?, last_name = ?, notes = ?, version = version + 1, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&author.first_name)
    .bind(&author.last_name)
    .bind(&author.notes)
    .bind(Timestamp::now().as_millis())
    .bind(author.id.as_string())
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::database("Failed to update author", e))?;

    Ok(result.rows_affected())
}

/// Deletes an author by ID, returning the number of rows affected
pub async fn delete(conn: &mut SqliteConnection, id: AuthorId) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM authors WHERE id = ?")
        .bind(id.as_string())
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to delete author", e))?;

    Ok(result.rows_affected())
}

/// Lists authors in canonical order (library, last name, first name),
/// optionally scoped to one library
pub async fn list(
    conn: &mut SqliteConnection,
    scope: Option<LibraryId>,
    filter: &AuthorFilter,
    page: &Page,
) -> Result<Vec<Author>, AppError> {
    let mut sql = format!("SELECT {} FROM authors WHERE 1 = 1", COLUMNS);
    if scope.is_some() {
        sql.push_str(" AND library_id = ?");
    }
    sql.push_str(&filter.sql(""));
    sql.push_str(" ORDER BY library_id, last_name, first_name");
    sql.push_str(page.sql());

    let mut q = sqlx::query(&sql);
    if let Some(library_id) = scope {
        q = q.bind(library_id.as_string());
    }
    q = filter.bind(q);
    q = page.bind(q);

    let rows = q
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to list authors", e))?;

    rows.into_iter().map(row_to_author).collect()
}

/// Lists authors associated with a series
pub async fn list_for_series(
    conn: &mut SqliteConnection,
    series_id: SeriesId,
    filter: &AuthorFilter,
    page: &Page,
) -> Result<Vec<Author>, AppError> {
    list_joined(conn, "author_series", "series_id", series_id.as_string(), filter, page).await
}

/// Lists authors associated with a story
pub async fn list_for_story(
    conn: &mut SqliteConnection,
    story_id: StoryId,
    filter: &AuthorFilter,
    page: &Page,
) -> Result<Vec<Author>, AppError> {
    list_joined(conn, "author_stories", "story_id", story_id.as_string(), filter, page).await
}

/// Lists authors associated with a volume
pub async fn list_for_volume(
    conn: &mut SqliteConnection,
    volume_id: VolumeId,
    filter: &AuthorFilter,
    page: &Page,
) -> Result<Vec<Author>, AppError> {
    list_joined(conn, "author_volumes", "volume_id", volume_id.as_string(), filter, page).await
}

async fn list_joined(
    conn: &mut SqliteConnection,
    join_table: &str,
    join_col: &str,
    parent_id: String,
    filter: &AuthorFilter,
    page: &Page,
) -> Result<Vec<Author>, AppError> {
    let mut sql = format!(
        "SELECT {} FROM authors a JOIN {} j ON a.id = j.author_id WHERE j.{} = ?",
        qualify(COLUMNS, "a"),
        join_table,
        join_col,
    );
    sql.push_str(&filter.sql("a."));
    sql.push_str(" ORDER BY a.library_id, a.last_name, a.first_name");
    sql.push_str(page.sql());

    let mut q = sqlx::query(&sql).bind(parent_id);
    q = filter.bind(q);
    q = page.bind(q);

    let rows = q
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to list associated authors", e))?;

    rows.into_iter().map(row_to_author).collect()
}

/// Counts authors in a library with the given name pair, excluding one id
/// when updating
pub async fn count_name_conflicts(
    conn: &mut SqliteConnection,
    library_id: LibraryId,
    first_name: &str,
    last_name: &str,
    exclude: Option<AuthorId>,
) -> Result<i64, AppError> {
    let (sql, excluded) = match exclude {
        Some(id) => (
            "SELECT COUNT(*) FROM authors WHERE library_id = ? AND first_name = ? AND last_name = ? AND id <> ?",
            Some(id.as_string()),
        ),
        None => (
            "SELECT COUNT(*) FROM authors WHERE library_id = ? AND first_name = ? AND last_name = ?",
            None,
        ),
    };

    let mut q = sqlx::query_scalar(sql)
        .bind(library_id.as_string())
        .bind(first_name)
        .bind(last_name);
    if let Some(id) = excluded {
        q = q.bind(id);
    }

    q.fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to count author names", e))
}

/// Converts a database row to an Author
pub(crate) fn row_to_author(row: SqliteRow) -> Result<Author, AppError> {
    use sqlx::Row;

    let id_str: String = row
        .try_get("id")
        .map_err(|e| AppError::database("Missing author ID", e))?;
    let id =
        AuthorId::from_string(&id_str).map_err(|e| AppError::database("Invalid author ID", e))?;

    let library_id_str: String = row
        .try_get("library_id")
        .map_err(|e| AppError::database("Missing library ID", e))?;
    let library_id = LibraryId::from_string(&library_id_str)
        .map_err(|e| AppError::database("Invalid library ID", e))?;

    let created_at_ms: i64 = row
        .try_get("created_at")
        .map_err(|e| AppError::database("Missing created_at", e))?;
    let updated_at_ms: i64 = row
        .try_get("updated_at")
        .map_err(|e| AppError::database("Missing updated_at", e))?;

    Ok(Author {
        id,
        library_id,
        first_name: row
            .try_get("first_name")
            .map_err(|e| AppError::database("Missing first_name", e))?,
        last_name: row
            .try_get("last_name")
            .map_err(|e| AppError::database("Missing last_name", e))?,
        notes: row.try_get("notes").ok(),
        version: row
            .try_get("version")
            .map_err(|e| AppError::database("Missing version", e))?,
        created_at: Timestamp::from_millis(created_at_ms),
        updated_at: Timestamp::from_millis(updated_at_ms),
        library: None,
        series: None,
        stories: None,
        volumes: None,
    })
}
