//! Series database operations

use crate::queries::{qualify, NameFilter, Page};
use shelfmark_core::{AppError, AuthorId, LibraryId, Series, SeriesId, StoryId, Timestamp};
use sqlx::sqlite::SqliteRow;
use sqlx::SqliteConnection;

const COLUMNS: &str = "id, library_id, name, notes, version, created_at, updated_at";

/// Creates a new series row
pub async fn insert(conn: &mut SqliteConnection, series: &Series) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO series (id, library_id, name, notes, version, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(series.id.as_string())
    .bind(series.library_id.as_string())
    .bind(&series.name)
    .bind(&series.notes)
    .bind(series.version)
    .bind(series.created_at.as_millis())
    .bind(series.updated_at.as_millis())
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::database("Failed to create series", e))?;

    Ok(())
}

/// Gets a series by ID
pub async fn find(conn: &mut SqliteConnection, id: SeriesId) -> Result<Option<Series>, AppError> {
    let sql = format!("SELECT {} FROM series WHERE id = ?", COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.as_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to fetch series", e))?;

    row.map(row_to_series).transpose()
}

/// Updates the allow-listed series columns, bumping version and updated_at.
/// Returns the number of rows matched.
pub async fn update(conn: &mut SqliteConnection, series: &Series) -> Result<u64, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE series
        SET name = ?, notes = ?, version = version + 1, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&series.name)
    .bind(&series.notes)
    .bind(Timestamp::now().as_millis())
    .bind(series.id.as_string())
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::database("Failed to update series", e))?;

    Ok(result.rows_affected())
}

/// Deletes a series by ID, returning the number of rows affected
pub async fn delete(conn: &mut SqliteConnection, id: SeriesId) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM series WHERE id = ?")
        .bind(id.as_string())
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to delete series", e))?;

    Ok(result.rows_affected())
}

/// Lists series in canonical order (library, name), optionally scoped to
/// one library
pub async fn list(
    conn: &mut SqliteConnection,
    scope: Option<LibraryId>,
    filter: &NameFilter,
    page: &Page,
) -> Result<Vec<Series>, AppError> {
    let mut sql = format!("SELECT {} FROM series WHERE 1 = 1", COLUMNS);
    if scope.is_some() {
        sql.push_str(" AND library_id = ?");
    }
    sql.push_str(&filter.sql("name"));
    sql.push_str(" ORDER BY library_id, name");
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
        .map_err(|e| AppError::database("Failed to list series", e))?;

    rows.into_iter().map(row_to_series).collect()
}

/// Lists series associated with an author
pub async fn list_for_author(
    conn: &mut SqliteConnection,
    author_id: AuthorId,
    filter: &NameFilter,
    page: &Page,
) -> Result<Vec<Series>, AppError> {
    list_joined(conn, "author_series", "author_id", author_id.as_string(), filter, page).await
}

/// Lists series associated with a story
pub async fn list_for_story(
    conn: &mut SqliteConnection,
    story_id: StoryId,
    filter: &NameFilter,
    page: &Page,
) -> Result<Vec<Series>, AppError> {
    list_joined(conn, "series_stories", "story_id", story_id.as_string(), filter, page).await
}

async fn list_joined(
    conn: &mut SqliteConnection,
    join_table: &str,
    join_col: &str,
    parent_id: String,
    filter: &NameFilter,
    page: &Page,
) -> Result<Vec<Series>, AppError> {
    let mut sql = format!(
        "SELECT {} FROM series s JOIN {} j ON s.id = j.series_id WHERE j.{} = ?",
        qualify(COLUMNS, "s"),
        join_table,
        join_col,
    );
    sql.push_str(&filter.sql("s.name"));
    sql.push_str(" ORDER BY s.library_id, s.name");
    sql.push_str(page.sql());

    let mut q = sqlx::query(&sql).bind(parent_id);
    q = filter.bind(q);
    q = page.bind(q);

    let rows = q
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to list associated series", e))?;

    rows.into_iter().map(row_to_series).collect()
}

/// Counts series in a library with the given name, excluding one id when
/// updating
pub async fn count_name_conflicts(
    conn: &mut SqliteConnection,
    library_id: LibraryId,
    name: &str,
    exclude: Option<SeriesId>,
) -> Result<i64, AppError> {
    let (sql, excluded) = match exclude {
        Some(id) => (
            "SELECT COUNT(*) FROM series WHERE library_id = ? AND name = ? AND id <> ?",
            Some(id.as_string()),
        ),
        None => (
            "SELECT COUNT(*) FROM series WHERE library_id = ? AND name = ?",
            None,
        ),
    };

    let mut q = sqlx::query_scalar(sql)
        .bind(library_id.as_string())
        .bind(name);
    if let Some(id) = excluded {
        q = q.bind(id);
    }

    q.fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to count series names", e))
}

/// Converts a database row to a Series
pub(crate) fn row_to_series(row: SqliteRow) -> Result<Series, AppError> {
    use sqlx::Row;

    let id_str: String = row
        .try_get("id")
        .map_err(|e| AppError::database("Missing series ID", e))?;
    let id =
        SeriesId::from_string(&id_str).map_err(|e| AppError::database("Invalid series ID", e))?;

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

    Ok(Series {
        id,
        library_id,
        name: row
            .try_get("name")
            .map_err(|e| AppError::database("Missing name", e))?,
        notes: row.try_get("notes").ok(),
        version: row
            .try_get("version")
            .map_err(|e| AppError::database("Missing version", e))?,
        created_at: Timestamp::from_millis(created_at_ms),
        updated_at: Timestamp::from_millis(updated_at_ms),
        library: None,
        authors: None,
        stories: None,
    })
}
