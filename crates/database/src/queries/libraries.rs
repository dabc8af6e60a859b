//! Library database operations

use crate::queries::{NameFilter, Page};
use shelfmark_core::{AppError, Library, LibraryId, Timestamp};
use sqlx::sqlite::SqliteRow;
use sqlx::SqliteConnection;

const COLUMNS: &str = "id, name, notes, version, created_at, updated_at";

/// Creates a new library row
pub async fn insert(conn: &mut SqliteConnection, library: &Library) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO libraries (id, name, notes, version, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(library.id.as_string())
    .bind(&library.name)
    .bind(&library.notes)
    .bind(library.version)
    .bind(library.created_at.as_millis())
    .bind(library.updated_at.as_millis())
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::database("Failed to create library", e))?;

    Ok(())
}

/// Gets a library by ID
pub async fn find(conn: &mut SqliteConnection, id: LibraryId) -> Result<Option<Library>, AppError> {
    let sql = format!("SELECT {} FROM libraries WHERE id = ?", COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.as_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to fetch library", e))?;

    row.map(row_to_library).transpose()
}

/// Updates the allow-listed library columns, bumping version and updated_at.
/// Returns the number of rows matched.
pub async fn update(conn: &mut SqliteConnection, library: &Library) -> Result<u64, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE libraries
        SET name = ?, notes = ?, version = version + 1, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&library.name)
    .bind(&library.notes)
    .bind(Timestamp::now().as_millis())
    .bind(library.id.as_string())
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::database("Failed to update library", e))?;

    Ok(result.rows_affected())
}

/// Deletes a library by ID, returning the number of rows affected
pub async fn delete(conn: &mut SqliteConnection, id: LibraryId) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM libraries WHERE id = ?")
        .bind(id.as_string())
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to delete library", e))?;

    Ok(result.rows_affected())
}

/// Lists libraries in canonical order (name ascending)
pub async fn list(
    conn: &mut SqliteConnection,
    filter: &NameFilter,
    page: &Page,
) -> Result<Vec<Library>, AppError> {
    let mut sql = format!("SELECT {} FROM libraries WHERE 1 = 1", COLUMNS);
    sql.push_str(&filter.sql("name"));
    sql.push_str(" ORDER BY name");
    sql.push_str(page.sql());

    let mut q = sqlx::query(&sql);
    q = filter.bind(q);
    q = page.bind(q);

    let rows = q
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to list libraries", e))?;

    rows.into_iter().map(row_to_library).collect()
}

/// Counts libraries with the given name, excluding one id when updating
pub async fn count_name_conflicts(
    conn: &mut SqliteConnection,
    name: &str,
    exclude: Option<LibraryId>,
) -> Result<i64, AppError> {
    let (sql, excluded) = match exclude {
        Some(id) => (
            "SELECT COUNT(*) FROM libraries WHERE name = ? AND id <> ?",
            Some(id.as_string()),
        ),
        None => ("SELECT COUNT(*) FROM libraries WHERE name = ?", None),
    };

    let mut q = sqlx::query_scalar(sql).bind(name);
    if let Some(id) = excluded {
        q = q.bind(id);
    }

    q.fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to count library names", e))
}

/// Converts a database row to a Library
pub(crate) fn row_to_library(row: SqliteRow) -> Result<Library, AppError> {
    use sqlx::Row;

    let id_str: String = row
        .try_get("id")
        .map_err(|e| AppError::database("Missing library ID", e))?;
    let id =
        LibraryId::from_string(&id_str).map_err(|e| AppError::database("Invalid library ID", e))?;

    let created_at_ms: i64 = row
        .try_get("created_at")
        .map_err(|e| AppError::database("Missing created_at", e))?;
    let updated_at_ms: i64 = row
        .try_get("updated_at")
        .map_err(|e| AppError::database("Missing updated_at", e))?;

    Ok(Library {
        id,
        name: row
            .try_get("name")
            .map_err(|e| AppError::database("Missing name", e))?,
        notes: row.try_get("notes").ok(),
        version: row
            .try_get("version")
            .map_err(|e| AppError::database("Missing version", e))?,
        created_at: Timestamp::from_millis(created_at_ms),
        updated_at: Timestamp::from_millis(updated_at_ms),
        authors: None,
        series: None,
        stories: None,
        volumes: None,
    })
}
