//! Volume database operations

use crate::queries::{qualify, NameFilter, Page};
use shelfmark_core::{AppError, AuthorId, LibraryId, Media, StoryId, Timestamp, Volume, VolumeId};
use sqlx::sqlite::SqliteRow;
use sqlx::SqliteConnection;

const COLUMNS: &str =
    "id, library_id, name, isbn, location, media, read, notes, version, created_at, updated_at";

/// Creates a new volume row
pub async fn insert(conn: &mut SqliteConnection, volume: &Volume) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO volumes (id, library_id, name, isbn, location, media, read, notes, version, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(volume.id.as_string())
    .bind(volume.library_id.as_string())
    .bind(&volume.name)
    .bind(&volume.isbn)
    .bind(&volume.location)
    .bind(volume.media.as_str())
    .bind(volume.read as i64)
    .bind(&volume.notes)
    .bind(volume.version)
    .bind(volume.created_at.as_millis())
    .bind(volume.updated_at.as_millis())
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::database("Failed to create volume", e))?;

    Ok(())
}

/// Gets a volume by ID
pub async fn find(conn: &mut SqliteConnection, id: VolumeId) -> Result<Option<Volume>, AppError> {
    let sql = format!("SELECT {} FROM volumes WHERE id = ?", COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.as_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to fetch volume", e))?;

    row.map(row_to_volume).transpose()
}

/// Updates the allow-listed volume columns, bumping version and updated_at.
/// Returns the number of rows matched.
pub async fn update(conn: &mut SqliteConnection, volume: &Volume) -> Result<u64, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE volumes
        SET name = ?, isbn = ?, location = ?, media = ?, read = ?, notes = ?,
            version = version + 1, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&volume.name)
    .bind(&volume.isbn)
    .bind(&volume.location)
    .bind(volume.media.as_str())
    .bind(volume.read as i64)
    .bind(&volume.notes)
    .bind(Timestamp::now().as_millis())
    .bind(volume.id.as_string())
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::database("Failed to update volume", e))?;

    Ok(result.rows_affected())
}

/// Deletes a volume by ID, returning the number of rows affected
pub async fn delete(conn: &mut SqliteConnection, id: VolumeId) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM volumes WHERE id = ?")
        .bind(id.as_string())
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to delete volume", e))?;

    Ok(result.rows_affected())
}

/// Lists volumes in canonical order (library, name), optionally scoped to
/// one library
pub async fn list(
    conn: &mut SqliteConnection,
    scope: Option<LibraryId>,
    filter: &NameFilter,
    page: &Page,
) -> Result<Vec<Volume>, AppError> {
    let mut sql = format!("SELECT {} FROM volumes WHERE 1 = 1", COLUMNS);
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
        .map_err(|e| AppError::database("Failed to list volumes", e))?;

    rows.into_iter().map(row_to_volume).collect()
}

/// Lists volumes associated with an author
pub async fn list_for_author(
    conn: &mut SqliteConnection,
    author_id: AuthorId,
    filter: &NameFilter,
    page: &Page,
) -> Result<Vec<Volume>, AppError> {
    list_joined(conn, "author_volumes", "author_id", author_id.as_string(), filter, page).await
}

/// Lists volumes associated with a story
pub async fn list_for_story(
    conn: &mut SqliteConnection,
    story_id: StoryId,
    filter: &NameFilter,
    page: &Page,
) -> Result<Vec<Volume>, AppError> {
    list_joined(conn, "volume_stories", "story_id", story_id.as_string(), filter, page).await
}

async fn list_joined(
    conn: &mut SqliteConnection,
    join_table: &str,
    join_col: &str,
    parent_id: String,
    filter: &NameFilter,
    page: &Page,
) -> Result<Vec<Volume>, AppError> {
    let mut sql = format!(
        "SELECT {} FROM volumes v JOIN {} j ON v.id = j.volume_id WHERE j.{} = ?",
        qualify(COLUMNS, "v"),
        join_table,
        join_col,
    );
    sql.push_str(&filter.sql("v.name"));
    sql.push_str(" ORDER BY v.library_id, v.name");
    sql.push_str(page.sql());

    let mut q = sqlx::query(&sql).bind(parent_id);
    q = filter.bind(q);
    q = page.bind(q);

    let rows = q
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to list associated volumes", e))?;

    rows.into_iter().map(row_to_volume).collect()
}

/// Counts volumes in a library with the given name, excluding one id when
/// updating
pub async fn count_name_conflicts(
    conn: &mut SqliteConnection,
    library_id: LibraryId,
    name: &str,
    exclude: Option<VolumeId>,
) -> Result<i64, AppError> {
    let (sql, excluded) = match exclude {
        Some(id) => (
            "SELECT COUNT(*) FROM volumes WHERE library_id = ? AND name = ? AND id <> ?",
            Some(id.as_string()),
        ),
        None => (
            "SELECT COUNT(*) FROM volumes WHERE library_id = ? AND name = ?",
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
        .map_err(|e| AppError::database("Failed to count volume names", e))
}

/// Converts a database row to a Volume
pub(crate) fn row_to_volume(row: SqliteRow) -> Result<Volume, AppError> {
    use sqlx::Row;

    let id_str: String = row
        .try_get("id")
        .map_err(|e| AppError::database("Missing volume ID", e))?;
    let id =
        VolumeId::from_string(&id_str).map_err(|e| AppError::database("Invalid volume ID", e))?;

    let library_id_str: String = row
        .try_get("library_id")
        .map_err(|e| AppError::database("Missing library ID", e))?;
    let library_id = LibraryId::from_string(&library_id_str)
        .map_err(|e| AppError::database("Invalid library ID", e))?;

    let media_str: String = row
        .try_get("media")
        .map_err(|e| AppError::database("Missing media", e))?;
    let media = Media::parse(&media_str).ok_or_else(|| AppError::Internal {
        message: format!("Unknown media kind '{}'", media_str),
    })?;

    let read: i64 = row
        .try_get("read")
        .map_err(|e| AppError::database("Missing read flag", e))?;

    let created_at_ms: i64 = row
        .try_get("created_at")
        .map_err(|e| AppError::database("Missing created_at", e))?;
    let updated_at_ms: i64 = row
        .try_get("updated_at")
        .map_err(|e| AppError::database("Missing updated_at", e))?;

    Ok(Volume {
        id,
        library_id,
        name: row
            .try_get("name")
            .map_err(|e| AppError::database("Missing name", e))?,
        isbn: row.try_get("isbn").ok(),
        location: row.try_get("location").ok(),
        media,
        read: read != 0,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::create_test_db;
    use crate::migrations::run_migrations;
    use crate::queries::libraries;
    use crate::DbPool;
    use shelfmark_core::Library;

    async fn setup() -> (DbPool, Library) {
        let pool = create_test_db().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let library = Library::new("Test Library");
        let mut conn = pool.acquire().await.unwrap();
        libraries::insert(&mut conn, &library).await.unwrap();
        drop(conn);
        (pool, library)
    }

    #[tokio::test]
    async fn test_insert_and_find_round_trips_fields() {
        let (pool, library) = setup().await;
        let mut conn = pool.acquire().await.unwrap();

        let mut volume = Volume::new(library.id, "Boxed Set", Media::Kindle);
        volume.isbn = Some("978-3-16-148410-0".to_string());
        volume.location = Some("Attic".to_string());
        volume.read = true;
        volume.notes = Some("signed copy".to_string());
        insert(&mut conn, &volume).await.unwrap();

        let found = find(&mut conn, volume.id).await.unwrap().unwrap();
        assert_eq!(found.media, Media::Kindle);
        assert!(found.read);
        assert_eq!(found.isbn.as_deref(), Some("978-3-16-148410-0"));
        assert_eq!(found.location.as_deref(), Some("Attic"));
        assert_eq!(found.notes.as_deref(), Some("signed copy"));
    }

    #[tokio::test]
    async fn test_update_allow_list() {
        let (pool, library) = setup().await;
        let mut conn = pool.acquire().await.unwrap();

        let mut volume = Volume::new(library.id, "First Edition", Media::Book);
        insert(&mut conn, &volume).await.unwrap();

        volume.media = Media::Returned;
        volume.read = true;
        assert_eq!(update(&mut conn, &volume).await.unwrap(), 1);

        let found = find(&mut conn, volume.id).await.unwrap().unwrap();
        assert_eq!(found.media, Media::Returned);
        assert!(found.read);
        assert_eq!(found.version, 2);
    }
}
