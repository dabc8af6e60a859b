//! Story database operations

use crate::queries::{qualify, NameFilter, Page};
use shelfmark_core::{AppError, AuthorId, LibraryId, SeriesId, Story, StoryId, Timestamp, VolumeId};
use sqlx::sqlite::SqliteRow;
use sqlx::SqliteConnection;

const COLUMNS: &str = "id, library_id, name, notes, version, created_at, updated_at";

/// Creates a new story row
pub async fn insert(conn: &mut SqliteConnection, story: &Story) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO stories (id, library_id, name, notes, version, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(story.id.as_string())
    .bind(story.library_id.as_string())
    .bind(&story.name)
    .bind(&story.notes)
    .bind(story.version)
    .bind(story.created_at.as_millis())
    .bind(story.updated_at.as_millis())
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::database("Failed to create story", e))?;

    Ok(())
}

/// Gets a story by ID
pub async fn find(conn: &mut SqliteConnection, id: StoryId) -> Result<Option<Story>, AppError> {
    let sql = format!("SELECT {} FROM stories WHERE id = ?", COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.as_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to fetch story", e))?;

    row.map(row_to_story).transpose()
}

/// Updates the allow-listed story columns, bumping version and updated_at.
/// Returns the number of rows matched.
pub async fn update(conn: &mut SqliteConnection, story: &Story) -> Result<u64, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE stories
        SET name = ?, notes = ?, version = version + 1, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&story.name)
    .bind(&story.notes)
    .bind(Timestamp::now().as_millis())
    .bind(story.id.as_string())
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::database("Failed to update story", e))?;

    Ok(result.rows_affected())
}

/// Deletes a story by ID, returning the number of rows affected
pub async fn delete(conn: &mut SqliteConnection, id: StoryId) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM stories WHERE id = ?")
        .bind(id.as_string())
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to delete story", e))?;

    Ok(result.rows_affected())
}

/// Lists stories in canonical order (library, name), optionally scoped to
/// one library
pub async fn list(
    conn: &mut SqliteConnection,
    scope: Option<LibraryId>,
    filter: &NameFilter,
    page: &Page,
) -> Result<Vec<Story>, AppError> {
    let mut sql = format!("SELECT {} FROM stories WHERE 1 = 1", COLUMNS);
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
        .map_err(|e| AppError::database("Failed to list stories", e))?;

    rows.into_iter().map(row_to_story).collect()
}

/// Lists stories associated with an author
pub async fn list_for_author(
    conn: &mut SqliteConnection,
    author_id: AuthorId,
    filter: &NameFilter,
    page: &Page,
) -> Result<Vec<Story>, AppError> {
    list_joined(conn, "author_stories", "author_id", author_id.as_string(), filter, page).await
}

/// Lists stories associated with a series
pub async fn list_for_series(
    conn: &mut SqliteConnection,
    series_id: SeriesId,
    filter: &NameFilter,
    page: &Page,
) -> Result<Vec<Story>, AppError> {
    list_joined(conn, "series_stories", "series_id", series_id.as_string(), filter, page).await
}

/// Lists stories associated with a volume
pub async fn list_for_volume(
    conn: &mut SqliteConnection,
    volume_id: VolumeId,
    filter: &NameFilter,
    page: &Page,
) -> Result<Vec<Story>, AppError> {
    list_joined(conn, "volume_stories", "volume_id", volume_id.as_string(), filter, page).await
}

async fn list_joined(
    conn: &mut SqliteConnection,
    join_table: &str,
    join_col: &str,
    parent_id: String,
    filter: &NameFilter,
    page: &Page,
) -> Result<Vec<Story>, AppError> {
    let mut sql = format!(
        "SELECT {} FROM stories t JOIN {} j ON t.id = j.story_id WHERE j.{} = ?",
        qualify(COLUMNS, "t"),
        join_table,
        join_col,
    );
    sql.push_str(&filter.sql("t.name"));
    sql.push_str(" ORDER BY t.library_id, t.name");
    sql.push_str(page.sql());

    let mut q = sqlx::query(&sql).bind(parent_id);
    q = filter.bind(q);
    q = page.bind(q);

    let rows = q
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to list associated stories", e))?;

    rows.into_iter().map(row_to_story).collect()
}

/// Counts stories in a library with the given name, excluding one id when
/// updating
pub async fn count_name_conflicts(
    conn: &mut SqliteConnection,
    library_id: LibraryId,
    name: &str,
    exclude: Option<StoryId>,
) -> Result<i64, AppError> {
    let (sql, excluded) = match exclude {
        Some(id) => (
            "SELECT COUNT(*) FROM stories WHERE library_id = ? AND name = ? AND id <> ?",
            Some(id.as_string()),
        ),
        None => (
            "SELECT COUNT(*) FROM stories WHERE library_id = ? AND name = ?",
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
        .map_err(|e| AppError::database("Failed to count story names", e))
}

/// Converts a database row to a Story
pub(crate) fn row_to_story(row: SqliteRow) -> Result<Story, AppError> {
    use sqlx::Row;

    let id_str: String = row
        .try_get("id")
        .map_err(|e| AppError::database("Missing story ID", e))?;
    let id = StoryId::from_string(&id_str).map_err(|e| AppError::database("Invalid story ID", e))?;

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

    Ok(Story {
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
        series: None,
        volumes: None,
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
    async fn test_insert_and_list_scoped() {
        let (pool, library) = setup().await;
        let mut conn = pool.acquire().await.unwrap();

        let other = Library::new("Other Library");
        libraries::insert(&mut conn, &other).await.unwrap();

        insert(&mut conn, &Story::new(library.id, "Mine")).await.unwrap();
        insert(&mut conn, &Story::new(other.id, "Theirs")).await.unwrap();

        let scoped = list(
            &mut conn,
            Some(library.id),
            &NameFilter::Any,
            &Page::default(),
        )
        .await
        .unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].name, "Mine");
    }

    #[tokio::test]
    async fn test_update_zero_rows_for_missing() {
        let (pool, library) = setup().await;
        let mut conn = pool.acquire().await.unwrap();

        let story = Story::new(library.id, "Never Inserted");
        assert_eq!(update(&mut conn, &story).await.unwrap(), 0);
    }
}
