//! Join table primitives
//!
//! One `JoinTable` descriptor per many-to-many edge type. The descriptor
//! holds the table and column names; the service layer decides which side
//! of the pair is the parent and enforces the association invariants.

use shelfmark_core::{AppError, EntityKind};
use sqlx::SqliteConnection;

/// Descriptor for one many-to-many join table
#[derive(Debug, Clone, Copy)]
pub struct JoinTable {
    pub table: &'static str,
    pub left: EntityKind,
    pub left_col: &'static str,
    pub right: EntityKind,
    pub right_col: &'static str,
    /// Extra payload column (only `series_stories.ordinal`)
    pub ordinal_col: Option<&'static str>,
}

pub const AUTHOR_SERIES: JoinTable = JoinTable {
    table: "author_series",
    left: EntityKind::Author,
    left_col: "author_id",
    right: EntityKind::Series,
    right_col: "series_id",
    ordinal_col: None,
};

pub const AUTHOR_STORIES: JoinTable = JoinTable {
    table: "author_stories",
    left: EntityKind::Author,
    left_col: "author_id",
    right: EntityKind::Story,
    right_col: "story_id",
    ordinal_col: None,
};

pub const AUTHOR_VOLUMES: JoinTable = JoinTable {
    table: "author_volumes",
    left: EntityKind::Author,
    left_col: "author_id",
    right: EntityKind::Volume,
    right_col: "volume_id",
    ordinal_col: None,
};

pub const SERIES_STORIES: JoinTable = JoinTable {
    table: "series_stories",
    left: EntityKind::Series,
    left_col: "series_id",
    right: EntityKind::Story,
    right_col: "story_id",
    ordinal_col: Some("ordinal"),
};

pub const VOLUME_STORIES: JoinTable = JoinTable {
    table: "volume_stories",
    left: EntityKind::Volume,
    left_col: "volume_id",
    right: EntityKind::Story,
    right_col: "story_id",
    ordinal_col: None,
};

impl JoinTable {
    /// Counts association rows for the (left, right) pair
    pub async fn count(
        &self,
        conn: &mut SqliteConnection,
        left_id: &str,
        right_id: &str,
    ) -> Result<i64, AppError> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ? AND {} = ?",
            self.table, self.left_col, self.right_col
        );

        sqlx::query_scalar(&sql)
            .bind(left_id)
            .bind(right_id)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| AppError::database("Failed to count associations", e))
    }

    /// Inserts one association row; `ordinal` is only stored when the
    /// table carries an ordinal column
    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        left_id: &str,
        right_id: &str,
        ordinal: Option<i64>,
    ) -> Result<(), AppError> {
        let sql = match self.ordinal_col {
            Some(col) => format!(
                "INSERT INTO {} ({}, {}, {}) VALUES (?, ?, ?)",
                self.table, self.left_col, self.right_col, col
            ),
            None => format!(
                "INSERT INTO {} ({}, {}) VALUES (?, ?)",
                self.table, self.left_col, self.right_col
            ),
        };

        let mut q = sqlx::query(&sql).bind(left_id).bind(right_id);
        if self.ordinal_col.is_some() {
            q = q.bind(ordinal);
        }

        q.execute(&mut *conn)
            .await
            .map_err(|e| AppError::database("Failed to insert association", e))?;

        Ok(())
    }

    /// Deletes the association row for the pair, returning rows affected
    pub async fn delete(
        &self,
        conn: &mut SqliteConnection,
        left_id: &str,
        right_id: &str,
    ) -> Result<u64, AppError> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ? AND {} = ?",
            self.table, self.left_col, self.right_col
        );

        let result = sqlx::query(&sql)
            .bind(left_id)
            .bind(right_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::database("Failed to delete association", e))?;

        Ok(result.rows_affected())
    }
}

/// Entity table backing each kind
pub fn entity_table(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Library => "libraries",
        EntityKind::Author => "authors",
        EntityKind::Series => "series",
        EntityKind::Story => "stories",
        EntityKind::Volume => "volumes",
    }
}

/// Looks up which library an entity belongs to, failing NotFound if the
/// entity does not exist
pub async fn library_id_of(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    id: &str,
) -> Result<String, AppError> {
    if kind == EntityKind::Library {
        return Err(AppError::internal("Library has no owning library"));
    }

    let sql = format!("SELECT library_id FROM {} WHERE id = ?", entity_table(kind));

    let library_id: Option<String> = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::database("Failed to fetch owning library", e))?;

    library_id.ok_or_else(|| AppError::not_found(kind, id))
}
