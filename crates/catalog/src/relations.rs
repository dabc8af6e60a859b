//! Relationship integrity
//!
//! All five many-to-many edges go through `associate` / `dissociate`, which
//! enforce the shared rules: both endpoints must exist, both must belong to
//! the same library, and the pair must not (or must) already be linked.
//! Callers pass the parent/child orientation of the request; the join
//! table's own column order is resolved here.

use shelfmark_core::{AppError, EntityKind, Result};
use shelfmark_database::queries::joins::{self, JoinTable};
use sqlx::SqliteConnection;

pub(crate) struct Edge<'a> {
    pub join: &'static JoinTable,
    pub parent: EntityKind,
    pub parent_id: &'a str,
    pub child: EntityKind,
    pub child_id: &'a str,
}

impl<'a> Edge<'a> {
    /// Resolves the request's parent/child orientation onto the join
    /// table's (left, right) column order
    fn pair(&self) -> Result<(&'a str, &'a str)> {
        if self.parent == self.join.left && self.child == self.join.right {
            Ok((self.parent_id, self.child_id))
        } else if self.parent == self.join.right && self.child == self.join.left {
            Ok((self.child_id, self.parent_id))
        } else {
            Err(AppError::internal(format!(
                "{}/{} does not match join table {}",
                self.parent, self.child, self.join.table
            )))
        }
    }

    /// Checks existence of both endpoints and that they share a library
    async fn check_same_library(&self, conn: &mut SqliteConnection) -> Result<()> {
        let parent_library = joins::library_id_of(conn, self.parent, self.parent_id).await?;
        let child_library = joins::library_id_of(conn, self.child, self.child_id).await?;

        if parent_library != child_library {
            return Err(AppError::bad_request(format!(
                "{} {} belongs to Library {} but {} {} belongs to Library {}",
                self.child,
                self.child_id,
                child_library,
                self.parent,
                self.parent_id,
                parent_library
            )));
        }
        Ok(())
    }
}

/// Creates the association, failing DuplicateAssociation when the pair is
/// already linked
pub(crate) async fn associate(
    conn: &mut SqliteConnection,
    edge: Edge<'_>,
    ordinal: Option<i64>,
) -> Result<()> {
    edge.check_same_library(conn).await?;

    let (left_id, right_id) = edge.pair()?;
    if edge.join.count(conn, left_id, right_id).await? > 0 {
        return Err(AppError::DuplicateAssociation {
            parent: edge.parent.to_string(),
            parent_id: edge.parent_id.to_string(),
            child: edge.child.to_string(),
            child_id: edge.child_id.to_string(),
        });
    }

    edge.join.insert(conn, left_id, right_id, ordinal).await?;
    log::debug!(
        "Associated {} {} with {} {}",
        edge.child,
        edge.child_id,
        edge.parent,
        edge.parent_id
    );
    Ok(())
}

/// Removes the association, failing BadRequest when the pair is not linked
pub(crate) async fn dissociate(conn: &mut SqliteConnection, edge: Edge<'_>) -> Result<()> {
    edge.check_same_library(conn).await?;

    let (left_id, right_id) = edge.pair()?;
    if edge.join.count(conn, left_id, right_id).await? == 0 {
        return Err(AppError::bad_request(format!(
            "{} {} is not associated with {} {}",
            edge.child, edge.child_id, edge.parent, edge.parent_id
        )));
    }

    edge.join.delete(conn, left_id, right_id).await?;
    Ok(())
}
