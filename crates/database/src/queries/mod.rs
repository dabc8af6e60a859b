//! Query modules for each entity kind plus the join-table primitives.
//!
//! Every query function takes `&mut SqliteConnection` rather than a pool so
//! the service layer can run a whole validate-then-write sequence inside a
//! single transaction.

pub mod authors;
pub mod joins;
pub mod libraries;
pub mod series;
pub mod stories;
pub mod volumes;

pub(crate) type SqliteQuery<'q> = sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>;

/// Offset/limit window applied to a listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Page {
    /// SQL fragment for this window; SQLite needs `LIMIT -1` to express
    /// an offset without a limit.
    pub(crate) fn sql(&self) -> &'static str {
        match (self.limit, self.offset) {
            (Some(_), Some(_)) => " LIMIT ? OFFSET ?",
            (Some(_), None) => " LIMIT ?",
            (None, Some(_)) => " LIMIT -1 OFFSET ?",
            (None, None) => "",
        }
    }

    pub(crate) fn bind<'q>(&self, mut q: SqliteQuery<'q>) -> SqliteQuery<'q> {
        if let Some(limit) = self.limit {
            q = q.bind(limit);
        }
        if let Some(offset) = self.offset {
            q = q.bind(offset);
        }
        q
    }
}

/// Name match applied to Library/Series/Story/Volume listings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NameFilter {
    /// No filtering
    #[default]
    Any,
    /// Exact name match
    Exact(String),
    /// Case-insensitive substring match
    Contains(String),
}

impl NameFilter {
    /// SQL fragment; `column` is the (possibly alias-qualified) name column
    pub(crate) fn sql(&self, column: &str) -> String {
        match self {
            Self::Any => String::new(),
            Self::Exact(_) => format!(" AND {} = ?", column),
            Self::Contains(_) => format!(" AND {} LIKE ? COLLATE NOCASE", column),
        }
    }

    pub(crate) fn bind<'q>(&'q self, q: SqliteQuery<'q>) -> SqliteQuery<'q> {
        match self {
            Self::Any => q,
            Self::Exact(name) => q.bind(name.as_str()),
            Self::Contains(name) => q.bind(format!("%{}%", name)),
        }
    }
}

/// Name match applied to Author listings; authors match on the
/// (first_name, last_name) pair instead of a single name column
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthorFilter {
    /// No filtering
    #[default]
    Any,
    /// Exact match on both name parts
    Exact {
        first_name: String,
        last_name: String,
    },
    /// Case-insensitive substring match on first OR last name
    Contains(String),
}

impl AuthorFilter {
    /// SQL fragment; `prefix` is the table alias including the trailing dot,
    /// or empty for unqualified columns
    pub(crate) fn sql(&self, prefix: &str) -> String {
        match self {
            Self::Any => String::new(),
            Self::Exact { .. } => {
                format!(" AND {p}first_name = ? AND {p}last_name = ?", p = prefix)
            }
            Self::Contains(_) => format!(
                " AND ({p}first_name LIKE ? COLLATE NOCASE OR {p}last_name LIKE ? COLLATE NOCASE)",
                p = prefix
            ),
        }
    }

    pub(crate) fn bind<'q>(&'q self, q: SqliteQuery<'q>) -> SqliteQuery<'q> {
        match self {
            Self::Any => q,
            Self::Exact {
                first_name,
                last_name,
            } => q.bind(first_name.as_str()).bind(last_name.as_str()),
            Self::Contains(name) => {
                let pattern = format!("%{}%", name);
                q.bind(pattern.clone()).bind(pattern)
            }
        }
    }
}

/// Qualifies a comma-separated column list with a table alias
pub(crate) fn qualify(columns: &str, alias: &str) -> String {
    columns
        .split(", ")
        .map(|c| format!("{}.{}", alias, c))
        .collect::<Vec<_>>()
        .join(", ")
}
