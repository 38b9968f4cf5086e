use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another process holds a lock on the database file
    #[error("The database is locked by another process. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// No pooled connection became free within the acquire timeout
    #[error("The database is busy. Please try again shortly.")]
    PoolTimedOut,

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[source] sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        Self::from_sqlx(err)
    }
}

impl DatabaseError {
    /// Classify a sqlx error, picking out lock contention and pool exhaustion
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::PoolTimedOut) {
            return DatabaseError::PoolTimedOut;
        }
        if is_lock_message(&err.to_string()) {
            return DatabaseError::InstanceLocked;
        }
        DatabaseError::Other(err)
    }

    /// True when retrying later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, DatabaseError::InstanceLocked | DatabaseError::PoolTimedOut)
    }

    /// True when the underlying failure is a UNIQUE constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::Other(err) => is_unique_violation(err),
            _ => false,
        }
    }
}

// SQLITE_BUSY (5), SQLITE_LOCKED (6), SQLITE_CANTOPEN (14)
pub(crate) fn is_lock_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("sqlite_busy")
        || message.contains("sqlite_locked")
        || message.contains("unable to open database file")
}

/// Returns true when `err` is SQLite reporting `UNIQUE constraint failed`.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

// ============================================================================
// Insertables
// ============================================================================

/// Podcast-level metadata extracted from a parsed feed, ready for insertion.
#[derive(Debug, Clone)]
pub struct NewPodcast {
    pub name: String,
    pub description: String,
    /// The feed URL as submitted; unique case-insensitively.
    pub link: String,
    pub image: Option<String>,
}

/// One episode extracted from a feed entry.
#[derive(Debug, Clone)]
pub struct NewEpisode {
    pub title: String,
    pub description: String,
    pub link: Option<String>,
    pub media_url: Option<String>,
    /// Normalized `%Y-%m-%d %H:%M:%S` UTC timestamp
    pub published: String,
}

/// Result of storing a new podcast and its episodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The podcast row was created.
    Created {
        podcast_id: i64,
        episodes: usize,
        /// Episodes rejected by the link/media uniqueness constraints
        skipped: usize,
    },
    /// A podcast with the same link (case-insensitively) already exists;
    /// nothing was written.
    LinkExists,
}

// ============================================================================
// Data Structures
// ============================================================================

/// Podcast row
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Podcast {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub link: String,
    pub image: Option<String>,
}

/// Podcast summary shown on the listing page.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PodcastSummary {
    pub name: String,
    pub image: Option<String>,
    pub description: String,
}

/// An episode joined with its owning podcast's display fields.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct EpisodeListing {
    pub podcast_name: String,
    pub podcast_link: String,
    pub podcast_image: Option<String>,
    pub title: String,
    pub description: String,
    pub link: Option<String>,
    pub media_url: Option<String>,
    pub published: String,
}

/// Episodes of one podcast, newest first.
#[derive(Debug, Clone)]
pub struct PodcastEpisodes {
    pub podcast: Podcast,
    pub episodes: Vec<EpisodeListing>,
}
