//! Registering a podcast by feed link.
//!
//! Ingest is idempotent per link: a link already stored (compared without
//! regard to case) resolves to the stored podcast without touching the
//! network, and the UNIQUE constraint on `podcasts.link` settles races
//! between concurrent submissions of the same link.
//!
//! No pooled connection is held while the feed downloads: one is taken for
//! the lookup and released, and a fresh one is taken for the insert.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::feed::{FeedClient, FetchError, ParsedEntry, ParsedFeed};
use crate::storage::{Database, DatabaseError, InsertOutcome, NewEpisode, NewPodcast};
use crate::util::strip_markup;

/// Format of `podcast_episodes.published`. Sorts lexicographically.
pub const PUBLISHED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("No feed link was given")]
    EmptyLink,

    /// The feed parsed but has no entries; nothing was stored.
    #[error("There's no content for '{link}'!")]
    NoContent { link: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The link was already registered; nothing was fetched or written.
    AlreadyStored { name: String },
    /// A new podcast was stored with `episodes` episodes.
    Created {
        name: String,
        episodes: usize,
        skipped: usize,
    },
}

impl IngestOutcome {
    /// Name of the podcast the link resolved to.
    pub fn name(&self) -> &str {
        match self {
            IngestOutcome::AlreadyStored { name } | IngestOutcome::Created { name, .. } => name,
        }
    }
}

/// Register the feed at `link`, using the current time for undated entries.
pub async fn add_podcast(
    db: &Database,
    client: &FeedClient,
    link: &str,
) -> Result<IngestOutcome, IngestError> {
    add_podcast_at(db, client, link, Utc::now()).await
}

/// Like [`add_podcast`], with `now` standing in for the ingest time.
pub async fn add_podcast_at(
    db: &Database,
    client: &FeedClient,
    link: &str,
    now: DateTime<Utc>,
) -> Result<IngestOutcome, IngestError> {
    let link = link.trim();
    if link.is_empty() {
        return Err(IngestError::EmptyLink);
    }

    let existing = db.connect().await?.find_podcast_by_link(link).await?;
    if let Some(existing) = existing {
        tracing::info!(link = %link, name = %existing.name, "Podcast already registered");
        return Ok(IngestOutcome::AlreadyStored {
            name: existing.name,
        });
    }

    tracing::info!(link = %link, "Fetching new feed");
    let feed = client.fetch(link).await?;

    if feed.entries.is_empty() {
        tracing::info!(link = %link, "Feed has no entries, nothing stored");
        return Err(IngestError::NoContent {
            link: link.to_string(),
        });
    }

    let podcast = build_podcast(link, &feed);
    let episodes: Vec<NewEpisode> = feed
        .entries
        .iter()
        .map(|entry| build_episode(entry, now))
        .collect();

    let mut conn = db.connect().await?;
    match conn.insert_podcast(&podcast, &episodes).await? {
        InsertOutcome::Created {
            podcast_id,
            episodes,
            skipped,
        } => {
            tracing::info!(
                podcast_id = podcast_id,
                name = %podcast.name,
                episodes = episodes,
                skipped = skipped,
                "Podcast stored"
            );
            Ok(IngestOutcome::Created {
                name: podcast.name,
                episodes,
                skipped,
            })
        }
        InsertOutcome::LinkExists => {
            // Lost a race with a concurrent submission of the same link
            let name = conn
                .find_podcast_by_link(link)
                .await?
                .map(|p| p.name)
                .unwrap_or(podcast.name);
            Ok(IngestOutcome::AlreadyStored { name })
        }
    }
}

/// Podcast row for a freshly parsed feed registered under `link`.
pub fn build_podcast(link: &str, feed: &ParsedFeed) -> NewPodcast {
    let name = feed
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(link)
        .to_string();

    NewPodcast {
        name,
        description: feed.summary.as_deref().map(strip_markup).unwrap_or_default(),
        link: link.to_string(),
        image: feed.image.clone(),
    }
}

/// Episode row for one entry; undated entries are stamped with `now`.
pub fn build_episode(entry: &ParsedEntry, now: DateTime<Utc>) -> NewEpisode {
    let title = entry
        .title
        .as_deref()
        .map(strip_markup)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());

    NewEpisode {
        title,
        description: entry.summary.as_deref().map(strip_markup).unwrap_or_default(),
        link: entry.link.clone(),
        media_url: entry.media_url.clone(),
        published: entry
            .published
            .unwrap_or(now)
            .format(PUBLISHED_FORMAT)
            .to_string(),
    }
}
