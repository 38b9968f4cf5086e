mod episodes;
mod podcasts;
mod schema;
mod types;

pub use schema::{Connection, Database};
pub use types::{
    DatabaseError, EpisodeListing, InsertOutcome, NewEpisode, NewPodcast, Podcast,
    PodcastEpisodes, PodcastSummary,
};

/// Maximum rows returned by any listing query.
pub const LISTING_LIMIT: i64 = 10;
