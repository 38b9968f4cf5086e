//! Feed retrieval and parsing.
//!
//! - [`parser`] - turns RSS/Atom bytes into a [`ParsedFeed`] using `feed-rs`
//! - [`fetcher`] - HTTP retrieval with URL validation, retry and size limits
//!
//! # Example
//!
//! ```ignore
//! use podshelf::config::FetchConfig;
//! use podshelf::feed::FeedClient;
//!
//! let client = FeedClient::new(FetchConfig::default())?;
//! let feed = client.fetch("https://example.com/podcast.rss").await?;
//! println!("{} entries", feed.entries.len());
//! ```

mod fetcher;
mod parser;

pub use fetcher::{FeedClient, FetchError};
pub use parser::{parse_feed, ParsedEntry, ParsedFeed};
