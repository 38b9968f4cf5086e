use super::schema::Connection;
use super::types::{DatabaseError, EpisodeListing, PodcastEpisodes};
use super::LISTING_LIMIT;

impl Connection {
    /// Most recently published episodes across all podcasts.
    pub async fn latest_episodes(&mut self) -> Result<Vec<EpisodeListing>, DatabaseError> {
        let episodes = sqlx::query_as::<_, EpisodeListing>(
            r#"
            SELECT
                pod.name AS podcast_name, pod.link AS podcast_link, pod.image AS podcast_image,
                epi.title, epi.description, epi.link, epi.mp3 AS media_url, epi.published
            FROM podcast_episodes AS epi
            JOIN podcasts AS pod ON epi.podcast = pod.id
            ORDER BY epi.published DESC
            LIMIT ?
        "#,
        )
        .bind(LISTING_LIMIT)
        .fetch_all(&mut *self.inner)
        .await?;
        Ok(episodes)
    }

    /// Newest episodes of the podcast named `name` (case-insensitive).
    ///
    /// Returns `Ok(None)` when no podcast has that name.
    pub async fn episodes_for_podcast(
        &mut self,
        name: &str,
    ) -> Result<Option<PodcastEpisodes>, DatabaseError> {
        let Some(podcast) = self.find_podcast_by_name(name).await? else {
            return Ok(None);
        };

        let episodes = sqlx::query_as::<_, EpisodeListing>(
            r#"
            SELECT
                ? AS podcast_name, ? AS podcast_link, ? AS podcast_image,
                title, description, link, mp3 AS media_url, published
            FROM podcast_episodes
            WHERE podcast = ?
            ORDER BY published DESC
            LIMIT ?
        "#,
        )
        .bind(&podcast.name)
        .bind(&podcast.link)
        .bind(&podcast.image)
        .bind(podcast.id)
        .bind(LISTING_LIMIT)
        .fetch_all(&mut *self.inner)
        .await?;

        Ok(Some(PodcastEpisodes { podcast, episodes }))
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{Database, NewEpisode, NewPodcast};
    use pretty_assertions::assert_eq;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    fn podcast(name: &str) -> NewPodcast {
        NewPodcast {
            name: name.to_string(),
            description: String::new(),
            link: format!("https://{}.example.com/rss", name.to_lowercase()),
            image: None,
        }
    }

    fn episode(show: &str, day: u32) -> NewEpisode {
        NewEpisode {
            title: format!("{} day {}", show, day),
            description: String::new(),
            link: Some(format!("https://example.com/{}/{}", show, day)),
            media_url: None,
            published: format!("2024-03-{:02} 08:30:00", day),
        }
    }

    #[tokio::test]
    async fn test_episodes_for_podcast_newest_first_and_capped() {
        let db = test_db().await;
        let mut conn = db.connect().await.unwrap();

        // Insert out of order to make sure ordering comes from the query
        let days = [5, 1, 12, 3, 9, 7, 11, 2, 10, 4, 8, 6];
        let episodes: Vec<_> = days.iter().map(|d| episode("alpha", *d)).collect();
        conn.insert_podcast(&podcast("Alpha"), &episodes)
            .await
            .unwrap();

        let listing = conn.episodes_for_podcast("ALPHA").await.unwrap().unwrap();
        assert_eq!(listing.podcast.name, "Alpha");
        assert_eq!(listing.episodes.len(), 10);

        let published: Vec<_> = listing
            .episodes
            .iter()
            .map(|e| e.published.as_str())
            .collect();
        let mut sorted = published.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(published, sorted);
        assert_eq!(published[0], "2024-03-12 08:30:00");
        assert_eq!(published[9], "2024-03-03 08:30:00");

        assert!(listing
            .episodes
            .iter()
            .all(|e| e.podcast_link == "https://alpha.example.com/rss"));
    }

    #[tokio::test]
    async fn test_episodes_for_unknown_podcast() {
        let db = test_db().await;
        let mut conn = db.connect().await.unwrap();
        assert!(conn.episodes_for_podcast("Nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_episodes_across_podcasts() {
        let db = test_db().await;
        let mut conn = db.connect().await.unwrap();

        conn.insert_podcast(&podcast("Alpha"), &[episode("alpha", 1), episode("alpha", 4)])
            .await
            .unwrap();
        conn.insert_podcast(&podcast("Beta"), &[episode("beta", 3), episode("beta", 2)])
            .await
            .unwrap();

        let latest = conn.latest_episodes().await.unwrap();
        let titles: Vec<_> = latest.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["alpha day 4", "beta day 3", "beta day 2", "alpha day 1"]
        );
        assert_eq!(latest[1].podcast_name, "Beta");
    }
}
