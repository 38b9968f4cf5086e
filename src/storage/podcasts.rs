use super::schema::Connection;
use super::types::{
    is_unique_violation, DatabaseError, InsertOutcome, NewEpisode, NewPodcast, Podcast,
    PodcastSummary,
};
use super::LISTING_LIMIT;

impl Connection {
    // ========================================================================
    // Podcast Lookups
    // ========================================================================

    /// Find a podcast by feed link, ignoring ASCII case.
    pub async fn find_podcast_by_link(
        &mut self,
        link: &str,
    ) -> Result<Option<Podcast>, DatabaseError> {
        let podcast = sqlx::query_as::<_, Podcast>(
            "SELECT id, name, description, link, image FROM podcasts WHERE link = ? COLLATE NOCASE",
        )
        .bind(link)
        .fetch_optional(&mut *self.inner)
        .await?;
        Ok(podcast)
    }

    /// Find a podcast by exact name, ignoring ASCII case.
    ///
    /// Names are not unique; the earliest registered match wins.
    pub async fn find_podcast_by_name(
        &mut self,
        name: &str,
    ) -> Result<Option<Podcast>, DatabaseError> {
        let podcast = sqlx::query_as::<_, Podcast>(
            r#"
            SELECT id, name, description, link, image
            FROM podcasts
            WHERE name = ? COLLATE NOCASE
            ORDER BY id
            LIMIT 1
        "#,
        )
        .bind(name)
        .fetch_optional(&mut *self.inner)
        .await?;
        Ok(podcast)
    }

    /// Up to [`LISTING_LIMIT`] podcasts in storage order.
    pub async fn list_podcasts(&mut self) -> Result<Vec<PodcastSummary>, DatabaseError> {
        let podcasts = sqlx::query_as::<_, PodcastSummary>(
            "SELECT name, image, description FROM podcasts LIMIT ?",
        )
        .bind(LISTING_LIMIT)
        .fetch_all(&mut *self.inner)
        .await?;
        Ok(podcasts)
    }

    // ========================================================================
    // Podcast Insertion
    // ========================================================================

    /// Store a podcast and all of its episodes in one transaction.
    ///
    /// A UNIQUE violation on the podcast link rolls everything back and
    /// yields [`InsertOutcome::LinkExists`]. A UNIQUE violation on an episode
    /// (link or media URL already stored) skips that episode only; SQLite
    /// aborts the failing statement and the transaction stays usable.
    pub async fn insert_podcast(
        &mut self,
        podcast: &NewPodcast,
        episodes: &[NewEpisode],
    ) -> Result<InsertOutcome, DatabaseError> {
        let mut tx = sqlx::Connection::begin(&mut *self.inner).await?;

        let inserted = sqlx::query(
            "INSERT INTO podcasts (name, description, link, image) VALUES (?, ?, ?, ?)",
        )
        .bind(&podcast.name)
        .bind(&podcast.description)
        .bind(&podcast.link)
        .bind(&podcast.image)
        .execute(&mut *tx)
        .await;

        let podcast_id = match inserted {
            Ok(result) => result.last_insert_rowid(),
            Err(e) if is_unique_violation(&e) => {
                tracing::info!(link = %podcast.link, "Podcast link already stored, nothing to insert");
                tx.rollback().await?;
                return Ok(InsertOutcome::LinkExists);
            }
            Err(e) => return Err(e.into()),
        };

        let mut stored = 0;
        let mut skipped = 0;

        for episode in episodes {
            let result = sqlx::query(
                r#"
                INSERT INTO podcast_episodes (podcast, title, description, link, mp3, published)
                VALUES (?, ?, ?, ?, ?, ?)
            "#,
            )
            .bind(podcast_id)
            .bind(&episode.title)
            .bind(&episode.description)
            .bind(&episode.link)
            .bind(&episode.media_url)
            .bind(&episode.published)
            .execute(&mut *tx)
            .await;

            match result {
                Ok(_) => stored += 1,
                Err(e) if is_unique_violation(&e) => {
                    tracing::warn!(
                        podcast_id = podcast_id,
                        title = %episode.title,
                        link = ?episode.link,
                        "Episode link or media URL already stored, skipping"
                    );
                    skipped += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        tx.commit().await?;

        Ok(InsertOutcome::Created {
            podcast_id,
            episodes: stored,
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{Database, InsertOutcome, NewEpisode, NewPodcast};
    use pretty_assertions::assert_eq;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    fn test_podcast(link: &str) -> NewPodcast {
        NewPodcast {
            name: "Test Cast".to_string(),
            description: "A show about tests".to_string(),
            link: link.to_string(),
            image: Some("https://example.com/cover.png".to_string()),
        }
    }

    fn test_episode(n: usize) -> NewEpisode {
        NewEpisode {
            title: format!("Episode {}", n),
            description: "Notes".to_string(),
            link: Some(format!("https://example.com/ep/{}", n)),
            media_url: Some(format!("https://cdn.example.com/ep{}.mp3", n)),
            published: format!("2024-01-{:02} 10:00:00", n + 1),
        }
    }

    #[tokio::test]
    async fn test_insert_podcast_with_episodes() {
        let db = test_db().await;
        let mut conn = db.connect().await.unwrap();

        let episodes: Vec<_> = (0..3).map(test_episode).collect();
        let outcome = conn
            .insert_podcast(&test_podcast("https://example.com/rss"), &episodes)
            .await
            .unwrap();

        match outcome {
            InsertOutcome::Created {
                podcast_id,
                episodes,
                skipped,
            } => {
                assert!(podcast_id > 0);
                assert_eq!(episodes, 3);
                assert_eq!(skipped, 0);
            }
            other => panic!("Expected Created, got {:?}", other),
        }

        let podcast = conn
            .find_podcast_by_link("https://example.com/rss")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(podcast.name, "Test Cast");
        assert_eq!(
            podcast.image.as_deref(),
            Some("https://example.com/cover.png")
        );
    }

    #[tokio::test]
    async fn test_find_by_link_ignores_case() {
        let db = test_db().await;
        let mut conn = db.connect().await.unwrap();
        conn.insert_podcast(&test_podcast("http://foo.com/rss"), &[])
            .await
            .unwrap();

        let found = conn.find_podcast_by_link("HTTP://Foo.com/rss").await.unwrap();
        assert_eq!(found.map(|p| p.link), Some("http://foo.com/rss".to_string()));
    }

    #[tokio::test]
    async fn test_duplicate_link_differing_case_is_link_exists() {
        let db = test_db().await;
        let mut conn = db.connect().await.unwrap();
        conn.insert_podcast(&test_podcast("http://foo.com/rss"), &[test_episode(1)])
            .await
            .unwrap();

        let outcome = conn
            .insert_podcast(&test_podcast("HTTP://FOO.COM/rss"), &[test_episode(2)])
            .await
            .unwrap();
        assert_eq!(outcome, InsertOutcome::LinkExists);

        // The rolled-back attempt left nothing behind
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM podcast_episodes")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
        assert_eq!(conn.list_podcasts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_colliding_episode_is_skipped() {
        let db = test_db().await;
        let mut conn = db.connect().await.unwrap();
        conn.insert_podcast(&test_podcast("https://one.example.com/rss"), &[test_episode(1)])
            .await
            .unwrap();

        let episodes = vec![test_episode(1), test_episode(2)];
        let outcome = conn
            .insert_podcast(&test_podcast("https://two.example.com/rss"), &episodes)
            .await
            .unwrap();

        match outcome {
            InsertOutcome::Created {
                episodes, skipped, ..
            } => {
                assert_eq!(episodes, 1);
                assert_eq!(skipped, 1);
            }
            other => panic!("Expected Created, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_episodes_without_media_do_not_collide() {
        let db = test_db().await;
        let mut conn = db.connect().await.unwrap();

        let episodes: Vec<_> = (0..2)
            .map(|n| NewEpisode {
                media_url: None,
                ..test_episode(n)
            })
            .collect();
        let outcome = conn
            .insert_podcast(&test_podcast("https://example.com/rss"), &episodes)
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            InsertOutcome::Created {
                episodes: 2,
                skipped: 0,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_find_by_name_ignores_case() {
        let db = test_db().await;
        let mut conn = db.connect().await.unwrap();
        conn.insert_podcast(&test_podcast("https://example.com/rss"), &[])
            .await
            .unwrap();

        assert!(conn.find_podcast_by_name("test cast").await.unwrap().is_some());
        assert!(conn.find_podcast_by_name("Test").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_podcasts_capped() {
        let db = test_db().await;
        let mut conn = db.connect().await.unwrap();
        for n in 0..12 {
            conn.insert_podcast(&test_podcast(&format!("https://example.com/{}/rss", n)), &[])
                .await
                .unwrap();
        }

        let podcasts = conn.list_podcasts().await.unwrap();
        assert_eq!(podcasts.len(), 10);
        assert_eq!(podcasts[0].description, "A show about tests");
    }
}
