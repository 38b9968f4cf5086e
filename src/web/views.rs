//! HTML pages.
//!
//! Every piece of user- or feed-supplied text passes through [`escape`]
//! before it reaches the page.

use std::fmt::Write;

use crate::storage::{EpisodeListing, PodcastSummary};
use crate::util::truncate_to_width;

use super::podcast_path;

/// Display width of description excerpts on listing pages.
const EXCERPT_WIDTH: usize = 280;

pub(crate) fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn layout(title: &str, notice: Option<&str>, body: &str) -> String {
    let mut page = String::with_capacity(body.len() + 512);
    let _ = write!(
        page,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} · podshelf</title>
</head>
<body>
<nav><a href="/">Latest</a> | <a href="/list/">Podcasts</a> | <a href="/add/">Add a podcast</a></nav>
"#,
        title = escape(title)
    );
    if let Some(notice) = notice {
        let _ = writeln!(page, r#"<p class="notice">{}</p>"#, escape(notice));
    }
    page.push_str(body);
    page.push_str("</body>\n</html>\n");
    page
}

/// Feed submission form, optionally with a message above it.
pub fn add_page(notice: Option<&str>, value: &str) -> String {
    let body = format!(
        r#"<h1>Add a podcast</h1>
<form method="post" action="/add/">
<label for="podcast">Feed link</label>
<input type="url" id="podcast" name="podcast" value="{}" required>
<button type="submit">Add</button>
</form>
"#,
        escape(value)
    );
    layout("Add a podcast", notice, &body)
}

pub fn podcasts_page(podcasts: &[PodcastSummary]) -> String {
    let mut body = String::from("<h1>Podcasts</h1>\n");
    if podcasts.is_empty() {
        body.push_str(r#"<p>No podcasts yet. <a href="/add/">Add one</a>.</p>"#);
        body.push('\n');
    }
    for podcast in podcasts {
        body.push_str("<article class=\"podcast\">\n");
        if let Some(image) = &podcast.image {
            let _ = writeln!(body, r#"<img src="{}" alt="" width="96">"#, escape(image));
        }
        let _ = writeln!(
            body,
            r#"<h2><a href="{}">{}</a></h2>"#,
            escape(&podcast_path(&podcast.name)),
            escape(&podcast.name)
        );
        let _ = writeln!(
            body,
            "<p>{}</p>",
            escape(&truncate_to_width(&podcast.description, EXCERPT_WIDTH))
        );
        body.push_str("</article>\n");
    }
    layout("Podcasts", None, &body)
}

/// Episode list; `heading` is the podcast name or "Latest episodes".
pub fn episodes_page(heading: &str, episodes: &[EpisodeListing]) -> String {
    let mut body = format!("<h1>{}</h1>\n", escape(heading));
    if episodes.is_empty() {
        body.push_str("<p>No episodes.</p>\n");
    }
    for episode in episodes {
        body.push_str("<article class=\"episode\">\n");
        if let Some(image) = &episode.podcast_image {
            let _ = writeln!(body, r#"<img src="{}" alt="" width="64">"#, escape(image));
        }
        let _ = writeln!(
            body,
            r#"<p class="podcast"><a href="{}">{}</a></p>"#,
            escape(&podcast_path(&episode.podcast_name)),
            escape(&episode.podcast_name)
        );
        match &episode.link {
            Some(link) => {
                let _ = writeln!(
                    body,
                    r#"<h2><a href="{}">{}</a></h2>"#,
                    escape(link),
                    escape(&episode.title)
                );
            }
            None => {
                let _ = writeln!(body, "<h2>{}</h2>", escape(&episode.title));
            }
        }
        let _ = writeln!(
            body,
            r#"<p><time>{}</time> {}</p>"#,
            escape(&episode.published),
            escape(&truncate_to_width(&episode.description, EXCERPT_WIDTH))
        );
        if let Some(media) = &episode.media_url {
            let _ = writeln!(
                body,
                r#"<audio controls preload="none" src="{}"></audio>"#,
                escape(media)
            );
        }
        body.push_str("</article>\n");
    }
    layout(heading, None, &body)
}
