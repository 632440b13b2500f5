use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use std::env;
use tracing::warn;

use crate::collectors::{get_json, SourceCollector};
use crate::error::CollectorError;
use crate::{age_hours, now_ms, RawCandidate, Speed, Stage};

const TOP_STORIES: usize = 15;

#[derive(Clone)]
pub struct HackerNewsCollector {
    client: reqwest::Client,
    api_base: String,
}

impl HackerNewsCollector {
    pub fn new(client: reqwest::Client) -> Self {
        let api_base = env::var("HACKERNEWS_API_BASE")
            .unwrap_or_else(|_| "https://hacker-news.firebaseio.com/v0".to_string());
        Self { client, api_base }
    }

    async fn item(&self, id: u64) -> Result<Story, CollectorError> {
        let request = self.client.get(format!(
            "{}/item/{}.json",
            self.api_base.trim_end_matches('/'),
            id
        ));
        get_json(request).await
    }
}

#[async_trait]
impl SourceCollector for HackerNewsCollector {
    fn name(&self) -> &str {
        "hackernews"
    }

    async fn collect(&self) -> Result<Vec<RawCandidate>, CollectorError> {
        let request = self.client.get(format!(
            "{}/topstories.json",
            self.api_base.trim_end_matches('/')
        ));
        let top_ids: Vec<u64> = get_json(request).await?;

        let stories = join_all(
            top_ids
                .iter()
                .take(TOP_STORIES)
                .map(|id| self.item(*id)),
        )
        .await;

        let now = now_ms();
        Ok(stories
            .into_iter()
            .enumerate()
            .filter_map(|(index, story)| match story {
                Ok(story) => story_to_candidate(index, &story, now),
                Err(err) => {
                    warn!("HackerNews item fetch failed - index={}, error={}", index, err);
                    None
                }
            })
            .collect())
    }
}

fn story_to_candidate(index: usize, story: &Story, now: i64) -> Option<RawCandidate> {
    let title = story.title.clone()?;
    let score = story.score;
    let comments = story.descendants;
    let published_at = story.time as i64 * 1000;
    let age = age_hours(now, published_at);

    let speed = Speed::from_volume(score, 200, 500);

    let mut prediction: u8 = if score > 500 {
        85
    } else if score > 300 {
        78
    } else if score > 200 {
        72
    } else {
        65
    };
    if age < 2.0 {
        prediction += 10;
    }

    let mut candidate = RawCandidate::new(title, speed);
    candidate.id = Some(format!("hn-{}", index));
    candidate.trigger = Some(format!(
        "HackerNews • {} points • {} comments",
        score, comments
    ));
    candidate.stage = Some(Stage::from_age_hours(age));
    candidate.published_at = Some(published_at);
    candidate.geo = Some("Global".to_string());
    candidate.driver = Some("Tech community".to_string());
    candidate.priority = Some(score > 300 && age < 6.0);
    candidate.analysis = Some(format!(
        "Tech community discussion. {} comments in {}h.",
        comments,
        age.max(0.0).floor() as i64
    ));
    candidate.prediction = Some(prediction.min(95));
    candidate.is_new = Some(age < 1.0);
    candidate.metrics.source = Some("HackerNews".to_string());
    candidate.metrics.volume = Some(score);
    candidate.metrics.comments = Some(comments);
    candidate.metrics.url = Some(
        story
            .url
            .clone()
            .unwrap_or_else(|| format!("https://news.ycombinator.com/item?id={}", story.id)),
    );
    Some(candidate)
}

#[derive(Deserialize)]
struct Story {
    id: u64,
    title: Option<String>,
    url: Option<String>,
    #[serde(default)]
    score: u64,
    #[serde(default)]
    descendants: u64,
    #[serde(default)]
    time: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_hn_story_links_to_item_page() {
        let story = Story {
            id: 99,
            title: Some("Ask HN: What are you working on?".to_string()),
            url: None,
            score: 650,
            descendants: 120,
            time: 1_714_560_000,
        };
        let now = 1_714_560_000_000 + 30 * 60 * 1000;

        let candidate = story_to_candidate(0, &story, now).unwrap();

        assert_eq!(candidate.id.as_deref(), Some("hn-0"));
        assert_eq!(candidate.speed, Speed::Exploding);
        assert_eq!(candidate.prediction, Some(95));
        assert_eq!(candidate.priority, Some(true));
        assert_eq!(
            candidate.metrics.url.as_deref(),
            Some("https://news.ycombinator.com/item?id=99")
        );
    }

    #[test]
    fn story_without_title_is_skipped() {
        let story = Story {
            id: 1,
            title: None,
            url: None,
            score: 0,
            descendants: 0,
            time: 0,
        };
        assert!(story_to_candidate(0, &story, 0).is_none());
    }
}
