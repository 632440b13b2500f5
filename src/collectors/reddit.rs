use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use std::env;
use tracing::{debug, warn};

use crate::collectors::{get_json, SourceCollector};
use crate::error::CollectorError;
use crate::{age_hours, format_number, now_ms, truncate_chars, RawCandidate, Speed, Stage};

const POSTS_PER_SUBREDDIT: &str = "10";
const MAX_POSTS: usize = 15;
const TITLE_CHARS: usize = 100;

#[derive(Clone)]
pub struct RedditCollector {
    client: reqwest::Client,
    api_base: String,
    subreddits: Vec<String>,
}

impl RedditCollector {
    pub fn new(client: reqwest::Client, subreddits: Vec<String>) -> Self {
        let api_base =
            env::var("REDDIT_API_BASE").unwrap_or_else(|_| "https://www.reddit.com".to_string());
        Self {
            client,
            api_base,
            subreddits,
        }
    }

    async fn hot(&self, subreddit: &str) -> Result<Vec<Post>, CollectorError> {
        let request = self
            .client
            .get(format!(
                "{}/r/{}/hot.json",
                self.api_base.trim_end_matches('/'),
                subreddit
            ))
            .query(&[("limit", POSTS_PER_SUBREDDIT)]);

        let listing: Listing = get_json(request).await?;
        Ok(listing
            .data
            .map(|data| data.children.into_iter().map(|child| child.data).collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl SourceCollector for RedditCollector {
    fn name(&self) -> &str {
        "reddit"
    }

    async fn collect(&self) -> Result<Vec<RawCandidate>, CollectorError> {
        let results = join_all(self.subreddits.iter().map(|sub| self.hot(sub))).await;

        let now = now_ms();
        let mut candidates = Vec::new();
        let mut last_error = None;
        for (subreddit, result) in self.subreddits.iter().zip(results) {
            match result {
                Ok(posts) => {
                    debug!("Reddit listing fetched - subreddit={}, posts={}", subreddit, posts.len());
                    candidates.extend(
                        posts
                            .iter()
                            .enumerate()
                            .map(|(index, post)| post_to_candidate(subreddit, index, post, now)),
                    );
                }
                Err(err) => {
                    warn!("Reddit listing failed - subreddit={}, error={}", subreddit, err);
                    last_error = Some(err);
                }
            }
        }

        if candidates.is_empty() {
            if let Some(err) = last_error {
                return Err(err);
            }
        }

        candidates.truncate(MAX_POSTS);
        Ok(candidates)
    }
}

fn post_to_candidate(subreddit: &str, index: usize, post: &Post, now: i64) -> RawCandidate {
    let score = post.score.max(0) as u64;
    let comments = post.num_comments;
    let published_at = (post.created_utc * 1000.0) as i64;
    let age = age_hours(now, published_at);
    let sub_name = post.subreddit.clone().unwrap_or_else(|| subreddit.to_string());

    let speed = Speed::from_volume(score, 1_000, 10_000);

    let mut candidate = RawCandidate::new(truncate_chars(&post.title, TITLE_CHARS, ""), speed);
    candidate.id = Some(format!("reddit-{}-{}", subreddit, index));
    candidate.category_hint = Some(format!("{} {}", post.title, sub_name));
    candidate.trigger = Some(format!(
        "r/{} • {} upvotes",
        sub_name,
        format_number(score as f64)
    ));
    candidate.stage = Some(Stage::from_age_hours(age));
    candidate.published_at = Some(published_at);
    candidate.geo = Some("Global".to_string());
    candidate.driver = Some("Grassroots memes".to_string());
    candidate.priority = Some(score > 5_000 && age < 6.0);
    candidate.analysis = Some(format!(
        "Reddit discussion with {} comments in {}h",
        comments,
        age.max(0.0).floor() as i64
    ));
    candidate.prediction = Some(reddit_prediction(score, age, comments));
    candidate.is_new = Some(age < 2.0);
    candidate.metrics.source = Some("Reddit".to_string());
    candidate.metrics.volume = Some(score);
    candidate.metrics.comments = Some(comments);
    candidate.metrics.url = post
        .permalink
        .as_ref()
        .map(|permalink| format!("https://reddit.com{}", permalink));
    candidate
}

fn reddit_prediction(score: u64, age: f64, comments: u64) -> u8 {
    let mut prediction: u8 = 60;

    if score > 20_000 {
        prediction += 20;
    } else if score > 10_000 {
        prediction += 15;
    } else if score > 5_000 {
        prediction += 10;
    }

    if age < 3.0 && score > 5_000 {
        prediction += 15;
    }

    if comments > 500 {
        prediction += 10;
    }

    prediction.min(95)
}

#[derive(Deserialize)]
struct Listing {
    data: Option<ListingData>,
}

#[derive(Deserialize)]
struct ListingData {
    children: Vec<ListingChild>,
}

#[derive(Deserialize)]
struct ListingChild {
    data: Post,
}

#[derive(Deserialize)]
struct Post {
    title: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: u64,
    #[serde(default)]
    created_utc: f64,
    permalink: Option<String>,
    subreddit: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_stacks_bonuses_and_caps() {
        assert_eq!(reddit_prediction(100, 10.0, 0), 60);
        assert_eq!(reddit_prediction(6_000, 10.0, 0), 70);
        assert_eq!(reddit_prediction(6_000, 1.0, 600), 95);
        assert_eq!(reddit_prediction(25_000, 1.0, 600), 95);
    }

    #[test]
    fn post_maps_with_permalink_and_counts() {
        let post = Post {
            title: "Rust 2.0 announced".to_string(),
            score: 12_500,
            num_comments: 800,
            created_utc: 1_714_560_000.0,
            permalink: Some("/r/technology/comments/abc".to_string()),
            subreddit: Some("technology".to_string()),
        };
        let now = 1_714_560_000_000 + 3_600_000;

        let candidate = post_to_candidate("technology", 3, &post, now);

        assert_eq!(candidate.id.as_deref(), Some("reddit-technology-3"));
        assert_eq!(candidate.speed, Speed::Exploding);
        assert_eq!(candidate.priority, Some(true));
        assert_eq!(candidate.is_new, Some(true));
        assert_eq!(candidate.trigger.as_deref(), Some("r/technology • 12,500 upvotes"));
        assert_eq!(
            candidate.metrics.url.as_deref(),
            Some("https://reddit.com/r/technology/comments/abc")
        );
        assert_eq!(candidate.analysis.as_deref(), Some("Reddit discussion with 800 comments in 1h"));
    }
}
