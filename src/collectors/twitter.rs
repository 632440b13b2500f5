use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use std::env;
use tracing::{debug, warn};

use crate::collectors::{get_json, SourceCollector};
use crate::error::CollectorError;
use crate::{
    age_hours, format_number, now_ms, truncate_chars, RawCandidate, Speed, Stage,
    NEW_WINDOW_HOURS,
};

const SEARCH_QUERIES: [&str; 4] = [
    "lang:en -is:retweet (trending OR viral OR breaking)",
    "lang:en -is:retweet (#Bitcoin OR #Crypto OR #NFT)",
    "lang:en -is:retweet (#Trump OR #Biden OR #Election)",
    "lang:en -is:retweet (celebrity OR #TaylorSwift OR #Drake)",
];
// only the first two queries run, to stay inside the search rate limit
const ACTIVE_QUERIES: usize = 2;
const MAX_TWEETS: usize = 20;
const TITLE_CHARS: usize = 100;

#[derive(Clone)]
pub struct TwitterCollector {
    client: reqwest::Client,
    api_base: String,
    bearer_token: String,
}

impl TwitterCollector {
    pub fn from_env(client: reqwest::Client) -> Option<Self> {
        let bearer_token = env::var("TWITTER_BEARER_TOKEN")
            .ok()
            .filter(|value| !value.trim().is_empty())?;
        let api_base = env::var("TWITTER_API_BASE")
            .unwrap_or_else(|_| "https://api.twitter.com/2".to_string());
        Some(Self {
            client,
            api_base,
            bearer_token: decode_bearer(bearer_token),
        })
    }

    async fn search(&self, query: &str) -> Result<Vec<Tweet>, CollectorError> {
        let request = self
            .client
            .get(format!(
                "{}/tweets/search/recent",
                self.api_base.trim_end_matches('/')
            ))
            .query(&[
                ("query", query),
                ("max_results", "10"),
                ("tweet.fields", "public_metrics,created_at"),
            ])
            .header(AUTHORIZATION, format!("Bearer {}", self.bearer_token));

        let body: SearchResponse = get_json(request).await?;
        Ok(body.data.unwrap_or_default())
    }
}

#[async_trait]
impl SourceCollector for TwitterCollector {
    fn name(&self) -> &str {
        "twitter"
    }

    async fn collect(&self) -> Result<Vec<RawCandidate>, CollectorError> {
        let mut tweets = Vec::new();
        let mut last_error = None;

        for query in SEARCH_QUERIES.iter().take(ACTIVE_QUERIES) {
            match self.search(query).await {
                Ok(batch) => {
                    debug!("Twitter search completed - query={}, tweets={}", query, batch.len());
                    tweets.extend(batch);
                }
                Err(err) => {
                    warn!("Twitter search failed - query={}, error={}", query, err);
                    last_error = Some(err);
                }
            }
        }

        if tweets.is_empty() {
            if let Some(err) = last_error {
                return Err(err);
            }
        }

        let now = now_ms();
        Ok(tweets
            .iter()
            .take(MAX_TWEETS)
            .map(|tweet| tweet_to_candidate(tweet, now))
            .collect())
    }
}

fn tweet_to_candidate(tweet: &Tweet, now: i64) -> RawCandidate {
    let metrics = tweet.public_metrics.clone().unwrap_or_default();
    let volume = metrics.retweet_count + metrics.reply_count + metrics.like_count;

    let published_at = tweet.created_at.as_deref().and_then(parse_rfc3339_ms);
    let age = published_at.map(|then| age_hours(now, then)).unwrap_or(0.0);

    let speed = Speed::from_volume(volume, 1_000, 10_000);
    let priority = volume > 5_000 && age < 6.0;
    let prediction = if volume > 10_000 {
        85
    } else if volume > 5_000 {
        75
    } else if volume > 1_000 {
        65
    } else {
        60
    };

    let title = truncate_chars(&strip_urls(&tweet.text), TITLE_CHARS, "...");
    let analysis = format!(
        "Twitter content showing {} momentum. {}",
        speed.label(),
        if priority {
            "HIGH PRIORITY - Early detection opportunity."
        } else {
            "Monitor for growth."
        }
    );

    let mut candidate = RawCandidate::new(title, speed);
    candidate.id = Some(format!("twitter-{}", tweet.id));
    candidate.category_hint = Some(tweet.text.clone());
    candidate.trigger = Some(format!(
        "Trending on Twitter • {} engagements",
        format_number(volume as f64)
    ));
    candidate.stage = Some(Stage::from_age_hours(age));
    candidate.published_at = published_at;
    candidate.geo = Some("Global".to_string());
    candidate.driver = Some("Grassroots memes".to_string());
    candidate.priority = Some(priority);
    candidate.analysis = Some(analysis);
    candidate.prediction = Some(prediction);
    candidate.is_new = Some(age < NEW_WINDOW_HOURS);
    candidate.metrics.source = Some("Twitter".to_string());
    candidate.metrics.volume = Some(volume);
    candidate
        .metrics
        .extra
        .insert("retweets".to_string(), metrics.retweet_count);
    candidate
        .metrics
        .extra
        .insert("likes".to_string(), metrics.like_count);
    candidate
}

fn strip_urls(text: &str) -> String {
    text.split_whitespace()
        .filter(|word| !(word.starts_with("http://") || word.starts_with("https://")))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn parse_rfc3339_ms(value: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|date| date.timestamp_millis())
}

fn decode_bearer(value: String) -> String {
    if value.contains('%') {
        match urlencoding::decode(&value) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => value,
        }
    } else {
        value
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    data: Option<Vec<Tweet>>,
}

#[derive(Deserialize)]
struct Tweet {
    id: String,
    text: String,
    created_at: Option<String>,
    public_metrics: Option<PublicMetrics>,
}

#[derive(Deserialize, Clone, Default)]
struct PublicMetrics {
    #[serde(default)]
    retweet_count: u64,
    #[serde(default)]
    reply_count: u64,
    #[serde(default)]
    like_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tweet(text: &str, likes: u64, created_at: &str) -> Tweet {
        Tweet {
            id: "42".to_string(),
            text: text.to_string(),
            created_at: Some(created_at.to_string()),
            public_metrics: Some(PublicMetrics {
                retweet_count: 0,
                reply_count: 0,
                like_count: likes,
            }),
        }
    }

    #[test]
    fn fresh_high_volume_tweet_is_priority() {
        let now = parse_rfc3339_ms("2024-05-01T12:00:00Z").unwrap();
        let candidate = tweet_to_candidate(
            &tweet("Bitcoin breaks out https://t.co/abc", 12_000, "2024-05-01T11:00:00Z"),
            now,
        );

        assert_eq!(candidate.id.as_deref(), Some("twitter-42"));
        assert_eq!(candidate.title, "Bitcoin breaks out");
        assert_eq!(candidate.speed, Speed::Exploding);
        assert_eq!(candidate.stage, Some(Stage::Early));
        assert_eq!(candidate.priority, Some(true));
        assert_eq!(candidate.prediction, Some(85));
        assert_eq!(candidate.is_new, Some(true));
        assert_eq!(
            candidate.trigger.as_deref(),
            Some("Trending on Twitter • 12,000 engagements")
        );
    }

    #[test]
    fn old_quiet_tweet_is_late_and_slow() {
        let now = parse_rfc3339_ms("2024-05-02T12:00:00Z").unwrap();
        let candidate = tweet_to_candidate(&tweet("meh", 10, "2024-05-01T11:00:00Z"), now);

        assert_eq!(candidate.speed, Speed::Slow);
        assert_eq!(candidate.stage, Some(Stage::Late));
        assert_eq!(candidate.priority, Some(false));
        assert_eq!(candidate.prediction, Some(60));
        assert_eq!(candidate.is_new, Some(false));
    }

    #[test]
    fn long_text_is_truncated_with_ellipsis() {
        let text = "a".repeat(150);
        let candidate = tweet_to_candidate(&tweet(&text, 0, "2024-05-01T11:00:00Z"), 0);
        assert_eq!(candidate.title.chars().count(), TITLE_CHARS + 3);
        assert!(candidate.title.ends_with("..."));
    }
}
