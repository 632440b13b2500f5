use async_trait::async_trait;
use serde::Deserialize;
use std::env;

use crate::collectors::twitter::parse_rfc3339_ms;
use crate::collectors::{get_json, SourceCollector};
use crate::error::CollectorError;
use crate::{age_hours, now_ms, stable_hash64, truncate_chars, RawCandidate, Speed, Stage};

const PAGE_SIZE: &str = "15";
const ANALYSIS_CHARS: usize = 200;

#[derive(Clone)]
pub struct NewsCollector {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl NewsCollector {
    pub fn from_env(client: reqwest::Client) -> Option<Self> {
        let api_key = env::var("NEWS_API_KEY")
            .ok()
            .filter(|value| !value.trim().is_empty())?;
        let api_base =
            env::var("NEWS_API_BASE").unwrap_or_else(|_| "https://newsapi.org/v2".to_string());
        Some(Self {
            client,
            api_base,
            api_key,
        })
    }
}

#[async_trait]
impl SourceCollector for NewsCollector {
    fn name(&self) -> &str {
        "news"
    }

    async fn collect(&self) -> Result<Vec<RawCandidate>, CollectorError> {
        let request = self
            .client
            .get(format!(
                "{}/top-headlines",
                self.api_base.trim_end_matches('/')
            ))
            .query(&[
                ("country", "us"),
                ("pageSize", PAGE_SIZE),
                ("apiKey", self.api_key.as_str()),
            ]);

        let body: HeadlinesResponse = get_json(request).await?;
        if body.status.as_deref() == Some("error") {
            return Err(CollectorError::Parse(
                body.message
                    .unwrap_or_else(|| "news API returned an error".to_string()),
            ));
        }

        let now = now_ms();
        Ok(body
            .articles
            .unwrap_or_default()
            .iter()
            .filter_map(|article| article_to_candidate(article, now))
            .collect())
    }
}

fn article_to_candidate(article: &Article, now: i64) -> Option<RawCandidate> {
    let title = article.title.clone()?;
    let source_name = article
        .source
        .as_ref()
        .and_then(|source| source.name.clone())
        .unwrap_or_else(|| "News".to_string());
    let description = article.description.clone().unwrap_or_default();

    let published_at = article.published_at.as_deref().and_then(parse_rfc3339_ms);
    let age = published_at.map(|then| age_hours(now, then)).unwrap_or(0.0);

    let prediction = if age < 1.0 {
        90
    } else if age < 4.0 {
        80
    } else {
        70
    };
    let analysis = format!(
        "Breaking news published {} hours ago. {}",
        age.max(0.0).floor() as i64,
        description
    );
    let id_seed = article.url.clone().unwrap_or_else(|| title.clone());

    let mut candidate = RawCandidate::new(title.clone(), Speed::Exploding);
    candidate.id = Some(format!("news-{:x}", stable_hash64(&id_seed)));
    candidate.category_hint = Some(format!("{} {}", title, description));
    candidate.trigger = Some(format!("Breaking news from {}", source_name));
    candidate.stage = Some(Stage::from_age_hours(age));
    candidate.published_at = published_at;
    candidate.geo = Some("US".to_string());
    candidate.driver = Some("Media".to_string());
    candidate.priority = Some(age < 2.0);
    candidate.analysis = Some(truncate_chars(&analysis, ANALYSIS_CHARS, ""));
    candidate.prediction = Some(prediction);
    candidate.is_new = Some(age < 1.0);
    candidate.metrics.source = Some(source_name);
    candidate.metrics.url = article.url.clone();
    Some(candidate)
}

#[derive(Deserialize)]
struct HeadlinesResponse {
    status: Option<String>,
    message: Option<String>,
    articles: Option<Vec<Article>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
    source: Option<ArticleSource>,
}

#[derive(Deserialize)]
struct ArticleSource {
    name: Option<String>,
}
