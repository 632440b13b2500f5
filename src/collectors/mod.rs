pub mod hackernews;
pub mod news;
pub mod reddit;
pub mod synthetic;
pub mod twitter;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::config::SourcesConfig;
use crate::error::CollectorError;
use crate::RawCandidate;

pub use hackernews::HackerNewsCollector;
pub use news::NewsCollector;
pub use reddit::RedditCollector;
pub use synthetic::SyntheticCollector;
pub use twitter::TwitterCollector;

/// One upstream feed. Zero results is `Ok(vec![])`; errors are reserved for
/// transport and payload failures.
#[async_trait]
pub trait SourceCollector: Send + Sync {
    fn name(&self) -> &str;

    async fn collect(&self) -> Result<Vec<RawCandidate>, CollectorError>;
}

/// Builds the enabled collectors in registration order. Feeds that need
/// credentials are skipped when the environment does not provide them.
pub fn from_config(config: &SourcesConfig) -> Vec<Box<dyn SourceCollector>> {
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .build()
        .unwrap_or_default();
    let mut collectors: Vec<Box<dyn SourceCollector>> = Vec::new();

    if config.twitter {
        match TwitterCollector::from_env(client.clone()) {
            Some(collector) => collectors.push(Box::new(collector)),
            None => info!("Twitter collector disabled - TWITTER_BEARER_TOKEN not set"),
        }
    }
    if config.news {
        match NewsCollector::from_env(client.clone()) {
            Some(collector) => collectors.push(Box::new(collector)),
            None => info!("News collector disabled - NEWS_API_KEY not set"),
        }
    }
    if config.reddit {
        collectors.push(Box::new(RedditCollector::new(
            client.clone(),
            config.subreddits.clone(),
        )));
    }
    if config.hackernews {
        collectors.push(Box::new(HackerNewsCollector::new(client)));
    }
    if let Some(seed) = config.synthetic_seed {
        collectors.push(Box::new(SyntheticCollector::new(seed, config.synthetic_count)));
    }

    info!(
        "Collectors registered - count={}, names={}",
        collectors.len(),
        collectors
            .iter()
            .map(|collector| collector.name())
            .collect::<Vec<_>>()
            .join(",")
    );
    collectors
}

/// GET + status check + JSON decode, shared by the HTTP feeds.
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, CollectorError> {
    let response = request.send().await?;

    let status = response.status();
    if !status.is_success() {
        let error_body = response.text().await.unwrap_or_default();
        return Err(CollectorError::Status {
            status: status.as_u16(),
            body: error_body.trim().to_string(),
        });
    }

    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}
