use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::collectors::SourceCollector;
use crate::config::AppConfig;
use crate::dedupe::{dedupe_by, dedupe_key};
use crate::error::{AggregateError, CollectorError, NormalizeError};
use crate::fallback::sample_trends;
use crate::prediction::{Confidence, PredictionEngine, Tier};
use crate::{age_hours, classify, now_ms, PredictionDetails, RawCandidate, Stage, Trend, TrendMetrics, NEW_WINDOW_HOURS};

/// What to do when the merge/rank pipeline itself fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Surface the error to the caller.
    Error,
    /// Log it and serve the sample catalog.
    Sample,
}

/// How collector-supplied predictions and the engine are combined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoringMode {
    Collector,
    Engine,
    Blend { engine_weight: f64 },
}

impl ScoringMode {
    pub fn label(self) -> &'static str {
        match self {
            ScoringMode::Collector => "collector",
            ScoringMode::Engine => "engine",
            ScoringMode::Blend { .. } => "blend",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectorBatch {
    pub collector: String,
    pub candidates: Vec<RawCandidate>,
}

/// A normalized trend plus the score its collector proposed, if any.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub trend: Trend,
    pub collector_prediction: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct Aggregator {
    engine: PredictionEngine,
    mode: ScoringMode,
    policy: FailurePolicy,
    top_k: usize,
    collector_timeout: Duration,
}

impl Aggregator {
    pub fn new(
        engine: PredictionEngine,
        mode: ScoringMode,
        policy: FailurePolicy,
        top_k: usize,
        collector_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            mode,
            policy,
            top_k,
            collector_timeout,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            PredictionEngine::new(config.prediction.weights.clone()),
            config.prediction.to_mode(),
            config.aggregate.to_policy(),
            config.aggregate.top_k,
            Duration::from_millis(config.aggregate.collector_timeout_ms),
        )
    }

    pub fn engine(&self) -> &PredictionEngine {
        &self.engine
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Fans out to every collector, then merges, dedupes, scores and ranks.
    /// `top_k` overrides the configured bound for this call.
    pub async fn aggregate(
        &self,
        collectors: &[Box<dyn SourceCollector>],
        top_k: Option<usize>,
    ) -> Result<Vec<Trend>, AggregateError> {
        let top_k = top_k.unwrap_or(self.top_k);
        if top_k == 0 {
            return Err(AggregateError::InvalidTopK);
        }

        let start = Instant::now();
        let batches = self.collect_all(collectors).await;
        let now = now_ms();

        let ranked = match self.rank(batches, top_k, now) {
            Ok(ranked) => ranked,
            Err(err) => match self.policy {
                FailurePolicy::Error => return Err(err),
                FailurePolicy::Sample => {
                    warn!("Aggregation failed, serving sample catalog - error={}", err);
                    Vec::new()
                }
            },
        };

        if ranked.is_empty() {
            warn!("No trends available - serving sample catalog");
            let mut samples = sample_trends(now);
            samples.truncate(top_k);
            return Ok(samples);
        }

        info!(
            "Aggregation completed - duration={:.2}s, trends={}, mode={}",
            start.elapsed().as_secs_f32(),
            ranked.len(),
            self.mode.label()
        );
        Ok(ranked)
    }

    /// Runs every collector concurrently and waits for all of them. A failed
    /// or timed out collector contributes an empty batch.
    pub async fn collect_all(&self, collectors: &[Box<dyn SourceCollector>]) -> Vec<CollectorBatch> {
        let timeout = self.collector_timeout;
        let tasks = collectors.iter().map(|collector| async move {
            let started = Instant::now();
            let result = match tokio::time::timeout(timeout, collector.collect()).await {
                Ok(result) => result,
                Err(_) => Err(CollectorError::Timeout(timeout.as_millis() as u64)),
            };

            let candidates = match result {
                Ok(candidates) => {
                    debug!(
                        "Collector finished - name={}, candidates={}, duration={:.2}s",
                        collector.name(),
                        candidates.len(),
                        started.elapsed().as_secs_f32()
                    );
                    candidates
                }
                Err(err) => {
                    warn!("Collector failed - name={}, error={}", collector.name(), err);
                    Vec::new()
                }
            };

            CollectorBatch {
                collector: collector.name().to_string(),
                candidates,
            }
        });

        join_all(tasks).await
    }

    /// The synchronous half of the pipeline: normalize, count sources,
    /// dedupe, score, rank, truncate.
    pub fn rank(
        &self,
        batches: Vec<CollectorBatch>,
        top_k: usize,
        now: i64,
    ) -> Result<Vec<Trend>, AggregateError> {
        let mut merged = Vec::new();
        for batch in batches {
            for (index, raw) in batch.candidates.into_iter().enumerate() {
                match normalize(&batch.collector, index, raw, now) {
                    Ok(normalized) => merged.push(normalized),
                    Err(err) => warn!(
                        "Candidate rejected - collector={}, index={}, error={}",
                        batch.collector, index, err
                    ),
                }
            }
        }

        let source_counts = count_sources(&merged);

        let before = merged.len();
        let unique = dedupe_by(merged, |item| item.trend.title.as_str());
        let removed = before - unique.len();
        if removed > 0 {
            info!(
                "Deduplication - removed={} duplicates, retained={} unique trends",
                removed,
                unique.len()
            );
        }

        let mut seen_ids = HashSet::with_capacity(unique.len());
        let mut trends = Vec::with_capacity(unique.len());
        for item in unique {
            if !seen_ids.insert(item.trend.id.clone()) {
                return Err(AggregateError::DuplicateId { id: item.trend.id });
            }
            let sources = source_counts
                .get(&dedupe_key(&item.trend.title))
                .copied();
            trends.push(self.score(item, sources, now));
        }

        sort_trends(&mut trends);
        trends.truncate(top_k);
        Ok(trends)
    }

    fn score(&self, item: Normalized, source_count: Option<usize>, now: i64) -> Trend {
        let Normalized {
            mut trend,
            collector_prediction,
        } = item;

        if let (ScoringMode::Collector, Some(prediction)) = (self.mode, collector_prediction) {
            trend.prediction = prediction;
            trend.prediction_details = None;
            return trend;
        }

        let prediction = self
            .engine
            .predict(&trend.scoring_input(source_count), now);

        match (self.mode, collector_prediction) {
            (ScoringMode::Blend { engine_weight }, Some(collector)) => {
                let blended = (collector as f64 * (1.0 - engine_weight)
                    + prediction.score as f64 * engine_weight)
                    .round()
                    .clamp(0.0, 100.0) as u8;
                trend.prediction = blended;
                trend.prediction_details = Some(PredictionDetails {
                    confidence: Confidence::from_score(blended),
                    reasoning: prediction.reasoning,
                    tier: Tier::from_score(blended),
                });
            }
            _ => {
                trend.prediction = prediction.score;
                trend.prediction_details = Some(prediction.details());
            }
        }
        trend
    }
}

/// Validates a raw candidate and fills every optional field.
pub fn normalize(
    collector: &str,
    index: usize,
    raw: RawCandidate,
    now: i64,
) -> Result<Normalized, NormalizeError> {
    let title = raw.title.trim().to_string();
    if title.is_empty() {
        return Err(NormalizeError::EmptyTitle);
    }
    if let Some(prediction) = raw.prediction {
        if prediction > 100 {
            return Err(NormalizeError::PredictionOutOfRange(prediction));
        }
    }

    let age = raw
        .published_at
        .map(|published| age_hours(now, published))
        .unwrap_or(0.0);

    let category = raw.category.unwrap_or_else(|| {
        classify(raw.category_hint.as_deref().unwrap_or(&title))
    });
    let source = raw
        .metrics
        .source
        .filter(|source| !source.trim().is_empty())
        .unwrap_or_else(|| collector.to_string());

    let trend = Trend {
        id: raw.id.unwrap_or_else(|| format!("{}-{}", collector, index)),
        category,
        trigger: raw
            .trigger
            .unwrap_or_else(|| format!("Trending on {}", source)),
        speed: raw.speed,
        stage: raw.stage.unwrap_or_else(|| Stage::from_age_hours(age)),
        geo: raw.geo.unwrap_or_else(|| "Global".to_string()),
        driver: raw.driver.unwrap_or_else(|| "Media".to_string()),
        priority: raw.priority.unwrap_or(false),
        analysis: raw.analysis.unwrap_or_default(),
        prediction: raw.prediction.unwrap_or(0),
        prediction_details: None,
        is_new: raw.is_new.unwrap_or(age < NEW_WINDOW_HOURS),
        timestamp: now,
        metrics: TrendMetrics {
            source,
            volume: raw.metrics.volume,
            comments: raw.metrics.comments,
            url: raw.metrics.url,
            extra: raw.metrics.extra,
        },
        published_at: raw.published_at,
        title,
    };

    Ok(Normalized {
        trend,
        collector_prediction: raw.prediction,
    })
}

/// Priority first, then higher prediction. The sort is stable, so equal
/// trends keep their merge order.
pub fn sort_trends(trends: &mut [Trend]) {
    trends.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.prediction.cmp(&a.prediction))
    });
}

fn count_sources(items: &[Normalized]) -> HashMap<String, usize> {
    let mut sources: HashMap<String, HashSet<String>> = HashMap::new();
    for item in items {
        sources
            .entry(dedupe_key(&item.trend.title))
            .or_default()
            .insert(item.trend.metrics.source.to_lowercase());
    }
    sources
        .into_iter()
        .map(|(key, names)| (key, names.len()))
        .collect()
}
