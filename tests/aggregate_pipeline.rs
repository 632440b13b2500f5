use async_trait::async_trait;
use std::time::Duration;

use trend_radar::aggregate::{normalize, CollectorBatch, FailurePolicy, ScoringMode};
use trend_radar::collectors::SourceCollector;
use trend_radar::error::{AggregateError, CollectorError, NormalizeError};
use trend_radar::fallback::sample_trends;
use trend_radar::{Aggregator, Category, PredictionEngine, RawCandidate, Speed, Stage, Trend};

const NOW: i64 = 1_714_564_800_000;

struct StaticCollector {
    name: &'static str,
    candidates: Vec<RawCandidate>,
}

#[async_trait]
impl SourceCollector for StaticCollector {
    fn name(&self) -> &str {
        self.name
    }

    async fn collect(&self) -> Result<Vec<RawCandidate>, CollectorError> {
        Ok(self.candidates.clone())
    }
}

struct FailingCollector;

#[async_trait]
impl SourceCollector for FailingCollector {
    fn name(&self) -> &str {
        "failing"
    }

    async fn collect(&self) -> Result<Vec<RawCandidate>, CollectorError> {
        Err(CollectorError::Status {
            status: 503,
            body: "upstream down".to_string(),
        })
    }
}

struct SlowCollector;

#[async_trait]
impl SourceCollector for SlowCollector {
    fn name(&self) -> &str {
        "slow"
    }

    async fn collect(&self) -> Result<Vec<RawCandidate>, CollectorError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(vec![candidate("Too late to matter", Some(99), true)])
    }
}

fn candidate(title: &str, prediction: Option<u8>, priority: bool) -> RawCandidate {
    let mut raw = RawCandidate::new(title, Speed::Accelerating);
    raw.prediction = prediction;
    raw.priority = Some(priority);
    raw
}

fn aggregator(mode: ScoringMode, policy: FailurePolicy) -> Aggregator {
    Aggregator::new(
        PredictionEngine::default(),
        mode,
        policy,
        40,
        Duration::from_millis(200),
    )
}

fn boxed(name: &'static str, candidates: Vec<RawCandidate>) -> Box<dyn SourceCollector> {
    Box::new(StaticCollector { name, candidates })
}

fn titles(trends: &[Trend]) -> Vec<&str> {
    trends.iter().map(|trend| trend.title.as_str()).collect()
}

#[tokio::test]
async fn all_collectors_failing_serves_sample_catalog() {
    let collectors: Vec<Box<dyn SourceCollector>> =
        vec![Box::new(FailingCollector), Box::new(FailingCollector)];

    let trends = aggregator(ScoringMode::Collector, FailurePolicy::Error)
        .aggregate(&collectors, None)
        .await
        .unwrap();

    let samples = sample_trends(0);
    assert!(!trends.is_empty());
    assert_eq!(trends.len(), samples.len());
    assert_eq!(titles(&trends), titles(&samples));
    assert!(trends.iter().all(|trend| !trend.title.is_empty() && trend.prediction <= 100));
}

#[tokio::test]
async fn empty_collectors_serve_sample_catalog() {
    let collectors = vec![boxed("quiet", Vec::new())];

    let trends = aggregator(ScoringMode::Collector, FailurePolicy::Sample)
        .aggregate(&collectors, None)
        .await
        .unwrap();

    assert_eq!(trends[0].id, "sample-political");
}

#[tokio::test]
async fn failing_collector_does_not_sink_the_others() {
    let collectors: Vec<Box<dyn SourceCollector>> = vec![
        Box::new(FailingCollector),
        boxed("reddit", vec![candidate("Rust adoption climbs", Some(70), false)]),
    ];

    let trends = aggregator(ScoringMode::Collector, FailurePolicy::Error)
        .aggregate(&collectors, None)
        .await
        .unwrap();

    assert_eq!(titles(&trends), vec!["Rust adoption climbs"]);
    assert_eq!(trends[0].metrics.source, "reddit");
}

#[tokio::test]
async fn slow_collector_times_out_without_blocking_others() {
    let collectors: Vec<Box<dyn SourceCollector>> = vec![
        Box::new(SlowCollector),
        boxed("news", vec![candidate("Fast headline", Some(75), false)]),
    ];

    let trends = aggregator(ScoringMode::Collector, FailurePolicy::Error)
        .aggregate(&collectors, None)
        .await
        .unwrap();

    assert_eq!(titles(&trends), vec!["Fast headline"]);
}

#[tokio::test]
async fn near_identical_titles_collapse_to_first_seen() {
    let mut first = candidate("Bitcoin Surges!!", Some(70), false);
    first.id = Some("twitter-1".to_string());
    let mut second = candidate("bitcoin surges", Some(90), false);
    second.id = Some("reddit-1".to_string());
    let collectors = vec![boxed("twitter", vec![first]), boxed("reddit", vec![second])];

    let trends = aggregator(ScoringMode::Collector, FailurePolicy::Error)
        .aggregate(&collectors, None)
        .await
        .unwrap();

    assert_eq!(trends.len(), 1);
    assert_eq!(trends[0].id, "twitter-1");
    assert_eq!(trends[0].title, "Bitcoin Surges!!");
}

#[tokio::test]
async fn top_k_truncates_after_priority_then_score_ordering() {
    let collectors = vec![
        boxed(
            "alpha",
            vec![
                candidate("Alpha one", Some(70), false),
                candidate("Alpha two", Some(90), false),
                candidate("Alpha three", Some(60), true),
                candidate("Alpha four", Some(80), false),
            ],
        ),
        boxed(
            "beta",
            vec![
                candidate("Beta one", Some(95), false),
                candidate("Beta two", Some(65), true),
                candidate("Beta three", Some(80), false),
                candidate("Beta four", Some(50), false),
            ],
        ),
    ];
    let engine = aggregator(ScoringMode::Collector, FailurePolicy::Error);

    let trends = engine.aggregate(&collectors, Some(5)).await.unwrap();

    assert_eq!(
        titles(&trends),
        vec!["Beta two", "Alpha three", "Beta one", "Alpha two", "Alpha four"]
    );

    let full = engine.aggregate(&collectors, Some(8)).await.unwrap();
    let again = engine.aggregate(&collectors, Some(8)).await.unwrap();
    assert_eq!(titles(&full), titles(&again));
    // equal scores keep merge order
    assert_eq!(&titles(&full)[4..6], &["Alpha four", "Beta three"]);
}

#[tokio::test]
async fn zero_top_k_is_rejected() {
    let collectors = vec![boxed("alpha", vec![candidate("Alpha one", Some(70), false)])];

    let result = aggregator(ScoringMode::Collector, FailurePolicy::Sample)
        .aggregate(&collectors, Some(0))
        .await;

    assert_eq!(result, Err(AggregateError::InvalidTopK));
}

#[tokio::test]
async fn duplicate_ids_follow_failure_policy() {
    let mut first = candidate("First distinct story", Some(70), false);
    first.id = Some("shared".to_string());
    let mut second = candidate("Second distinct story", Some(80), false);
    second.id = Some("shared".to_string());
    let collectors = vec![boxed("alpha", vec![first]), boxed("beta", vec![second])];

    let strict = aggregator(ScoringMode::Collector, FailurePolicy::Error)
        .aggregate(&collectors, None)
        .await;
    assert_eq!(
        strict,
        Err(AggregateError::DuplicateId {
            id: "shared".to_string()
        })
    );

    let lenient = aggregator(ScoringMode::Collector, FailurePolicy::Sample)
        .aggregate(&collectors, None)
        .await
        .unwrap();
    assert_eq!(titles(&lenient), titles(&sample_trends(0)));
}

#[test]
fn engine_scores_unscored_candidates_with_merged_source_count() {
    let engine = aggregator(ScoringMode::Collector, FailurePolicy::Error);
    let mut twitter = candidate("Quantum chip breakthrough", None, false);
    twitter.metrics.source = Some("Twitter".to_string());
    let mut hackernews = candidate("Quantum chip breakthrough!", None, false);
    hackernews.metrics.source = Some("HackerNews".to_string());
    let batches = vec![
        CollectorBatch {
            collector: "twitter".to_string(),
            candidates: vec![twitter],
        },
        CollectorBatch {
            collector: "hackernews".to_string(),
            candidates: vec![hackernews],
        },
    ];

    let trends = engine.rank(batches, 10, NOW).unwrap();

    assert_eq!(trends.len(), 1);
    let trend = &trends[0];
    let expected = PredictionEngine::default().predict(&trend.scoring_input(Some(2)), NOW);
    assert!((expected.factors.cross_platform - 0.8).abs() < 1e-9);
    assert_eq!(trend.prediction, expected.score);
    assert_eq!(trend.prediction_details, Some(expected.details()));
}

#[test]
fn collector_mode_keeps_collector_scores() {
    let engine = aggregator(ScoringMode::Collector, FailurePolicy::Error);
    let batches = vec![CollectorBatch {
        collector: "reddit".to_string(),
        candidates: vec![candidate("Pre-scored story", Some(42), false)],
    }];

    let trends = engine.rank(batches, 10, NOW).unwrap();

    assert_eq!(trends[0].prediction, 42);
    assert!(trends[0].prediction_details.is_none());
}

#[test]
fn engine_mode_overrides_collector_scores() {
    let engine = aggregator(ScoringMode::Engine, FailurePolicy::Error);
    let batches = vec![CollectorBatch {
        collector: "reddit".to_string(),
        candidates: vec![candidate("Pre-scored story", Some(12), false)],
    }];

    let trends = engine.rank(batches, 10, NOW).unwrap();

    assert!(trends[0].prediction >= 40);
    assert!(trends[0].prediction_details.is_some());
}

#[test]
fn blend_mode_averages_collector_and_engine() {
    let batches = || {
        vec![CollectorBatch {
            collector: "news".to_string(),
            candidates: vec![candidate("Blended headline", Some(90), false)],
        }]
    };
    let engine_only = aggregator(ScoringMode::Engine, FailurePolicy::Error)
        .rank(batches(), 10, NOW)
        .unwrap();
    let blended = aggregator(
        ScoringMode::Blend { engine_weight: 0.5 },
        FailurePolicy::Error,
    )
    .rank(batches(), 10, NOW)
    .unwrap();

    let expected = ((90.0 + engine_only[0].prediction as f64) / 2.0).round() as u8;
    assert_eq!(blended[0].prediction, expected);
}

#[test]
fn normalize_fills_defaults_and_classifies() {
    let mut raw = RawCandidate::new("  Senate debates new AI rules  ", Speed::Exploding);
    raw.published_at = Some(NOW - 5 * 3_600_000);

    let normalized = normalize("news", 3, raw, NOW).unwrap();
    let trend = normalized.trend;

    assert_eq!(trend.id, "news-3");
    assert_eq!(trend.title, "Senate debates new AI rules");
    assert_eq!(trend.category, Category::Political);
    assert_eq!(trend.stage, Stage::Mid);
    assert!(!trend.is_new);
    assert!(!trend.priority);
    assert_eq!(trend.geo, "Global");
    assert_eq!(trend.driver, "Media");
    assert_eq!(trend.trigger, "Trending on news");
    assert_eq!(trend.metrics.source, "news");
    assert_eq!(trend.timestamp, NOW);
    assert_eq!(normalized.collector_prediction, None);
}

#[test]
fn normalize_prefers_category_hint_over_title() {
    let mut raw = RawCandidate::new("Watch this", Speed::Slow);
    raw.category_hint = Some("r/CryptoCurrency bitcoin".to_string());

    let trend = normalize("reddit", 0, raw, NOW).unwrap().trend;

    assert_eq!(trend.category, Category::Tech);
    assert!(trend.is_new);
    assert_eq!(trend.stage, Stage::Early);
}

#[test]
fn normalize_rejects_invalid_candidates() {
    let blank = RawCandidate::new("   ", Speed::Slow);
    assert_eq!(
        normalize("news", 0, blank, NOW).unwrap_err(),
        NormalizeError::EmptyTitle
    );

    let mut too_high = RawCandidate::new("Valid title", Speed::Slow);
    too_high.prediction = Some(140);
    assert_eq!(
        normalize("news", 0, too_high, NOW).unwrap_err(),
        NormalizeError::PredictionOutOfRange(140)
    );
}
