pub mod aggregate;
pub mod classify;
pub mod collectors;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod fallback;
pub mod notify;
pub mod prediction;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use aggregate::{Aggregator, FailurePolicy};
pub use classify::classify;
pub use dedupe::{dedupe, dedupe_key};
pub use prediction::{Confidence, Prediction, PredictionEngine, ScoringInput, Tier};

/// Window in which a trend counts as "new".
pub const NEW_WINDOW_HOURS: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Political,
    Breaking,
    Tech,
    Viral,
    Celebrity,
    Cultural,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Political,
        Category::Breaking,
        Category::Tech,
        Category::Viral,
        Category::Celebrity,
        Category::Cultural,
    ];

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "political" | "politics" => Some(Category::Political),
            "breaking" | "news" => Some(Category::Breaking),
            "tech" | "crypto" => Some(Category::Tech),
            "viral" => Some(Category::Viral),
            "celebrity" | "celeb" => Some(Category::Celebrity),
            "cultural" | "culture" => Some(Category::Cultural),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Political => "political",
            Category::Breaking => "breaking",
            Category::Tech => "tech",
            Category::Viral => "viral",
            Category::Celebrity => "celebrity",
            Category::Cultural => "cultural",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    Slow,
    Accelerating,
    Exploding,
}

impl Speed {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "slow" => Some(Speed::Slow),
            "accelerating" | "fast" => Some(Speed::Accelerating),
            "exploding" | "explosive" => Some(Speed::Exploding),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Speed::Slow => "slow",
            Speed::Accelerating => "accelerating",
            Speed::Exploding => "exploding",
        }
    }

    /// Buckets an engagement count against the two thresholds a feed uses.
    pub fn from_volume(volume: u64, accelerating_above: u64, exploding_above: u64) -> Self {
        if volume > exploding_above {
            Speed::Exploding
        } else if volume > accelerating_above {
            Speed::Accelerating
        } else {
            Speed::Slow
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Early,
    Mid,
    Late,
}

impl Stage {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "early" => Some(Stage::Early),
            "mid" => Some(Stage::Mid),
            "late" => Some(Stage::Late),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Early => "early",
            Stage::Mid => "mid",
            Stage::Late => "late",
        }
    }

    /// Lifecycle phase from age: past 12h is late, past 4h is mid.
    pub fn from_age_hours(age_hours: f64) -> Self {
        if age_hours > 12.0 {
            Stage::Late
        } else if age_hours > 4.0 {
            Stage::Mid
        } else {
            Stage::Early
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendMetrics {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Feed specific counters such as likes or retweets.
    #[serde(flatten)]
    pub extra: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionDetails {
    pub confidence: Confidence,
    pub reasoning: Vec<String>,
    pub tier: Tier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    pub id: String,
    pub title: String,
    pub category: Category,
    pub trigger: String,
    pub speed: Speed,
    pub stage: Stage,
    pub geo: String,
    pub driver: String,
    pub priority: bool,
    pub analysis: String,
    pub prediction: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction_details: Option<PredictionDetails>,
    pub is_new: bool,
    pub timestamp: i64,
    pub metrics: TrendMetrics,
    /// Upstream publish time, used for age based scoring.
    #[serde(skip)]
    pub published_at: Option<i64>,
}

impl Trend {
    pub fn scoring_input(&self, source_count: Option<usize>) -> ScoringInput {
        ScoringInput {
            speed: self.speed,
            stage: self.stage,
            category: self.category,
            driver: self.driver.clone(),
            title: self.title.clone(),
            is_new: self.is_new,
            timestamp: self.published_at.unwrap_or(self.timestamp),
            volume: self.metrics.volume,
            comments: self.metrics.comments,
            source: Some(self.metrics.source.clone()).filter(|value| !value.is_empty()),
            url: self.metrics.url.clone(),
            source_count,
        }
    }
}

/// What a collector hands back before normalization. Only `title` and
/// `speed` are required; everything else is resolved in
/// [`aggregate::normalize`].
#[derive(Debug, Clone)]
pub struct RawCandidate {
    pub id: Option<String>,
    pub title: String,
    pub category: Option<Category>,
    pub category_hint: Option<String>,
    pub trigger: Option<String>,
    pub speed: Speed,
    pub stage: Option<Stage>,
    pub published_at: Option<i64>,
    pub geo: Option<String>,
    pub driver: Option<String>,
    pub priority: Option<bool>,
    pub analysis: Option<String>,
    pub prediction: Option<u8>,
    pub is_new: Option<bool>,
    pub metrics: RawMetrics,
}

impl RawCandidate {
    pub fn new(title: impl Into<String>, speed: Speed) -> Self {
        Self {
            id: None,
            title: title.into(),
            category: None,
            category_hint: None,
            trigger: None,
            speed,
            stage: None,
            published_at: None,
            geo: None,
            driver: None,
            priority: None,
            analysis: None,
            prediction: None,
            is_new: None,
            metrics: RawMetrics::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RawMetrics {
    pub source: Option<String>,
    pub volume: Option<u64>,
    pub comments: Option<u64>,
    pub url: Option<String>,
    pub extra: BTreeMap<String, u64>,
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub fn age_hours(now_ms: i64, then_ms: i64) -> f64 {
    (now_ms - then_ms) as f64 / 1000.0 / 60.0 / 60.0
}

pub fn stable_hash64(value: &str) -> u64 {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// Truncates to `max` chars, appending `suffix` only when something was cut.
pub fn truncate_chars(value: &str, max: usize, suffix: &str) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max).collect();
    out.push_str(suffix);
    out
}

pub fn format_number(value: f64) -> String {
    let rounded = value.round().max(0.0) as i64;
    let mut chars: Vec<char> = rounded.to_string().chars().collect();
    let mut result = String::new();
    let mut count = 0usize;

    while let Some(ch) = chars.pop() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(ch);
        count += 1;
    }

    result.chars().rev().collect()
}
