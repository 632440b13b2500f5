use serde::{Deserialize, Serialize};

use crate::{age_hours, Category, Speed, Stage};

const NOVELTY_KEYWORDS: [&str; 6] = ["first", "new", "breaking", "just", "announced", "leaked"];

#[derive(Debug, Clone)]
pub struct ScoringInput {
    pub speed: Speed,
    pub stage: Stage,
    pub category: Category,
    pub driver: String,
    pub title: String,
    pub is_new: bool,
    pub timestamp: i64,
    pub volume: Option<u64>,
    pub comments: Option<u64>,
    pub source: Option<String>,
    pub url: Option<String>,
    /// Distinct feeds that reported the same story, when the caller knows it.
    pub source_count: Option<usize>,
}

impl ScoringInput {
    pub fn new(speed: Speed, stage: Stage, category: Category, timestamp: i64) -> Self {
        Self {
            speed,
            stage,
            category,
            driver: String::new(),
            title: String::new(),
            is_new: false,
            timestamp,
            volume: None,
            comments: None,
            source: None,
            url: None,
            source_count: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Factor {
    Velocity,
    Timing,
    Volume,
    Engagement,
    Novelty,
    CrossPlatform,
}

impl Factor {
    pub const ALL: [Factor; 6] = [
        Factor::Velocity,
        Factor::Timing,
        Factor::Volume,
        Factor::Engagement,
        Factor::Novelty,
        Factor::CrossPlatform,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Factor::Velocity => "velocity",
            Factor::Timing => "timing",
            Factor::Volume => "volume",
            Factor::Engagement => "engagement",
            Factor::Novelty => "novelty",
            Factor::CrossPlatform => "crossPlatform",
        }
    }

    /// Canned explanation for a factor that scored above the neutral 0.5.
    pub fn reason(self, value: f64) -> Option<&'static str> {
        if value <= 0.5 {
            return None;
        }
        let exceptional = value > 0.8;
        let text = match self {
            Factor::Velocity if exceptional => "Explosive growth velocity detected",
            Factor::Velocity => "Strong momentum building",
            Factor::Timing if exceptional => "Perfect early-stage timing",
            Factor::Timing => "Good entry window",
            Factor::Volume if exceptional => "Optimal volume for growth",
            Factor::Volume => "Healthy engagement level",
            Factor::Engagement if exceptional => "High engagement signals",
            Factor::Engagement => "Active community participation",
            Factor::Novelty if exceptional => "Novel and unique content",
            Factor::Novelty => "Fresh perspective emerging",
            Factor::CrossPlatform if exceptional => "Multi-platform validation",
            Factor::CrossPlatform => "Cross-source confirmation",
        };
        Some(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorScores {
    pub velocity: f64,
    pub timing: f64,
    pub volume: f64,
    pub engagement: f64,
    pub novelty: f64,
    pub cross_platform: f64,
}

impl FactorScores {
    pub fn compute(input: &ScoringInput, now_ms: i64) -> Self {
        Self {
            velocity: velocity(input),
            timing: timing(input, now_ms),
            volume: volume(input),
            engagement: engagement(input),
            novelty: novelty(input),
            cross_platform: cross_platform(input),
        }
    }

    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Velocity => self.velocity,
            Factor::Timing => self.timing,
            Factor::Volume => self.volume,
            Factor::Engagement => self.engagement,
            Factor::Novelty => self.novelty,
            Factor::CrossPlatform => self.cross_platform,
        }
    }

    /// Factors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Factor, f64)> + '_ {
        Factor::ALL.iter().map(move |factor| (*factor, self.get(*factor)))
    }
}

pub fn velocity(input: &ScoringInput) -> f64 {
    let mut score: f64 = 0.5;

    score += match input.speed {
        Speed::Exploding => 0.4,
        Speed::Accelerating => 0.25,
        Speed::Slow => 0.1,
    };

    if input.stage == Stage::Early && input.speed == Speed::Exploding {
        score += 0.15;
    }

    if input.volume.unwrap_or(0) > 50_000 {
        score += 0.1;
    }

    score.min(1.0)
}

pub fn timing(input: &ScoringInput, now_ms: i64) -> f64 {
    let mut score = 0.5;

    score += match input.stage {
        Stage::Early => 0.3,
        Stage::Mid => 0.1,
        Stage::Late => -0.1,
    };

    if input.is_new {
        score += 0.2;
    }

    let age = age_hours(now_ms, input.timestamp);
    if age < 2.0 {
        score += 0.15;
    } else if age < 6.0 {
        score += 0.1;
    }

    clamp(score, 0.2, 1.0)
}

pub fn volume(input: &ScoringInput) -> f64 {
    let volume = input.volume.unwrap_or(0);
    let mut score = 0.5;

    if volume < 5_000 {
        score += 0.3;
    } else if volume < 50_000 {
        score += 0.2;
    } else if volume < 200_000 {
        score += 0.1;
    } else {
        score -= 0.1;
    }

    // small and early is the hidden-gem case
    if volume < 10_000 && input.stage == Stage::Early {
        score += 0.2;
    }

    clamp(score, 0.3, 1.0)
}

pub fn engagement(input: &ScoringInput) -> f64 {
    let mut score = 0.5;

    if input.comments.unwrap_or(0) > 100 {
        score += 0.15;
    }
    if input.url.as_deref().is_some_and(|url| !url.is_empty()) {
        score += 0.1;
    }

    score += match input.category {
        Category::Tech => 0.15,
        Category::Political => 0.1,
        Category::Viral => 0.2,
        _ => 0.0,
    };

    if input.driver == "Grassroots memes" {
        score += 0.15;
    } else if input.driver == "Influencers" {
        score += 0.1;
    }

    clamp(score, 0.3, 1.0)
}

pub fn novelty(input: &ScoringInput) -> f64 {
    let mut score = 0.5;

    if input.is_new {
        score += 0.3;
    }

    let title = input.title.to_lowercase();
    if NOVELTY_KEYWORDS.iter().any(|keyword| title.contains(keyword)) {
        score += 0.2;
    }

    if input.category == Category::Tech {
        score += 0.1;
    }

    clamp(score, 0.3, 1.0)
}

pub fn cross_platform(input: &ScoringInput) -> f64 {
    let sources = input
        .source_count
        .unwrap_or_else(|| usize::from(input.source.as_deref().is_some_and(|s| !s.is_empty())));

    let mut score = 0.5;
    if sources >= 2 {
        score += 0.3;
    } else if sources == 1 {
        score += 0.1;
    }

    clamp(score, 0.3, 1.0)
}

fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.max(min).min(max)
}
