use serde::{Deserialize, Serialize};

use crate::prediction::factors::{FactorScores, ScoringInput};
use crate::PredictionDetails;

const MAX_REASONS: usize = 3;
const SCORE_FLOOR: f64 = 40.0;
const SCORE_CEILING: f64 = 99.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorWeights {
    pub velocity: f64,
    pub timing: f64,
    pub volume: f64,
    pub engagement: f64,
    pub novelty: f64,
    pub cross_platform: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            velocity: 0.30,
            timing: 0.20,
            volume: 0.15,
            engagement: 0.15,
            novelty: 0.10,
            cross_platform: 0.10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl Confidence {
    pub fn from_score(score: u8) -> Self {
        if score >= 85 {
            Confidence::VeryHigh
        } else if score >= 75 {
            Confidence::High
        } else if score >= 65 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Confidence::Low => "Low",
            Confidence::Medium => "Medium",
            Confidence::High => "High",
            Confidence::VeryHigh => "Very High",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Monitor,
    Possible,
    Likely,
    Imminent,
}

impl Tier {
    pub fn from_score(score: u8) -> Self {
        if score >= 90 {
            Tier::Imminent
        } else if score >= 80 {
            Tier::Likely
        } else if score >= 70 {
            Tier::Possible
        } else {
            Tier::Monitor
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::Monitor => "MONITOR",
            Tier::Possible => "POSSIBLE",
            Tier::Likely => "LIKELY",
            Tier::Imminent => "IMMINENT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub score: u8,
    pub confidence: Confidence,
    pub reasoning: Vec<String>,
    pub factors: FactorScores,
    pub tier: Tier,
}

impl Prediction {
    pub fn details(&self) -> PredictionDetails {
        PredictionDetails {
            confidence: self.confidence,
            reasoning: self.reasoning.clone(),
            tier: self.tier,
        }
    }
}

/// Six-factor breakout scorer. Holds only its weights, so one instance can
/// be shared across every concurrent aggregation.
#[derive(Debug, Clone, Default)]
pub struct PredictionEngine {
    weights: FactorWeights,
}

impl PredictionEngine {
    pub fn new(weights: FactorWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &FactorWeights {
        &self.weights
    }

    pub fn predict(&self, input: &ScoringInput, now_ms: i64) -> Prediction {
        let factors = FactorScores::compute(input, now_ms);
        let score = self.weighted_score(&factors);

        let reasoning = factors
            .iter()
            .filter_map(|(factor, value)| factor.reason(value))
            .take(MAX_REASONS)
            .map(str::to_string)
            .collect();

        Prediction {
            score,
            confidence: Confidence::from_score(score),
            reasoning,
            factors,
            tier: Tier::from_score(score),
        }
    }

    fn weighted_score(&self, factors: &FactorScores) -> u8 {
        let mut total = 0.0;

        total += factors.velocity * self.weights.velocity;
        total += factors.timing * self.weights.timing;
        total += factors.volume * self.weights.volume;
        total += factors.engagement * self.weights.engagement;
        total += factors.novelty * self.weights.novelty;
        total += factors.cross_platform * self.weights.cross_platform;

        let scaled = (total * 100.0).round();
        if scaled.is_nan() {
            return SCORE_FLOOR as u8;
        }
        scaled.max(SCORE_FLOOR).min(SCORE_CEILING) as u8
    }
}
