pub mod engine;
pub mod factors;

pub use engine::{Confidence, FactorWeights, Prediction, PredictionEngine, Tier};
pub use factors::{Factor, FactorScores, ScoringInput};
