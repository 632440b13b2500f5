use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::aggregate::{FailurePolicy, ScoringMode};
use crate::prediction::FactorWeights;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateConfig {
    pub top_k: usize,
    pub on_failure: String,
    pub collector_timeout_ms: u64,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            top_k: 40,
            on_failure: "sample".to_string(),
            collector_timeout_ms: 8000,
        }
    }
}

impl AggregateConfig {
    pub fn to_policy(&self) -> FailurePolicy {
        match self.on_failure.to_lowercase().as_str() {
            "error" | "strict" => FailurePolicy::Error,
            _ => FailurePolicy::Sample,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    pub mode: String,
    pub engine_weight: f64,
    pub weights: FactorWeights,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            mode: "collector".to_string(),
            engine_weight: 0.5,
            weights: FactorWeights::default(),
        }
    }
}

impl PredictionConfig {
    pub fn to_mode(&self) -> ScoringMode {
        match self.mode.to_lowercase().as_str() {
            "engine" => ScoringMode::Engine,
            "blend" => ScoringMode::Blend {
                engine_weight: self.engine_weight.clamp(0.0, 1.0),
            },
            _ => ScoringMode::Collector,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub twitter: bool,
    pub news: bool,
    pub reddit: bool,
    pub hackernews: bool,
    pub subreddits: Vec<String>,
    pub user_agent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthetic_seed: Option<u64>,
    pub synthetic_count: usize,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            twitter: true,
            news: true,
            reddit: true,
            hackernews: true,
            subreddits: ["popular", "worldnews", "technology", "CryptoCurrency", "wallstreetbets"]
                .iter()
                .map(|sub| sub.to_string())
                .collect(),
            user_agent: "Mozilla/5.0 (compatible; TrendScanner/1.0)".to_string(),
            synthetic_seed: None,
            synthetic_count: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub aggregate: AggregateConfig,
    pub prediction: PredictionConfig,
    pub sources: SourcesConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>), String> {
        let config_path = path.or_else(default_config_path);
        let mut config = match config_path.as_ref() {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(path)
                    .map_err(|err| format!("failed to read config: {}", err))?;
                Self::parse(&contents)?
            }
            _ => AppConfig::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok((config, config_path))
    }

    pub fn parse(contents: &str) -> Result<Self, String> {
        let config: Self =
            toml::from_str(contents).map_err(|err| format!("failed to parse config: {}", err))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.aggregate.top_k == 0 {
            return Err("aggregate.top_k must be at least 1".to_string());
        }
        if !matches!(
            self.aggregate.on_failure.to_lowercase().as_str(),
            "error" | "strict" | "sample"
        ) {
            return Err(format!(
                "aggregate.on_failure must be \"error\" or \"sample\": {}",
                self.aggregate.on_failure
            ));
        }
        if !matches!(
            self.prediction.mode.to_lowercase().as_str(),
            "collector" | "engine" | "blend"
        ) {
            return Err(format!(
                "prediction.mode must be \"collector\", \"engine\" or \"blend\": {}",
                self.prediction.mode
            ));
        }
        Ok(())
    }

    pub fn write(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| format!("failed to create config dir: {}", err))?;
        }
        let payload = toml::to_string_pretty(self)
            .map_err(|err| format!("failed to serialize config: {}", err))?;
        std::fs::write(path, payload)
            .map_err(|err| format!("failed to write config: {}", err))?;
        Ok(())
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(top_k) = env::var("TRENDS_TOP_K") {
            match top_k.parse::<usize>() {
                Ok(value) if value > 0 => self.aggregate.top_k = value,
                _ => warn!("Ignoring TRENDS_TOP_K - value={}", top_k),
            }
        }
        if let Ok(policy) = env::var("TRENDS_ON_FAILURE") {
            if !policy.trim().is_empty() {
                self.aggregate.on_failure = policy;
            }
        }
        if let Ok(timeout) = env::var("TRENDS_COLLECTOR_TIMEOUT_MS") {
            if let Ok(value) = timeout.parse::<u64>() {
                self.aggregate.collector_timeout_ms = value;
            }
        }
        if let Ok(mode) = env::var("TRENDS_SCORING_MODE") {
            if !mode.trim().is_empty() {
                self.prediction.mode = mode;
            }
        }
        if let Ok(weight) = env::var("TRENDS_ENGINE_WEIGHT") {
            if let Ok(value) = weight.parse::<f64>() {
                self.prediction.engine_weight = value;
            }
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    env::var("TRENDS_CONFIG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/trends.toml")))
}
