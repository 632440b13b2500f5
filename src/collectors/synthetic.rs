use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::collectors::SourceCollector;
use crate::error::CollectorError;
use crate::{format_number, now_ms, RawCandidate, Speed};

const TITLE_BANK: [&str; 12] = [
    "Senate leaders announce surprise budget deal",
    "Developing: power outage hits downtown grid",
    "New open source model beats benchmark leaders",
    "Ethereum gas fees collapse after upgrade",
    "Cat video with 40M views sparks remix wave",
    "Pop singer teases surprise album drop",
    "Street food festival draws record crowds",
    "Leaked roadmap shows foldable phone lineup",
    "Local library revives vinyl listening nights",
    "Stock market rallies on rate cut hopes",
    "Meme about office chairs takes over feeds",
    "Museum returns artifacts after long campaign",
];
const DRIVERS: [&str; 3] = ["Media", "Grassroots memes", "Influencers"];

/// Seeded stand-in feed for demos and tests. Every call with the same seed
/// yields the same titles, volumes and ages relative to "now".
#[derive(Debug, Clone)]
pub struct SyntheticCollector {
    seed: u64,
    count: usize,
}

impl SyntheticCollector {
    pub fn new(seed: u64, count: usize) -> Self {
        Self { seed, count }
    }

    pub fn generate(&self, now: i64) -> Vec<RawCandidate> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let offset = rng.gen_range(0..TITLE_BANK.len());

        (0..self.count.min(TITLE_BANK.len()))
            .map(|idx| {
                let title = TITLE_BANK[(offset + idx) % TITLE_BANK.len()];
                let volume: u64 = rng.gen_range(100..250_000);
                let comments: u64 = rng.gen_range(0..2_000);
                let age_minutes: i64 = rng.gen_range(5..(18 * 60));
                let driver = DRIVERS[rng.gen_range(0..DRIVERS.len())];

                let mut candidate =
                    RawCandidate::new(title, Speed::from_volume(volume, 5_000, 50_000));
                candidate.id = Some(format!("synthetic-{}", idx));
                candidate.trigger = Some(format!(
                    "Synthetic feed • {} interactions",
                    format_number(volume as f64)
                ));
                candidate.published_at = Some(now - age_minutes * 60 * 1000);
                candidate.driver = Some(driver.to_string());
                candidate.priority = Some(volume > 100_000 && age_minutes < 120);
                candidate.metrics.source = Some("Synthetic".to_string());
                candidate.metrics.volume = Some(volume);
                candidate.metrics.comments = Some(comments);
                candidate
            })
            .collect()
    }
}

#[async_trait]
impl SourceCollector for SyntheticCollector {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn collect(&self) -> Result<Vec<RawCandidate>, CollectorError> {
        Ok(self.generate(now_ms()))
    }
}
