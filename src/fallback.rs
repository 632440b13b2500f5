use crate::{Category, Speed, Stage, Trend, TrendMetrics};

struct Sample {
    id: &'static str,
    title: &'static str,
    category: Category,
    trigger: &'static str,
    speed: Speed,
    stage: Stage,
    geo: &'static str,
    driver: &'static str,
    priority: bool,
    analysis: &'static str,
    prediction: u8,
    is_new: bool,
    volume: u64,
}

const SAMPLES: [Sample; 6] = [
    Sample {
        id: "sample-political",
        title: "Surprise Senate vote reshapes spending bill",
        category: Category::Political,
        trigger: "Late-night procedural vote",
        speed: Speed::Exploding,
        stage: Stage::Early,
        geo: "US",
        driver: "Media",
        priority: true,
        analysis: "Sample data. Political coverage accelerating across outlets.",
        prediction: 88,
        is_new: true,
        volume: 42_000,
    },
    Sample {
        id: "sample-breaking",
        title: "Developing: major airport grounds departures",
        category: Category::Breaking,
        trigger: "Live reports from travelers",
        speed: Speed::Exploding,
        stage: Stage::Early,
        geo: "Global",
        driver: "Grassroots memes",
        priority: true,
        analysis: "Sample data. Eyewitness posts outpacing official statements.",
        prediction: 84,
        is_new: true,
        volume: 18_500,
    },
    Sample {
        id: "sample-tech",
        title: "Open weights model tops coding leaderboard",
        category: Category::Tech,
        trigger: "Benchmark results posted by lab",
        speed: Speed::Accelerating,
        stage: Stage::Early,
        geo: "Global",
        driver: "Tech community",
        priority: false,
        analysis: "Sample data. Developer forums picking up the release.",
        prediction: 79,
        is_new: true,
        volume: 7_200,
    },
    Sample {
        id: "sample-viral",
        title: "Dog skateboarding clip crosses 10M views",
        category: Category::Viral,
        trigger: "Reposted by several large accounts",
        speed: Speed::Accelerating,
        stage: Stage::Mid,
        geo: "Global",
        driver: "Influencers",
        priority: false,
        analysis: "Sample data. Remix wave starting on short-video apps.",
        prediction: 74,
        is_new: false,
        volume: 120_000,
    },
    Sample {
        id: "sample-celebrity",
        title: "Pop star teases surprise stadium tour",
        category: Category::Celebrity,
        trigger: "Cryptic countdown post",
        speed: Speed::Accelerating,
        stage: Stage::Mid,
        geo: "US",
        driver: "Grassroots memes",
        priority: false,
        analysis: "Sample data. Fan accounts decoding hints.",
        prediction: 70,
        is_new: false,
        volume: 65_000,
    },
    Sample {
        id: "sample-cultural",
        title: "Retro board game nights return to cafes",
        category: Category::Cultural,
        trigger: "Local news features",
        speed: Speed::Slow,
        stage: Stage::Late,
        geo: "Global",
        driver: "Media",
        priority: false,
        analysis: "Sample data. Steady interest, limited breakout potential.",
        prediction: 55,
        is_new: false,
        volume: 3_400,
    },
];

/// Fixed catalog served when no live trend survives aggregation, already in
/// ranked order. `captured_at` stamps every entry.
pub fn sample_trends(captured_at: i64) -> Vec<Trend> {
    SAMPLES
        .iter()
        .map(|sample| Trend {
            id: sample.id.to_string(),
            title: sample.title.to_string(),
            category: sample.category,
            trigger: sample.trigger.to_string(),
            speed: sample.speed,
            stage: sample.stage,
            geo: sample.geo.to_string(),
            driver: sample.driver.to_string(),
            priority: sample.priority,
            analysis: sample.analysis.to_string(),
            prediction: sample.prediction,
            prediction_details: None,
            is_new: sample.is_new,
            timestamp: captured_at,
            metrics: TrendMetrics {
                source: "Sample".to_string(),
                volume: Some(sample.volume),
                ..TrendMetrics::default()
            },
            published_at: None,
        })
        .collect()
}
