mod api;
mod server;

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use trend_radar::config::AppConfig;
use trend_radar::error::NotifyError;
use trend_radar::notify::{should_alert, NotificationSink, TelegramSink};
use trend_radar::{
    classify, collectors, format_number, now_ms, Aggregator, Category, PredictionEngine,
    ScoringInput, Speed, Stage,
};

#[derive(Parser)]
#[command(name = "trend-radar", about = "Breakout trend aggregator")]
struct Cli {
    /// Path to a TOML config file (defaults to config/trends.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Aggregate once and print the ranked trends.
    Scan(ScanArgs),
    /// Serve the aggregate endpoint over HTTP.
    Serve(ServeArgs),
    /// Score a single hand-described candidate.
    Predict(PredictArgs),
    /// Write the default config file.
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug, Clone, Default)]
struct ScanArgs {
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long)]
    json: bool,
    /// Send alert-worthy trends to Telegram.
    #[arg(long)]
    alert: bool,
}

#[derive(Args, Debug, Clone)]
struct ServeArgs {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug, Clone)]
struct PredictArgs {
    #[arg(long)]
    title: String,
    #[arg(long, default_value = "accelerating")]
    speed: String,
    #[arg(long, default_value = "early")]
    stage: String,
    /// Classified from the title when omitted.
    #[arg(long)]
    category: Option<String>,
    #[arg(long, default_value = "Media")]
    driver: String,
    #[arg(long)]
    volume: Option<u64>,
    #[arg(long)]
    comments: Option<u64>,
    #[arg(long)]
    source: Option<String>,
    #[arg(long)]
    url: Option<String>,
    #[arg(long, default_value_t = 1)]
    sources: usize,
    #[arg(long)]
    new: bool,
    #[arg(long, default_value_t = 0.0)]
    age_hours: f64,
}

#[derive(Args, Debug, Clone)]
struct InitConfigArgs {
    #[arg(long, default_value = "config/trends.toml")]
    path: PathBuf,
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Scan(ScanArgs::default()));

    match command {
        Command::InitConfig(args) => run_init_config(args),
        command => {
            let (config, path) = AppConfig::load(cli.config)?;
            if let Some(path) = path.filter(|path| path.exists()) {
                info!("Config loaded - path={}", path.display());
            }
            match command {
                Command::Scan(args) => run_scan(&config, args).await,
                Command::Serve(args) => run_serve(&config, args).await,
                Command::Predict(args) => run_predict(&config, args),
                Command::InitConfig(_) => Ok(()),
            }
        }
    }
}

async fn run_scan(config: &AppConfig, args: ScanArgs) -> Result<(), String> {
    let aggregator = Aggregator::from_config(config);
    let collectors = collectors::from_config(&config.sources);

    let trends = aggregator
        .aggregate(&collectors, args.limit)
        .await
        .map_err(|err| format!("aggregation failed: {}", err))?;

    if args.json {
        let payload = serde_json::to_string_pretty(&trends)
            .map_err(|err| format!("failed to serialize trends: {}", err))?;
        println!("{}", payload);
    } else {
        for (rank, trend) in trends.iter().enumerate() {
            let tier = trend
                .prediction_details
                .as_ref()
                .map(|details| details.tier.label())
                .unwrap_or("-");
            println!(
                "{:>2}. [{:>2}] {:<9} {}{} ({} | {} | {})",
                rank + 1,
                trend.prediction,
                tier,
                if trend.priority { "* " } else { "" },
                trend.title,
                trend.category.label(),
                trend.speed.label(),
                trend.metrics.source
            );
        }
    }

    if args.alert {
        let sink = TelegramSink::from_env()
            .ok_or_else(|| NotifyError::NotConfigured("telegram".to_string()).to_string())?;
        for trend in trends.iter().filter(|trend| should_alert(trend)) {
            if let Err(err) = sink.send(trend).await {
                warn!("Alert failed - trend={}, error={}", trend.id, err);
            }
        }
    }

    Ok(())
}

async fn run_serve(config: &AppConfig, args: ServeArgs) -> Result<(), String> {
    let state = server::AppState {
        aggregator: Arc::new(Aggregator::from_config(config)),
        collectors: Arc::new(collectors::from_config(&config.sources)),
        sink: TelegramSink::from_env().map(|sink| Arc::new(sink) as Arc<dyn NotificationSink>),
    };
    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    server::serve(state, &host, port).await
}

fn run_predict(config: &AppConfig, args: PredictArgs) -> Result<(), String> {
    let speed =
        Speed::from_str(&args.speed).ok_or_else(|| format!("invalid speed: {}", args.speed))?;
    let stage =
        Stage::from_str(&args.stage).ok_or_else(|| format!("invalid stage: {}", args.stage))?;
    let category = match args.category.as_deref() {
        Some(value) => {
            Category::from_str(value).ok_or_else(|| format!("invalid category: {}", value))?
        }
        None => classify(&args.title),
    };

    let now = now_ms();
    let mut input = ScoringInput::new(
        speed,
        stage,
        category,
        now - (args.age_hours.max(0.0) * 3_600_000.0) as i64,
    );
    input.title = args.title;
    input.driver = args.driver;
    input.is_new = args.new;
    input.volume = args.volume;
    input.comments = args.comments;
    input.source = args.source;
    input.url = args.url;
    input.source_count = Some(args.sources);

    let engine = PredictionEngine::new(config.prediction.weights.clone());
    let prediction = engine.predict(&input, now);

    println!(
        "Breakout score: {} ({} | {})",
        prediction.score,
        prediction.tier.label(),
        prediction.confidence.label()
    );
    println!("Category: {}", category.label());
    if let Some(volume) = input.volume {
        println!("Volume: {}", format_number(volume as f64));
    }
    println!("\nFactors:");
    for (factor, value) in prediction.factors.iter() {
        println!("  {}: {:.2}", factor.label(), value);
    }
    if !prediction.reasoning.is_empty() {
        println!("\nReasoning:");
        for reason in &prediction.reasoning {
            println!("- {}", reason);
        }
    }

    Ok(())
}

fn run_init_config(args: InitConfigArgs) -> Result<(), String> {
    if args.path.exists() && !args.force {
        return Err(format!(
            "{} already exists (pass --force to overwrite)",
            args.path.display()
        ));
    }
    AppConfig::default().write(&args.path)?;
    println!("Wrote {}", args.path.display());
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
