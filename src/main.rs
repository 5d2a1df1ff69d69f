use campaign_advisor::config::AdvisorConfig;
use campaign_advisor::model::{training::load_records, Trainer};
use campaign_advisor::{server, RecommendationEngine};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "campaign-advisor", about = "Ad campaign platform recommendations")]
struct Cli {
    /// TOML config file; defaults to ADVISOR_CONFIG_PATH or config/advisor.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    Recommend(RecommendArgs),
    Serve(ServeArgs),
    Train(TrainArgs),
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug, Clone, Default)]
struct RecommendArgs {
    /// Campaign JSON file, or `-` for stdin
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long)]
    model: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug, Clone, Default)]
struct ServeArgs {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    model: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug, Clone)]
struct TrainArgs {
    /// Historical campaign records: CSV with a header row, or a JSON array
    #[arg(long)]
    data: PathBuf,
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long)]
    n_estimators: Option<usize>,
    #[arg(long)]
    max_depth: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug, Clone)]
struct InitConfigArgs {
    #[arg(long, default_value = "config/advisor.toml")]
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
    let (mut config, config_path) = AdvisorConfig::load(cli.config)?;
    if let Some(path) = config_path.filter(|path| path.exists()) {
        info!(path = %path.display(), "Loaded config");
    }

    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Recommend(args) => {
            if let Some(model) = args.model {
                config.model.path = model;
            }
            if args.seed.is_some() {
                config.scoring.seed = args.seed;
            }
            run_recommend(&config, args.input.as_deref())
        }
        Command::Serve(args) => {
            if let Some(host) = args.host {
                config.server.host = host;
            }
            if let Some(port) = args.port {
                config.server.port = port;
            }
            if let Some(model) = args.model {
                config.model.path = model;
            }
            if args.seed.is_some() {
                config.scoring.seed = args.seed;
            }
            let engine = RecommendationEngine::from_config(&config);
            server::serve(engine, &config.server).await
        }
        Command::Train(args) => {
            if let Some(n_estimators) = args.n_estimators {
                config.training.n_estimators = n_estimators;
            }
            if let Some(max_depth) = args.max_depth {
                config.training.max_depth = max_depth;
            }
            if let Some(seed) = args.seed {
                config.training.seed = seed;
            }
            let out = args.out.unwrap_or_else(|| config.model.path.clone());
            run_train(&config, &args.data, &out)
        }
        Command::InitConfig(args) => {
            if args.path.exists() && !args.force {
                return Err(format!(
                    "{} already exists; pass --force to overwrite",
                    args.path.display()
                ));
            }
            config.write(&args.path)?;
            println!("Wrote config to {}", args.path.display());
            Ok(())
        }
    }
}

fn run_recommend(config: &AdvisorConfig, input: Option<&Path>) -> Result<(), String> {
    let raw = read_input(input)?;
    let payload: Value =
        serde_json::from_str(&raw).map_err(|err| format!("invalid campaign JSON: {}", err))?;

    let engine = RecommendationEngine::from_config(config);
    let recommendation = engine.recommend(&payload).map_err(|err| err.to_string())?;
    let rendered = serde_json::to_string_pretty(&recommendation)
        .map_err(|err| format!("failed to render recommendation: {}", err))?;
    println!("{}", rendered);
    Ok(())
}

fn run_train(config: &AdvisorConfig, data: &Path, out: &Path) -> Result<(), String> {
    let records = load_records(data).map_err(|err| err.to_string())?;
    let (model, report) = Trainer::new(config.training.clone())
        .train(&records)
        .map_err(|err| format!("training failed: {}", err))?;
    model
        .save(out)
        .map_err(|err| format!("failed to save model: {}", err))?;

    println!(
        "Trained on {} records ({} held out)",
        report.train_count, report.test_count
    );
    println!(
        "Platform accuracy {:.3} | score MSE {:.4} | CTR MSE {:.6} | conversion MSE {:.6}",
        report.platform_accuracy, report.score_mse, report.ctr_mse, report.conversion_mse
    );
    println!("Model saved to {}", out.display());
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String, String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .map_err(|err| format!("failed to read {}: {}", path.display(), err)),
        _ => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|err| format!("failed reading stdin: {}", err))?;
            if buffer.trim().is_empty() {
                return Err("missing campaign JSON: pass --input or pipe stdin".to_string());
            }
            Ok(buffer)
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campaign_advisor=info,tower_http=info".into()),
        )
        .with_writer(io::stderr)
        .init();
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
