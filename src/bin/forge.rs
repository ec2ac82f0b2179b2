use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use hidden_image_forge::collaborators::{FsBundleSink, FsImageSource, FsTemplateSource, HttpHintCsvFetcher};
use hidden_image_forge::config::{load_global_config, load_key_records, BuildSettings};
use hidden_image_forge::keys::{generate_key_pairs, load_verification_keys};
use hidden_image_forge::pipeline::Pipeline;

const LOG_TARGET: &str = "bin::forge";

#[derive(Debug, Parser)]
#[command(name = "forge")]
#[command(about = "Build the image-gated puzzle game's per-language HTML bundles", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Directory holding data-global.json, data-keys.json, and level images
    #[arg(long, env = "FORGE_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Directory holding per-language index-<lang>.html templates
    #[arg(long, env = "FORGE_TEMPLATE_DIR", default_value = "base-html")]
    template_dir: PathBuf,

    /// Directory the rendered per-language bundles are written to
    #[arg(long, env = "FORGE_OUTPUT_DIR", default_value = "generated-html")]
    output_dir: PathBuf,

    /// Base URL hint CSVs are fetched from, one request per language code
    #[arg(long, env = "FORGE_CSV_BASE_URL")]
    csv_base_url: Option<String>,

    /// Toggle structured (JSON) logs
    #[arg(long, env = "FORGE_LOG_JSON", default_value_t = false)]
    log_json: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the full build (default if no subcommand is given)
    Build,
    /// Generate `count` ECDSA P-256 key pairs and print them as JSON
    GenerateKeys {
        #[arg(long, default_value_t = 30)]
        count: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json)?;

    let result = match cli.command.unwrap_or(Command::Build) {
        Command::Build => run_build(&cli.data_dir, &cli.template_dir, &cli.output_dir, cli.csv_base_url).await,
        Command::GenerateKeys { count } => run_generate_keys(count),
    };

    if let Err(err) = &result {
        tracing::error!(target: LOG_TARGET, error = %format!("{err:#}"), "build failed");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().flatten_event(true).init();
    } else {
        builder.compact().init();
    }
    Ok(())
}

async fn run_build(
    data_dir: &PathBuf,
    template_dir: &PathBuf,
    output_dir: &PathBuf,
    csv_base_url: Option<String>,
) -> Result<()> {
    let config = load_global_config(data_dir).context("loading data-global.json")?;
    let key_records = load_key_records(data_dir).context("loading data-keys.json")?;
    let verification_keys = load_verification_keys(&key_records, config.level_count)
        .context("loading verification keys")?;

    let csv_base_url = csv_base_url
        .or_else(|| std::env::var("FORGE_CSV_BASE_URL").ok())
        .context("no hint CSV base URL configured (--csv-base-url or FORGE_CSV_BASE_URL)")?;

    let settings = BuildSettings {
        data_dir: data_dir.clone(),
        template_dir: template_dir.clone(),
        output_dir: output_dir.clone(),
        csv_base_url: Some(csv_base_url.clone()),
    };

    let pipeline = Pipeline {
        config,
        settings: settings.clone(),
        images: Arc::new(FsImageSource {
            data_dir: settings.data_dir.clone(),
        }),
        hint_csv: Arc::new(HttpHintCsvFetcher {
            client: reqwest::Client::new(),
            base_url: csv_base_url,
        }),
        templates: Arc::new(FsTemplateSource {
            template_dir: settings.template_dir.clone(),
        }),
        sink: Arc::new(FsBundleSink {
            output_dir: settings.output_dir.clone(),
        }),
    };

    pipeline.run(verification_keys).await.map_err(Into::into)
}

fn run_generate_keys(count: u32) -> Result<()> {
    let pairs = generate_key_pairs(count);
    let json = serde_json::to_string_pretty(&pairs).context("serializing generated key pairs")?;
    println!("{json}");
    Ok(())
}
