//! Field map composer.
//!
//! Builds every product in a YAML product file (or one named product) and
//! writes `<output-dir>/<product>.png` for each.

use std::path::PathBuf;
use std::sync::Arc;

use acquisition::ReqwestFetcher;
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use mapper::{load_config, ProductPipeline};

#[derive(Parser, Debug)]
#[command(name = "mapper")]
#[command(about = "Compose field maps from basemaps and survey overlays")]
struct Args {
    /// Product configuration file
    #[arg(short, long, default_value = "config/maps.yaml")]
    config: PathBuf,

    /// Build only this product (default: all configured)
    #[arg(short, long)]
    product: Option<String>,

    /// Directory for rendered PNGs
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Static map API key for satellite basemaps
    #[arg(long, env = "SATELLITE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Keep going after a product fails
    #[arg(long)]
    keep_going: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!(config = %args.config.display(), "Starting mapper");

    let config = load_config(&args.config)?;
    info!(
        products = ?config.products.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
        "Loaded configuration"
    );

    let products = match &args.product {
        Some(name) => vec![config
            .product(name)
            .with_context(|| format!("No product named {} in {:?}", name, args.config))?],
        None => config.products.iter().collect(),
    };

    let fetcher = Arc::new(ReqwestFetcher::new(&config.acquisition)?);
    let pipeline = ProductPipeline::new(
        fetcher,
        config.acquisition.clone(),
        config.render.clone(),
        args.api_key.clone(),
    )
    .with_grid(config.grid.clone());

    let mut failed = 0usize;
    for product in products {
        match pipeline.run(product, &args.output_dir).await {
            Ok(path) => info!(product = %product.name, path = %path.display(), "Product complete"),
            Err(e) if args.keep_going => {
                error!(product = %product.name, error = ?e, "Product failed");
                failed += 1;
            }
            Err(e) => return Err(e),
        }
    }

    anyhow::ensure!(failed == 0, "{} product(s) failed", failed);
    info!("All products complete");
    Ok(())
}
