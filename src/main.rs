use clap::Parser;
use georank_api::RestApi;
use georank_core::pipeline::run_all;
use georank_storage::StorageManager;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Business recommendations by category overlap, distance and review credibility
#[derive(Parser, Debug)]
#[command(name = "georank")]
#[command(about = "Serve business recommendations over HTTP", long_about = None)]
struct Args {
    /// Path to the data directory
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// HTTP API port
    #[arg(long, default_value_t = 8080)]
    http_port: u16,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Business export to ingest (JSON Lines)
    #[arg(long)]
    businesses: Option<PathBuf>,

    /// Review export to ingest (JSON Lines)
    #[arg(long)]
    reviews: Option<PathBuf>,

    /// Run every batch stage before serving, then save a snapshot
    #[arg(long)]
    preprocess: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting GeoRank v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", args.data_dir);

    let storage = Arc::new(StorageManager::new(&args.data_dir)?);
    info!("Storage initialized");

    if let Some(path) = &args.businesses {
        storage.ingest_businesses(path)?;
    }
    if let Some(path) = &args.reviews {
        storage.ingest_reviews(path)?;
    }

    if args.preprocess {
        for report in run_all(&storage.catalog())? {
            info!("{}: {} records in {} ms", report.stage, report.records, report.elapsed_ms);
        }
        storage.save()?;
    }

    let stages = storage.catalog().stage_status();
    if !(stages.reviews_adjusted && stages.credibility_aggregated && stages.categories_split) {
        info!("Batch stages pending: {:?}; POST /admin/preprocess before querying", stages);
    }

    let storage_http = storage.clone();
    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(storage_http, http_port).await {
                tracing::error!("HTTP server error: {}", e);
            }
        })
    });

    info!("GeoRank started successfully");
    info!("HTTP API: http://localhost:{}/", args.http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
