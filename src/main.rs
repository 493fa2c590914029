use anyhow::{Context, bail};
use chrono::NaiveDate;
use clap::Parser;
use epiwatch::{CancelToken, Config, Dashboard, Filter, TextPresenter};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about = "Epidemic case-count dashboard in the terminal", long_about = None)]
struct Args {
    /// CSV file with date, region, disease, new_cases, recovered, deaths
    data: PathBuf,

    /// JSON or TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep the query store in this database file instead of memory
    #[arg(long)]
    db: Option<PathBuf>,

    /// Only include these regions (repeatable)
    #[arg(long = "region")]
    regions: Vec<String>,

    /// Only include these diseases (repeatable)
    #[arg(long = "disease")]
    diseases: Vec<String>,

    /// First day to include (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Rows per replay window
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Pause between replay windows in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// SQL to run against the `data` table
    #[arg(short, long)]
    query: Option<String>,

    /// Skip the live replay
    #[arg(long)]
    no_replay: bool,

    /// Stop the replay after this many seconds
    #[arg(long)]
    stop_after: Option<u64>,

    /// Write map hotspots as GeoJSON to this file
    #[arg(long)]
    geojson: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "toml") {
        #[cfg(feature = "toml")]
        {
            return Config::from_toml(&text)
                .with_context(|| format!("parsing {}", path.display()));
        }
        #[cfg(not(feature = "toml"))]
        {
            bail!("TOML configuration requires the `toml` feature");
        }
    }
    Config::from_json(&text).with_context(|| format!("parsing {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "epiwatch=info,warn".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(db) = args.db {
        config = config.with_store_path(db);
    }
    if let Some(chunk_size) = args.chunk_size {
        config.replay = config.replay.with_chunk_size(chunk_size);
    }
    if let Some(delay_ms) = args.delay_ms {
        config.replay = config
            .replay
            .with_delay(Duration::from_millis(delay_ms));
    }
    if let Err(e) = config.validate() {
        bail!("invalid configuration: {}", e);
    }

    let dashboard = Dashboard::open(&args.data, config)
        .with_context(|| format!("loading {}", args.data.display()))?;

    let mut filter = Filter::new()
        .regions(args.regions)
        .diseases(args.diseases);
    if args.from.is_some() || args.to.is_some() {
        let bounds = dashboard.data().date_bounds();
        let start = args.from.or(bounds.map(|b| b.0));
        let end = args.to.or(bounds.map(|b| b.1));
        if let (Some(start), Some(end)) = (start, end) {
            filter = filter.date_range(start, end);
        }
    }

    if let Some(path) = &args.geojson {
        match dashboard.view(&filter).map.to_geojson() {
            Some(collection) => {
                let json = serde_json::to_string_pretty(&collection)?;
                std::fs::write(path, json)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!("Wrote hotspots to {}", path.display());
            }
            None => info!("No coordinates in dataset; GeoJSON not written"),
        }
    }

    let cancel = CancelToken::new();
    if let Some(secs) = args.stop_after {
        let token = cancel.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(secs));
            token.cancel();
        });
    }

    let mut presenter = TextPresenter::new(std::io::stdout().lock());
    let summary = dashboard.run(
        &filter,
        args.query.as_deref(),
        !args.no_replay,
        &mut presenter,
        cancel,
    )?;

    info!(
        "Rendered {} windows over {} filtered rows{}",
        summary.windows_rendered,
        summary.filtered_rows,
        if summary.cancelled { " (stopped early)" } else { "" }
    );
    Ok(())
}
