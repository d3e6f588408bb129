use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, bail};
use clap::{Args as ClapArgs, Parser, Subcommand};
use futures::{StreamExt, stream::BoxStream};
use stallscan_config::{
    AnalyticsTransportKind, Config, ConfigLoader, StoreKind, validation,
};
use stallscan_core::{
    ScanReport, ScanSession,
    detector::DetectorEvent,
    reporter::{
        AnalyticsSink, ChannelAnalyticsSink, HttpAnalyticsTransport,
        NoopAnalyticsSink, TracingTransport,
    },
    store::{HttpRecordStore, InMemoryRecordStore, RecordStore},
};
use stallscan_model::{EventId, MarkerId};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "stallscanctl", version)]
#[command(about = "Resolve scanned stall markers against the record store")]
struct Cli {
    /// Configuration file (TOML, or JSON by extension)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scan markers given as arguments, or one per line on stdin
    Scan(ScanArgs),
    /// Load and validate configuration, then print the effective values
    CheckConfig,
}

#[derive(ClapArgs, Debug, Clone)]
struct ScanArgs {
    /// Event the user is browsing (overrides session.event_id)
    #[arg(long, value_parser = parse_event_id)]
    event: Option<EventId>,

    /// JSON fixture for the in-memory store (overrides config)
    #[arg(long, conflicts_with = "store_url")]
    fixture: Option<PathBuf>,

    /// Base URL of the document-database REST API (overrides config)
    #[arg(long)]
    store_url: Option<Url>,

    /// Print one JSON report per line instead of text
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Marker payloads; read from stdin when omitted
    #[arg(value_parser = parse_marker_id)]
    markers: Vec<MarkerId>,
}

fn parse_marker_id(raw: &str) -> Result<MarkerId, String> {
    MarkerId::new(raw).map_err(|err| err.to_string())
}

fn parse_event_id(raw: &str) -> Result<EventId, String> {
    EventId::new(raw).map_err(|err| err.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,stallscan_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Scan(args) => run_scan(config, args).await,
        Command::CheckConfig => {
            let rendered = config
                .to_toml()
                .context("failed to render effective configuration")?;
            print!("{rendered}");
            Ok(())
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = path {
        loader = loader.with_config_path(path);
    }
    let load = loader.load().context("failed to load configuration")?;

    if load.config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &load.config.metadata.config_path {
        info!(path = %path.display(), "configuration loaded");
    }
    for warning in &load.warnings.items {
        match &warning.hint {
            Some(hint) => warn!(hint = %hint, "{}", warning.message),
            None => warn!("{}", warning.message),
        }
    }
    Ok(load.config)
}

async fn run_scan(mut config: Config, args: ScanArgs) -> anyhow::Result<()> {
    if let Some(path) = args.fixture {
        config.store.kind = StoreKind::Memory;
        config.store.fixture_path = Some(path);
    }
    if let Some(url) = args.store_url {
        config.store.kind = StoreKind::Http;
        config.store.base_url = Some(url);
    }
    validation::apply_guard_rails(&config)
        .context("command-line overrides produced an invalid configuration")?;

    let Some(event_id) = args.event.or_else(|| config.session.event_id.clone())
    else {
        bail!("no event selected; pass --event or set session.event_id");
    };

    let store = build_store(&config)?;
    let sink = build_analytics(&config)?;
    let session: ScanSession =
        ScanSession::new(store, event_id, config.session.settings(), sink);

    let detections: BoxStream<'static, DetectorEvent> = if args.markers.is_empty()
    {
        stdin_detections()
    } else {
        futures::stream::iter(args.markers)
            .map(DetectorEvent::Detected)
            .boxed()
    };

    let json = args.json;
    let started = Instant::now();
    let summary = session
        .drive(detections, |report| print_report(&report, json))
        .await;

    let stats = session.stats();
    info!(
        detected = summary.detected,
        completed = summary.completed,
        suppressed = summary.suppressed,
        over_budget = stats.over_budget,
        cache_hits = stats.cache.hits,
        cache_misses = stats.cache.misses,
        elapsed_ms = saturating_millis(started.elapsed()),
        "scan run finished"
    );
    if let Some(counters) = stats.analytics {
        info!(
            enqueued = counters.enqueued,
            dropped = counters.dropped,
            "analytics queue totals"
        );
    }
    Ok(())
}

fn saturating_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

fn build_store(config: &Config) -> anyhow::Result<Arc<dyn RecordStore>> {
    let store: Arc<dyn RecordStore> = match config.store.kind {
        StoreKind::Memory => match &config.store.fixture_path {
            Some(path) => Arc::new(
                InMemoryRecordStore::from_fixture_file(path)
                    .context("failed to load store fixture")?,
            ),
            None => Arc::new(InMemoryRecordStore::new()),
        },
        StoreKind::Http => {
            let Some(base_url) = config.store.base_url.clone() else {
                bail!("store.kind = \"http\" requires store.base_url");
            };
            Arc::new(
                HttpRecordStore::new(base_url, config.session.fetch_timeout)
                    .context("failed to build HTTP record store")?,
            )
        }
    };
    Ok(store)
}

fn build_analytics(config: &Config) -> anyhow::Result<Arc<dyn AnalyticsSink>> {
    let analytics = &config.analytics;
    if !analytics.enabled {
        return Ok(Arc::new(NoopAnalyticsSink));
    }

    let channel = match analytics.transport {
        AnalyticsTransportKind::Log => ChannelAnalyticsSink::spawn(
            Arc::new(TracingTransport),
            analytics.queue_capacity,
        ),
        AnalyticsTransportKind::Http => {
            let Some(endpoint) = analytics.endpoint.clone() else {
                bail!("analytics.transport = \"http\" requires analytics.endpoint");
            };
            let transport = HttpAnalyticsTransport::new(endpoint, analytics.timeout)
                .context("failed to build analytics transport")?;
            ChannelAnalyticsSink::spawn(Arc::new(transport), analytics.queue_capacity)
        }
    };
    Ok(Arc::new(channel))
}

fn stdin_detections() -> BoxStream<'static, DetectorEvent> {
    let lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    lines
        .filter_map(|line| async move {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!("failed to read detection from stdin: {}", err);
                    return None;
                }
            };
            if line.trim().is_empty() {
                return None;
            }
            match MarkerId::new(&line) {
                Ok(marker_id) => Some(DetectorEvent::Detected(marker_id)),
                Err(err) => {
                    warn!("skipping unreadable marker {:?}: {}", line, err);
                    None
                }
            }
        })
        .boxed()
}

fn print_report(report: &ScanReport, json: bool) {
    if json {
        match serde_json::to_string(report) {
            Ok(line) => println!("{line}"),
            Err(err) => warn!("failed to serialize scan report: {}", err),
        }
        return;
    }

    let notice = &report.notice;
    let retry = if notice.retry_hint { " (retry)" } else { "" };
    println!(
        "{} {} [{}] {}: {}{} {}ms",
        notice.severity,
        report.marker_id,
        report.outcome.kind(),
        notice.title,
        notice.message,
        retry,
        report.elapsed_ms
    );
}
