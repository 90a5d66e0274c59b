use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use feedwatch::{
    actors::MonitorEvent,
    config::{Config, StorageConfig, read_config_file},
    engine::{Engine, EngineContext},
    feed::ScraperFeedClient,
    storage::{MemorySessionStore, SessionStore},
    util,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(version, about = "Live activity monitoring hub")]
struct Args {
    /// Config file
    #[arg(short)]
    file: String,

    /// Log more (-v for debug, -vv for trace)
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let filter = filter::Targets::new().with_targets(vec![
        ("feedwatch", level),
        ("feedwatch_hub", level),
        ("tower_http", LevelFilter::INFO),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let args = Args::parse();
    init(args.verbose);
    trace!("started with args: {args:?}");

    let config = read_config_file(&args.file)
        .with_context(|| format!("failed to read config file {}", args.file))?;

    let store = open_store(&config).await?;
    let engine = build_engine(&config, Arc::clone(&store))?;

    spawn_event_logger(engine.subscribe());
    register_targets(&engine, &config).await;
    spawn_api(&engine, &config).await?;

    info!("hub running, press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    info!("shutting down, archiving active sessions");
    for (id, result) in engine.stop_all().await {
        match result {
            Ok(Some(snapshot)) => debug!("archived {} as {}", snapshot.display_name, snapshot.session_id),
            Ok(None) => {}
            Err(e) => error!("failed to archive {id}: {e}"),
        }
    }

    store.close().await.context("failed to close session store")?;
    Ok(())
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn SessionStore>> {
    match config.storage.clone().unwrap_or_default() {
        StorageConfig::None => {
            info!("sessions are kept in memory only");
            Ok(Arc::new(MemorySessionStore::new()))
        }
        #[cfg(feature = "storage-sqlite")]
        StorageConfig::Sqlite { path } => {
            let store = feedwatch::storage::sqlite::SqliteSessionStore::new(&path)
                .await
                .with_context(|| format!("failed to open session store {}", path.display()))?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "storage-sqlite"))]
        StorageConfig::Sqlite { .. } => {
            anyhow::bail!("sqlite storage requested but the storage-sqlite feature is disabled")
        }
    }
}

fn build_engine(config: &Config, store: Arc<dyn SessionStore>) -> anyhow::Result<Engine> {
    let feed_url = util::get_feed_url().unwrap_or_else(|| config.feed.url.clone());
    debug!("using feed at {feed_url}");

    let feed = ScraperFeedClient::new(feed_url, config.feed.timeout())
        .context("failed to build feed client")?;
    let settings = config.monitoring.settings()?;

    Ok(Engine::new(EngineContext {
        feed: Arc::new(feed),
        store,
        settings,
    }))
}

/// Register and start every configured target; failures are logged, not fatal
async fn register_targets(engine: &Engine, config: &Config) {
    for target in &config.targets {
        let id = match engine.add_target(&target.name, target.kind).await {
            Ok(id) => id,
            Err(e) => {
                warn!("skipping {} target '{}': {e}", target.kind, target.name);
                continue;
            }
        };

        if let Err(e) = engine.start_monitoring(id).await {
            warn!("failed to start {}: {e}", target.name);
        }
    }
}

#[cfg(feature = "api")]
async fn spawn_api(engine: &Engine, config: &Config) -> anyhow::Result<()> {
    use feedwatch::api::{ApiConfig, ApiState, spawn_api_server};

    let Some(section) = &config.api else {
        debug!("no api section configured, control API disabled");
        return Ok(());
    };

    let api_config = ApiConfig {
        bind_addr: section.bind,
        auth_token: util::get_api_token().or_else(|| section.token.clone()),
        ..ApiConfig::default()
    };

    if api_config.auth_token.is_none() {
        warn!("control API runs without authentication");
    }

    spawn_api_server(api_config, ApiState::new(engine.clone())).await?;
    Ok(())
}

#[cfg(not(feature = "api"))]
async fn spawn_api(_engine: &Engine, config: &Config) -> anyhow::Result<()> {
    if config.api.is_some() {
        warn!("api section ignored, built without the api feature");
    }
    Ok(())
}

fn spawn_event_logger(mut events: broadcast::Receiver<MonitorEvent>) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(MonitorEvent::TargetUpdated {
                    display_name,
                    new_items,
                    total_items,
                    ..
                }) if new_items > 0 => {
                    info!("{display_name}: {new_items} new ({total_items} total)");
                }
                Ok(MonitorEvent::FetchFailed {
                    display_name,
                    error,
                    ..
                }) => warn!("{display_name}: fetch failed: {error}"),
                Ok(MonitorEvent::SessionArchived {
                    display_name,
                    session_id,
                    ..
                }) => info!("{display_name}: session {session_id} archived"),
                Ok(event) => trace!("event: {event:?}"),
                Err(RecvError::Lagged(skipped)) => debug!("event logger lagged by {skipped}"),
                Err(RecvError::Closed) => break,
            }
        }
    });
}
