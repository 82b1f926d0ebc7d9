use anyhow::Result;
use chrono::Duration as ChronoDuration;
use clap::Parser;
use dotenv::dotenv;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use break_sentinel::buffer::{spawn_flush_ticker, spawn_persist_worker, ActivityBuffer, BufferConfig};
use break_sentinel::capture::spawn_capture;
use break_sentinel::config::Config;
use break_sentinel::llm::{LlmClient, OllamaClient};
use break_sentinel::notify::{BreakNotifier, DesktopNotifier, LoggingNotifier, NotificationDispatcher};
use break_sentinel::scheduler::AnalysisScheduler;
use break_sentinel::store::{MemoryWindowStore, SqliteWindowStore, WindowStore};
use break_sentinel::strategy::StrategyChain;
use break_sentinel::throttle::ThrottleGate;

#[derive(Parser, Debug)]
#[command(name = "break-sentinel", about = "Activity intensity monitor with break notifications")]
struct Cli {
    /// Window database URL, e.g. sqlite:./data/windows.db
    #[arg(long)]
    database_url: Option<String>,

    /// Advisory model name served by Ollama
    #[arg(long)]
    model: Option<String>,

    /// Seconds between analysis cycles
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Comma-separated strategy order, e.g. "pomodoro,advisory"
    #[arg(long)]
    strategy_order: Option<String>,

    /// Run a single analysis cycle and exit
    #[arg(long)]
    once: bool,

    /// Keep windows in memory instead of SQLite
    #[arg(long)]
    memory_db: bool,

    /// Skip the OS input hook (headless runs)
    #[arg(long)]
    no_capture: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }
    if let Some(model) = cli.model {
        config.ollama_model = model;
    }
    if let Some(secs) = cli.interval_secs {
        config.check_interval_secs = secs;
    }
    if let Some(order) = cli.strategy_order {
        config.strategy_order = order
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    let store: Arc<dyn WindowStore> = if cli.memory_db {
        info!("using in-memory window store");
        Arc::new(MemoryWindowStore::new())
    } else {
        Arc::new(SqliteWindowStore::new(&config.database_url).await?)
    };

    let buffer = Arc::new(ActivityBuffer::new(BufferConfig {
        max_events: config.flush_max_events,
        max_age: ChronoDuration::seconds(config.flush_max_age_secs),
        queue_capacity: config.flush_queue_capacity,
    }));

    if cli.no_capture {
        info!("input capture disabled");
    } else {
        spawn_capture(buffer.clone());
    }
    spawn_flush_ticker(buffer.clone());
    spawn_persist_worker(buffer.clone(), store.clone());

    let llm: Arc<dyn LlmClient> = Arc::new(OllamaClient::new(&config.ollama_model)?);
    let chain = StrategyChain::from_names(
        &config.strategy_order,
        llm,
        Duration::from_secs(config.advisory_timeout_secs),
    )?;

    let dispatcher = NotificationDispatcher::new(
        vec![
            Arc::new(LoggingNotifier) as Arc<dyn BreakNotifier>,
            Arc::new(DesktopNotifier),
        ],
        Duration::from_secs(config.channel_timeout_secs),
    );

    let scheduler = Arc::new(AnalysisScheduler::new(
        store,
        chain,
        ThrottleGate::new(ChronoDuration::seconds(config.min_notify_gap_secs)),
        dispatcher,
        Duration::from_secs(config.check_interval_secs),
        config.recent_window_limit,
    ));

    // Downstream hook consumer: keeps a trace of everything dispatched.
    let mut dispatched = scheduler.subscribe();
    tokio::spawn(async move {
        while let Ok(recommendation) = dispatched.recv().await {
            debug!(
                urgency = ?recommendation.urgency,
                minutes = recommendation.suggested_break_minutes,
                "recommendation dispatched"
            );
        }
    });

    if cli.once {
        let outcome = scheduler.trigger_now().await;
        info!(?outcome, "manual analysis cycle complete");
        return Ok(());
    }

    scheduler.run().await;
    Ok(())
}
