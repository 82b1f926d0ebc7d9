use std::env;

/// Runtime configuration, sourced from environment variables (a
/// `.env` file is honored) with sane defaults. The CLI overrides the
/// commonly tweaked ones.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub ollama_model: String,
    pub check_interval_secs: u64,
    pub min_notify_gap_secs: i64,
    pub advisory_timeout_secs: u64,
    pub channel_timeout_secs: u64,
    pub recent_window_limit: i64,
    pub flush_max_events: i64,
    pub flush_max_age_secs: i64,
    pub flush_queue_capacity: usize,
    pub strategy_order: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./data/windows.db".to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2:3b".to_string()),
            check_interval_secs: env_parsed("CHECK_INTERVAL_SECS", 60),
            min_notify_gap_secs: env_parsed("MIN_NOTIFY_GAP_SECS", 600),
            advisory_timeout_secs: env_parsed("ADVISORY_TIMEOUT_SECS", 120),
            channel_timeout_secs: env_parsed("CHANNEL_TIMEOUT_SECS", 15),
            recent_window_limit: env_parsed("RECENT_WINDOW_LIMIT", 50),
            flush_max_events: env_parsed("FLUSH_MAX_EVENTS", 50),
            flush_max_age_secs: env_parsed("FLUSH_MAX_AGE_SECS", 10),
            flush_queue_capacity: env_parsed("FLUSH_QUEUE_CAPACITY", 64),
            strategy_order: env::var("STRATEGY_ORDER")
                .unwrap_or_else(|_| "pomodoro,advisory".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
