use thiserror::Error;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Score tier table cannot be empty")]
    EmptyTiers,

    #[error("Score tiers must be strictly ascending by max_ms (tier {0} is out of order)")]
    TiersNotAscending(usize),

    #[error("Invalid countdown_ms: {0}. Must be positive")]
    InvalidCountdown(u32),

    #[error("Invalid tick interval: {0}ms. Must be positive")]
    InvalidTickInterval(u32),

    #[error("Invalid history_window: {0}. Must be at least 1")]
    InvalidHistoryWindow(usize),

    #[error("Invalid slow_ratio: {0}. Must be greater than 1.0")]
    InvalidSlowRatio(f64),
}

/// Failures reported by a history store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Game record has no per-round outcomes")]
    MissingRounds,

    #[error("History store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum DrillError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
