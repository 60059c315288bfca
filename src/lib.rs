//! Gameplay core of a timed times-table drill.
//!
//! A game is ten multiplication facts with one number hidden in each. The
//! [`engine`] walks the player through them once, then replays every missed
//! fact until it has been answered correctly. [`scoring`] turns correctness and
//! speed into points, [`generator`] picks the facts, [`analyzer`] finds the
//! facts a player keeps getting wrong so practice games can target them, and
//! [`clock`] paints the per-round countdown.

pub mod analyzer;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod history;
pub mod math_facts;
pub mod scoring;
pub mod session;

pub use analyzer::{rank, rank_by_ratio, tricky_numbers, ChallengeAnalyzer, ChallengingPair, RankingPolicy};
pub use clock::{
    ClockSettings, FrameScheduler, MonotonicClock, RoundClock, SystemClock, TickHandle, TimerDisplay, TimerFrame,
    TimerTone,
};
pub use config::DrillConfig;
pub use engine::{reduce, Action, Attempt, GameMode, GameState, GameStatus, Phase, Round, RoundEngine};
pub use error::{ConfigError, DrillError, StoreError};
pub use generator::{generate_practice, generate_primary, FormulaSet};
pub use history::{GameRecord, HistoryStore, InMemoryHistory, RoundOutcome};
pub use math_facts::{FactPair, Formula, HiddenPosition};
pub use scoring::{ScoreTier, ScoringPolicy};
pub use session::DrillSession;

// ==================== CONSTANTS ====================

/// Facts per game
pub const ROUNDS_PER_GAME: usize = 10;

/// Default speed tiers as (max_ms, points), ascending
/// Fast answers (≤2s) earn the most; anything past 5s earns nothing
pub const DEFAULT_SCORE_TIERS: &[(u32, i32)] = &[
    (2000, 5),  // Fast
    (3000, 3),  // Steady
    (5000, 1),  // Slow
];

/// Points for a wrong primary-phase answer in a standard game
pub const DEFAULT_WRONG_PENALTY: i32 = -1;

/// Countdown shown for each round
pub const DEFAULT_COUNTDOWN_MS: u32 = 5000;

/// Tick interval with full motion (~60 fps)
pub const DEFAULT_FRAME_INTERVAL_MS: u32 = 16;

/// Tick interval and display step when reduced motion is requested
pub const REDUCED_MOTION_STEP_MS: u32 = 500;

/// Games the analyzer looks back over
pub const DEFAULT_HISTORY_WINDOW: usize = 5;

/// Slower-than-average policy: how many times the game mean counts as slow
pub const DEFAULT_SLOW_RATIO: f64 = 1.5;

/// Most factors shown in the "tricky numbers" hint
pub const TRICKY_NUMBER_CAP: usize = 8;
