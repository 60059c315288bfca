// Completed-game records and the seam to whatever keeps them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{GameMode, GameState};
use crate::error::StoreError;
use crate::math_facts::FactPair;

/// One primary-phase answer as the history store keeps it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub factor_a: u8,
    pub factor_b: u8,
    pub is_correct: bool,
    pub elapsed_ms: u32,
}

impl RoundOutcome {
    pub fn pair(&self) -> FactPair {
        FactPair::new(self.factor_a, self.factor_b)
    }
}

/// A finished game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub mode: GameMode,
    pub score: i32,
    pub completed_at: DateTime<Utc>,
    /// None for legacy records saved before per-round detail existed
    #[serde(default)]
    pub rounds: Option<Vec<RoundOutcome>>,
}

impl GameRecord {
    /// Build a record from a completed game; None if the game has not finished
    pub fn from_state(state: &GameState, completed_at: DateTime<Utc>) -> Option<Self> {
        let rounds = state.primary_outcomes()?;
        Some(Self {
            mode: state.mode,
            score: state.score,
            completed_at,
            rounds: Some(rounds),
        })
    }

    pub fn has_detail(&self) -> bool {
        self.rounds.as_ref().is_some_and(|r| !r.is_empty())
    }
}

/// The player's profile store as seen from the game core
pub trait HistoryStore {
    /// Up to `limit` games, most recent first
    fn recent_games(&self, limit: usize) -> Vec<GameRecord>;

    fn record_game(&mut self, record: GameRecord) -> Result<(), StoreError>;
}

/// Keeps games in memory for the lifetime of the process
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistory {
    games: Vec<GameRecord>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_games(games: Vec<GameRecord>) -> Self {
        Self { games }
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

impl HistoryStore for InMemoryHistory {
    fn recent_games(&self, limit: usize) -> Vec<GameRecord> {
        let mut games = self.games.clone();
        games.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        games.truncate(limit);
        games
    }

    fn record_game(&mut self, record: GameRecord) -> Result<(), StoreError> {
        if !record.has_detail() {
            return Err(StoreError::MissingRounds);
        }
        self.games.push(record);
        Ok(())
    }
}
