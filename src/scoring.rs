// Speed-tier scoring for a single answer.

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_WRONG_PENALTY, DEFAULT_SCORE_TIERS};

/// One latency bracket: answers at or under `max_ms` earn `points`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTier {
    pub max_ms: u32,
    pub points: i32,
}

/// Correctness + latency → points
///
/// Tiers are checked in ascending order and the first bracket the latency fits
/// into wins. A correct answer slower than every tier earns nothing; a wrong
/// answer always earns the fixed penalty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub tiers: Vec<ScoreTier>,
    pub wrong_penalty: i32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            tiers: DEFAULT_SCORE_TIERS
                .iter()
                .map(|&(max_ms, points)| ScoreTier { max_ms, points })
                .collect(),
            wrong_penalty: DEFAULT_WRONG_PENALTY,
        }
    }
}

impl ScoringPolicy {
    pub fn score(&self, is_correct: bool, elapsed_ms: u32) -> i32 {
        if !is_correct {
            return self.wrong_penalty;
        }
        self.tier_index(elapsed_ms)
            .map(|idx| self.tiers[idx].points)
            .unwrap_or(0)
    }

    /// Index of the first tier this latency fits into, None when slower than all
    pub fn tier_index(&self, elapsed_ms: u32) -> Option<usize> {
        self.tiers.iter().position(|tier| elapsed_ms <= tier.max_ms)
    }

    /// Whether the table is strictly ascending by `max_ms`
    pub fn is_ascending(&self) -> bool {
        self.tiers.windows(2).all(|w| w[0].max_ms < w[1].max_ms)
    }
}
