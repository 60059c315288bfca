// Mines recent primary-phase answers for the facts a player struggles with.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::history::{GameRecord, RoundOutcome};
use crate::math_facts::FactPair;
use crate::{DEFAULT_HISTORY_WINDOW, DEFAULT_SLOW_RATIO, TRICKY_NUMBER_CAP};

/// A fact the player got wrong or answered slowly, factor_a <= factor_b
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChallengingPair {
    pub factor_a: u8,
    pub factor_b: u8,
    pub mistake_count: u32,
    pub avg_latency_ms: f64,
}

impl ChallengingPair {
    pub fn factors(&self) -> (u8, u8) {
        (self.factor_a, self.factor_b)
    }
}

/// How challenging pairs are picked and ordered
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RankingPolicy {
    #[default]
    /// Mistaken pairs only, by mistakes then latency; by latency alone when
    /// there are no mistakes at all
    MistakesFirst,
    /// Pairs answered wrong or at least `slow_ratio` times slower than the
    /// average of their game, ordered by how much slower they were
    SlowerThanAverage { slow_ratio: f64 },
}

impl RankingPolicy {
    pub fn slower_than_average() -> Self {
        RankingPolicy::SlowerThanAverage { slow_ratio: DEFAULT_SLOW_RATIO }
    }
}

#[derive(Debug, Default)]
struct PairStats {
    occurrences: u32,
    mistakes: u32,
    total_ms: u64,
    /// Sum of elapsed / game-average over all occurrences
    ratio_sum: f64,
    qualifies: bool,
}

impl PairStats {
    fn add(&mut self, outcome: &RoundOutcome) {
        self.occurrences += 1;
        self.total_ms += outcome.elapsed_ms as u64;
        if !outcome.is_correct {
            self.mistakes += 1;
        }
    }

    fn avg_latency_ms(&self) -> f64 {
        if self.occurrences == 0 {
            0.0
        } else {
            self.total_ms as f64 / self.occurrences as f64
        }
    }

    fn mean_ratio(&self) -> f64 {
        if self.occurrences == 0 {
            0.0
        } else {
            self.ratio_sum / self.occurrences as f64
        }
    }

    fn to_pair(&self, pair: FactPair) -> ChallengingPair {
        ChallengingPair {
            factor_a: pair.low(),
            factor_b: pair.high(),
            mistake_count: self.mistakes,
            avg_latency_ms: self.avg_latency_ms(),
        }
    }
}

/// Group outcomes by unordered pair; BTreeMap keeps ties in ascending pair order
fn group<'a>(outcomes: impl IntoIterator<Item = &'a RoundOutcome>) -> BTreeMap<FactPair, PairStats> {
    let mut groups: BTreeMap<FactPair, PairStats> = BTreeMap::new();
    for outcome in outcomes {
        groups.entry(outcome.pair()).or_default().add(outcome);
    }
    groups
}

/// Rank pairs by mistakes, then latency
pub fn rank(outcomes: &[RoundOutcome]) -> Vec<ChallengingPair> {
    let groups = group(outcomes);
    let any_mistakes = groups.values().any(|s| s.mistakes > 0);

    let mut pairs: Vec<ChallengingPair> = groups
        .iter()
        .filter(|(_, stats)| !any_mistakes || stats.mistakes > 0)
        .map(|(&pair, stats)| stats.to_pair(pair))
        .collect();

    if any_mistakes {
        pairs.sort_by(|a, b| {
            b.mistake_count
                .cmp(&a.mistake_count)
                .then(b.avg_latency_ms.total_cmp(&a.avg_latency_ms))
        });
    } else {
        pairs.sort_by(|a, b| b.avg_latency_ms.total_cmp(&a.avg_latency_ms));
    }
    pairs
}

/// Rank pairs by how much slower than their game's average they were answered
///
/// An occurrence counts against its pair when it was wrong or took at least
/// `slow_ratio` times the game's mean latency. Only pairs with such an
/// occurrence are returned.
pub fn rank_by_ratio(games: &[&[RoundOutcome]], slow_ratio: f64) -> Vec<ChallengingPair> {
    let mut groups: BTreeMap<FactPair, PairStats> = BTreeMap::new();

    for outcomes in games.iter().filter(|g| !g.is_empty()) {
        let total: u64 = outcomes.iter().map(|o| o.elapsed_ms as u64).sum();
        let game_avg = total as f64 / outcomes.len() as f64;

        for outcome in outcomes.iter() {
            let ratio = if game_avg > 0.0 { outcome.elapsed_ms as f64 / game_avg } else { 1.0 };
            let stats = groups.entry(outcome.pair()).or_default();
            stats.add(outcome);
            stats.ratio_sum += ratio;
            if !outcome.is_correct || ratio >= slow_ratio {
                stats.qualifies = true;
            }
        }
    }

    let mut ranked: Vec<(f64, ChallengingPair)> = groups
        .iter()
        .filter(|(_, stats)| stats.qualifies)
        .map(|(&pair, stats)| (stats.mean_ratio(), stats.to_pair(pair)))
        .collect();

    ranked.sort_by(|(ratio_a, a), (ratio_b, b)| {
        ratio_b
            .total_cmp(ratio_a)
            .then(b.mistake_count.cmp(&a.mistake_count))
    });
    ranked.into_iter().map(|(_, pair)| pair).collect()
}

/// Distinct factors across `pairs`, ascending, at most eight. Display only
pub fn tricky_numbers(pairs: &[ChallengingPair]) -> Vec<u8> {
    let factors: BTreeSet<u8> = pairs
        .iter()
        .flat_map(|p| [p.factor_a, p.factor_b])
        .collect();
    factors.into_iter().take(TRICKY_NUMBER_CAP).collect()
}

/// Configured ranking over a player's stored games
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeAnalyzer {
    pub policy: RankingPolicy,
    pub history_window: usize,
}

impl Default for ChallengeAnalyzer {
    fn default() -> Self {
        Self {
            policy: RankingPolicy::default(),
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }
}

impl ChallengeAnalyzer {
    pub fn new(policy: RankingPolicy, history_window: usize) -> Self {
        Self { policy, history_window }
    }

    /// The most recent games that carry per-round detail, newest first
    /// Legacy records are skipped and do not use up a window slot
    pub fn select_recent<'a>(&self, games: &'a [GameRecord]) -> Vec<&'a [RoundOutcome]> {
        let mut detailed: Vec<&GameRecord> = games.iter().filter(|g| g.has_detail()).collect();
        let skipped = games.len() - detailed.len();
        if skipped > 0 {
            log::debug!("[ANALYZER] skipped {} legacy game(s) without round detail", skipped);
        }
        detailed.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        detailed
            .into_iter()
            .take(self.history_window)
            .filter_map(|g| g.rounds.as_deref())
            .collect()
    }

    pub fn rank_history(&self, games: &[GameRecord]) -> Vec<ChallengingPair> {
        let recent = self.select_recent(games);
        let ranked = match self.policy {
            RankingPolicy::MistakesFirst => {
                let outcomes: Vec<RoundOutcome> = recent.iter().flat_map(|g| g.iter().copied()).collect();
                rank(&outcomes)
            }
            RankingPolicy::SlowerThanAverage { slow_ratio } => rank_by_ratio(&recent, slow_ratio),
        };
        log::debug!(
            "[ANALYZER] ranked {} pair(s) from {} game(s) policy:{:?}",
            ranked.len(),
            recent.len(),
            self.policy
        );
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GameMode;
    use chrono::{TimeZone, Utc};

    fn outcome(a: u8, b: u8, is_correct: bool, elapsed_ms: u32) -> RoundOutcome {
        RoundOutcome { factor_a: a, factor_b: b, is_correct, elapsed_ms }
    }

    fn game(day: u32, rounds: Option<Vec<RoundOutcome>>) -> GameRecord {
        GameRecord {
            mode: GameMode::Standard,
            score: 0,
            completed_at: Utc.with_ymd_and_hms(2026, 5, day, 12, 0, 0).unwrap(),
            rounds,
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(rank(&[]).is_empty());
        assert!(rank_by_ratio(&[], 1.5).is_empty());
        assert!(ChallengeAnalyzer::default().rank_history(&[]).is_empty());
    }

    #[test]
    fn test_groups_unordered_pairs() {
        let ranked = rank(&[outcome(7, 8, false, 3000), outcome(8, 7, false, 1000)]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].factors(), (7, 8));
        assert_eq!(ranked[0].mistake_count, 2);
        assert_eq!(ranked[0].avg_latency_ms, 2000.0);
    }

    #[test]
    fn test_mistakes_filter_and_order() {
        let outcomes = [
            outcome(3, 4, true, 9000),
            outcome(6, 7, false, 1000),
            outcome(6, 7, false, 1200),
            outcome(8, 9, false, 4000),
            outcome(2, 5, false, 2000),
            outcome(2, 5, true, 500),
        ];
        let ranked = rank(&outcomes);
        let order: Vec<(u8, u8)> = ranked.iter().map(|p| p.factors()).collect();
        // 6×7 has two mistakes; 8×9 and 2×5 have one each, slower first
        assert_eq!(order, vec![(6, 7), (8, 9), (2, 5)]);
        assert!(ranked.iter().all(|p| p.mistake_count > 0));
    }

    #[test]
    fn test_no_mistakes_orders_by_latency() {
        let outcomes = [
            outcome(3, 4, true, 1000),
            outcome(5, 6, true, 4000),
            outcome(7, 7, true, 2500),
        ];
        let ranked = rank(&outcomes);
        let latencies: Vec<f64> = ranked.iter().map(|p| p.avg_latency_ms).collect();
        assert_eq!(latencies, vec![4000.0, 2500.0, 1000.0]);
        assert_eq!(ranked.len(), 3);
    }

    #[test]
    fn test_ratio_policy_flags_slow_pairs() {
        // Game mean is 2000ms; 9×9 at 5000ms is 2.5x slower
        let game_one = [
            outcome(2, 2, true, 1000),
            outcome(3, 3, true, 1000),
            outcome(9, 9, true, 5000),
            outcome(4, 6, false, 1000),
        ];
        let ranked = rank_by_ratio(&[&game_one[..]], 1.5);
        let order: Vec<(u8, u8)> = ranked.iter().map(|p| p.factors()).collect();
        assert_eq!(order, vec![(9, 9), (4, 6)]);
        assert_eq!(ranked[1].mistake_count, 1);
        assert_eq!(ranked[0].avg_latency_ms, 5000.0);
    }

    fn slow_and_fast_games() -> (Vec<RoundOutcome>, Vec<RoundOutcome>) {
        // Slow game mean is 6000ms, so nothing in it stands out
        let slow = vec![outcome(6, 7, true, 6000), outcome(2, 2, true, 6000), outcome(3, 3, true, 6000)];
        // Fast game mean is 560ms; 3×4 at 2000ms is ~3.6x that
        let fast = vec![
            outcome(3, 4, true, 2000),
            outcome(2, 5, true, 200),
            outcome(2, 6, true, 200),
            outcome(2, 7, true, 200),
            outcome(2, 8, true, 200),
        ];
        (slow, fast)
    }

    #[test]
    fn test_ratio_uses_each_games_own_mean() {
        let (slow, fast) = slow_and_fast_games();
        let ranked = rank_by_ratio(&[&slow[..], &fast[..]], 1.5);
        // A pooled mean (2600ms) would flag every slow-game pair instead
        assert_eq!(
            ranked,
            vec![ChallengingPair { factor_a: 3, factor_b: 4, mistake_count: 0, avg_latency_ms: 2000.0 }]
        );
    }

    #[test]
    fn test_rank_history_with_slower_than_average() {
        let (slow, fast) = slow_and_fast_games();
        let games = vec![game(1, Some(slow)), game(2, None), game(3, Some(fast))];
        let analyzer = ChallengeAnalyzer::new(RankingPolicy::slower_than_average(), 5);
        let order: Vec<(u8, u8)> = analyzer.rank_history(&games).iter().map(|p| p.factors()).collect();
        assert_eq!(order, vec![(3, 4)]);

        // Window of one keeps only the newest detailed game
        let analyzer = ChallengeAnalyzer::new(RankingPolicy::slower_than_average(), 1);
        assert_eq!(analyzer.select_recent(&games).len(), 1);
        assert_eq!(analyzer.rank_history(&games).len(), 1);
    }

    #[test]
    fn test_select_recent_skips_legacy_and_honours_window() {
        let games = vec![
            game(1, Some(vec![outcome(2, 3, false, 1000)])),
            game(2, None),
            game(3, Some(vec![outcome(4, 5, false, 1000)])),
            game(4, Some(vec![outcome(6, 7, false, 1000)])),
            game(5, None),
        ];
        let analyzer = ChallengeAnalyzer::new(RankingPolicy::MistakesFirst, 2);
        let recent = analyzer.select_recent(&games);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0][0].pair(), FactPair::new(6, 7));
        assert_eq!(recent[1][0].pair(), FactPair::new(4, 5));

        let ranked = analyzer.rank_history(&games);
        let order: Vec<(u8, u8)> = ranked.iter().map(|p| p.factors()).collect();
        assert!(!order.contains(&(2, 3)));
        assert_eq!(order.len(), 2);
    }

    #[test]
    fn test_tricky_numbers() {
        let pairs: Vec<ChallengingPair> = [(7, 8), (6, 8), (3, 12), (4, 9), (5, 11), (2, 10)]
            .iter()
            .map(|&(a, b)| ChallengingPair { factor_a: a, factor_b: b, mistake_count: 1, avg_latency_ms: 1.0 })
            .collect();
        assert_eq!(tricky_numbers(&pairs), vec![2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(tricky_numbers(&pairs[..2]), vec![6, 7, 8]);
        assert!(tricky_numbers(&[]).is_empty());
    }
}
