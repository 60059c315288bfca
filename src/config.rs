// Tunables for a drill session, all plain data.

use serde::{Deserialize, Serialize};

use crate::analyzer::{ChallengeAnalyzer, RankingPolicy};
use crate::clock::ClockSettings;
use crate::error::ConfigError;
use crate::scoring::ScoringPolicy;
use crate::DEFAULT_HISTORY_WINDOW;

/// Everything a host can tune, with defaults for any field left out
///
/// ```json
/// {
///   "scoring": { "tiers": [{ "max_ms": 2000, "points": 5 }], "wrong_penalty": -1 },
///   "clock": { "countdown_ms": 5000, "reduced_motion": true },
///   "history_window": 5,
///   "ranking": { "kind": "slower_than_average", "slow_ratio": 1.5 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrillConfig {
    pub scoring: ScoringPolicy,
    pub clock: ClockSettings,
    /// How many recent games the analyzer looks at
    pub history_window: usize,
    pub ranking: RankingPolicy,
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringPolicy::default(),
            clock: ClockSettings::default(),
            history_window: DEFAULT_HISTORY_WINDOW,
            ranking: RankingPolicy::default(),
        }
    }
}

impl DrillConfig {
    /// Parse and validate a JSON config; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: DrillConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scoring.tiers.is_empty() {
            return Err(ConfigError::EmptyTiers);
        }
        if let Some(idx) = self
            .scoring
            .tiers
            .windows(2)
            .position(|w| w[0].max_ms >= w[1].max_ms)
        {
            return Err(ConfigError::TiersNotAscending(idx + 1));
        }

        if self.clock.countdown_ms == 0 {
            return Err(ConfigError::InvalidCountdown(self.clock.countdown_ms));
        }
        if self.clock.frame_interval_ms == 0 {
            return Err(ConfigError::InvalidTickInterval(self.clock.frame_interval_ms));
        }

        if self.history_window == 0 {
            return Err(ConfigError::InvalidHistoryWindow(self.history_window));
        }

        if let RankingPolicy::SlowerThanAverage { slow_ratio } = self.ranking {
            if slow_ratio.is_nan() || slow_ratio <= 1.0 {
                return Err(ConfigError::InvalidSlowRatio(slow_ratio));
            }
        }

        Ok(())
    }

    pub fn analyzer(&self) -> ChallengeAnalyzer {
        ChallengeAnalyzer::new(self.ranking, self.history_window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ScoreTier;

    #[test]
    fn test_default_config_is_valid() {
        assert!(DrillConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = DrillConfig::from_json(r#"{ "history_window": 3 }"#).unwrap();
        assert_eq!(config.history_window, 3);
        assert_eq!(config.scoring, ScoringPolicy::default());
        assert_eq!(config.clock, ClockSettings::default());
    }

    #[test]
    fn test_full_json() {
        let json = r#"{
            "scoring": { "tiers": [{ "max_ms": 1500, "points": 10 }, { "max_ms": 4000, "points": 4 }], "wrong_penalty": 0 },
            "clock": { "countdown_ms": 8000, "reduced_motion": true },
            "ranking": { "kind": "slower_than_average", "slow_ratio": 2.0 }
        }"#;
        let config = DrillConfig::from_json(json).unwrap();
        assert_eq!(config.scoring.score(true, 1500), 10);
        assert_eq!(config.scoring.score(false, 1500), 0);
        assert!(config.clock.reduced_motion);
        assert_eq!(config.clock.countdown_ms, 8000);
        assert_eq!(config.ranking, RankingPolicy::SlowerThanAverage { slow_ratio: 2.0 });
    }

    #[test]
    fn test_rejects_bad_tables() {
        let mut config = DrillConfig::default();
        config.scoring.tiers = vec![
            ScoreTier { max_ms: 3000, points: 3 },
            ScoreTier { max_ms: 2000, points: 5 },
        ];
        assert!(matches!(config.validate(), Err(ConfigError::TiersNotAscending(1))));

        config.scoring.tiers.clear();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyTiers)));
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = DrillConfig::default();
        config.history_window = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidHistoryWindow(0))));

        let mut config = DrillConfig::default();
        config.ranking = RankingPolicy::SlowerThanAverage { slow_ratio: 0.5 };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSlowRatio(_))));

        assert!(matches!(DrillConfig::from_json("{ nope"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_json_round_trip() {
        let config = DrillConfig::default();
        let json = config.to_json().unwrap();
        assert_eq!(DrillConfig::from_json(&json).unwrap(), config);
    }
}
