// One player's drill session: picks formulas, runs the engine, files the result.

use chrono::Utc;
use rand::Rng;

use crate::analyzer::{tricky_numbers, ChallengingPair};
use crate::config::DrillConfig;
use crate::engine::{GameMode, GameState, RoundEngine};
use crate::error::DrillError;
use crate::generator::{generate_practice, generate_primary, FormulaSet};
use crate::history::{GameRecord, HistoryStore};

pub struct DrillSession<H: HistoryStore> {
    engine: RoundEngine,
    store: H,
    config: DrillConfig,
    /// Challenging pairs the current practice game was built from
    targets: Vec<ChallengingPair>,
    recorded: bool,
}

impl<H: HistoryStore> DrillSession<H> {
    /// Fails when `config` does not validate; nothing else is checked here
    pub fn new(store: H, config: DrillConfig) -> Result<Self, DrillError> {
        config.validate()?;
        Ok(Self {
            engine: RoundEngine::new(config.scoring.clone()),
            store,
            config,
            targets: Vec::new(),
            recorded: false,
        })
    }

    pub fn state(&self) -> &GameState {
        self.engine.state()
    }

    pub fn store(&self) -> &H {
        &self.store
    }

    pub fn config(&self) -> &DrillConfig {
        &self.config
    }

    /// Pairs targeted by the current practice game, most challenging first
    pub fn targets(&self) -> &[ChallengingPair] {
        &self.targets
    }

    /// Factors worth calling out to the player for the current targets
    pub fn tricky_numbers(&self) -> Vec<u8> {
        tricky_numbers(&self.targets)
    }

    /// Start a scored game over uniformly random facts
    pub fn start_standard<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let formulas = generate_primary(rng);
        let started = self.begin(formulas, GameMode::Standard);
        if started {
            self.targets.clear();
        }
        started
    }

    /// Start an unscored game biased toward the player's weakest facts
    /// With no usable history this is a random practice game
    pub fn start_practice<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        // The analyzer applies the window after dropping legacy records
        let games = self.store.recent_games(usize::MAX);
        let ranked = self.config.analyzer().rank_history(&games);
        let weak_pairs: Vec<(u8, u8)> = ranked.iter().map(|p| p.factors()).collect();
        log::info!(
            "[SESSION] practice from {} game(s), {} challenging pair(s)",
            games.len(),
            ranked.len()
        );

        let formulas = generate_practice(&weak_pairs, rng);
        let started = self.begin(formulas, GameMode::Practice);
        if started {
            self.targets = ranked;
        }
        started
    }

    fn begin(&mut self, formulas: FormulaSet, mode: GameMode) -> bool {
        let started = self.engine.start(formulas, mode);
        if started {
            self.recorded = false;
        }
        started
    }

    pub fn submit_answer(&mut self, value: u16, elapsed_ms: u32) -> bool {
        self.engine.submit_answer(value, elapsed_ms)
    }

    /// Move on from feedback. The first time the game completes its record
    /// goes to the history store
    pub fn advance(&mut self) -> Result<bool, DrillError> {
        let changed = self.engine.advance();
        if changed && self.engine.state().is_finished() && !self.recorded {
            self.recorded = true;
            self.record_completed()?;
        }
        Ok(changed)
    }

    /// Abandon the current game; nothing is recorded
    pub fn reset(&mut self) {
        self.engine.reset();
        self.targets.clear();
        self.recorded = false;
    }

    fn record_completed(&mut self) -> Result<(), DrillError> {
        let Some(record) = GameRecord::from_state(self.engine.state(), Utc::now()) else {
            return Ok(());
        };
        let score = record.score;
        let mode = record.mode;
        match self.store.record_game(record) {
            Ok(()) => {
                log::info!("[SESSION] game recorded mode:{:?} score:{}", mode, score);
                Ok(())
            }
            Err(e) => {
                log::error!("[SESSION] failed to record game: {}", e);
                Err(e.into())
            }
        }
    }
}
