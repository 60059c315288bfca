// Round-by-round game state machine with a replay-until-correct pass.
//
// Every transition is a pure function of (state, action). Actions that are not
// legal in the current state leave it untouched and only leave a log line.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generator::FormulaSet;
use crate::history::RoundOutcome;
use crate::math_facts::Formula;
use crate::scoring::ScoringPolicy;
use crate::ROUNDS_PER_GAME;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    NotStarted,
    Playing,
    Replay,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Input,
    Feedback,
}

/// Standard games are scored; practice games never touch the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    #[default]
    Standard,
    Practice,
}

/// An answer as it was given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub answer: u16,
    pub is_correct: bool,
    pub elapsed_ms: u32,
}

/// One slot of the game. Replay writes into the same slot again
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub formula: Formula,
    pub player_answer: Option<u16>,
    pub is_correct: Option<bool>,
    pub elapsed_ms: Option<u32>,
    /// Set once, by the primary-phase answer of a standard game
    pub points: Option<i32>,
    /// Primary-phase answer; replay never overwrites it
    pub first_attempt: Option<Attempt>,
    pub replay_attempts: u32,
}

impl Round {
    fn empty(formula: Formula) -> Self {
        Self {
            formula,
            player_answer: None,
            is_correct: None,
            elapsed_ms: None,
            points: None,
            first_attempt: None,
            replay_attempts: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub status: GameStatus,
    pub rounds: Vec<Round>,
    /// Indices into `rounds`; consumed by position, only ever appended to
    pub replay_queue: Vec<usize>,
    pub current_index: usize,
    pub phase: Phase,
    pub score: i32,
    pub mode: GameMode,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            status: GameStatus::NotStarted,
            rounds: Vec::new(),
            replay_queue: Vec::new(),
            current_index: 0,
            phase: Phase::Input,
            score: 0,
            mode: GameMode::Standard,
        }
    }
}

impl GameState {
    /// Index into `rounds` of the round being played, if any
    pub fn active_round_index(&self) -> Option<usize> {
        match self.status {
            GameStatus::Playing => Some(self.current_index).filter(|&i| i < self.rounds.len()),
            GameStatus::Replay => self.replay_queue.get(self.current_index).copied(),
            GameStatus::NotStarted | GameStatus::Completed => None,
        }
    }

    pub fn current_round(&self) -> Option<&Round> {
        self.active_round_index().and_then(|i| self.rounds.get(i))
    }

    pub fn is_finished(&self) -> bool {
        self.status == GameStatus::Completed
    }

    /// Primary-phase outcomes of a completed game, in play order
    /// This is the shape the history store keeps; replay attempts are left out
    pub fn primary_outcomes(&self) -> Option<Vec<RoundOutcome>> {
        if !self.is_finished() {
            return None;
        }
        self.rounds
            .iter()
            .map(|round| {
                round.first_attempt.map(|attempt| RoundOutcome {
                    factor_a: round.formula.factor_a,
                    factor_b: round.formula.factor_b,
                    is_correct: attempt.is_correct,
                    elapsed_ms: attempt.elapsed_ms,
                })
            })
            .collect()
    }

    /// Number of rounds answered correctly on the first try
    pub fn correct_on_first_try(&self) -> usize {
        self.rounds
            .iter()
            .filter(|r| r.first_attempt.is_some_and(|a| a.is_correct))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Start { formulas: FormulaSet, mode: GameMode },
    SubmitAnswer { value: u16, elapsed_ms: u32 },
    Advance,
    Reset,
}

/// Why an action was ignored. Diagnostic only; never surfaced as a failure
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("start requires a game that has not started (status: {0:?})")]
    AlreadyStarted(GameStatus),

    #[error("answers are only taken in the input phase of a running game (status: {0:?}, phase: {1:?})")]
    NotAcceptingAnswers(GameStatus, Phase),

    #[error("advance requires the feedback phase of a running game (status: {0:?}, phase: {1:?})")]
    NotInFeedback(GameStatus, Phase),

    #[error("no active round at index {0}")]
    NoActiveRound(usize),
}

/// Apply `action` to `state`; illegal actions return the state unchanged
pub fn reduce(state: &GameState, action: Action, policy: &ScoringPolicy) -> GameState {
    match step(state, action, policy) {
        Ok(next) => next,
        Err(rejection) => {
            log::warn!("[GAME] ignored action: {}", rejection);
            state.clone()
        }
    }
}

fn step(state: &GameState, action: Action, policy: &ScoringPolicy) -> Result<GameState, Rejection> {
    match action {
        Action::Start { formulas, mode } => start(state, formulas, mode),
        Action::SubmitAnswer { value, elapsed_ms } => submit_answer(state, value, elapsed_ms, policy),
        Action::Advance => advance(state),
        Action::Reset => {
            if state.status != GameStatus::NotStarted {
                log::info!("[GAME] reset from {:?}", state.status);
            }
            Ok(GameState::default())
        }
    }
}

fn start(state: &GameState, formulas: FormulaSet, mode: GameMode) -> Result<GameState, Rejection> {
    if state.status != GameStatus::NotStarted {
        return Err(Rejection::AlreadyStarted(state.status));
    }
    log::info!("[GAME] started mode:{:?} rounds:{}", mode, ROUNDS_PER_GAME);
    Ok(GameState {
        status: GameStatus::Playing,
        rounds: formulas.iter().copied().map(Round::empty).collect(),
        replay_queue: Vec::new(),
        current_index: 0,
        phase: Phase::Input,
        score: 0,
        mode,
    })
}

fn submit_answer(
    state: &GameState,
    value: u16,
    elapsed_ms: u32,
    policy: &ScoringPolicy,
) -> Result<GameState, Rejection> {
    let running = matches!(state.status, GameStatus::Playing | GameStatus::Replay);
    if !running || state.phase != Phase::Input {
        return Err(Rejection::NotAcceptingAnswers(state.status, state.phase));
    }
    let idx = state
        .active_round_index()
        .filter(|&i| i < state.rounds.len())
        .ok_or(Rejection::NoActiveRound(state.current_index))?;

    let mut next = state.clone();
    let round = &mut next.rounds[idx];
    let is_correct = value == round.formula.expected_answer();

    round.player_answer = Some(value);
    round.is_correct = Some(is_correct);
    round.elapsed_ms = Some(elapsed_ms);

    if state.status == GameStatus::Playing {
        round.first_attempt = Some(Attempt { answer: value, is_correct, elapsed_ms });
        if state.mode == GameMode::Standard {
            let points = policy.score(is_correct, elapsed_ms);
            round.points = Some(points);
            next.score += points;
        }
        log::debug!(
            "[GAME] round:{} {} answer:{} correct:{} ms:{} score:{}",
            idx,
            round.formula.prompt(),
            value,
            is_correct,
            elapsed_ms,
            next.score
        );
    } else {
        round.replay_attempts += 1;
        // Wrong again: queue it once more so it comes back after the rest
        if !is_correct {
            next.replay_queue.push(idx);
        }
        log::debug!(
            "[GAME] replay round:{} answer:{} correct:{} queue_len:{}",
            idx,
            value,
            is_correct,
            next.replay_queue.len()
        );
    }

    next.phase = Phase::Feedback;
    Ok(next)
}

fn advance(state: &GameState) -> Result<GameState, Rejection> {
    let running = matches!(state.status, GameStatus::Playing | GameStatus::Replay);
    if !running || state.phase != Phase::Feedback {
        return Err(Rejection::NotInFeedback(state.status, state.phase));
    }

    let mut next = state.clone();
    match state.status {
        GameStatus::Playing if state.current_index + 1 < state.rounds.len() => {
            next.current_index += 1;
            next.phase = Phase::Input;
        }
        GameStatus::Playing => {
            let missed: Vec<usize> = state
                .rounds
                .iter()
                .enumerate()
                .filter(|(_, r)| r.is_correct == Some(false))
                .map(|(i, _)| i)
                .collect();
            if missed.is_empty() {
                next.status = GameStatus::Completed;
                log::info!("[GAME] completed score:{} replay:none", next.score);
            } else {
                log::info!("[GAME] replay started missed:{:?}", missed);
                next.status = GameStatus::Replay;
                next.replay_queue = missed;
                next.current_index = 0;
                next.phase = Phase::Input;
            }
        }
        GameStatus::Replay if state.current_index + 1 < state.replay_queue.len() => {
            next.current_index += 1;
            next.phase = Phase::Input;
        }
        GameStatus::Replay => {
            next.status = GameStatus::Completed;
            log::info!(
                "[GAME] completed score:{} replay_answers:{}",
                next.score,
                next.replay_queue.len()
            );
        }
        GameStatus::NotStarted | GameStatus::Completed => {
            return Err(Rejection::NotInFeedback(state.status, state.phase));
        }
    }
    Ok(next)
}

/// Owns the single game state of a session and the policy used to score it
#[derive(Debug, Clone, Default)]
pub struct RoundEngine {
    state: GameState,
    policy: ScoringPolicy,
}

impl RoundEngine {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { state: GameState::default(), policy }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Apply an action. Returns whether the state changed
    pub fn dispatch(&mut self, action: Action) -> bool {
        let next = reduce(&self.state, action, &self.policy);
        let changed = next != self.state;
        self.state = next;
        changed
    }

    pub fn start(&mut self, formulas: FormulaSet, mode: GameMode) -> bool {
        self.dispatch(Action::Start { formulas, mode })
    }

    pub fn submit_answer(&mut self, value: u16, elapsed_ms: u32) -> bool {
        self.dispatch(Action::SubmitAnswer { value, elapsed_ms })
    }

    pub fn advance(&mut self) -> bool {
        self.dispatch(Action::Advance)
    }

    pub fn reset(&mut self) {
        self.dispatch(Action::Reset);
    }
}
