// Formula selection for one game: uniform random, or biased toward weak pairs.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::math_facts::{all_pairs, FactPair, Formula, HiddenPosition};
use crate::ROUNDS_PER_GAME;

/// The ten formulas of one game, in play order
pub type FormulaSet = [Formula; ROUNDS_PER_GAME];

/// Turn a normalized pair into a playable formula
/// Hidden slot and display order are drawn independently
fn dress_pair<R: Rng + ?Sized>(pair: FactPair, rng: &mut R) -> Formula {
    let hidden = HiddenPosition::ALL[rng.gen_range(0..HiddenPosition::ALL.len())];
    // 50% chance to swap operands for commutativity practice
    let (a, b) = if rng.gen_bool(0.5) {
        (pair.high(), pair.low())
    } else {
        (pair.low(), pair.high())
    };
    Formula::new(a, b, hidden)
}

fn dress_all<R: Rng + ?Sized>(pairs: [FactPair; ROUNDS_PER_GAME], rng: &mut R) -> FormulaSet {
    pairs.map(|pair| dress_pair(pair, rng))
}

/// Ten distinct pairs drawn uniformly from the full pool
pub fn generate_primary<R: Rng + ?Sized>(rng: &mut R) -> FormulaSet {
    let mut pool = all_pairs();
    pool.shuffle(rng);
    let formulas = dress_all(std::array::from_fn(|i| pool[i]), rng);
    log::debug!(
        "[GENERATOR] primary batch: {}",
        formulas.iter().map(|f| f.pair().to_key()).collect::<Vec<_>>().join(",")
    );
    formulas
}

/// Ten distinct pairs led by the caller's weak pairs (most challenging first)
///
/// Weak pairs outside the canonical range and repeats are dropped; whatever is
/// left after the first ten is ignored. Missing slots are filled from a shuffled
/// pool and the final batch is shuffled so weak pairs do not always come first.
pub fn generate_practice<R: Rng + ?Sized>(weak_pairs: &[(u8, u8)], rng: &mut R) -> FormulaSet {
    let mut chosen: Vec<FactPair> = Vec::with_capacity(ROUNDS_PER_GAME);
    for &(a, b) in weak_pairs {
        if chosen.len() == ROUNDS_PER_GAME {
            break;
        }
        match FactPair::checked(a, b) {
            Some(pair) if !chosen.contains(&pair) => chosen.push(pair),
            Some(_) => {}
            None => log::warn!("[GENERATOR] skipping out-of-range weak pair {}×{}", a, b),
        }
    }
    let weak_count = chosen.len();

    if chosen.len() < ROUNDS_PER_GAME {
        let mut pool = all_pairs();
        pool.shuffle(rng);
        for pair in pool {
            if chosen.len() == ROUNDS_PER_GAME {
                break;
            }
            if !chosen.contains(&pair) {
                chosen.push(pair);
            }
        }
    }

    let mut formulas = dress_all(std::array::from_fn(|i| chosen[i]), rng);
    formulas.shuffle(rng);
    log::debug!(
        "[GENERATOR] practice batch: {} weak, {} filler",
        weak_count,
        ROUNDS_PER_GAME - weak_count
    );
    formulas
}
