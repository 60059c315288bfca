// Multiplication facts: the canonical pair universe and the formulas built from it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest factor that appears in a drill
/// The ×1 table is excluded: 66 pairs over 2..=12
pub const MIN_FACTOR: u8 = 2;

/// Largest factor that appears in a drill
pub const MAX_FACTOR: u8 = 12;

/// Number of unordered pairs in the canonical range
pub const PAIR_COUNT: usize = {
    let n = (MAX_FACTOR - MIN_FACTOR + 1) as usize;
    n * (n + 1) / 2
};

/// Check whether a single factor lies in the canonical range
pub fn in_range(factor: u8) -> bool {
    (MIN_FACTOR..=MAX_FACTOR).contains(&factor)
}

/// Unordered factor pair, always stored smaller-first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FactPair {
    low: u8,
    high: u8,
}

impl FactPair {
    /// Normalize two factors to canonical form (smaller × larger)
    pub fn new(a: u8, b: u8) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self { low, high }
    }

    /// Normalize and reject pairs outside the canonical range
    pub fn checked(a: u8, b: u8) -> Option<Self> {
        if in_range(a) && in_range(b) {
            Some(Self::new(a, b))
        } else {
            None
        }
    }

    pub fn low(&self) -> u8 {
        self.low
    }

    pub fn high(&self) -> u8 {
        self.high
    }

    pub fn product(&self) -> u16 {
        self.low as u16 * self.high as u16
    }

    /// Fact key used for display and logs (e.g. "3×7")
    pub fn to_key(&self) -> String {
        format!("{}×{}", self.low, self.high)
    }
}

impl fmt::Display for FactPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{}", self.low, self.high)
    }
}

/// Parse a fact key back into a normalized pair
/// Accepts "×", "x" or "*" as the operator; order of the operands is irrelevant
pub fn parse_fact_key(key: &str) -> Option<FactPair> {
    let mut parts = key.splitn(2, |c: char| c == '×' || c == 'x' || c == '*');
    let left = parts.next()?.trim().parse::<u8>().ok()?;
    let right = parts.next()?.trim().parse::<u8>().ok()?;
    FactPair::checked(left, right)
}

/// Every unordered pair of the canonical range, in ascending order
pub fn all_pairs() -> Vec<FactPair> {
    let mut pairs = Vec::with_capacity(PAIR_COUNT);
    for low in MIN_FACTOR..=MAX_FACTOR {
        for high in low..=MAX_FACTOR {
            pairs.push(FactPair { low, high });
        }
    }
    pairs
}

/// Which of the three numbers in a × b = c the player has to supply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HiddenPosition {
    A,
    B,
    C,
}

impl HiddenPosition {
    pub const ALL: [HiddenPosition; 3] = [HiddenPosition::A, HiddenPosition::B, HiddenPosition::C];
}

/// A single drill item
/// factor_a/factor_b keep the display order; the pair itself is unordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formula {
    pub factor_a: u8,
    pub factor_b: u8,
    pub product: u16,
    pub hidden: HiddenPosition,
}

impl Formula {
    pub fn new(factor_a: u8, factor_b: u8, hidden: HiddenPosition) -> Self {
        Self {
            factor_a,
            factor_b,
            product: factor_a as u16 * factor_b as u16,
            hidden,
        }
    }

    /// The value withheld from the player
    pub fn expected_answer(&self) -> u16 {
        match self.hidden {
            HiddenPosition::A => self.factor_a as u16,
            HiddenPosition::B => self.factor_b as u16,
            HiddenPosition::C => self.product,
        }
    }

    pub fn pair(&self) -> FactPair {
        FactPair::new(self.factor_a, self.factor_b)
    }

    /// Display form with the hidden slot blanked, e.g. "4 × ? = 20"
    pub fn prompt(&self) -> String {
        let slot = |value: u16, position: HiddenPosition| {
            if self.hidden == position {
                "?".to_string()
            } else {
                value.to_string()
            }
        };
        format!(
            "{} × {} = {}",
            slot(self.factor_a as u16, HiddenPosition::A),
            slot(self.factor_b as u16, HiddenPosition::B),
            slot(self.product, HiddenPosition::C),
        )
    }
}
