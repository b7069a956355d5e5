// crates/atoll-core/src/token.rs
//
// Algo token units and fixed-point percentage scale.
//
// The smallest unit is the microalgo. 1 ALGO = 10^6 microalgo. All internal
// accounting uses microalgo to avoid floating-point precision issues in
// economic calculations. Percentages (validator commission, pool payout
// ratios) use a 4-decimal fixed-point scale where 10,000 = 1%.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Number of microalgo in one ALGO. 1 ALGO = 10^6 microalgo.
pub const MICRO_ALGO_PER_ALGO: u64 = 1_000_000;

/// Fixed-point percentage scale: 10,000 = 1%, 1,000,000 = 100%.
pub const PCT_SCALE: u64 = 1_000_000;

/// Type alias for microalgo, the smallest unit of ALGO.
pub type MicroAlgo = u64;

/// An ALGO amount.
///
/// Wraps an amount in microalgo (the smallest denomination).
/// All arithmetic is performed in integer microalgo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Algo {
    /// Amount in microalgo (1 ALGO = 10^6 microalgo).
    pub micro: u64,
}

impl Algo {
    /// Create an amount from a whole-ALGO value.
    pub const fn from_algo(amount: u64) -> Self {
        Self {
            micro: amount * MICRO_ALGO_PER_ALGO,
        }
    }

    /// Create an amount from a microalgo value.
    pub const fn from_micro(micro: u64) -> Self {
        Self { micro }
    }

    /// Returns zero ALGO.
    pub const fn zero() -> Self {
        Self { micro: 0 }
    }
}

impl Add for Algo {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            micro: self.micro + rhs.micro,
        }
    }
}

impl Sub for Algo {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            micro: self.micro.saturating_sub(rhs.micro),
        }
    }
}

impl fmt::Display for Algo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.micro / MICRO_ALGO_PER_ALGO;
        let frac = self.micro % MICRO_ALGO_PER_ALGO;
        if frac == 0 {
            write!(f, "{} ALGO", whole)
        } else {
            // Display up to 6 decimal places, trimming trailing zeros
            let frac_str = format!("{:06}", frac);
            let trimmed = frac_str.trim_end_matches('0');
            write!(f, "{}.{} ALGO", whole, trimmed)
        }
    }
}
