//! Three-way placement fee split.
//!
//! Percentages are carried as basis points inside a `SplitPolicy` value that
//! is copied into each distribution at creation time. All share math is
//! integer: the select and founding shares are rounded half-up, and the
//! platform takes whatever remains so the three shares always sum to the fee.

use serde::{Deserialize, Serialize};

pub const BPS_DENOMINATOR: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitPolicy {
    pub version: u16,
    pub platform_bps: u32,
    pub select_bps: u32,
    pub founding_bps: u32,
}

impl SplitPolicy {
    /// Platform 45%, Select Circle 40%, Founding Circle 15%.
    pub const CURRENT: SplitPolicy = SplitPolicy {
        version: 1,
        platform_bps: 4_500,
        select_bps: 4_000,
        founding_bps: 1_500,
    };

    pub fn validate(&self) -> Result<(), String> {
        let total = self.platform_bps + self.select_bps + self.founding_bps;
        if total != BPS_DENOMINATOR {
            return Err(format!(
                "split policy v{} allocates {total} bps, expected {BPS_DENOMINATOR}",
                self.version
            ));
        }
        Ok(())
    }

    pub fn select_fraction(&self) -> f64 {
        self.select_bps as f64 / BPS_DENOMINATOR as f64
    }

    pub fn founding_fraction(&self) -> f64 {
        self.founding_bps as f64 / BPS_DENOMINATOR as f64
    }

    /// Splits `fee` (minor currency units, positive) into shares.
    pub fn split(&self, fee: i64) -> Shares {
        let select = share_of(fee, self.select_bps);
        let founding = share_of(fee, self.founding_bps);
        Shares {
            platform: fee - select - founding,
            select,
            founding,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shares {
    pub platform: i64,
    pub select: i64,
    pub founding: i64,
}

impl Shares {
    pub fn total(&self) -> i64 {
        self.platform + self.select + self.founding
    }
}

/// `fee * bps / 10_000`, rounded half-up. Widened to avoid overflow.
fn share_of(fee: i64, bps: u32) -> i64 {
    let scaled = fee as i128 * bps as i128;
    let denom = BPS_DENOMINATOR as i128;
    ((scaled + denom / 2) / denom) as i64
}
