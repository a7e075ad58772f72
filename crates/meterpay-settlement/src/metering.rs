//! Metering policy: cumulative entitlement for a contract.
//!
//! The two meter types trust different inputs:
//!
//! | meter            | quantity                                         | source           |
//! |------------------|--------------------------------------------------|------------------|
//! | `UsageCounted`   | `claimed_counter` calls                          | client signature |
//! | `HeightElapsed`  | `min(height, start + duration) - start` heights  | ledger clock     |
//!
//! For height-elapsed contracts the claim counter is only part of the signed
//! payload; the amount comes from the ledger's own height so a client can
//! never sign for heights that have not been produced yet.
//!
//! Every result is capped at the contract deposit.

use meterpay_types::{Amount, Contract, MeterType};

/// The billable quantity behind an entitlement, kept distinct per source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeteredQuantity {
    /// Calls asserted by the client's signed counter.
    Calls(u64),
    /// Heights elapsed inside the contract window, from the ledger clock.
    ElapsedHeights(u64),
}

impl MeteredQuantity {
    #[must_use]
    pub fn units(self) -> u64 {
        match self {
            Self::Calls(n) | Self::ElapsedHeights(n) => n,
        }
    }
}

/// Billable quantity for `contract` at `height`. Negative inputs count as zero.
#[must_use]
pub fn metered_quantity(contract: &Contract, claimed_counter: i64, height: i64) -> MeteredQuantity {
    match contract.meter_type {
        MeterType::UsageCounted => MeteredQuantity::Calls(non_negative(claimed_counter)),
        MeterType::HeightElapsed => {
            let until = height.min(contract.end_height());
            let elapsed = i128::from(until) - i128::from(contract.start_height);
            MeteredQuantity::ElapsedHeights(u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX))
        }
    }
}

/// Cumulative entitlement as of this claim, capped at `contract.deposit`.
///
/// The product is computed in `u128`, so no counter is large enough to wrap.
#[must_use]
pub fn entitlement(contract: &Contract, claimed_counter: i64, height: i64) -> Amount {
    let units = metered_quantity(contract, claimed_counter, height).units();
    let earned = u128::from(units) * u128::from(contract.rate);
    let capped = earned.min(u128::from(contract.deposit));
    Amount::try_from(capped).unwrap_or(contract.deposit)
}

fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
