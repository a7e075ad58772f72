//! Reserve split of a settled increment.
//!
//! ```text
//! provider_share = floor(incremental × (1 − reserve_tax))
//! reserve_share  = incremental − provider_share
//! ```
//!
//! The provider share is floored and the reserve takes the remainder, so
//! the two shares always add up to the increment exactly. This rule is
//! consensus-critical: changing it is a breaking protocol change.

use meterpay_types::{Amount, MeterpayError, Result, SettlementConfig};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// One increment divided between provider and reserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveSplit {
    pub provider_share: Amount,
    pub reserve_share: Amount,
}

impl ReserveSplit {
    #[must_use]
    pub fn total(&self) -> Amount {
        self.provider_share + self.reserve_share
    }
}

/// Split `incremental` according to `config.reserve_tax`.
///
/// # Errors
/// Returns [`MeterpayError::Internal`] if the decimal product cannot be
/// represented, which a validated config rules out.
pub fn split_increment(incremental: Amount, config: &SettlementConfig) -> Result<ReserveSplit> {
    let provider_share = Decimal::from(incremental)
        .checked_mul(config.provider_fraction())
        .map(|share| share.floor())
        .and_then(|share| share.to_u64())
        .filter(|share| *share <= incremental)
        .ok_or_else(|| {
            MeterpayError::Internal(format!(
                "provider share of {incremental} at tax {} out of range",
                config.reserve_tax
            ))
        })?;

    Ok(ReserveSplit {
        provider_share,
        reserve_share: incremental - provider_share,
    })
}
