//! Settlement configuration.
//!
//! The reserve tax and the split rule built on it are consensus-critical:
//! every replica must run with the same values.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{constants, AccountId, MeterpayError, Result};

/// Parameters the settlement engine runs with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    /// Fraction of each settled increment routed to the reserve, in `[0, 1]`.
    pub reserve_tax: Decimal,
    /// Module account holding every contract's undistributed deposit.
    pub escrow_account: AccountId,
    /// Protocol reserve module account.
    pub reserve_account: AccountId,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            reserve_tax: Decimal::new(constants::DEFAULT_RESERVE_TAX_PERCENT, 2),
            escrow_account: AccountId::module(constants::DEFAULT_ESCROW_MODULE),
            reserve_account: AccountId::module(constants::DEFAULT_RESERVE_MODULE),
        }
    }
}

impl SettlementConfig {
    /// Parse from JSON and validate. Missing fields take their defaults.
    ///
    /// # Errors
    /// `Serialization` on malformed JSON, `Configuration` on invalid values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    /// Returns [`MeterpayError::Configuration`] if the tax is outside
    /// `[0, 1]` or escrow and reserve are the same account.
    pub fn validate(&self) -> Result<()> {
        if self.reserve_tax < Decimal::ZERO || self.reserve_tax > Decimal::ONE {
            return Err(MeterpayError::Configuration(format!(
                "reserve_tax {} outside [0, 1]",
                self.reserve_tax
            )));
        }
        if self.escrow_account == self.reserve_account {
            return Err(MeterpayError::Configuration(format!(
                "escrow and reserve share account {}",
                self.escrow_account
            )));
        }
        Ok(())
    }

    /// Fraction kept by the provider: `1 - reserve_tax`.
    #[must_use]
    pub fn provider_fraction(&self) -> Decimal {
        Decimal::ONE - self.reserve_tax
    }
}
