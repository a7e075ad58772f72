//! Balance types for the escrow model.
//!
//! Amounts are whole units of the ledger's base denomination. There is no
//! fractional amount anywhere in settlement.

use serde::{Deserialize, Serialize};

use crate::AccountId;

/// Ledger amount in base units.
pub type Amount = u64;

/// A single debit/credit leg applied by the balance ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Account debited.
    pub from: AccountId,
    /// Account credited.
    pub to: AccountId,
    /// Units moved.
    pub amount: Amount,
}

impl Transfer {
    #[must_use]
    pub fn new(from: AccountId, to: AccountId, amount: Amount) -> Self {
        Self { from, to, amount }
    }

    /// Zero-amount legs are skipped by the ledger.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}
