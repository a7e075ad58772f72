//! Settlement outcome returned for every accepted claim.
//!
//! Outcomes are fully determined by the claim, the height and the prior
//! contract state, so every replica produces the same bytes. The
//! [`SettlementOutcome::digest`] gives replicas a cheap way to compare.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{constants, Amount, ContractId};

/// Amounts moved by one settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementOutcome {
    pub contract_id: ContractId,
    /// Counter carried by the claim.
    pub claimed_counter: i64,
    /// Height the claim was settled at.
    pub height: i64,
    /// Capped cumulative entitlement as of this claim.
    pub entitlement: Amount,
    /// Credited to the provider account.
    pub provider_share: Amount,
    /// Credited to the protocol reserve.
    pub reserve_share: Amount,
    /// Contract `paid` after this settlement.
    pub paid_after: Amount,
}

impl SettlementOutcome {
    /// An outcome that moved nothing (duplicate, stale or exhausted claim).
    #[must_use]
    pub fn noop(
        contract_id: ContractId,
        claimed_counter: i64,
        height: i64,
        entitlement: Amount,
        paid: Amount,
    ) -> Self {
        Self {
            contract_id,
            claimed_counter,
            height,
            entitlement,
            provider_share: 0,
            reserve_share: 0,
            paid_after: paid,
        }
    }

    /// Total moved out of escrow by this settlement.
    #[must_use]
    pub fn total_moved(&self) -> Amount {
        self.provider_share + self.reserve_share
    }

    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.total_moved() == 0
    }

    /// `SHA-256(domain || contract_id || counter || height || entitlement || provider || reserve || paid_after)`
    #[must_use]
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(constants::OUTCOME_DOMAIN);
        hasher.update(self.contract_id.0.to_le_bytes());
        hasher.update(self.claimed_counter.to_le_bytes());
        hasher.update(self.height.to_le_bytes());
        hasher.update(self.entitlement.to_le_bytes());
        hasher.update(self.provider_share.to_le_bytes());
        hasher.update(self.reserve_share.to_le_bytes());
        hasher.update(self.paid_after.to_le_bytes());
        hasher.finalize().into()
    }

    /// Hex form of [`Self::digest`], for logs.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest())
    }
}
