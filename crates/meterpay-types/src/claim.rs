//! Claim messages submitted by providers.
//!
//! A claim is never stored: it is validated, applied and discarded. The
//! client authorizes it by signing the canonical payload below with the
//! key registered on the contract.

use serde::{Deserialize, Serialize};

use crate::{constants, ContractId};

/// A provider's request to settle income earned up to `claimed_counter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub contract_id: ContractId,
    /// Cumulative call count (usage-counted) or the height at sign time
    /// (height-elapsed).
    pub claimed_counter: i64,
    /// Address of whoever submitted the transaction.
    pub submitter: String,
    /// Client's ed25519 signature over [`Claim::signing_payload`].
    pub signature: Vec<u8>,
}

impl Claim {
    /// Canonical signing payload for this claim.
    ///
    /// Format: `"meterpay:claim:v1:" || contract_id (u64 LE) || claimed_counter (i64 LE)`
    #[must_use]
    pub fn signing_payload(&self) -> Vec<u8> {
        Self::payload_for(self.contract_id, self.claimed_counter)
    }

    /// The payload a client signs to authorize `counter` on `contract_id`.
    #[must_use]
    pub fn payload_for(contract_id: ContractId, counter: i64) -> Vec<u8> {
        let mut payload = Vec::with_capacity(constants::CLAIM_DOMAIN.len() + 16);
        payload.extend_from_slice(constants::CLAIM_DOMAIN);
        payload.extend_from_slice(&contract_id.0.to_le_bytes());
        payload.extend_from_slice(&counter.to_le_bytes());
        payload
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Claim {
    /// Build a claim signed by `client`. **Test fixtures only.**
    pub fn signed(
        contract_id: ContractId,
        claimed_counter: i64,
        submitter: &str,
        client: &ed25519_dalek::SigningKey,
    ) -> Self {
        use ed25519_dalek::Signer;

        let payload = Self::payload_for(contract_id, claimed_counter);
        Self {
            contract_id,
            claimed_counter,
            submitter: submitter.to_string(),
            signature: client.sign(&payload).to_bytes().to_vec(),
        }
    }

    /// Build a claim with an all-zero signature. **Test fixtures only.**
    pub fn unsigned(contract_id: ContractId, claimed_counter: i64, submitter: &str) -> Self {
        Self {
            contract_id,
            claimed_counter,
            submitter: submitter.to_string(),
            signature: vec![0u8; 64],
        }
    }
}
