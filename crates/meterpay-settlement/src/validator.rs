//! Claim validator — the gate in front of the settlement engine.
//!
//! Checks run in a fixed order and the first failure wins, so every replica
//! rejects a bad claim with the same variant:
//! 1. the contract exists (`ContractNotFound`)
//! 2. the contract is not closed at the current height (`ContractClosed`)
//! 3. the client signed the canonical claim payload (`InvalidSignature`)
//!
//! Counter monotonicity is not checked here: a stale or
//! duplicate counter passes validation and settles as a no-op.

use meterpay_ledger::ContractStore;
use meterpay_types::{Claim, Contract, MeterpayError, Result};

use crate::verifier::{Ed25519Verifier, SignatureVerifier};

/// Stateless claim validator.
#[derive(Debug, Clone, Default)]
pub struct ClaimValidator<V = Ed25519Verifier> {
    verifier: V,
}

impl<V: SignatureVerifier> ClaimValidator<V> {
    #[must_use]
    pub fn new(verifier: V) -> Self {
        Self { verifier }
    }

    /// Load the claim's contract from `store` and validate against it.
    ///
    /// Returns the loaded contract on success. Never mutates the store.
    pub fn validate<S: ContractStore + ?Sized>(
        &self,
        store: &S,
        claim: &Claim,
        height: i64,
    ) -> Result<Contract> {
        let contract = store.get(claim.contract_id);
        self.validate_against(contract.as_ref(), claim, height)?;
        contract.ok_or(MeterpayError::ContractNotFound(claim.contract_id))
    }

    /// Validate `claim` against an already-loaded contract (or its absence).
    pub fn validate_against(
        &self,
        contract: Option<&Contract>,
        claim: &Claim,
        height: i64,
    ) -> Result<()> {
        let contract = check_exists(contract, claim)?;
        check_open(contract, height)?;
        self.check_signature(contract, claim)
    }

    fn check_signature(&self, contract: &Contract, claim: &Claim) -> Result<()> {
        if self
            .verifier
            .verify(&claim.signing_payload(), &claim.signature, &contract.client)
        {
            Ok(())
        } else {
            Err(MeterpayError::InvalidSignature(contract.id))
        }
    }
}

fn check_exists<'a>(contract: Option<&'a Contract>, claim: &Claim) -> Result<&'a Contract> {
    contract
        .filter(|c| c.id == claim.contract_id)
        .ok_or(MeterpayError::ContractNotFound(claim.contract_id))
}

fn check_open(contract: &Contract, height: i64) -> Result<()> {
    if contract.is_closed(height) {
        return Err(MeterpayError::ContractClosed {
            id: contract.id,
            height,
        });
    }
    Ok(())
}
