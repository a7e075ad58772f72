//! Claim processor — one serialized state transition per claim.
//!
//! Wires the ledger seams to the validator and engine:
//!
//! ```text
//! claim → ClaimValidator.validate() → SettlementEngine.prepare()
//!       → ConservationAudit.check_outcome() → SettlementEngine.apply()
//!       → ConservationAudit.record() → ContractStore.put()
//! ```
//!
//! Failed claims leave the store, the ledger and the audit untouched.
//! Audit tallies of exhausted or closed contracts are dropped.

use meterpay_ledger::{BalanceLedger, ContractStore, HeightProvider};
use meterpay_types::{Claim, MeterpayError, Result, SettlementConfig, SettlementOutcome};

use crate::conservation::ConservationAudit;
use crate::engine::SettlementEngine;
use crate::validator::ClaimValidator;
use crate::verifier::{Ed25519Verifier, SignatureVerifier};

/// Owns the ledger handles and applies claims one at a time.
pub struct ClaimProcessor<S, L, H, V = Ed25519Verifier> {
    store: S,
    ledger: L,
    height: H,
    validator: ClaimValidator<V>,
    engine: SettlementEngine,
    audit: ConservationAudit,
}

impl<S, L, H> ClaimProcessor<S, L, H, Ed25519Verifier>
where
    S: ContractStore,
    L: BalanceLedger,
    H: HeightProvider,
{
    /// Processor verifying claims with ed25519.
    ///
    /// # Errors
    /// Returns `Configuration` if `config` does not validate.
    pub fn new(store: S, ledger: L, height: H, config: SettlementConfig) -> Result<Self> {
        Self::with_verifier(store, ledger, height, config, Ed25519Verifier)
    }
}

impl<S, L, H, V> ClaimProcessor<S, L, H, V>
where
    S: ContractStore,
    L: BalanceLedger,
    H: HeightProvider,
    V: SignatureVerifier,
{
    /// # Errors
    /// Returns `Configuration` if `config` does not validate.
    pub fn with_verifier(
        store: S,
        ledger: L,
        height: H,
        config: SettlementConfig,
        verifier: V,
    ) -> Result<Self> {
        Ok(Self {
            store,
            ledger,
            height,
            validator: ClaimValidator::new(verifier),
            engine: SettlementEngine::new(config)?,
            audit: ConservationAudit::new(),
        })
    }

    /// Validate and settle `claim` at the current height.
    ///
    /// Conservation is checked on the projected state before any transfer,
    /// so every error leaves the store, the ledger and the audit untouched.
    ///
    /// # Errors
    /// - `ContractNotFound`, `ContractClosed`, `InvalidSignature`: rejected
    /// - `InsufficientPooledFunds`, `ConservationViolation`: fatal
    pub fn submit(&mut self, claim: &Claim) -> Result<SettlementOutcome> {
        let height = self.height.current_height();

        let mut contract = match self.validator.validate(&self.store, claim, height) {
            Ok(contract) => contract,
            Err(err) => {
                tracing::warn!(
                    contract = %claim.contract_id,
                    submitter = %claim.submitter,
                    counter = claim.claimed_counter,
                    height,
                    error = %err,
                    "Claim rejected"
                );
                if matches!(err, MeterpayError::ContractClosed { .. }) {
                    self.audit.forget(claim.contract_id);
                }
                return Err(err);
            }
        };

        let outcome = self.engine.prepare(&contract, claim, height)?;
        if outcome.is_noop() {
            return Ok(outcome);
        }

        if let Err(err) = self.audit.check_outcome(&contract, &outcome) {
            tracing::error!(contract = %contract.id, error = %err, "Conservation check failed");
            return Err(err);
        }
        self.engine.apply(&mut contract, &outcome, &mut self.ledger)?;

        self.audit.record(&outcome);
        if contract.remaining() == 0 {
            self.audit.forget(contract.id);
        }
        self.store.put(contract);

        Ok(outcome)
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable store access for the host's contract-creation flow.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    #[must_use]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Mutable ledger access for the host's deposit flow.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn height_mut(&mut self) -> &mut H {
        &mut self.height
    }

    #[must_use]
    pub fn audit(&self) -> &ConservationAudit {
        &self.audit
    }

    #[must_use]
    pub fn config(&self) -> &SettlementConfig {
        self.engine.config()
    }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::SigningKey;
    use meterpay_ledger::{InMemoryLedger, ManualHeight, MemoryContractStore};
    use meterpay_types::{AccountId, Contract, ContractId, MeterType, PubKey};

    use super::*;

    type Processor = ClaimProcessor<MemoryContractStore, InMemoryLedger, ManualHeight>;

    fn client_key() -> SigningKey {
        SigningKey::from_bytes(&[5u8; 32])
    }

    fn setup(height: i64) -> (Processor, Contract) {
        let mut contract = Contract::dummy(1, MeterType::UsageCounted, 10, 1000);
        contract.client = PubKey(client_key().verifying_key().to_bytes());

        let mut processor = ClaimProcessor::new(
            MemoryContractStore::new(),
            InMemoryLedger::new(),
            ManualHeight::new(height),
            SettlementConfig::default(),
        )
        .unwrap();
        let escrow = processor.config().escrow_account.clone();
        processor.ledger_mut().mint(&escrow, contract.deposit).unwrap();
        processor.store_mut().put(contract.clone());
        (processor, contract)
    }

    #[test]
    fn accepted_claim_is_persisted() {
        let (mut p, contract) = setup(5);
        let claim = Claim::signed(contract.id, 20, "provider", &client_key());
        let outcome = p.submit(&claim).unwrap();

        assert_eq!(outcome.provider_share, 180);
        let stored = p.store().get(contract.id).unwrap();
        assert_eq!(stored.paid, 200);
        assert_eq!(stored.last_settled_counter, 20);
        assert_eq!(
            p.ledger().balance_of(&AccountId::for_key(&contract.provider)),
            180
        );
        assert_eq!(p.audit().tally(contract.id).total(), 200);
    }

    #[test]
    fn rejected_claim_changes_nothing() {
        let (mut p, contract) = setup(5);
        let claim = Claim::unsigned(contract.id, 20, "provider");
        let err = p.submit(&claim).unwrap_err();

        assert!(err.is_rejection());
        assert_eq!(p.store().get(contract.id), Some(contract));
        assert_eq!(p.ledger().balance_of(&p.config().escrow_account), 1000);
        assert!(p.audit().tracked_contracts().is_empty());
    }

    #[test]
    fn unknown_contract_rejected() {
        let (mut p, _) = setup(5);
        let claim = Claim::signed(ContractId(77), 20, "provider", &client_key());
        assert_eq!(
            p.submit(&claim).unwrap_err(),
            MeterpayError::ContractNotFound(ContractId(77))
        );
    }

    #[test]
    fn closed_rejection_even_with_larger_counter() {
        let (mut p, contract) = setup(5);
        p.submit(&Claim::signed(contract.id, 20, "provider", &client_key()))
            .unwrap();

        p.height_mut().set(contract.end_height() + 1);
        let err = p
            .submit(&Claim::signed(contract.id, 90, "provider", &client_key()))
            .unwrap_err();
        assert!(matches!(err, MeterpayError::ContractClosed { .. }));
        assert_eq!(p.store().get(contract.id).unwrap().paid, 200);
    }

    #[test]
    fn replayed_claim_is_noop() {
        let (mut p, contract) = setup(5);
        let claim = Claim::signed(contract.id, 20, "provider", &client_key());
        p.submit(&claim).unwrap();
        let outcome = p.submit(&claim).unwrap();
        assert!(outcome.is_noop());
        assert_eq!(p.ledger().balance_of(&p.config().escrow_account), 800);
    }

    #[test]
    fn drifted_record_fails_before_any_transfer() {
        let (mut p, contract) = setup(5);
        let provider = AccountId::for_key(&contract.provider);
        let claim = Claim::signed(contract.id, 20, "provider", &client_key());
        p.submit(&claim).unwrap();

        // Host overwrites the record with its pre-settlement copy.
        p.store_mut().put(contract.clone());

        for _ in 0..2 {
            let err = p.submit(&claim).unwrap_err();
            assert!(matches!(err, MeterpayError::ConservationViolation { .. }));
            assert!(err.is_fatal());
            assert_eq!(p.ledger().balance_of(&provider), 180);
            assert_eq!(p.ledger().balance_of(&p.config().escrow_account), 800);
            assert_eq!(p.store().get(contract.id).unwrap().paid, 0);
            assert_eq!(p.audit().tally(contract.id).total(), 200);
        }
    }

    #[test]
    fn exhausted_contract_tally_dropped() {
        let (mut p, contract) = setup(5);
        p.submit(&Claim::signed(contract.id, 20, "provider", &client_key()))
            .unwrap();
        assert_eq!(p.audit().tracked_contracts(), vec![contract.id]);

        p.submit(&Claim::signed(contract.id, 1_000, "provider", &client_key()))
            .unwrap();
        assert_eq!(p.store().get(contract.id).unwrap().remaining(), 0);
        assert!(p.audit().tracked_contracts().is_empty());
    }

    #[test]
    fn closed_contract_tally_dropped() {
        let (mut p, contract) = setup(5);
        p.submit(&Claim::signed(contract.id, 20, "provider", &client_key()))
            .unwrap();

        p.height_mut().set(contract.end_height() + 1);
        assert!(p
            .submit(&Claim::signed(contract.id, 30, "provider", &client_key()))
            .is_err());
        assert!(p.audit().tracked_contracts().is_empty());
    }
}
