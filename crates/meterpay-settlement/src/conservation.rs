//! Per-contract conservation audit.
//!
//! Invariant checked after every settlement:
//! ```text
//! ∀ contract: baseline + provider_received + reserve_received == paid
//!             paid + remaining == deposit
//! ```
//!
//! and, over the shared escrow pool:
//! ```text
//! Σ remaining(contract) == balance(escrow pool)
//! ```
//!
//! A violation means deposit accounting drifted; callers treat it as fatal.
//! [`ConservationAudit::check_outcome`] runs the same invariant on the
//! projected state so a drifted record is caught before any funds move.
//!
//! One tally is held per contract that still has funds to pay out. Callers
//! [`forget`](ConservationAudit::forget) a contract once it is exhausted or
//! closed, which keeps the map bounded by the number of live contracts.

use std::collections::BTreeMap;

use meterpay_types::{Amount, Contract, ContractId, MeterpayError, Result, SettlementOutcome};

/// Funds received so far out of one contract's escrow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContractTally {
    /// `paid` before the audit saw the contract's first payout.
    pub baseline_paid: Amount,
    pub provider_received: Amount,
    pub reserve_received: Amount,
}

impl ContractTally {
    #[must_use]
    pub fn total(&self) -> u128 {
        u128::from(self.provider_received) + u128::from(self.reserve_received)
    }
}

/// Tracks what every contract has paid out and validates conservation.
#[derive(Debug, Clone, Default)]
pub struct ConservationAudit {
    tallies: BTreeMap<ContractId, ContractTally>,
}

impl ConservationAudit {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tallies: BTreeMap::new(),
        }
    }

    /// Record the amounts moved by a settlement.
    pub fn record(&mut self, outcome: &SettlementOutcome) {
        let tally = self
            .tallies
            .entry(outcome.contract_id)
            .or_insert_with(|| ContractTally {
                baseline_paid: outcome.paid_after.saturating_sub(outcome.total_moved()),
                ..ContractTally::default()
            });
        tally.provider_received = tally
            .provider_received
            .saturating_add(outcome.provider_share);
        tally.reserve_received = tally.reserve_received.saturating_add(outcome.reserve_share);
    }

    /// Check that applying `outcome` to `contract` keeps conservation.
    ///
    /// `contract` is the record as it stands before the transfer. Its `paid`
    /// must match everything this audit has seen leave its escrow, and the
    /// projected `paid` must equal `paid + shares` without exceeding the
    /// deposit.
    ///
    /// # Errors
    /// Returns [`MeterpayError::ConservationViolation`] on mismatch.
    pub fn check_outcome(&self, contract: &Contract, outcome: &SettlementOutcome) -> Result<()> {
        if let Some(tally) = self.tallies.get(&contract.id) {
            let received = u128::from(tally.baseline_paid) + tally.total();
            if received != u128::from(contract.paid) {
                return Err(MeterpayError::ConservationViolation {
                    reason: format!(
                        "{}: audit saw {received} paid out, record says {}",
                        contract.id, contract.paid
                    ),
                });
            }
        }

        let projected = u128::from(contract.paid) + u128::from(outcome.total_moved());
        if projected != u128::from(outcome.paid_after) {
            return Err(MeterpayError::ConservationViolation {
                reason: format!(
                    "{}: paid {} + shares {} != projected {}",
                    contract.id,
                    contract.paid,
                    outcome.total_moved(),
                    outcome.paid_after
                ),
            });
        }
        if outcome.paid_after > contract.deposit {
            return Err(MeterpayError::ConservationViolation {
                reason: format!(
                    "{}: projected paid {} exceeds deposit {}",
                    contract.id, outcome.paid_after, contract.deposit
                ),
            });
        }
        Ok(())
    }

    /// Drop the tally for a contract that will never pay out again.
    pub fn forget(&mut self, id: ContractId) -> Option<ContractTally> {
        self.tallies.remove(&id)
    }

    /// Tally for `id` (zero if nothing settled yet).
    #[must_use]
    pub fn tally(&self, id: ContractId) -> ContractTally {
        self.tallies.get(&id).copied().unwrap_or_default()
    }

    /// Check the per-contract invariant against the stored record.
    ///
    /// # Errors
    /// Returns [`MeterpayError::ConservationViolation`] if received funds
    /// disagree with `paid`, or `paid` exceeds `deposit`.
    pub fn verify(&self, contract: &Contract) -> Result<()> {
        let tally = self.tally(contract.id);
        let received = u128::from(tally.baseline_paid) + tally.total();
        let remaining = u128::from(contract.remaining());

        if received != u128::from(contract.paid) {
            return Err(MeterpayError::ConservationViolation {
                reason: format!(
                    "{}: baseline {} + provider {} + reserve {} != paid {}",
                    contract.id,
                    tally.baseline_paid,
                    tally.provider_received,
                    tally.reserve_received,
                    contract.paid
                ),
            });
        }
        if received + remaining != u128::from(contract.deposit) {
            return Err(MeterpayError::ConservationViolation {
                reason: format!(
                    "{}: received {received} + remaining {remaining} != deposit {}",
                    contract.id, contract.deposit
                ),
            });
        }
        Ok(())
    }

    /// Check that the shared escrow pool holds exactly what the contracts
    /// have not yet paid out.
    ///
    /// # Errors
    /// Returns [`MeterpayError::ConservationViolation`] on mismatch.
    pub fn verify_pool<'a>(
        contracts: impl IntoIterator<Item = &'a Contract>,
        pool_balance: Amount,
    ) -> Result<()> {
        let expected: u128 = contracts
            .into_iter()
            .map(|c| u128::from(c.remaining()))
            .sum();
        if expected != u128::from(pool_balance) {
            return Err(MeterpayError::ConservationViolation {
                reason: format!(
                    "escrow pool holds {pool_balance}, contracts still owe {expected}"
                ),
            });
        }
        Ok(())
    }

    /// Contracts with at least one recorded payout that were not forgotten.
    #[must_use]
    pub fn tracked_contracts(&self) -> Vec<ContractId> {
        self.tallies.keys().copied().collect()
    }
}
