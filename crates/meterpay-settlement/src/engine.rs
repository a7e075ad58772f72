//! Settlement engine — turns newly earned entitlement into transfers.
//!
//! Runs after the claim validator accepted a claim:
//! 1. Compute the capped cumulative entitlement (metering policy)
//! 2. `incremental = entitlement - paid`; zero means no-op success
//! 3. Split the increment between provider and reserve
//! 4. Move both shares out of the escrow pool in one atomic ledger batch
//! 5. Advance `paid` and `last_settled_counter` on the contract
//!
//! A replayed, duplicate or stale claim lands in step 2 and moves nothing,
//! which is what makes resubmission safe.

use meterpay_ledger::BalanceLedger;
use meterpay_types::constants::{ENGINE_NAME, VERSION};
use meterpay_types::{
    AccountId, Claim, Contract, MeterpayError, Result, SettlementConfig, SettlementOutcome,
    Transfer,
};

use crate::metering;
use crate::split::split_increment;

/// Pure settlement step over an explicitly passed ledger handle.
#[derive(Debug, Clone)]
pub struct SettlementEngine {
    config: SettlementConfig,
}

impl SettlementEngine {
    /// # Errors
    /// Returns `Configuration` if `config` does not validate.
    pub fn new(config: SettlementConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            engine = ENGINE_NAME,
            version = VERSION,
            reserve_tax = %config.reserve_tax,
            escrow = %config.escrow_account,
            reserve = %config.reserve_account,
            "Settlement engine configured"
        );
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    /// Settle `claim` against `contract` at `height`.
    ///
    /// Equivalent to [`prepare`](Self::prepare) followed by
    /// [`apply`](Self::apply). On success `contract` reflects the new `paid`
    /// and counter; the caller persists it. On error neither `contract` nor
    /// `ledger` has changed.
    ///
    /// # Errors
    /// - `InsufficientPooledFunds` if the escrow pool cannot cover the
    ///   increment (fatal: deposit accounting drifted)
    /// - `InvalidContract` if the record is already inconsistent
    pub fn settle<L: BalanceLedger + ?Sized>(
        &self,
        contract: &mut Contract,
        claim: &Claim,
        height: i64,
        ledger: &mut L,
    ) -> Result<SettlementOutcome> {
        let outcome = self.prepare(contract, claim, height)?;
        self.apply(contract, &outcome, ledger)?;
        Ok(outcome)
    }

    /// Compute what settling `claim` would move, without touching anything.
    ///
    /// # Errors
    /// `InvalidContract` if the record is inconsistent; `Internal` if the
    /// split cannot be represented.
    pub fn prepare(
        &self,
        contract: &Contract,
        claim: &Claim,
        height: i64,
    ) -> Result<SettlementOutcome> {
        contract.validate()?;

        let entitlement = metering::entitlement(contract, claim.claimed_counter, height);
        let incremental = entitlement.saturating_sub(contract.paid);

        if incremental == 0 {
            tracing::debug!(
                contract = %contract.id,
                counter = claim.claimed_counter,
                height,
                entitlement,
                paid = contract.paid,
                "Claim already reflected in paid; nothing to settle"
            );
            return Ok(SettlementOutcome::noop(
                contract.id,
                claim.claimed_counter,
                height,
                entitlement,
                contract.paid,
            ));
        }

        let split = split_increment(incremental, &self.config)?;
        Ok(SettlementOutcome {
            contract_id: contract.id,
            claimed_counter: claim.claimed_counter,
            height,
            entitlement,
            provider_share: split.provider_share,
            reserve_share: split.reserve_share,
            paid_after: entitlement,
        })
    }

    /// Move a prepared outcome's shares out of the escrow pool and advance
    /// `paid` and `last_settled_counter`. A no-op outcome changes nothing.
    ///
    /// # Errors
    /// `InsufficientPooledFunds` if the pool cannot cover the increment;
    /// `InvalidContract` if `outcome` was prepared for a different record.
    /// Nothing changes on error.
    pub fn apply<L: BalanceLedger + ?Sized>(
        &self,
        contract: &mut Contract,
        outcome: &SettlementOutcome,
        ledger: &mut L,
    ) -> Result<()> {
        if outcome.is_noop() {
            return Ok(());
        }
        let incremental = outcome.total_moved();
        if outcome.contract_id != contract.id
            || contract.paid.checked_add(incremental) != Some(outcome.paid_after)
        {
            return Err(MeterpayError::InvalidContract {
                reason: format!(
                    "outcome for {} paying {incremental} to reach {} does not fit {} with paid {}",
                    outcome.contract_id, outcome.paid_after, contract.id, contract.paid
                ),
            });
        }

        let escrow = &self.config.escrow_account;
        let available = ledger.balance_of(escrow);
        if available < incremental {
            tracing::error!(
                contract = %contract.id,
                needed = incremental,
                available,
                "Escrow pool cannot cover capped entitlement"
            );
            return Err(MeterpayError::InsufficientPooledFunds {
                needed: incremental,
                available,
            });
        }

        let provider_account = AccountId::for_key(&contract.provider);
        let legs = [
            Transfer::new(escrow.clone(), provider_account, outcome.provider_share),
            Transfer::new(
                escrow.clone(),
                self.config.reserve_account.clone(),
                outcome.reserve_share,
            ),
        ];
        ledger.transfer_all(&legs).map_err(|err| match err {
            MeterpayError::InsufficientFunds {
                account, available, ..
            } if account == *escrow => MeterpayError::InsufficientPooledFunds {
                needed: incremental,
                available,
            },
            other => other,
        })?;

        contract.paid = outcome.paid_after;
        contract.last_settled_counter = contract
            .last_settled_counter
            .max(outcome.claimed_counter);

        tracing::info!(
            contract = %contract.id,
            provider = %contract.provider.short(),
            counter = outcome.claimed_counter,
            height = outcome.height,
            provider_share = outcome.provider_share,
            reserve_share = outcome.reserve_share,
            paid = contract.paid,
            deposit = contract.deposit,
            digest = %outcome.digest_hex(),
            "Contract income settled"
        );
        Ok(())
    }
}
