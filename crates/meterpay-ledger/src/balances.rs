//! Balance ledger seam.
//!
//! Settlement never writes balances directly: every movement goes through
//! [`BalanceLedger::transfer`] or the atomic [`BalanceLedger::transfer_all`].
//! Transfers fail closed: an insufficient source leaves every balance as it was.

use std::collections::BTreeMap;

use meterpay_types::{AccountId, Amount, MeterpayError, Result, Transfer};

/// Named accounts with atomic debit/credit transfers.
pub trait BalanceLedger {
    /// Current balance of `account` (zero if unknown).
    fn balance_of(&self, account: &AccountId) -> Amount;

    /// Move `amount` from `from` to `to`.
    ///
    /// # Errors
    /// Returns [`MeterpayError::InsufficientFunds`] if `from` holds less
    /// than `amount`. Nothing changes on error.
    fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<()>;

    /// Apply every leg or none.
    ///
    /// The default applies legs in order and undoes the applied ones in
    /// reverse if a later leg fails. Ledgers with native batching should
    /// override it.
    fn transfer_all(&mut self, transfers: &[Transfer]) -> Result<()> {
        for (applied, leg) in transfers.iter().enumerate() {
            if let Err(err) = self.transfer(&leg.from, &leg.to, leg.amount) {
                // Reverse order restores each intermediate state exactly.
                for done in transfers[..applied].iter().rev() {
                    if let Err(undo) = self.transfer(&done.to, &done.from, done.amount) {
                        tracing::error!(
                            leg = %err,
                            undo = %undo,
                            "Transfer batch rollback failed; ledger left partially applied"
                        );
                        return Err(MeterpayError::Internal(format!(
                            "rollback failed after {err}: {undo}"
                        )));
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }
}

/// In-process ledger keyed by account name.
///
/// `BTreeMap` keeps iteration order stable so supply sums and snapshots
/// are identical across replicas.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    balances: BTreeMap<AccountId, Amount>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            balances: BTreeMap::new(),
        }
    }

    /// Credit `amount` out of thin air (genesis funding / deposits).
    ///
    /// # Errors
    /// Returns [`MeterpayError::BalanceOverflow`] if the credit overflows.
    pub fn mint(&mut self, account: &AccountId, amount: Amount) -> Result<()> {
        let entry = self.balances.entry(account.clone()).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| MeterpayError::BalanceOverflow(account.clone()))?;
        Ok(())
    }

    /// Sum of every account balance.
    #[must_use]
    pub fn total_supply(&self) -> u128 {
        self.balances.values().map(|b| u128::from(*b)).sum()
    }

    /// Number of accounts ever touched.
    #[must_use]
    pub fn account_count(&self) -> usize {
        self.balances.len()
    }
}

impl BalanceLedger for InMemoryLedger {
    fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<()> {
        self.transfer_all(&[Transfer::new(from.clone(), to.clone(), amount)])
    }

    fn transfer_all(&mut self, transfers: &[Transfer]) -> Result<()> {
        // Stage every touched account, commit only if all legs apply.
        let mut staged: BTreeMap<AccountId, Amount> = BTreeMap::new();

        for leg in transfers.iter().filter(|t| !t.is_zero()) {
            let available = staged
                .get(&leg.from)
                .copied()
                .unwrap_or_else(|| self.balance_of(&leg.from));
            if available < leg.amount {
                return Err(MeterpayError::InsufficientFunds {
                    account: leg.from.clone(),
                    needed: leg.amount,
                    available,
                });
            }
            staged.insert(leg.from.clone(), available - leg.amount);

            let current = staged
                .get(&leg.to)
                .copied()
                .unwrap_or_else(|| self.balance_of(&leg.to));
            let credited = current
                .checked_add(leg.amount)
                .ok_or_else(|| MeterpayError::BalanceOverflow(leg.to.clone()))?;
            staged.insert(leg.to.clone(), credited);
        }

        for leg in transfers.iter().filter(|t| !t.is_zero()) {
            tracing::trace!(from = %leg.from, to = %leg.to, amount = leg.amount, "Transfer applied");
        }
        self.balances.extend(staged);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> AccountId {
        AccountId::module("contract")
    }

    fn provider() -> AccountId {
        AccountId::new("acct:provider")
    }

    fn reserve() -> AccountId {
        AccountId::module("reserve")
    }

    /// Ledger relying on the trait's default `transfer_all`.
    #[derive(Default)]
    struct SequentialLedger {
        inner: InMemoryLedger,
    }

    impl BalanceLedger for SequentialLedger {
        fn balance_of(&self, account: &AccountId) -> Amount {
            self.inner.balance_of(account)
        }

        fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<()> {
            self.inner.transfer(from, to, amount)
        }
    }

    #[test]
    fn mint_increases_balance() {
        let mut ledger = InMemoryLedger::new();
        ledger.mint(&pool(), 1000).unwrap();
        assert_eq!(ledger.balance_of(&pool()), 1000);
        assert_eq!(ledger.total_supply(), 1000);
    }

    #[test]
    fn unknown_account_is_zero() {
        let ledger = InMemoryLedger::new();
        assert_eq!(ledger.balance_of(&provider()), 0);
    }

    #[test]
    fn transfer_moves_funds() {
        let mut ledger = InMemoryLedger::new();
        ledger.mint(&pool(), 1000).unwrap();
        ledger.transfer(&pool(), &provider(), 180).unwrap();
        assert_eq!(ledger.balance_of(&pool()), 820);
        assert_eq!(ledger.balance_of(&provider()), 180);
        assert_eq!(ledger.total_supply(), 1000);
    }

    #[test]
    fn transfer_insufficient_fails_closed() {
        let mut ledger = InMemoryLedger::new();
        ledger.mint(&pool(), 100).unwrap();
        let err = ledger.transfer(&pool(), &provider(), 200).unwrap_err();
        assert!(matches!(
            err,
            MeterpayError::InsufficientFunds {
                needed: 200,
                available: 100,
                ..
            }
        ));
        assert_eq!(ledger.balance_of(&pool()), 100);
        assert_eq!(ledger.balance_of(&provider()), 0);
    }

    #[test]
    fn mint_overflow_rejected() {
        let mut ledger = InMemoryLedger::new();
        ledger.mint(&pool(), Amount::MAX).unwrap();
        let err = ledger.mint(&pool(), 1).unwrap_err();
        assert!(matches!(err, MeterpayError::BalanceOverflow(_)));
        assert_eq!(ledger.balance_of(&pool()), Amount::MAX);
    }

    #[test]
    fn transfer_all_is_atomic() {
        let mut ledger = InMemoryLedger::new();
        ledger.mint(&pool(), 100).unwrap();
        let legs = [
            Transfer::new(pool(), provider(), 90),
            Transfer::new(pool(), reserve(), 20),
        ];
        assert!(ledger.transfer_all(&legs).is_err());
        assert_eq!(ledger.balance_of(&pool()), 100);
        assert_eq!(ledger.balance_of(&provider()), 0);
        assert_eq!(ledger.balance_of(&reserve()), 0);
    }

    #[test]
    fn transfer_all_applies_every_leg() {
        let mut ledger = InMemoryLedger::new();
        ledger.mint(&pool(), 1000).unwrap();
        let legs = [
            Transfer::new(pool(), provider(), 180),
            Transfer::new(pool(), reserve(), 20),
        ];
        ledger.transfer_all(&legs).unwrap();
        assert_eq!(ledger.balance_of(&pool()), 800);
        assert_eq!(ledger.balance_of(&provider()), 180);
        assert_eq!(ledger.balance_of(&reserve()), 20);
    }

    #[test]
    fn transfer_all_skips_zero_legs() {
        let mut ledger = InMemoryLedger::new();
        let legs = [Transfer::new(pool(), provider(), 0)];
        ledger.transfer_all(&legs).unwrap();
        assert_eq!(ledger.account_count(), 0);
    }

    #[test]
    fn default_transfer_all_rolls_back() {
        let mut ledger = SequentialLedger::default();
        ledger.inner.mint(&pool(), 100).unwrap();
        let legs = [
            Transfer::new(pool(), provider(), 90),
            Transfer::new(pool(), reserve(), 20),
        ];
        let err = ledger.transfer_all(&legs).unwrap_err();
        assert!(matches!(err, MeterpayError::InsufficientFunds { .. }));
        assert_eq!(ledger.balance_of(&pool()), 100);
        assert_eq!(ledger.balance_of(&provider()), 0);
        assert_eq!(ledger.balance_of(&reserve()), 0);
    }

    #[test]
    fn default_transfer_all_rolls_back_chained_legs() {
        let mut ledger = SequentialLedger::default();
        ledger.inner.mint(&pool(), 50).unwrap();
        // pool -> provider -> reserve, then a leg that cannot be covered.
        let legs = [
            Transfer::new(pool(), provider(), 50),
            Transfer::new(provider(), reserve(), 50),
            Transfer::new(pool(), reserve(), 1),
        ];
        assert!(ledger.transfer_all(&legs).is_err());
        assert_eq!(ledger.balance_of(&pool()), 50);
        assert_eq!(ledger.balance_of(&provider()), 0);
        assert_eq!(ledger.balance_of(&reserve()), 0);
    }

    /// Refuses every credit into the pool, so rollbacks cannot complete.
    #[derive(Default)]
    struct NoRefundLedger {
        inner: InMemoryLedger,
    }

    impl BalanceLedger for NoRefundLedger {
        fn balance_of(&self, account: &AccountId) -> Amount {
            self.inner.balance_of(account)
        }

        fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<()> {
            if *to == pool() {
                return Err(MeterpayError::Internal("pool refuses credits".into()));
            }
            self.inner.transfer(from, to, amount)
        }
    }

    #[test]
    fn failed_rollback_reports_both_errors() {
        let mut ledger = NoRefundLedger::default();
        ledger.inner.mint(&pool(), 60).unwrap();
        let legs = [
            Transfer::new(pool(), provider(), 50),
            Transfer::new(pool(), reserve(), 100),
        ];

        let err = ledger.transfer_all(&legs).unwrap_err();
        let MeterpayError::Internal(reason) = err else {
            panic!("expected Internal, got {err:?}");
        };
        assert!(reason.contains("MP_ERR_300"), "{reason}");
        assert!(reason.contains("pool refuses credits"), "{reason}");
    }
}
