//! # Contract — the prepaid escrow record
//!
//! A client escrows `deposit` up front; the provider claims what it has
//! earned so far and the settlement engine moves that portion out of the
//! escrow pool. `paid` only ever grows, and never past `deposit`.
//!
//! ## Settlement progress
//!
//! ```text
//!   ┌──────┐  claim reaches deposit   ┌───────────┐
//!   │ OPEN ├─────────────────────────▶│ EXHAUSTED │
//!   └──┬───┘                          └─────┬─────┘
//!      │ height > start + duration          │
//!      │ or closed_height reached           │
//!      ▼                                    ▼
//!   ┌────────┐◀─────────────────────────────┘
//!   │ CLOSED │
//!   └────────┘
//! ```
//!
//! `CLOSED` is a classification by height, never a stored transition: the
//! record keeps its last financial state forever.

use serde::{Deserialize, Serialize};

use crate::{Amount, ContractId, MeterpayError, PubKey, Result, ServiceId};

/// How a contract's entitlement accrues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeterType {
    /// `rate` per call; the client signs a cumulative call count.
    UsageCounted,
    /// `rate` per elapsed ledger height inside the contract window.
    HeightElapsed,
}

impl std::fmt::Display for MeterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UsageCounted => write!(f, "USAGE_COUNTED"),
            Self::HeightElapsed => write!(f, "HEIGHT_ELAPSED"),
        }
    }
}

/// Read-only settlement classification at a given height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractState {
    /// Within the window, deposit not yet fully paid out.
    Open,
    /// Within the window, `paid == deposit`. Claims are accepted as no-ops.
    Exhausted,
    /// Past the window or explicitly closed. Claims are rejected.
    Closed,
}

impl std::fmt::Display for ContractState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Exhausted => write!(f, "EXHAUSTED"),
            Self::Closed => write!(f, "CLOSED"),
        }
    }
}

/// The escrow agreement between a provider and a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    /// Party that earns income.
    pub provider: PubKey,
    /// Party that funded the deposit and signs claims.
    pub client: PubKey,
    pub service: ServiceId,
    pub meter_type: MeterType,
    /// Price per call or per elapsed height.
    pub rate: Amount,
    /// Height at which metering begins.
    pub start_height: i64,
    /// Number of heights the contract stays open.
    pub duration: i64,
    /// Total escrowed for this contract.
    pub deposit: Amount,
    /// Cumulative amount already paid to provider + reserve.
    pub paid: Amount,
    /// Highest counter that produced a payout.
    pub last_settled_counter: i64,
    /// Height of an explicit close, if any.
    pub closed_height: Option<i64>,
}

impl Contract {
    /// A freshly created contract with nothing paid out.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        id: ContractId,
        provider: PubKey,
        client: PubKey,
        service: ServiceId,
        meter_type: MeterType,
        rate: Amount,
        start_height: i64,
        duration: i64,
        deposit: Amount,
    ) -> Self {
        Self {
            id,
            provider,
            client,
            service,
            meter_type,
            rate,
            start_height,
            duration,
            deposit,
            paid: 0,
            last_settled_counter: 0,
            closed_height: None,
        }
    }

    /// Last height at which claims are still accepted.
    #[must_use]
    pub fn end_height(&self) -> i64 {
        self.start_height.saturating_add(self.duration)
    }

    /// Whether claims at `height` must be rejected.
    #[must_use]
    pub fn is_closed(&self, height: i64) -> bool {
        height > self.end_height() || self.closed_height.is_some_and(|closed| height >= closed)
    }

    /// Settlement classification at `height`.
    #[must_use]
    pub fn state(&self, height: i64) -> ContractState {
        if self.is_closed(height) {
            ContractState::Closed
        } else if self.paid >= self.deposit {
            ContractState::Exhausted
        } else {
            ContractState::Open
        }
    }

    /// Funds still held in escrow for this contract.
    #[must_use]
    pub fn remaining(&self) -> Amount {
        self.deposit.saturating_sub(self.paid)
    }

    /// Record an explicit close. The earliest close wins.
    pub fn close_at(&mut self, height: i64) {
        self.closed_height = Some(match self.closed_height {
            Some(existing) => existing.min(height),
            None => height,
        });
    }

    /// Structural checks on a stored record.
    ///
    /// # Errors
    /// Returns [`MeterpayError::InvalidContract`] when `paid > deposit` or
    /// the window is negative.
    pub fn validate(&self) -> Result<()> {
        if self.paid > self.deposit {
            return Err(MeterpayError::InvalidContract {
                reason: format!(
                    "{}: paid {} exceeds deposit {}",
                    self.id, self.paid, self.deposit
                ),
            });
        }
        if self.duration < 0 {
            return Err(MeterpayError::InvalidContract {
                reason: format!("{}: negative duration {}", self.id, self.duration),
            });
        }
        Ok(())
    }
}

/// Dummy contract for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Contract {
    /// A contract with random party keys, `start_height = 0` and
    /// `duration = 100`.
    pub fn dummy(id: u64, meter_type: MeterType, rate: Amount, deposit: Amount) -> Self {
        Self::new(
            ContractId(id),
            PubKey(rand::random::<[u8; 32]>()),
            PubKey(rand::random::<[u8; 32]>()),
            ServiceId::new("btc-mainnet"),
            meter_type,
            rate,
            0,
            100,
            deposit,
        )
    }
}
