//! # meterpay-settlement
//!
//! **Contract income settlement**: claim validation, metering, reserve
//! split, and fund routing out of the escrow pool.
//!
//! ## Architecture
//!
//! A provider's claim flows through:
//! 1. **ClaimValidator**: contract exists, not closed, client signature valid
//! 2. **Metering policy**: capped cumulative entitlement (usage or height)
//! 3. **SettlementEngine**: increment since last settlement, split, atomic transfers
//! 4. **ConservationAudit**: provider + reserve + remaining == deposit
//!
//! [`ClaimProcessor`] runs the whole pipeline against the ledger seams from
//! `meterpay-ledger`. Everything is synchronous and deterministic: the same
//! claim sequence yields the same balances and outcome digests on every
//! replica.

pub mod conservation;
pub mod engine;
pub mod metering;
pub mod processor;
pub mod split;
pub mod validator;
pub mod verifier;

pub use conservation::{ConservationAudit, ContractTally};
pub use engine::SettlementEngine;
pub use metering::{entitlement, metered_quantity, MeteredQuantity};
pub use processor::ClaimProcessor;
pub use split::{split_increment, ReserveSplit};
pub use validator::ClaimValidator;
pub use verifier::{Ed25519Verifier, SignatureVerifier};
