//! # meterpay-types
//!
//! Shared types, errors, and configuration for **MeterPay** contract settlement.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`ContractId`], [`PubKey`], [`ServiceId`], [`AccountId`]
//! - **Contract model**: [`Contract`], [`MeterType`], [`ContractState`]
//! - **Claim model**: [`Claim`]
//! - **Settlement results**: [`SettlementOutcome`]
//! - **Balance model**: [`Amount`], [`Transfer`]
//! - **Configuration**: [`SettlementConfig`]
//! - **Errors**: [`MeterpayError`] with `MP_ERR_` prefix codes
//! - **Constants**: domain separators and defaults

pub mod balance;
pub mod claim;
pub mod config;
pub mod constants;
pub mod contract;
pub mod error;
pub mod ids;
pub mod outcome;

// Re-export all primary types at crate root for ergonomic imports:
//   use meterpay_types::{Contract, Claim, SettlementOutcome, ...};

pub use balance::*;
pub use claim::*;
pub use config::*;
pub use contract::*;
pub use error::*;
pub use ids::*;
pub use outcome::*;

// Constants are accessed via `meterpay_types::constants::FOO`
// (not re-exported to avoid name collisions).
