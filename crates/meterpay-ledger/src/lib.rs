//! # meterpay-ledger
//!
//! The replicated ledger's collaborators, as seen by settlement:
//!
//! 1. **BalanceLedger**: named accounts with atomic, fail-closed transfers
//! 2. **ContractStore**: contract records by id
//! 3. **HeightProvider**: the current block height
//!
//! Each seam is a trait with an in-process implementation used by tests and
//! by single-node hosts.

pub mod balances;
pub mod height;
pub mod store;

pub use balances::{BalanceLedger, InMemoryLedger};
pub use height::{HeightProvider, ManualHeight};
pub use store::{ContractStore, MemoryContractStore};
