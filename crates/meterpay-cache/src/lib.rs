//! # meterpay-cache
//!
//! Provider-side view of contracts. A provider serving metered requests
//! needs the contract terms for every `(provider, service, client)` triple
//! it sees; this crate keeps them in memory and falls back to the chain's
//! query endpoint on a miss.
//!
//! The cache is advisory only. Settlement always reads the authoritative
//! store from `meterpay-ledger`.

pub mod cache;
pub mod fetcher;

pub use cache::{contract_key, ContractCache};
pub use fetcher::{ContractFetcher, JsonFetcher, NoRemote};
