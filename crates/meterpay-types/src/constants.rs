//! System-wide constants for MeterPay settlement.

/// Domain separator for the canonical claim signing payload.
pub const CLAIM_DOMAIN: &[u8] = b"meterpay:claim:v1:";

/// Domain separator for settlement outcome digests.
pub const OUTCOME_DOMAIN: &[u8] = b"meterpay:outcome:v1:";

/// Default protocol reserve tax, in percent of every settled increment.
pub const DEFAULT_RESERVE_TAX_PERCENT: i64 = 10;

/// Default name of the module account holding all contract deposits.
pub const DEFAULT_ESCROW_MODULE: &str = "contract";

/// Default name of the protocol reserve module account.
pub const DEFAULT_RESERVE_MODULE: &str = "reserve";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "MeterPay";
