//! Remote fallback for cache misses.

use meterpay_types::{Contract, MeterpayError, Result};

use crate::cache::contract_key;

/// Source of truth consulted when the cache does not hold a key.
pub trait ContractFetcher {
    /// # Errors
    /// Returns [`MeterpayError::FetchFailed`] if the contract cannot be
    /// retrieved or decoded.
    fn fetch(&self, key: &str) -> Result<Contract>;
}

/// Fetcher for caches that are populated only through `put`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemote;

impl ContractFetcher for NoRemote {
    fn fetch(&self, key: &str) -> Result<Contract> {
        Err(MeterpayError::FetchFailed {
            key: key.to_string(),
            reason: "no remote source configured".into(),
        })
    }
}

/// Decodes contracts served as JSON under `{base_url}/{key}`.
///
/// The transport is injected as `get`, which returns the response body for
/// a URL; this crate carries no HTTP client of its own. Any transport error
/// is reported as `FetchFailed` for the key.
pub struct JsonFetcher<G> {
    base_url: String,
    get: G,
}

impl<G> JsonFetcher<G>
where
    G: Fn(&str) -> Result<String>,
{
    /// Fetcher rooted at `base_url`; a trailing `/` is ignored.
    pub fn new(base_url: impl Into<String>, get: G) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            get,
        }
    }

    /// Full URL queried for `key`.
    #[must_use]
    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{key}", self.base_url)
    }
}

impl<G> ContractFetcher for JsonFetcher<G>
where
    G: Fn(&str) -> Result<String>,
{
    fn fetch(&self, key: &str) -> Result<Contract> {
        let failed = |reason: String| MeterpayError::FetchFailed {
            key: key.to_string(),
            reason,
        };

        let body = (self.get)(&self.url_for(key)).map_err(|e| match e {
            MeterpayError::FetchFailed { reason, .. } => failed(reason),
            other => failed(other.to_string()),
        })?;
        let contract: Contract =
            serde_json::from_str(&body).map_err(|e| failed(format!("decode: {e}")))?;

        let served = contract_key(&contract);
        if served != key {
            return Err(failed(format!("remote returned contract for {served}")));
        }
        Ok(contract)
    }
}
