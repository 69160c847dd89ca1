// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! A fingerprint identifying "requests that would fetch identical bytes".

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use sha2::{Digest, Sha256};
use url::Url;

/// Fingerprint over the request fields that affect which bytes get fetched:
/// URL plus cache-policy bits, excluding the processor (`spec.md` §3). Two
/// requests with the same `LoadingKey` may share a `LoadSession`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadingKey(String);

impl LoadingKey {
    /// Derives the loading key for a request that participates in
    /// deduplication: a SHA-256 fingerprint over the URL and the
    /// cache-read/write flags.
    pub fn derive(url: &Url, memory_cache_read: bool, memory_cache_write: bool) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(url.as_str().as_bytes());
        hasher.update([memory_cache_read as u8, memory_cache_write as u8]);
        Self(hex::encode(hasher.finalize()))
    }

    /// Produces a fresh, never-reused key. Used when deduplication is
    /// disabled (`spec.md` §6, `is_deduplication_enabled = false`): every
    /// task gets its own session identity even for an identical URL.
    pub fn fresh() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("unique:{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LoadingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn identical_requests_derive_identical_keys() {
        let a = LoadingKey::derive(&url("https://example.com/a.png"), true, true);
        let b = LoadingKey::derive(&url("https://example.com/a.png"), true, true);
        assert_eq!(a, b);
    }

    #[test]
    fn differing_urls_derive_different_keys() {
        let a = LoadingKey::derive(&url("https://example.com/a.png"), true, true);
        let b = LoadingKey::derive(&url("https://example.com/b.png"), true, true);
        assert_ne!(a, b);
    }

    #[test]
    fn cache_policy_bits_affect_the_key() {
        let a = LoadingKey::derive(&url("https://example.com/a.png"), true, true);
        let b = LoadingKey::derive(&url("https://example.com/a.png"), false, true);
        assert_ne!(a, b);
    }

    #[test]
    fn fresh_keys_are_never_equal() {
        assert_ne!(LoadingKey::fresh(), LoadingKey::fresh());
    }

    proptest::proptest! {
        /// Deriving a key is a pure function of its inputs: same URL, same
        /// cache-policy bits always yields the same key; the round trip the
        /// memory cache relies on (`spec.md` §8).
        #[test]
        fn derive_is_deterministic(path in "[a-z0-9/]{1,16}", read in proptest::bool::ANY, write in proptest::bool::ANY) {
            let u = url(&format!("https://example.com/{path}"));
            let a = LoadingKey::derive(&u, read, write);
            let b = LoadingKey::derive(&u, read, write);
            proptest::prop_assert_eq!(a, b);
        }
    }
}
