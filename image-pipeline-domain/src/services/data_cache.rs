// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `DataCache`: the injected, optional disk cache (`spec.md` §6).
//!
//! Keys are URL strings. Lookup is async and cancellable; store is
//! fire-and-forget from the orchestrator's point of view. The disk cache's
//! block layout, eviction policy, and count/size enforcement are private to
//! the implementation (`spec.md` §1) — the port only describes the
//! lookup/store shape the pipeline depends on.

use async_trait::async_trait;
use bytes::Bytes;

/// Optional, async byte-cache keyed by request URL.
#[async_trait]
pub trait DataCache: Send + Sync {
    /// Looks up cached bytes for `key`. `None` is a cache miss; the lookup
    /// itself must remain cancellable (`spec.md` §4.4: "The disk probe is
    /// cancellable; a cancelled probe aborts the session"), so implementors
    /// should honor task cancellation internally rather than relying on the
    /// caller to abandon the future (dropping a future does not always mean
    /// the underlying I/O stopped).
    async fn lookup(&self, key: &str) -> Option<Bytes>;

    async fn store(&self, key: &str, bytes: Bytes);
}
