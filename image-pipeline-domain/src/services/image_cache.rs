// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `ImageCache`: the injected, optional in-memory decoded-image cache
//! (`spec.md` §6).
//!
//! Unlike `DataCache`, lookups here are synchronous: the cache holds
//! already-decoded `Image`s in process memory, so there is no I/O to await.
//! The pipeline consults it before admission when a request opts in via
//! `Request::memory_cache_read`, and populates it after a successful
//! terminal decode when `Request::memory_cache_write` is set.

use crate::entities::{Request, Response};

/// Synchronous, in-process cache of decoded `Response`s keyed by request.
pub trait ImageCache: Send + Sync {
    /// Looks up a cached response for `request`. Implementations decide how
    /// `request` maps to a key (typically its `LoadingKey`'s derived digest,
    /// ignoring the cache-read/write/dedup flags themselves).
    fn get(&self, request: &Request) -> Option<Response>;

    fn put(&self, request: &Request, response: Response);
}
