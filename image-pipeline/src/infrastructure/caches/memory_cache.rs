// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Default `ImageCache`: an in-process, `dashmap`-backed key→`Response`
//! store. This is a minimal stand-in behind the `ImageCache` port, not the
//! memory cache eviction policy `spec.md` §1 places out of scope — it never
//! evicts.

use dashmap::DashMap;
use image_pipeline_domain::entities::{Request, Response};
use image_pipeline_domain::services::ImageCache;

/// Keyed by the request's loading key (`spec.md` §6: round-trip property),
/// so a request and its cached counterpart must share URL and cache-policy
/// bits to hit.
#[derive(Default)]
pub struct InProcessImageCache {
    entries: DashMap<String, Response>,
}

impl InProcessImageCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ImageCache for InProcessImageCache {
    fn get(&self, request: &Request) -> Option<Response> {
        self.entries.get(request.loading_key().as_str()).map(|entry| entry.clone())
    }

    fn put(&self, request: &Request, response: Response) {
        self.entries.insert(request.loading_key().as_str().to_string(), response);
    }
}
