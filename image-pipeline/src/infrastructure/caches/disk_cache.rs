// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Default `DataCache`: an in-process, `dashmap`-backed key→bytes store
//! keyed by URL string (`spec.md` §6). A minimal stand-in behind the
//! `DataCache` port, not the disk cache's block layout or eviction policy,
//! which `spec.md` §1 places out of scope. A `yield_now` hop keeps the
//! trait honestly asynchronous even though this reference impl never
//! actually touches a disk.

use bytes::Bytes;
use dashmap::DashMap;
use image_pipeline_domain::services::DataCache;

#[derive(Default)]
pub struct InProcessDataCache {
    entries: DashMap<String, Bytes>,
}

impl InProcessDataCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl DataCache for InProcessDataCache {
    async fn lookup(&self, key: &str) -> Option<Bytes> {
        tokio::task::yield_now().await;
        self.entries.get(key).map(|entry| entry.clone())
    }

    async fn store(&self, key: &str, bytes: Bytes) {
        tokio::task::yield_now().await;
        self.entries.insert(key.to_string(), bytes);
    }
}
