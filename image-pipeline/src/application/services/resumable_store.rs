// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Process-wide store of partial downloads, keyed by request URL
//! (`spec.md` §3, §4.4). Cleared when the server refuses resumption or the
//! final image is delivered.

use std::sync::Arc;

use dashmap::DashMap;
use image_pipeline_domain::entities::ResumableData;
use url::Url;

/// Process-wide `DashMap<Url, ResumableData>`, shared by every load session.
#[derive(Clone, Default)]
pub struct ResumableStore {
    inner: Arc<DashMap<Url, ResumableData>>,
}

impl ResumableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &Url) -> Option<ResumableData> {
        self.inner.get(url).map(|entry| entry.clone())
    }

    pub fn put(&self, url: Url, data: ResumableData) {
        self.inner.insert(url, data);
    }

    pub fn clear(&self, url: &Url) {
        self.inner.remove(url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn round_trips_a_record() {
        let store = ResumableStore::new();
        let url = Url::parse("https://example.com/a.png").unwrap();
        store.put(url.clone(), ResumableData::new("etag-1", Bytes::from_static(b"abc")));

        let found = store.get(&url).unwrap();
        assert_eq!(found.validator(), "etag-1");
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn clear_removes_the_record() {
        let store = ResumableStore::new();
        let url = Url::parse("https://example.com/a.png").unwrap();
        store.put(url.clone(), ResumableData::new("etag-1", Bytes::from_static(b"abc")));
        store.clear(&url);
        assert!(store.get(&url).is_none());
    }
}
