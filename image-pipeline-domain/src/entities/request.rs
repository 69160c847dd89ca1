// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The `Request` value: what to load, with what policy.

use std::sync::Arc;

use url::Url;

use crate::services::Processor;
use crate::value_objects::{LoadingKey, Priority, ProcessorIdentity};

/// A request for one image. Immutable except for the priority a `Task` wraps
/// it in, which may be changed after submission (`spec.md` §3).
#[derive(Clone)]
pub struct Request {
    url: Url,
    priority: Priority,
    processor: Option<Arc<dyn Processor>>,
    memory_cache_read: bool,
    memory_cache_write: bool,
    deduplication_enabled: bool,
}

impl Request {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            priority: Priority::Normal,
            processor: None,
            memory_cache_read: true,
            memory_cache_write: true,
            deduplication_enabled: true,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_processor(mut self, processor: Arc<dyn Processor>) -> Self {
        self.processor = Some(processor);
        self
    }

    pub fn with_memory_cache_read(mut self, enabled: bool) -> Self {
        self.memory_cache_read = enabled;
        self
    }

    pub fn with_memory_cache_write(mut self, enabled: bool) -> Self {
        self.memory_cache_write = enabled;
        self
    }

    /// Only meaningful when `isDeduplicationEnabled` is `false` at the
    /// pipeline level; a single request can still opt out individually.
    pub fn with_deduplication_enabled(mut self, enabled: bool) -> Self {
        self.deduplication_enabled = enabled;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }

    pub fn processor(&self) -> Option<&Arc<dyn Processor>> {
        self.processor.as_ref()
    }

    pub fn processor_identity(&self) -> Option<ProcessorIdentity> {
        self.processor.as_ref().map(|p| p.identity())
    }

    pub fn memory_cache_read(&self) -> bool {
        self.memory_cache_read
    }

    pub fn memory_cache_write(&self) -> bool {
        self.memory_cache_write
    }

    pub fn deduplication_enabled(&self) -> bool {
        self.deduplication_enabled
    }

    /// Derives the loading key that identifies "requests that would fetch
    /// identical bytes" — excludes the processor (`spec.md` §3).
    pub fn loading_key(&self) -> LoadingKey {
        if self.deduplication_enabled {
            LoadingKey::derive(&self.url, self.memory_cache_read, self.memory_cache_write)
        } else {
            LoadingKey::fresh()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_priority_is_normal() {
        let req = Request::new(Url::parse("https://example.com/a.png").unwrap());
        assert_eq!(req.priority(), Priority::Normal);
    }

    #[test]
    fn loading_key_ignores_processor() {
        let url = Url::parse("https://example.com/a.png").unwrap();
        let plain = Request::new(url.clone());
        assert_eq!(plain.loading_key(), plain.loading_key());
    }

    #[test]
    fn deduplication_disabled_yields_fresh_keys_each_time() {
        let url = Url::parse("https://example.com/a.png").unwrap();
        let req = Request::new(url).with_deduplication_enabled(false);
        assert_ne!(req.loading_key(), req.loading_key());
    }
}
