// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `DataLoader`: the injected network transport (`spec.md` §6).

use async_trait::async_trait;
use bytes::Bytes;

use crate::entities::{Request, TransportResponse};
use crate::error::ImagePipelineError;

/// A chunk of bytes delivered by a `DataLoader`, paired with the response
/// metadata known at the time of delivery.
#[derive(Debug, Clone)]
pub struct DataChunk {
    pub bytes: Bytes,
    pub response: TransportResponse,
}

/// A handle that can cancel an in-flight `DataLoader::load` call. Dropping it
/// does not cancel the load; callers must call `cancel()` explicitly,
/// mirroring the explicit `CancelHandle` contract in `spec.md` §6.
pub trait LoadHandle: Send + Sync {
    fn cancel(&self);
}

/// Reports chunks and completion for one `DataLoader::load` call.
///
/// `on_chunk` may be invoked zero or more times before `on_complete`. Both
/// are invoked off the pipeline context; the orchestrator re-enters its own
/// context before touching any shared state (`spec.md` §5).
#[async_trait]
pub trait DataLoaderSink: Send + Sync {
    async fn on_chunk(&self, chunk: DataChunk);
    async fn on_complete(&self, error: Option<ImagePipelineError>);
}

/// A request to resume a previously interrupted download: "fetch from
/// `from_byte` onward, conditional on the resource still matching
/// `validator`" (an `ETag`/`Last-Modified`-shaped opaque token). The loader
/// reports whether the server honored it via
/// `TransportResponse::is_partial_content`.
#[derive(Debug, Clone)]
pub struct ResumeHint {
    pub from_byte: u64,
    pub validator: String,
}

/// The injected network transport. Implementations perform the actual I/O
/// (and the byte-level HTTP resume negotiation, out of scope for the core:
/// `spec.md` §1) and report results through `sink`.
#[async_trait]
pub trait DataLoader: Send + Sync {
    async fn load(
        &self,
        request: &Request,
        resume: Option<ResumeHint>,
        sink: std::sync::Arc<dyn DataLoaderSink>,
    ) -> Box<dyn LoadHandle>;
}
