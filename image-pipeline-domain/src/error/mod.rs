// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! A flat, `Clone`-able error taxonomy for the image loading pipeline.
//! Network and decode failures are session-wide; processing failures are
//! per-task (see `ImagePipelineError::is_per_task`).

use thiserror::Error;

/// Domain-specific errors for the image loading pipeline.
#[derive(Error, Debug, Clone)]
pub enum ImagePipelineError {
    /// The network transport failed while fetching bytes for a session.
    /// Session-wide: fails every subscriber of the load session.
    #[error("data loading failed: {0}")]
    DataLoadingFailed(String),

    /// No decoder could be constructed from the sampled bytes, or the
    /// decoder returned no image for final-stage bytes. Session-wide.
    #[error("decoding failed: {0}")]
    DecodingFailed(String),

    /// A processor returned no image for a task's input. Per-task: only the
    /// owning task fails, other subscribers of the same load session keep
    /// their results.
    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    /// A disk or memory cache backend failed an operation it was expected to
    /// perform infallibly from the pipeline's point of view (e.g. a disk
    /// read I/O error). Treated as a cache miss by callers; surfaced here so
    /// infrastructure adapters have somewhere to report it.
    #[error("cache error: {0}")]
    CacheError(String),

    /// Malformed or missing configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Metrics collection/export failure. Never propagated to task
    /// completion callbacks; logged and swallowed by callers.
    #[error("metrics error: {0}")]
    MetricsError(String),

    /// Unexpected internal invariant violation.
    #[error("internal error: {0}")]
    InternalError(String),
}

impl ImagePipelineError {
    pub fn data_loading_failed(msg: impl Into<String>) -> Self {
        Self::DataLoadingFailed(msg.into())
    }

    pub fn decoding_failed(msg: impl Into<String>) -> Self {
        Self::DecodingFailed(msg.into())
    }

    pub fn processing_failed(msg: impl Into<String>) -> Self {
        Self::ProcessingFailed(msg.into())
    }

    pub fn cache_error(msg: impl Into<String>) -> Self {
        Self::CacheError(msg.into())
    }

    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub fn metrics_error(msg: impl Into<String>) -> Self {
        Self::MetricsError(msg.into())
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    /// Errors in network and decode stages are session-wide: every
    /// subscriber of the load session receives the same failure.
    pub fn is_session_wide(&self) -> bool {
        matches!(self, Self::DataLoadingFailed(_) | Self::DecodingFailed(_))
    }

    /// Processing failures are per-task: only the owning task fails.
    pub fn is_per_task(&self) -> bool {
        matches!(self, Self::ProcessingFailed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_wide_errors_are_categorized() {
        assert!(ImagePipelineError::data_loading_failed("timeout").is_session_wide());
        assert!(ImagePipelineError::decoding_failed("bad header").is_session_wide());
        assert!(!ImagePipelineError::processing_failed("blur failed").is_session_wide());
    }

    #[test]
    fn per_task_errors_are_categorized() {
        assert!(ImagePipelineError::processing_failed("blur failed").is_per_task());
        assert!(!ImagePipelineError::decoding_failed("bad header").is_per_task());
    }
}
