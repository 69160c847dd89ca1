// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The slice of an HTTP-ish response the pipeline itself needs to reason
//! about. Byte-level resume negotiation is external (`spec.md` §1); this is
//! the minimal shape a `DataLoader` reports through `onChunk`.

/// Response metadata accompanying downloaded bytes.
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    /// HTTP-style status code, if the transport is HTTP-like. `206` signals
    /// a negotiated partial-content resume.
    pub status_code: Option<u16>,
    /// Opaque validator (e.g. `ETag`/`Last-Modified`) identifying the
    /// server-side resource version, for conditional range requests.
    pub validator: Option<String>,
    /// Total expected byte length of the full resource, if known.
    pub expected_length: Option<u64>,
}

impl TransportResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status_code(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    pub fn with_validator(mut self, validator: impl Into<String>) -> Self {
        self.validator = Some(validator.into());
        self
    }

    pub fn with_expected_length(mut self, length: u64) -> Self {
        self.expected_length = Some(length);
        self
    }

    /// `true` when the status code indicates the server honored a range
    /// request (HTTP 206 Partial Content).
    pub fn is_partial_content(&self) -> bool {
        self.status_code == Some(206)
    }
}
