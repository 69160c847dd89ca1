// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `ResumableData`: a partial-download snapshot kept around so a
//! subsequently retried request can resume instead of refetching.

use bytes::Bytes;

/// A partial download, keyed (by the store) on the original request URL.
/// Cleared when the server refuses resumption or the final image is
/// delivered (`spec.md` §3).
#[derive(Debug, Clone)]
pub struct ResumableData {
    validator: String,
    accumulated: Bytes,
    server_confirmed: bool,
}

impl ResumableData {
    /// Creates a snapshot from bytes seen so far plus the validator the
    /// server attached to those bytes. `server_confirmed` starts `false`
    /// until a subsequent request's 206 response confirms the validator
    /// still matches server-side state.
    pub fn new(validator: impl Into<String>, accumulated: Bytes) -> Self {
        Self {
            validator: validator.into(),
            accumulated,
            server_confirmed: false,
        }
    }

    pub fn validator(&self) -> &str {
        &self.validator
    }

    pub fn accumulated(&self) -> &Bytes {
        &self.accumulated
    }

    pub fn len(&self) -> usize {
        self.accumulated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accumulated.is_empty()
    }

    pub fn server_confirmed(&self) -> bool {
        self.server_confirmed
    }

    pub fn confirm(&mut self) {
        self.server_confirmed = true;
    }
}
