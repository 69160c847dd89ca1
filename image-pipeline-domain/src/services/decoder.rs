// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `DecoderFactory` and `Decoder`: the injected decode stage (`spec.md` §6).
//!
//! Decoding is synchronous and CPU-bound by design (`spec.md` §1: "decode
//! concurrency is capped at 1" and the decode stage runs on a blocking pool,
//! not the pipeline context) — these traits are deliberately not `async`.

use bytes::Bytes;

use crate::entities::{ImageContainer, Request, TransportResponse};
use crate::error::ImagePipelineError;

/// Chooses (or declines to choose) a `Decoder` for a request once enough
/// bytes have arrived to sniff the format.
///
/// `response` is `None` until the `DataLoader` has reported transport
/// metadata; implementations that only need the magic bytes can ignore it.
pub trait DecoderFactory: Send + Sync {
    fn create_decoder(
        &self,
        request: &Request,
        response: Option<&TransportResponse>,
        sample_bytes: &[u8],
    ) -> Option<Box<dyn Decoder>>;
}

/// A stateful, incremental decoder bound to one load session.
///
/// `decode` is called once per delivered chunk with the chunk appended to an
/// accumulating buffer (accumulation itself is the caller's responsibility;
/// the decoder receives whatever bytes it is handed and should only return
/// `Some` once it has produced a displayable frame). Returning `None` means
/// "not enough data yet" and is not an error.
pub trait Decoder: Send {
    fn decode(
        &mut self,
        bytes: &Bytes,
        is_final: bool,
    ) -> Result<Option<ImageContainer>, ImagePipelineError>;

    /// `true` for decoders capable of progressive (partial) output; governs
    /// whether the session's `ScanSequence` is consulted at all (`spec.md`
    /// §4.5).
    fn supports_progressive_decoding(&self) -> bool {
        false
    }
}
