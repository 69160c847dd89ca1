// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `Processor`: the injected, optional post-decode transform (`spec.md` §4.6,
//! §6).
//!
//! Processing is synchronous (CPU-bound image manipulation, capped at
//! concurrency 2 per `spec.md` §1) and keyed for deduplication by
//! `ProcessorIdentity` rather than by `Arc` pointer equality, so that two
//! distinct `Processor` values configured identically share one
//! `ProcessingSession` (`spec.md` §4.6).

use crate::entities::{ImageContainer, Request};
use crate::error::ImagePipelineError;
use crate::value_objects::ProcessorIdentity;

pub trait Processor: Send + Sync {
    /// A value two `Processor`s agree on exactly when they'd produce the
    /// same output for the same input. Used to find-or-create the
    /// `ProcessingSession` for a given `(Image, Processor)` pair.
    fn identity(&self) -> ProcessorIdentity;

    /// Transforms `container`'s image. Called once per distinct decode result
    /// that reaches a `ProcessingSession` for this processor (`spec.md`
    /// §4.6); the result is cached per session so identical inputs are never
    /// processed twice concurrently.
    fn process(
        &self,
        container: &ImageContainer,
        request: &Request,
    ) -> Result<ImageContainer, ImagePipelineError>;
}
