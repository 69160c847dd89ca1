// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The Load Image use case (`spec.md` §6): the library's primary public
//! entry point, wrapping `Pipeline::load_image` for callers who would
//! otherwise have to build a bare `Request` and its callbacks by hand.

use url::Url;

use image_pipeline_domain::entities::{Request, Task};

use crate::application::pipeline::{CompletionCallback, PartialImageCallback, Pipeline, ProgressCallback};

/// Orchestrates a single image load against a running `Pipeline`.
pub struct LoadImageUseCase {
    pipeline: Pipeline,
}

impl LoadImageUseCase {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    /// Loads `url` with default request settings (memory cache and
    /// deduplication enabled, normal priority, no processor).
    pub fn execute(&self, url: Url, on_completion: CompletionCallback) -> Task {
        self.execute_request(Request::new(url), None, None, on_completion)
    }

    /// Loads a fully-specified `Request`, with optional progress and
    /// partial-image delivery.
    pub fn execute_request(
        &self,
        request: Request,
        on_progress: Option<ProgressCallback>,
        on_partial_image: Option<PartialImageCallback>,
        on_completion: CompletionCallback,
    ) -> Task {
        self.pipeline.load_image(request, on_progress, on_partial_image, on_completion)
    }
}
