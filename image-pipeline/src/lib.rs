// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Image Loading Pipeline
//!
//! A concurrent, deduplicating, multi-stage image loading pipeline: fetch,
//! decode, process, and cache, coordinated by a single actor so that
//! concurrent requests for the same image share one download, one decode,
//! and one run of any given processor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Application Layer                          │
//! │  Pipeline (public handle) ─▶ PipelineActor (single task)    │
//! │  owning the session table, task table, and queues           │
//! └─────────────────────────────────────────────────────────────┘
//!                                │ spawns
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Driver Tasks                             │
//! │  preflight / network / decode / process — all I/O and CPU   │
//! │  work, reporting results back to the actor over a channel   │
//! └─────────────────────────────────────────────────────────────┘
//!                                │ implements
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                             │
//! │  Entities, value objects, service ports, cancellation,       │
//! │  the error taxonomy — pure, `tokio`-free                     │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Infrastructure Layer                          │
//! │  Configuration loading, Prometheus export, in-process        │
//! │  reference cache implementations                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Core Concepts
//!
//! ### Load Session
//! All subscribers requesting the same URL under the same cache policy
//! share a single Load Session: one network fetch, one decode. A session
//! moves through `AwaitingAdmission → ProbingDiskCache → Downloading →
//! Decoding → Delivering → Terminal`.
//!
//! ### Processing Session
//! Within a load session, subscribers whose processor has the same
//! identity and whose input image is the same decoded image share a single
//! processor run.
//!
//! ### Tasks
//! Each call to `Pipeline::load_image` returns a `Task`: an independently
//! cancellable, independently re-prioritizable handle, even though its
//! underlying work may be shared with other tasks via deduplication.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use image_pipeline::application::{Pipeline, Ports};
//! use image_pipeline::infrastructure::caches::{InProcessDataCache, InProcessImageCache};
//! use image_pipeline::infrastructure::config::PipelineConfig;
//! use image_pipeline_domain::entities::Request;
//! use std::sync::Arc;
//! use url::Url;
//!
//! let ports = Ports {
//!     data_loader: my_data_loader,
//!     decoder_factory: my_decoder_factory,
//!     data_cache: Some(Arc::new(InProcessDataCache::new())),
//!     image_cache: Some(Arc::new(InProcessImageCache::new())),
//! };
//! let pipeline = Pipeline::new(PipelineConfig::default(), ports)?;
//! let request = Request::new(Url::parse("https://example.com/cat.jpg")?);
//! let task = pipeline.load_image(request, None, None, Box::new(|result| {
//!     match result {
//!         Ok(response) => println!("loaded {:?}", response.image()),
//!         Err(err) => eprintln!("load failed: {err}"),
//!     }
//! }));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! Every failure surfaces as an [`image_pipeline_domain::ImagePipelineError`].
//! Network and decode failures are session-wide and fail every subscriber of
//! the affected load session; processing failures are per-task.
//!
//! ## Testing
//!
//! ```bash
//! cargo test
//! ```
//!
//! Integration tests in `tests/` exercise the full actor against hand-rolled
//! test doubles for the `DataLoader`, `DecoderFactory`, and `Processor`
//! ports; unit tests live alongside the code they cover.

pub mod application;
pub mod infrastructure;

// Re-export the types most callers reach for, so `image_pipeline::Pipeline`
// and friends work without drilling into `application`.
pub use application::{CompletionCallback, LoadImageUseCase, PartialImageCallback, Pipeline, Ports, ProgressCallback};
pub use image_pipeline_domain::ImagePipelineError;
