// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Image Pipeline Domain
//!
//! The pure domain layer of the image loading pipeline: entities, value
//! objects, the domain error taxonomy, the cooperative cancellation
//! primitive, and the service ports the application layer implements and
//! injects.
//!
//! ## Architecture
//!
//! This crate follows the same domain/infrastructure split as the rest of
//! this lineage: everything here is synchronous, `std`-only (plus `serde`,
//! `thiserror`, `sha2`/`hex`, and `parking_lot` for the cancellation mutex)
//! and carries no `tokio` runtime dependency. The actors that drive these
//! types concurrently — the pipeline context, load sessions, processing
//! sessions, the bounded operation queue — live in the application crate,
//! which depends on this one.
//!
//! ## Module organization
//!
//! - [`entities`] — objects with identity that persists through state
//!   changes: [`entities::Task`], [`entities::Image`],
//!   [`entities::ImageContainer`], [`entities::Request`],
//!   [`entities::Response`], [`entities::TransportResponse`],
//!   [`entities::ResumableData`], [`entities::Progress`].
//! - [`value_objects`] — immutable, self-validating domain concepts:
//!   [`value_objects::Priority`], [`value_objects::LoadingKey`],
//!   [`value_objects::ProcessorIdentity`], [`value_objects::ScanNumber`],
//!   the monotonic id types, and [`value_objects::IdGenerator`].
//! - [`services`] — ports the application layer implements:
//!   [`services::DataLoader`], [`services::DataCache`],
//!   [`services::ImageCache`], [`services::DecoderFactory`],
//!   [`services::Processor`].
//! - [`error`] — the flat [`error::ImagePipelineError`] taxonomy.
//! - [`cancellation`] — [`cancellation::CancellationSource`] /
//!   [`cancellation::CancellationToken`], the cooperative cancel signal used
//!   throughout the pipeline.

pub mod cancellation;
pub mod entities;
pub mod error;
pub mod services;
pub mod value_objects;

pub use cancellation::{CancellationSource, CancellationToken};
pub use error::ImagePipelineError;
