// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Services: domain ports the pipeline depends on and the application layer
//! injects implementations of (`spec.md` §6 — "Pluggable Components").

mod data_cache;
mod data_loader;
mod decoder;
mod image_cache;
mod processor;

pub use data_cache::DataCache;
pub use data_loader::{DataChunk, DataLoader, DataLoaderSink, LoadHandle, ResumeHint};
pub use decoder::{Decoder, DecoderFactory};
pub use image_cache::ImageCache;
pub use processor::Processor;
