// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! An opaque, identity-comparable decoded image.
//!
//! Pixel formats and codecs are out of scope (`spec.md` §1); `Image` only
//! carries what the pipeline itself needs to reason about: dimensions for
//! progress/metrics display, and an identity two `ImageContainer`s can be
//! compared by when matching a task into an existing `ProcessingSession`
//! (`spec.md` §4.6).

use std::sync::Arc;

use bytes::Bytes;

struct ImageData {
    width: u32,
    height: u32,
    pixels: Bytes,
}

/// A decoded image. Cheaply cloneable (`Arc` internally); two clones of the
/// same `Image` are identity-equal via `Image::is_identical`.
#[derive(Clone)]
pub struct Image(Arc<ImageData>);

impl Image {
    pub fn new(width: u32, height: u32, pixels: Bytes) -> Self {
        Self(Arc::new(ImageData { width, height, pixels }))
    }

    pub fn width(&self) -> u32 {
        self.0.width
    }

    pub fn height(&self) -> u32 {
        self.0.height
    }

    pub fn pixels(&self) -> &Bytes {
        &self.0.pixels
    }

    /// Identity equality: true only if `other` is a clone of the same
    /// decode result, not merely pixel-equal.
    pub fn is_identical(&self, other: &Image) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.0.width)
            .field("height", &self.0.height)
            .field("bytes", &self.0.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_are_identical() {
        let img = Image::new(4, 4, Bytes::from_static(&[0u8; 16]));
        let clone = img.clone();
        assert!(img.is_identical(&clone));
    }

    #[test]
    fn separately_constructed_images_are_not_identical() {
        let a = Image::new(4, 4, Bytes::from_static(&[0u8; 16]));
        let b = Image::new(4, 4, Bytes::from_static(&[0u8; 16]));
        assert!(!a.is_identical(&b));
    }
}
