// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `ImageContainer`: a decoded image plus the metadata needed to route it.

use crate::entities::Image;
use crate::value_objects::ScanNumber;

/// A decode result: the image itself, whether it is the final decode for its
/// session, and (for progressive partials only) a monotonic scan number.
///
/// `is_animated` gates processing dispatch (`spec.md` §4.6, Design Note §9):
/// when set and `isAnimatedImageDataEnabled` is on, the image passes through
/// a processor untouched rather than being processed.
#[derive(Debug, Clone)]
pub struct ImageContainer {
    image: Image,
    is_final: bool,
    scan_number: Option<ScanNumber>,
    is_animated: bool,
}

impl ImageContainer {
    pub fn final_image(image: Image) -> Self {
        Self {
            image,
            is_final: true,
            scan_number: None,
            is_animated: false,
        }
    }

    pub fn partial_image(image: Image, scan_number: ScanNumber) -> Self {
        Self {
            image,
            is_final: false,
            scan_number: Some(scan_number),
            is_animated: false,
        }
    }

    pub fn with_animated(mut self, is_animated: bool) -> Self {
        self.is_animated = is_animated;
        self
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn scan_number(&self) -> Option<ScanNumber> {
        self.scan_number
    }

    pub fn is_animated(&self) -> bool {
        self.is_animated
    }
}
