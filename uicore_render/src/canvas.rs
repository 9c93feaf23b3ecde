// Copyright 2025 the UICore Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use uicore_raster::kurbo::Affine;

/// The render target of a fill or stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    /// The width of the target in pixels.
    pub width: u32,
    /// The height of the target in pixels.
    pub height: u32,
    /// Maps path coordinates to target pixels.
    pub transform: Affine,
}

impl Canvas {
    /// A canvas with the identity transform.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            transform: Affine::IDENTITY,
        }
    }

    /// The same canvas with another transform.
    #[must_use]
    pub fn with_transform(self, transform: Affine) -> Self {
        Self { transform, ..self }
    }
}
