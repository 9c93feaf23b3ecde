// Copyright 2025 the UICore Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Encoding paint instances into a float texture.
//!
//! Every fill pushes one instance: a run of rgba32f texels the fragment shader reads starting at
//! the instance offset stored in each vertex. All instances start with a header texel
//! `[mode, stop_count, 0, 0]`, see [`DrawMode`](crate::paint::DrawMode). The texels that follow
//! depend on the mode:
//!
//! | mode   | texels                                                                  |
//! |--------|-------------------------------------------------------------------------|
//! | solid  | `[r, g, b, a]`                                                          |
//! | linear | `[start.x, start.y, dir.x, dir.y]`, transform, stops                    |
//! | radial | `[center.x, center.y, 1 / radius.x, 1 / radius.y]`, transform, stops    |
//! | image  | `[src.x, src.y, src.w, src.h]`, `[1 / width, 1 / height, flip, 0]`, transform |
//!
//! The transform maps target pixels to brush space, stored as `[a, b, c, d]`, `[e, f, 0, 0]` in
//! the coefficient order of [`Affine::as_coeffs`]. Every stop is `[r, g, b, a]` followed by
//! `[offset, 0, 0, 0]`. Colors are straight alpha. For linear gradients `dir` is
//! `(end - start) / |end - start|^2`, so the gradient position of a brush space point `p` is
//! `dot(p - start, dir)`. `flip` is 1 when the image rows are stored bottom to top, see
//! [`ImageYAxis`].

use peniko::kurbo::{Affine, Vec2};

use crate::paint::{color_to_f32, Brush, ImageId};

/// One rgba32f texel.
pub type Texel = [f32; 4];

/// The size of a texel in bytes.
pub const TEXEL_SIZE: usize = size_of::<Texel>();

/// Texels used by the transform of gradient and image instances.
const TRANSFORM_TEXELS: usize = 2;
/// Texels used by one gradient stop.
const STOP_TEXELS: usize = 2;

/// The order in which the rows of sampled images are stored.
///
/// Source rectangles are always given top down; with [`Up`](Self::Up) the sampled row is
/// mirrored so that images uploaded bottom to top render upright.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageYAxis {
    /// The first row is the top of the image.
    #[default]
    Down,
    /// The first row is the bottom of the image.
    Up,
}

/// Builds the instance texture of one batch.
#[derive(Debug)]
pub struct InstanceBuffer {
    width: usize,
    height: usize,
    texels: Vec<Texel>,
    image: Option<ImageId>,
    image_y_axis: ImageYAxis,
}

impl InstanceBuffer {
    /// Create a buffer for a texture of `width` x `height` texels.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            texels: Vec::with_capacity(width * height),
            image: None,
            image_y_axis: ImageYAxis::Down,
        }
    }

    /// The row order of images sampled by instances pushed from now on.
    ///
    /// Kept across [`reset`](Self::reset).
    pub fn set_image_y_axis(&mut self, y_axis: ImageYAxis) {
        self.image_y_axis = y_axis;
    }

    /// The row order of sampled images.
    pub fn image_y_axis(&self) -> ImageYAxis {
        self.image_y_axis
    }

    /// The width of the instance texture in texels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The total number of texels.
    pub fn capacity(&self) -> usize {
        self.width * self.height
    }

    /// The number of texels used.
    pub fn len(&self) -> usize {
        self.texels.len()
    }

    /// Whether no instance has been pushed since the last reset.
    pub fn is_empty(&self) -> bool {
        self.texels.is_empty()
    }

    /// The image bound to this batch, if any instance samples one.
    pub fn image(&self) -> Option<ImageId> {
        self.image
    }

    /// The texture rows that hold instances.
    pub fn used_rows(&self) -> usize {
        self.texels.len().div_ceil(self.width)
    }

    /// The texels pushed so far.
    pub fn texels(&self) -> &[Texel] {
        &self.texels
    }

    /// The texels pushed so far as bytes, ready to be copied into the first
    /// [`used_rows`](Self::used_rows) rows of the texture.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }

    /// Remove all instances and unbind the image.
    pub fn reset(&mut self) {
        self.texels.clear();
        self.image = None;
    }

    /// The number of texels the instance of `brush` occupies.
    pub fn required_texels(brush: &Brush) -> usize {
        1 + match brush {
            Brush::Solid(_) => 1,
            Brush::LinearGradient { stops, .. } | Brush::RadialGradient { stops, .. } => {
                1 + TRANSFORM_TEXELS + STOP_TEXELS * stops.len()
            }
            Brush::Image { .. } => 2 + TRANSFORM_TEXELS,
        }
    }

    /// Whether [`push`](Self::push) would accept `brush` without a flush.
    pub fn can_push(&self, brush: &Brush) -> bool {
        if self.len() + Self::required_texels(brush) > self.capacity() {
            return false;
        }
        match (brush.image_id(), self.image) {
            (Some(image), Some(bound)) => image == bound,
            _ => true,
        }
    }

    /// Push the instance of `brush` and return its texel offset.
    ///
    /// The brush is mapped to target pixels by `brush_transform` followed by `fill_transform`.
    /// Returns `None` if the remaining capacity is too small, or if `brush` samples an image while
    /// a different image is already bound to this batch. Either way the batch has to be flushed
    /// first.
    pub fn push(
        &mut self,
        brush: &Brush,
        brush_transform: Affine,
        fill_transform: Affine,
    ) -> Option<u32> {
        if !self.can_push(brush) {
            return None;
        }
        if let Some(image) = brush.image_id() {
            self.image = Some(image);
        }

        let offset = self.texels.len() as u32;
        let stops = brush.stops();
        self.texels
            .push([brush.draw_mode() as u32 as f32, stops.len() as f32, 0.0, 0.0]);

        match brush {
            Brush::Solid(color) => self.texels.push(color_to_f32(*color)),
            Brush::LinearGradient { start, end, .. } => {
                let delta = *end - *start;
                let len_sq = delta.hypot2();
                let dir = if len_sq > 0.0 {
                    delta / len_sq
                } else {
                    Vec2::ZERO
                };
                self.texels.push(
                    [start.x, start.y, dir.x, dir.y].map(|v| v as f32),
                );
            }
            Brush::RadialGradient { center, radius, .. } => {
                let rcp = |r: f64| if r > 0.0 { 1.0 / r } else { 0.0 };
                self.texels.push(
                    [center.x, center.y, rcp(radius.x), rcp(radius.y)].map(|v| v as f32),
                );
            }
            Brush::Image { size, src, .. } => {
                let rcp = |s: u32| if s > 0 { 1.0 / s as f32 } else { 0.0 };
                self.texels.push(
                    [src.x0, src.y0, src.width(), src.height()].map(|v| v as f32),
                );
                let flip = match self.image_y_axis {
                    ImageYAxis::Down => 0.0,
                    ImageYAxis::Up => 1.0,
                };
                self.texels.push([rcp(size.0), rcp(size.1), flip, 0.0]);
            }
        }

        if !matches!(brush, Brush::Solid(_)) {
            self.push_inverse_transform(fill_transform * brush_transform);
        }

        for stop in stops {
            self.texels.push(color_to_f32(stop.color));
            self.texels.push([stop.offset, 0.0, 0.0, 0.0]);
        }

        Some(offset)
    }

    fn push_inverse_transform(&mut self, transform: Affine) {
        let det = transform.determinant();
        let [a, b, c, d, e, f] = if det != 0.0 && det.is_finite() {
            transform.inverse().as_coeffs().map(|v| v as f32)
        } else {
            log::warn!("brush transform {transform:?} is not invertible, brush will be degenerate");
            [0.0; 6]
        };
        self.texels.push([a, b, c, d]);
        self.texels.push([e, f, 0.0, 0.0]);
    }
}
