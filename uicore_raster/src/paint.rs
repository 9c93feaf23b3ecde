// Copyright 2025 the UICore Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Brushes a path can be filled with.

use peniko::kurbo::{Point, Rect, Vec2};
use peniko::{Color, ColorStop};
use smallvec::SmallVec;

/// Color stops of a gradient, sorted by offset.
pub type ColorStops = SmallVec<[ColorStop; 4]>;

/// A handle to an image registered with the render backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(pub u32);

/// How the fragment shader computes the color of a covered pixel.
///
/// The discriminant is written into the header texel of every paint instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DrawMode {
    /// A single color.
    Solid = 0,
    /// A gradient along a line.
    Linear = 1,
    /// An elliptical gradient around a center.
    Radial = 2,
    /// A sub-rectangle of an image.
    Image = 3,
}

/// The paint applied to the covered pixels of a path.
///
/// Geometry is given in brush space, which is mapped to target pixels by the brush transform and
/// then the fill transform.
#[derive(Debug, Clone, PartialEq)]
pub enum Brush {
    /// Fill with a single color.
    Solid(Color),
    /// A linear gradient from `start` (offset 0) to `end` (offset 1).
    LinearGradient {
        /// The point at offset 0.
        start: Point,
        /// The point at offset 1.
        end: Point,
        /// The color stops.
        stops: ColorStops,
    },
    /// An elliptical gradient around `center` with the given radii.
    RadialGradient {
        /// The point at offset 0.
        center: Point,
        /// The horizontal and vertical radius at offset 1.
        radius: Vec2,
        /// The color stops.
        stops: ColorStops,
    },
    /// The `src` rectangle of an image, placed at the brush space origin.
    Image {
        /// The image to sample.
        image: ImageId,
        /// The width and height of the image in pixels.
        size: (u32, u32),
        /// The source rectangle in image pixels.
        src: Rect,
    },
}

impl Brush {
    /// A linear gradient. Stops are sorted by offset.
    pub fn linear(start: impl Into<Point>, end: impl Into<Point>, stops: &[ColorStop]) -> Self {
        Self::LinearGradient {
            start: start.into(),
            end: end.into(),
            stops: sorted_stops(stops),
        }
    }

    /// A circular gradient. Stops are sorted by offset.
    pub fn radial(center: impl Into<Point>, radius: f64, stops: &[ColorStop]) -> Self {
        Self::RadialGradient {
            center: center.into(),
            radius: Vec2::new(radius, radius),
            stops: sorted_stops(stops),
        }
    }

    /// The whole of an image of the given size.
    pub fn image(image: ImageId, width: u32, height: u32) -> Self {
        Self::Image {
            image,
            size: (width, height),
            src: Rect::new(0.0, 0.0, f64::from(width), f64::from(height)),
        }
    }

    /// The shader mode for this brush.
    pub fn draw_mode(&self) -> DrawMode {
        match self {
            Self::Solid(_) => DrawMode::Solid,
            Self::LinearGradient { .. } => DrawMode::Linear,
            Self::RadialGradient { .. } => DrawMode::Radial,
            Self::Image { .. } => DrawMode::Image,
        }
    }

    /// The image this brush samples, if any.
    pub fn image_id(&self) -> Option<ImageId> {
        match self {
            Self::Image { image, .. } => Some(*image),
            _ => None,
        }
    }

    /// The color stops of a gradient brush. Empty for other brushes.
    pub fn stops(&self) -> &[ColorStop] {
        match self {
            Self::LinearGradient { stops, .. } | Self::RadialGradient { stops, .. } => stops,
            _ => &[],
        }
    }
}

impl From<Color> for Brush {
    fn from(color: Color) -> Self {
        Self::Solid(color)
    }
}

fn sorted_stops(stops: &[ColorStop]) -> ColorStops {
    let mut stops = ColorStops::from_slice(stops);
    stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));
    stops
}

/// A color as straight alpha floats in `[0, 1]`.
pub fn color_to_f32(color: Color) -> [f32; 4] {
    [color.r, color.g, color.b, color.a].map(|c| f32::from(c) / 255.0)
}
