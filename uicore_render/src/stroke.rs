// Copyright 2025 the UICore Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stroking polylines into the batch.

use uicore_raster::flatten::{expand_stroke, Flattener, PathSink};
use uicore_raster::instance::ImageYAxis;
use uicore_raster::kurbo::{Affine, BezPath, Stroke};
use uicore_raster::paint::Brush;
use uicore_raster::peniko::Fill;

use crate::backend::RenderBackend;
use crate::canvas::Canvas;
use crate::config::BatchConfig;
use crate::error::Result;
use crate::fill::PathFillRenderer;
use crate::pool::RenderBatchBuffer;

/// Strokes polylines given in target pixels.
///
/// The polylines are collected through [`PathSink`], expanded into their outline and the outline
/// is filled with the nonzero rule. The renderer keeps its own fill state and batch.
#[derive(Debug)]
pub struct PathStrokeRenderer {
    path: BezPath,
    open: bool,
    outline: Flattener,
    fill: PathFillRenderer,
}

impl PathStrokeRenderer {
    /// Create a renderer with empty batch buffers sized by `config`.
    pub fn new(config: &BatchConfig) -> Result<Self> {
        Ok(Self {
            path: BezPath::new(),
            open: false,
            outline: Flattener::new(),
            fill: PathFillRenderer::new(config)?,
        })
    }

    /// Forget the collected polylines.
    pub fn clear(&mut self) {
        self.path.truncate(0);
        self.open = false;
    }

    /// The polylines collected since the last stroke.
    pub fn path(&self) -> &BezPath {
        &self.path
    }

    /// The fill state the outlines are rasterized with.
    pub fn fill_renderer(&self) -> &PathFillRenderer {
        &self.fill
    }

    /// How image brushes address the rows of their images.
    pub fn set_image_y_axis(&mut self, y_axis: ImageYAxis) {
        self.fill.set_image_y_axis(y_axis);
    }

    /// Stroke the collected polylines with `style` and `brush`, then forget them.
    ///
    /// The stroke width is in target pixels.
    pub fn stroke(
        &mut self,
        pool: &mut RenderBatchBuffer,
        backend: &mut dyn RenderBackend,
        canvas: &Canvas,
        style: &Stroke,
        brush: &Brush,
        brush_transform: Affine,
    ) -> Result<()> {
        let outline = expand_stroke(&self.path, style);
        self.clear();

        self.fill.clear(canvas.width, canvas.height);
        self.outline
            .flatten(&outline, Affine::IDENTITY, true, &mut self.fill);
        self.fill
            .fill(pool, backend, canvas, Fill::NonZero, brush, brush_transform)
    }

    /// Upload the batch and draw it.
    pub fn flush(
        &mut self,
        pool: &mut RenderBatchBuffer,
        backend: &mut dyn RenderBackend,
    ) -> Result<()> {
        self.fill.flush(pool, backend)
    }
}

impl PathSink for PathStrokeRenderer {
    fn line(&mut self, x: f32, y: f32) {
        let point = (f64::from(x), f64::from(y));
        if self.open {
            self.path.line_to(point);
        } else {
            self.path.move_to(point);
            self.open = true;
        }
    }

    fn end(&mut self, close: bool) {
        if self.open && close {
            self.path.close_path();
        }
        self.open = false;
    }
}
