// Copyright 2025 the UICore Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Filling and stroking `kurbo` paths.

use uicore_raster::flatten::Flattener;
use uicore_raster::instance::ImageYAxis;
use uicore_raster::kurbo::{Affine, PathEl, Stroke};
use uicore_raster::paint::Brush;
use uicore_raster::peniko::Fill;

use crate::backend::RenderBackend;
use crate::canvas::Canvas;
use crate::config::BatchConfig;
use crate::error::Result;
use crate::fill::PathFillRenderer;
use crate::pool::RenderBatchBuffer;
use crate::stroke::PathStrokeRenderer;

/// Which renderer holds the pending batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathOp {
    /// The fill renderer.
    Fill,
    /// The stroke renderer.
    Stroke,
}

/// Fills and strokes paths, keeping draw calls in request order.
///
/// Fills and strokes are batched separately. When the kind of request changes, the batch of the
/// other kind is flushed first, so nothing drawn later can end up below something drawn earlier.
#[derive(Debug)]
pub struct RenderBatchPath {
    fill_renderer: PathFillRenderer,
    stroke_renderer: PathStrokeRenderer,
    flattener: Flattener,
    active: Option<PathOp>,
}

impl RenderBatchPath {
    /// Create the renderers with batch buffers sized by `config`.
    pub fn new(config: &BatchConfig) -> Result<Self> {
        Ok(Self {
            fill_renderer: PathFillRenderer::new(config)?,
            stroke_renderer: PathStrokeRenderer::new(config)?,
            flattener: Flattener::new(),
            active: None,
        })
    }

    /// The renderer that holds the pending batch, if any.
    pub fn active(&self) -> Option<PathOp> {
        self.active
    }

    /// The number of draw calls issued so far.
    pub fn draw_calls(&self) -> u64 {
        self.fill_renderer.draw_calls() + self.stroke_renderer.fill_renderer().draw_calls()
    }

    /// How image brushes of both renderers address the rows of their images.
    pub fn set_image_y_axis(&mut self, y_axis: ImageYAxis) {
        self.fill_renderer.set_image_y_axis(y_axis);
        self.stroke_renderer.set_image_y_axis(y_axis);
    }

    /// Fill `path` with `brush`. Every subpath is closed.
    #[expect(
        clippy::too_many_arguments,
        reason = "Mirrors `PathFillRenderer::fill` plus the path."
    )]
    pub fn fill(
        &mut self,
        pool: &mut RenderBatchBuffer,
        backend: &mut dyn RenderBackend,
        canvas: &Canvas,
        path: impl IntoIterator<Item = PathEl>,
        fill_rule: Fill,
        brush: &Brush,
        brush_transform: Affine,
    ) -> Result<()> {
        self.set_active(PathOp::Fill, pool, backend)?;

        self.fill_renderer.clear(canvas.width, canvas.height);
        self.flattener
            .flatten(path, canvas.transform, true, &mut self.fill_renderer);
        self.fill_renderer
            .fill(pool, backend, canvas, fill_rule, brush, brush_transform)
    }

    /// Stroke `path` with `style` and `brush`.
    ///
    /// The stroke width and dashes are in path units and scaled with the canvas transform.
    #[expect(
        clippy::too_many_arguments,
        reason = "Mirrors `PathStrokeRenderer::stroke` plus the path."
    )]
    pub fn stroke(
        &mut self,
        pool: &mut RenderBatchBuffer,
        backend: &mut dyn RenderBackend,
        canvas: &Canvas,
        path: impl IntoIterator<Item = PathEl>,
        style: &Stroke,
        brush: &Brush,
        brush_transform: Affine,
    ) -> Result<()> {
        self.set_active(PathOp::Stroke, pool, backend)?;

        let scale = canvas.transform.determinant().abs().sqrt();
        let mut style = style.clone();
        style.width *= scale;
        style.dash_offset *= scale;
        for dash in style.dash_pattern.iter_mut() {
            *dash *= scale;
        }

        self.stroke_renderer.clear();
        self.flattener
            .flatten(path, canvas.transform, false, &mut self.stroke_renderer);
        self.stroke_renderer
            .stroke(pool, backend, canvas, &style, brush, brush_transform)
    }

    /// Draw everything that is still batched.
    pub fn flush(
        &mut self,
        pool: &mut RenderBatchBuffer,
        backend: &mut dyn RenderBackend,
    ) -> Result<()> {
        match self.active.take() {
            Some(PathOp::Fill) => self.fill_renderer.flush(pool, backend),
            Some(PathOp::Stroke) => self.stroke_renderer.flush(pool, backend),
            None => Ok(()),
        }
    }

    fn set_active(
        &mut self,
        op: PathOp,
        pool: &mut RenderBatchBuffer,
        backend: &mut dyn RenderBackend,
    ) -> Result<()> {
        if self.active != Some(op) {
            self.flush(pool, backend)?;
            self.active = Some(op);
        }
        Ok(())
    }
}
