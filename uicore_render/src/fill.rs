// Copyright 2025 the UICore Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Filling polygons into the batch.

use log::trace;
use uicore_raster::flatten::PathSink;
use uicore_raster::instance::{ImageYAxis, InstanceBuffer};
use uicore_raster::kurbo::Affine;
use uicore_raster::mask::MaskBlockCache;
use uicore_raster::paint::Brush;
use uicore_raster::peniko::Fill;
use uicore_raster::scanline::{Scanline, ScanlineEdgeList};
use uicore_raster::{ANTIALIAS_LEVEL, MASK_BLOCK_SIZE, SCANLINE_BLOCK_SIZE};

use crate::backend::{DrawCall, RenderBackend};
use crate::canvas::Canvas;
use crate::config::BatchConfig;
use crate::error::{RenderError, Result};
use crate::pool::RenderBatchBuffer;
use crate::vertex::VertexBatch;

/// The columns of a block row that may be covered, in subsample units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    /// The leftmost column that may be covered.
    pub left: i32,
    /// One past the rightmost column that may be covered.
    pub right: i32,
}

/// The range between the leftmost and rightmost edge of `scanlines`, clamped to `[0, max_width)`.
///
/// Returns `None` if the rows have no edges inside the target.
pub fn find_extent(scanlines: &[Scanline], max_width: i32) -> Option<Extent> {
    let (min, max) = scanlines
        .iter()
        .flat_map(Scanline::edges)
        .fold(None, |acc: Option<(f32, f32)>, edge| {
            Some(match acc {
                Some((min, max)) => (min.min(edge.x), max.max(edge.x)),
                None => (edge.x, edge.x),
            })
        })?;

    let left = (min.floor() as i32).clamp(0, max_width);
    let right = (max.ceil() as i32).clamp(0, max_width);
    (left < right).then_some(Extent { left, right })
}

#[derive(Debug, Clone, Copy)]
struct Subpath {
    start: (f32, f32),
    last: (f32, f32),
}

/// Rasterizes filled polygons into mask blocks and batches them into draw calls.
///
/// Usage: [`clear`](Self::clear) for the target size, then the polygon through
/// [`line`](PathSink::line) and [`end`](PathSink::end) in target pixels, then
/// [`fill`](Self::fill). Fills accumulate in the batch until one of its buffers runs full or
/// [`flush`](Self::flush) is called.
#[derive(Debug)]
pub struct PathFillRenderer {
    width: u32,
    height: u32,
    edges: ScanlineEdgeList,
    subpath: Option<Subpath>,
    mask: MaskBlockCache,
    instances: InstanceBuffer,
    vertices: VertexBatch,
    draw_calls: u64,
}

impl PathFillRenderer {
    /// Create a renderer with empty batch buffers sized by `config`.
    pub fn new(config: &BatchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            width: 0,
            height: 0,
            edges: ScanlineEdgeList::new(),
            subpath: None,
            mask: MaskBlockCache::new(config.mask_texture_size as usize),
            instances: InstanceBuffer::new(
                config.instance_texture_width as usize,
                config.instance_texture_height as usize,
            ),
            vertices: VertexBatch::new(config.vertex_buffer_size),
            draw_calls: 0,
        })
    }

    /// Start a new polygon for a target of `width` x `height` pixels.
    ///
    /// The batch is kept.
    pub fn clear(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.edges.resize(height as usize * ANTIALIAS_LEVEL);
        self.subpath = None;
    }

    /// The edge list of the current polygon.
    pub fn edges(&self) -> &ScanlineEdgeList {
        &self.edges
    }

    /// The mask atlas of the current batch.
    pub fn mask(&self) -> &MaskBlockCache {
        &self.mask
    }

    /// The paint instances of the current batch.
    pub fn instances(&self) -> &InstanceBuffer {
        &self.instances
    }

    /// The vertices of the current batch.
    pub fn vertices(&self) -> &VertexBatch {
        &self.vertices
    }

    /// The number of draw calls issued so far.
    pub fn draw_calls(&self) -> u64 {
        self.draw_calls
    }

    fn add_line(&mut self, from: (f32, f32), to: (f32, f32)) {
        let s = ANTIALIAS_LEVEL as f32;
        self.edges.add_line(from.0 * s, from.1 * s, to.0 * s, to.1 * s);
    }

    /// Fill the current polygon with `brush`.
    ///
    /// `brush_transform` maps brush space to path space; the canvas transform maps path space to
    /// target pixels. The polygon itself must already be in target pixels.
    pub fn fill(
        &mut self,
        pool: &mut RenderBatchBuffer,
        backend: &mut dyn RenderBackend,
        canvas: &Canvas,
        fill_rule: Fill,
        brush: &Brush,
        brush_transform: Affine,
    ) -> Result<()> {
        let Some(rows) = self.edges.touched_rows() else {
            return Ok(());
        };

        let required = InstanceBuffer::required_texels(brush);
        if required > self.instances.capacity() {
            return Err(RenderError::OverBudget {
                what: "paint instance texels",
                required,
                capacity: self.instances.capacity(),
            });
        }

        let fill_transform = canvas.transform;
        // Pushed with the first block, so fills that emit nothing don't bind their image.
        let mut instance = None;

        let max_width = self.width as i32 * ANTIALIAS_LEVEL as i32;
        let first_block_row = rows.start / SCANLINE_BLOCK_SIZE;
        let last_block_row = (rows.end - 1) / SCANLINE_BLOCK_SIZE;

        for block_row in first_block_row..=last_block_row {
            let start = block_row * SCANLINE_BLOCK_SIZE;
            let end = (start + SCANLINE_BLOCK_SIZE).min(self.edges.len());
            let scanlines = &self.edges.rows()[start..end];

            let Some(extent) = find_extent(scanlines, max_width) else {
                continue;
            };
            self.mask.begin_row(scanlines, fill_rule, max_width);

            let block_size = SCANLINE_BLOCK_SIZE as i32;
            let y = (block_row * MASK_BLOCK_SIZE) as i32;
            let mut x = extent.left - extent.left % block_size;
            while x < extent.right {
                if self.mask.is_full()
                    || self.vertices.is_full()
                    || (instance.is_none() && !self.instances.can_push(brush))
                {
                    self.flush(pool, backend)?;
                    instance = None;
                }

                if let Some(block) = self.mask.fill_block(x) {
                    let offset = match instance {
                        Some(offset) => offset,
                        None => {
                            let offset =
                                self.push_instance(brush, brush_transform, fill_transform)?;
                            instance = Some(offset);
                            offset
                        }
                    };
                    self.vertices
                        .push(x / ANTIALIAS_LEVEL as i32, y, offset, block.index);
                }
                x += block_size;
            }
        }

        Ok(())
    }

    /// Push the instance into a batch that was checked to have room for it.
    fn push_instance(
        &mut self,
        brush: &Brush,
        brush_transform: Affine,
        fill_transform: Affine,
    ) -> Result<u32> {
        self.instances
            .push(brush, brush_transform, fill_transform)
            .ok_or(RenderError::OverBudget {
                what: "paint instance texels",
                required: InstanceBuffer::required_texels(brush),
                capacity: self.instances.capacity(),
            })
    }

    /// How image brushes address the rows of their images, see [`ImageYAxis`].
    pub fn set_image_y_axis(&mut self, y_axis: ImageYAxis) {
        self.instances.set_image_y_axis(y_axis);
    }

    /// Upload the batch and draw it.
    ///
    /// The batch is reset even if the backend fails.
    pub fn flush(
        &mut self,
        pool: &mut RenderBatchBuffer,
        backend: &mut dyn RenderBackend,
    ) -> Result<()> {
        let result = if self.vertices.is_empty() {
            Ok(())
        } else {
            self.submit(pool, backend)
        };

        self.mask.reset();
        self.instances.reset();
        self.vertices.reset();
        result
    }

    fn submit(
        &mut self,
        pool: &mut RenderBatchBuffer,
        backend: &mut dyn RenderBackend,
    ) -> Result<()> {
        trace!(
            "Flushing {} vertices, {} full and {} partial mask blocks, {} instance texels",
            self.vertices.len(),
            self.mask.full_blocks(),
            self.mask.partial_blocks(),
            self.instances.len(),
        );

        let mask_rows = self.mask.used_rows();
        let mask_staging = pool.get_transfer_r8(backend)?;
        let mask_texture = pool.get_texture_r8(backend)?;
        backend.write_staging(
            mask_staging,
            &self.mask.data()[..mask_rows * self.mask.texture_size()],
        )?;
        backend.copy_staging_to_texture(mask_staging, mask_texture, mask_rows as u32)?;

        let instance_staging = pool.get_transfer_rgba32f(backend)?;
        let instance_texture = pool.get_texture_rgba32f(backend)?;
        backend.write_staging(instance_staging, self.instances.as_bytes())?;
        backend.copy_staging_to_texture(
            instance_staging,
            instance_texture,
            self.instances.used_rows() as u32,
        )?;

        let vertex_buffer = pool.get_vertex_buffer(backend)?;
        backend.upload_vertices(vertex_buffer, self.vertices.as_bytes())?;
        backend.draw(&DrawCall {
            vertex_buffer,
            vertex_count: self.vertices.len() as u32,
            mask_texture,
            instance_texture,
            image: self.instances.image(),
            target_width: self.width,
            target_height: self.height,
        })?;
        self.draw_calls += 1;

        Ok(())
    }
}

impl PathSink for PathFillRenderer {
    fn line(&mut self, x: f32, y: f32) {
        match self.subpath {
            Some(ref mut subpath) => {
                let from = subpath.last;
                subpath.last = (x, y);
                self.add_line(from, (x, y));
            }
            None => {
                self.subpath = Some(Subpath {
                    start: (x, y),
                    last: (x, y),
                });
            }
        }
    }

    fn end(&mut self, close: bool) {
        if let Some(subpath) = self.subpath.take() {
            if close {
                self.add_line(subpath.last, subpath.start);
            }
        }
    }
}
