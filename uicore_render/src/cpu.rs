// Copyright 2025 the UICore Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A backend that executes draw calls on the CPU.
//!
//! It is the reference the GPU backends are compared against, and it lets tests observe every
//! resource and draw call. Paint is evaluated at pixel centers exactly as in `path.wgsl`:
//! gradients pad outside of `[0, 1]` and interpolate straight alpha colors, images are sampled
//! with the nearest pixel clamped to the source rectangle.

use std::collections::HashMap;

use uicore_raster::instance::Texel;
use uicore_raster::paint::{DrawMode, ImageId};
use uicore_raster::MASK_BLOCK_SIZE;

use crate::backend::{
    BufferId, DeviceId, DrawCall, RenderBackend, StagingId, TextureFormat, TextureId,
};
use crate::error::BackendError;
use crate::pixmap::Pixmap;
use crate::vertex::{PathVertex, VERTICES_PER_BLOCK};

#[derive(Debug, Clone)]
struct Surface {
    width: u32,
    height: u32,
    format: TextureFormat,
    data: Vec<u8>,
}

impl Surface {
    fn new(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
            data: vec![0; width as usize * height as usize * format.bytes_per_pixel()],
        }
    }

    fn pitch(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    fn texel(&self, index: usize) -> Texel {
        let start = index * size_of::<Texel>();
        match self.data.get(start..start + size_of::<Texel>()) {
            Some(bytes) => bytemuck::pod_read_unaligned(bytes),
            None => [0.0; 4],
        }
    }
}

/// Renders into a [`Pixmap`] without a GPU.
#[derive(Debug)]
pub struct CpuBackend {
    device: DeviceId,
    target: Pixmap,
    vertex_buffers: Vec<Vec<u8>>,
    textures: Vec<Surface>,
    staging: Vec<Surface>,
    images: HashMap<ImageId, Pixmap>,
    next_image: u32,
    resource_limit: Option<usize>,
    device_lost: bool,
    draw_calls: usize,
    vertices_drawn: usize,
}

impl CpuBackend {
    /// Create a backend rendering into a transparent `width` x `height` target.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            device: DeviceId(0),
            target: Pixmap::new(width, height),
            vertex_buffers: Vec::new(),
            textures: Vec::new(),
            staging: Vec::new(),
            images: HashMap::new(),
            next_image: 0,
            resource_limit: None,
            device_lost: false,
            draw_calls: 0,
            vertices_drawn: 0,
        }
    }

    /// Use another device id.
    #[must_use]
    pub fn with_device_id(mut self, device: DeviceId) -> Self {
        self.device = device;
        self
    }

    /// Fail with [`BackendError::OutOfMemory`] once `limit` resources exist.
    #[must_use]
    pub fn with_resource_limit(mut self, limit: usize) -> Self {
        self.resource_limit = Some(limit);
        self
    }

    /// Make every following call fail with [`BackendError::DeviceLost`].
    pub fn lose_device(&mut self) {
        self.device_lost = true;
    }

    /// Make an image available to image brushes.
    pub fn register_image(&mut self, image: Pixmap) -> ImageId {
        let id = ImageId(self.next_image);
        self.next_image += 1;
        self.images.insert(id, image);
        id
    }

    /// The render target.
    pub fn target(&self) -> &Pixmap {
        &self.target
    }

    /// The render target, for clearing it.
    pub fn target_mut(&mut self) -> &mut Pixmap {
        &mut self.target
    }

    /// Take the render target, leaving a transparent one of the same size.
    pub fn take_target(&mut self) -> Pixmap {
        let empty = Pixmap::new(self.target.width(), self.target.height());
        std::mem::replace(&mut self.target, empty)
    }

    /// The number of draw calls executed.
    pub fn draw_calls(&self) -> usize {
        self.draw_calls
    }

    /// The number of vertices drawn over all draw calls.
    pub fn vertices_drawn(&self) -> usize {
        self.vertices_drawn
    }

    /// The number of resources created.
    pub fn resource_count(&self) -> usize {
        self.vertex_buffers.len() + self.textures.len() + self.staging.len()
    }

    fn check(&self) -> Result<(), BackendError> {
        if self.device_lost {
            Err(BackendError::DeviceLost)
        } else {
            Ok(())
        }
    }

    fn reserve(&self) -> Result<(), BackendError> {
        self.check()?;
        match self.resource_limit {
            Some(limit) if self.resource_count() >= limit => Err(BackendError::OutOfMemory),
            _ => Ok(()),
        }
    }

    fn texture(&self, id: TextureId) -> Result<&Surface, BackendError> {
        self.textures
            .get(id.0 as usize)
            .ok_or(BackendError::InvalidResource)
    }

    fn draw_block(
        &mut self,
        vertex: PathVertex,
        mask: &Surface,
        instances: &Surface,
        image: Option<&Pixmap>,
    ) -> Result<(), BackendError> {
        let block_size = MASK_BLOCK_SIZE as u32;
        let blocks_per_row = mask.width / block_size;
        let mask_offset = vertex.mask_offset as u32;
        let mask_x = (mask_offset % blocks_per_row * block_size) as usize;
        let mask_y = (mask_offset / blocks_per_row * block_size) as usize;
        let paint = Paint::read(instances, vertex.instance_offset as usize);
        if paint.mode == DrawMode::Image && image.is_none() {
            return Err(BackendError::InvalidResource);
        }

        for dy in 0..block_size {
            let y = vertex.y + dy as i32;
            if y < 0 || y as u32 >= self.target.height() {
                continue;
            }
            for dx in 0..block_size {
                let x = vertex.x + dx as i32;
                if x < 0 || x as u32 >= self.target.width() {
                    continue;
                }

                let coverage =
                    mask.data[(mask_y + dy as usize) * mask.pitch() + mask_x + dx as usize];
                if coverage == 0 {
                    continue;
                }

                let color = paint.color_at(x as f32 + 0.5, y as f32 + 0.5, image);
                let index = y as usize * self.target.width() as usize + x as usize;
                let dst = &mut self.target.data_mut()[index];
                *dst = blend(*dst, color, f32::from(coverage) / 255.0);
            }
        }

        Ok(())
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl RenderBackend for CpuBackend {
    fn device_id(&self) -> DeviceId {
        self.device
    }

    fn create_vertex_buffer(&mut self, size: usize) -> Result<BufferId, BackendError> {
        self.reserve()?;
        self.vertex_buffers.push(vec![0; size]);
        Ok(BufferId(self.vertex_buffers.len() as u32 - 1))
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<TextureId, BackendError> {
        self.reserve()?;
        self.textures.push(Surface::new(width, height, format));
        Ok(TextureId(self.textures.len() as u32 - 1))
    }

    fn create_staging_texture(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<StagingId, BackendError> {
        self.reserve()?;
        self.staging.push(Surface::new(width, height, format));
        Ok(StagingId(self.staging.len() as u32 - 1))
    }

    fn upload_vertices(&mut self, buffer: BufferId, data: &[u8]) -> Result<(), BackendError> {
        self.check()?;
        let buffer = self
            .vertex_buffers
            .get_mut(buffer.0 as usize)
            .ok_or(BackendError::InvalidResource)?;
        buffer
            .get_mut(..data.len())
            .ok_or(BackendError::InvalidResource)?
            .copy_from_slice(data);
        Ok(())
    }

    fn write_staging(&mut self, staging: StagingId, data: &[u8]) -> Result<(), BackendError> {
        self.check()?;
        let staging = self
            .staging
            .get_mut(staging.0 as usize)
            .ok_or(BackendError::InvalidResource)?;
        staging
            .data
            .get_mut(..data.len())
            .ok_or(BackendError::InvalidResource)?
            .copy_from_slice(data);
        Ok(())
    }

    fn copy_staging_to_texture(
        &mut self,
        staging: StagingId,
        texture: TextureId,
        rows: u32,
    ) -> Result<(), BackendError> {
        self.check()?;
        let source = self
            .staging
            .get(staging.0 as usize)
            .ok_or(BackendError::InvalidResource)?;
        let destination = self
            .textures
            .get_mut(texture.0 as usize)
            .ok_or(BackendError::InvalidResource)?;
        if source.format != destination.format
            || source.width != destination.width
            || rows > source.height.min(destination.height)
        {
            return Err(BackendError::InvalidResource);
        }

        let len = rows as usize * source.pitch();
        destination.data[..len].copy_from_slice(&source.data[..len]);
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall) -> Result<(), BackendError> {
        self.check()?;
        let vertices: Vec<PathVertex> = {
            let buffer = self
                .vertex_buffers
                .get(call.vertex_buffer.0 as usize)
                .ok_or(BackendError::InvalidResource)?;
            let len = call.vertex_count as usize * size_of::<PathVertex>();
            let bytes = buffer.get(..len).ok_or(BackendError::InvalidResource)?;
            bytes
                .chunks_exact(size_of::<PathVertex>())
                .map(bytemuck::pod_read_unaligned)
                .collect()
        };
        let mask = self.texture(call.mask_texture)?.clone();
        let instances = self.texture(call.instance_texture)?.clone();
        if mask.format != TextureFormat::R8 || instances.format != TextureFormat::Rgba32Float {
            return Err(BackendError::InvalidResource);
        }
        let image = match call.image {
            Some(id) => Some(
                self.images
                    .get(&id)
                    .cloned()
                    .ok_or(BackendError::InvalidResource)?,
            ),
            None => None,
        };

        // The top left corner of each quad locates the block.
        for quad in vertices.chunks_exact(VERTICES_PER_BLOCK) {
            self.draw_block(quad[0], &mask, &instances, image.as_ref())?;
        }

        self.draw_calls += 1;
        self.vertices_drawn += vertices.len();
        Ok(())
    }
}

/// A paint instance read back from the instance texture.
#[derive(Debug)]
struct Paint {
    mode: DrawMode,
    params: [Texel; 2],
    inverse: [f32; 6],
    stops: Vec<(Texel, f32)>,
}

impl Paint {
    fn read(texture: &Surface, offset: usize) -> Self {
        let header = texture.texel(offset);
        let mode = match header[0] as u32 {
            1 => DrawMode::Linear,
            2 => DrawMode::Radial,
            3 => DrawMode::Image,
            _ => DrawMode::Solid,
        };
        let param_texels = match mode {
            DrawMode::Solid | DrawMode::Linear | DrawMode::Radial => 1,
            DrawMode::Image => 2,
        };
        let params = [texture.texel(offset + 1), texture.texel(offset + 2)];

        let transform = offset + 1 + param_texels;
        let [a, b, c, d] = texture.texel(transform);
        let [e, f, _, _] = texture.texel(transform + 1);

        let stop_count = header[1] as usize;
        let stops = (0..stop_count)
            .map(|i| {
                let stop = transform + 2 + 2 * i;
                (texture.texel(stop), texture.texel(stop + 1)[0])
            })
            .collect();

        Self {
            mode,
            params,
            inverse: [a, b, c, d, e, f],
            stops,
        }
    }

    fn brush_point(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.inverse;
        (a * x + c * y + e, b * x + d * y + f)
    }

    /// The premultiplied color at a target pixel position.
    fn color_at(&self, x: f32, y: f32, image: Option<&Pixmap>) -> [f32; 4] {
        match self.mode {
            DrawMode::Solid => premultiply(self.params[0]),
            DrawMode::Linear => {
                let [sx, sy, dx, dy] = self.params[0];
                let (px, py) = self.brush_point(x, y);
                self.gradient((px - sx) * dx + (py - sy) * dy)
            }
            DrawMode::Radial => {
                let [cx, cy, rx, ry] = self.params[0];
                let (px, py) = self.brush_point(x, y);
                let (ux, uy) = ((px - cx) * rx, (py - cy) * ry);
                self.gradient((ux * ux + uy * uy).sqrt())
            }
            DrawMode::Image => {
                let Some(image) = image else {
                    return [0.0; 4];
                };
                let [sx, sy, sw, sh] = self.params[0];
                let (px, py) = self.brush_point(x, y);
                let ix = (sx + px).min(sx + sw - 1.0).max(sx).max(0.0) as u32;
                let iy = (sy + py).min(sy + sh - 1.0).max(sy).max(0.0) as u32;
                let ix = ix.min(image.width().saturating_sub(1));
                let iy = iy.min(image.height().saturating_sub(1));
                // Bottom-up images mirror the row.
                let iy = if self.params[1][2] != 0.0 {
                    image.height().saturating_sub(1) - iy
                } else {
                    iy
                };
                image.sample(ix, iy).map(|c| f32::from(c) / 255.0)
            }
        }
    }

    fn gradient(&self, t: f32) -> [f32; 4] {
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return [0.0; 4];
        };
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        if t <= first.1 {
            return premultiply(first.0);
        }

        for pair in self.stops.windows(2) {
            let ((c0, o0), (c1, o1)) = (pair[0], pair[1]);
            if t <= o1 {
                let span = o1 - o0;
                let k = if span > 0.0 { (t - o0) / span } else { 1.0 };
                let mut color = [0.0; 4];
                for i in 0..4 {
                    color[i] = c0[i] + (c1[i] - c0[i]) * k;
                }
                return premultiply(color);
            }
        }

        premultiply(last.0)
    }
}

fn premultiply([r, g, b, a]: [f32; 4]) -> [f32; 4] {
    [r * a, g * a, b * a, a]
}

/// Source over with the source scaled by `coverage`.
fn blend(dst: [u8; 4], src: [f32; 4], coverage: f32) -> [u8; 4] {
    let inv = 1.0 - src[3] * coverage;
    let mut out = [0; 4];
    for i in 0..4 {
        let value = src[i] * coverage + f32::from(dst[i]) / 255.0 * inv;
        out[i] = (value.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_is_source_over() {
        assert_eq!(blend([0, 0, 0, 0], [1.0, 0.0, 0.0, 1.0], 1.0), [255, 0, 0, 255]);
        assert_eq!(blend([0, 0, 255, 255], [1.0, 0.0, 0.0, 1.0], 0.5), [128, 0, 128, 255]);
        assert_eq!(blend([0, 0, 255, 255], [0.0, 0.0, 0.0, 0.0], 1.0), [0, 0, 255, 255]);
    }

    #[test]
    fn staging_copies_only_requested_rows() {
        let mut backend = CpuBackend::new(4, 4);
        let staging = backend.create_staging_texture(4, 4, TextureFormat::R8).unwrap();
        let texture = backend.create_texture(4, 4, TextureFormat::R8).unwrap();

        backend.write_staging(staging, &[9; 16]).unwrap();
        backend.copy_staging_to_texture(staging, texture, 2).unwrap();

        let data = &backend.texture(texture).unwrap().data;
        assert_eq!(&data[..8], &[9; 8]);
        assert_eq!(&data[8..], &[0; 8]);
    }

    #[test]
    fn mismatched_handles_are_rejected() {
        let mut backend = CpuBackend::new(4, 4);
        let staging = backend.create_staging_texture(4, 4, TextureFormat::R8).unwrap();
        let texture = backend
            .create_texture(4, 4, TextureFormat::Rgba32Float)
            .unwrap();

        assert_eq!(
            backend.copy_staging_to_texture(staging, texture, 1),
            Err(BackendError::InvalidResource)
        );
        assert_eq!(
            backend.upload_vertices(BufferId(3), &[0; 16]),
            Err(BackendError::InvalidResource)
        );
    }

    #[test]
    fn resource_limit_and_lost_device() {
        let mut backend = CpuBackend::new(4, 4).with_resource_limit(1);
        assert!(backend.create_vertex_buffer(64).is_ok());
        assert_eq!(
            backend.create_vertex_buffer(64),
            Err(BackendError::OutOfMemory)
        );

        backend.lose_device();
        assert_eq!(
            backend.upload_vertices(BufferId(0), &[0; 16]),
            Err(BackendError::DeviceLost)
        );
    }

    #[test]
    fn gradient_pads_and_interpolates() {
        let paint = Paint {
            mode: DrawMode::Linear,
            params: [[0.0, 0.0, 0.1, 0.0], [0.0; 4]],
            inverse: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            stops: vec![([0.0, 0.0, 0.0, 1.0], 0.0), ([1.0, 1.0, 1.0, 1.0], 1.0)],
        };

        assert_eq!(paint.color_at(-5.0, 0.0, None), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(paint.color_at(5.0, 0.0, None), [0.5, 0.5, 0.5, 1.0]);
        assert_eq!(paint.color_at(50.0, 0.0, None), [1.0, 1.0, 1.0, 1.0]);
    }
}
