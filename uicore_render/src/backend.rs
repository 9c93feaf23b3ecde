// Copyright 2025 the UICore Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The narrow interface the batcher needs from a GPU.

use uicore_raster::paint::ImageId;

use crate::error::BackendError;

/// Identifies the device a backend renders with. Pooled resources are kept per device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub u64);

/// A vertex buffer created by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// A texture the shader can sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// A CPU writable texture used to upload data into a [`TextureId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StagingId(pub u32);

/// Pixel formats of the batch textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// One byte of coverage per pixel.
    R8,
    /// Four 32-bit floats per texel.
    Rgba32Float,
}

impl TextureFormat {
    /// The size of one pixel in bytes.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::R8 => 1,
            Self::Rgba32Float => 16,
        }
    }
}

/// Everything one draw call of a batch references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    /// The buffer holding the vertices.
    pub vertex_buffer: BufferId,
    /// The number of vertices to draw, a multiple of six.
    pub vertex_count: u32,
    /// The r8 mask atlas.
    pub mask_texture: TextureId,
    /// The rgba32f paint instances.
    pub instance_texture: TextureId,
    /// The image sampled by image instances, if any.
    pub image: Option<ImageId>,
    /// The width of the render target in pixels.
    pub target_width: u32,
    /// The height of the render target in pixels.
    pub target_height: u32,
}

/// Creates, fills and draws with GPU resources.
///
/// Calls arrive in submission order: all writes and copies for a batch precede its
/// [`draw`](Self::draw). Backends must not reorder them.
pub trait RenderBackend {
    /// The device resources created by this backend belong to.
    fn device_id(&self) -> DeviceId;

    /// Create a vertex buffer of `size` bytes.
    fn create_vertex_buffer(&mut self, size: usize) -> Result<BufferId, BackendError>;

    /// Create a texture that draw calls can sample.
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<TextureId, BackendError>;

    /// Create a staging texture that uploads into textures of the same size and format.
    fn create_staging_texture(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<StagingId, BackendError>;

    /// Replace the start of a vertex buffer with `data`.
    fn upload_vertices(&mut self, buffer: BufferId, data: &[u8]) -> Result<(), BackendError>;

    /// Write tightly packed rows into a staging texture, starting at its first row.
    ///
    /// The last row may be partial.
    fn write_staging(&mut self, staging: StagingId, data: &[u8]) -> Result<(), BackendError>;

    /// Copy the first `rows` rows of a staging texture into a texture.
    fn copy_staging_to_texture(
        &mut self,
        staging: StagingId,
        texture: TextureId,
        rows: u32,
    ) -> Result<(), BackendError>;

    /// Draw a batch.
    fn draw(&mut self, call: &DrawCall) -> Result<(), BackendError>;
}
