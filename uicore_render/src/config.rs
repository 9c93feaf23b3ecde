// Copyright 2025 the UICore Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sizes of the batch buffers and of the resource rotation.

use uicore_raster::MASK_BLOCK_SIZE;

use crate::error::{RenderError, Result};
use crate::vertex::{PathVertex, VERTICES_PER_BLOCK};

/// Configuration of the batch buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// The size of one vertex buffer in bytes.
    pub vertex_buffer_size: usize,
    /// The number of vertex buffers in the rotation.
    pub num_vertex_buffers: usize,
    /// The number of mask and instance textures (and their staging textures) in the rotation.
    pub num_texture_buffers: usize,
    /// The width and height of the r8 mask atlas. Must be a multiple of the mask block size.
    pub mask_texture_size: u32,
    /// The width of the rgba32f instance texture in texels.
    pub instance_texture_width: u32,
    /// The height of the rgba32f instance texture in texels.
    pub instance_texture_height: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            vertex_buffer_size: 1024 * 1024,
            num_vertex_buffers: 4,
            num_texture_buffers: 4,
            mask_texture_size: 1024,
            instance_texture_width: 256,
            instance_texture_height: 256,
        }
    }
}

impl BatchConfig {
    /// Check that the configuration can be used to render.
    ///
    /// Resources are reused round-robin while the device may still be reading earlier ones,
    /// so every rotation needs at least two entries.
    pub fn validate(&self) -> Result<()> {
        if self.num_vertex_buffers < 2 || self.num_texture_buffers < 2 {
            return Err(RenderError::InvalidConfig(
                "the resource rotation needs at least two buffers of each kind",
            ));
        }
        if self.mask_texture_size == 0 || self.mask_texture_size as usize % MASK_BLOCK_SIZE != 0 {
            return Err(RenderError::InvalidConfig(
                "the mask texture size must be a positive multiple of the mask block size",
            ));
        }
        if self.instance_texture_width == 0 || self.instance_texture_height == 0 {
            return Err(RenderError::InvalidConfig(
                "the instance texture must not be empty",
            ));
        }
        if self.max_vertices() < VERTICES_PER_BLOCK {
            return Err(RenderError::InvalidConfig(
                "the vertex buffer must hold at least one block",
            ));
        }
        Ok(())
    }

    /// The number of vertices that fit into one vertex buffer.
    pub fn max_vertices(&self) -> usize {
        self.vertex_buffer_size / size_of::<PathVertex>()
    }

    /// The number of texels of the instance texture.
    pub fn instance_texels(&self) -> usize {
        self.instance_texture_width as usize * self.instance_texture_height as usize
    }
}
