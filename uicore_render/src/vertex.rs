// Copyright 2025 the UICore Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Block quads.

use bytemuck::{Pod, Zeroable};
use uicore_raster::MASK_BLOCK_SIZE;

/// The number of vertices of one block: two triangles.
pub const VERTICES_PER_BLOCK: usize = 6;

/// A corner of a block quad.
///
/// This struct corresponds to the `VertexInput` struct in `path.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct PathVertex {
    /// The corner in target pixels.
    pub x: i32,
    /// The corner in target pixels.
    pub y: i32,
    /// The texel offset of the paint instance.
    pub instance_offset: i32,
    /// The index of the block in the mask atlas.
    pub mask_offset: i32,
}

/// The vertices of one batch, capped at the size of a vertex buffer.
#[derive(Debug)]
pub struct VertexBatch {
    vertices: Vec<PathVertex>,
    max_vertices: usize,
}

impl VertexBatch {
    /// Create a batch that fits into a vertex buffer of `vertex_buffer_size` bytes.
    pub fn new(vertex_buffer_size: usize) -> Self {
        let max_vertices = vertex_buffer_size / size_of::<PathVertex>();
        Self {
            vertices: Vec::with_capacity(max_vertices),
            max_vertices,
        }
    }

    /// Append the quad of the block whose top left corner is at `(x, y)` target pixels.
    ///
    /// # Panics
    ///
    /// Panics if the batch [is full](Self::is_full).
    pub fn push(&mut self, x: i32, y: i32, instance_offset: u32, mask_offset: u32) {
        assert!(!self.is_full(), "vertex batch is full, flush before pushing more blocks");

        let size = MASK_BLOCK_SIZE as i32;
        let vertex = |x, y| PathVertex {
            x,
            y,
            instance_offset: instance_offset as i32,
            mask_offset: mask_offset as i32,
        };
        self.vertices.extend([
            vertex(x, y),
            vertex(x + size, y),
            vertex(x, y + size),
            vertex(x + size, y),
            vertex(x + size, y + size),
            vertex(x, y + size),
        ]);
    }

    /// Whether another block would exceed the vertex buffer.
    pub fn is_full(&self) -> bool {
        self.max_vertices - self.vertices.len() < VERTICES_PER_BLOCK
    }

    /// The number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the batch has no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// The maximum number of vertices.
    pub fn capacity(&self) -> usize {
        self.max_vertices
    }

    /// The vertices pushed so far.
    pub fn vertices(&self) -> &[PathVertex] {
        &self.vertices
    }

    /// The vertices as bytes for uploading.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Remove all vertices.
    pub fn reset(&mut self) {
        self.vertices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_is_two_triangles() {
        let mut batch = VertexBatch::new(1024);
        batch.push(32, 48, 7, 3);

        let corners: Vec<_> = batch.vertices().iter().map(|v| (v.x, v.y)).collect();
        assert_eq!(
            corners,
            vec![(32, 48), (48, 48), (32, 64), (48, 48), (48, 64), (32, 64)]
        );
        assert!(batch
            .vertices()
            .iter()
            .all(|v| v.instance_offset == 7 && v.mask_offset == 3));
        assert_eq!(batch.as_bytes().len(), 6 * 16);
    }

    #[test]
    fn full_when_no_block_fits() {
        // Room for 13 vertices, so two blocks.
        let mut batch = VertexBatch::new(13 * size_of::<PathVertex>());
        assert_eq!(batch.capacity(), 13);
        batch.push(0, 0, 0, 0);
        assert!(!batch.is_full());
        batch.push(16, 0, 0, 1);
        assert!(batch.is_full());
        assert_eq!(batch.len(), 12);

        batch.reset();
        assert!(batch.is_empty());
        assert!(!batch.is_full());
    }

    #[test]
    #[should_panic(expected = "vertex batch is full")]
    fn pushing_into_full_batch_panics() {
        let mut batch = VertexBatch::new(6 * size_of::<PathVertex>());
        batch.push(0, 0, 0, 0);
        batch.push(16, 0, 0, 0);
    }
}
