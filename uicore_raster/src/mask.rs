// Copyright 2025 the UICore Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Antialiased coverage blocks packed into a mask atlas.
//!
//! A fill is rasterized one block row at a time. A block row is [`SCANLINE_BLOCK_SIZE`]
//! subsample rows high; every block in it covers [`MASK_BLOCK_SIZE`] x [`MASK_BLOCK_SIZE`]
//! target pixels. The coverage of a pixel is the number of its
//! `ANTIALIAS_LEVEL * ANTIALIAS_LEVEL` subsamples that lie inside the path, scaled to a byte.
//!
//! Blocks are bump-allocated from a square atlas. Once [`MaskBlockCache::is_full`] reports
//! that all slots are used, the caller has to upload and draw what it has, then
//! [`reset`](MaskBlockCache::reset) the cache to start a new atlas generation. This lets
//! arbitrarily large paths be rasterized with a bounded mask buffer.

use peniko::Fill;

use crate::scanline::Scanline;
use crate::{ANTIALIAS_LEVEL, MASK_BLOCK_SIZE, SCANLINE_BLOCK_SIZE};

const BLOCK_AREA: usize = MASK_BLOCK_SIZE * MASK_BLOCK_SIZE;
const TAPS_PER_PIXEL: u16 = (ANTIALIAS_LEVEL * ANTIALIAS_LEVEL) as u16;

/// How a block is covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// Every subsample of the block is inside. All fully covered blocks of an atlas generation
    /// share one slot holding 255 everywhere.
    Full,
    /// The block has its own slot with per-pixel coverage.
    Partial,
}

/// A block that received coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskBlock {
    /// The index of the block's slot in the atlas.
    pub index: u32,
    /// How the block is covered.
    pub coverage: Coverage,
}

/// Converts the spans of a block row into coverage blocks and packs them into an atlas.
#[derive(Debug)]
pub struct MaskBlockCache {
    texture_size: usize,
    blocks_per_row: usize,
    max_blocks: usize,
    /// The staged atlas, `texture_size * texture_size` bytes.
    data: Vec<u8>,
    next_block: usize,
    full_block: Option<u32>,
    full_blocks: u32,
    partial_blocks: u32,
    /// The spans of each subsample row of the current block row.
    row_spans: Vec<Vec<(i32, i32)>>,
    /// The first span of each subsample row that may still reach the next block.
    cursors: [usize; SCANLINE_BLOCK_SIZE],
    counts: [u8; BLOCK_AREA],
}

impl MaskBlockCache {
    /// Create a cache for a square atlas of `texture_size` x `texture_size` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `texture_size` is zero or not a multiple of [`MASK_BLOCK_SIZE`].
    pub fn new(texture_size: usize) -> Self {
        assert!(
            texture_size > 0 && texture_size % MASK_BLOCK_SIZE == 0,
            "mask texture size {texture_size} must be a positive multiple of {MASK_BLOCK_SIZE}"
        );

        let blocks_per_row = texture_size / MASK_BLOCK_SIZE;
        Self {
            texture_size,
            blocks_per_row,
            max_blocks: blocks_per_row * blocks_per_row,
            data: vec![0; texture_size * texture_size],
            next_block: 0,
            full_block: None,
            full_blocks: 0,
            partial_blocks: 0,
            row_spans: vec![Vec::new(); SCANLINE_BLOCK_SIZE],
            cursors: [0; SCANLINE_BLOCK_SIZE],
            counts: [0; BLOCK_AREA],
        }
    }

    /// The width and height of the atlas in bytes.
    pub fn texture_size(&self) -> usize {
        self.texture_size
    }

    /// The number of block slots in the atlas.
    pub fn capacity(&self) -> usize {
        self.max_blocks
    }

    /// The number of slots allocated in the current generation.
    pub fn len(&self) -> usize {
        self.next_block
    }

    /// Whether no slot is allocated in the current generation.
    pub fn is_empty(&self) -> bool {
        self.next_block == 0
    }

    /// Whether every slot is allocated.
    ///
    /// [`fill_block`](Self::fill_block) must not be called while the atlas is full.
    pub fn is_full(&self) -> bool {
        self.next_block == self.max_blocks
    }

    /// The number of fully covered blocks emitted in the current generation.
    pub fn full_blocks(&self) -> u32 {
        self.full_blocks
    }

    /// The number of partially covered blocks emitted in the current generation.
    pub fn partial_blocks(&self) -> u32 {
        self.partial_blocks
    }

    /// Start a new atlas generation. All slots become free.
    pub fn reset(&mut self) {
        self.next_block = 0;
        self.full_block = None;
        self.full_blocks = 0;
        self.partial_blocks = 0;
    }

    /// The staged atlas bytes, row-major with a pitch of [`texture_size`](Self::texture_size).
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The number of atlas rows that contain allocated slots.
    ///
    /// Only these rows need to be uploaded.
    pub fn used_rows(&self) -> usize {
        self.next_block.div_ceil(self.blocks_per_row) * MASK_BLOCK_SIZE
    }

    /// The atlas position of the top left pixel of slot `index`.
    pub fn block_origin(&self, index: u32) -> (usize, usize) {
        let index = index as usize;
        (
            (index % self.blocks_per_row) * MASK_BLOCK_SIZE,
            (index / self.blocks_per_row) * MASK_BLOCK_SIZE,
        )
    }

    /// Read back the coverage of slot `index`, row-major.
    pub fn block(&self, index: u32) -> [u8; BLOCK_AREA] {
        let (x, y) = self.block_origin(index);
        let mut block = [0; BLOCK_AREA];
        for (row, dst) in block.chunks_exact_mut(MASK_BLOCK_SIZE).enumerate() {
            let start = (y + row) * self.texture_size + x;
            dst.copy_from_slice(&self.data[start..start + MASK_BLOCK_SIZE]);
        }
        block
    }

    /// Prepare for the blocks of a new block row.
    ///
    /// `scanlines` are the subsample rows of the block row; missing rows are treated as empty.
    /// Spans are clipped to `[0, max_width)` subsample columns.
    pub fn begin_row(&mut self, scanlines: &[Scanline], fill_rule: Fill, max_width: i32) {
        debug_assert!(scanlines.len() <= SCANLINE_BLOCK_SIZE);

        for (i, spans) in self.row_spans.iter_mut().enumerate() {
            spans.clear();
            if let Some(scanline) = scanlines.get(i) {
                spans.extend(scanline.spans(fill_rule, max_width));
            }
        }
        self.cursors = [0; SCANLINE_BLOCK_SIZE];
    }

    /// Rasterize the block starting at subsample column `x_pos`.
    ///
    /// `x_pos` must be a multiple of [`SCANLINE_BLOCK_SIZE`] and must not decrease within a
    /// block row. Returns `None` if nothing of the block is covered.
    ///
    /// # Panics
    ///
    /// Panics if the block needs a new slot while the atlas [is full](Self::is_full).
    pub fn fill_block(&mut self, x_pos: i32) -> Option<MaskBlock> {
        self.advance_to(x_pos);

        if self.is_full_block(x_pos) {
            self.full_blocks += 1;
            let index = match self.full_block {
                Some(index) => index,
                None => {
                    let index = self.allocate();
                    self.write_block(index, |_| 255);
                    self.full_block = Some(index);
                    index
                }
            };
            return Some(MaskBlock {
                index,
                coverage: Coverage::Full,
            });
        }

        if !self.accumulate(x_pos) {
            return None;
        }

        let index = self.allocate();
        let counts = self.counts;
        self.write_block(index, |i| {
            (u16::from(counts[i]) * 255 / TAPS_PER_PIXEL) as u8
        });
        self.partial_blocks += 1;

        Some(MaskBlock {
            index,
            coverage: Coverage::Partial,
        })
    }

    /// Skip the spans that end at or before `x_pos`.
    fn advance_to(&mut self, x_pos: i32) {
        for (spans, cursor) in self.row_spans.iter().zip(self.cursors.iter_mut()) {
            while spans.get(*cursor).is_some_and(|&(_, x1)| x1 <= x_pos) {
                *cursor += 1;
            }
        }
    }

    fn is_full_block(&self, x_pos: i32) -> bool {
        let end = x_pos + SCANLINE_BLOCK_SIZE as i32;
        self.row_spans
            .iter()
            .zip(&self.cursors)
            .all(|(spans, &cursor)| {
                spans
                    .get(cursor)
                    .is_some_and(|&(x0, x1)| x0 <= x_pos && x1 >= end)
            })
    }

    /// Count the inside taps of every pixel of the block. Returns whether any tap is inside.
    fn accumulate(&mut self, x_pos: i32) -> bool {
        let end = x_pos + SCANLINE_BLOCK_SIZE as i32;
        let mut found = false;

        self.counts = [0; BLOCK_AREA];
        for (sub_y, (spans, cursor)) in self
            .row_spans
            .iter()
            .zip(self.cursors.iter_mut())
            .enumerate()
        {
            let row = (sub_y / ANTIALIAS_LEVEL) * MASK_BLOCK_SIZE;
            while let Some(&(x0, x1)) = spans.get(*cursor) {
                if x0 >= end {
                    break;
                }

                let start = (x0.max(x_pos) - x_pos) as usize;
                let stop = (x1.min(end) - x_pos) as usize;
                for sub_x in start..stop {
                    self.counts[row + sub_x / ANTIALIAS_LEVEL] += 1;
                }
                found |= start < stop;

                // A span reaching into the next block stays current.
                if x1 > end {
                    break;
                }
                *cursor += 1;
            }
        }

        found
    }

    fn allocate(&mut self) -> u32 {
        assert!(!self.is_full(), "mask atlas is full, flush before filling more blocks");
        let index = self.next_block;
        self.next_block += 1;
        index as u32
    }

    fn write_block(&mut self, index: u32, coverage: impl Fn(usize) -> u8) {
        let (x, y) = self.block_origin(index);
        for row in 0..MASK_BLOCK_SIZE {
            let start = (y + row) * self.texture_size + x;
            for (col, byte) in self.data[start..start + MASK_BLOCK_SIZE]
                .iter_mut()
                .enumerate()
            {
                *byte = coverage(row * MASK_BLOCK_SIZE + col);
            }
        }
    }
}
