// Copyright 2025 the UICore Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-scanline edge lists.
//!
//! A path is rasterized by projecting each of its segments onto the horizontal sample line of
//! every subsample row it crosses. The resulting crossings ("edges") are kept sorted by x on
//! their [`Scanline`], so that [`SpanRasterizer`] can walk them left to right.

use core::ops::Range;

use peniko::Fill;
use smallvec::SmallVec;

use crate::span::SpanRasterizer;

/// The vertical direction of the path segment an edge was projected from.
///
/// The ordering puts `Up` before `Down`, which is used to break ties between edges at the
/// same x position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    /// The segment moves towards smaller y.
    Up,
    /// The segment moves towards larger y.
    Down,
}

impl Direction {
    /// The contribution of crossing an edge with this direction to the winding number.
    #[inline]
    pub fn winding(self) -> i32 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

/// A single crossing of a path segment with a scanline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// The x position of the crossing, in subsample units.
    pub x: f32,
    /// The direction of the segment.
    pub direction: Direction,
}

impl Edge {
    /// Create a new edge.
    pub const fn new(x: f32, direction: Direction) -> Self {
        Self { x, direction }
    }

    #[inline]
    fn sorts_before(&self, other: &Self) -> bool {
        self.x < other.x || (self.x == other.x && self.direction < other.direction)
    }
}

/// The edges of one subsample row.
#[derive(Debug, Clone, Default)]
pub struct Scanline {
    edges: SmallVec<[Edge; 8]>,
    pixels: Vec<u8>,
}

impl Scanline {
    /// Insert an edge, keeping the list sorted by x.
    ///
    /// Edges are usually added in path traversal order, which keeps the list close to sorted, so
    /// the new edge is shifted into place from the back instead of sorting the whole list.
    pub fn insert_sorted(&mut self, edge: Edge) {
        self.edges.push(edge);

        let mut pos = self.edges.len() - 1;
        while pos > 0 && edge.sorts_before(&self.edges[pos - 1]) {
            self.edges.swap(pos - 1, pos);
            pos -= 1;
        }
    }

    /// The sorted edges of this scanline.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Whether the scanline has no edges.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Remove all edges, keeping the allocation.
    pub fn clear(&mut self) {
        self.edges.clear();
    }

    /// The filled column ranges of this scanline for `fill_rule`, clipped to `[0, max_width)`.
    pub fn spans(&self, fill_rule: Fill, max_width: i32) -> SpanRasterizer<'_> {
        SpanRasterizer::new(&self.edges, fill_rule, max_width)
    }

    /// Write the coverage of each subsample column into the pixel buffer of this scanline and
    /// return it.
    ///
    /// Covered columns are 255 and uncovered ones 0.
    pub fn rasterize_pixels(&mut self, fill_rule: Fill, max_width: i32) -> &[u8] {
        let Self { edges, pixels } = self;

        pixels.clear();
        pixels.resize(max_width.max(0) as usize, 0);
        for (x0, x1) in SpanRasterizer::new(edges, fill_rule, max_width) {
            pixels[x0 as usize..x1 as usize].fill(255);
        }

        pixels
    }
}

/// The scanlines of a whole fill target, in subsample rows.
///
/// The scanline storage is reused across fills: it grows when the target gets taller and is
/// never shrunk. Only the rows touched since the last reset are cleared.
#[derive(Debug, Default)]
pub struct ScanlineEdgeList {
    scanlines: Vec<Scanline>,
    len: usize,
    touched: Option<(usize, usize)>,
}

impl ScanlineEdgeList {
    /// Create an empty edge list with no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of rows and remove all edges.
    pub fn resize(&mut self, rows: usize) {
        self.reset();
        if self.scanlines.len() < rows {
            self.scanlines.resize_with(rows, Scanline::default);
        }
        self.len = rows;
    }

    /// Remove all edges.
    pub fn reset(&mut self) {
        if let Some((first, last)) = self.touched.take() {
            for scanline in &mut self.scanlines[first..=last] {
                scanline.clear();
            }
        }
    }

    /// The number of rows.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no edge was inserted since the last reset.
    pub fn is_empty(&self) -> bool {
        self.touched.is_none()
    }

    /// All rows.
    pub fn rows(&self) -> &[Scanline] {
        &self.scanlines[..self.len]
    }

    /// The range of rows that received edges since the last reset.
    pub fn touched_rows(&self) -> Option<Range<usize>> {
        self.touched.map(|(first, last)| first..last + 1)
    }

    /// The first row that received an edge since the last reset.
    pub fn first_row(&self) -> Option<usize> {
        self.touched.map(|(first, _)| first)
    }

    /// The last row that received an edge since the last reset.
    pub fn last_row(&self) -> Option<usize> {
        self.touched.map(|(_, last)| last)
    }

    /// Add a crossing on row `scanline_index`.
    ///
    /// # Panics
    ///
    /// Panics if `scanline_index` is out of bounds.
    pub fn insert(&mut self, scanline_index: usize, x: f32, direction: Direction) {
        assert!(
            scanline_index < self.len,
            "scanline {scanline_index} out of bounds for {} rows",
            self.len
        );

        self.scanlines[scanline_index].insert_sorted(Edge::new(x, direction));
        self.touched = Some(match self.touched {
            Some((first, last)) => (first.min(scanline_index), last.max(scanline_index)),
            None => (scanline_index, scanline_index),
        });
    }

    /// Project the segment `(x0, y0) -> (x1, y1)`, given in subsample units, onto every row whose
    /// sample line `row + 0.5` it crosses.
    ///
    /// A sample line that passes exactly through the lower end point belongs to the segment, the
    /// one through the upper end point does not. Horizontal segments never cross a sample line.
    pub fn add_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32) {
        if y0 == y1 || !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
            return;
        }

        let direction = if y1 < y0 {
            Direction::Up
        } else {
            Direction::Down
        };
        let (top, bottom) = if y0 < y1 { (y0, y1) } else { (y1, y0) };

        let rows = self.len as f32;
        let start = (top - 0.5).ceil().clamp(0.0, rows) as usize;
        let end = (bottom - 0.5).ceil().clamp(0.0, rows) as usize;

        let dxdy = (x1 - x0) / (y1 - y0);
        for row in start..end {
            let sample_y = row as f32 + 0.5;
            self.insert(row, x0 + (sample_y - y0) * dxdy, direction);
        }
    }
}
