// Copyright 2025 the UICore Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Turning a scanline's edges into filled spans.

use peniko::Fill;

use crate::scanline::Edge;

/// Walks the sorted edges of a scanline and yields the filled column ranges `(x_start, x_end)`.
///
/// A column is inside the path if its sample center `x + 0.5` lies between an edge that enters
/// the filled region (inclusive) and the edge that leaves it (exclusive). Whether the region
/// between two edges is filled depends on the fill rule:
///
/// - [`Fill::NonZero`]: the running winding number is not zero.
/// - [`Fill::EvenOdd`]: an odd number of edges has been crossed.
///
/// Spans are maximal (touching spans are merged), never empty, and clipped to `[0, max_width)`.
///
/// The rasterizer makes no assumption about the winding number returning to zero: if the path
/// is malformed and the row is still inside after the last edge, the rasterizer stops there and
/// the unterminated region is not filled.
#[derive(Debug, Clone)]
pub struct SpanRasterizer<'a> {
    edges: &'a [Edge],
    fill_rule: Fill,
    max_width: i32,
    index: usize,
    winding: i32,
    start: f32,
    pending: Option<(i32, i32)>,
}

impl<'a> SpanRasterizer<'a> {
    /// Create a rasterizer over `edges`, which must be sorted by x.
    pub fn new(edges: &'a [Edge], fill_rule: Fill, max_width: i32) -> Self {
        Self {
            edges,
            fill_rule,
            max_width,
            index: 0,
            winding: 0,
            start: 0.0,
            pending: None,
        }
    }

    #[inline]
    fn is_inside(&self) -> bool {
        match self.fill_rule {
            Fill::NonZero => self.winding != 0,
            Fill::EvenOdd => self.winding % 2 != 0,
        }
    }

    /// The next inside region in edge coordinates, unclipped.
    fn next_region(&mut self) -> Option<(f32, f32)> {
        while let Some(edge) = self.edges.get(self.index) {
            self.index += 1;

            let was_inside = self.is_inside();
            self.winding += edge.direction.winding();
            let inside = self.is_inside();

            if !was_inside && inside {
                self.start = edge.x;
            } else if was_inside && !inside {
                return Some((self.start, edge.x));
            }
        }

        None
    }
}

/// The first sample column whose center is at or right of `x`.
#[inline]
fn column(x: f32) -> i32 {
    (x - 0.5).ceil() as i32
}

impl Iterator for SpanRasterizer<'_> {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some((x0, x1)) = self.next_region() else {
                return self.pending.take();
            };

            let x0 = column(x0).max(0);
            let x1 = column(x1).min(self.max_width);
            if x0 >= x1 {
                continue;
            }

            match self.pending {
                Some((p0, p1)) if x0 <= p1 => self.pending = Some((p0, p1.max(x1))),
                Some(span) => {
                    self.pending = Some((x0, x1));
                    return Some(span);
                }
                None => self.pending = Some((x0, x1)),
            }
        }
    }
}
