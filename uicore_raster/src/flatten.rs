// Copyright 2025 the UICore Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flattening `kurbo` paths into polylines.

use log::warn;
use peniko::kurbo::{self, Affine, BezPath, PathEl, Stroke, StrokeOpts};

/// The maximum distance between a curve and its flattened polyline, in target pixels.
pub const TOLERANCE: f64 = 0.25;

/// Receives polylines, one point at a time.
///
/// The first [`line`](Self::line) after construction or after [`end`](Self::end) starts a new
/// subpath at that point. Every following `line` adds a segment from the previous point.
pub trait PathSink {
    /// Add a point to the current subpath.
    fn line(&mut self, x: f32, y: f32);

    /// Finish the current subpath. If `close` is set, a segment back to its first point is added.
    fn end(&mut self, close: bool);
}

#[derive(Debug, Clone, Copy)]
struct Subpath {
    end: usize,
    closed: bool,
}

/// Reusable buffers for flattening paths.
#[derive(Debug, Default)]
pub struct Flattener {
    points: Vec<(f32, f32)>,
    subpaths: Vec<Subpath>,
    start: usize,
    /// The first point of the current subpath, where drawing resumes after a close.
    subpath_start: kurbo::Point,
    after_close: bool,
    is_nan: bool,
}

impl Flattener {
    /// Create a flattener with empty buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten `path` transformed by `affine` and feed the polylines to `sink`.
    ///
    /// With `close_all`, every subpath is closed, which is what filling needs. Otherwise subpaths
    /// are only closed where the path says so.
    ///
    /// A path that contains NaN is ill-defined, so nothing of it reaches the sink.
    pub fn flatten(
        &mut self,
        path: impl IntoIterator<Item = PathEl>,
        affine: Affine,
        close_all: bool,
        sink: &mut impl PathSink,
    ) {
        self.points.clear();
        self.subpaths.clear();
        self.start = 0;
        self.subpath_start = kurbo::Point::ZERO;
        self.after_close = false;
        self.is_nan = false;

        kurbo::flatten(path.into_iter().map(|el| affine * el), TOLERANCE, |el| {
            match el {
                PathEl::MoveTo(p) => {
                    self.finish(false);
                    self.subpath_start = p;
                    self.after_close = false;
                    self.push(p);
                }
                PathEl::LineTo(p) => {
                    if self.after_close {
                        self.after_close = false;
                        self.push(self.subpath_start);
                    }
                    self.push(p);
                }
                PathEl::ClosePath => {
                    self.finish(true);
                    self.after_close = true;
                }
                // `kurbo::flatten` only emits lines.
                PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
            }
        });
        self.finish(false);

        if self.is_nan {
            warn!("A path contains NaN, ignoring it.");
            return;
        }

        let mut start = 0;
        for subpath in &self.subpaths {
            for &(x, y) in &self.points[start..subpath.end] {
                sink.line(x, y);
            }
            sink.end(close_all || subpath.closed);
            start = subpath.end;
        }
    }

    fn push(&mut self, p: kurbo::Point) {
        self.is_nan |= p.is_nan();
        self.points.push((p.x as f32, p.y as f32));
    }

    /// Finish the subpath started at `self.start`. Subpaths without a segment are dropped.
    fn finish(&mut self, closed: bool) {
        let end = self.points.len();
        if end - self.start >= 2 {
            self.subpaths.push(Subpath { end, closed });
            self.start = end;
        } else {
            self.points.truncate(self.start);
        }
    }
}

/// Expand the outline of a stroked path into a path that can be filled with the nonzero rule.
pub fn expand_stroke(path: impl IntoIterator<Item = PathEl>, style: &Stroke) -> BezPath {
    kurbo::stroke(path, style, &StrokeOpts::default(), TOLERANCE)
}
