// Copyright 2025 the UICore Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Helpers shared across the integration tests.

#![allow(dead_code, reason = "not every test uses every helper")]

use uicore_render::kurbo::{Affine, Rect, Shape};
use uicore_render::peniko::{Color, Fill};
use uicore_render::{BatchConfig, Brush, Canvas, CpuBackend, RenderBatchBuffer, RenderBatchPath};

pub(crate) const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];
pub(crate) const RED: [u8; 4] = [255, 0, 0, 255];
pub(crate) const GREEN: [u8; 4] = [0, 255, 0, 255];
pub(crate) const BLUE: [u8; 4] = [0, 0, 255, 255];

/// Everything needed to draw into a CPU target.
pub(crate) struct Ctx {
    pub(crate) pool: RenderBatchBuffer,
    pub(crate) paths: RenderBatchPath,
    pub(crate) backend: CpuBackend,
    pub(crate) canvas: Canvas,
}

pub(crate) fn get_ctx(width: u32, height: u32) -> Ctx {
    get_ctx_with(width, height, &BatchConfig::default())
}

pub(crate) fn get_ctx_with(width: u32, height: u32, config: &BatchConfig) -> Ctx {
    Ctx {
        pool: RenderBatchBuffer::new(config).unwrap(),
        paths: RenderBatchPath::new(config).unwrap(),
        backend: CpuBackend::new(width, height),
        canvas: Canvas::new(width, height),
    }
}

impl Ctx {
    pub(crate) fn fill_rect(&mut self, rect: Rect, brush: &Brush) {
        self.paths
            .fill(
                &mut self.pool,
                &mut self.backend,
                &self.canvas,
                rect.path_elements(0.1),
                Fill::NonZero,
                brush,
                Affine::IDENTITY,
            )
            .unwrap();
    }

    pub(crate) fn flush(&mut self) {
        self.paths.flush(&mut self.pool, &mut self.backend).unwrap();
    }

    pub(crate) fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.backend.target().sample(x, y)
    }
}

pub(crate) fn solid(color: [u8; 4]) -> Brush {
    let [r, g, b, a] = color;
    Brush::Solid(Color::rgba8(r, g, b, a))
}
