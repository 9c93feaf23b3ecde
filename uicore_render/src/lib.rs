// Copyright 2025 the UICore Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batches rasterized paths into draw calls.
//!
//! Paths are flattened into scanline edge lists, rasterized into antialiased 16x16 mask blocks
//! and drawn as one quad per block. A batch holds a mask atlas, a texture of paint instances and
//! a vertex buffer; when any of them runs full the batch is uploaded and drawn, and a new one
//! starts. The GPU resources the batches are uploaded into rotate through a
//! [`RenderBatchBuffer`] pool so that a buffer still in flight is not overwritten.
//!
//! # Usage
//!
//! ```
//! use uicore_render::kurbo::{Affine, Rect, Shape};
//! use uicore_render::peniko::{Color, Fill};
//! use uicore_render::{BatchConfig, Brush, Canvas, CpuBackend, RenderBatchBuffer, RenderBatchPath};
//!
//! # fn main() -> Result<(), uicore_render::RenderError> {
//! let config = BatchConfig::default();
//! let mut pool = RenderBatchBuffer::new(&config)?;
//! let mut paths = RenderBatchPath::new(&config)?;
//! let mut backend = CpuBackend::new(64, 64);
//! let canvas = Canvas::new(64, 64);
//!
//! let rect = Rect::new(8.0, 8.0, 40.0, 24.0);
//! let brush = Brush::Solid(Color::RED);
//! let path = rect.path_elements(0.1);
//! paths.fill(&mut pool, &mut backend, &canvas, path, Fill::NonZero, &brush, Affine::IDENTITY)?;
//! paths.flush(&mut pool, &mut backend)?;
//!
//! assert_eq!(backend.target().sample(20, 16), [255, 0, 0, 255]);
//! # Ok(())
//! # }
//! ```
//!
//! The [`CpuBackend`] executes draw calls in software and is what the tests render with.
//! With the `wgpu` feature, `WgpuBackend` draws with `wgpu`.
//!
//! # Features
//!
//! - `wgpu`: the `wgpu` backend and its shader.
// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![allow(
    clippy::cast_possible_truncation,
    reason = "Batch sizes are validated to fit the GPU's 32-bit indices."
)]

mod backend;
mod canvas;
mod config;
mod cpu;
mod error;
mod fill;
mod path;
mod pixmap;
mod pool;
mod stroke;
mod vertex;
#[cfg(feature = "wgpu")]
mod wgpu_backend;

pub use uicore_raster;
pub use uicore_raster::flatten::PathSink as PathRenderer;
pub use uicore_raster::instance::ImageYAxis;
pub use uicore_raster::paint::{Brush, ImageId};
pub use uicore_raster::{kurbo, peniko};

pub use backend::{
    BufferId, DeviceId, DrawCall, RenderBackend, StagingId, TextureFormat, TextureId,
};
pub use canvas::Canvas;
pub use config::BatchConfig;
pub use cpu::CpuBackend;
pub use error::{BackendError, RenderError};
pub use fill::{find_extent, Extent, PathFillRenderer};
pub use path::{PathOp, RenderBatchPath};
pub use pixmap::Pixmap;
pub use pool::RenderBatchBuffer;
pub use stroke::PathStrokeRenderer;
pub use vertex::{PathVertex, VertexBatch, VERTICES_PER_BLOCK};
#[cfg(feature = "wgpu")]
pub use wgpu_backend::{WgpuBackend, WgpuFrame};
