// Copyright 2025 the UICore Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! This crate contains the CPU half of the UICore path renderer: scanline edge lists, the span
//! rasterizer, the antialiasing mask block cache and the paint instance encoding.
//!
//! # Usage
//!
//! This crate does not talk to a GPU. It is driven by `uicore_render`, which owns the batching
//! state and hands the staged mask atlas, instance texels and vertices to a backend.
//!
//! # Contents
//!
//! - [`scanline`]: per-scanline sorted edge lists.
//! - [`span`]: walking a scanline's edges into filled column ranges for a fill rule.
//! - [`mask`]: converting spans into antialiased coverage blocks packed into an atlas.
//! - [`paint`] and [`instance`]: brushes and their texel encoding.
//! - [`flatten`]: feeding `kurbo` paths into anything implementing [`flatten::PathSink`].
//!
//! # Coordinate spaces
//!
//! Paths arrive in target pixel space. Internally everything is rasterized at
//! [`ANTIALIAS_LEVEL`] times the target resolution in both axes ("subsample space"),
//! so one mask block of [`MASK_BLOCK_SIZE`] pixels spans [`SCANLINE_BLOCK_SIZE`] subsample
//! rows and columns.
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
    reason = "Coordinates are clamped to the target before casting, and targets fit in i32."
)]

pub mod flatten;
pub mod instance;
pub mod mask;
pub mod paint;
pub mod scanline;
pub mod span;

pub use peniko;
pub use peniko::kurbo;

/// The supersampling factor in each axis.
///
/// Coverage is the fraction of `ANTIALIAS_LEVEL * ANTIALIAS_LEVEL` taps that are inside.
pub const ANTIALIAS_LEVEL: usize = 2;

/// The width and height of a mask block in target pixels.
///
/// If changing this, remember to modify the path shaders.
pub const MASK_BLOCK_SIZE: usize = 16;

/// The width and height of a mask block in subsample units.
pub const SCANLINE_BLOCK_SIZE: usize = MASK_BLOCK_SIZE * ANTIALIAS_LEVEL;
