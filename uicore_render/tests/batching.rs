// Copyright 2025 the UICore Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Splitting work into batches and keeping draw order.

mod util;

use uicore_render::kurbo::{Affine, BezPath, Cap, Rect, Stroke};
use uicore_render::peniko::{Color, ColorStop};
use uicore_render::{BatchConfig, Brush, PathOp, Pixmap, RenderBackend, VERTICES_PER_BLOCK};

use crate::util::{get_ctx, get_ctx_with, solid, BLUE, GREEN, RED};

#[test]
fn full_vertex_buffer_splits_the_fill() {
    let config = BatchConfig {
        vertex_buffer_size: 4 * VERTICES_PER_BLOCK * 16,
        ..Default::default()
    };
    let mut ctx = get_ctx_with(64, 64, &config);
    ctx.fill_rect(Rect::new(8.0, 8.0, 40.0, 24.0), &solid(RED));
    ctx.flush();

    assert_eq!(ctx.backend.draw_calls(), 2);
    assert_eq!(ctx.backend.vertices_drawn(), 6 * VERTICES_PER_BLOCK);
    assert_eq!(ctx.pixel(10, 10), RED);
    assert_eq!(ctx.pixel(38, 22), RED);
}

#[test]
fn consecutive_fills_split_at_the_full_vertex_buffer() {
    let config = BatchConfig {
        vertex_buffer_size: 4 * VERTICES_PER_BLOCK * 16,
        ..Default::default()
    };
    let mut ctx = get_ctx_with(64, 16, &config);
    // Three blocks each: the second fill spills one block into a new batch.
    ctx.fill_rect(Rect::new(0.0, 0.0, 48.0, 16.0), &solid(RED));
    ctx.fill_rect(Rect::new(16.0, 0.0, 64.0, 16.0), &solid(GREEN));
    assert_eq!(ctx.backend.draw_calls(), 1);
    ctx.flush();

    assert_eq!(ctx.backend.draw_calls(), 2);
    assert_eq!(ctx.backend.vertices_drawn(), 36);
    assert_eq!(ctx.pixel(8, 8), RED);
    assert_eq!(ctx.pixel(24, 8), GREEN);
    assert_eq!(ctx.pixel(56, 8), GREEN);
}

#[test]
fn full_mask_atlas_splits_the_fill() {
    // A single slot: every block needs its own batch.
    let config = BatchConfig {
        mask_texture_size: 16,
        ..Default::default()
    };
    let mut ctx = get_ctx_with(64, 64, &config);
    ctx.fill_rect(Rect::new(8.0, 8.0, 40.0, 24.0), &solid(RED));
    ctx.flush();

    assert_eq!(ctx.backend.draw_calls(), 6);
    assert_eq!(ctx.backend.vertices_drawn(), 6 * VERTICES_PER_BLOCK);
    for (x, y) in [(8, 8), (20, 12), (39, 15), (8, 16), (30, 20), (39, 23)] {
        assert_eq!(ctx.pixel(x, y), RED, "pixel ({x}, {y})");
    }
}

#[test]
fn resources_rotate_instead_of_growing() {
    let config = BatchConfig {
        mask_texture_size: 16,
        ..Default::default()
    };
    let mut ctx = get_ctx_with(64, 64, &config);
    ctx.fill_rect(Rect::new(0.0, 0.0, 64.0, 64.0), &solid(RED));
    ctx.flush();

    // Sixteen batches, but never more than four resources of each of the five kinds.
    assert_eq!(ctx.backend.draw_calls(), 16);
    assert_eq!(ctx.backend.resource_count(), 5 * 4);
    assert_eq!(ctx.pool.resource_count(ctx.backend.device_id()), 5 * 4);
}

#[test]
fn many_fills_share_one_batch() {
    let mut ctx = get_ctx(64, 64);
    for i in 0..8 {
        let x = f64::from(i) * 8.0;
        ctx.fill_rect(Rect::new(x, 0.0, x + 4.0, 4.0), &solid(RED));
    }
    assert_eq!(ctx.backend.draw_calls(), 0);

    ctx.flush();
    assert_eq!(ctx.backend.draw_calls(), 1);
    assert_eq!(ctx.paths.draw_calls(), 1);
}

#[test]
fn full_instance_texture_splits_the_batch() {
    // Room for two solid instances of two texels each.
    let config = BatchConfig {
        instance_texture_width: 2,
        instance_texture_height: 2,
        ..Default::default()
    };
    let mut ctx = get_ctx_with(64, 64, &config);
    for i in 0..3 {
        let x = f64::from(i) * 16.0;
        ctx.fill_rect(Rect::new(x, 0.0, x + 8.0, 8.0), &solid(RED));
    }
    ctx.flush();

    assert_eq!(ctx.backend.draw_calls(), 2);
    assert_eq!(ctx.pixel(36, 4), RED);
}

#[test]
fn different_images_do_not_share_a_batch() {
    let mut ctx = get_ctx(32, 16);
    let red = ctx
        .backend
        .register_image(Pixmap::from_rgba8(1, 1, &[255, 0, 0, 255]));
    let blue = ctx
        .backend
        .register_image(Pixmap::from_rgba8(1, 1, &[0, 0, 255, 255]));

    ctx.fill_rect(Rect::new(0.0, 0.0, 16.0, 16.0), &Brush::image(red, 1, 1));
    ctx.fill_rect(Rect::new(16.0, 0.0, 32.0, 16.0), &Brush::image(blue, 1, 1));
    ctx.flush();

    assert_eq!(ctx.backend.draw_calls(), 2);
    assert_eq!(ctx.pixel(8, 8), RED);
    assert_eq!(ctx.pixel(24, 8), BLUE);
}

#[test]
fn fills_and_strokes_keep_request_order() {
    let mut ctx = get_ctx(64, 64);
    ctx.fill_rect(Rect::new(0.0, 0.0, 64.0, 32.0), &solid(RED));
    assert_eq!(ctx.paths.active(), Some(PathOp::Fill));

    let mut line = BezPath::new();
    line.move_to((0.0, 16.0));
    line.line_to((64.0, 16.0));
    ctx.paths
        .stroke(
            &mut ctx.pool,
            &mut ctx.backend,
            &ctx.canvas,
            &line,
            &Stroke::new(8.0),
            &solid(BLUE),
            Affine::IDENTITY,
        )
        .unwrap();
    assert_eq!(ctx.paths.active(), Some(PathOp::Stroke));
    assert_eq!(ctx.backend.draw_calls(), 1);

    ctx.fill_rect(Rect::new(32.0, 0.0, 64.0, 64.0), &solid(GREEN));
    assert_eq!(ctx.backend.draw_calls(), 2);
    ctx.flush();
    assert_eq!(ctx.paths.active(), None);

    assert_eq!(ctx.backend.draw_calls(), 3);
    assert_eq!(ctx.pixel(8, 4), RED);
    assert_eq!(ctx.pixel(8, 16), BLUE);
    assert_eq!(ctx.pixel(48, 16), GREEN);
    assert_eq!(ctx.pixel(8, 40), [0, 0, 0, 0]);
}

#[test]
fn stroke_width_scales_with_the_canvas() {
    let mut ctx = get_ctx(64, 64);
    ctx.canvas = ctx.canvas.with_transform(Affine::scale(2.0));

    let mut line = BezPath::new();
    line.move_to((0.0, 16.0));
    line.line_to((32.0, 16.0));
    ctx.paths
        .stroke(
            &mut ctx.pool,
            &mut ctx.backend,
            &ctx.canvas,
            &line,
            &Stroke::new(4.0),
            &solid(BLUE),
            Affine::IDENTITY,
        )
        .unwrap();
    ctx.flush();

    // The line lands on y = 32 and is 8 pixels wide.
    assert_eq!(ctx.pixel(10, 28), BLUE);
    assert_eq!(ctx.pixel(10, 35), BLUE);
    assert_eq!(ctx.pixel(10, 27), [0, 0, 0, 0]);
    assert_eq!(ctx.pixel(10, 36), [0, 0, 0, 0]);
}

#[test]
fn dashes_scale_with_the_canvas() {
    let mut ctx = get_ctx(64, 32);
    ctx.canvas = ctx.canvas.with_transform(Affine::scale(2.0));

    let mut line = BezPath::new();
    line.move_to((0.0, 8.0));
    line.line_to((32.0, 8.0));
    let style = Stroke::new(4.0)
        .with_caps(Cap::Butt)
        .with_dashes(0.0, [4.0, 4.0]);
    ctx.paths
        .stroke(
            &mut ctx.pool,
            &mut ctx.backend,
            &ctx.canvas,
            &line,
            &style,
            &solid(BLUE),
            Affine::IDENTITY,
        )
        .unwrap();
    ctx.flush();

    // Dashes and gaps are 8 pixels long on the target.
    assert_eq!(ctx.pixel(4, 16), BLUE);
    assert_eq!(ctx.pixel(10, 16), [0, 0, 0, 0]);
    assert_eq!(ctx.pixel(14, 16), [0, 0, 0, 0]);
    assert_eq!(ctx.pixel(20, 16), BLUE);
}

#[test]
fn translucent_fills_blend_in_order() {
    let stops = [
        ColorStop {
            offset: 0.0,
            color: Color::rgba8(0, 0, 255, 128),
        },
        ColorStop {
            offset: 1.0,
            color: Color::rgba8(0, 0, 255, 128),
        },
    ];
    let mut ctx = get_ctx(16, 16);
    ctx.fill_rect(Rect::new(0.0, 0.0, 16.0, 16.0), &solid(RED));
    ctx.fill_rect(
        Rect::new(0.0, 0.0, 16.0, 16.0),
        &Brush::linear((0.0, 0.0), (16.0, 0.0), &stops),
    );
    ctx.flush();

    let [r, g, b, a] = ctx.pixel(8, 8);
    assert_eq!((g, a), (0, 255));
    assert!((126..=128).contains(&r), "{r}");
    assert!((127..=129).contains(&b), "{b}");
}
