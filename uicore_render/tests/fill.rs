// Copyright 2025 the UICore Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendered output of fills.

mod util;

use uicore_render::kurbo::{Affine, BezPath, Rect, Shape};
use uicore_render::peniko::{Color, ColorStop, Fill};
use uicore_render::{Brush, ImageYAxis, Pixmap};

use crate::util::{get_ctx, solid, RED, TRANSPARENT};

#[test]
fn pixel_aligned_rect_has_hard_edges() {
    let mut ctx = get_ctx(64, 64);
    ctx.fill_rect(Rect::new(8.0, 8.0, 40.0, 24.0), &solid(RED));
    ctx.flush();

    assert_eq!(ctx.pixel(20, 16), RED);
    assert_eq!(ctx.pixel(8, 8), RED);
    assert_eq!(ctx.pixel(39, 23), RED);
    assert_eq!(ctx.pixel(7, 8), TRANSPARENT);
    assert_eq!(ctx.pixel(8, 7), TRANSPARENT);
    assert_eq!(ctx.pixel(40, 23), TRANSPARENT);
    assert_eq!(ctx.pixel(39, 24), TRANSPARENT);
    assert_eq!(ctx.backend.draw_calls(), 1);
    // Two block rows of three blocks each.
    assert_eq!(ctx.backend.vertices_drawn(), 6 * 6);
}

#[test]
fn half_pixel_edge_is_antialiased() {
    let mut ctx = get_ctx(32, 32);
    ctx.fill_rect(Rect::new(8.5, 8.0, 24.0, 24.0), &solid(RED));
    ctx.flush();

    // Half of the subsamples of the left column are inside.
    assert_eq!(ctx.pixel(8, 12), [127, 0, 0, 127]);
    assert_eq!(ctx.pixel(9, 12), RED);
    assert_eq!(ctx.pixel(7, 12), TRANSPARENT);
}

#[test]
fn small_square_is_one_block() {
    let mut ctx = get_ctx(16, 16);
    ctx.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), &solid(RED));
    ctx.flush();

    assert_eq!(ctx.backend.vertices_drawn(), 6);
    for y in 0..16 {
        for x in 0..16 {
            let inside = x < 4 && y < 4;
            let expected = if inside { RED } else { TRANSPARENT };
            assert_eq!(ctx.pixel(x, y), expected, "pixel ({x}, {y})");
        }
    }
}

#[test]
fn fractional_rect_antialiases_only_its_border() {
    let mut ctx = get_ctx(40, 30);
    ctx.fill_rect(Rect::new(10.25, 10.25, 30.75, 20.75), &solid(RED));
    ctx.flush();

    for y in 0..30 {
        for x in 0..40 {
            let pixel = ctx.pixel(x, y);
            if (11..=29).contains(&x) && (11..=19).contains(&y) {
                assert_eq!(pixel, RED, "pixel ({x}, {y})");
            } else if !(10..=30).contains(&x) || !(10..=20).contains(&y) {
                assert_eq!(pixel, TRANSPARENT, "pixel ({x}, {y})");
            }
        }
    }
    // The bottom and right edges cover half of their pixels.
    assert!(ctx.pixel(20, 20)[3] > 0 && ctx.pixel(20, 20)[3] < 255);
    assert!(ctx.pixel(30, 15)[3] > 0 && ctx.pixel(30, 15)[3] < 255);
}

#[test]
fn even_odd_leaves_hole_in_doubly_wound_path() {
    // The inner square is wound twice in the same direction as the outer one.
    let mut path = Rect::new(0.0, 0.0, 32.0, 32.0).to_path(0.1);
    path.extend(Rect::new(8.0, 8.0, 24.0, 24.0).path_elements(0.1));

    for (fill_rule, center) in [(Fill::NonZero, RED), (Fill::EvenOdd, TRANSPARENT)] {
        let mut ctx = get_ctx(32, 32);
        ctx.paths
            .fill(
                &mut ctx.pool,
                &mut ctx.backend,
                &ctx.canvas,
                &path,
                fill_rule,
                &solid(RED),
                Affine::IDENTITY,
            )
            .unwrap();
        ctx.flush();

        assert_eq!(ctx.pixel(2, 2), RED, "{fill_rule:?}");
        assert_eq!(ctx.pixel(16, 16), center, "{fill_rule:?}");
    }
}

#[test]
fn open_subpaths_are_closed() {
    let mut path = BezPath::new();
    path.move_to((0.0, 0.0));
    path.line_to((16.0, 0.0));
    path.line_to((16.0, 16.0));
    path.line_to((0.0, 16.0));

    let mut ctx = get_ctx(16, 16);
    ctx.paths
        .fill(
            &mut ctx.pool,
            &mut ctx.backend,
            &ctx.canvas,
            &path,
            Fill::NonZero,
            &solid(RED),
            Affine::IDENTITY,
        )
        .unwrap();
    ctx.flush();

    assert_eq!(ctx.pixel(0, 0), RED);
    assert_eq!(ctx.pixel(15, 15), RED);
}

#[test]
fn canvas_transform_moves_the_path() {
    let mut ctx = get_ctx(32, 32);
    ctx.canvas = ctx.canvas.with_transform(Affine::translate((16.0, 16.0)));
    ctx.fill_rect(Rect::new(0.0, 0.0, 8.0, 8.0), &solid(RED));
    ctx.flush();

    assert_eq!(ctx.pixel(4, 4), TRANSPARENT);
    assert_eq!(ctx.pixel(20, 20), RED);
}

#[test]
fn paths_outside_the_target_draw_nothing() {
    let mut ctx = get_ctx(32, 32);
    ctx.fill_rect(Rect::new(40.0, 0.0, 60.0, 20.0), &solid(RED));
    ctx.fill_rect(Rect::new(0.0, -30.0, 20.0, -10.0), &solid(RED));
    ctx.flush();

    assert_eq!(ctx.backend.draw_calls(), 0);
    assert!(ctx.backend.target().data().iter().all(|&p| p == TRANSPARENT));
}

#[test]
fn paths_are_clipped_to_the_target() {
    let mut ctx = get_ctx(20, 20);
    ctx.fill_rect(Rect::new(-10.0, -10.0, 30.0, 30.0), &solid(RED));
    ctx.flush();

    assert!(ctx.backend.target().data().iter().all(|&p| p == RED));
}

#[test]
fn linear_gradient_interpolates_along_the_line() {
    let stops = [
        ColorStop {
            offset: 0.0,
            color: Color::BLACK,
        },
        ColorStop {
            offset: 1.0,
            color: Color::WHITE,
        },
    ];
    let brush = Brush::linear((0.0, 0.0), (64.0, 0.0), &stops);

    let mut ctx = get_ctx(64, 4);
    ctx.fill_rect(Rect::new(0.0, 0.0, 64.0, 4.0), &brush);
    ctx.flush();

    // The pixel center 31.5 is at offset 31.5 / 64.
    assert_eq!(ctx.pixel(31, 1), [126, 126, 126, 255]);
    assert!(ctx.pixel(0, 1)[0] < ctx.pixel(10, 1)[0]);
    assert!(ctx.pixel(50, 1)[0] < ctx.pixel(63, 1)[0]);
}

#[test]
fn brush_transform_moves_the_gradient() {
    let stops = [
        ColorStop {
            offset: 0.5,
            color: Color::BLACK,
        },
        ColorStop {
            offset: 0.5,
            color: Color::WHITE,
        },
    ];
    let brush = Brush::linear((0.0, 0.0), (32.0, 0.0), &stops);

    let mut ctx = get_ctx(32, 2);
    ctx.paths
        .fill(
            &mut ctx.pool,
            &mut ctx.backend,
            &ctx.canvas,
            Rect::new(0.0, 0.0, 32.0, 2.0).path_elements(0.1),
            Fill::NonZero,
            &brush,
            Affine::translate((-8.0, 0.0)),
        )
        .unwrap();
    ctx.flush();

    // The hard stop moves from x = 16 to x = 8.
    assert_eq!(ctx.pixel(6, 0), [0, 0, 0, 255]);
    assert_eq!(ctx.pixel(10, 0), [255, 255, 255, 255]);
}

#[test]
fn image_brush_samples_nearest_pixel() {
    let image = Pixmap::from_rgba8(
        2,
        2,
        &[
            255, 0, 0, 255, 0, 255, 0, 255, //
            0, 0, 255, 255, 255, 255, 255, 255,
        ],
    );

    let mut ctx = get_ctx(4, 4);
    let id = ctx.backend.register_image(image);
    ctx.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), &Brush::image(id, 2, 2));
    ctx.flush();

    assert_eq!(ctx.pixel(0, 0), [255, 0, 0, 255]);
    assert_eq!(ctx.pixel(1, 0), [0, 255, 0, 255]);
    assert_eq!(ctx.pixel(0, 1), [0, 0, 255, 255]);
    assert_eq!(ctx.pixel(1, 1), [255, 255, 255, 255]);
    // Outside the image the nearest edge pixel repeats.
    assert_eq!(ctx.pixel(3, 3), [255, 255, 255, 255]);
}

#[test]
fn bottom_up_images_are_mirrored() {
    let image = Pixmap::from_rgba8(
        2,
        2,
        &[
            255, 0, 0, 255, 0, 255, 0, 255, //
            0, 0, 255, 255, 255, 255, 255, 255,
        ],
    );

    let mut ctx = get_ctx(2, 2);
    let id = ctx.backend.register_image(image);
    ctx.paths.set_image_y_axis(ImageYAxis::Up);
    ctx.fill_rect(Rect::new(0.0, 0.0, 2.0, 2.0), &Brush::image(id, 2, 2));
    ctx.flush();

    assert_eq!(ctx.pixel(0, 0), [0, 0, 255, 255]);
    assert_eq!(ctx.pixel(1, 0), [255, 255, 255, 255]);
    assert_eq!(ctx.pixel(0, 1), [255, 0, 0, 255]);
    assert_eq!(ctx.pixel(1, 1), [0, 255, 0, 255]);
}
