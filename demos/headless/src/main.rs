// Copyright 2025 the UICore Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use uicore_render::kurbo::{Affine, BezPath, Cap, Circle, Join, Rect, RoundedRect, Shape, Stroke};
use uicore_render::peniko::{Color, ColorStop, Fill};
use uicore_render::{
    BatchConfig, Brush, Canvas, CpuBackend, Pixmap, RenderBatchBuffer, RenderBatchPath,
};

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    if args.width == 0 || args.height == 0 {
        bail!("Cannot render an empty image ({}x{})", args.width, args.height);
    }

    let config = BatchConfig {
        mask_texture_size: args.mask_size,
        ..Default::default()
    };
    let mut pool = RenderBatchBuffer::new(&config).context("Invalid batch configuration")?;
    let mut paths = RenderBatchPath::new(&config)?;
    let mut backend = CpuBackend::new(args.width, args.height);
    backend.target_mut().fill([255, 255, 255, 255]);

    let scale = f64::from(args.width.min(args.height)) / 256.0;
    let canvas = Canvas::new(args.width, args.height).with_transform(Affine::scale(scale));
    let mut scene = SceneBuilder {
        pool: &mut pool,
        paths: &mut paths,
        backend: &mut backend,
        canvas,
    };
    draw_scene(&mut scene, args.fill_rule.into())?;
    paths.flush(&mut pool, &mut backend)?;
    info!(
        "Rendered {} draw calls with {} vertices",
        backend.draw_calls(),
        backend.vertices_drawn()
    );

    write_png(&backend.take_target(), &args.output)?;
    println!(
        "Wrote result ({}x{}) to {:?}",
        args.width, args.height, args.output
    );
    Ok(())
}

struct SceneBuilder<'a> {
    pool: &'a mut RenderBatchBuffer,
    paths: &'a mut RenderBatchPath,
    backend: &'a mut CpuBackend,
    canvas: Canvas,
}

impl SceneBuilder<'_> {
    fn fill(&mut self, shape: &impl Shape, fill_rule: Fill, brush: &Brush) -> Result<()> {
        self.paths.fill(
            self.pool,
            self.backend,
            &self.canvas,
            shape.path_elements(0.1),
            fill_rule,
            brush,
            Affine::IDENTITY,
        )?;
        Ok(())
    }

    fn stroke(&mut self, shape: &impl Shape, style: &Stroke, brush: &Brush) -> Result<()> {
        self.paths.stroke(
            self.pool,
            self.backend,
            &self.canvas,
            shape.path_elements(0.1),
            style,
            brush,
            Affine::IDENTITY,
        )?;
        Ok(())
    }
}

/// A scene in a 256x256 coordinate space.
fn draw_scene(scene: &mut SceneBuilder<'_>, fill_rule: Fill) -> Result<()> {
    let stops = |a: Color, b: Color| {
        [
            ColorStop {
                offset: 0.0,
                color: a,
            },
            ColorStop {
                offset: 1.0,
                color: b,
            },
        ]
    };

    let background = Brush::linear(
        (0.0, 0.0),
        (256.0, 256.0),
        &stops(Color::rgb8(0x20, 0x3a, 0x5c), Color::rgb8(0x9b, 0xc4, 0xe2)),
    );
    scene.fill(&Rect::new(0.0, 0.0, 256.0, 256.0), Fill::NonZero, &background)?;

    let glow = Brush::radial(
        (80.0, 80.0),
        56.0,
        &stops(Color::rgb8(0xff, 0xe0, 0x80), Color::rgba8(0xff, 0x80, 0x40, 0)),
    );
    scene.fill(&Circle::new((80.0, 80.0), 56.0), Fill::NonZero, &glow)?;

    scene.fill(
        &star((176.0, 88.0), 56.0, 22.0),
        fill_rule,
        &Brush::Solid(Color::rgb8(0xf4, 0xc4, 0x30)),
    )?;

    // A pentagram is self-intersecting, so its center shows the fill rule.
    scene.fill(
        &pentagram((176.0, 184.0), 56.0),
        fill_rule,
        &Brush::Solid(Color::rgba8(0xd0, 0x30, 0x40, 0xe0)),
    )?;

    let card = RoundedRect::new(24.0, 152.0, 120.0, 232.0, 12.0);
    scene.fill(&card, Fill::NonZero, &Brush::Solid(Color::rgba8(255, 255, 255, 0xc0)))?;
    scene.stroke(
        &card,
        &Stroke::new(3.0).with_join(Join::Round),
        &Brush::Solid(Color::rgb8(0x20, 0x3a, 0x5c)),
    )?;

    let mut wave = BezPath::new();
    wave.move_to((32.0, 200.0));
    wave.curve_to((56.0, 168.0), (88.0, 232.0), (112.0, 192.0));
    scene.stroke(
        &wave,
        &Stroke::new(5.0).with_caps(Cap::Round),
        &Brush::Solid(Color::rgb8(0xd0, 0x30, 0x40)),
    )?;
    Ok(())
}

fn star(center: (f64, f64), outer: f64, inner: f64) -> BezPath {
    let mut path = BezPath::new();
    for i in 0..10 {
        let radius = if i % 2 == 0 { outer } else { inner };
        let angle = std::f64::consts::PI * f64::from(i) / 5.0 - std::f64::consts::FRAC_PI_2;
        let point = (
            center.0 + radius * angle.cos(),
            center.1 + radius * angle.sin(),
        );
        if i == 0 {
            path.move_to(point);
        } else {
            path.line_to(point);
        }
    }
    path.close_path();
    path
}

fn pentagram(center: (f64, f64), radius: f64) -> BezPath {
    let mut path = BezPath::new();
    for i in 0..5 {
        let angle = 4.0 * std::f64::consts::PI * f64::from(i) / 5.0 - std::f64::consts::FRAC_PI_2;
        let point = (
            center.0 + radius * angle.cos(),
            center.1 + radius * angle.sin(),
        );
        if i == 0 {
            path.move_to(point);
        } else {
            path.line_to(point);
        }
    }
    path.close_path();
    path
}

fn write_png(pixmap: &Pixmap, path: &Path) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("Creating {path:?}"))?;
    let mut png_encoder = png::Encoder::new(&mut file, pixmap.width(), pixmap.height());
    png_encoder.set_color(png::ColorType::Rgba);
    png_encoder.set_depth(png::BitDepth::Eight);
    let mut writer = png_encoder.write_header()?;
    writer.write_image_data(&pixmap.to_unpremultiplied())?;
    writer.finish()?;
    Ok(())
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FillRule {
    NonZero,
    EvenOdd,
}

impl From<FillRule> for Fill {
    fn from(rule: FillRule) -> Self {
        match rule {
            FillRule::NonZero => Self::NonZero,
            FillRule::EvenOdd => Self::EvenOdd,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about, long_about = None, bin_name = "cargo run -p headless --")]
struct Args {
    /// The width of the image in pixels
    #[arg(long, default_value_t = 512)]
    width: u32,
    /// The height of the image in pixels
    #[arg(long, default_value_t = 512)]
    height: u32,
    /// The fill rule of the star shapes
    #[arg(long, value_enum, default_value_t = FillRule::NonZero)]
    fill_rule: FillRule,
    /// The size of the mask atlas, a multiple of 16. Small atlases flush more often
    #[arg(long, default_value_t = 1024)]
    mask_size: u32,
    /// Where to write the PNG file
    #[arg(long, short, default_value_os_t = default_output())]
    output: PathBuf,
}

fn default_output() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("headless.png")
}
