// Copyright 2025 the UICore Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A simple pixmap type.

/// A pixmap of premultiplied RGBA8 values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixmap {
    width: u32,
    height: u32,
    buf: Vec<[u8; 4]>,
}

impl Pixmap {
    /// Create a new pixmap with the given width and height in pixels.
    ///
    /// All pixels are initialized to transparent black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            buf: vec![[0; 4]; width as usize * height as usize],
        }
    }

    /// Create a pixmap from straight alpha RGBA8 pixels in row-major order.
    ///
    /// # Panics
    ///
    /// Panics if `data` does not hold exactly `width * height` pixels.
    pub fn from_rgba8(width: u32, height: u32, data: &[u8]) -> Self {
        assert_eq!(
            data.len(),
            width as usize * height as usize * 4,
            "Expected `data` to have length of exactly `width * height * 4`"
        );

        let buf = data
            .chunks_exact(4)
            .map(|p| {
                let premultiply = |c: u8| ((u16::from(c) * u16::from(p[3]) + 127) / 255) as u8;
                [premultiply(p[0]), premultiply(p[1]), premultiply(p[2]), p[3]]
            })
            .collect();
        Self { width, height, buf }
    }

    /// Return the width of the pixmap.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Return the height of the pixmap.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Set every pixel to a premultiplied color.
    pub fn fill(&mut self, color: [u8; 4]) {
        self.buf.fill(color);
    }

    /// Returns a reference to the underlying data as premultiplied RGBA8.
    pub fn data(&self) -> &[[u8; 4]] {
        &self.buf
    }

    /// Returns a mutable reference to the underlying data as premultiplied RGBA8.
    pub fn data_mut(&mut self) -> &mut [[u8; 4]] {
        &mut self.buf
    }

    /// The underlying data as bytes in the order `[r, g, b, a]`.
    pub fn data_as_u8_slice(&self) -> &[u8] {
        bytemuck::cast_slice(&self.buf)
    }

    /// Sample a pixel from the pixmap.
    #[inline(always)]
    pub fn sample(&self, x: u32, y: u32) -> [u8; 4] {
        self.buf[self.width as usize * y as usize + x as usize]
    }

    /// Convert the pixmap to straight alpha RGBA8 bytes, for example for encoding as PNG.
    pub fn to_unpremultiplied(&self) -> Vec<u8> {
        self.buf
            .iter()
            .flat_map(|&[r, g, b, a]| {
                let unpremultiply = |c: u8| {
                    if a == 0 {
                        0
                    } else {
                        ((u16::from(c) * 255 + u16::from(a) / 2) / u16::from(a)).min(255) as u8
                    }
                };
                [unpremultiply(r), unpremultiply(g), unpremultiply(b), a]
            })
            .collect()
    }
}
