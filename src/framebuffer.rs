// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The shared image.
//!
//! A `FrameBuffer` is read by anyone holding the `Arc` (the display,
//! tests) while a render is in flight.  Writes go through the one
//! `FrameWriter` handed out when the buffer is created; it cannot be
//! cloned, so there is only ever a single writer.  Pixels are stored
//! as packed atomics, and a reader racing the writer sees each pixel
//! either unwritten or finished.

use image::{Rgba, RgbaImage};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

/// What an unwritten pixel reads back as.  Every rendered color is
/// opaque, so this never collides with real output.
pub const UNWRITTEN: Rgba<u8> = Rgba([0, 0, 0, 0]);

#[inline]
fn pack(color: Rgba<u8>) -> u32 {
    u32::from_le_bytes(color.0)
}

#[inline]
fn unpack(raw: u32) -> Rgba<u8> {
    Rgba(raw.to_le_bytes())
}

/// A width × height grid of RGBA pixels.
#[derive(Debug)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    pixels: Vec<AtomicU32>,
    written: AtomicUsize,
}

impl FrameBuffer {
    /// Creates an empty buffer and its only writer.
    pub fn new(width: usize, height: usize) -> (Arc<FrameBuffer>, FrameWriter) {
        let pixels = (0..width * height)
            .map(|_| AtomicU32::new(pack(UNWRITTEN)))
            .collect();
        let buffer = Arc::new(FrameBuffer {
            width,
            height,
            pixels,
            written: AtomicUsize::new(0),
        });
        let writer = FrameWriter {
            buffer: buffer.clone(),
        };
        (buffer, writer)
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The color at (x, y), or `None` outside the image.
    pub fn get(&self, x: usize, y: usize) -> Option<Rgba<u8>> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(unpack(self.pixels[y * self.width + x].load(Ordering::Relaxed)))
    }

    /// How many writes the buffer has received so far.
    pub fn written(&self) -> usize {
        self.written.load(Ordering::Acquire)
    }

    /// Fraction of the image written, from 0 to 1.
    pub fn coverage(&self) -> f64 {
        let total = self.width * self.height;
        if total == 0 {
            return 1.0;
        }
        (self.written() as f64 / total as f64).min(1.0)
    }

    /// Number of pixels that still read as `UNWRITTEN`.
    pub fn unwritten(&self) -> usize {
        let blank = pack(UNWRITTEN);
        self.pixels
            .iter()
            .filter(|p| p.load(Ordering::Relaxed) == blank)
            .count()
    }

    /// Copies the current contents into an image.  During a render
    /// the copy may be partly drawn.
    pub fn snapshot(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            unpack(self.pixels[y as usize * self.width + x as usize].load(Ordering::Relaxed))
        })
    }
}

/// The single write handle to a `FrameBuffer`.
#[derive(Debug)]
pub struct FrameWriter {
    buffer: Arc<FrameBuffer>,
}

impl FrameWriter {
    /// Width and height of the buffer being written.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.buffer.width, self.buffer.height)
    }

    /// Stores one pixel.  Returns false, and writes nothing, if (x, y)
    /// lies outside the image.
    pub fn set(&mut self, x: usize, y: usize, color: Rgba<u8>) -> bool {
        if x >= self.buffer.width || y >= self.buffer.height {
            return false;
        }
        self.buffer.pixels[y * self.buffer.width + x].store(pack(color), Ordering::Relaxed);
        self.buffer.written.fetch_add(1, Ordering::Release);
        true
    }
}
