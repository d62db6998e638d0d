#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tiled Mandelbrot renderer
//!
//! The Mandelbrot set is the set of points c on the complex plane for
//! which repeatedly squaring z and adding c, starting from zero, never
//! runs off to infinity.  Once |z| passes 2 it never comes back, so
//! each pixel is iterated until it does or until an iteration budget
//! runs out.  How quickly a point escapes is what the image shows:
//! either as a hue swept through HSL space, or as a position along a
//! named palette, smoothed with the logarithm of the final magnitude
//! so that the bands between iteration counts disappear.
//!
//! The image is split into a grid of equal tiles.  A fixed pool of
//! threads pulls tiles from a bounded queue and pushes finished pixels
//! onto a second queue, which a single writer drains into a shared
//! frame buffer.  Any display can read that buffer while the render
//! is still going.

pub mod color;
pub mod config;
pub mod display;
pub mod errors;
pub mod escape;
pub mod framebuffer;
pub mod palette;
pub mod planes;
pub mod render;
pub mod tiles;

pub use color::{ColorMapper, Coloring, HslSweep, PaletteBlend};
pub use config::Config;
pub use errors::{ConfigError, RenderError};
pub use escape::{iterate, EscapeResult};
pub use framebuffer::{FrameBuffer, FrameWriter};
pub use palette::Palette;
pub use planes::{map_point, PlaneMapper, Range, Viewport};
pub use render::{CancelToken, Pixel, RenderReport, Renderer};
pub use tiles::{compute_tile_grid, Tile, TileGrid};
