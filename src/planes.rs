// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0,
//! and a rectangle on the complex plane given by a real range and an
//! imaginary range.
use num::Complex;
use serde::Deserialize;

use crate::errors::ConfigError;

/// One axis of the complex plane.  The `from` endpoint is the one
/// that pixel 0 maps to; `to` may lie on either side of it.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
pub struct Range {
    /// Value at pixel 0.
    pub from: f64,
    /// Value at the far edge of the image.
    pub to: f64,
}

impl Range {
    /// Builds a range.
    pub fn new(from: f64, to: f64) -> Self {
        Range { from, to }
    }

    /// The width of the range, regardless of the order of its ends.
    pub fn span(&self) -> f64 {
        (self.to - self.from).abs()
    }
}

/// The region of the complex plane being rendered, and the size of the
/// image it is rendered onto.  Fixed for the whole render.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Real axis range, mapped onto x.
    pub real: Range,
    /// Imaginary axis range, mapped onto y.
    pub imag: Range,
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
}

/// The x, y of a pixel in the integral plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Coord(pub usize, pub usize);

/// Maps a pixel coordinate to the complex plane.  Pixel 0 lands on
/// the `from` end of each range and the full image width covers the
/// absolute span of the range.  Coordinates past the image edge are
/// mapped along the same line.
pub fn map_point(x: usize, y: usize, viewport: &Viewport) -> (f64, f64) {
    let re = viewport.real.span() * (x as f64) / (viewport.width as f64) + viewport.real.from;
    let im = viewport.imag.span() * (y as f64) / (viewport.height as f64) + viewport.imag.from;
    (re, im)
}

/// A viewport that has been checked to have a non-empty image.  Maps
/// pixels on the integral plane to points on the complex plane.
#[derive(Debug, Clone)]
pub struct PlaneMapper {
    viewport: Viewport,
}

impl PlaneMapper {
    /// Constructor.  Rejects images with a zero dimension; the ranges
    /// may be given in either order.
    pub fn new(viewport: Viewport) -> Result<PlaneMapper, ConfigError> {
        if viewport.width == 0 || viewport.height == 0 {
            return Err(ConfigError::EmptyImage(viewport.width, viewport.height));
        }
        Ok(PlaneMapper { viewport })
    }

    /// The viewport this mapper was built from.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.viewport.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.viewport.height
    }

    /// The total number of points in the integral grid.  Used to
    /// size the pixel queue.
    pub fn len(&self) -> usize {
        self.viewport.width * self.viewport.height
    }

    /// True if the integral plane has no pixels.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Given a pixel on the integral cartesian plane, return the
    /// complex number it corresponds to.
    pub fn pixel_to_point(&self, pixel: &Coord) -> Complex<f64> {
        let (re, im) = map_point(pixel.0, pixel.1, &self.viewport);
        Complex::new(re, im)
    }
}
