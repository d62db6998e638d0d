// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turning escape data into pixels.
//!
//! Two strategies live behind the `ColorMapper` trait.  `HslSweep`
//! sweeps the hue by iteration count times magnitude and paints the
//! set itself black.  `PaletteBlend` takes the smoothed iteration
//! count and walks it along a palette, easing between neighbouring
//! colors with a cosine curve.  One strategy is chosen per render;
//! they are never mixed.

use image::Rgba;
use num::clamp;
use serde::Deserialize;
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::errors::ConfigError;
use crate::escape::EscapeResult;
use crate::palette::Palette;

/// Opaque black, the color of the set under `HslSweep`.
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Maps the result of the escape-time iteration to a color.  Shared
/// by every worker, so implementations must be immutable.
pub trait ColorMapper: Send + Sync {
    /// The color for one point, given the iteration limit the point
    /// was evaluated with.
    fn color(&self, escape: EscapeResult, limit: usize) -> Rgba<u8>;
}

/// The two coloring strategies a configuration may select.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coloring {
    /// Hue sweep in HSL space.
    Hsl,
    /// Cosine interpolation along a named palette.
    Palette,
}

impl FromStr for Coloring {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hsl" => Ok(Coloring::Hsl),
            "palette" => Ok(Coloring::Palette),
            _ => Err(ConfigError::UnknownColoring(s.to_string())),
        }
    }
}

impl fmt::Display for Coloring {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Coloring::Hsl => write!(f, "hsl"),
            Coloring::Palette => write!(f, "palette"),
        }
    }
}

/// One channel of the HSL to RGB conversion.  `t` is wrapped into
/// [0, 1) first, so any hue is accepted.
pub fn hue_to_rgb(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Converts hue, saturation and lightness, each nominally in [0, 1],
/// to an opaque color.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Rgba<u8> {
    let (r, g, b) = if s == 0.0 {
        (l, l, l)
    } else {
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        (
            hue_to_rgb(p, q, h + 1.0 / 3.0),
            hue_to_rgb(p, q, h),
            hue_to_rgb(p, q, h - 1.0 / 3.0),
        )
    };
    Rgba([channel(r), channel(g), channel(b), 255])
}

#[inline]
fn channel(v: f64) -> u8 {
    (clamp(v, 0.0, 1.0) * 255.0) as u8
}

/// Hue sweep: hue = iterations / 100 × magnitude, full saturation,
/// half lightness.  Points that never escape are black.
#[derive(Copy, Clone, Debug, Default)]
pub struct HslSweep;

impl ColorMapper for HslSweep {
    fn color(&self, escape: EscapeResult, limit: usize) -> Rgba<u8> {
        if !escape.escaped(limit) {
            return BLACK;
        }
        hsl_to_rgb(escape.iterations as f64 / 100.0 * escape.magnitude, 1.0, 0.5)
    }
}

/// Blends two colors with cosine easing.  `mu` runs from 0 (all of
/// `a`) to 1 (all of `b`).  Alpha comes from `a`.
pub fn cosine_blend(a: Rgba<u8>, b: Rgba<u8>, mu: f64) -> Rgba<u8> {
    let mu2 = (1.0 - (mu * PI).cos()) / 2.0;
    let mix = |x: u8, y: u8| (f64::from(x) * (1.0 - mu2) + f64::from(y) * mu2).round() as u8;
    Rgba([
        mix(a.0[0], b.0[0]),
        mix(a.0[1], b.0[1]),
        mix(a.0[2], b.0[2]),
        a.0[3],
    ])
}

/// Smoothed escape value walked along a palette.  The value is
/// `iterations - ln(magnitude)`; anything past the iteration limit,
/// including the infinity a zero magnitude produces, is the last
/// palette color.
#[derive(Clone, Debug)]
pub struct PaletteBlend {
    palette: Palette,
}

impl PaletteBlend {
    /// Wraps a palette.
    pub fn new(palette: Palette) -> Self {
        PaletteBlend { palette }
    }

    /// The palette being walked.
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// The color for a smoothed escape value.
    pub fn color_at(&self, value: f64, limit: usize) -> Rgba<u8> {
        let colors = self.palette.colors();
        let last = colors.len() - 1;
        let limit = limit as f64;
        if value.is_nan() || value > limit {
            return colors[last];
        }
        let position = (last as f64) * value.max(0.0) / limit;
        // position == last lands in the top bin with a fraction of 1.
        let index = (position.floor() as usize).min(last - 1);
        let frac = clamp(position - index as f64, 0.0, 1.0);
        cosine_blend(colors[index], colors[index + 1], frac)
    }
}

impl ColorMapper for PaletteBlend {
    fn color(&self, escape: EscapeResult, limit: usize) -> Rgba<u8> {
        let value = escape.iterations as f64 - escape.magnitude.ln();
        self.color_at(value, limit)
    }
}

/// Builds the color mapper a configuration asks for.  The palette
/// name is only looked up for the palette strategy, but an unknown
/// name is rejected either way.
pub fn mapper(coloring: Coloring, palette: &str) -> Result<Box<dyn ColorMapper>, ConfigError> {
    let palette = Palette::named(palette)?;
    Ok(match coloring {
        Coloring::Hsl => Box::new(HslSweep),
        Coloring::Palette => Box::new(PaletteBlend::new(palette)),
    })
}
