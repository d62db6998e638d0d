// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Named color palettes.  Palettes are immutable once loaded and are
//! shared read-only between every worker.

use image::Rgba;

use crate::errors::ConfigError;

type Table = &'static [(&'static str, &'static [[u8; 4]])];

const PALETTES: Table = &[
    (
        "AfternoonBlue",
        &[
            [0x93, 0xd2, 0xca, 0xff],
            [0x6c, 0x98, 0xb8, 0xff],
            [0x38, 0x68, 0x85, 0xff],
            [0x17, 0x4f, 0x72, 0xff],
            [0x08, 0x2a, 0x4f, 0xff],
        ],
    ),
    (
        "SummerBeach",
        &[
            [0xff, 0xf0, 0x94, 0xff],
            [0xff, 0xb7, 0x2d, 0xff],
            [0xff, 0x8d, 0x00, 0xff],
            [0x2d, 0x69, 0xae, 0xff],
            [0x1e, 0x2c, 0x60, 0xff],
        ],
    ),
    (
        "Biochimist",
        &[
            [0x51, 0x99, 0x25, 0xff],
            [0x50, 0xa6, 0x1c, 0xff],
            [0x4b, 0xb8, 0x0b, 0xff],
            [0x4d, 0xcd, 0x00, 0xff],
            [0x53, 0xdf, 0x00, 0xff],
        ],
    ),
    (
        "Fiesta",
        &[
            [0x03, 0x67, 0xa6, 0xff],
            [0x04, 0xad, 0xbf, 0xff],
            [0x93, 0xa6, 0x03, 0xff],
            [0xe5, 0xce, 0x1b, 0xff],
            [0xc8, 0x3f, 0x2a, 0xff],
        ],
    ),
    (
        "Hippi",
        &[
            [0x00, 0x04, 0x0f, 0xff],
            [0x03, 0x26, 0x28, 0xff],
            [0x07, 0x3e, 0x1e, 0xff],
            [0x18, 0x55, 0x08, 0xff],
            [0x5f, 0x6e, 0x0f, 0xff],
            [0x84, 0x50, 0x19, 0xff],
            [0x9b, 0x30, 0x22, 0xff],
            [0xb4, 0x92, 0x2f, 0xff],
            [0x94, 0xca, 0x3d, 0xff],
            [0x4f, 0xd5, 0x51, 0xff],
            [0x66, 0xff, 0xb3, 0xff],
            [0x82, 0xc9, 0xe5, 0xff],
            [0x9d, 0xa3, 0xeb, 0xff],
            [0xd7, 0xb5, 0xf3, 0xff],
            [0xfd, 0xd6, 0xf6, 0xff],
            [0xff, 0xf0, 0xf2, 0xff],
        ],
    ),
    (
        "Vivid",
        &[
            [0x02, 0x3b, 0x2b, 0xff],
            [0x36, 0x34, 0x48, 0xff],
            [0x04, 0x8b, 0x64, 0xff],
            [0x81, 0x6a, 0x6e, 0xff],
            [0x8d, 0x5e, 0x67, 0xff],
            [0x98, 0x52, 0x60, 0xff],
            [0xa4, 0x46, 0x59, 0xff],
            [0xd3, 0x17, 0x3d, 0xff],
            [0xe1, 0x08, 0x34, 0xff],
            [0xde, 0x17, 0x30, 0xff],
            [0xdc, 0x26, 0x2d, 0xff],
            [0xd9, 0x36, 0x2a, 0xff],
            [0xd7, 0x45, 0x27, 0xff],
            [0xd5, 0x55, 0x24, 0xff],
            [0xd2, 0x64, 0x21, 0xff],
            [0xd0, 0x74, 0x1e, 0xff],
            [0xce, 0x83, 0x1b, 0xff],
            [0xcb, 0x92, 0x18, 0xff],
            [0xc9, 0xa2, 0x15, 0xff],
            [0x11, 0x03, 0x12, 0xff],
            [0x33, 0x08, 0x35, 0xff],
            [0xf5, 0xca, 0xf7, 0xff],
        ],
    ),
];

/// The names of every built-in palette, in table order.
pub fn names() -> impl Iterator<Item = &'static str> {
    PALETTES.iter().map(|(name, _)| *name)
}

/// A named, ordered list of at least two colors.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    name: String,
    colors: Vec<Rgba<u8>>,
}

impl Palette {
    /// Builds a palette from a list of colors.  Fails if there are
    /// fewer than two, since there would be nothing to blend.
    pub fn new(name: &str, colors: Vec<Rgba<u8>>) -> Result<Self, ConfigError> {
        if colors.len() < 2 {
            return Err(ConfigError::PaletteTooShort(name.to_string(), colors.len()));
        }
        Ok(Palette {
            name: name.to_string(),
            colors,
        })
    }

    /// Looks a palette up in the built-in table.  Names are matched
    /// exactly.
    pub fn named(name: &str) -> Result<Self, ConfigError> {
        match PALETTES.iter().find(|(n, _)| *n == name) {
            Some((n, colors)) => Palette::new(n, colors.iter().map(|c| Rgba(*c)).collect()),
            None => Err(ConfigError::UnknownPalette {
                name: name.to_string(),
                available: names().collect::<Vec<_>>().join(", "),
            }),
        }
    }

    /// The palette's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The colors, first to last.
    pub fn colors(&self) -> &[Rgba<u8>] {
        &self.colors
    }

    /// Number of colors; always at least two.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// True if the palette has no colors.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}
