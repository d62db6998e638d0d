// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error types.  Configuration problems are fatal at startup and are
//! reported before any rendering begins; render errors only happen
//! when one of the render threads dies.

use failure::Fail;
use std::io;

/// Result type used by the binary, where every error is reported once
/// and ends the process.
pub type Result<T> = std::result::Result<T, failure::Error>;

/// Everything that can be wrong with a configuration, whether it came
/// from a file or from the command line.
#[derive(Debug, Fail)]
pub enum ConfigError {
    /// The palette name is not in the named palette table.
    #[fail(display = "palette {} not found (available: {})", name, available)]
    UnknownPalette {
        /// The name that was asked for.
        name: String,
        /// Comma separated list of the names that exist.
        available: String,
    },

    /// A palette must have at least two colors to interpolate between.
    #[fail(display = "palette {} needs at least two colors, got {}", _0, _1)]
    PaletteTooShort(String, usize),

    /// The coloring strategy is neither `hsl` nor `palette`.
    #[fail(display = "unknown coloring strategy {:?} (expected hsl or palette)", _0)]
    UnknownColoring(String),

    /// Width or height is zero.
    #[fail(display = "image dimensions must be non-zero, got {}x{}", _0, _1)]
    EmptyImage(usize, usize),

    /// An iteration budget of zero would leave every point undecided.
    #[fail(display = "iteration count must be at least 1")]
    NoIterations,

    /// A pool with no workers would never drain the tile queue.
    #[fail(display = "worker count must be at least 1")]
    NoWorkers,

    /// The configuration file could not be read.
    #[fail(display = "error reading config {}: {}", path, cause)]
    Read {
        /// Path of the configuration file.
        path: String,
        /// Underlying I/O failure.
        #[cause]
        cause: io::Error,
    },

    /// The configuration file is not valid TOML, or has the wrong shape.
    #[fail(display = "error parsing config: {}", _0)]
    Parse(#[cause] toml::de::Error),

    /// A command-line value could not be parsed.
    #[fail(display = "could not parse {} from {:?}", what, value)]
    Malformed {
        /// What the value was supposed to be.
        what: &'static str,
        /// The offending text.
        value: String,
    },
}

/// Failures of a running render.  Computation itself is total; these
/// only arise from misuse or from a thread that panicked.
#[derive(Debug, Fail)]
pub enum RenderError {
    /// The frame buffer handed to the renderer has the wrong shape.
    #[fail(
        display = "frame buffer is {}x{} but the viewport is {}x{}",
        found_width, found_height, width, height
    )]
    BufferMismatch {
        /// Viewport width.
        width: usize,
        /// Viewport height.
        height: usize,
        /// Frame buffer width.
        found_width: usize,
        /// Frame buffer height.
        found_height: usize,
    },

    /// One or more workers panicked.
    #[fail(display = "{} render worker(s) panicked", _0)]
    WorkerPanicked(usize),

    /// The frame buffer writer panicked.
    #[fail(display = "frame buffer writer panicked")]
    WriterPanicked,
}
