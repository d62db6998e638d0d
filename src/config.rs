// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Render configuration.
//!
//! Loaded once at startup, from a TOML file with a `[mandel]` table,
//! from command-line flags, or both; it does not change afterwards.
//! Every field has a default, so an empty file is a valid config.
//!
//! ```toml
//! [mandel]
//! real = { from = -2.5, to = 1.0 }
//! imag = { from = -1.0, to = 1.0 }
//! palette = "Hippi"
//! coloring = "palette"
//! width = 600
//! height = 400
//! iterations = 100
//! workers = 8
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::color::{self, ColorMapper, Coloring};
use crate::errors::ConfigError;
use crate::planes::{PlaneMapper, Range, Viewport};
use crate::render::Renderer;

/// Given a string and a separator, returns the two values
/// separated by the separator.
pub fn parse_pair<T: FromStr>(s: &str, separator: char) -> Option<(T, T)> {
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

/// Parses `WIDTHxHEIGHT`.
pub fn parse_size(s: &str) -> Result<(usize, usize), ConfigError> {
    parse_pair(s, 'x').ok_or_else(|| ConfigError::Malformed {
        what: "image size",
        value: s.to_string(),
    })
}

/// Parses `FROM,TO`.
pub fn parse_range(s: &str) -> Result<Range, ConfigError> {
    match parse_pair(s, ',') {
        Some((from, to)) => Ok(Range { from, to }),
        None => Err(ConfigError::Malformed {
            what: "axis range",
            value: s.to_string(),
        }),
    }
}

/// Everything a render is configured with.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Real axis range.
    pub real: Range,
    /// Imaginary axis range.
    pub imag: Range,
    /// Name of a built-in palette.
    pub palette: String,
    /// Which color strategy to use.
    pub coloring: Coloring,
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// Iteration limit per point.
    #[serde(alias = "iteration")]
    pub iterations: usize,
    /// Size of the worker pool.
    pub workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            real: Range::new(-2.5, 1.0),
            imag: Range::new(-1.0, 1.0),
            palette: "Hippi".to_string(),
            coloring: Coloring::Palette,
            width: 600,
            height: 400,
            iterations: 100,
            workers: num_cpus::get(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    mandel: Config,
}

impl Config {
    /// Reads the `[mandel]` table out of a TOML document.  Missing
    /// keys take their defaults; unknown keys are ignored.
    pub fn from_toml(text: &str) -> Result<Config, ConfigError> {
        toml::from_str::<ConfigFile>(text)
            .map(|file| file.mandel)
            .map_err(ConfigError::Parse)
    }

    /// Reads and parses a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|cause| ConfigError::Read {
            path: path.display().to_string(),
            cause,
        })?;
        Config::from_toml(&text)
    }

    /// The viewport described by this configuration.
    pub fn viewport(&self) -> Viewport {
        Viewport {
            real: self.real,
            imag: self.imag,
            width: self.width,
            height: self.height,
        }
    }

    /// Checks everything that can be checked before rendering and
    /// hands back the color mapper the configuration names.
    pub fn validate(&self) -> Result<Box<dyn ColorMapper>, ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyImage(self.width, self.height));
        }
        if self.iterations == 0 {
            return Err(ConfigError::NoIterations);
        }
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        color::mapper(self.coloring, &self.palette)
    }

    /// Validates the configuration and builds the renderer it
    /// describes.
    pub fn renderer(&self) -> Result<Renderer, ConfigError> {
        let colors = self.validate()?;
        let plane = PlaneMapper::new(self.viewport())?;
        Ok(Renderer::new(plane, self.iterations, colors, self.workers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::BLACK;
    use crate::escape::EscapeResult;
    use crate::palette::Palette;

    #[test]
    fn parse_pair_accepts_sizes_and_ranges() {
        assert_eq!(parse_pair::<usize>("600x400", 'x'), Some((600, 400)));
        assert_eq!(parse_pair::<f64>("-2.5,1", ','), Some((-2.5, 1.0)));
        assert_eq!(parse_pair::<usize>("600", 'x'), None);
        assert_eq!(parse_pair::<usize>("600xfoo", 'x'), None);
    }

    #[test]
    fn parse_helpers_report_what_failed() {
        assert_eq!(parse_size("80x60").unwrap(), (80, 60));
        assert_eq!(parse_range("1.0,-1.0").unwrap(), Range::new(1.0, -1.0));
        match parse_range("nope") {
            Err(ConfigError::Malformed { what, value }) => {
                assert_eq!(what, "axis range");
                assert_eq!(value, "nope");
            }
            other => panic!("expected Malformed, got {:?}", other),
        }
    }

    #[test]
    fn empty_document_is_the_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
        assert_eq!(Config::from_toml("[mandel]\n").unwrap(), Config::default());
    }

    #[test]
    fn full_document_is_read() {
        let text = r#"
            [mandel]
            real = { from = -2.0, to = 0.5 }
            imag = { from = 1.25, to = -1.25 }
            palette = "Vivid"
            coloring = "hsl"
            radius = 2.0
            width = 320
            height = 240
            iteration = 500
            workers = 3
        "#;
        let config = Config::from_toml(text).unwrap();
        assert_eq!(config.real, Range::new(-2.0, 0.5));
        assert_eq!(config.imag, Range::new(1.25, -1.25));
        assert_eq!(config.palette, "Vivid");
        assert_eq!(config.coloring, Coloring::Hsl);
        assert_eq!((config.width, config.height), (320, 240));
        assert_eq!(config.iterations, 500);
        assert_eq!(config.workers, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_coloring_is_a_parse_error() {
        let text = "[mandel]\ncoloring = \"sepia\"\n";
        match Config::from_toml(text) {
            Err(ConfigError::Parse(_)) => {}
            other => panic!("expected Parse, got {:?}", other),
        }
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = Config::default();
        config.palette = "Nope".to_string();
        match config.validate().err() {
            Some(ConfigError::UnknownPalette { .. }) => {}
            other => panic!("expected UnknownPalette, got {:?}", other),
        }

        let mut config = Config::default();
        config.width = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.iterations = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_hands_back_the_named_mapper() {
        let inside = EscapeResult {
            magnitude: 0.0,
            iterations: 100,
        };
        let mut config = Config::default();
        config.coloring = Coloring::Hsl;
        let colors = config.validate().unwrap();
        assert_eq!(colors.color(inside, 100), BLACK);

        config.coloring = Coloring::Palette;
        config.palette = "Fiesta".to_string();
        let colors = config.validate().unwrap();
        let last = *Palette::named("Fiesta").unwrap().colors().last().unwrap();
        assert_eq!(colors.color(inside, 100), last);
    }

    #[test]
    fn renderer_carries_the_configuration() {
        let mut config = Config::default();
        config.workers = 5;
        config.iterations = 42;
        let renderer = config.renderer().unwrap();
        assert_eq!(renderer.workers(), 5);
        assert_eq!(renderer.limit(), 42);
        assert_eq!(renderer.plane().viewport(), &config.viewport());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        match Config::load("/nonexistent/mandeltile.toml") {
            Err(ConfigError::Read { path, .. }) => assert!(path.ends_with("mandeltile.toml")),
            other => panic!("expected Read, got {:?}", other.map(|_| ())),
        }
    }
}
