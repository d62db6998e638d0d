// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time iteration at the heart of the Mandelbrot set.

use num::Complex;

/// Squared magnitude beyond which an orbit is guaranteed to diverge
/// (|z| > 2).
pub const BAILOUT: f64 = 4.0;

/// What the iteration learned about one point.  `magnitude` is the
/// squared magnitude of the last orbit value computed, `iterations`
/// the zero-based step at which the orbit escaped, or the iteration
/// limit when it never did.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EscapeResult {
    /// Squared magnitude of z when the loop stopped.
    pub magnitude: f64,
    /// Escape step, or the limit for bounded points.
    pub iterations: usize,
}

impl EscapeResult {
    /// True if the orbit left the bailout circle within `limit` steps.
    #[inline]
    pub fn escaped(&self, limit: usize) -> bool {
        self.iterations < limit
    }
}

/// This is our classic iterator function: z ← z² + c from z = 0.  An
/// escaping point reports the step that took it past the bailout and
/// the squared magnitude it reached there; a bounded point reports the
/// limit and the squared magnitude of its final orbit value.
#[inline]
pub fn iterate(c: Complex<f64>, limit: usize) -> EscapeResult {
    let mut z: Complex<f64> = Complex { re: 0.0, im: 0.0 };
    for i in 0..limit {
        z = z * z + c;
        let magnitude = z.norm_sqr();
        if magnitude >= BAILOUT {
            return EscapeResult {
                magnitude,
                iterations: i,
            };
        }
    }
    EscapeResult {
        magnitude: z.norm_sqr(),
        iterations: limit,
    }
}
