// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The render orchestrator.
//!
//! A render is one batch job.  The image is cut into tiles, which are
//! fed through a bounded queue to a fixed pool of workers.  Each
//! worker maps every pixel of its tile onto the complex plane, runs
//! the escape-time iteration, colors the result, and pushes the pixel
//! onto a second queue.  A single writer drains that queue into the
//! frame buffer.  The pool is joined before the pixel queue closes,
//! and the writer is joined before the render reports back.

use crossbeam::channel::{bounded, Receiver, Sender};
use image::Rgba;
use log::{info, trace};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::color::ColorMapper;
use crate::errors::RenderError;
use crate::escape::iterate;
use crate::framebuffer::FrameWriter;
use crate::planes::{Coord, PlaneMapper};
use crate::tiles::{compute_tile_grid, Tile};

/// A finished pixel on its way to the frame buffer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel {
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
    /// Final color.
    pub color: Rgba<u8>,
}

/// Stops a render early.  Cloned handles share one flag; once set,
/// no further tiles are queued and workers drop the tiles they have
/// not started.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that has not been cancelled.
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    /// Asks every holder to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True once `cancel` has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Diagnostics for a completed render.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderReport {
    /// Size of the worker pool.
    pub workers: usize,
    /// The tile grid divisor.
    pub divisor: usize,
    /// Tile width in pixels.
    pub tile_width: usize,
    /// Tile height in pixels.
    pub tile_height: usize,
    /// Tiles handed to the pool.
    pub tiles: usize,
    /// Pixels the writer stored.
    pub pixels: usize,
    /// Wall-clock time from the first tile to the last write.
    pub elapsed: Duration,
    /// True if the render was stopped before it finished.
    pub cancelled: bool,
}

impl fmt::Display for RenderReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "workers: {} divisor: {} took: {:?}",
            self.workers, self.divisor, self.elapsed
        )?;
        if self.cancelled {
            write!(f, " (cancelled after {} pixels)", self.pixels)?;
        }
        Ok(())
    }
}

/// Everything one render needs: where to look, how hard, how to
/// color it, and with how many threads.  Immutable once built, and
/// shared by reference with every worker.
pub struct Renderer {
    plane: PlaneMapper,
    limit: usize,
    colors: Box<dyn ColorMapper>,
    workers: usize,
}

impl Renderer {
    /// Builds a renderer.  A worker count of zero is treated as one.
    pub fn new(
        plane: PlaneMapper,
        limit: usize,
        colors: Box<dyn ColorMapper>,
        workers: usize,
    ) -> Self {
        Renderer {
            plane,
            limit,
            colors,
            workers: workers.max(1),
        }
    }

    /// The plane being rendered.
    pub fn plane(&self) -> &PlaneMapper {
        &self.plane
    }

    /// Size of the worker pool.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// The iteration limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Computes the color of one pixel.  Pure: the same coordinate
    /// always gives the same color.
    pub fn pixel(&self, x: usize, y: usize) -> Pixel {
        let c = self.plane.pixel_to_point(&Coord(x, y));
        let color = self.colors.color(iterate(c, self.limit), self.limit);
        Pixel { x, y, color }
    }

    /// Worker loop: pull tiles until the queue closes, emit every
    /// pixel of each.  Cancellation is noticed at the start of every
    /// tile row.  Returns the number of tiles finished.
    fn work(
        &self,
        id: usize,
        tiles: Receiver<Tile>,
        pixels: Sender<Pixel>,
        cancel: &CancelToken,
    ) -> usize {
        trace!("worker {} started", id);
        let mut done = 0;
        for tile in tiles.iter() {
            if cancel.is_cancelled() {
                break;
            }
            for (x, y) in tile.pixels() {
                if x == tile.from_x && cancel.is_cancelled() {
                    trace!("worker {}: cancelled inside a tile", id);
                    return done;
                }
                if pixels.send(self.pixel(x, y)).is_err() {
                    trace!("worker {}: pixel queue closed", id);
                    return done;
                }
            }
            done += 1;
        }
        trace!("worker {} finished {} tiles", id, done);
        done
    }

    /// Renders the whole viewport into the writer's frame buffer and
    /// blocks until every pixel has been stored, or until `cancel` is
    /// set and the threads have wound down.
    pub fn render(
        &self,
        writer: FrameWriter,
        cancel: &CancelToken,
    ) -> Result<RenderReport, RenderError> {
        let (width, height) = (self.plane.width(), self.plane.height());
        let (found_width, found_height) = writer.dimensions();
        if (found_width, found_height) != (width, height) {
            return Err(RenderError::BufferMismatch {
                width,
                height,
                found_width,
                found_height,
            });
        }

        let grid = compute_tile_grid(width, height);
        let start = Instant::now();
        let (tile_tx, tile_rx) = bounded::<Tile>(self.workers);
        let (pixel_tx, pixel_rx) = bounded::<Pixel>(self.plane.len());

        let outcome = crossbeam::scope(|spawner| {
            let writer = spawner.spawn(move |_| drain(pixel_rx, writer));
            let handles: Vec<_> = (0..self.workers)
                .map(|id| {
                    let tiles = tile_rx.clone();
                    let pixels = pixel_tx.clone();
                    spawner.spawn(move |_| self.work(id, tiles, pixels, cancel))
                })
                .collect();
            // From here on the workers own the only tile receivers and
            // pixel senders, so each queue closes when they exit.
            drop(tile_rx);
            drop(pixel_tx);

            let mut queued = 0;
            for tile in grid.tiles(width, height) {
                if cancel.is_cancelled() || tile_tx.send(tile).is_err() {
                    break;
                }
                queued += 1;
            }
            drop(tile_tx);

            let panicked = handles
                .into_iter()
                .map(|handle| handle.join())
                .filter(|result| result.is_err())
                .count();
            let written = writer.join();
            (queued, panicked, written)
        });

        let (queued, panicked, written) = match outcome {
            Ok(outcome) => outcome,
            Err(_) => return Err(RenderError::WorkerPanicked(self.workers)),
        };
        if panicked > 0 {
            return Err(RenderError::WorkerPanicked(panicked));
        }
        let pixels = written.map_err(|_| RenderError::WriterPanicked)?;

        let report = RenderReport {
            workers: self.workers,
            divisor: grid.divisor,
            tile_width: grid.tile_width,
            tile_height: grid.tile_height,
            tiles: queued,
            pixels,
            elapsed: start.elapsed(),
            cancelled: cancel.is_cancelled(),
        };
        info!("{}", report);
        Ok(report)
    }
}

/// The frame buffer writer: store every pixel that arrives until the
/// queue closes.
fn drain(pixels: Receiver<Pixel>, mut writer: FrameWriter) -> usize {
    let mut written = 0;
    for pixel in pixels.iter() {
        if writer.set(pixel.x, pixel.y, pixel.color) {
            written += 1;
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{HslSweep, PaletteBlend};
    use crate::framebuffer::FrameBuffer;
    use crate::palette::Palette;
    use crate::planes::{Range, Viewport};

    fn renderer(width: usize, height: usize, workers: usize) -> Renderer {
        let plane = PlaneMapper::new(Viewport {
            real: Range::new(-2.5, 1.0),
            imag: Range::new(-1.0, 1.0),
            width,
            height,
        })
        .unwrap();
        let palette = Palette::named("Fiesta").unwrap();
        Renderer::new(plane, 50, Box::new(PaletteBlend::new(palette)), workers)
    }

    #[test]
    fn every_pixel_is_written_once() {
        let r = renderer(60, 40, 4);
        let (buffer, writer) = FrameBuffer::new(60, 40);
        let report = r.render(writer, &CancelToken::new()).unwrap();
        assert_eq!(report.pixels, 2400);
        assert_eq!(buffer.written(), 2400);
        assert_eq!(buffer.unwritten(), 0);
        assert!(!report.cancelled);
        assert_eq!(report.tiles, report.divisor * report.divisor);
    }

    #[test]
    fn buffer_matches_single_pixel_evaluation() {
        let r = renderer(30, 20, 3);
        let (buffer, writer) = FrameBuffer::new(30, 20);
        r.render(writer, &CancelToken::new()).unwrap();
        for y in 0..20 {
            for x in 0..30 {
                assert_eq!(buffer.get(x, y), Some(r.pixel(x, y).color));
            }
        }
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        let r = renderer(30, 20, 2);
        let (_buffer, writer) = FrameBuffer::new(20, 30);
        match r.render(writer, &CancelToken::new()) {
            Err(RenderError::BufferMismatch {
                width,
                height,
                found_width,
                found_height,
            }) => assert_eq!((width, height, found_width, found_height), (30, 20, 20, 30)),
            other => panic!("expected BufferMismatch, got {:?}", other),
        }
    }

    #[test]
    fn cancelled_before_start_writes_nothing() {
        let r = renderer(60, 40, 2);
        let (buffer, writer) = FrameBuffer::new(60, 40);
        let cancel = CancelToken::new();
        cancel.cancel();
        let report = r.render(writer, &cancel).unwrap();
        assert!(report.cancelled);
        assert_eq!(report.tiles, 0);
        assert_eq!(report.pixels, 0);
        assert_eq!(buffer.written(), 0);
    }

    #[test]
    fn cancel_stops_a_single_tile_render() {
        // 401x399 shares no divisor, so the whole image is one tile.
        let plane = PlaneMapper::new(Viewport {
            real: Range::new(-2.0, 1.0),
            imag: Range::new(-1.0, 1.0),
            width: 401,
            height: 399,
        })
        .unwrap();
        let r = Renderer::new(plane, 20_000, Box::new(HslSweep), 4);
        let (buffer, writer) = FrameBuffer::new(401, 399);
        let cancel = CancelToken::new();
        let stopper = {
            let cancel = cancel.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                cancel.cancel();
            })
        };
        let report = r.render(writer, &cancel).unwrap();
        stopper.join().unwrap();
        assert_eq!(report.divisor, 1);
        assert!(report.cancelled);
        assert!(report.pixels < 401 * 399);
        assert!(buffer.unwritten() > 0);
    }

    #[test]
    fn zero_workers_means_one() {
        let plane = PlaneMapper::new(Viewport {
            real: Range::new(-2.0, 2.0),
            imag: Range::new(-2.0, 2.0),
            width: 9,
            height: 9,
        })
        .unwrap();
        let r = Renderer::new(plane, 10, Box::new(HslSweep), 0);
        assert_eq!(r.workers(), 1);
        let (buffer, writer) = FrameBuffer::new(9, 9);
        r.render(writer, &CancelToken::new()).unwrap();
        assert_eq!(buffer.unwritten(), 0);
    }

    #[test]
    fn report_line_names_workers_and_divisor() {
        let report = RenderReport {
            workers: 8,
            divisor: 25,
            tile_width: 24,
            tile_height: 16,
            tiles: 625,
            pixels: 240_000,
            elapsed: Duration::from_millis(12),
            cancelled: false,
        };
        assert_eq!(report.to_string(), "workers: 8 divisor: 25 took: 12ms");
    }
}
