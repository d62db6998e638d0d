// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Presenting the frame buffer while a render runs.
//!
//! The renderer knows nothing about displays.  A `DisplaySink` is
//! handed the shared `FrameBuffer` every refresh and may find it half
//! drawn; a `KeySource` reports when the user wants out.  The display
//! loop ties them together and returns when the render finishes or
//! the user quits, whichever comes first.

use crossbeam::channel::{Receiver, RecvTimeoutError};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use crossterm::tty::IsTty;
use log::{debug, info, warn};
use std::io::{self, Write};
use std::time::Duration;

use crate::errors::RenderError;
use crate::framebuffer::FrameBuffer;
use crate::render::RenderReport;

/// Something that shows the frame buffer.
pub trait DisplaySink {
    /// Called on every refresh while the render is running.
    fn present(&mut self, frame: &FrameBuffer) -> io::Result<()>;

    /// Called once with the finished frame.
    fn finish(&mut self, frame: &FrameBuffer, _report: &RenderReport) -> io::Result<()> {
        self.present(frame)
    }
}

/// Something that can ask the display loop to stop.
pub trait KeySource {
    /// True once the user has asked to quit.  Must not block.
    fn quit_requested(&mut self) -> bool;
}

/// Does not draw anything; logs how much of the frame is done.
#[derive(Debug, Default)]
pub struct ProgressSink {
    last: usize,
}

impl ProgressSink {
    /// A sink that has logged nothing yet.
    pub fn new() -> Self {
        ProgressSink { last: 0 }
    }
}

impl DisplaySink for ProgressSink {
    fn present(&mut self, frame: &FrameBuffer) -> io::Result<()> {
        let percent = (frame.coverage() * 100.0) as usize;
        if percent != self.last {
            info!("{}% rendered", percent);
            self.last = percent;
        }
        Ok(())
    }

    fn finish(&mut self, frame: &FrameBuffer, report: &RenderReport) -> io::Result<()> {
        info!(
            "{} of {} pixels rendered in {} tiles of {}x{}",
            frame.written(),
            frame.width() * frame.height(),
            report.tiles,
            report.tile_width,
            report.tile_height
        );
        Ok(())
    }
}

const HALF_BLOCK: char = '\u{2580}';

/// Draws the frame on a true-color terminal, two pixel rows per line
/// using the upper half block, scaled down to fit `columns`.
pub struct AnsiSink<W: Write> {
    out: W,
    columns: usize,
    drawn: Option<usize>,
}

impl<W: Write> AnsiSink<W> {
    /// A sink writing to `out`, at most `columns` characters wide.
    pub fn new(out: W, columns: usize) -> Self {
        AnsiSink {
            out,
            columns: columns.max(1),
            drawn: None,
        }
    }

    /// Gives the writer back.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Output size in character cells for a frame: (columns, lines).
    pub fn cells(&self, frame: &FrameBuffer) -> (usize, usize) {
        let cols = self.columns.min(frame.width()).max(1);
        let rows = (frame.height() * cols / frame.width().max(1)).max(1);
        (cols, (rows + 1) / 2)
    }

    fn draw(&mut self, frame: &FrameBuffer, clear: bool) -> io::Result<()> {
        let (cols, lines) = self.cells(frame);
        let rows = lines * 2;
        let sample = |cx: usize, cy: usize| {
            let x = cx * frame.width() / cols;
            let y = (cy * frame.height() / rows).min(frame.height().saturating_sub(1));
            frame.get(x, y).map(|p| p.0).unwrap_or([0, 0, 0, 0])
        };

        if clear {
            self.out.write_all(b"\x1b[2J")?;
        }
        self.out.write_all(b"\x1b[H\x1b[0m")?;
        for line in 0..lines {
            for cx in 0..cols {
                let top = sample(cx, line * 2);
                let bottom = sample(cx, line * 2 + 1);
                write!(
                    self.out,
                    "\x1b[38;2;{};{};{}m\x1b[48;2;{};{};{}m{}",
                    top[0], top[1], top[2], bottom[0], bottom[1], bottom[2], HALF_BLOCK
                )?;
            }
            self.out.write_all(b"\x1b[0m\r\n")?;
        }
        self.out.flush()
    }
}

impl<W: Write> DisplaySink for AnsiSink<W> {
    fn present(&mut self, frame: &FrameBuffer) -> io::Result<()> {
        // Redraw only when something new has been written.
        let written = frame.written();
        if self.drawn == Some(written) {
            return Ok(());
        }
        let first = self.drawn.is_none();
        self.drawn = Some(written);
        self.draw(frame, first)
    }
}

/// True for a key press that asks to quit: Escape, `q`, `Q`, or
/// Ctrl-C, which raw mode no longer turns into a signal.
pub fn is_quit(key: &KeyEvent) -> bool {
    if key.kind == KeyEventKind::Release {
        return false;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => true,
        _ => false,
    }
}

/// Quit keys from the terminal.  While one of these is alive and
/// standard input is a terminal, the terminal is in raw mode so a
/// single key press is seen without waiting for Enter.  Without a
/// terminal it never asks to quit.
pub struct TerminalKeys {
    raw: bool,
    requested: bool,
}

impl TerminalKeys {
    /// Puts the terminal in raw mode if there is one.
    pub fn new() -> io::Result<Self> {
        let raw = io::stdin().is_tty();
        if raw {
            terminal::enable_raw_mode()?;
        } else {
            debug!("standard input is not a terminal, quit keys are off");
        }
        Ok(TerminalKeys {
            raw,
            requested: false,
        })
    }

    /// True if key presses are being read.
    pub fn is_interactive(&self) -> bool {
        self.raw
    }
}

impl KeySource for TerminalKeys {
    fn quit_requested(&mut self) -> bool {
        if !self.raw || self.requested {
            return self.requested;
        }
        loop {
            match event::poll(Duration::from_millis(0)) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    warn!("cannot poll the terminal: {}", e);
                    break;
                }
            }
            match event::read() {
                Ok(Event::Key(key)) if is_quit(&key) => {
                    self.requested = true;
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("cannot read from the terminal: {}", e);
                    break;
                }
            }
        }
        self.requested
    }
}

impl Drop for TerminalKeys {
    fn drop(&mut self) {
        if self.raw {
            let _ = terminal::disable_raw_mode();
        }
    }
}

/// How the display loop ended.
#[derive(Debug)]
pub enum Outcome {
    /// The render finished, successfully or not.
    Finished(Result<RenderReport, RenderError>),
    /// The user quit first.
    Quit,
}

/// Refreshes `sink` from `frame` every `refresh` until the render
/// reports on `done` or `keys` asks to quit.  Returns straight away
/// on quit; the render is left to the caller.
pub fn display_loop(
    sink: &mut dyn DisplaySink,
    keys: &mut dyn KeySource,
    frame: &FrameBuffer,
    done: &Receiver<Result<RenderReport, RenderError>>,
    refresh: Duration,
) -> io::Result<Outcome> {
    loop {
        if keys.quit_requested() {
            return Ok(Outcome::Quit);
        }
        match done.recv_timeout(refresh) {
            Ok(Ok(report)) => {
                sink.finish(frame, &report)?;
                return Ok(Outcome::Finished(Ok(report)));
            }
            Ok(Err(e)) => return Ok(Outcome::Finished(Err(e))),
            Err(RecvTimeoutError::Timeout) => sink.present(frame)?,
            Err(RecvTimeoutError::Disconnected) => {
                return Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "render thread exited without reporting",
                ))
            }
        }
    }
}
