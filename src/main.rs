// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use clap::{App, Arg, ArgMatches};
use crossbeam::channel::bounded;
use crossterm::tty::IsTty;
use env_logger::Env;
use failure::err_msg;
use log::info;
use std::io::{self, Write};
use std::path::Path;
use std::process::exit;
use std::str::FromStr;
use std::thread;
use std::time::Duration;

use mandeltile::config::{parse_pair, parse_range, parse_size};
use mandeltile::display::{display_loop, AnsiSink, DisplaySink, Outcome, ProgressSink, TerminalKeys};
use mandeltile::errors::{ConfigError, Result};
use mandeltile::palette;
use mandeltile::{CancelToken, Coloring, Config, FrameBuffer};

fn validate_pair<T: FromStr>(
    s: &str,
    separator: char,
    err: &str,
) -> std::result::Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> std::result::Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const DEFAULT_CONFIG: &str = "config.toml";
const REFRESH: Duration = Duration::from_millis(100);

const CONFIG: &str = "config";
const SIZE: &str = "size";
const REAL: &str = "real";
const IMAG: &str = "imag";
const PALETTE: &str = "palette";
const COLORING: &str = "coloring";
const ITERATIONS: &str = "iterations";
const WORKERS: &str = "workers";
const DISPLAY: &str = "display";
const COLUMNS: &str = "columns";
const LIST_PALETTES: &str = "list-palettes";
const VERBOSE: &str = "verbose";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("mandeltile")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Tiled, multi-threaded Mandelbrot renderer")
        .arg(
            Arg::with_name(CONFIG)
                .long(CONFIG)
                .short("c")
                .takes_value(true)
                .help("Configuration file (default: ./config.toml if present)"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .validator(|s| validate_pair::<usize>(&s, 'x', "Could not parse image size"))
                .help("Size of the image, WIDTHxHEIGHT"),
        )
        .arg(
            Arg::with_name(REAL)
                .long(REAL)
                .short("r")
                .takes_value(true)
                .allow_hyphen_values(true)
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse real range"))
                .help("Real axis range, FROM,TO"),
        )
        .arg(
            Arg::with_name(IMAG)
                .long(IMAG)
                .short("m")
                .takes_value(true)
                .allow_hyphen_values(true)
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse imaginary range"))
                .help("Imaginary axis range, FROM,TO"),
        )
        .arg(
            Arg::with_name(PALETTE)
                .long(PALETTE)
                .short("p")
                .takes_value(true)
                .help("Name of the color palette"),
        )
        .arg(
            Arg::with_name(COLORING)
                .long(COLORING)
                .takes_value(true)
                .possible_values(&["hsl", "palette"])
                .help("Coloring strategy"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        1_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 1000000",
                    )
                })
                .help("Maximum number of iterations per point"),
        )
        .arg(
            Arg::with_name(WORKERS)
                .long(WORKERS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse worker count",
                        &format!("Worker count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of render threads"),
        )
        .arg(
            Arg::with_name(DISPLAY)
                .long(DISPLAY)
                .short("d")
                .takes_value(true)
                .possible_values(&["none", "ansi"])
                .default_value("none")
                .help("How to show the frame while it renders"),
        )
        .arg(
            Arg::with_name(COLUMNS)
                .long(COLUMNS)
                .takes_value(true)
                .default_value("80")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        1000,
                        "Could not parse column count",
                        "Column count must be between 1 and 1000",
                    )
                })
                .help("Width of the ansi display in characters"),
        )
        .arg(
            Arg::with_name(LIST_PALETTES)
                .long(LIST_PALETTES)
                .help("Print the names of the built-in palettes and exit"),
        )
        .arg(
            Arg::with_name(VERBOSE)
                .long(VERBOSE)
                .short("v")
                .multiple(true)
                .help("More logging; repeat for more"),
        )
        .get_matches()
}

fn parse_count(what: &'static str, s: &str) -> std::result::Result<usize, ConfigError> {
    usize::from_str(s).map_err(|_| ConfigError::Malformed {
        what,
        value: s.to_string(),
    })
}

/// The configuration file, if any, with command-line values laid on
/// top of it.
fn load_config(matches: &ArgMatches) -> Result<Config> {
    let mut config = match matches.value_of(CONFIG) {
        Some(path) => Config::load(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => Config::load(DEFAULT_CONFIG)?,
        None => Config::default(),
    };
    if let Some(size) = matches.value_of(SIZE) {
        let (width, height) = parse_size(size)?;
        config.width = width;
        config.height = height;
    }
    if let Some(real) = matches.value_of(REAL) {
        config.real = parse_range(real)?;
    }
    if let Some(imag) = matches.value_of(IMAG) {
        config.imag = parse_range(imag)?;
    }
    if let Some(name) = matches.value_of(PALETTE) {
        config.palette = name.to_string();
    }
    if let Some(coloring) = matches.value_of(COLORING) {
        config.coloring = Coloring::from_str(coloring)?;
    }
    if let Some(iterations) = matches.value_of(ITERATIONS) {
        config.iterations = parse_count("iteration count", iterations)?;
    }
    if let Some(workers) = matches.value_of(WORKERS) {
        config.workers = parse_count("worker count", workers)?;
    }
    Ok(config)
}

fn display_sink(matches: &ArgMatches) -> Result<Box<dyn DisplaySink>> {
    Ok(match matches.value_of(DISPLAY) {
        Some("ansi") => {
            let columns = parse_count("column count", matches.value_of(COLUMNS).unwrap_or("80"))?;
            Box::new(AnsiSink::new(io::stdout(), columns))
        }
        _ => Box::new(ProgressSink::new()),
    })
}

fn run() -> Result<()> {
    let matches = args();

    let level = match matches.occurrences_of(VERBOSE) {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    // Raw mode turns off the terminal's own carriage returns.
    let eol = if io::stdin().is_tty() { "\r\n" } else { "\n" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format(move |buf, record| {
            write!(
                buf,
                "[{} {}] {}{}",
                record.level(),
                record.target(),
                record.args(),
                eol
            )
        })
        .init();

    if matches.is_present(LIST_PALETTES) {
        for name in palette::names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let config = load_config(&matches)?;
    let renderer = config.renderer()?;
    info!(
        "palette: {}, coloring: {}, {}x{}, {} iterations",
        config.palette,
        config.coloring,
        config.width,
        config.height,
        config.iterations
    );

    let (frame, writer) = FrameBuffer::new(config.width, config.height);
    let cancel = CancelToken::new();
    let (done_tx, done_rx) = bounded(1);
    let render = {
        let cancel = cancel.clone();
        thread::spawn(move || {
            let _ = done_tx.send(renderer.render(writer, &cancel));
        })
    };

    let mut keys = TerminalKeys::new()?;
    let mut sink = display_sink(&matches)?;
    let outcome = display_loop(sink.as_mut(), &mut keys, &frame, &done_rx, REFRESH);
    drop(keys);
    let result = match outcome? {
        Outcome::Finished(result) => result,
        Outcome::Quit => {
            info!("quit requested, stopping render");
            cancel.cancel();
            done_rx
                .recv()
                .map_err(|_| err_msg("render thread exited without reporting"))?
        }
    };
    render
        .join()
        .map_err(|_| err_msg("render thread panicked"))?;
    result?;
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Render failure: {}", e);
        exit(1);
    }
}
