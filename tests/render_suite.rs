use crossbeam::channel::bounded;
use image::RgbaImage;
use mandeltile::display::{display_loop, DisplaySink, KeySource, Outcome};
use mandeltile::{
    compute_tile_grid, CancelToken, Coloring, Config, FrameBuffer, Range, RenderReport,
};
use std::io;
use std::thread;
use std::time::Duration;

fn scenario() -> Config {
    Config {
        real: Range::new(-2.5, 1.0),
        imag: Range::new(-1.0, 1.0),
        palette: "Hippi".to_string(),
        coloring: Coloring::Palette,
        width: 600,
        height: 400,
        iterations: 100,
        workers: 4,
    }
}

fn render(config: &Config) -> (RgbaImage, RenderReport, usize) {
    let renderer = config.renderer().unwrap();
    let (frame, writer) = FrameBuffer::new(config.width, config.height);
    let report = renderer.render(writer, &CancelToken::new()).unwrap();
    (frame.snapshot(), report, frame.unwritten())
}

#[test]
fn scenario_writes_every_pixel_exactly_once() {
    let config = scenario();
    let grid = compute_tile_grid(600, 400);
    assert!(grid.divisor >= 3 && grid.divisor <= 300);
    assert_eq!(600 % grid.divisor, 0);
    assert_eq!(400 % grid.divisor, 0);

    let (image, report, unwritten) = render(&config);
    // 240 000 writes and no pixel left blank: each was written once.
    assert_eq!(report.pixels, 240_000);
    assert_eq!(unwritten, 0);
    assert_eq!(report.divisor, grid.divisor);
    assert_eq!(report.workers, 4);
    assert!(!report.cancelled);
    assert!(image.pixels().all(|p| p.0[3] == 0xff));
}

#[test]
fn render_is_deterministic_across_worker_counts() {
    let mut config = scenario();
    config.width = 120;
    config.height = 80;
    config.workers = 1;
    let (single, _, _) = render(&config);
    for &workers in &[2, 3, 8] {
        config.workers = workers;
        let (multi, report, _) = render(&config);
        assert_eq!(report.workers, workers);
        assert!(single.pixels().eq(multi.pixels()));
    }
    config.workers = 3;
    let (again, _, _) = render(&config);
    assert!(single.pixels().eq(again.pixels()));
}

#[test]
fn hsl_render_paints_the_main_cardioid_black() {
    let mut config = scenario();
    config.coloring = Coloring::Hsl;
    config.width = 60;
    config.height = 40;
    let (image, _, _) = render(&config);
    // Pixel (40, 20) maps to about -0.1667 + 0i, inside the set.
    assert_eq!(image.get_pixel(40, 20).0, [0, 0, 0, 255]);
    // Pixel (0, 0) maps to -2.5 - 1i, which escapes at once.
    assert_ne!(image.get_pixel(0, 0).0, [0, 0, 0, 255]);
}

#[test]
fn hsl_render_paints_minus_two_red() {
    let mut config = scenario();
    config.coloring = Coloring::Hsl;
    config.real = Range::new(-2.0, 1.0);
    config.width = 60;
    config.height = 40;
    let (image, _, _) = render(&config);
    // Pixel (0, 20) is exactly -2 + 0i, whose orbit lands on the
    // bailout circle at the first step.
    assert_eq!(image.get_pixel(0, 20).0, [255, 0, 0, 255]);
}

#[test]
fn coprime_image_renders_as_one_tile() {
    let mut config = scenario();
    config.width = 37;
    config.height = 23;
    let (_, report, unwritten) = render(&config);
    assert_eq!(report.divisor, 1);
    assert_eq!(report.tiles, 1);
    assert_eq!(report.pixels, 37 * 23);
    assert_eq!(unwritten, 0);
}

#[test]
fn cancelled_render_stops_short_and_says_so() {
    let mut config = scenario();
    config.width = 400;
    config.height = 400;
    config.iterations = 20_000;
    config.workers = 2;
    let renderer = config.renderer().unwrap();
    let (frame, writer) = FrameBuffer::new(400, 400);
    let cancel = CancelToken::new();
    let stopper = {
        let cancel = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            cancel.cancel();
        })
    };
    let report = renderer.render(writer, &cancel).unwrap();
    stopper.join().unwrap();
    assert!(report.cancelled);
    assert!(report.pixels < 160_000);
    assert_eq!(report.pixels, frame.written());
    assert!(report.to_string().contains("cancelled"));
}

struct Silent;

impl DisplaySink for Silent {
    fn present(&mut self, _frame: &FrameBuffer) -> io::Result<()> {
        Ok(())
    }
}

/// Asks to quit on the given poll.
struct QuitAfter(usize);

impl KeySource for QuitAfter {
    fn quit_requested(&mut self) -> bool {
        if self.0 == 0 {
            return true;
        }
        self.0 -= 1;
        false
    }
}

#[test]
fn quit_key_cancels_a_running_render() {
    let mut config = scenario();
    config.width = 401;
    config.height = 399;
    config.iterations = 20_000;
    config.workers = 2;
    let renderer = config.renderer().unwrap();
    let (frame, writer) = FrameBuffer::new(401, 399);
    let cancel = CancelToken::new();
    let (done_tx, done_rx) = bounded(1);
    let render = {
        let cancel = cancel.clone();
        thread::spawn(move || {
            let _ = done_tx.send(renderer.render(writer, &cancel));
        })
    };

    let outcome = display_loop(
        &mut Silent,
        &mut QuitAfter(2),
        &frame,
        &done_rx,
        Duration::from_millis(5),
    )
    .unwrap();
    assert!(match outcome {
        Outcome::Quit => true,
        _ => false,
    });
    cancel.cancel();
    let report = done_rx.recv().unwrap().unwrap();
    render.join().unwrap();
    assert!(report.cancelled);
    assert!(report.pixels < 401 * 399);
}
