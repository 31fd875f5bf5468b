//! Composited PNG export of the map with an information panel.
//!
//! The map raster is placed on a white page with padding around it and a
//! text band underneath. Everything is produced at twice the logical size.
//! Composition and encoding run off the UI thread through [`CaptureChannel`].

use crate::geo::distance::trajectory_distance_km;
use crate::render::{colors, text, RasterSurface, Surface};
use crate::state::Point;
use chrono::NaiveDate;
use eframe::egui;
use std::io::Cursor;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use tiny_skia as sk;

/// Output pixels per logical unit.
pub const SUPERSAMPLE: f32 = 2.0;
/// Blank margin around the map, logical units.
pub const PADDING: f32 = 80.0;
/// Height of the text band under the map, logical units.
pub const INFO_HEIGHT: f32 = 240.0;
/// Number of points listed before the overflow line.
pub const MAX_LISTED_POINTS: usize = 4;

pub const SCREENSHOT_FILE_NAME: &str = "map-screenshot.png";

const TITLE: &str = "Trajectory Workbench";
const TITLE_SIZE: f32 = 30.0;
const SUMMARY_SIZE: f32 = 22.0;
const LIST_SIZE: f32 = 16.0;
const DISTANCE_SIZE: f32 = 18.0;
const LIST_COLUMN: f32 = 420.0;
const LIST_SPACING: f32 = 50.0;

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// The active map has no raster to capture.
    SurfaceMissing,
    /// There is nothing to show.
    NoPoints,
    /// A capture is already running.
    InFlight,
    /// The encoder finished without producing data.
    EmptyEncoding,
    /// Allocation or encoding failed.
    Encode(String),
    /// The capture worker stopped without reporting a result.
    Interrupted,
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::SurfaceMissing => write!(
                f,
                "Map image not found. Make sure the simulated map is loaded."
            ),
            CaptureError::NoPoints => write!(f, "Add at least one point before capturing the map."),
            CaptureError::InFlight => write!(f, "A capture is already in progress."),
            CaptureError::EmptyEncoding => write!(f, "Image encoding produced no data."),
            CaptureError::Encode(msg) => write!(f, "Failed to encode image: {}", msg),
            CaptureError::Interrupted => write!(f, "The capture stopped unexpectedly."),
        }
    }
}

impl std::error::Error for CaptureError {}

/// One line of panel text, positioned in logical units relative to the page.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelLine {
    pub text: String,
    pub x: f32,
    /// Vertical center of the line
    pub y: f32,
    pub size: f32,
}

/// Logical page size for a map of `map_size`.
pub fn page_size(map_size: egui::Vec2) -> egui::Vec2 {
    egui::Vec2::new(
        map_size.x + PADDING * 2.0,
        map_size.y + INFO_HEIGHT + PADDING * 2.0,
    )
}

/// Text lines of the information panel for a map of `map_size`.
pub fn panel_lines(map_size: egui::Vec2, points: &[Point], date: NaiveDate) -> Vec<PanelLine> {
    let band_top = PADDING + map_size.y;
    let left = PADDING;
    let right = PADDING + LIST_COLUMN;
    let line = |text: String, x: f32, offset: f32, size: f32| PanelLine {
        text,
        x,
        y: band_top + offset,
        size,
    };

    let mut lines = vec![
        line(TITLE.to_string(), left, 60.0, TITLE_SIZE),
        line(
            format!("Total points: {}", points.len()),
            left,
            110.0,
            SUMMARY_SIZE,
        ),
        line(
            format!("Date: {}", date.format("%Y-%m-%d")),
            left,
            160.0,
            SUMMARY_SIZE,
        ),
    ];

    for (i, point) in points.iter().take(MAX_LISTED_POINTS).enumerate() {
        lines.push(line(
            format!(
                "{}. {} ({:.4}, {:.4})",
                i + 1,
                point.name,
                point.lat,
                point.lng
            ),
            right,
            60.0 + i as f32 * LIST_SPACING,
            LIST_SIZE,
        ));
    }

    if points.len() > MAX_LISTED_POINTS {
        lines.push(line(
            format!("... and {} more", points.len() - MAX_LISTED_POINTS),
            right,
            210.0,
            LIST_SIZE,
        ));
    }

    if points.len() >= 2 {
        lines.push(line(
            format!(
                "Approximate total distance: {:.2} km",
                trajectory_distance_km(points)
            ),
            left,
            210.0,
            DISTANCE_SIZE,
        ));
    }

    lines
}

/// Draws the page: white background, the map, then the panel text.
pub fn compose(
    map: &RasterSurface,
    points: &[Point],
    date: NaiveDate,
) -> Result<sk::Pixmap, CaptureError> {
    if points.is_empty() {
        return Err(CaptureError::NoPoints);
    }

    let map_size = map.logical_size();
    let page = page_size(map_size) * SUPERSAMPLE;
    let mut pixmap = sk::Pixmap::new(page.x.round() as u32, page.y.round() as u32)
        .ok_or_else(|| CaptureError::Encode(format!("cannot allocate {}x{}", page.x, page.y)))?;

    let [r, g, b, a] = colors::export::BACKGROUND.to_srgba_unmultiplied();
    pixmap.fill(sk::Color::from_rgba8(r, g, b, a));

    let scale = SUPERSAMPLE / map.pixel_ratio();
    let offset = PADDING * SUPERSAMPLE;
    let paint = sk::PixmapPaint {
        quality: if scale == 1.0 {
            sk::FilterQuality::Nearest
        } else {
            sk::FilterQuality::Bilinear
        },
        ..Default::default()
    };
    pixmap.draw_pixmap(
        0,
        0,
        map.pixmap().as_ref(),
        &paint,
        sk::Transform::from_row(scale, 0.0, 0.0, scale, offset, offset),
        None,
    );

    for line in panel_lines(map_size, points, date) {
        text::draw_left(
            &mut pixmap,
            &line.text,
            line.size * SUPERSAMPLE,
            line.x * SUPERSAMPLE,
            line.y * SUPERSAMPLE,
            colors::export::TEXT,
        );
    }

    Ok(pixmap)
}

/// PNG bytes of a pixmap.
pub fn encode_png(pixmap: &sk::Pixmap) -> Result<Vec<u8>, CaptureError> {
    let rgba: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();

    let image = image::RgbaImage::from_raw(pixmap.width(), pixmap.height(), rgba)
        .ok_or_else(|| CaptureError::Encode("pixel buffer size mismatch".to_string()))?;

    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| CaptureError::Encode(e.to_string()))?;

    if bytes.is_empty() {
        return Err(CaptureError::EmptyEncoding);
    }
    Ok(bytes)
}

/// Composes and encodes in one step.
pub fn capture(
    map: &RasterSurface,
    points: &[Point],
    date: NaiveDate,
) -> Result<Vec<u8>, CaptureError> {
    let pixmap = compose(map, points, date)?;
    encode_png(&pixmap)
}

/// File name of a capture taken on `date`.
pub fn capture_file_name(date: NaiveDate) -> String {
    format!("trajectory_map_{}.png", date.format("%Y-%m-%d"))
}

/// Input for a background capture.
pub struct CaptureJob {
    pub map: RasterSurface,
    pub points: Vec<Point>,
    pub date: NaiveDate,
}

/// A finished capture ready to be saved.
#[derive(Debug, Clone)]
pub struct CaptureOutput {
    pub file_name: String,
    pub png: Vec<u8>,
}

type CaptureResult = Result<CaptureOutput, CaptureError>;

/// Runs at most one capture at a time and hands the result back to the UI
/// thread. Each capture gets its own channel, held only while it runs.
#[derive(Default)]
pub struct CaptureChannel {
    receiver: Option<Receiver<CaptureResult>>,
}

impl CaptureChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.receiver.is_some()
    }

    /// Starts a capture, refusing while another one is running.
    pub fn start(&mut self, ctx: &egui::Context, job: CaptureJob) -> Result<(), CaptureError> {
        if self.is_pending() {
            return Err(CaptureError::InFlight);
        }
        log::info!("Capturing map with {} points", job.points.len());

        self.spawn(ctx, move || {
            capture(&job.map, &job.points, job.date).map(|png| CaptureOutput {
                file_name: capture_file_name(job.date),
                png,
            })
        });
        Ok(())
    }

    fn spawn<F>(&mut self, ctx: &egui::Context, work: F)
    where
        F: FnOnce() -> CaptureResult + Send + 'static,
    {
        let (sender, receiver) = channel();
        self.receiver = Some(receiver);

        let ctx = ctx.clone();
        let run = move || {
            let _ = sender.send(work());
            ctx.request_repaint();
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            std::thread::spawn(run);
        }

        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(async move { run() });
        }
    }

    /// Non-blocking check for a finished capture. Clears the pending flag
    /// whether the capture succeeded, failed or its worker died.
    pub fn try_recv(&mut self) -> Option<CaptureResult> {
        let result = match self.receiver.as_ref()?.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                log::error!("Capture worker stopped without a result");
                Err(CaptureError::Interrupted)
            }
        };
        self.receiver = None;
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::ViewState;
    use crate::render::render_scene;
    use std::time::{Duration, Instant};

    fn points(n: usize) -> Vec<Point> {
        (0..n)
            .map(|i| Point {
                id: i as u64 + 1,
                name: format!("Stop {}", i + 1),
                lat: -10.0 - i as f64,
                lng: -40.0 + i as f64,
            })
            .collect()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn map_surface(ratio: f32) -> RasterSurface {
        let size = egui::Vec2::new(80.0, 52.0);
        let mut surface = RasterSurface::new(size, ratio).unwrap();
        render_scene(&mut surface, &[], &points(2), &ViewState::new(size));
        surface
    }

    fn wait(channel: &mut CaptureChannel) -> CaptureResult {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if let Some(result) = channel.try_recv() {
                return result;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("capture timed out");
    }

    #[test]
    fn test_panel_lists_four_points_and_overflow() {
        let lines = panel_lines(egui::Vec2::new(800.0, 520.0), &points(5), date());
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();

        assert_eq!(texts[0], TITLE);
        assert!(texts.contains(&"Total points: 5"));
        assert!(texts.contains(&"Date: 2024-05-01"));
        assert_eq!(texts.iter().filter(|t| t.contains(". Stop ")).count(), 4);
        assert!(texts.contains(&"1. Stop 1 (-10.0000, -40.0000)"));
        assert!(!texts.iter().any(|t| t.contains("Stop 5")));
        assert!(texts.contains(&"... and 1 more"));
        assert!(texts.iter().any(|t| t.starts_with("Approximate total distance: ")));
    }

    #[test]
    fn test_panel_single_point() {
        let lines = panel_lines(egui::Vec2::new(800.0, 520.0), &points(1), date());
        assert!(!lines.iter().any(|l| l.text.contains("more")));
        assert!(!lines.iter().any(|l| l.text.contains("distance")));
    }

    #[test]
    fn test_panel_sits_below_map() {
        let lines = panel_lines(egui::Vec2::new(800.0, 520.0), &points(2), date());
        assert!(lines.iter().all(|l| l.y > PADDING + 520.0));
        assert!(lines.iter().all(|l| l.y < PADDING + 520.0 + INFO_HEIGHT));
    }

    #[test]
    fn test_compose_dimensions_and_layout() {
        for ratio in [1.0, 2.0] {
            let pixmap = compose(&map_surface(ratio), &points(2), date()).unwrap();
            assert_eq!(pixmap.width(), ((80.0 + 160.0) * 2.0) as u32);
            assert_eq!(pixmap.height(), ((52.0 + 240.0 + 160.0) * 2.0) as u32);

            let corner = pixmap.pixel(2, 2).unwrap().demultiply();
            assert_eq!([corner.red(), corner.green(), corner.blue()], [255, 255, 255]);

            let ocean = colors::map::OCEAN.to_srgba_unmultiplied();
            let inside = pixmap.pixel(170, 170).unwrap().demultiply();
            let close = |a: u8, b: u8| (a as i16 - b as i16).abs() <= 2;
            assert!(
                close(inside.red(), ocean[0])
                    && close(inside.green(), ocean[1])
                    && close(inside.blue(), ocean[2]),
                "expected ocean at map interior"
            );
        }
    }

    #[test]
    fn test_compose_requires_points() {
        assert_eq!(
            compose(&map_surface(1.0), &[], date()).unwrap_err(),
            CaptureError::NoPoints
        );
    }

    #[test]
    fn test_capture_produces_png() {
        let png = capture(&map_surface(2.0), &points(3), date()).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(capture_file_name(date()), "trajectory_map_2024-05-01.png");
    }

    #[test]
    fn test_channel_is_single_flight() {
        let ctx = egui::Context::default();
        let mut channel = CaptureChannel::new();
        let job = || CaptureJob {
            map: map_surface(1.0),
            points: points(2),
            date: date(),
        };

        channel.start(&ctx, job()).unwrap();
        assert!(channel.is_pending());
        assert_eq!(channel.start(&ctx, job()), Err(CaptureError::InFlight));

        let output = wait(&mut channel).unwrap();
        assert!(!channel.is_pending());
        assert_eq!(output.file_name, "trajectory_map_2024-05-01.png");
        assert!(!output.png.is_empty());

        channel.start(&ctx, job()).unwrap();
        assert!(wait(&mut channel).is_ok());
    }

    #[test]
    fn test_channel_clears_pending_on_failure() {
        let ctx = egui::Context::default();
        let mut channel = CaptureChannel::new();
        channel
            .start(
                &ctx,
                CaptureJob {
                    map: map_surface(1.0),
                    points: Vec::new(),
                    date: date(),
                },
            )
            .unwrap();

        assert_eq!(wait(&mut channel).unwrap_err(), CaptureError::NoPoints);
        assert!(!channel.is_pending());
    }

    #[test]
    fn test_channel_recovers_from_panicking_worker() {
        let ctx = egui::Context::default();
        let mut channel = CaptureChannel::new();
        channel.spawn(&ctx, || panic!("encoder crashed"));
        assert!(channel.is_pending());

        assert_eq!(wait(&mut channel).unwrap_err(), CaptureError::Interrupted);
        assert!(!channel.is_pending());

        let job = CaptureJob {
            map: map_surface(1.0),
            points: points(1),
            date: date(),
        };
        channel.start(&ctx, job).unwrap();
        assert!(wait(&mut channel).is_ok());
    }
}
