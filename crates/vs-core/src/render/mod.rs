//! Figure rendering.
//!
//! A [`Figure`] is a backend-independent description of one chart: title,
//! axis descriptions, layers and an optional note box. [`render_figure`]
//! draws it with plotters into a PNG or SVG file.
//!
//! SVG is always available. PNG needs the `ttf` crate feature, which brings
//! in a rasterizer and system fonts for the text.

pub mod figures;

pub use figures::{aggregate_figure, binomial_figure, ranked_figure, rank_color};

use clap::ValueEnum;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Image container for written figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Raster PNG (requires the `ttf` feature)
    Png,
    /// Vector SVG
    #[default]
    Svg,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Errors raised while drawing or writing a figure.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("figure has no data to draw")]
    Empty,

    #[error("{0}")]
    Unsupported(String),

    #[error("drawing failed: {0}")]
    Draw(String),

    #[error("cannot write {path}: {reason}")]
    Output { path: PathBuf, reason: String },
}

impl From<RenderError> for vs_common::Error {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Output { path, reason } => vs_common::Error::OutputPath {
                path: path.display().to_string(),
                reason,
            },
            other => vs_common::Error::Render(other.to_string()),
        }
    }
}

fn draw_error<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> RenderError {
    RenderError::Draw(err.to_string())
}

/// One drawable series.
#[derive(Debug, Clone)]
pub enum Layer {
    /// Polyline through `points`.
    Line {
        points: Vec<(f64, f64)>,
        color: RGBColor,
        label: Option<String>,
    },
    /// Dots, optionally annotated one text per point.
    Markers {
        points: Vec<(f64, f64)>,
        color: RGBColor,
        label: Option<String>,
        annotations: Vec<String>,
    },
    /// Vertical bars of `width` centred on each x.
    Bars {
        bars: Vec<(f64, f64)>,
        width: f64,
        color: RGBColor,
        label: Option<String>,
    },
}

impl Layer {
    fn points(&self) -> &[(f64, f64)] {
        match self {
            Layer::Line { points, .. } | Layer::Markers { points, .. } => points,
            Layer::Bars { bars, .. } => bars,
        }
    }

    /// Horizontal extent including bar widths.
    fn x_extent(&self) -> Option<(f64, f64)> {
        let half = match self {
            Layer::Bars { width, .. } => width / 2.0,
            _ => 0.0,
        };
        extent(self.points().iter().map(|p| p.0))
            .map(|(lo, hi)| (lo - half, hi + half))
    }

    fn y_extent(&self) -> Option<(f64, f64)> {
        extent(self.points().iter().map(|p| p.1))
    }
}

fn extent(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Backend-independent chart description.
#[derive(Debug, Clone)]
pub struct Figure {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub size: (u32, u32),
    pub layers: Vec<Layer>,
    /// Lines shown in a boxed note inside the plot.
    pub note: Vec<String>,
}

impl Figure {
    pub fn new(title: impl Into<String>, x_desc: impl Into<String>, y_desc: impl Into<String>) -> Self {
        Figure {
            title: title.into(),
            x_desc: x_desc.into(),
            y_desc: y_desc.into(),
            size: (1400, 800),
            layers: Vec::new(),
            note: Vec::new(),
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn note_line(mut self, line: impl Into<String>) -> Self {
        self.note.push(line.into());
        self
    }

    /// Plot ranges: x over every layer, y from 0 with 5% headroom.
    pub fn ranges(&self) -> Option<((f64, f64), (f64, f64))> {
        let (x_lo, x_hi) = self
            .layers
            .iter()
            .filter_map(Layer::x_extent)
            .reduce(|a, b| (a.0.min(b.0), a.1.max(b.1)))?;
        let (_, y_hi) = self
            .layers
            .iter()
            .filter_map(Layer::y_extent)
            .reduce(|a, b| (a.0.min(b.0), a.1.max(b.1)))?;

        let x_hi = if x_hi > x_lo { x_hi } else { x_lo + 1.0 };
        let y_hi = if y_hi > 0.0 { y_hi * 1.05 } else { 1.0 };
        Some(((x_lo, x_hi), (0.0, y_hi)))
    }
}

/// `<dir>/<stem>_<date>.<ext>`
pub fn figure_path(dir: &Path, stem: &str, date: &str, format: ImageFormat) -> PathBuf {
    dir.join(format!("{}_{}.{}", stem, date, format.extension()))
}

/// Draw `figure` into `path` as `format`.
pub fn render_figure(figure: &Figure, path: &Path, format: ImageFormat) -> Result<(), RenderError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            return Err(RenderError::Output {
                path: path.to_path_buf(),
                reason: format!("directory {} does not exist", parent.display()),
            });
        }
    }

    match format {
        ImageFormat::Png => render_png(figure, path),
        ImageFormat::Svg => draw(figure, SVGBackend::new(path, figure.size).into_drawing_area()),
    }
}

#[cfg(feature = "ttf")]
fn render_png(figure: &Figure, path: &Path) -> Result<(), RenderError> {
    draw(figure, BitMapBackend::new(path, figure.size).into_drawing_area())
}

#[cfg(not(feature = "ttf"))]
fn render_png(_figure: &Figure, _path: &Path) -> Result<(), RenderError> {
    Err(RenderError::Unsupported(
        "PNG output is not compiled in (build with --features ttf)".to_string(),
    ))
}

fn axis_label(v: f64) -> String {
    let a = v.abs();
    if a != 0.0 && !(1e-2..1e5).contains(&a) {
        format!("{:.1e}", v)
    } else if a >= 100.0 || v.fract() == 0.0 {
        format!("{:.0}", v)
    } else {
        format!("{:.3}", v)
    }
}

fn draw<DB: DrawingBackend>(figure: &Figure, root: DrawingArea<DB, Shift>) -> Result<(), RenderError> {
    let ((x_lo, x_hi), (y_lo, y_hi)) = figure.ranges().ok_or(RenderError::Empty)?;

    root.fill(&WHITE).map_err(draw_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&figure.title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
        .map_err(draw_error)?;

    chart
        .configure_mesh()
        .x_desc(figure.x_desc.as_str())
        .y_desc(figure.y_desc.as_str())
        .x_label_formatter(&|x| axis_label(*x))
        .y_label_formatter(&|y| axis_label(*y))
        .light_line_style(BLACK.mix(0.05))
        .bold_line_style(BLACK.mix(0.15))
        .draw()
        .map_err(draw_error)?;

    let mut labelled = false;
    for layer in &figure.layers {
        match layer {
            Layer::Bars {
                bars,
                width,
                color,
                label,
            } => {
                let color = *color;
                let half = width / 2.0;
                let anno = chart
                    .draw_series(bars.iter().map(|&(x, y)| {
                        Rectangle::new([(x - half, 0.0), (x + half, y)], color.filled())
                    }))
                    .map_err(draw_error)?;
                if let Some(label) = label {
                    labelled = true;
                    anno.label(label.as_str()).legend(move |(x, y)| {
                        Rectangle::new([(x, y - 5), (x + 16, y + 5)], color.filled())
                    });
                }
            }
            Layer::Line {
                points,
                color,
                label,
            } => {
                let color = *color;
                let anno = chart
                    .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
                    .map_err(draw_error)?;
                if let Some(label) = label {
                    labelled = true;
                    anno.label(label.as_str()).legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                    });
                }
            }
            Layer::Markers {
                points,
                color,
                label,
                annotations,
            } => {
                let color = *color;
                let anno = chart
                    .draw_series(points.iter().map(|&p| Circle::new(p, 4, color.filled())))
                    .map_err(draw_error)?;
                if let Some(label) = label {
                    labelled = true;
                    anno.label(label.as_str())
                        .legend(move |(x, y)| Circle::new((x + 10, y), 4, color.filled()));
                }
                if !annotations.is_empty() {
                    chart
                        .draw_series(points.iter().zip(annotations).map(|(&p, text)| {
                            Text::new(format!(" {}", text), p, ("sans-serif", 12).into_font())
                        }))
                        .map_err(draw_error)?;
                }
            }
        }
    }

    if labelled {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .label_font(("sans-serif", 13))
            .draw()
            .map_err(draw_error)?;
    }

    if !figure.note.is_empty() {
        draw_note(&root, &figure.note, figure.size)?;
    }

    root.present().map_err(draw_error)?;
    Ok(())
}

/// Boxed text in the lower right of the plot area.
fn draw_note<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    lines: &[String],
    size: (u32, u32),
) -> Result<(), RenderError> {
    const LINE_HEIGHT: i32 = 18;
    const BOX_WIDTH: i32 = 280;

    let (w, h) = (size.0 as i32, size.1 as i32);
    let box_height = LINE_HEIGHT * lines.len() as i32 + 12;
    let x0 = w - BOX_WIDTH - 40;
    let y0 = h - box_height - 90;

    root.draw(&Rectangle::new(
        [(x0, y0), (x0 + BOX_WIDTH, y0 + box_height)],
        WHITE.mix(0.85).filled(),
    ))
    .map_err(draw_error)?;
    root.draw(&Rectangle::new(
        [(x0, y0), (x0 + BOX_WIDTH, y0 + box_height)],
        BLACK.stroke_width(1),
    ))
    .map_err(draw_error)?;

    for (i, line) in lines.iter().enumerate() {
        root.draw(&Text::new(
            line.as_str(),
            (x0 + 8, y0 + 6 + LINE_HEIGHT * i as i32),
            ("sans-serif", 14).into_font(),
        ))
        .map_err(draw_error)?;
    }
    Ok(())
}
