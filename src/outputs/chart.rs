//! Bar chart of the current fill levels.
//!
//! The chart is laid out as an SVG document and rasterized to PNG so it can be
//! attached to the status post. Bars are sorted from fullest to emptiest and coloured on a red, yellow and
//! green scale over `0..=100`. The y axis is fixed to `0..=100`; values outside it
//! are labelled with their real value but drawn clamped.

use crate::models::{City, LevelSnapshot};
use crate::utils::{output_path, timestamped_name};
use chrono::{DateTime, Local};
use itertools::Itertools;
use resvg::{tiny_skia, usvg};
use std::error::Error;
use std::fmt::{self, Write};
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, instrument};

const WIDTH: f64 = 1300.0;
const HEIGHT: f64 = 780.0;
const MARGIN_LEFT: f64 = 100.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_TOP: f64 = 90.0;
const MARGIN_BOTTOM: f64 = 70.0;
const WATERMARK: &str = "@baraj_doluluk";

/// Red, yellow and green stops of the fill scale.
const SCALE: [(f64, f64, f64); 3] = [(215.0, 48.0, 39.0), (255.0, 255.0, 191.0), (26.0, 152.0, 80.0)];

/// Bar colour for a fill percentage, as `#rrggbb`.
pub fn fill_color(pct: f64) -> String {
    let t = (pct / 100.0).clamp(0.0, 1.0);
    let (from, to, local) = if t < 0.5 {
        (SCALE[0], SCALE[1], t * 2.0)
    } else {
        (SCALE[1], SCALE[2], (t - 0.5) * 2.0)
    };
    let mix = |a: f64, b: f64| (a + (b - a) * local).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        mix(from.0, to.0),
        mix(from.1, to.1),
        mix(from.2, to.2)
    )
}

/// Bars in drawing order: highest first, ties in canonical city order.
pub fn sorted_bars(snapshot: &LevelSnapshot) -> Vec<(City, f64)> {
    snapshot
        .as_map()
        .into_iter()
        .sorted_by(|a, b| b.1.total_cmp(&a.1))
        .collect()
}

/// Render the chart document.
pub fn render_chart(snapshot: &LevelSnapshot, at: DateTime<Local>) -> Result<String, fmt::Error> {
    let bars = sorted_bars(snapshot);
    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let y_of = |pct: f64| MARGIN_TOP + plot_h * (1.0 - pct.clamp(0.0, 100.0) / 100.0);

    let mut svg = String::new();
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="DejaVu Sans, Arial, sans-serif">"#
    )?;
    writeln!(svg, r##"<rect width="100%" height="100%" fill="#f7f8fa"/>"##)?;
    writeln!(
        svg,
        r##"<rect x="{MARGIN_LEFT}" y="{MARGIN_TOP}" width="{plot_w}" height="{plot_h}" fill="#fcfdff"/>"##
    )?;
    writeln!(
        svg,
        r##"<text x="{x}" y="{y}" font-size="80" fill="#2b2b2b" fill-opacity="0.06" text-anchor="middle" dominant-baseline="middle" transform="rotate(-30 {x} {y})">{WATERMARK}</text>"##,
        x = MARGIN_LEFT + plot_w / 2.0,
        y = MARGIN_TOP + plot_h / 2.0,
    )?;

    writeln!(
        svg,
        r##"<text x="{x}" y="40" font-size="26" font-weight="bold" text-anchor="middle" fill="#1b1e23">Baraj Doluluk Oranları</text>"##,
        x = WIDTH / 2.0
    )?;
    writeln!(
        svg,
        r##"<text x="{x}" y="{y}" font-size="14" text-anchor="end" fill="#5a6270">Güncel: {ts}</text>"##,
        x = WIDTH - MARGIN_RIGHT,
        y = MARGIN_TOP - 12.0,
        ts = at.format("%Y-%m-%d %H:%M"),
    )?;

    // Axes and ticks
    let x_axis_y = MARGIN_TOP + plot_h;
    writeln!(
        svg,
        r##"<line x1="{MARGIN_LEFT}" y1="{MARGIN_TOP}" x2="{MARGIN_LEFT}" y2="{x_axis_y}" stroke="#bfc7d5"/>"##
    )?;
    writeln!(
        svg,
        r##"<line x1="{MARGIN_LEFT}" y1="{x_axis_y}" x2="{x2}" y2="{x_axis_y}" stroke="#bfc7d5"/>"##,
        x2 = MARGIN_LEFT + plot_w
    )?;
    for tick in (0..=100).step_by(20) {
        let y = y_of(tick as f64);
        writeln!(
            svg,
            r##"<text x="{x}" y="{y}" font-size="13" text-anchor="end" dominant-baseline="middle" fill="#3b4150">{tick}</text>"##,
            x = MARGIN_LEFT - 8.0
        )?;
    }
    writeln!(
        svg,
        r##"<text x="30" y="{y}" font-size="15" text-anchor="middle" fill="#3b4150" transform="rotate(-90 30 {y})">Doluluk Oranı (%)</text>"##,
        y = MARGIN_TOP + plot_h / 2.0
    )?;

    if !bars.is_empty() {
        let slot = plot_w / bars.len() as f64;
        let bar_w = slot * 0.8;
        for (i, (city, pct)) in bars.iter().enumerate() {
            let x = MARGIN_LEFT + slot * i as f64 + (slot - bar_w) / 2.0;
            let top = y_of(*pct);
            let center = x + bar_w / 2.0;
            writeln!(
                svg,
                r##"<rect x="{x:.1}" y="{top:.1}" width="{bar_w:.1}" height="{h:.1}" fill="{fill}" stroke="#1b1e23" stroke-width="0.6"/>"##,
                h = x_axis_y - top,
                fill = fill_color(*pct),
            )?;
            writeln!(
                svg,
                r##"<text x="{center:.1}" y="{y:.1}" font-size="15" font-weight="bold" text-anchor="middle" fill="#1b1e23">{pct:.2}%</text>"##,
                y = top - 10.0
            )?;
            writeln!(
                svg,
                r##"<text x="{center:.1}" y="{y:.1}" font-size="15" text-anchor="middle" fill="#3b4150">{city}</text>"##,
                y = x_axis_y + 26.0
            )?;
        }
    }

    writeln!(svg, "</svg>")?;
    Ok(svg)
}

/// Rasterize an SVG document to PNG bytes.
///
/// Labels are drawn with whatever system fonts are installed; without any the
/// bars are still rendered.
pub fn rasterize(svg: &str) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(svg, &options)?;

    let size = tree.size().to_int_size();
    let mut pixmap =
        tiny_skia::Pixmap::new(size.width(), size.height()).ok_or("chart has no area")?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    Ok(pixmap.encode_png()?)
}

/// Render the chart and write it to `baraj_doluluk_<timestamp>.png` in `output_dir`.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
pub async fn write_chart(
    snapshot: &LevelSnapshot,
    output_dir: &str,
    at: DateTime<Local>,
) -> Result<PathBuf, Box<dyn Error>> {
    let svg = render_chart(snapshot, at)?;
    let png = rasterize(&svg)?;
    let path = output_path(output_dir, &timestamped_name("baraj_doluluk", "png", at));
    fs::write(&path, png).await?;
    info!(path = %path.display(), "Saved chart");
    Ok(path)
}
