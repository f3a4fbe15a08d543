//! # Progress Chart Module
//!
//! Renders daily aggregates as a PNG line chart: average reps (blue) and
//! average weight (red), each scaled to its own range so both trends stay
//! readable on one canvas. Points sit at their real date, so rest days show
//! as gaps. The reps range is labelled on the left axis, the weight range on
//! the right axis and the first and last dates under the x axis.

use std::io::Cursor;

use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use tracing::debug;

use crate::errors::ChartError;
use crate::models::DailyAggregate;

pub const CHART_WIDTH: u32 = 800;
pub const CHART_HEIGHT: u32 = 400;
const MARGIN: u32 = 56;
const MARKER_RADIUS: i64 = 4;
const LABEL_GAP: i64 = 6;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
pub const AXIS_COLOR: Rgb<u8> = Rgb([60, 60, 60]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
pub const REPS_COLOR: Rgb<u8> = Rgb([31, 119, 180]);
pub const WEIGHT_COLOR: Rgb<u8> = Rgb([214, 39, 40]);

/// Render a progress chart for at least two daily points
pub fn render_progress_chart(points: &[DailyAggregate]) -> Result<Vec<u8>, ChartError> {
    if points.len() < 2 {
        return Err(ChartError::NotEnoughData {
            points: points.len(),
        });
    }

    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.day);

    let mut img = RgbImage::from_pixel(CHART_WIDTH, CHART_HEIGHT, BACKGROUND);
    draw_frame(&mut img);

    let days: Vec<DateTime<Utc>> = sorted.iter().map(|p| p.day).collect();
    let reps: Vec<f64> = sorted.iter().map(|p| p.avg_reps).collect();
    let weights: Vec<f64> = sorted.iter().map(|p| p.avg_weight).collect();

    draw_series(&mut img, &days, &reps, REPS_COLOR);
    draw_series(&mut img, &days, &weights, WEIGHT_COLOR);

    draw_value_labels(&mut img, &reps, Side::Left, REPS_COLOR);
    draw_value_labels(&mut img, &weights, Side::Right, WEIGHT_COLOR);
    draw_date_labels(&mut img, &days);

    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;

    debug!(points = sorted.len(), png_bytes = bytes.len(), "Progress chart rendered");
    Ok(bytes)
}

fn plot_left() -> i64 {
    i64::from(MARGIN)
}

fn plot_right() -> i64 {
    i64::from(CHART_WIDTH - MARGIN)
}

fn plot_top() -> i64 {
    i64::from(MARGIN)
}

fn plot_bottom() -> i64 {
    i64::from(CHART_HEIGHT - MARGIN)
}

fn draw_frame(img: &mut RgbImage) {
    // horizontal grid at quarters
    for i in 1..4 {
        let y = plot_top() + (plot_bottom() - plot_top()) * i / 4;
        draw_line(img, (plot_left(), y), (plot_right(), y), GRID);
    }
    draw_line(img, (plot_left(), plot_bottom()), (plot_right(), plot_bottom()), AXIS_COLOR);
    draw_line(img, (plot_left(), plot_top()), (plot_left(), plot_bottom()), AXIS_COLOR);
    draw_line(img, (plot_right(), plot_top()), (plot_right(), plot_bottom()), AXIS_COLOR);
}

/// Horizontal pixel of each day, proportional to elapsed time since the first
pub(crate) fn project_days(days: &[DateTime<Utc>]) -> Vec<i64> {
    let (first, last) = match (days.first(), days.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Vec::new(),
    };
    let span = (last - first).num_seconds() as f64;
    let width = (plot_right() - plot_left()) as f64;

    days.iter()
        .map(|day| {
            let ratio = if span > 0.0 {
                (*day - first).num_seconds() as f64 / span
            } else {
                0.5
            };
            (plot_left() as f64 + width * ratio).round() as i64
        })
        .collect()
}

fn value_range(values: &[f64]) -> (f64, f64) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (min, max)
}

/// Vertical pixel of each value, scaled to the series' own min/max
pub(crate) fn project_values(values: &[f64]) -> Vec<i64> {
    let (min, max) = value_range(values);
    let span = max - min;
    let height = (plot_bottom() - plot_top()) as f64;

    values
        .iter()
        .map(|value| {
            // flat series sit in the middle
            let ratio = if span > f64::EPSILON {
                (value - min) / span
            } else {
                0.5
            };
            (plot_bottom() as f64 - height * ratio).round() as i64
        })
        .collect()
}

/// Pixel coordinates of a series
pub(crate) fn project(days: &[DateTime<Utc>], values: &[f64]) -> Vec<(i64, i64)> {
    project_days(days)
        .into_iter()
        .zip(project_values(values))
        .collect()
}

fn draw_series(img: &mut RgbImage, days: &[DateTime<Utc>], values: &[f64], color: Rgb<u8>) {
    let projected = project(days, values);
    for pair in projected.windows(2) {
        draw_line(img, pair[0], pair[1], color);
    }
    for &(x, y) in &projected {
        draw_marker(img, x, y, color);
    }
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

/// Tick value: whole numbers without decimals, otherwise one decimal
pub(crate) fn format_tick(value: f64) -> String {
    if (value - value.round()).abs() < 0.05 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

/// Min and max of a series next to the axis on `side`
fn draw_value_labels(img: &mut RgbImage, values: &[f64], side: Side, color: Rgb<u8>) {
    let (min, max) = value_range(values);
    let ticks = if max - min > f64::EPSILON {
        vec![(min, plot_bottom()), (max, plot_top())]
    } else {
        vec![(min, (plot_top() + plot_bottom()) / 2)]
    };

    for (value, y) in ticks {
        let label = format_tick(value);
        let y = y - GLYPH_HEIGHT / 2;
        match side {
            Side::Left => {
                let x = plot_left() - LABEL_GAP - text_width(&label);
                draw_text(img, x, y, &label, color);
            }
            Side::Right => draw_text(img, plot_right() + LABEL_GAP, y, &label, color),
        }
    }
}

/// First and last date as `dd.mm` under the x axis
fn draw_date_labels(img: &mut RgbImage, days: &[DateTime<Utc>]) {
    let (first, last) = match (days.first(), days.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return,
    };
    let y = plot_bottom() + LABEL_GAP;

    draw_text(img, plot_left(), y, &first.format("%d.%m").to_string(), AXIS_COLOR);
    let last_label = last.format("%d.%m").to_string();
    draw_text(img, plot_right() - text_width(&last_label), y, &last_label, AXIS_COLOR);
}

const GLYPH_SCALE: i64 = 2;
const GLYPH_HEIGHT: i64 = 5 * GLYPH_SCALE;
const GLYPH_ADVANCE: i64 = 4 * GLYPH_SCALE;

/// 3×5 bitmap rows, most significant of the low three bits is the left column
fn glyph(c: char) -> Option<[u8; 5]> {
    Some(match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        _ => return None,
    })
}

fn text_width(text: &str) -> i64 {
    let chars = text.chars().count() as i64;
    (chars * GLYPH_ADVANCE - GLYPH_SCALE).max(0)
}

/// Draw digits and dots with the top-left corner at `(x, y)`
fn draw_text(img: &mut RgbImage, x: i64, y: i64, text: &str, color: Rgb<u8>) {
    for (i, c) in text.chars().enumerate() {
        let Some(rows) = glyph(c) else { continue };
        let origin_x = x + i as i64 * GLYPH_ADVANCE;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..3 {
                if bits & (0b100 >> col) == 0 {
                    continue;
                }
                for dy in 0..GLYPH_SCALE {
                    for dx in 0..GLYPH_SCALE {
                        put(
                            img,
                            origin_x + col * GLYPH_SCALE + dx,
                            y + row as i64 * GLYPH_SCALE + dy,
                            color,
                        );
                    }
                }
            }
        }
    }
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && x < i64::from(img.width()) && y < i64::from(img.height()) {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Bresenham line
fn draw_line(img: &mut RgbImage, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
    let (mut x0, mut y0) = from;
    let (x1, y1) = to;
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        put(img, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn draw_marker(img: &mut RgbImage, cx: i64, cy: i64, color: Rgb<u8>) {
    for dy in -MARKER_RADIUS..=MARKER_RADIUS {
        for dx in -MARKER_RADIUS..=MARKER_RADIUS {
            if dx * dx + dy * dy <= MARKER_RADIUS * MARKER_RADIUS {
                put(img, cx + dx, cy + dy, color);
            }
        }
    }
}
