//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed prices: `o`
//! - overlay line (e.g. a moving average): `-`

use chrono::NaiveDate;

use crate::domain::PricePoint;

/// Render observed prices with an optional overlay line, x axis = calendar days.
pub fn render_price_plot(observed: &[PricePoint], overlay: &[PricePoint], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some((d_min, d_max)) = date_range(observed.iter().chain(overlay)) else {
        return "Plot: no data\n".to_string();
    };
    let x_max = ((d_max - d_min).num_days() as f64).max(1.0);

    let (y_min, y_max) = y_range(observed.iter().chain(overlay));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let to_xy = |p: &PricePoint| ((p.date - d_min).num_days() as f64, p.price);

    let mut grid = vec![vec![' '; width]; height];

    // Draw the overlay first so observations can sit on top of it.
    let line: Vec<(f64, f64)> = overlay.iter().map(to_xy).collect();
    draw_curve(&mut grid, &line, x_max, y_min, y_max);

    for p in observed {
        let (x, y) = to_xy(p);
        let col = map_x(x, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][col] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {d_min} -> {d_max} | price=[{y_min:.2}, {y_max:.2}]\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn date_range<'a>(points: impl Iterator<Item = &'a PricePoint>) -> Option<(NaiveDate, NaiveDate)> {
    points.fold(None, |acc, p| match acc {
        None => Some((p.date, p.date)),
        Some((lo, hi)) => Some((lo.min(p.date), hi.max(p.date))),
    })
}

fn y_range<'a>(points: impl Iterator<Item = &'a PricePoint>) -> (f64, f64) {
    let (min_y, max_y) = points.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.price), hi.max(p.price))
    });
    if !(min_y.is_finite() && max_y.is_finite()) {
        return (0.0, 1.0);
    }
    if max_y > min_y {
        (min_y, max_y)
    } else {
        (min_y - 1.0, max_y + 1.0)
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_max: f64, width: usize) -> usize {
    let u = (x / x_max).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_max: f64, y_min: f64, y_max: f64) {
    let height = grid.len();
    let width = grid.first().map(Vec::len).unwrap_or(0);
    if curve.is_empty() || width == 0 {
        return;
    }

    let mut prev = None;
    for &(x, y) in curve {
        let col = map_x(x, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        match prev {
            Some((c0, r0)) => draw_line(grid, c0, r0, col, row, '-'),
            None => grid[row][col] = '-',
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

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
