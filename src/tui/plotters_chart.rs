//! Plotters-powered chart widget for Ratatui.
//!
//! Every dashboard panel (yearly comparison, monthly peaks, recent prices,
//! moving average, histogram) is one `PriceChart` with different series.
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// One drawable series.
pub enum ChartSeries<'a> {
    /// Connected line through `(x, y)` points.
    Line { points: &'a [(f64, f64)], rgb: (u8, u8, u8) },
    /// Vertical bars from y=0, `(x_left, x_right, height)`.
    Bars { bars: &'a [(f64, f64, f64)], rgb: (u8, u8, u8) },
}

/// A render-only chart description.
///
/// All series and bounds are computed outside the render call, so `render()`
/// only draws.
pub struct PriceChart<'a> {
    pub series: Vec<ChartSeries<'a>>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for PriceChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to build a chart in a tiny area; show a hint instead.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let x0 = self.x_bounds[0];
        let x1 = self.x_bounds[1];
        let y0 = self.y_bounds[0];
        let y1 = self.y_bounds[1];

        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Mesh lines are noise at terminal resolution.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            for series in &self.series {
                match series {
                    ChartSeries::Line { points, rgb } => {
                        let color = RGBColor(rgb.0, rgb.1, rgb.2);
                        chart.draw_series(LineSeries::new(points.iter().copied(), &color))?;
                    }
                    ChartSeries::Bars { bars, rgb } => {
                        let style = ShapeStyle::from(&RGBColor(rgb.0, rgb.1, rgb.2)).filled();
                        // Bars start at the axis floor when it is above zero.
                        let base = y0.max(0.0);
                        chart.draw_series(
                            bars.iter()
                                .map(|&(left, right, h)| Rectangle::new([(left, base), (right, h)], style)),
                        )?;
                    }
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// Widen a `[min, max]` range so a flat series still gets a visible span.
pub fn padded_bounds(values: impl Iterator<Item = f64>, frac: f64) -> Option<[f64; 2]> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !(lo.is_finite() && hi.is_finite()) {
        return None;
    }
    if hi > lo {
        let pad = (hi - lo) * frac;
        Some([lo - pad, hi + pad])
    } else {
        Some([lo - 1.0, hi + 1.0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_bounds_widen_flat_series() {
        assert_eq!(padded_bounds([5.0, 5.0].into_iter(), 0.1), Some([4.0, 6.0]));
        assert_eq!(padded_bounds(std::iter::empty(), 0.1), None);
        let [lo, hi] = padded_bounds([0.0, 10.0].into_iter(), 0.1).unwrap();
        assert!((lo + 1.0).abs() < 1e-12 && (hi - 11.0).abs() < 1e-12);
    }
}
