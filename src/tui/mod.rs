//! Ratatui-based terminal dashboard.
//!
//! Header with statistics, forecast and trend; a 2x2 grid of charts (yearly
//! comparison, monthly peaks, recent prices, and a selectable panel showing
//! either the 7-day moving average or the price histogram).

use std::io;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};
use tracing::warn;

use crate::app::pipeline::{DashboardData, run_dashboard};
use crate::data::Loaders;
use crate::domain::{DashboardConfig, PricePoint, SHORT_MA_WINDOW};
use crate::error::AppError;

mod plotters_chart;

use plotters_chart::{ChartSeries, PriceChart, padded_bounds};

/// Start the TUI.
pub fn run(config: DashboardConfig, loaders: Loaders) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::output(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(config, loaders);
    app.reload();
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::output(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::output(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Content of the selectable bottom-right panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Panel {
    MovingAverage,
    Histogram,
}

impl Panel {
    fn toggle(self) -> Self {
        match self {
            Panel::MovingAverage => Panel::Histogram,
            Panel::Histogram => Panel::MovingAverage,
        }
    }

    fn title(self) -> &'static str {
        match self {
            Panel::MovingAverage => "7-day moving average",
            Panel::Histogram => "Price distribution histogram",
        }
    }
}

struct App {
    config: DashboardConfig,
    loaders: Loaders,
    data: Option<DashboardData>,
    panel: Panel,
    status: String,
}

impl App {
    fn new(config: DashboardConfig, loaders: Loaders) -> Self {
        Self {
            config,
            loaders,
            data: None,
            panel: Panel::MovingAverage,
            status: "Loading...".to_string(),
        }
    }

    /// Re-run the pipeline. Loaders are memoized, so this only re-fetches
    /// after `clear()`. On failure the previous data stays on screen.
    fn reload(&mut self) {
        match run_dashboard(&self.loaders, &self.config) {
            Ok(data) => {
                self.status = format!(
                    "{} observations since {}",
                    data.series.len(),
                    data.window.start
                );
                self.data = Some(data);
            }
            Err(err) => {
                warn!(error = %err, "dashboard run failed");
                self.status = err.to_string();
            }
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::output(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::output(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::output(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('v') | KeyCode::Tab => {
                self.panel = self.panel.toggle();
                self.status = format!("panel: {}", self.panel.title());
            }
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('R') => {
                self.loaders.clear();
                self.reload();
            }
            _ => {}
        }
        false
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("brent", Style::default().fg(Color::Cyan)),
            Span::raw(" | Brent crude price dashboard"),
        ]));

        if let Some(data) = &self.data {
            let s = &data.statistics;
            let std = s.std_dev.map(|v| format!("{v:.2}")).unwrap_or_else(|| "n/a".to_string());
            lines.push(Line::from(Span::styled(
                format!(
                    "n={} | max={:.2} | min={:.2} | mean={:.2} | std={std}",
                    s.count, s.max, s.min, s.mean
                ),
                Style::default().fg(Color::Gray),
            )));

            let trend_color = match data.trend {
                crate::domain::Trend::Rising => Color::Green,
                crate::domain::Trend::Falling => Color::Red,
            };
            lines.push(Line::from(vec![
                Span::styled(
                    format!(
                        "today {} = {:.2} | tomorrow {} = {:.2} | ",
                        data.forecast.today.date,
                        data.forecast.today.value,
                        data.forecast.tomorrow.date,
                        data.forecast.tomorrow.value
                    ),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(crate::report::trend_label(data.trend), Style::default().fg(trend_color)),
            ]));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);
        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[0]);
        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);

        let Some(data) = &self.data else {
            let msg = Paragraph::new("Waiting for data...")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(msg, area);
            return;
        };

        self.draw_yearly(frame, top[0], data);
        self.draw_monthly_peaks(frame, top[1], data);
        self.draw_recent(frame, bottom[0], data);
        match self.panel {
            Panel::MovingAverage => self.draw_moving_average(frame, bottom[1], data),
            Panel::Histogram => self.draw_histogram(frame, bottom[1], data),
        }
    }

    fn draw_yearly(&self, frame: &mut ratatui::Frame<'_>, area: Rect, data: &DashboardData) {
        let inner = panel_block(frame, area, "Yearly comparison");
        let traces: Vec<(i32, Vec<(f64, f64)>)> = data
            .yearly
            .iter()
            .map(|t| (t.year, t.points.iter().map(|&(d, p)| (d as f64, p)).collect()))
            .collect();
        let Some(y_bounds) = padded_bounds(traces.iter().flat_map(|(_, pts)| pts.iter().map(|p| p.1)), 0.05) else {
            return;
        };
        let series = traces
            .iter()
            .enumerate()
            .map(|(i, (_, pts))| ChartSeries::Line {
                points: pts,
                rgb: palette(i),
            })
            .collect();
        frame.render_widget(
            PriceChart {
                series,
                x_bounds: [1.0, 366.0],
                y_bounds,
                x_label: "day of year",
                y_label: "usd",
                fmt_x: fmt_day_of_year,
                fmt_y: fmt_price,
            },
            inner,
        );

        // Legend: one colored year label per trace, on the panel's top row.
        let legend: Vec<Span> = traces
            .iter()
            .enumerate()
            .map(|(i, (year, _))| {
                let (r, g, b) = palette(i);
                Span::styled(format!("{year} "), Style::default().fg(Color::Rgb(r, g, b)))
            })
            .collect();
        if inner.height > 0 {
            let rect = Rect { height: 1, ..inner };
            frame.render_widget(Paragraph::new(Line::from(legend)), rect);
        }
    }

    fn draw_monthly_peaks(&self, frame: &mut ratatui::Frame<'_>, area: Rect, data: &DashboardData) {
        let inner = panel_block(frame, area, "Monthly peaks");
        let bars: Vec<(f64, f64, f64)> = data
            .monthly_peaks
            .iter()
            .map(|m| (m.month as f64 - 0.4, m.month as f64 + 0.4, m.max))
            .collect();
        let max = bars.iter().map(|b| b.2).fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return;
        }
        frame.render_widget(
            PriceChart {
                series: vec![ChartSeries::Bars { bars: &bars, rgb: (0, 200, 255) }],
                x_bounds: [0.5, 12.5],
                y_bounds: [0.0, max * 1.1],
                x_label: "month",
                y_label: "usd",
                fmt_x: fmt_month,
                fmt_y: fmt_price,
            },
            inner,
        );
    }

    fn draw_recent(&self, frame: &mut ratatui::Frame<'_>, area: Rect, data: &DashboardData) {
        let title = format!("Last {} observations", data.recent.len());
        let inner = panel_block(frame, area, &title);
        let points = date_points(&data.recent);
        draw_date_lines(frame, inner, &[(points.as_slice(), (255, 255, 255))]);
    }

    fn draw_moving_average(&self, frame: &mut ratatui::Frame<'_>, area: Rect, data: &DashboardData) {
        let title = format!("{} ({} days)", Panel::MovingAverage.title(), SHORT_MA_WINDOW);
        let inner = panel_block(frame, area, &title);
        let prices = date_points(data.series.points());
        let ma = date_points(&data.ma_short);
        draw_date_lines(
            frame,
            inner,
            &[(prices.as_slice(), (128, 128, 128)), (ma.as_slice(), (0, 255, 255))],
        );
    }

    fn draw_histogram(&self, frame: &mut ratatui::Frame<'_>, area: Rect, data: &DashboardData) {
        let inner = panel_block(frame, area, Panel::Histogram.title());
        let bars: Vec<(f64, f64, f64)> = data
            .histogram
            .iter()
            .map(|b| (b.lower, b.upper, b.count as f64))
            .collect();
        let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
            return;
        };
        let x_bounds = if last.1 > first.0 {
            [first.0, last.1]
        } else {
            [first.0 - 1.0, last.1 + 1.0]
        };
        let max = bars.iter().map(|b| b.2).fold(0.0, f64::max).max(1.0);
        frame.render_widget(
            PriceChart {
                series: vec![ChartSeries::Bars { bars: &bars, rgb: (255, 165, 0) }],
                x_bounds,
                y_bounds: [0.0, max * 1.1],
                x_label: "usd",
                y_label: "count",
                fmt_x: fmt_price,
                fmt_y: fmt_count,
            },
            inner,
        );
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "v/Tab switch panel  r rerun  R refetch  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Draw a bordered, cleared panel and return its inner area.
fn panel_block(frame: &mut ratatui::Frame<'_>, area: Rect, title: &str) -> Rect {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Clear, inner);
    inner
}

/// Line chart with a calendar-date x axis.
fn draw_date_lines(frame: &mut ratatui::Frame<'_>, area: Rect, lines: &[(&[(f64, f64)], (u8, u8, u8))]) {
    let all = || lines.iter().flat_map(|(pts, _)| pts.iter());
    let (Some(x_bounds), Some(y_bounds)) = (
        padded_bounds(all().map(|p| p.0), 0.0),
        padded_bounds(all().map(|p| p.1), 0.05),
    ) else {
        return;
    };
    let series = lines
        .iter()
        .map(|&(points, rgb)| ChartSeries::Line { points, rgb })
        .collect();
    frame.render_widget(
        PriceChart {
            series,
            x_bounds,
            y_bounds,
            x_label: "date",
            y_label: "usd",
            fmt_x: fmt_date,
            fmt_y: fmt_price,
        },
        area,
    );
}

/// Dates become days since 0001-01-01 so Plotters can use an f64 axis.
fn date_points(points: &[PricePoint]) -> Vec<(f64, f64)> {
    points
        .iter()
        .map(|p| (p.date.num_days_from_ce() as f64, p.price))
        .collect()
}

fn palette(i: usize) -> (u8, u8, u8) {
    const COLORS: [(u8, u8, u8); 6] = [
        (0, 255, 255),
        (255, 165, 0),
        (0, 255, 0),
        (255, 0, 255),
        (255, 255, 0),
        (255, 0, 0),
    ];
    COLORS[i % COLORS.len()]
}

fn fmt_date(v: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(v.round() as i32)
        .map(|d| d.format("%m-%d").to_string())
        .unwrap_or_default()
}

fn fmt_day_of_year(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_month(v: f64) -> String {
    let m = v.round();
    if (1.0..=12.0).contains(&m) && (v - m).abs() < 0.25 {
        crate::report::month_name(m as u32).to_string()
    } else {
        String::new()
    }
}

fn fmt_price(v: f64) -> String {
    format!("{v:.1}")
}

fn fmt_count(v: f64) -> String {
    format!("{v:.0}")
}
