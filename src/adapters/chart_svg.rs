//! SVG rendering of a crossover backtest.
//!
//! Close line, both moving averages, golden crosses as green up-triangles and
//! dead crosses as red down-triangles.

use crate::domain::backtest::{BacktestResult, CrossKind};
use crate::domain::indicator::IndicatorSeries;

const CHART_WIDTH: f64 = 900.0;
const CHART_HEIGHT: f64 = 360.0;
const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 40.0;
const MARKER_SIZE: f64 = 6.0;

const CLOSE_COLOR: &str = "#64748b";
const SHORT_COLOR: &str = "#f59e0b";
const LONG_COLOR: &str = "#7c3aed";
const GOLDEN_COLOR: &str = "#16a34a";
const DEAD_COLOR: &str = "#dc2626";

struct Scale {
    min: f64,
    range: f64,
    count: usize,
}

impl Scale {
    fn x(&self, i: usize) -> f64 {
        let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        MARGIN_LEFT + (i as f64 / (self.count - 1).max(1) as f64) * plot_width
    }

    fn y(&self, v: f64) -> f64 {
        let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        MARGIN_TOP + plot_height - ((v - self.min) / self.range) * plot_height
    }
}

/// Renders `result` as a standalone SVG document. Empty when there are no prices.
pub fn render_backtest_svg(result: &BacktestResult) -> String {
    let prices = &result.prices;
    if prices.is_empty() {
        return String::new();
    }

    let ma_values = [&result.short_ma, &result.long_ma]
        .into_iter()
        .flat_map(|ma| (0..ma.len()).filter_map(move |i| ma.value_at(i)));
    let (min, max) = prices
        .iter()
        .map(|p| p.price)
        .chain(ma_values)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    let scale = Scale {
        min,
        range: (max - min).max(f64::EPSILON),
        count: prices.len(),
    };

    let close_path = line_path(prices.iter().map(|p| Some(p.price)), &scale);
    let short_path = line_path(ma_path_values(&result.short_ma), &scale);
    let long_path = line_path(ma_path_values(&result.long_ma), &scale);

    let mut svg = String::new();
    svg.push_str(&format!(
        r##"<svg width="{}" height="{}" viewBox="0 0 {} {}" xmlns="http://www.w3.org/2000/svg">"##,
        CHART_WIDTH, CHART_HEIGHT, CHART_WIDTH, CHART_HEIGHT
    ));
    svg.push_str("\n  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"18\" font-size=\"14\" fill=\"#111\">{} with MA{} / MA{}</text>\n",
        MARGIN_LEFT,
        escape(&result.symbol),
        result.windows.short(),
        result.windows.long()
    ));
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        MARGIN_TOP,
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM
    ));
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM,
        CHART_WIDTH - MARGIN_RIGHT,
        CHART_HEIGHT - MARGIN_BOTTOM
    ));
    for value in [max, (max + min) / 2.0, min] {
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{:.2}</text>\n",
            MARGIN_LEFT - 5.0,
            scale.y(value) + 3.0,
            value
        ));
    }

    let first = prices[0].date;
    let mid = prices[prices.len() / 2].date;
    let last = prices[prices.len() - 1].date;
    for (i, date) in [(0, first), (prices.len() / 2, mid), (prices.len() - 1, last)] {
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            scale.x(i),
            CHART_HEIGHT - 10.0,
            date
        ));
    }

    for (path, color, width) in [
        (close_path, CLOSE_COLOR, 1.5),
        (short_path, SHORT_COLOR, 1.5),
        (long_path, LONG_COLOR, 1.5),
    ] {
        if !path.is_empty() {
            svg.push_str(&format!(
                "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"/>\n",
                path, color, width
            ));
        }
    }

    for event in &result.events {
        let Ok(i) = prices.binary_search_by_key(&event.date, |p| p.date) else {
            continue;
        };
        let (x, y) = (scale.x(i), scale.y(event.price));
        let (points, color) = match event.kind {
            CrossKind::Golden => (
                format!(
                    "{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}",
                    x,
                    y - MARKER_SIZE,
                    x - MARKER_SIZE,
                    y + MARKER_SIZE,
                    x + MARKER_SIZE,
                    y + MARKER_SIZE
                ),
                GOLDEN_COLOR,
            ),
            CrossKind::Dead => (
                format!(
                    "{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}",
                    x,
                    y + MARKER_SIZE,
                    x - MARKER_SIZE,
                    y - MARKER_SIZE,
                    x + MARKER_SIZE,
                    y - MARKER_SIZE
                ),
                DEAD_COLOR,
            ),
        };
        svg.push_str(&format!(
            "  <polygon class=\"{}\" points=\"{}\" fill=\"{}\"/>\n",
            marker_class(event.kind),
            points,
            color
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

fn marker_class(kind: CrossKind) -> &'static str {
    match kind {
        CrossKind::Golden => "golden",
        CrossKind::Dead => "dead",
    }
}

fn ma_path_values(ma: &IndicatorSeries) -> impl Iterator<Item = Option<f64>> + '_ {
    (0..ma.len()).map(|i| ma.value_at(i))
}

/// Path through the defined values; a gap starts a new subpath.
fn line_path(values: impl Iterator<Item = Option<f64>>, scale: &Scale) -> String {
    let mut path = String::new();
    let mut pen_down = false;
    for (i, value) in values.enumerate() {
        match value {
            Some(v) => {
                let cmd = if pen_down { 'L' } else { 'M' };
                if !path.is_empty() {
                    path.push(' ');
                }
                path.push_str(&format!("{} {:.1} {:.1}", cmd, scale.x(i), scale.y(v)));
                pen_down = true;
            }
            None => pen_down = false,
        }
    }
    path
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::{BacktestConfig, run_backtest};
    use crate::domain::price::{PricePoint, PriceSeries};
    use crate::domain::strategy::WindowPair;
    use chrono::{Duration, NaiveDate};

    fn result_for(prices: &[f64]) -> BacktestResult {
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let series = PriceSeries::new(
            "TEST",
            prices
                .iter()
                .enumerate()
                .map(|(i, &p)| PricePoint::new(start + Duration::days(i as i64), p))
                .collect(),
        );
        let config = BacktestConfig {
            start_date: start,
            end_date: start + Duration::days(prices.len() as i64),
            windows: WindowPair::new(1, 2).unwrap(),
        };
        run_backtest(&series, &config).unwrap()
    }

    #[test]
    fn renders_lines_and_markers() {
        let result = result_for(&[10.0, 9.0, 11.0, 12.0, 8.0, 7.0]);
        let svg = render_backtest_svg(&result);

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<path").count(), 3);
        assert_eq!(
            svg.matches("class=\"golden\"").count(),
            result.golden_crosses().count()
        );
        assert_eq!(
            svg.matches("class=\"dead\"").count(),
            result.dead_crosses().count()
        );
        assert!(svg.contains("TEST with MA1 / MA2"));
    }

    #[test]
    fn flat_prices_render_without_nan() {
        let svg = render_backtest_svg(&result_for(&[5.0, 5.0, 5.0]));
        assert!(!svg.contains("NaN"));
    }

    #[test]
    fn line_path_breaks_on_gaps() {
        let scale = Scale {
            min: 0.0,
            range: 10.0,
            count: 4,
        };
        let path = line_path([None, Some(1.0), Some(2.0), None].into_iter(), &scale);
        assert!(path.starts_with('M'));
        assert_eq!(path.matches('M').count(), 1);
        assert_eq!(path.matches('L').count(), 1);
    }
}
