//! Golden/dead cross backtest over a daily series.
//!
//! BacktestConfig defines the date range and moving-average windows.
//! Signal = 1 where short MA > long MA, else 0; points where either MA is
//! still warming up carry no signal. A golden cross is a 0 -> 1 change
//! between consecutive signalled points, a dead cross is 1 -> 0.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::error::SimError;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::domain::strategy::WindowPair;

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub windows: WindowPair,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossKind {
    Golden,
    Dead,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossEvent {
    pub date: NaiveDate,
    pub kind: CrossKind,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub buy_date: NaiveDate,
    pub sell_date: NaiveDate,
    pub buy_price: f64,
    pub sell_price: f64,
    pub roi_pct: f64,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub symbol: String,
    pub windows: WindowPair,
    pub prices: Vec<PricePoint>,
    pub short_ma: IndicatorSeries,
    pub long_ma: IndicatorSeries,
    pub events: Vec<CrossEvent>,
    pub trades: Vec<Trade>,
    /// Mean ROI in percent; `None` when no trade completed.
    pub average_roi: Option<f64>,
}

impl BacktestResult {
    pub fn golden_crosses(&self) -> impl Iterator<Item = &CrossEvent> {
        self.events.iter().filter(|e| e.kind == CrossKind::Golden)
    }

    pub fn dead_crosses(&self) -> impl Iterator<Item = &CrossEvent> {
        self.events.iter().filter(|e| e.kind == CrossKind::Dead)
    }
}

pub fn run_backtest(series: &PriceSeries, config: &BacktestConfig) -> Result<BacktestResult, SimError> {
    let cleaned = clean_daily(series);
    if cleaned.is_empty() {
        return Err(SimError::DataUnavailable {
            symbol: series.symbol.clone(),
            start: config.start_date,
            end: config.end_date,
        });
    }

    let short_ma = calculate_sma(&cleaned.points, config.windows.short());
    let long_ma = calculate_sma(&cleaned.points, config.windows.long());
    let events = detect_events(&cleaned.points, &short_ma, &long_ma);

    let buys: Vec<NaiveDate> = events
        .iter()
        .filter(|e| e.kind == CrossKind::Golden)
        .map(|e| e.date)
        .collect();
    let sells: Vec<NaiveDate> = events
        .iter()
        .filter(|e| e.kind == CrossKind::Dead)
        .map(|e| e.date)
        .collect();

    let trades: Vec<Trade> = pair_trades(&buys, &sells)
        .into_iter()
        .filter_map(|(buy_date, sell_date)| {
            let buy_price = cleaned.price_on(buy_date)?;
            let sell_price = cleaned.price_on(sell_date)?;
            Some(Trade {
                buy_date,
                sell_date,
                buy_price,
                sell_price,
                roi_pct: roi_pct(buy_price, sell_price),
            })
        })
        .collect();

    let average_roi = average(trades.iter().map(|t| t.roi_pct));

    Ok(BacktestResult {
        symbol: series.symbol.clone(),
        windows: config.windows,
        prices: cleaned.points,
        short_ma,
        long_ma,
        events,
        trades,
        average_roi,
    })
}

/// Signal per point: `Some(true)` when short > long, `Some(false)` otherwise,
/// `None` while either average is warming up.
pub fn crossover_signals(short_ma: &IndicatorSeries, long_ma: &IndicatorSeries) -> Vec<Option<bool>> {
    (0..short_ma.len().min(long_ma.len()))
        .map(|i| match (short_ma.value_at(i), long_ma.value_at(i)) {
            (Some(s), Some(l)) => Some(s > l),
            _ => None,
        })
        .collect()
}

pub fn detect_events(
    prices: &[PricePoint],
    short_ma: &IndicatorSeries,
    long_ma: &IndicatorSeries,
) -> Vec<CrossEvent> {
    let mut events = Vec::new();
    let mut previous: Option<bool> = None;

    for (point, signal) in prices.iter().zip(crossover_signals(short_ma, long_ma)) {
        let Some(current) = signal else {
            continue;
        };
        let kind = match (previous, current) {
            (Some(false), true) => Some(CrossKind::Golden),
            (Some(true), false) => Some(CrossKind::Dead),
            _ => None,
        };
        if let Some(kind) = kind {
            events.push(CrossEvent {
                date: point.date,
                kind,
                price: point.price,
            });
        }
        previous = Some(current);
    }

    events
}

/// Pairs each buy with the earliest unused sell strictly after it.
///
/// Both slices must be ascending. A consumed sell and every sell before it
/// are no longer eligible; pairing stops at the first buy with no later sell.
pub fn pair_trades<T: PartialOrd + Copy>(buys: &[T], sells: &[T]) -> Vec<(T, T)> {
    let mut pairs = Vec::new();
    let mut next_sell = 0;

    for &buy in buys {
        while next_sell < sells.len() && sells[next_sell] <= buy {
            next_sell += 1;
        }
        let Some(&sell) = sells.get(next_sell) else {
            break;
        };
        pairs.push((buy, sell));
        next_sell += 1;
    }

    pairs
}

/// (sell - buy) / buy * 100
pub fn roi_pct(buy_price: f64, sell_price: f64) -> f64 {
    (sell_price - buy_price) / buy_price * 100.0
}

fn average(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Usable points sorted by date, first observation per date.
fn clean_daily(series: &PriceSeries) -> PriceSeries {
    let mut points: Vec<PricePoint> = series
        .points
        .iter()
        .copied()
        .filter(|p| p.is_usable())
        .collect();
    points.sort_by_key(|p| p.date);
    points.dedup_by_key(|p| p.date);
    PriceSeries::new(series.symbol.clone(), points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::Duration;

    fn day(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, 1).unwrap() + Duration::days(i as i64)
    }

    fn make_series(prices: &[f64]) -> PriceSeries {
        PriceSeries::new(
            "TEST",
            prices
                .iter()
                .enumerate()
                .map(|(i, &price)| PricePoint {
                    date: day(i),
                    price,
                })
                .collect(),
        )
    }

    fn config(short: usize, long: usize) -> BacktestConfig {
        BacktestConfig {
            start_date: day(0),
            end_date: day(365),
            windows: WindowPair::new(short, long).unwrap(),
        }
    }

    #[test]
    fn pairs_golden_with_next_dead() {
        let pairs = pair_trades(&[1, 5, 9], &[3, 7]);
        assert_eq!(pairs, vec![(1, 3), (5, 7)]);
    }

    #[test]
    fn pairing_skips_dead_events_before_first_buy() {
        let pairs = pair_trades(&[4, 8], &[2, 6, 10]);
        assert_eq!(pairs, vec![(4, 6), (8, 10)]);
    }

    #[test]
    fn pairing_never_reuses_a_sell() {
        // both buys precede the only sell: the second buy has nothing left
        let pairs = pair_trades(&[1, 2], &[5]);
        assert_eq!(pairs, vec![(1, 5)]);
    }

    #[test]
    fn pairing_requires_sell_strictly_after_buy() {
        let pairs = pair_trades(&[3], &[3]);
        assert!(pairs.is_empty());
    }

    #[test]
    fn pairing_with_no_buys_is_empty() {
        let pairs: Vec<(i32, i32)> = pair_trades(&[], &[1, 2]);
        assert!(pairs.is_empty());
    }

    #[test]
    fn roi_is_percentage() {
        assert_abs_diff_eq!(roi_pct(100.0, 110.0), 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(roi_pct(200.0, 150.0), -25.0, epsilon = 1e-12);
    }

    #[test]
    fn first_defined_signal_is_not_an_event() {
        // short=1, long=2: first defined point already has short > long
        let series = make_series(&[10.0, 11.0, 12.0]);
        let result = run_backtest(&series, &config(1, 2)).unwrap();
        assert!(result.events.is_empty());
        assert!(result.trades.is_empty());
        assert_eq!(result.average_roi, None);
    }

    #[test]
    fn detects_golden_and_dead_crosses() {
        // short=1, long=2: signal = price rose vs previous point
        // 10 12 | 11 | 13 14 | 9
        // signals from i=1: T F T T F
        let series = make_series(&[10.0, 12.0, 11.0, 13.0, 14.0, 9.0]);
        let result = run_backtest(&series, &config(1, 2)).unwrap();

        let events: Vec<_> = result.events.iter().map(|e| (e.date, e.kind)).collect();
        assert_eq!(
            events,
            vec![
                (day(2), CrossKind::Dead),
                (day(3), CrossKind::Golden),
                (day(5), CrossKind::Dead),
            ]
        );
        assert_eq!(result.golden_crosses().count(), 1);
        assert_eq!(result.dead_crosses().count(), 2);
    }

    #[test]
    fn computes_trade_roi_and_average() {
        let series = make_series(&[10.0, 12.0, 11.0, 13.0, 14.0, 9.0, 10.0, 8.0]);
        let result = run_backtest(&series, &config(1, 2)).unwrap();

        // golden day3 @13 -> dead day5 @9 ; golden day6 @10 -> dead day7 @8
        assert_eq!(result.trades.len(), 2);
        let t0 = &result.trades[0];
        assert_eq!((t0.buy_date, t0.sell_date), (day(3), day(5)));
        assert_abs_diff_eq!(t0.roi_pct, (9.0 - 13.0) / 13.0 * 100.0, epsilon = 1e-9);
        let t1 = &result.trades[1];
        assert_eq!((t1.buy_date, t1.sell_date), (day(6), day(7)));
        assert_abs_diff_eq!(t1.roi_pct, -20.0, epsilon = 1e-9);

        let expected = (t0.roi_pct + t1.roi_pct) / 2.0;
        assert_abs_diff_eq!(result.average_roi.unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn open_position_is_not_force_closed() {
        // dead day2, golden day3, never sold
        let series = make_series(&[10.0, 12.0, 11.0, 13.0, 14.0]);
        let result = run_backtest(&series, &config(1, 2)).unwrap();
        assert_eq!(result.golden_crosses().count(), 1);
        assert!(result.trades.is_empty());
        assert_eq!(result.average_roi, None);
    }

    #[test]
    fn window_longer_than_series_yields_no_events() {
        let series = make_series(&[10.0, 12.0, 11.0]);
        let result = run_backtest(&series, &config(2, 5)).unwrap();
        assert!(result.events.is_empty());
        assert_eq!(result.short_ma.len(), 3);
    }

    #[test]
    fn empty_series_is_data_unavailable() {
        let err = run_backtest(&make_series(&[]), &config(1, 2)).unwrap_err();
        assert!(matches!(err, SimError::DataUnavailable { .. }));
    }

    #[test]
    fn unsorted_and_duplicate_days_are_cleaned() {
        let mut series = make_series(&[10.0, 12.0, 11.0]);
        series.points.reverse();
        series.points.push(PricePoint {
            date: day(1),
            price: 99.0,
        });
        let result = run_backtest(&series, &config(1, 2)).unwrap();
        let dates: Vec<_> = result.prices.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(0), day(1), day(2)]);
    }
}
