//! 收益率、波动率与涨跌方向

use crate::types::{
    DatedSeries, MarketError, MarketResult, PriceSeries, ReturnSeries, VolatilitySeries,
    VolatilitySpan,
};
use ndarray::ArrayView1;

/// 年化使用的周期数
pub const ANNUALIZATION_PERIODS: f64 = 252.0;

/// 默认波动率窗口
pub const DEFAULT_VOLATILITY_WINDOW: usize = 5;

/// 特征工程器
pub struct FeatureEngine;

impl FeatureEngine {
    /// 对数收益率: ln(open[i+1]) - ln(open[i])，日期取较晚一期
    pub fn log_return(series: &PriceSeries) -> MarketResult<ReturnSeries> {
        Self::period_returns(series, "log_return", |head, tail| tail.ln() - head.ln())
    }

    /// 简单收益率: (open[i+1] - open[i]) / open[i]
    pub fn simple_return(series: &PriceSeries) -> MarketResult<ReturnSeries> {
        Self::period_returns(series, "simple_return", |head, tail| (tail - head) / head)
    }

    fn period_returns(
        series: &PriceSeries,
        context: &str,
        f: impl Fn(f64, f64) -> f64,
    ) -> MarketResult<ReturnSeries> {
        if series.len() < 2 {
            return Err(MarketError::insufficient(context, 2, series.len()));
        }

        let bars = series.bars();
        let dates = bars[1..].iter().map(|b| b.date).collect();
        let values = bars.windows(2).map(|w| f(w[0].open, w[1].open)).collect();

        DatedSeries::new(dates, values)
    }

    /// 滑动窗口波动率
    ///
    /// 第 i 个输出使用 `returns[i..i + span.samples(window)]` 的总体标准差，
    /// 除以 sqrt(window / 252)，日期为 `returns.dates[i + window]`。
    /// 输出长度为 `returns.len() - window`。
    pub fn volatility(
        returns: &ReturnSeries,
        window: usize,
        span: VolatilitySpan,
    ) -> MarketResult<VolatilitySeries> {
        let samples = span.samples(window);
        if window == 0 || samples == 0 {
            return Err(MarketError::InvalidWindow(window));
        }
        if returns.len() <= window {
            return Err(MarketError::insufficient("volatility", window + 1, returns.len()));
        }

        let scale = (window as f64 / ANNUALIZATION_PERIODS).sqrt();
        let n_out = returns.len() - window;

        let values = (0..n_out)
            .map(|i| {
                let slice = ArrayView1::from(&returns.values[i..i + samples]);
                slice.std(0.0) / scale
            })
            .collect();
        let dates = returns.dates[window..].to_vec();

        DatedSeries::new(dates, values)
    }

    /// 涨跌方向: 收益率 >= 0 为 1，否则为 0
    pub fn direction(returns: &ReturnSeries) -> Vec<u8> {
        returns
            .values
            .iter()
            .map(|&r| if r >= 0.0 { 1 } else { 0 })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PriceBar;
    use chrono::{Duration, NaiveDate};

    fn prices(opens: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2016, 1, 4).unwrap();
        let bars = opens
            .iter()
            .enumerate()
            .map(|(i, &open)| PriceBar {
                date: start + Duration::weeks(i as i64),
                open,
                high: open + 1.0,
                low: open - 1.0,
                close: open,
                volume: 1000.0,
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    fn population_std(xs: &[f64]) -> f64 {
        let mean = xs.iter().sum::<f64>() / xs.len() as f64;
        (xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / xs.len() as f64).sqrt()
    }

    #[test]
    fn test_log_return() {
        let series = prices(&[100.0, 110.0, 99.0, 99.0]);
        let returns = FeatureEngine::log_return(&series).unwrap();

        assert_eq!(returns.len(), 3);
        assert_eq!(returns.values[0], 110.0_f64.ln() - 100.0_f64.ln());
        assert_eq!(returns.values[1], 99.0_f64.ln() - 110.0_f64.ln());
        assert_eq!(returns.values[2], 0.0);
        // 日期取较晚一期
        assert_eq!(returns.dates, series.dates()[1..].to_vec());
    }

    #[test]
    fn test_log_return_needs_two_rows() {
        let err = FeatureEngine::log_return(&prices(&[100.0])).unwrap_err();
        assert!(matches!(err, MarketError::InsufficientData { required: 2, actual: 1, .. }));
        assert!(FeatureEngine::log_return(&prices(&[])).is_err());
    }

    #[test]
    fn test_simple_return() {
        let returns = FeatureEngine::simple_return(&prices(&[100.0, 110.0, 99.0])).unwrap();
        assert!((returns.values[0] - 0.1).abs() < 1e-12);
        assert!((returns.values[1] + 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_volatility_length_and_dates() {
        let series = prices(&[10.0, 11.0, 10.5, 12.0, 11.0, 11.5, 13.0, 12.5, 12.0, 14.0]);
        let returns = FeatureEngine::log_return(&series).unwrap();

        for window in 2..returns.len() {
            let vol = FeatureEngine::volatility(&returns, window, VolatilitySpan::Legacy).unwrap();
            assert_eq!(vol.len(), returns.len() - window);
            assert_eq!(vol.dates, returns.dates[window..].to_vec());
        }
    }

    #[test]
    fn test_volatility_legacy_uses_window_minus_one_samples() {
        let series = prices(&[10.0, 11.0, 10.5, 12.0, 11.0, 11.5, 13.0, 12.5]);
        let returns = FeatureEngine::log_return(&series).unwrap();
        let scale = (5.0_f64 / 252.0).sqrt();

        let legacy = FeatureEngine::volatility(&returns, 5, VolatilitySpan::Legacy).unwrap();
        let full = FeatureEngine::volatility(&returns, 5, VolatilitySpan::Full).unwrap();

        for i in 0..legacy.len() {
            let expected_legacy = population_std(&returns.values[i..i + 4]) / scale;
            let expected_full = population_std(&returns.values[i..i + 5]) / scale;
            assert!((legacy.values[i] - expected_legacy).abs() < 1e-12);
            assert!((full.values[i] - expected_full).abs() < 1e-12);
        }
        assert_eq!(legacy.dates, full.dates);
    }

    #[test]
    fn test_volatility_rejects_short_series_and_bad_window() {
        let returns = FeatureEngine::log_return(&prices(&[10.0, 11.0, 12.0, 13.0])).unwrap();

        assert!(matches!(
            FeatureEngine::volatility(&returns, 3, VolatilitySpan::Legacy),
            Err(MarketError::InsufficientData { .. })
        ));
        assert!(matches!(
            FeatureEngine::volatility(&returns, 0, VolatilitySpan::Full),
            Err(MarketError::InvalidWindow(0))
        ));
        assert!(matches!(
            FeatureEngine::volatility(&returns, 1, VolatilitySpan::Legacy),
            Err(MarketError::InvalidWindow(1))
        ));
        assert_eq!(
            FeatureEngine::volatility(&returns, 1, VolatilitySpan::Full).unwrap().len(),
            2
        );
    }

    #[test]
    fn test_direction_boundary() {
        let returns = DatedSeries::new(
            vec![
                NaiveDate::from_ymd_opt(2020, 1, 6).unwrap(),
                NaiveDate::from_ymd_opt(2020, 1, 13).unwrap(),
                NaiveDate::from_ymd_opt(2020, 1, 20).unwrap(),
                NaiveDate::from_ymd_opt(2020, 1, 27).unwrap(),
            ],
            vec![0.01, 0.0, -0.0001, -0.0],
        )
        .unwrap();

        assert_eq!(FeatureEngine::direction(&returns), vec![1, 1, 0, 1]);
    }
}
