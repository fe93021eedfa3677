//! 技术指标: RSI(14) 与 MACD 信号

use crate::types::{MarketError, MarketResult, PriceSeries};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// 指标预热所需的周期数，第一条有效输出为第 `INDICATOR_WARMUP` 个周期
pub const INDICATOR_WARMUP: usize = MACD_SLOW;

/// 预热之后的指标序列
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub dates: Vec<NaiveDate>,
    pub rsi14: Vec<f64>,
    /// MACD 线高于信号线为 1，否则为 0
    pub macd_signal: Vec<u8>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    /// 保留 `start` 及之后的行
    pub fn since(&self, start: NaiveDate) -> Self {
        let from = self.dates.partition_point(|d| *d < start);
        Self {
            dates: self.dates[from..].to_vec(),
            rsi14: self.rsi14[from..].to_vec(),
            macd_signal: self.macd_signal[from..].to_vec(),
        }
    }
}

pub struct TechnicalIndicators;

impl TechnicalIndicators {
    /// 基于收盘价计算 RSI(14) 与 MACD(12, 26, 9) 信号，丢弃预热期
    pub fn compute(series: &PriceSeries) -> MarketResult<IndicatorSeries> {
        if series.len() < INDICATOR_WARMUP {
            return Err(MarketError::insufficient(
                "technical_indicators",
                INDICATOR_WARMUP,
                series.len(),
            ));
        }

        let closes = series.closes();
        let rsi = Self::rsi(&closes, RSI_PERIOD);
        let (macd, signal) = Self::macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);

        let from = INDICATOR_WARMUP - 1;
        let dates = series.dates()[from..].to_vec();
        let rsi14 = rsi[from..]
            .iter()
            .map(|v| v.unwrap_or(50.0))
            .collect();
        let macd_signal = macd[from..]
            .iter()
            .zip(&signal[from..])
            .map(|(m, s)| if m > s { 1 } else { 0 })
            .collect();

        Ok(IndicatorSeries {
            dates,
            rsi14,
            macd_signal,
        })
    }

    /// Wilder 平滑的 RSI，前 `period` 个位置为 None
    pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
        let mut out = vec![None; closes.len()];
        if period == 0 || closes.len() <= period {
            return out;
        }

        let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
        let gain = |c: f64| c.max(0.0);
        let loss = |c: f64| (-c).max(0.0);

        let mut avg_gain = changes[..period].iter().map(|&c| gain(c)).sum::<f64>() / period as f64;
        let mut avg_loss = changes[..period].iter().map(|&c| loss(c)).sum::<f64>() / period as f64;
        out[period] = Some(Self::rsi_value(avg_gain, avg_loss));

        let n = period as f64;
        for i in (period + 1)..closes.len() {
            let change = changes[i - 1];
            avg_gain = (avg_gain * (n - 1.0) + gain(change)) / n;
            avg_loss = (avg_loss * (n - 1.0) + loss(change)) / n;
            out[i] = Some(Self::rsi_value(avg_gain, avg_loss));
        }

        out
    }

    fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
        if avg_loss == 0.0 {
            if avg_gain == 0.0 {
                return 50.0;
            }
            return 100.0;
        }
        let rs = avg_gain / avg_loss;
        100.0 - (100.0 / (1.0 + rs))
    }

    /// 以首个值为种子的 EMA 序列
    pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
        let multiplier = 2.0 / (period as f64 + 1.0);
        let mut out = Vec::with_capacity(values.len());
        let mut ema = match values.first() {
            Some(&v) => v,
            None => return out,
        };

        out.push(ema);
        for &v in &values[1..] {
            ema = (v - ema) * multiplier + ema;
            out.push(ema);
        }

        out
    }

    /// 返回 (MACD 线, 信号线)
    pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> (Vec<f64>, Vec<f64>) {
        let fast_ema = Self::ema(closes, fast);
        let slow_ema = Self::ema(closes, slow);
        let line: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
        let signal_line = Self::ema(&line, signal);
        (line, signal_line)
    }
}
