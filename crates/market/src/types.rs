//! 核心类型定义

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type MarketResult<T> = Result<T, MarketError>;

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("数据量不足: {context} 需要至少 {required} 条, 实际 {actual} 条")]
    InsufficientData {
        context: String,
        required: usize,
        actual: usize,
    },

    #[error("无效的窗口大小: {0}")]
    InvalidWindow(usize),

    #[error("数据对齐失败: {0}")]
    Alignment(String),

    #[error("数据维度不匹配: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("无效的记录: {0}")]
    MalformedRecord(String),
}

impl MarketError {
    pub(crate) fn insufficient(context: impl Into<String>, required: usize, actual: usize) -> Self {
        MarketError::InsufficientData {
            context: context.into(),
            required,
            actual,
        }
    }
}

/// 单个周期的行情（OHLCV）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// 按日期严格递增的行情序列
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// 校验日期严格递增后构建序列
    pub fn new(bars: Vec<PriceBar>) -> MarketResult<Self> {
        if let Some(pair) = bars.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(MarketError::MalformedRecord(format!(
                "行情日期未严格递增: {} -> {}",
                pair[0].date, pair[1].date
            )));
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn opens(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.open).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

/// 带日期的数值序列，用于收益率和波动率
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatedSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl DatedSeries {
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> MarketResult<Self> {
        if dates.len() != values.len() {
            return Err(MarketError::DimensionMismatch {
                expected: dates.len(),
                actual: values.len(),
            });
        }
        Ok(Self { dates, values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    /// 保留 `start` 及之后的观测
    pub fn since(&self, start: NaiveDate) -> Self {
        let from = self.dates.partition_point(|d| *d < start);
        Self {
            dates: self.dates[from..].to_vec(),
            values: self.values[from..].to_vec(),
        }
    }
}

/// 收益率序列，日期为较晚一期的日期
pub type ReturnSeries = DatedSeries;

/// 波动率序列
pub type VolatilitySeries = DatedSeries;

/// 波动率窗口的取样方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatilitySpan {
    /// 每个窗口只取 `window - 1` 个样本，与历史数据集保持一致
    #[default]
    Legacy,
    /// 每个窗口取完整的 `window` 个样本
    Full,
}

impl VolatilitySpan {
    /// 给定窗口大小时实际参与计算的样本数
    pub fn samples(&self, window: usize) -> usize {
        match self {
            VolatilitySpan::Legacy => window.saturating_sub(1),
            VolatilitySpan::Full => window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, d).unwrap()
    }

    fn bar(d: u32) -> PriceBar {
        PriceBar {
            date: day(d),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 0.0,
        }
    }

    #[test]
    fn test_price_series_rejects_unordered_dates() {
        assert!(PriceSeries::new(vec![bar(1), bar(8)]).is_ok());
        assert!(matches!(
            PriceSeries::new(vec![bar(8), bar(1)]),
            Err(MarketError::MalformedRecord(_))
        ));
        assert!(PriceSeries::new(vec![bar(8), bar(8)]).is_err());
    }

    #[test]
    fn test_dated_series_since() {
        let series = DatedSeries::new(vec![day(1), day(8), day(15)], vec![1.0, 2.0, 3.0]).unwrap();

        let tail = series.since(day(8));
        assert_eq!(tail.dates, vec![day(8), day(15)]);
        assert_eq!(tail.values, vec![2.0, 3.0]);

        assert_eq!(series.since(day(2)).len(), 2);
        assert!(series.since(day(20)).is_empty());
    }

    #[test]
    fn test_volatility_span_samples() {
        assert_eq!(VolatilitySpan::Legacy.samples(5), 4);
        assert_eq!(VolatilitySpan::Full.samples(5), 5);
    }
}
