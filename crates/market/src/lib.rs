//! # Market Transform
//!
//! 行情数据到周度特征的转换。
//!
//! ## 主要模块
//!
//! - `preprocessing`: 对数收益率、滑动波动率、涨跌方向
//! - `indicators`: RSI(14) 与 MACD 信号
//! - `timeseries`: 特征表与滞后标签切分
//! - `types`: 行情序列与错误类型

pub mod indicators;
pub mod preprocessing;
pub mod timeseries;
pub mod types;

pub use indicators::{IndicatorSeries, TechnicalIndicators, INDICATOR_WARMUP};
pub use preprocessing::{FeatureEngine, DEFAULT_VOLATILITY_WINDOW};
pub use timeseries::FeatureTable;
pub use types::{
    DatedSeries, MarketError, MarketResult, PriceBar, PriceSeries, ReturnSeries,
    VolatilitySeries, VolatilitySpan,
};
