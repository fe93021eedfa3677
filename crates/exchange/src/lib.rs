mod helpers;
pub mod types;
pub mod yahoo;

use async_trait::async_trait;
use chrono::NaiveDate;
use market::{MarketError, PriceSeries};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use yahoo::YahooFinance;

pub type ExchangeResult<T> = Result<T, ExchangeError>;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("Failed to send request: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("{0}")]
    Serde(#[from] serde_json::Error),

    #[error("Provider returned an error for {symbol}: {message}")]
    Provider { symbol: String, message: String },

    #[error("Invalid price series for {symbol}: {source}")]
    InvalidSeries {
        symbol: String,
        #[source]
        source: MarketError,
    },

    #[error("{0}")]
    Custom(String),
}

impl From<String> for ExchangeError {
    fn from(value: String) -> Self {
        ExchangeError::Custom(value)
    }
}

/// K 线周期
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1d")]
    Day1,
    #[default]
    #[serde(rename = "1wk")]
    Week1,
    #[serde(rename = "1mo")]
    Month1,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Day1 => "1d",
            Interval::Week1 => "1wk",
            Interval::Month1 => "1mo",
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 行情数据源
#[async_trait]
pub trait PriceProvider: Send + Sync {
    fn name(&self) -> &str;

    /// 下载 `[start, end)` 区间的行情，缺失字段的行已剔除
    async fn fetch_price_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> ExchangeResult<PriceSeries>;
}
