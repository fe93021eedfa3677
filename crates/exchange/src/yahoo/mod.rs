use crate::helpers::{date_to_unix, unix_to_local_date};
use crate::types::yahoo::{ChartResponse, ChartResult};
use crate::{ExchangeError, ExchangeResult, Interval, PriceProvider};
use async_trait::async_trait;
use chrono::NaiveDate;
use market::{PriceBar, PriceSeries};
use tracing::{debug, info};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo Finance chart API
pub struct YahooFinance {
    client: reqwest::Client,
    base_url: String,
}

impl YahooFinance {
    pub fn new() -> ExchangeResult<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> ExchangeResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; weekly-features/0.1)")
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// 将 chart 响应转换为行情序列，任一字段缺失的行被丢弃
    pub fn parse_chart(symbol: &str, response: ChartResponse) -> ExchangeResult<PriceSeries> {
        if let Some(err) = response.chart.error {
            return Err(ExchangeError::Provider {
                symbol: symbol.to_string(),
                message: format!("{}: {}", err.code, err.description),
            });
        }

        let result = response
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| ExchangeError::Provider {
                symbol: symbol.to_string(),
                message: "empty chart result".to_string(),
            })?;

        let bars = Self::collect_bars(&result);
        let dropped = result.timestamp.len() - bars.len();
        if dropped > 0 {
            debug!("Dropped {} incomplete rows for {}", dropped, symbol);
        }

        PriceSeries::new(bars).map_err(|source| ExchangeError::InvalidSeries {
            symbol: symbol.to_string(),
            source,
        })
    }

    fn collect_bars(result: &ChartResult) -> Vec<PriceBar> {
        let Some(quote) = result.indicators.quote.first() else {
            return Vec::new();
        };
        let at = |col: &[Option<f64>], i: usize| col.get(i).copied().flatten();

        result
            .timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                Some(PriceBar {
                    date: unix_to_local_date(ts, result.meta.gmtoffset)?,
                    open: at(&quote.open, i)?,
                    high: at(&quote.high, i)?,
                    low: at(&quote.low, i)?,
                    close: at(&quote.close, i)?,
                    volume: at(&quote.volume, i)?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl PriceProvider for YahooFinance {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn fetch_price_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> ExchangeResult<PriceSeries> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let period1 = date_to_unix(start).to_string();
        let period2 = date_to_unix(end).to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", interval.as_str()),
                ("events", "history"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let chart: ChartResponse = match serde_json::from_str(&body) {
            Ok(chart) => chart,
            Err(e) if status.is_success() => return Err(e.into()),
            Err(_) => {
                return Err(ExchangeError::Provider {
                    symbol: symbol.to_string(),
                    message: format!("HTTP {}", status),
                })
            }
        };

        let series = Self::parse_chart(symbol, chart)?;
        info!("Fetched {} {} bars for {}", series.len(), interval, symbol);
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "SPY", "gmtoffset": -18000},
                "timestamp": [1451888400, 1452493200, 1453098000],
                "indicators": {"quote": [{
                    "open":   [200.5, null, 190.0],
                    "high":   [201.0, 196.0, 192.0],
                    "low":    [199.0, 190.0, 185.0],
                    "close":  [200.0, 195.0, 191.0],
                    "volume": [1000, 1100, 1200]
                }]}
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_chart_drops_incomplete_rows() {
        let response: ChartResponse = serde_json::from_str(CHART).unwrap();
        let series = YahooFinance::parse_chart("SPY", response).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[0].date, NaiveDate::from_ymd_opt(2016, 1, 4).unwrap());
        assert_eq!(series.bars()[1].date, NaiveDate::from_ymd_opt(2016, 1, 18).unwrap());
        assert_eq!(series.bars()[1].open, 190.0);
        assert_eq!(series.bars()[0].volume, 1000.0);
    }

    #[test]
    fn test_parse_chart_provider_error() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        let response: ChartResponse = serde_json::from_str(body).unwrap();

        let err = YahooFinance::parse_chart("NOPE", response).unwrap_err();
        assert!(matches!(err, ExchangeError::Provider { ref symbol, .. } if symbol == "NOPE"));
    }

    #[test]
    fn test_parse_chart_empty_result() {
        let body = r#"{"chart": {"result": [], "error": null}}"#;
        let response: ChartResponse = serde_json::from_str(body).unwrap();
        assert!(YahooFinance::parse_chart("SPY", response).is_err());
    }
}
