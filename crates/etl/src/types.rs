//! 核心类型定义

use chrono::{NaiveDate, NaiveDateTime};
use exchange::{ExchangeError, Interval};
use market::{MarketError, VolatilitySpan, DEFAULT_VOLATILITY_WINDOW};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type ETLResult<T> = Result<T, ETLError>;

#[derive(Debug, Error)]
pub enum ETLError {
    #[error("数据量不足: {0}")]
    InsufficientData(String),

    #[error("数据对齐失败: {0}")]
    Alignment(String),

    #[error("数据下载失败: {0}")]
    Download(String),

    #[error("无效的记录: {0}")]
    MalformedRecord(String),

    #[error("行情处理错误: {0}")]
    Market(MarketError),

    #[error("HTTP 请求失败: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("JSON 解析失败: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("CSV 错误: {0}")]
    Csv(#[from] csv::Error),

    #[error("无效的配置: {0}")]
    Config(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ExchangeError> for ETLError {
    fn from(value: ExchangeError) -> Self {
        ETLError::Download(value.to_string())
    }
}

/// 行情层的数据量/对齐错误映射为同名的管道错误
impl From<MarketError> for ETLError {
    fn from(err: MarketError) -> Self {
        match err {
            MarketError::InsufficientData { .. } => ETLError::InsufficientData(err.to_string()),
            MarketError::Alignment(msg) => ETLError::Alignment(msg),
            MarketError::MalformedRecord(msg) => ETLError::MalformedRecord(msg),
            other => ETLError::Market(other),
        }
    }
}

/// 原始文本记录（一条推文）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRecord {
    pub timestamp: NaiveDateTime,
    pub date: NaiveDate,
    pub content: String,
}

/// 单条文本的情感分数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentRecord {
    pub date: NaiveDate,
    /// [-1.0, 1.0]
    pub polarity: f64,
    /// [0.0, 1.0]
    pub subjectivity: f64,
}

/// 周度平均情感，日期为桶的右边界
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeeklySentiment {
    pub date: NaiveDate,
    pub polarity: f64,
    pub subjectivity: f64,
}

/// 文本数据源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSource {
    /// 特征列前缀，例如 `Lisa` -> `Lisa_Pol`, `Lisa_Sub`
    pub name: String,
    /// 社交媒体账号
    pub account_id: String,
    /// `raw_text` 目录下的文件名
    pub file: String,
}

impl TextSource {
    pub fn new(name: &str, account_id: &str, file: &str) -> Self {
        Self {
            name: name.to_string(),
            account_id: account_id.to_string(),
            file: file.to_string(),
        }
    }
}

/// 管道配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 数据根目录
    pub data_root: PathBuf,
    /// 输出文件名（位于数据根目录下）
    pub output_file: String,
    /// 原始文本目录（位于数据根目录下）
    pub raw_text_dir: String,
    /// 股票代码，第一个为基准（提供方向标签和技术指标）
    pub symbols: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub interval: Interval,
    pub volatility_window: usize,
    pub volatility_span: VolatilitySpan,
    /// 起始日期截断，None 时由预热期推导
    pub cutoff: Option<NaiveDate>,
    pub text_sources: Vec<TextSource>,
    pub text_since: NaiveDate,
    pub text_until: NaiveDate,
    /// 文本下载的每分钟请求数
    pub requests_per_minute: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("Data"),
            output_file: "features.csv".to_string(),
            raw_text_dir: "raw_text".to_string(),
            symbols: ["SPY", "MSFT", "AAPL", "AMZN", "GOOGL", "JNJ", "BRK-B", "JPM"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            start: ymd(2015, 6, 1),
            end: ymd(2020, 12, 11),
            interval: Interval::Week1,
            volatility_window: DEFAULT_VOLATILITY_WINDOW,
            volatility_span: VolatilitySpan::Legacy,
            cutoff: Some(ymd(2016, 1, 11)),
            text_sources: vec![
                TextSource::new("Lisa", "lisaabramowicz1", "Lisa_tweets.csv"),
                TextSource::new("OilPrice", "OilandEnergy", "OilPrice_tweets.csv"),
                TextSource::new("SenTrader", "sentimentrader", "SentimentTrader_tweets.csv"),
                TextSource::new("Yahoo", "YahooFinance", "YahooFinance_tweets.csv"),
            ],
            text_since: ymd(2016, 1, 1),
            text_until: ymd(2020, 11, 27),
            requests_per_minute: 6,
        }
    }
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

impl PipelineConfig {
    /// 从 JSON 文件加载，缺失字段取默认值
    pub fn from_file(path: impl AsRef<Path>) -> ETLResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ETLResult<()> {
        if self.symbols.is_empty() {
            return Err(ETLError::Config("symbols 不能为空".to_string()));
        }
        if self.volatility_window == 0 {
            return Err(ETLError::Config("volatility_window 必须为正整数".to_string()));
        }
        if self.start >= self.end {
            return Err(ETLError::Config(format!(
                "start ({}) 必须早于 end ({})",
                self.start, self.end
            )));
        }
        if self.text_since >= self.text_until {
            return Err(ETLError::Config(format!(
                "text_since ({}) 必须早于 text_until ({})",
                self.text_since, self.text_until
            )));
        }
        if self.requests_per_minute == 0 {
            return Err(ETLError::Config("requests_per_minute 必须为正整数".to_string()));
        }
        Ok(())
    }

    pub fn output_path(&self) -> PathBuf {
        self.data_root.join(&self.output_file)
    }

    pub fn text_path(&self, source: &TextSource) -> PathBuf {
        self.data_root.join(&self.raw_text_dir).join(&source.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        config.validate().unwrap();

        assert_eq!(config.symbols[0], "SPY");
        assert_eq!(config.volatility_window, 5);
        assert_eq!(config.cutoff, NaiveDate::from_ymd_opt(2016, 1, 11));
        assert_eq!(config.output_path(), PathBuf::from("Data/features.csv"));
        assert_eq!(
            config.text_path(&config.text_sources[2]),
            PathBuf::from("Data/raw_text/SentimentTrader_tweets.csv")
        );
    }

    #[test]
    fn test_partial_json_config_uses_defaults() {
        let json = r#"{"symbols": ["SPY", "QQQ"], "volatility_window": 4, "volatility_span": "full", "cutoff": null}"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.symbols, vec!["SPY", "QQQ"]);
        assert_eq!(config.volatility_window, 4);
        assert_eq!(config.volatility_span, VolatilitySpan::Full);
        assert_eq!(config.cutoff, None);
        assert_eq!(config.interval, Interval::Week1);
        assert_eq!(config.text_sources.len(), 4);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PipelineConfig::default();
        config.volatility_window = 0;
        assert!(matches!(config.validate(), Err(ETLError::Config(_))));

        let mut config = PipelineConfig::default();
        config.symbols.clear();
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.end = config.start;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_market_error_mapping() {
        let err = ETLError::from(MarketError::Alignment("x".to_string()));
        assert!(matches!(err, ETLError::Alignment(_)));

        let err = ETLError::from(MarketError::InvalidWindow(0));
        assert!(matches!(err, ETLError::Market(_)));
    }
}
