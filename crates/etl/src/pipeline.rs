//! 特征构建管道

use crate::aggregation::weekly_average;
use crate::assembler::{assemble_market, join_sentiment, sentiment_boundaries, SymbolFeatures};
use crate::cleansing::{cleanse_stopwords, cleanse_symbols};
use crate::scraper::TextScraper;
use crate::sentiment::SentimentAnalyzer;
use crate::storage::Storage;
use crate::types::{ETLError, ETLResult, PipelineConfig, TextRecord, TextSource, WeeklySentiment};
use chrono::NaiveDate;
use exchange::{PriceProvider, YahooFinance};
use market::{FeatureTable, PriceSeries, TechnicalIndicators};
use std::path::PathBuf;

/// 特征构建管道
pub struct FeaturePipeline {
    config: PipelineConfig,
    provider: Box<dyn PriceProvider>,
    sentiment_analyzer: SentimentAnalyzer,
}

impl FeaturePipeline {
    /// 使用 Yahoo Finance 作为行情源
    pub fn new(config: PipelineConfig) -> ETLResult<Self> {
        let provider = YahooFinance::new()?;
        Self::with_provider(config, Box::new(provider))
    }

    pub fn with_provider(
        config: PipelineConfig,
        provider: Box<dyn PriceProvider>,
    ) -> ETLResult<Self> {
        config.validate()?;

        Ok(Self {
            config,
            provider,
            sentiment_analyzer: SentimentAnalyzer::new(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 并发下载所有股票的行情，任何一个失败则整体失败
    pub async fn fetch_prices(&self) -> ETLResult<Vec<(String, PriceSeries)>> {
        tracing::info!(
            "Fetching {} price series from {}",
            self.config.symbols.len(),
            self.provider.name()
        );

        let futures: Vec<_> = self
            .config
            .symbols
            .iter()
            .map(|symbol| async move {
                let series = self
                    .provider
                    .fetch_price_series(
                        symbol,
                        self.config.start,
                        self.config.end,
                        self.config.interval,
                    )
                    .await?;
                tracing::info!("Fetched {} bars for {}", series.len(), symbol);
                Ok::<_, ETLError>((symbol.clone(), series))
            })
            .collect();

        futures::future::join_all(futures)
            .await
            .into_iter()
            .collect()
    }

    /// 行情特征表，第一个股票为基准
    pub fn market_table(&self, prices: &[(String, PriceSeries)]) -> ETLResult<FeatureTable> {
        let (_, benchmark) = prices
            .first()
            .ok_or_else(|| ETLError::InsufficientData("没有行情数据".to_string()))?;

        let features = prices
            .iter()
            .map(|(symbol, series)| {
                SymbolFeatures::compute(
                    symbol,
                    series,
                    self.config.volatility_window,
                    self.config.volatility_span,
                )
            })
            .collect::<ETLResult<Vec<_>>>()?;
        let indicators = TechnicalIndicators::compute(benchmark)?;

        assemble_market(&features, &indicators, self.config.cutoff)
    }

    /// 单个文本源: 清洗 -> 打分 -> 周度平均
    pub fn text_features(
        &self,
        source: &TextSource,
        records: Vec<TextRecord>,
        boundaries: &[NaiveDate],
    ) -> ETLResult<Vec<WeeklySentiment>> {
        let total = records.len();
        let cleaned = cleanse_stopwords(cleanse_symbols(records));
        let scored = self.sentiment_analyzer.score(&cleaned);
        let weekly = weekly_average(boundaries, &scored)?;

        tracing::info!(
            "{}: {} of {} records scored into {} weeks",
            source.name,
            scored.len(),
            total,
            weekly.len()
        );
        Ok(weekly)
    }

    /// 由行情数据和本地文本文件拼装未滞后的特征表
    pub fn assemble(&self, prices: &[(String, PriceSeries)]) -> ETLResult<FeatureTable> {
        let mut table = self.market_table(prices)?;

        let benchmark_dates = prices
            .first()
            .map(|(_, series)| series.dates())
            .unwrap_or_default();
        let boundaries = sentiment_boundaries(&benchmark_dates, table.dates())?;

        for source in &self.config.text_sources {
            let records = Storage::read_text_records(self.config.text_path(source))?;
            let weekly = self.text_features(source, records, &boundaries)?;
            join_sentiment(&mut table, &source.name, &weekly)?;
        }

        Ok(table)
    }

    /// 完整流程: 下载行情、拼装、滞后切分并写出
    pub async fn build(&self) -> ETLResult<FeatureTable> {
        tracing::info!("Running feature pipeline for {} symbols", self.config.symbols.len());

        let prices = self.fetch_prices().await?;
        let table = self.assemble(&prices)?.lagged()?;

        let output = self.config.output_path();
        Storage::write_features(&output, &table)?;

        tracing::info!(
            "Feature pipeline completed: {} rows written to {}",
            table.len(),
            output.display()
        );
        Ok(table)
    }

    /// 下载所有文本源到 `<data_root>/<raw_text_dir>/`
    pub async fn fetch_text(&self, scraper: &dyn TextScraper) -> ETLResult<usize> {
        let mut total = 0;
        for source in &self.config.text_sources {
            let records = scraper
                .fetch_text_records(
                    &source.account_id,
                    self.config.text_since,
                    self.config.text_until,
                )
                .await?;
            Storage::write_text_records(self.config.text_path(source), &records)?;
            total += records.len();
        }

        tracing::info!(
            "Fetched {} text records from {} sources via {}",
            total,
            self.config.text_sources.len(),
            scraper.name()
        );
        Ok(total)
    }
}

/// 特征管道构建器
pub struct FeaturePipelineBuilder {
    config: PipelineConfig,
    provider: Option<Box<dyn PriceProvider>>,
}

impl FeaturePipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            provider: None,
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_data_root(mut self, data_root: impl Into<PathBuf>) -> Self {
        self.config.data_root = data_root.into();
        self
    }

    pub fn with_symbols(mut self, symbols: Vec<String>) -> Self {
        self.config.symbols = symbols;
        self
    }

    pub fn with_volatility_window(mut self, window: usize) -> Self {
        self.config.volatility_window = window;
        self
    }

    pub fn with_cutoff(mut self, cutoff: Option<NaiveDate>) -> Self {
        self.config.cutoff = cutoff;
        self
    }

    pub fn with_text_sources(mut self, sources: Vec<TextSource>) -> Self {
        self.config.text_sources = sources;
        self
    }

    pub fn with_provider(mut self, provider: Box<dyn PriceProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn build(self) -> ETLResult<FeaturePipeline> {
        match self.provider {
            Some(provider) => FeaturePipeline::with_provider(self.config, provider),
            None => FeaturePipeline::new(self.config),
        }
    }
}

impl Default for FeaturePipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
