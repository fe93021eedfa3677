//! 特征拼装: 行情特征 + 各文本源的周度情感

use crate::types::{ETLError, ETLResult, WeeklySentiment};
use chrono::NaiveDate;
use market::{
    FeatureEngine, FeatureTable, IndicatorSeries, PriceSeries, ReturnSeries, VolatilitySeries,
    VolatilitySpan,
};

/// 单个股票的派生序列
#[derive(Debug, Clone)]
pub struct SymbolFeatures {
    pub symbol: String,
    pub returns: ReturnSeries,
    pub volatility: VolatilitySeries,
}

impl SymbolFeatures {
    pub fn compute(
        symbol: &str,
        prices: &PriceSeries,
        window: usize,
        span: VolatilitySpan,
    ) -> ETLResult<Self> {
        let returns = FeatureEngine::log_return(prices)?;
        let volatility = FeatureEngine::volatility(&returns, window, span)?;

        Ok(Self {
            symbol: symbol.to_string(),
            returns,
            volatility,
        })
    }

    pub fn vol_column(&self) -> String {
        format!("{}_vol", self.symbol)
    }

    pub fn log_column(&self) -> String {
        format!("{}_log", self.symbol)
    }
}

/// 所有派生序列中最晚的首个有效日期，即预热结束的日期
pub fn warmup_start(symbols: &[SymbolFeatures], indicators: &IndicatorSeries) -> Option<NaiveDate> {
    symbols
        .iter()
        .map(|s| s.volatility.first_date())
        .chain(std::iter::once(indicators.first_date()))
        .collect::<Option<Vec<_>>>()?
        .into_iter()
        .max()
}

fn ensure_same_dates(name: &str, expected: &[NaiveDate], actual: &[NaiveDate]) -> ETLResult<()> {
    if expected.len() != actual.len() {
        return Err(ETLError::Alignment(format!(
            "{} 有 {} 行, 索引有 {} 行 (首日 {:?} vs {:?})",
            name,
            actual.len(),
            expected.len(),
            actual.first(),
            expected.first()
        )));
    }
    if let Some((i, (e, a))) = expected
        .iter()
        .zip(actual)
        .enumerate()
        .find(|(_, (e, a))| e != a)
    {
        return Err(ETLError::Alignment(format!(
            "{} 第 {} 行日期为 {}, 索引为 {}",
            name, i, a, e
        )));
    }
    Ok(())
}

/// 构建行情特征表
///
/// 第一个股票为基准，提供日期、方向和技术指标。所有序列截断到起始日期
/// （`cutoff` 或预热结束日期）之后，日期序列必须完全一致。
pub fn assemble_market(
    symbols: &[SymbolFeatures],
    indicators: &IndicatorSeries,
    cutoff: Option<NaiveDate>,
) -> ETLResult<FeatureTable> {
    let benchmark = symbols
        .first()
        .ok_or_else(|| ETLError::InsufficientData("至少需要一个股票".to_string()))?;

    let start = match cutoff {
        Some(date) => date,
        None => warmup_start(symbols, indicators).ok_or_else(|| {
            ETLError::InsufficientData("派生序列为空, 无法确定起始日期".to_string())
        })?,
    };

    let index = benchmark.returns.since(start);
    if index.is_empty() {
        return Err(ETLError::InsufficientData(format!(
            "{} 在 {} 之后没有数据",
            benchmark.symbol, start
        )));
    }

    let mut table = FeatureTable::new(index.dates.clone(), FeatureEngine::direction(&index))?;

    for features in symbols {
        let vol = features.volatility.since(start);
        let ret = features.returns.since(start);
        ensure_same_dates(&features.vol_column(), &index.dates, &vol.dates)?;
        ensure_same_dates(&features.log_column(), &index.dates, &ret.dates)?;

        table.push_column(features.vol_column(), &vol.values)?;
        table.push_column(features.log_column(), &ret.values)?;
    }

    let indicators = indicators.since(start);
    ensure_same_dates("rsi14/macd", &index.dates, &indicators.dates)?;
    let macd: Vec<f64> = indicators.macd_signal.iter().map(|&m| m as f64).collect();
    table.push_column("rsi14", &indicators.rsi14)?;
    table.push_column("macd", &macd)?;

    tracing::info!(
        "Assembled market table: {} rows x {} columns starting {}",
        table.len(),
        table.columns().len(),
        start
    );
    Ok(table)
}

/// 情感桶的边界: 首行之前的一个周期 + 特征表的日期
///
/// 这样第 T 行得到的是 [T-1, T) 之间的文本，严格早于 T。
pub fn sentiment_boundaries(
    price_dates: &[NaiveDate],
    table_dates: &[NaiveDate],
) -> ETLResult<Vec<NaiveDate>> {
    let first = *table_dates
        .first()
        .ok_or_else(|| ETLError::InsufficientData("特征表为空".to_string()))?;

    let pos = price_dates.partition_point(|d| *d < first);
    if pos == 0 {
        return Err(ETLError::InsufficientData(format!(
            "{} 之前没有行情周期, 无法构建情感桶",
            first
        )));
    }

    let mut boundaries = Vec::with_capacity(table_dates.len() + 1);
    boundaries.push(price_dates[pos - 1]);
    boundaries.extend_from_slice(table_dates);
    Ok(boundaries)
}

/// 追加一个文本源的 `<source>_Pol` 与 `<source>_Sub` 列，按日期严格匹配
pub fn join_sentiment(
    table: &mut FeatureTable,
    source: &str,
    weekly: &[WeeklySentiment],
) -> ETLResult<()> {
    let dates: Vec<NaiveDate> = weekly.iter().map(|w| w.date).collect();
    ensure_same_dates(source, table.dates(), &dates)?;

    let polarity: Vec<f64> = weekly.iter().map(|w| w.polarity).collect();
    let subjectivity: Vec<f64> = weekly.iter().map(|w| w.subjectivity).collect();
    table.push_column(format!("{}_Pol", source), &polarity)?;
    table.push_column(format!("{}_Sub", source), &subjectivity)?;
    Ok(())
}
