//! 按行情日期将情感分数聚合为周度均值

use crate::types::{ETLError, ETLResult, SentimentRecord, WeeklySentiment};
use chrono::NaiveDate;

/// 空桶的默认极性
pub const NEUTRAL_POLARITY: f64 = 0.0;
/// 空桶的默认主观性
pub const NEUTRAL_SUBJECTIVITY: f64 = 0.5;

/// 第四阶段: 周度平均
///
/// 对相邻的行情日期 (tail, head)，取 `tail <= date < head` 的记录求均值，
/// 结果以 head 为日期，共 `market_dates.len() - 1` 行。空桶为 (0.0, 0.5)。
pub fn weekly_average(
    market_dates: &[NaiveDate],
    records: &[SentimentRecord],
) -> ETLResult<Vec<WeeklySentiment>> {
    if market_dates.len() < 2 {
        return Err(ETLError::InsufficientData(format!(
            "weekly_average 需要至少 2 个行情日期, 实际 {} 个",
            market_dates.len()
        )));
    }
    if let Some(pair) = market_dates.windows(2).find(|w| w[0] >= w[1]) {
        return Err(ETLError::Alignment(format!(
            "行情日期未严格递增: {} -> {}",
            pair[0], pair[1]
        )));
    }

    let mut sorted: Vec<&SentimentRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.date);

    let mut empty = 0;
    let buckets: Vec<WeeklySentiment> = market_dates
        .windows(2)
        .map(|w| {
            let (tail, head) = (w[0], w[1]);
            let from = sorted.partition_point(|r| r.date < tail);
            let to = sorted.partition_point(|r| r.date < head);
            let bucket = &sorted[from..to];

            if bucket.is_empty() {
                empty += 1;
                return WeeklySentiment {
                    date: head,
                    polarity: NEUTRAL_POLARITY,
                    subjectivity: NEUTRAL_SUBJECTIVITY,
                };
            }

            let n = bucket.len() as f64;
            WeeklySentiment {
                date: head,
                polarity: bucket.iter().map(|r| r.polarity).sum::<f64>() / n,
                subjectivity: bucket.iter().map(|r| r.subjectivity).sum::<f64>() / n,
            }
        })
        .collect();

    tracing::debug!(
        "Aggregated {} records into {} weekly buckets ({} empty)",
        records.len(),
        buckets.len(),
        empty
    );

    Ok(buckets)
}
