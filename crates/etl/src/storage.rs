//! CSV 存储: 原始文本与特征表

use crate::types::{ETLError, ETLResult, TextRecord};
use chrono::{NaiveDate, NaiveDateTime};
use market::FeatureTable;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 原始文本文件的一行
#[derive(Debug, Serialize, Deserialize)]
struct TextRow {
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "Content", default)]
    content: String,
    #[serde(rename = "Date")]
    date: String,
}

impl TextRow {
    fn into_record(self, line: usize) -> ETLResult<TextRecord> {
        let timestamp = NaiveDateTime::parse_from_str(self.time.trim(), TIME_FORMAT)
            .map_err(|e| {
                ETLError::MalformedRecord(format!(
                    "第 {} 行 Time 无效 ({}): {}",
                    line, self.time, e
                ))
            })?;
        let date = parse_date(&self.date)
            .map_err(|e| ETLError::MalformedRecord(format!("第 {} 行: {}", line, e)))?;

        Ok(TextRecord {
            timestamp,
            date,
            content: self.content,
        })
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| format!("日期无效 ({}): {}", raw, e))
}

fn ensure_parent(path: &Path) -> ETLResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// CSV 文件存储
pub struct Storage;

impl Storage {
    /// 读取原始文本文件（列 `Time,Content,Date`），内容可以为空
    pub fn read_text_records(path: impl AsRef<Path>) -> ETLResult<Vec<TextRecord>> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)?;

        let mut records = Vec::new();
        for (i, row) in reader.deserialize::<TextRow>().enumerate() {
            // 表头占第 1 行
            records.push(row?.into_record(i + 2)?);
        }

        tracing::debug!("Read {} text records from {}", records.len(), path.display());
        Ok(records)
    }

    pub fn write_text_records(path: impl AsRef<Path>, records: &[TextRecord]) -> ETLResult<()> {
        let path = path.as_ref();
        ensure_parent(path)?;

        let mut writer = csv::Writer::from_path(path)?;
        for record in records {
            writer.serialize(TextRow {
                time: record.timestamp.format(TIME_FORMAT).to_string(),
                content: record.content.clone(),
                date: record.date.format(DATE_FORMAT).to_string(),
            })?;
        }
        writer.flush()?;

        tracing::info!("Wrote {} text records to {}", records.len(), path.display());
        Ok(())
    }

    /// 写出特征表: 表头 `date,direction,<cols...>`，无索引列
    pub fn write_features(path: impl AsRef<Path>, table: &FeatureTable) -> ETLResult<()> {
        let path = path.as_ref();
        ensure_parent(path)?;

        let mut writer = csv::Writer::from_path(path)?;
        let mut header = vec!["date".to_string(), "direction".to_string()];
        header.extend(table.columns().iter().cloned());
        writer.write_record(&header)?;

        for (i, row) in table.values().rows().into_iter().enumerate() {
            let mut record = Vec::with_capacity(row.len() + 2);
            record.push(table.dates()[i].format(DATE_FORMAT).to_string());
            record.push(table.direction()[i].to_string());
            record.extend(row.iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;

        tracing::info!(
            "Wrote {} rows x {} features to {}",
            table.len(),
            table.columns().len(),
            path.display()
        );
        Ok(())
    }

    /// 读取特征表
    pub fn read_features(path: impl AsRef<Path>) -> ETLResult<FeatureTable> {
        let mut reader = csv::Reader::from_path(path.as_ref())?;

        let headers = reader.headers()?.clone();
        if headers.get(0) != Some("date") || headers.get(1) != Some("direction") {
            return Err(ETLError::MalformedRecord(format!(
                "特征文件表头应以 date,direction 开头, 实际为 {:?}",
                headers
            )));
        }
        let columns: Vec<String> = headers.iter().skip(2).map(str::to_string).collect();

        let mut dates = Vec::new();
        let mut direction = Vec::new();
        let mut values = Vec::new();
        for (i, row) in reader.records().enumerate() {
            let row = row?;
            let line = i + 2;
            if row.len() != columns.len() + 2 {
                return Err(ETLError::MalformedRecord(format!(
                    "第 {} 行有 {} 列, 表头有 {} 列",
                    line,
                    row.len(),
                    columns.len() + 2
                )));
            }

            dates.push(
                parse_date(&row[0])
                    .map_err(|e| ETLError::MalformedRecord(format!("第 {} 行: {}", line, e)))?,
            );
            direction.push(match &row[1] {
                "0" => 0u8,
                "1" => 1u8,
                other => {
                    return Err(ETLError::MalformedRecord(format!(
                        "第 {} 行 direction 无效: {}",
                        line, other
                    )))
                }
            });
            for field in row.iter().skip(2) {
                let value = field.trim().parse::<f64>().map_err(|e| {
                    ETLError::MalformedRecord(format!(
                        "第 {} 行数值无效 ({}): {}",
                        line, field, e
                    ))
                })?;
                values.push(value);
            }
        }

        let values = Array2::from_shape_vec((dates.len(), columns.len()), values)
            .map_err(|e| ETLError::MalformedRecord(e.to_string()))?;
        Ok(FeatureTable::from_parts(dates, direction, columns, values)?)
    }

    /// 读取特征文件并拆分为 (X, y)，去掉日期列
    ///
    /// `before` 给定时只保留该日期之前的行。
    pub fn load_training_set(
        path: impl AsRef<Path>,
        before: Option<NaiveDate>,
    ) -> ETLResult<(Array2<f64>, Array1<f64>)> {
        let table = Self::read_features(path)?;
        let (x, y) = table.training_arrays(before);

        tracing::info!("Loaded training set: {} samples x {} features", x.nrows(), x.ncols());
        Ok((x, y))
    }
}
