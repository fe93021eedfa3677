//! 特征表与滞后标签切分

use crate::types::{MarketError, MarketResult};
use chrono::NaiveDate;
use ndarray::{concatenate, s, Array1, Array2, ArrayView1, Axis};

/// 按周期对齐的特征表
///
/// 每一行对应一个周期: 日期、该周期实现的涨跌方向、以及一组数值特征。
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    dates: Vec<NaiveDate>,
    direction: Vec<u8>,
    columns: Vec<String>,
    values: Array2<f64>,
}

impl FeatureTable {
    /// 以日期和方向作为索引创建空特征表
    pub fn new(dates: Vec<NaiveDate>, direction: Vec<u8>) -> MarketResult<Self> {
        if dates.len() != direction.len() {
            return Err(MarketError::DimensionMismatch {
                expected: dates.len(),
                actual: direction.len(),
            });
        }
        if let Some(pair) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(MarketError::Alignment(format!(
                "特征表日期未严格递增: {} -> {}",
                pair[0], pair[1]
            )));
        }

        let n = dates.len();
        Ok(Self {
            dates,
            direction,
            columns: Vec::new(),
            values: Array2::zeros((n, 0)),
        })
    }

    /// 由完整数据构建（用于读取已有的特征文件）
    pub fn from_parts(
        dates: Vec<NaiveDate>,
        direction: Vec<u8>,
        columns: Vec<String>,
        values: Array2<f64>,
    ) -> MarketResult<Self> {
        if values.nrows() != dates.len() {
            return Err(MarketError::DimensionMismatch {
                expected: dates.len(),
                actual: values.nrows(),
            });
        }
        if values.ncols() != columns.len() {
            return Err(MarketError::DimensionMismatch {
                expected: columns.len(),
                actual: values.ncols(),
            });
        }

        let mut table = Self::new(dates, direction)?;
        table.columns = columns;
        table.values = values;
        Ok(table)
    }

    /// 追加一列特征，长度必须与行数一致
    pub fn push_column(&mut self, name: impl Into<String>, column: &[f64]) -> MarketResult<()> {
        let name = name.into();
        if column.len() != self.len() {
            return Err(MarketError::Alignment(format!(
                "列 {} 有 {} 行, 特征表有 {} 行",
                name,
                column.len(),
                self.len()
            )));
        }
        if self.columns.contains(&name) {
            return Err(MarketError::Alignment(format!("重复的列名: {}", name)));
        }

        let column = ArrayView1::from(column).insert_axis(Axis(1));
        self.values = concatenate(Axis(1), &[self.values.view(), column])
            .map_err(|e| MarketError::Alignment(e.to_string()))?;
        self.columns.push(name);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn direction(&self) -> &[u8] {
        &self.direction
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.values.column(idx))
    }

    /// 滞后切分: 用第 j 行的特征预测第 j+1 行的方向
    ///
    /// 输出 N-1 行，第 j 行为 (date[j+1], direction[j+1], features[j])。
    /// 数据集中所有的标签偏移都只应在这里发生。
    pub fn lagged(&self) -> MarketResult<Self> {
        let n = self.len();
        if n < 2 {
            return Err(MarketError::insufficient("lagged", 2, n));
        }

        tracing::debug!(rows = n, columns = self.columns.len(), "Applying one-period lag");

        Ok(Self {
            dates: self.dates[1..].to_vec(),
            direction: self.direction[1..].to_vec(),
            columns: self.columns.clone(),
            values: self.values.slice(s![..n - 1, ..]).to_owned(),
        })
    }

    /// 转为训练用的 (X, y)，可选只保留 `before` 之前的行
    pub fn training_arrays(&self, before: Option<NaiveDate>) -> (Array2<f64>, Array1<f64>) {
        let end = match before {
            Some(cutoff) => self.dates.partition_point(|d| *d < cutoff),
            None => self.len(),
        };

        let x = self.values.slice(s![..end, ..]).to_owned();
        let y = self.direction[..end].iter().map(|&d| d as f64).collect();
        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2016, 1, 11).unwrap();
        (0..n).map(|i| start + Duration::weeks(i as i64)).collect()
    }

    fn table(n: usize) -> FeatureTable {
        let direction = (0..n).map(|i| (i % 2) as u8).collect();
        let mut table = FeatureTable::new(dates(n), direction).unwrap();
        let a: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let b: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        table.push_column("SPY_vol", &a).unwrap();
        table.push_column("SPY_log", &b).unwrap();
        table
    }

    #[test]
    fn test_lagged_pairs_next_label_with_current_features() {
        for n in 2..8 {
            let input = table(n);
            let output = input.lagged().unwrap();

            assert_eq!(output.len(), n - 1);
            assert_eq!(output.columns(), input.columns());
            for j in 0..n - 1 {
                assert_eq!(output.dates()[j], input.dates()[j + 1]);
                assert_eq!(output.direction()[j], input.direction()[j + 1]);
                assert_eq!(output.values().row(j), input.values().row(j));
            }
        }
    }

    #[test]
    fn test_lagged_needs_two_rows() {
        assert!(matches!(
            table(1).lagged(),
            Err(MarketError::InsufficientData { .. })
        ));
        assert!(table(0).lagged().is_err());
    }

    #[test]
    fn test_push_column_checks_length_and_name() {
        let mut t = table(3);
        assert!(matches!(
            t.push_column("rsi14", &[1.0, 2.0]),
            Err(MarketError::Alignment(_))
        ));
        assert!(t.push_column("SPY_vol", &[1.0, 2.0, 3.0]).is_err());
        t.push_column("rsi14", &[1.0, 2.0, 3.0]).unwrap();

        assert_eq!(t.values().ncols(), 3);
        assert_eq!(t.column("rsi14").unwrap().to_vec(), vec![1.0, 2.0, 3.0]);
        assert!(t.column("missing").is_none());
    }

    #[test]
    fn test_new_rejects_unordered_dates() {
        let mut d = dates(3);
        d.swap(0, 2);
        assert!(matches!(
            FeatureTable::new(d, vec![0, 1, 0]),
            Err(MarketError::Alignment(_))
        ));
        assert!(FeatureTable::new(dates(3), vec![0, 1]).is_err());
    }

    #[test]
    fn test_training_arrays_before_cutoff() {
        let t = table(5);
        let (x, y) = t.training_arrays(None);
        assert_eq!(x.dim(), (5, 2));
        assert_eq!(y.len(), 5);

        let cutoff = t.dates()[3];
        let (x, y) = t.training_arrays(Some(cutoff));
        assert_eq!(x.nrows(), 3);
        assert_eq!(y.to_vec(), vec![0.0, 1.0, 0.0]);
    }
}
