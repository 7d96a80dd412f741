//! 建模表輸入契約
//!
//! 契約檢查全部在預測迴圈開始之前執行；任何一項失敗都會中止
//! 整次執行，而不是在迴圈中途才發現。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain_types::ModelingTable;

/// 輸入契約錯誤（致命，中止整次執行）
#[derive(Debug, Error)]
pub enum InputContractError {
    #[error("建模表缺少必要欄位: {0}")]
    MissingColumn(String),

    #[error("建模表為空")]
    EmptyTable,

    #[error("資料列數不足: 共 {rows} 列，至少需要 {required} 列（window_size + min_evaluation_points）")]
    InsufficientRows { rows: usize, required: usize },

    #[error("日期順序錯誤: 第 {index} 列 {date} 未嚴格遞增")]
    NonChronological { index: usize, date: NaiveDate },
}

/// 輸入契約結果類型別名
pub type ContractResult<T> = Result<T, InputContractError>;

/// 建模表的欄位命名約定
///
/// 預設值對應上游特徵管線的輸出欄名；基準欄位固定為
/// 日／週／月三個視野的波動率聚合，順序即模型中的迴歸順序。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub date_column: String,
    pub target_column: String,
    pub baseline_columns: [String; 3],
}

impl Default for TableSchema {
    fn default() -> Self {
        Self {
            date_column: "Date".to_string(),
            target_column: "Target_RV".to_string(),
            baseline_columns: [
                "RV_Daily".to_string(),
                "RV_Weekly".to_string(),
                "RV_Monthly".to_string(),
            ],
        }
    }
}

impl TableSchema {
    /// 解析三個基準欄位在表中的索引
    pub fn baseline_ids(&self, table: &ModelingTable) -> ContractResult<[usize; 3]> {
        let mut ids = [0usize; 3];
        for (slot, name) in ids.iter_mut().zip(self.baseline_columns.iter()) {
            *slot = table
                .column_index(name)
                .ok_or_else(|| InputContractError::MissingColumn(name.clone()))?;
        }
        Ok(ids)
    }
}

/// 檢查建模表非空且日期嚴格遞增（隱含唯一）
pub fn check_chronological(table: &ModelingTable) -> ContractResult<()> {
    if table.is_empty() {
        return Err(InputContractError::EmptyTable);
    }

    for (i, pair) in table.dates.windows(2).enumerate() {
        if pair[1] <= pair[0] {
            return Err(InputContractError::NonChronological {
                index: i + 1,
                date: pair[1],
            });
        }
    }

    Ok(())
}

/// 檢查過濾後的列數足以支撐至少 min_evaluation_points 個評估點
pub fn check_min_rows(
    rows: usize,
    window_size: usize,
    min_evaluation_points: usize,
) -> ContractResult<()> {
    let required = window_size + min_evaluation_points;
    if rows < required {
        return Err(InputContractError::InsufficientRows { rows, required });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use ndarray::{Array1, Array2};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn table_with_dates(dates: Vec<NaiveDate>) -> ModelingTable {
        let n = dates.len();
        ModelingTable::new(
            "TEST".to_string(),
            dates,
            Array1::zeros(n),
            Array2::zeros((n, 3)),
            vec![
                "RV_Daily".to_string(),
                "RV_Weekly".to_string(),
                "RV_Monthly".to_string(),
            ],
        )
    }

    #[test]
    fn test_chronological_accepts_increasing_dates() {
        let table = table_with_dates(vec![date(2020, 1, 1), date(2020, 1, 2), date(2020, 1, 5)]);
        assert!(check_chronological(&table).is_ok());
    }

    #[test]
    fn test_chronological_rejects_empty() {
        let table = table_with_dates(vec![]);
        assert_matches!(check_chronological(&table), Err(InputContractError::EmptyTable));
    }

    #[test]
    fn test_chronological_rejects_duplicates_and_regressions() {
        let table = table_with_dates(vec![date(2020, 1, 1), date(2020, 1, 1)]);
        assert_matches!(
            check_chronological(&table),
            Err(InputContractError::NonChronological { index: 1, .. })
        );

        let table = table_with_dates(vec![date(2020, 1, 2), date(2020, 1, 1)]);
        assert!(check_chronological(&table).is_err());
    }

    #[test]
    fn test_min_rows() {
        assert!(check_min_rows(760, 750, 10).is_ok());
        assert_matches!(
            check_min_rows(759, 750, 10),
            Err(InputContractError::InsufficientRows {
                rows: 759,
                required: 760
            })
        );
    }

    #[test]
    fn test_baseline_ids() {
        let table = table_with_dates(vec![date(2020, 1, 1)]);
        let schema = TableSchema::default();
        assert_eq!(schema.baseline_ids(&table).unwrap(), [0, 1, 2]);

        let schema = TableSchema {
            baseline_columns: [
                "RV_Daily".to_string(),
                "RV_Weekly".to_string(),
                "Missing".to_string(),
            ],
            ..TableSchema::default()
        };
        assert_matches!(
            schema.baseline_ids(&table),
            Err(InputContractError::MissingColumn(name)) if name == "Missing"
        );
    }
}
