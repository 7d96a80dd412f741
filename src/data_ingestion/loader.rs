//! CSV 建模表載入器
//!
//! 讀取上游管線輸出的每商品建模表，轉換為列式的 `ModelingTable`。
//! 除日期欄以外的所有欄位一律轉型為 Float64；無法轉換或缺漏的
//! 儲存格成為 NaN，由後續的有限值過濾處理。

use chrono::NaiveDate;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use super::contract::{self, InputContractError, TableSchema};
use crate::domain_types::ModelingTable;
use crate::utils::{epoch_days_to_date, parse_date};

/// 載入錯誤
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("IO 錯誤: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 解析錯誤: {0}")]
    Polars(#[from] PolarsError),

    #[error("日期欄位 {column} 第 {row} 列無法解析")]
    InvalidDate { column: String, row: usize },

    #[error("不支援的日期欄位類型: {0}")]
    UnsupportedDateType(String),

    #[error(transparent)]
    Contract(#[from] InputContractError),
}

/// 載入結果類型別名
pub type LoaderResult<T> = Result<T, LoaderError>;

/// 從 CSV 檔案載入建模表
///
/// 返回的表已通過非空與日期嚴格遞增檢查；列數門檻由評估器
/// 在套用日期區間與有限值過濾之後檢查。
pub fn load_modeling_table<P: AsRef<Path>>(
    path: P,
    commodity: &str,
    schema: &TableSchema,
) -> LoaderResult<ModelingTable> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(LoaderError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("檔案不存在: {}", path.display()),
        )));
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(b',')
                .with_try_parse_dates(true),
        )
        .with_infer_schema_length(Some(1000))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    debug!(
        rows = df.height(),
        cols = df.width(),
        commodity,
        "CSV 建模表讀取完成"
    );

    table_from_dataframe(df, commodity, schema)
}

/// 將 DataFrame 轉換為建模表
pub fn table_from_dataframe(
    df: DataFrame,
    commodity: &str,
    schema: &TableSchema,
) -> LoaderResult<ModelingTable> {
    let dates = extract_dates(&df, &schema.date_column)?;
    let target = extract_f64(&df, &schema.target_column)?;

    // 特徵欄位 = 除日期與目標之外的所有欄位，保持 CSV 原始順序
    let feature_names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .filter(|name| name != &schema.date_column && name != &schema.target_column)
        .collect();

    let n = df.height();
    let mut features = Array2::zeros((n, feature_names.len()));
    for (j, name) in feature_names.iter().enumerate() {
        let values = extract_f64(&df, name)?;
        for (i, v) in values.into_iter().enumerate() {
            features[[i, j]] = v;
        }
    }

    let table = ModelingTable::new(
        commodity.to_string(),
        dates,
        Array1::from_vec(target),
        features,
        feature_names,
    );

    contract::check_chronological(&table)?;

    Ok(table)
}

/// 解析日期欄位；支援 Date、Datetime 與字串三種輸入類型
fn extract_dates(df: &DataFrame, column: &str) -> LoaderResult<Vec<NaiveDate>> {
    let col = df
        .column(column)
        .map_err(|_| InputContractError::MissingColumn(column.to_string()))?;
    let series = col.as_materialized_series();

    let invalid = |row: usize| LoaderError::InvalidDate {
        column: column.to_string(),
        row,
    };

    match series.dtype() {
        // Date 的物理表示是 epoch-day（i32）
        DataType::Date => series
            .cast(&DataType::Int32)?
            .i32()?
            .into_iter()
            .enumerate()
            .map(|(i, d)| d.and_then(epoch_days_to_date).ok_or_else(|| invalid(i)))
            .collect(),
        DataType::Datetime(unit, _) => {
            let divisor = match unit {
                TimeUnit::Milliseconds => 1,
                TimeUnit::Microseconds => 1_000,
                TimeUnit::Nanoseconds => 1_000_000,
            };
            series
                .cast(&DataType::Int64)?
                .i64()?
                .into_iter()
                .enumerate()
                .map(|(i, ts)| {
                    ts.and_then(|t| chrono::DateTime::from_timestamp_millis(t / divisor))
                        .map(|dt| dt.date_naive())
                        .ok_or_else(|| invalid(i))
                })
                .collect()
        }
        DataType::String => series
            .str()?
            .into_iter()
            .enumerate()
            .map(|(i, s)| s.and_then(parse_date).ok_or_else(|| invalid(i)))
            .collect(),
        other => Err(LoaderError::UnsupportedDateType(format!("{:?}", other))),
    }
}

/// 抽取數值欄位；缺漏值以 NaN 表示
fn extract_f64(df: &DataFrame, column: &str) -> LoaderResult<Vec<f64>> {
    let col = df
        .column(column)
        .map_err(|_| InputContractError::MissingColumn(column.to_string()))?;
    let series = col.as_materialized_series().cast(&DataType::Float64)?;

    Ok(series
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_modeling_table() {
        let file = write_csv(
            "Date,RV_Daily,RV_Weekly,RV_Monthly,Target_RV,middle_east__log_deaths_ewma_94_lag1\n\
             2020-01-01,0.01,0.012,0.013,0.011,0.5\n\
             2020-01-02,0.012,0.013,0.014,0.012,0.6\n\
             2020-01-03,0.013,0.014,0.015,0.013,0.7\n",
        );

        let table = load_modeling_table(file.path(), "WTI", &TableSchema::default()).unwrap();
        assert_eq!(table.commodity, "WTI");
        assert_eq!(table.len(), 3);
        // 特徵欄位不含日期與目標欄
        assert_eq!(table.columns.len(), 4);
        assert_eq!(table.column_index("Target_RV"), None);
        assert_eq!(
            table.dates[0],
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
        );
        assert_eq!(table.target[1], 0.012);
        let signal = table
            .column("middle_east__log_deaths_ewma_94_lag1")
            .unwrap();
        assert_eq!(signal.to_vec(), vec![0.5, 0.6, 0.7]);
    }

    #[test]
    fn test_missing_target_column() {
        let file = write_csv(
            "Date,RV_Daily,RV_Weekly,RV_Monthly\n\
             2020-01-01,0.01,0.012,0.013\n",
        );

        let result = load_modeling_table(file.path(), "WTI", &TableSchema::default());
        assert_matches!(
            result,
            Err(LoaderError::Contract(InputContractError::MissingColumn(name))) if name == "Target_RV"
        );
    }

    #[test]
    fn test_missing_cells_become_nan() {
        let file = write_csv(
            "Date,RV_Daily,RV_Weekly,RV_Monthly,Target_RV\n\
             2020-01-01,0.01,0.012,0.013,0.011\n\
             2020-01-02,,0.013,0.014,0.012\n",
        );

        let table = load_modeling_table(file.path(), "WTI", &TableSchema::default()).unwrap();
        assert!(table.features[[1, 0]].is_nan());
        // NaN 列交由有限值過濾剔除
        let ids: Vec<usize> = (0..3).collect();
        assert_eq!(table.retain_finite(&ids).len(), 1);
    }

    #[test]
    fn test_non_chronological_rejected() {
        let file = write_csv(
            "Date,RV_Daily,RV_Weekly,RV_Monthly,Target_RV\n\
             2020-01-02,0.01,0.012,0.013,0.011\n\
             2020-01-01,0.012,0.013,0.014,0.012\n",
        );

        let result = load_modeling_table(file.path(), "WTI", &TableSchema::default());
        assert_matches!(
            result,
            Err(LoaderError::Contract(
                InputContractError::NonChronological { index: 1, .. }
            ))
        );
    }

    #[test]
    fn test_missing_file() {
        let result = load_modeling_table("/no/such/file.csv", "WTI", &TableSchema::default());
        assert_matches!(result, Err(LoaderError::Io(_)));
    }
}
