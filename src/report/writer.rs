//! 預測表與摘要的檔案輸出

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::domain_types::ForecastRecord;
use crate::evaluation::{EvaluationOutcome, EvaluationSummary};

/// 輸出錯誤
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO 錯誤: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 輸出錯誤: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON 輸出錯誤: {0}")]
    Json(#[from] serde_json::Error),
}

/// 輸出結果類型別名
pub type ReportResult<T> = Result<T, ReportError>;

/// 結果輸出器；每個商品寫入獨立的子目錄
pub struct ResultReporter {
    output_dir: PathBuf,
}

impl ResultReporter {
    /// 創建新的結果輸出器
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// 寫出一次執行的完整產出，返回 (預測表路徑, 摘要路徑)
    pub fn write(&self, outcome: &EvaluationOutcome) -> ReportResult<(PathBuf, PathBuf)> {
        let dir = self
            .output_dir
            .join(outcome.summary.commodity.to_uppercase());
        fs::create_dir_all(&dir)?;

        let forecasts_path = dir.join("forecasts.csv");
        write_forecasts(&forecasts_path, &outcome.records)?;

        let summary_path = dir.join("summary.json");
        write_summary(&summary_path, &outcome.summary)?;

        info!(
            forecasts = %forecasts_path.display(),
            summary = %summary_path.display(),
            "評估結果寫出完成"
        );

        Ok((forecasts_path, summary_path))
    }
}

/// 以分號分隔、六位小數寫出預測表；缺值輸出為空欄位
pub fn write_forecasts(path: &Path, records: &[ForecastRecord]) -> ReportResult<()> {
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_path(path)?;

    writer.write_record([
        "Date",
        "Actual",
        "Pred_Baseline",
        "Pred_Augmented",
        "Pred_Benchmark",
    ])?;

    let fmt = |value: Option<f64>| value.map_or(String::new(), |v| format!("{:.6}", v));

    for record in records {
        writer.write_record([
            record.date.format("%Y-%m-%d").to_string(),
            format!("{:.6}", record.actual),
            fmt(record.pred_baseline),
            fmt(record.pred_augmented),
            fmt(record.pred_benchmark),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// 寫出 JSON 結果摘要
pub fn write_summary(path: &Path, summary: &EvaluationSummary) -> ReportResult<()> {
    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(file, summary)?;
    Ok(())
}
