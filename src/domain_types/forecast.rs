use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 單一評估步的預測記錄
///
/// 由滾動評估器產生、由損失與檢定階段消費。某個子模型在該步
/// 擬合或預測失敗時，對應欄位為 None，整筆記錄不會因此被丟棄。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub date: NaiveDate,
    pub actual: f64,
    pub pred_baseline: Option<f64>,
    pub pred_augmented: Option<f64>,
    pub pred_benchmark: Option<f64>,
}

/// 各模型在整次執行中累計的逐步失敗次數
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCounts {
    pub baseline: usize,
    pub augmented: usize,
    pub benchmark: usize,
}

impl FailureCounts {
    /// 累計失敗總數
    pub fn total(&self) -> usize {
        self.baseline + self.augmented + self.benchmark
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_counts_total() {
        let counts = FailureCounts {
            baseline: 1,
            augmented: 2,
            benchmark: 3,
        };
        assert_eq!(counts.total(), 6);
        assert_eq!(FailureCounts::default().total(), 0);
    }

    #[test]
    fn test_forecast_record_serializes_missing_as_null() {
        let record = ForecastRecord {
            date: NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
            actual: 0.02,
            pred_baseline: Some(0.018),
            pred_augmented: None,
            pred_benchmark: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["pred_baseline"], 0.018);
        assert!(json["pred_augmented"].is_null());
    }
}
