//! 評估結果彙總
//!
//! 把滾動評估器產出的原始預測流整理為品質檢查摘要：共同樣本上
//! 的各模型平均 QLIKE、模型排名、失敗計數與成對 DM 檢定。樣本
//! 不足時明確回報「不可用」，絕不在退化樣本上硬算。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::dm::{dm_test, DmStatistic, InsufficientSampleError};
use super::loss::{mean_qlike, qlike};
use crate::config::EvaluationConfig;
use crate::domain_types::{FailureCounts, ForecastRecord, ForecasterSet};

/// 一次成對檢定的結果；不可用時附帶原因
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TestOutcome {
    Available {
        stat: f64,
        p_value: f64,
        mean_loss_diff: f64,
        sample_size: usize,
    },
    NotAvailable {
        reason: String,
    },
}

impl TestOutcome {
    fn from_result(result: Result<DmStatistic, InsufficientSampleError>) -> Self {
        match result {
            Ok(dm) => TestOutcome::Available {
                stat: dm.stat,
                p_value: dm.p_value,
                mean_loss_diff: dm.mean_diff,
                sample_size: dm.sample_size,
            },
            Err(err) => TestOutcome::NotAvailable {
                reason: err.to_string(),
            },
        }
    }

    fn unavailable(reason: impl Into<String>) -> Self {
        TestOutcome::NotAvailable {
            reason: reason.into(),
        }
    }
}

/// 共同樣本上的各模型平均 QLIKE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QlikeScores {
    pub baseline: f64,
    pub augmented: Option<f64>,
    pub benchmark: Option<f64>,
}

impl QlikeScores {
    /// 依平均損失由低到高排名（損失越低越好）
    pub fn ranking(&self) -> Vec<(&'static str, f64)> {
        let mut entries = vec![("baseline", self.baseline)];
        if let Some(score) = self.augmented {
            entries.push(("augmented", score));
        }
        if let Some(score) = self.benchmark {
            entries.push(("benchmark", score));
        }
        entries.sort_by(|a, b| a.1.total_cmp(&b.1));
        entries
    }
}

/// 單次執行的結果摘要
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub run_id: Uuid,
    pub commodity: String,
    pub forecasters: ForecasterSet,
    pub signal_column: Option<String>,
    pub forecasts_stored: usize,
    pub common_sample_size: usize,
    pub oos_start: Option<NaiveDate>,
    pub oos_end: Option<NaiveDate>,
    pub failures: FailureCounts,
    /// 共同樣本低於門檻時為 None
    pub qlike: Option<QlikeScores>,
    pub best_model: Option<String>,
    pub dm_baseline_vs_augmented: TestOutcome,
    pub dm_baseline_vs_benchmark: TestOutcome,
}

/// 完整的執行產出：逐步預測記錄加結果摘要
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    pub records: Vec<ForecastRecord>,
    pub summary: EvaluationSummary,
}

/// 擷取所有被比較模型都有預測值的記錄（共同樣本規則）
pub fn common_sample<'a>(
    records: &'a [ForecastRecord],
    forecasters: ForecasterSet,
) -> Vec<&'a ForecastRecord> {
    records
        .iter()
        .filter(|record| {
            record.pred_baseline.is_some()
                && (!forecasters.includes_augmented()
                    || (record.pred_augmented.is_some() && record.pred_benchmark.is_some()))
        })
        .collect()
}

/// 把一次執行的原始記錄彙總為摘要
pub fn summarize(
    run_id: Uuid,
    commodity: &str,
    forecasters: ForecasterSet,
    signal_column: Option<String>,
    records: &[ForecastRecord],
    failures: FailureCounts,
    config: &EvaluationConfig,
) -> EvaluationSummary {
    let common = common_sample(records, forecasters);
    let common_n = common.len();
    let floor = config.loss_floor;

    let oos_start = common.first().map(|r| r.date);
    let oos_end = common.last().map(|r| r.date);

    let mut summary = EvaluationSummary {
        run_id,
        commodity: commodity.to_string(),
        forecasters,
        signal_column,
        forecasts_stored: records.len(),
        common_sample_size: common_n,
        oos_start,
        oos_end,
        failures,
        qlike: None,
        best_model: None,
        dm_baseline_vs_augmented: TestOutcome::unavailable("augmented forecaster disabled"),
        dm_baseline_vs_benchmark: TestOutcome::unavailable("benchmark forecaster disabled"),
    };

    if common_n < config.min_common_sample {
        let err = InsufficientSampleError {
            actual: common_n,
            required: config.min_common_sample,
        };
        summary.dm_baseline_vs_augmented = TestOutcome::unavailable(err.to_string());
        summary.dm_baseline_vs_benchmark = TestOutcome::unavailable(err.to_string());
        return summary;
    }

    // 共同樣本上的逐模型損失；預測值在發射時已截斷，這裡再次
    // 套用下限只是讓損失計算自我完備
    let pairs = |pick: fn(&ForecastRecord) -> Option<f64>| -> Vec<(f64, f64)> {
        common
            .iter()
            .filter_map(|r| pick(r).map(|p| (r.actual, p)))
            .collect()
    };

    let baseline_pairs = pairs(|r| r.pred_baseline);
    let mut scores = QlikeScores {
        baseline: mean_qlike(&baseline_pairs, floor),
        augmented: None,
        benchmark: None,
    };

    if forecasters.includes_augmented() {
        let augmented_pairs = pairs(|r| r.pred_augmented);
        let benchmark_pairs = pairs(|r| r.pred_benchmark);
        scores.augmented = Some(mean_qlike(&augmented_pairs, floor));
        scores.benchmark = Some(mean_qlike(&benchmark_pairs, floor));

        let losses = |pairs: &[(f64, f64)]| -> Vec<f64> {
            pairs.iter().map(|&(a, p)| qlike(a, p, floor)).collect()
        };
        let baseline_losses = losses(&baseline_pairs);

        summary.dm_baseline_vs_augmented = TestOutcome::from_result(dm_test(
            &baseline_losses,
            &losses(&augmented_pairs),
            config.newey_west_lags,
            config.min_common_sample,
        ));
        summary.dm_baseline_vs_benchmark = TestOutcome::from_result(dm_test(
            &baseline_losses,
            &losses(&benchmark_pairs),
            config.newey_west_lags,
            config.min_common_sample,
        ));
    }

    summary.best_model = scores.ranking().first().map(|(name, _)| name.to_string());
    summary.qlike = Some(scores);

    summary
}
