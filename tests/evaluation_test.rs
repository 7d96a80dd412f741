//! 滾動評估引擎的整合測試
//!
//! 覆蓋規格化的端到端情境：無訊號的零欄位、不足樣本回報、
//! 退化視窗的單步失敗，以及完整管線（CSV 載入 -> 評估 -> 輸出）。

mod common;

use assert_matches::assert_matches;
use common::{build_table, deterministic_noise, rv_series, SIGNAL_COLUMN};
use forecast_eval::config::{EvaluationConfig, ForestConfig, SignalSelectionConfig};
use forecast_eval::data_ingestion::{load_modeling_table, TableSchema};
use forecast_eval::evaluation::{RollingEvaluator, TestOutcome};
use forecast_eval::report::ResultReporter;
use std::io::Write;

fn fast_forest() -> ForestConfig {
    ForestConfig {
        n_trees: 20,
        max_depth: 6,
        min_samples_leaf: 5,
        seed: 42,
    }
}

fn evaluator(config: EvaluationConfig) -> RollingEvaluator {
    RollingEvaluator::new(config, fast_forest(), SignalSelectionConfig::default())
}

/// 情境一：1300 列、window 750、step 5，lag-1 訊號欄位全零
/// （無真實訊號）。擴增模型與基準模型必須得到一致的預測，
/// DM 檢定不顯著。
#[test]
fn scenario_zero_signal_column_is_not_significant() {
    let rv = rv_series(11, 1301, 0.01, 0.004);
    let conflict = vec![0.0; 1301];
    let table = build_table("WTI", &rv, Some(&conflict));
    assert_eq!(table.len(), 1300);

    let config = EvaluationConfig {
        window_size: 750,
        step_size: 5,
        ..EvaluationConfig::default()
    };
    let outcome = evaluator(config)
        .evaluate(&table, &TableSchema::default())
        .unwrap();

    assert_eq!(outcome.records.len(), 110);
    assert_eq!(outcome.summary.common_sample_size, 110);
    assert_eq!(outcome.summary.signal_column.as_deref(), Some(SIGNAL_COLUMN));

    match &outcome.summary.dm_baseline_vs_augmented {
        TestOutcome::Available {
            p_value,
            mean_loss_diff,
            ..
        } => {
            assert!(mean_loss_diff.abs() < 1e-12, "mean diff: {}", mean_loss_diff);
            assert!(*p_value > 0.10, "p = {}", p_value);
        }
        TestOutcome::NotAvailable { reason } => {
            panic!("DM test should be available, got: {}", reason)
        }
    }
}

/// 情境三：770 列、window 750 只剩 20 個評估點。原始預測仍須
/// 返回，但損失比較與 DM 檢定低於 30 點門檻，必須回報不可用。
#[test]
fn scenario_small_sample_reports_not_available() {
    let rv = rv_series(7, 771, 0.01, 0.004);
    let conflict = deterministic_noise(13, 771);
    let table = build_table("WTI", &rv, Some(&conflict));
    assert_eq!(table.len(), 770);

    let config = EvaluationConfig {
        window_size: 750,
        step_size: 1,
        ..EvaluationConfig::default()
    };
    let outcome = evaluator(config)
        .evaluate(&table, &TableSchema::default())
        .unwrap();

    // 原始預測照常返回
    assert_eq!(outcome.records.len(), 20);
    assert!(outcome
        .records
        .iter()
        .all(|r| r.pred_baseline.is_some()));

    // 檢定與損失比較明確回報不可用
    assert!(outcome.summary.qlike.is_none());
    assert_matches!(
        &outcome.summary.dm_baseline_vs_augmented,
        TestOutcome::NotAvailable { reason } if reason.contains("30")
    );
    assert_matches!(
        &outcome.summary.dm_baseline_vs_benchmark,
        TestOutcome::NotAvailable { .. }
    );
}

/// 情境四：整個訓練視窗內某個基準特徵為常數（與截距共線）。
/// 該步必須以 EstimationError 跳過而不是讓整次執行崩潰，
/// 最終失敗計數恰為 1。
#[test]
fn scenario_singular_window_fails_one_step_only() {
    let rv = rv_series(23, 141, 0.02, 0.006);
    let conflict = deterministic_noise(29, 141);
    let mut table = build_table("WTI", &rv, Some(&conflict));

    // 前 60 列的 RV_Daily 為常數：只有 t=60 的訓練視窗完全退化
    for i in 0..60 {
        table.features[[i, 0]] = 0.02;
    }

    let config = EvaluationConfig {
        window_size: 60,
        step_size: 1,
        min_common_sample: 30,
        ..EvaluationConfig::default()
    };
    let outcome = evaluator(config)
        .evaluate(&table, &TableSchema::default())
        .unwrap();

    assert_eq!(outcome.summary.failures.baseline, 1);
    assert_eq!(outcome.summary.failures.augmented, 0);
    // 140 列、視窗 60 -> 80 步，其中 1 步被跳過
    assert_eq!(outcome.records.len(), 79);
}

/// 相同輸入、參數與種子必須產生逐位相同的記錄序列
#[test]
fn identical_runs_are_bit_for_bit_identical() {
    let rv = rv_series(3, 201, 0.015, 0.005);
    let conflict = deterministic_noise(5, 201);
    let table = build_table("GOLD", &rv, Some(&conflict));

    let config = EvaluationConfig {
        window_size: 80,
        step_size: 2,
        refit_cadence: 10,
        ..EvaluationConfig::default()
    };

    let a = evaluator(config.clone())
        .evaluate(&table, &TableSchema::default())
        .unwrap();
    let b = evaluator(config)
        .evaluate(&table, &TableSchema::default())
        .unwrap();

    assert_eq!(a.records, b.records);
}

/// 共同樣本數不得超過任一被比較模型的單獨樣本數
#[test]
fn common_sample_is_never_larger_than_per_model_samples() {
    let rv = rv_series(17, 201, 0.015, 0.005);
    let conflict = deterministic_noise(19, 201);
    let table = build_table("GAS", &rv, Some(&conflict));

    let config = EvaluationConfig {
        window_size: 80,
        step_size: 1,
        ..EvaluationConfig::default()
    };
    let outcome = evaluator(config)
        .evaluate(&table, &TableSchema::default())
        .unwrap();

    let per_model = [
        outcome.records.iter().filter(|r| r.pred_baseline.is_some()).count(),
        outcome.records.iter().filter(|r| r.pred_augmented.is_some()).count(),
        outcome.records.iter().filter(|r| r.pred_benchmark.is_some()).count(),
    ];
    for n in per_model {
        assert!(outcome.summary.common_sample_size <= n);
    }
}

/// 完整管線：CSV 載入 -> 契約檢查 -> 評估 -> 輸出兩個工件
#[test]
fn full_pipeline_from_csv_to_artifacts() {
    let rv = rv_series(31, 141, 0.02, 0.006);
    let conflict = deterministic_noise(37, 141);
    let table = build_table("WTI", &rv, Some(&conflict));

    // 以載入器期望的格式寫出 CSV
    let mut csv = String::from("Date,RV_Daily,RV_Weekly,RV_Monthly,Target_RV,");
    csv.push_str(SIGNAL_COLUMN);
    csv.push('\n');
    for i in 0..table.len() {
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            table.dates[i].format("%Y-%m-%d"),
            table.features[[i, 0]],
            table.features[[i, 1]],
            table.features[[i, 2]],
            table.target[i],
            table.features[[i, 3]],
        ));
    }
    let mut file = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
    file.write_all(csv.as_bytes()).unwrap();
    file.flush().unwrap();

    let schema = TableSchema::default();
    let loaded = load_modeling_table(file.path(), "WTI", &schema).unwrap();
    assert_eq!(loaded.len(), table.len());

    let config = EvaluationConfig {
        window_size: 60,
        step_size: 1,
        ..EvaluationConfig::default()
    };
    let outcome = evaluator(config).evaluate(&loaded, &schema).unwrap();
    assert_eq!(outcome.records.len(), 80);

    let dir = tempfile::tempdir().unwrap();
    let (forecasts, summary) = ResultReporter::new(dir.path()).write(&outcome).unwrap();
    assert!(forecasts.exists());
    assert!(summary.exists());

    let header = std::fs::read_to_string(&forecasts).unwrap();
    assert!(header.starts_with("Date;Actual;Pred_Baseline;Pred_Augmented;Pred_Benchmark"));
}
