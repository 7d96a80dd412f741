//! 滑動視窗評估引擎
//!
//! 對建模表執行走訪式樣本外評估：在嚴格落後的訓練視窗上重複
//! 擬合各競爭模型，對視窗後的單一列產生一步預測，發射對齊的
//! 預測記錄流。整個迴圈是單執行緒的純批次計算：迴圈內沒有
//! I/O，跨迭代攜帶的狀態只有非線性基準模型的快取。
//!
//! 確定性契約：輸入、參數與種子固定時，預測記錄序列必須逐位
//! 可重現。迴圈不讀取牆鐘時間，也不走訪任何無序集合。

use tracing::{debug, info};
use uuid::Uuid;

use super::results::{self, EvaluationOutcome};
use crate::config::{EvaluationConfig, ForestConfig, SignalSelectionConfig};
use crate::data_ingestion::contract::{self, InputContractError, TableSchema};
use crate::domain_types::{
    resolve_signal, FailureCounts, ForecastRecord, ForecasterSet, ModelingTable,
};
use crate::forecaster::{
    FittedModel, Forecaster, ForestForecaster, ForestModel, LinearForecaster,
};

/// 每發射多少筆記錄輸出一次進度
const PROGRESS_EVERY: usize = 25;

/// 非線性基準模型的快取：模型本身與其擬合位置
///
/// 這是整個迴圈唯一跨迭代的狀態，由評估器實例獨佔持有。
struct BenchmarkCache {
    model: ForestModel,
    last_fit_index: usize,
}

/// 滾動評估器
pub struct RollingEvaluator {
    config: EvaluationConfig,
    forest: ForestConfig,
    selection: SignalSelectionConfig,
}

impl RollingEvaluator {
    /// 創建新的滾動評估器
    pub fn new(
        config: EvaluationConfig,
        forest: ForestConfig,
        selection: SignalSelectionConfig,
    ) -> Self {
        Self {
            config,
            forest,
            selection,
        }
    }

    /// 對一張建模表執行完整的走訪評估。
    ///
    /// 致命的契約違反在任何預測開始前返回錯誤；單步的估計失敗
    /// 被吸收並計數，絕不重試（以不同資料重試會破壞確定性與
    /// 非前視契約）。
    pub fn evaluate(
        &self,
        table: &ModelingTable,
        schema: &TableSchema,
    ) -> Result<EvaluationOutcome, InputContractError> {
        let run_id = Uuid::new_v4();
        let commodity = table.commodity.clone();

        // 輸入契約：結構檢查在過濾之前執行
        contract::check_chronological(table)?;
        let baseline_ids = schema.baseline_ids(table)?;

        // 每次執行解析一次訊號欄位；啟用的預測器集合由此決定，
        // 不在迴圈中臨時判斷
        let signal = resolve_signal(&table.columns, &commodity, &self.selection);
        let forecasters = match signal {
            Some(_) => ForecasterSet::Full,
            None => ForecasterSet::BaselineOnly,
        };

        let augmented_ids: Vec<usize> = match &signal {
            Some(signal) => {
                let id = table
                    .column_index(&signal.name)
                    .ok_or_else(|| InputContractError::MissingColumn(signal.name.clone()))?;
                let mut ids = baseline_ids.to_vec();
                ids.push(id);
                ids
            }
            None => baseline_ids.to_vec(),
        };

        match &signal {
            Some(signal) => info!(
                run_id = %run_id,
                commodity = %commodity,
                signal = %signal.name,
                "訊號欄位解析完成，啟用全部三個預測器"
            ),
            None => info!(
                run_id = %run_id,
                commodity = %commodity,
                "查無合格的訊號欄位，本次執行僅評估基準模型"
            ),
        }

        // 過濾一次後整張表保持不變；迴圈只取唯讀切片
        let table = table
            .restrict_dates(self.config.start_date, self.config.end_date)
            .retain_finite(&augmented_ids);

        let n = table.len();
        let window = self.config.window_size;
        let step = self.config.step_size;
        contract::check_min_rows(n, window, self.config.min_evaluation_points)?;

        let expected = (n - window).div_ceil(step);
        info!(
            rows = n,
            window,
            step,
            refit_cadence = self.config.refit_cadence,
            expected_forecasts = expected,
            "走訪評估開始"
        );

        let linear = LinearForecaster;
        let forest = ForestForecaster::new(self.forest.clone());
        let floor = self.config.loss_floor;

        let mut records: Vec<ForecastRecord> = Vec::with_capacity(expected);
        let mut failures = FailureCounts::default();
        let mut benchmark_cache: Option<BenchmarkCache> = None;

        let mut t = window;
        while t < n {
            // 訓練視窗嚴格落後於評估列，不含第 t 列
            let train = table.slice(t - window, t);
            let actual = table.target[t].max(floor);

            // 基準模型失敗時整步跳過，不發射記錄
            let pred_baseline = match linear.fit(&train, &baseline_ids) {
                Ok(model) => {
                    let row = table.feature_row(t, &baseline_ids);
                    model.predict(row.view()).max(floor)
                }
                Err(err) => {
                    failures.baseline += 1;
                    debug!(index = t, error = %err, "基準模型估計失敗，跳過此步");
                    t += step;
                    continue;
                }
            };

            let mut pred_augmented = None;
            let mut pred_benchmark = None;

            if forecasters.includes_augmented() {
                // 擴增模型：獨立的失敗路徑，失敗只留下缺值
                match linear.fit(&train, &augmented_ids) {
                    Ok(model) => {
                        let row = table.feature_row(t, &augmented_ids);
                        pred_augmented = Some(model.predict(row.view()).max(floor));
                    }
                    Err(err) => {
                        failures.augmented += 1;
                        debug!(index = t, error = %err, "擴增模型估計失敗");
                    }
                }

                // 基準模型重擬合節奏：沒有快取或距上次擬合已滿
                // refit_cadence 步才重擬合，否則沿用快取模型
                let need_refit = benchmark_cache
                    .as_ref()
                    .map_or(true, |cache| t - cache.last_fit_index >= self.config.refit_cadence);

                let mut refit_failed = false;
                if need_refit {
                    match forest.fit(&train, &augmented_ids) {
                        Ok(model) => {
                            benchmark_cache = Some(BenchmarkCache {
                                model,
                                last_fit_index: t,
                            });
                        }
                        Err(err) => {
                            failures.benchmark += 1;
                            refit_failed = true;
                            debug!(index = t, error = %err, "非線性基準模型重擬合失敗");
                        }
                    }
                }

                // 重擬合失敗的步不用舊模型充數，留下缺值
                if !refit_failed {
                    if let Some(cache) = &benchmark_cache {
                        let row = table.feature_row(t, &augmented_ids);
                        pred_benchmark = Some(cache.model.predict(row.view()).max(floor));
                    }
                }
            }

            records.push(ForecastRecord {
                date: table.dates[t],
                actual,
                pred_baseline: Some(pred_baseline),
                pred_augmented,
                pred_benchmark,
            });

            if records.len() % PROGRESS_EVERY == 0 {
                info!(
                    progress = records.len(),
                    expected_forecasts = expected,
                    "走訪進度"
                );
            }

            t += step;
        }

        info!(
            forecasts = records.len(),
            baseline_failures = failures.baseline,
            augmented_failures = failures.augmented,
            benchmark_failures = failures.benchmark,
            "走訪評估完成"
        );

        let summary = results::summarize(
            run_id,
            &commodity,
            forecasters,
            signal.map(|s| s.name),
            &records,
            failures,
            &self.config,
        );

        Ok(EvaluationOutcome { records, summary })
    }
}
