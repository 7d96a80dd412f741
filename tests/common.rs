#![allow(dead_code)]
//! 整合測試共用的合成資料建構器
//!
//! 依上游特徵管線的規則從原始日度序列組建建模表：列 t 的目標是
//! t+1 的已實現波動率（預先前移），基準特徵是日／週／月三個視野
//! 的落後聚合，訊號欄位是衝突序列的 lag-1 值（首日缺值以零填補，
//! 對應上游的零填補慣例）。

use chrono::{Duration, NaiveDate};
use forecast_eval::domain_types::ModelingTable;
use ndarray::{Array1, Array2};

pub const SIGNAL_COLUMN: &str = "middle_east__log_deaths_ewma_94_lag1";

/// 確定性偽隨機序列（xorshift*），值域約 [0, 1)
pub fn deterministic_noise(seed: u64, n: usize) -> Vec<f64> {
    let mut state = seed.wrapping_mul(0x9e37_79b9_7f4a_7c15) | 1;
    (0..n)
        .map(|_| {
            state ^= state >> 12;
            state ^= state << 25;
            state ^= state >> 27;
            (state.wrapping_mul(0x2545_f491_4f6c_dd1d) >> 11) as f64 / (1u64 << 53) as f64
        })
        .collect()
}

/// 以 base 為中心、scale 為振幅的合成已實現波動率序列
pub fn rv_series(seed: u64, n: usize, base: f64, scale: f64) -> Vec<f64> {
    deterministic_noise(seed, n)
        .into_iter()
        .map(|u| base + scale * (u - 0.5))
        .collect()
}

/// 由原始序列組建建模表（合法的 lag-1 訊號構造）。
///
/// 產出 `rv.len() - 1` 列：最後一個原始觀測沒有次日目標。
/// `conflict` 為 None 時不加訊號欄位。
pub fn build_table(commodity: &str, rv: &[f64], conflict: Option<&[f64]>) -> ModelingTable {
    build_table_with(commodity, rv, conflict, |series, t| {
        // 合法構造：列 t 只看得到 t-1 的衝突值
        if t == 0 {
            0.0
        } else {
            series[t - 1]
        }
    })
}

/// 由原始序列組建建模表，訊號欄位的取值規則由 `signal_at` 決定。
///
/// 測試前視偏誤時可注入錯位的構造規則。
pub fn build_table_with(
    commodity: &str,
    rv: &[f64],
    conflict: Option<&[f64]>,
    signal_at: impl Fn(&[f64], usize) -> f64,
) -> ModelingTable {
    let n = rv.len() - 1;
    let mut columns = vec![
        "RV_Daily".to_string(),
        "RV_Weekly".to_string(),
        "RV_Monthly".to_string(),
    ];
    if conflict.is_some() {
        columns.push(SIGNAL_COLUMN.to_string());
    }

    let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
    let dates: Vec<NaiveDate> = (0..n)
        .map(|i| start + Duration::days(i as i64))
        .collect();

    let trailing_mean = |t: usize, span: usize| {
        let lo = t.saturating_sub(span - 1);
        let window = &rv[lo..=t];
        window.iter().sum::<f64>() / window.len() as f64
    };

    let mut target = Array1::zeros(n);
    let mut features = Array2::zeros((n, columns.len()));
    for t in 0..n {
        target[t] = rv[t + 1];
        features[[t, 0]] = rv[t];
        features[[t, 1]] = trailing_mean(t, 5);
        features[[t, 2]] = trailing_mean(t, 22);
        if let Some(series) = conflict {
            features[[t, 3]] = signal_at(series, t);
        }
    }

    ModelingTable::new(commodity.to_string(), dates, target, features, columns)
}
