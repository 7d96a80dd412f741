//! Diebold-Mariano 等預測力檢定
//!
//! 以 Newey-West 長期變異數處理損失差序列的序列相關。H0：兩個
//! 預測器的期望 QLIKE 損失相等；小 p 值且 mean(d) < 0 表示 A
//! 顯著優於 B。

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use thiserror::Error;

/// 長期變異數低於此值視為數值退化，直接報告無差異而非除以近零值
const DEGENERATE_VARIANCE: f64 = 1e-18;

/// 共同樣本不足以支撐檢定（回報性錯誤，非致命）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("共同樣本不足: {actual} 點，檢定至少需要 {required} 點")]
pub struct InsufficientSampleError {
    pub actual: usize,
    pub required: usize,
}

/// DM 檢定結果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DmStatistic {
    /// 檢定統計量；負值表示 A 的平均損失較低
    pub stat: f64,
    /// 雙尾 p 值（Student-t，自由度 T-1）
    pub p_value: f64,
    /// 平均損失差 mean(loss_A - loss_B)
    pub mean_diff: f64,
    /// 檢定樣本數 T
    pub sample_size: usize,
}

/// 對兩組對齊的逐期損失執行 Diebold-Mariano 檢定。
///
/// `nw_lags` 由調用方提供，不做自動估計：評估步幅跨越多個
/// 交易日時，相鄰評分點不可視為獨立，調用方應以步幅對齊落後
/// 階數。
pub fn dm_test(
    loss_a: &[f64],
    loss_b: &[f64],
    nw_lags: usize,
    min_sample: usize,
) -> Result<DmStatistic, InsufficientSampleError> {
    debug_assert_eq!(loss_a.len(), loss_b.len());
    let t = loss_a.len().min(loss_b.len());

    // 樣本太少時檢定不可靠，明確回報而不是硬算
    if t < min_sample {
        return Err(InsufficientSampleError {
            actual: t,
            required: min_sample,
        });
    }

    let diff: Vec<f64> = loss_a
        .iter()
        .zip(loss_b.iter())
        .map(|(a, b)| a - b)
        .collect();
    let mean_diff = diff.iter().sum::<f64>() / t as f64;
    let centered: Vec<f64> = diff.iter().map(|d| d - mean_diff).collect();

    // Newey-West 長期變異數，Bartlett 權重
    let gamma0 = centered.iter().map(|d| d * d).sum::<f64>() / t as f64;
    let mut variance = gamma0;

    let max_lag = nw_lags.min(t - 1);
    for lag in 1..=max_lag {
        let weight = 1.0 - lag as f64 / (nw_lags as f64 + 1.0);
        let gamma: f64 = centered[lag..]
            .iter()
            .zip(centered[..t - lag].iter())
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / (t - lag) as f64;
        variance += 2.0 * weight * gamma;
    }

    if variance < DEGENERATE_VARIANCE {
        return Ok(DmStatistic {
            stat: 0.0,
            p_value: 1.0,
            mean_diff,
            sample_size: t,
        });
    }

    let stat = mean_diff / (variance / t as f64).sqrt();

    let df = (t - 1) as f64;
    let student = StudentsT::new(0.0, 1.0, df).expect("degrees of freedom is positive");
    let p_value = (2.0 * (1.0 - student.cdf(stat.abs()))).clamp(0.0, 1.0);

    Ok(DmStatistic {
        stat,
        p_value,
        mean_diff,
        sample_size: t,
    })
}
