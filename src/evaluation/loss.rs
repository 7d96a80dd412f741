//! QLIKE 損失
//!
//! 變異數預測的標準非對稱損失：對高波動事件的低估懲罰重於 MSE，
//! 且對嚴格正的目標值具有尺度一致性。損失含對數與倒數，因此
//! 實際值與預測值都先截斷到正的下限，絕不讓非正值進入計算。

/// 單點 QLIKE 損失：`ln(pred) + actual / pred`
///
/// 兩個輸入都先截斷到 `floor`；NaN 輸入同樣落到下限而不是
/// 傳播出去。
pub fn qlike(actual: f64, predicted: f64, floor: f64) -> f64 {
    // f64::max 在任一側為 NaN 時返回另一側，因此 NaN 也被截斷
    let actual = actual.max(floor);
    let predicted = predicted.max(floor);
    predicted.ln() + actual / predicted
}

/// 對齊樣本上的平均 QLIKE 損失
pub fn mean_qlike(pairs: &[(f64, f64)], floor: f64) -> f64 {
    if pairs.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = pairs
        .iter()
        .map(|&(actual, predicted)| qlike(actual, predicted, floor))
        .sum();
    sum / pairs.len() as f64
}
