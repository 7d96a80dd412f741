//! 外生訊號欄位的解析與選擇
//!
//! 候選欄位遵循 `{source}__{indicator}_lag{N}` 命名慣例。每次執行
//! 最多選出一個訊號欄位；選擇規則在執行開始前解析一次，而不是在
//! 迴圈中以字串比對商品名。

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::SignalSelectionConfig;

/// 欄名慣例：`{source}__{indicator}_lag{N}`
const SIGNAL_PATTERN: &str = r"^(?P<source>[A-Za-z0-9_]+?)__(?P<indicator>.+)_lag(?P<lag>\d+)$";

/// 一個已解析的外生訊號欄位
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalColumn {
    /// 完整欄名
    pub name: String,
    /// 來源家族前綴（`__` 之前）
    pub source: String,
    /// 指標名稱（`__` 與 `_lag` 之間）
    pub indicator: String,
    /// 落後階數
    pub lag: u32,
}

impl SignalColumn {
    /// 從欄名解析訊號欄位；不符合慣例時返回 None
    pub fn parse(name: &str) -> Option<Self> {
        let re = Regex::new(SIGNAL_PATTERN).expect("signal column pattern is valid");
        let caps = re.captures(name)?;
        Some(Self {
            name: name.to_string(),
            source: caps["source"].to_string(),
            indicator: caps["indicator"].to_string(),
            lag: caps["lag"].parse().ok()?,
        })
    }
}

/// 本次執行中啟用的預測器集合，於執行開始前解析一次
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecasterSet {
    /// 只有線性基準模型（未能解析出合格的訊號欄位）
    BaselineOnly,
    /// 基準、擴增與非線性基準三個模型
    Full,
}

impl ForecasterSet {
    /// 擴增與非線性基準模型是否啟用
    pub fn includes_augmented(&self) -> bool {
        matches!(self, ForecasterSet::Full)
    }
}

/// 為指定商品從候選欄位中解析出唯一的訊號欄位。
///
/// 規則：欄名須同時包含指標與平滑兩個子字串（不分大小寫），
/// 且 lag >= 1（lag 0 會引入前視偏誤，一律排除）。候選依
/// (lag, 欄名) 排序後，逐一嘗試商品映射到的來源家族，第一個
/// 命中的欄位勝出。查無映射的商品改從候選欄位的來源前綴推斷
/// 家族；已映射但全部落空的商品返回 None，整次執行退化為
/// 僅基準模型。
pub fn resolve_signal(
    columns: &[String],
    commodity: &str,
    config: &SignalSelectionConfig,
) -> Option<SignalColumn> {
    let indicator = config.indicator_pattern.to_lowercase();
    let smoothing = config.smoothing_pattern.to_lowercase();

    let mut candidates: Vec<SignalColumn> = columns
        .iter()
        .filter_map(|name| SignalColumn::parse(name))
        .filter(|signal| {
            let lower = signal.name.to_lowercase();
            signal.lag >= 1 && lower.contains(&indicator) && lower.contains(&smoothing)
        })
        .collect();

    if candidates.is_empty() {
        return None;
    }

    // 排序保證同一輸入永遠選出同一欄位；lag 最小者優先
    candidates.sort_by(|a, b| (a.lag, &a.name).cmp(&(b.lag, &b.name)));

    for family in families_for(commodity, config, &candidates) {
        let family = family.to_lowercase();
        if let Some(hit) = candidates
            .iter()
            .find(|signal| signal.source.to_lowercase().contains(&family))
        {
            return Some(hit.clone());
        }
    }

    None
}

/// 商品映射到的來源家族；查無映射時從候選欄位推斷
fn families_for(
    commodity: &str,
    config: &SignalSelectionConfig,
    candidates: &[SignalColumn],
) -> Vec<String> {
    let name = commodity.to_lowercase();

    // 映射鍵以子字串方式比對商品名（"WTI Crude" 命中鍵 "wti"）
    for (key, families) in &config.family_mapping {
        if name.contains(key.to_lowercase().as_str()) {
            return families.clone();
        }
    }

    // 推斷：候選欄位的來源前綴，排序去重
    let mut sources: Vec<String> = candidates
        .iter()
        .map(|signal| signal.source.to_lowercase())
        .collect();
    sources.sort();
    sources.dedup();
    sources
}
