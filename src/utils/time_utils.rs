// time_utils.rs
//
// 提供日期轉換相關的工具函數，用於在系統不同層之間轉換日期格式。
// 主要功能：
// 1. 在資料載入層（polars 的 epoch-day 表示）和領域模型層之間轉換
// 2. 解析外部輸入的日期字串

use chrono::{Duration, NaiveDate};

/// 輸入日期字串所使用的格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 解析 `YYYY-MM-DD` 格式的日期字串
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

/// 將 epoch-day（自 1970-01-01 起的天數，polars Date 的物理表示）轉換為 NaiveDate
pub fn epoch_days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1970, 1, 1).map(|epoch| epoch + Duration::days(days as i64))
}

/// 將 NaiveDate 轉換為 epoch-day
pub fn date_to_epoch_days(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch date is valid");
    (date - epoch).num_days() as i32
}
