use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::validation::{ValidationError, ValidationUtils, Validator};

/// 應用程序配置結構
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub forest: ForestConfig,
    #[serde(default)]
    pub selection: SignalSelectionConfig,
}

impl Validator for ApplicationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // 驗證各個部分的配置
        self.log.validate()?;
        self.evaluation.validate()?;
        self.forest.validate()?;
        self.selection.validate()?;

        Ok(())
    }
}

/// 日誌配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Validator for LogConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // 驗證日誌級別
        ValidationUtils::one_of(
            &self.level.to_lowercase(),
            &["trace", "debug", "info", "warn", "error"]
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<String>>(),
            "log.level",
        )?;

        // 驗證日誌格式
        ValidationUtils::one_of(
            &self.format.to_lowercase(),
            &["pretty", "json"]
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<String>>(),
            "log.format",
        )?;

        Ok(())
    }
}

/// 滾動評估配置
///
/// 所有數值門檻都是顯式參數，引擎不內建任何隱含常數。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// 每次擬合使用的訓練視窗列數
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// 相鄰評估點之間的步幅（>= 1）
    #[serde(default = "default_step_size")]
    pub step_size: usize,

    /// 基準模型兩次重新擬合之間的最少步數
    #[serde(default = "default_refit_cadence")]
    pub refit_cadence: usize,

    /// Diebold-Mariano 檢定的 Newey-West 落後階數。
    /// 不會自動從 step_size 推導；若評估步幅跨越多個交易日，
    /// 調用方應將其設為 step_size。
    #[serde(default = "default_newey_west_lags")]
    pub newey_west_lags: usize,

    /// 評估區間下界（含），None 表示不限制
    #[serde(default)]
    pub start_date: Option<NaiveDate>,

    /// 評估區間上界（含），None 表示不限制
    #[serde(default)]
    pub end_date: Option<NaiveDate>,

    /// QLIKE 損失的數值下限；所有預測值與實際值在進入損失函數前
    /// 都會被截斷到這個正數下限
    #[serde(default = "default_loss_floor")]
    pub loss_floor: f64,

    /// 可評估列數的致命下限：資料列數必須 >= window_size + min_evaluation_points
    #[serde(default = "default_min_evaluation_points")]
    pub min_evaluation_points: usize,

    /// 損失比較與 DM 檢定所需的最小共同樣本數
    #[serde(default = "default_min_common_sample")]
    pub min_common_sample: usize,
}

fn default_window_size() -> usize {
    750
}
fn default_step_size() -> usize {
    5
}
fn default_refit_cadence() -> usize {
    25
}
fn default_newey_west_lags() -> usize {
    5
}
fn default_loss_floor() -> f64 {
    1e-3
}
fn default_min_evaluation_points() -> usize {
    10
}
fn default_min_common_sample() -> usize {
    30
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            step_size: default_step_size(),
            refit_cadence: default_refit_cadence(),
            newey_west_lags: default_newey_west_lags(),
            start_date: None,
            end_date: None,
            loss_floor: default_loss_floor(),
            min_evaluation_points: default_min_evaluation_points(),
            min_common_sample: default_min_common_sample(),
        }
    }
}

impl Validator for EvaluationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::in_range(self.window_size, 10, 100_000, "evaluation.window_size")?;
        ValidationUtils::in_range(self.step_size, 1, 10_000, "evaluation.step_size")?;
        ValidationUtils::in_range(self.refit_cadence, 1, 100_000, "evaluation.refit_cadence")?;
        ValidationUtils::in_range(self.newey_west_lags, 0, 10_000, "evaluation.newey_west_lags")?;
        ValidationUtils::positive_finite(self.loss_floor, "evaluation.loss_floor")?;
        ValidationUtils::in_range(
            self.min_evaluation_points,
            1,
            100_000,
            "evaluation.min_evaluation_points",
        )?;
        ValidationUtils::in_range(self.min_common_sample, 2, 100_000, "evaluation.min_common_sample")?;

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(ValidationError::InvalidValue(format!(
                    "evaluation.start_date {} 晚於 evaluation.end_date {}",
                    start, end
                )));
            }
        }

        Ok(())
    }
}

/// 非線性基準模型（裝袋迴歸樹）配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    /// 樹的數量
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,

    /// 單棵樹的最大深度
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// 葉節點的最小樣本數
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,

    /// 隨機種子；固定種子保證跨執行與跨機器的可重現性
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_n_trees() -> usize {
    150
}
fn default_max_depth() -> usize {
    10
}
fn default_min_samples_leaf() -> usize {
    5
}
fn default_seed() -> u64 {
    42
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: default_n_trees(),
            max_depth: default_max_depth(),
            min_samples_leaf: default_min_samples_leaf(),
            seed: default_seed(),
        }
    }
}

impl Validator for ForestConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::in_range(self.n_trees, 1, 10_000, "forest.n_trees")?;
        ValidationUtils::in_range(self.max_depth, 1, 64, "forest.max_depth")?;
        ValidationUtils::in_range(self.min_samples_leaf, 1, 10_000, "forest.min_samples_leaf")?;

        Ok(())
    }
}

/// 外生訊號欄位的選擇規則
///
/// 候選欄位須同時包含 indicator_pattern 與 smoothing_pattern 兩個子字串
/// （不分大小寫），且落後階數 >= 1。family_mapping 將商品名映射到
/// 依序嘗試的來源家族；查無映射時從候選欄位的來源前綴推斷。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalSelectionConfig {
    #[serde(default = "default_indicator_pattern")]
    pub indicator_pattern: String,

    #[serde(default = "default_smoothing_pattern")]
    pub smoothing_pattern: String,

    /// 商品 -> 來源家族（依優先順序）。BTreeMap 保證走訪順序確定。
    #[serde(default = "default_family_mapping")]
    pub family_mapping: BTreeMap<String, Vec<String>>,
}

fn default_indicator_pattern() -> String {
    "log_deaths".to_string()
}

fn default_smoothing_pattern() -> String {
    "ewma_94".to_string()
}

fn default_family_mapping() -> BTreeMap<String, Vec<String>> {
    let mut mapping = BTreeMap::new();
    mapping.insert("wti".to_string(), vec!["middle_east".to_string()]);
    mapping.insert("oil".to_string(), vec!["middle_east".to_string()]);
    mapping.insert("gas".to_string(), vec!["europe".to_string()]);
    mapping.insert(
        "gold".to_string(),
        vec!["global".to_string(), "middle_east".to_string()],
    );
    mapping
}

impl Default for SignalSelectionConfig {
    fn default() -> Self {
        Self {
            indicator_pattern: default_indicator_pattern(),
            smoothing_pattern: default_smoothing_pattern(),
            family_mapping: default_family_mapping(),
        }
    }
}

impl Validator for SignalSelectionConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::not_empty(&self.indicator_pattern, "selection.indicator_pattern")?;
        ValidationUtils::not_empty(&self.smoothing_pattern, "selection.smoothing_pattern")?;

        for (commodity, families) in &self.family_mapping {
            ValidationUtils::not_empty(commodity, "selection.family_mapping key")?;
            if families.is_empty() {
                return Err(ValidationError::InvalidValue(format!(
                    "selection.family_mapping[{}] 不可為空列表",
                    commodity
                )));
            }
        }

        Ok(())
    }
}
