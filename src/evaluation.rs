//! 滾動評估模組
//!
//! 此模組負責協調各個組件，執行走訪式樣本外評估並彙總結果。
//! 包含滑動視窗引擎、QLIKE 損失、Diebold-Mariano 檢定與結果彙總。

pub mod dm;
pub mod engine;
pub mod loss;
pub mod results;

// 重新導出主要類型和結構
pub use dm::{dm_test, DmStatistic, InsufficientSampleError};
pub use engine::RollingEvaluator;
pub use loss::{mean_qlike, qlike};
pub use results::{EvaluationOutcome, EvaluationSummary, QlikeScores, TestOutcome};
