//! 領域模型模組
//!
//! 定義評估引擎的核心資料結構：建模表、預測記錄、外生訊號欄位。

pub mod forecast;
pub mod modeling_table;
pub mod regressor;

// 重新導出主要類型和結構
pub use forecast::{FailureCounts, ForecastRecord};
pub use modeling_table::{ModelingTable, TableSlice};
pub use regressor::{resolve_signal, ForecasterSet, SignalColumn};
