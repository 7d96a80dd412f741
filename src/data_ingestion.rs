//! 資料載入模組
//!
//! 負責把上游特徵管線輸出的 CSV 建模表載入為 `ModelingTable`，
//! 並在任何預測開始之前檢查輸入契約。契約違反屬於致命錯誤，
//! 直接中止整次執行。

pub mod contract;
pub mod loader;

// 重新導出主要類型和結構
pub use contract::{ContractResult, InputContractError, TableSchema};
pub use loader::{load_modeling_table, LoaderError};
