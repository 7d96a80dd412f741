//! 結果輸出模組
//!
//! 把評估產出持久化為兩個工件：逐步預測表（CSV）與結果摘要
//! （JSON）。純粹的薄 I/O 層，所有計算都在評估模組完成。

pub mod writer;

// 重新導出主要類型和結構
pub use writer::{ReportError, ResultReporter};
