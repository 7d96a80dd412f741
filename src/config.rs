/// 配置管理模組
///
/// 本模組負責加載、驗證和管理評估引擎的配置。
/// 所有參數都由調用方顯式提供，引擎內部不依賴任何全局狀態。
// 宣告子模組
pub mod loader;
pub mod types;
pub mod validation;

// 重新導出常用組件
pub use loader::{ConfigExt, ConfigLoader, Environment};
pub use types::*;
pub use validation::{validate_config, ValidationError, ValidationUtils, Validator};

#[cfg(test)]
mod tests {
    #[test]
    fn test_module_exports() {
        // 確保重要的導出可用
        let _ = super::Environment::Development;
        let _ = super::ValidationUtils::not_empty("test", "field");

        // 類型檢查
        fn _ensure_config_works(cfg: &super::ApplicationConfig) {
            let _ = &cfg.log;
            let _ = &cfg.evaluation;
            let _ = &cfg.forest;
            let _ = &cfg.selection;
        }
    }
}
