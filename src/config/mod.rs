// ==========================================
// 车队维修流转跟踪 - 配置层
// ==========================================
// 职责: 进程级配置（环境变量）+ 车间配置（config_kv 表）
// ==========================================

pub mod app_config;
pub mod config_manager;
pub mod workshop_config_trait;

// 重导出核心配置
pub use app_config::{default_db_path, AppConfig};
pub use config_manager::{config_keys, ConfigManager, DEFAULT_SEARCH_RESULT_LIMIT};
pub use workshop_config_trait::WorkshopConfigReader;
