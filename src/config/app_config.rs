// ==========================================
// 车队维修流转跟踪 - 进程级配置（环境变量）
// ==========================================
// FLEET_WORKSHOP_DB_PATH: 显式指定数据库文件
// RUST_LOG: 日志过滤器（由 logging::init 读取）
// ==========================================

use std::path::PathBuf;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "FLEET_WORKSHOP_DB_PATH";

/// 默认日志过滤器
pub const DEFAULT_LOG_FILTER: &str = "info";

const DATA_DIR_NAME: &str = "fleet-workshop";
const DB_FILE_NAME: &str = "fleet_workshop.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: String,
    pub log_filter: String,
}

impl AppConfig {
    /// 从环境变量加载
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 按给定的变量读取函数加载
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            db_path: non_empty(DB_PATH_ENV).unwrap_or_else(default_db_path),
            log_filter: non_empty("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }
}

/// 默认数据库路径
///
/// 优先使用用户数据目录 `<data_dir>/fleet-workshop/fleet_workshop.db`,
/// 目录无法获取或无法创建时回退到当前目录
pub fn default_db_path() -> String {
    let mut path = PathBuf::from(format!("./{}", DB_FILE_NAME));

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join(DATA_DIR_NAME);
        match std::fs::create_dir_all(&dir) {
            Ok(()) => path = dir.join(DB_FILE_NAME),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "无法创建数据目录，使用当前目录");
            }
        }
    }

    path.to_string_lossy().to_string()
}
