// ==========================================
// 车队维修流转跟踪 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享连接和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{ConfigApi, ImportApi, ServiceRecordApi};
use crate::config::ConfigManager;
use crate::db::open_sqlite_connection;
use crate::repository::ServiceRecordRepository;

/// 应用状态
///
/// 所有仓储与API共享同一个数据库连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 维修工单API
    pub record_api: Arc<ServiceRecordApi>,

    /// 旧表格导入API
    pub import_api: Arc<ImportApi>,

    /// 配置管理API
    pub config_api: Arc<ConfigApi>,

    /// 工单仓储（供统计/诊断直接使用）
    pub record_repo: Arc<ServiceRecordRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（不存在时自动创建并建表）
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!(db_path = %db_path, "初始化AppState");

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let record_repo = Arc::new(
            ServiceRecordRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ServiceRecordRepository: {}", e))?,
        );
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let record_api = Arc::new(ServiceRecordApi::new(
            record_repo.clone(),
            config_manager.clone(),
        ));
        let import_api = Arc::new(ImportApi::new(record_repo.clone(), config_manager.clone()));
        let config_api = Arc::new(ConfigApi::new(config_manager));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            record_api,
            import_api,
            config_api,
            record_repo,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}
