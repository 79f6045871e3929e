// ==========================================
// 车队维修流转跟踪 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope, 仅使用 global)
// ==========================================

use crate::config::workshop_config_trait::WorkshopConfigReader;
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// 默认查询上限
pub const DEFAULT_SEARCH_RESULT_LIMIT: usize = 500;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 会对传入连接再次应用统一 PRAGMA 并建表（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            crate::db::init_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入配置值（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        Ok(())
    }

    /// 获取全部 global 配置（按 key 排序）
    pub fn get_config_snapshot(&self) -> Result<BTreeMap<String, String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut snapshot = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    /// 读取并解析配置；格式错误时记录警告并回退默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>>
    where
        T: FromStr,
    {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };

        match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => {
                warn!(config_key = key, raw_value = %raw, "配置值格式错误，使用默认值");
                Ok(default)
            }
        }
    }
}

// ==========================================
// WorkshopConfigReader Trait 实现
// ==========================================
impl WorkshopConfigReader for ConfigManager {
    fn get_text_uppercase(&self) -> Result<bool, Box<dyn Error>> {
        let Some(raw) = self.get_global_config_value(config_keys::TEXT_UPPERCASE)? else {
            return Ok(true);
        };

        match raw.trim().to_uppercase().as_str() {
            "1" | "TRUE" | "Y" | "YES" => Ok(true),
            "0" | "FALSE" | "N" | "NO" => Ok(false),
            _ => {
                warn!(
                    config_key = config_keys::TEXT_UPPERCASE,
                    raw_value = %raw,
                    "配置值格式错误，使用默认值"
                );
                Ok(true)
            }
        }
    }

    fn get_search_result_limit(&self) -> Result<usize, Box<dyn Error>> {
        let limit = self.get_parsed_or_default(
            config_keys::SEARCH_RESULT_LIMIT,
            DEFAULT_SEARCH_RESULT_LIMIT,
        )?;
        if limit == 0 {
            warn!(config_key = config_keys::SEARCH_RESULT_LIMIT, "查询上限不能为 0，使用默认值");
            return Ok(DEFAULT_SEARCH_RESULT_LIMIT);
        }
        Ok(limit)
    }

    fn get_import_sheet_name(&self) -> Result<Option<String>, Box<dyn Error>> {
        Ok(self
            .get_global_config_value(config_keys::IMPORT_SHEET_NAME)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 输入解析
    pub const TEXT_UPPERCASE: &str = "text_uppercase";

    // 查询
    pub const SEARCH_RESULT_LIMIT: &str = "search_result_limit";

    // 导入
    pub const IMPORT_SHEET_NAME: &str = "import_sheet_name";

    /// 全部已知配置键
    pub const ALL: [&str; 3] = [TEXT_UPPERCASE, SEARCH_RESULT_LIMIT, IMPORT_SHEET_NAME];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = manager();
        assert!(config.get_text_uppercase().unwrap());
        assert_eq!(config.get_search_result_limit().unwrap(), 500);
        assert_eq!(config.get_import_sheet_name().unwrap(), None);
    }

    #[test]
    fn test_set_config_value_upserts() {
        let config = manager();
        config.set_config_value(config_keys::SEARCH_RESULT_LIMIT, "50").unwrap();
        config.set_config_value(config_keys::SEARCH_RESULT_LIMIT, "20").unwrap();

        assert_eq!(config.get_search_result_limit().unwrap(), 20);
        assert_eq!(config.get_config_snapshot().unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let config = manager();
        config.set_config_value(config_keys::SEARCH_RESULT_LIMIT, "tanti").unwrap();
        config.set_config_value(config_keys::TEXT_UPPERCASE, "forse").unwrap();

        assert_eq!(config.get_search_result_limit().unwrap(), 500);
        assert!(config.get_text_uppercase().unwrap());
    }

    #[test]
    fn test_text_uppercase_can_be_disabled() {
        let config = manager();
        config.set_config_value(config_keys::TEXT_UPPERCASE, "false").unwrap();
        assert!(!config.get_text_uppercase().unwrap());
    }

    #[test]
    fn test_import_sheet_name() {
        let config = manager();
        config.set_config_value(config_keys::IMPORT_SHEET_NAME, " Foglio1 ").unwrap();
        assert_eq!(
            config.get_import_sheet_name().unwrap(),
            Some("Foglio1".to_string())
        );
    }
}
