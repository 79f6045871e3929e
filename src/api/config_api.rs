// ==========================================
// 车队维修流转跟踪 - 配置管理 API
// ==========================================
// 职责: 配置查询、更新
// 红线: 只接受已知配置键,写入前校验取值
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::{config_keys, ConfigManager};

// ==========================================
// ConfigApi - 配置管理 API
// ==========================================

/// 配置管理API
///
/// 职责：
/// 1. 配置查询（全部、单个）
/// 2. 配置更新（单个）
pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    /// 创建新的ConfigApi实例
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    /// 查询所有已写入的配置
    pub fn list_configs(&self) -> ApiResult<Vec<ConfigItem>> {
        let snapshot = self
            .config_manager
            .get_config_snapshot()
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

        Ok(snapshot
            .into_iter()
            .map(|(key, value)| ConfigItem { key, value })
            .collect())
    }

    /// 查询单个配置
    ///
    /// # 返回
    /// - Ok(Some(ConfigItem)): 配置项
    /// - Ok(None): 配置未写入（使用默认值）
    pub fn get_config(&self, key: &str) -> ApiResult<Option<ConfigItem>> {
        let key = Self::known_key(key)?;

        let value = self
            .config_manager
            .get_global_config_value(key)
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

        Ok(value.map(|value| ConfigItem {
            key: key.to_string(),
            value,
        }))
    }

    /// 更新配置
    ///
    /// # 错误
    /// - ConfigError: 未知配置键或取值不合法
    pub fn update_config(&self, key: &str, value: &str) -> ApiResult<()> {
        let key = Self::known_key(key)?;
        let value = value.trim();
        Self::validate_value(key, value)?;

        self.config_manager
            .set_config_value(key, value)
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

        info!(config_key = key, value, "配置已更新");
        Ok(())
    }

    fn known_key(key: &str) -> ApiResult<&'static str> {
        let key = key.trim();
        config_keys::ALL
            .iter()
            .copied()
            .find(|known| *known == key)
            .ok_or_else(|| {
                ApiError::ConfigError(format!(
                    "未知配置键: {}（可选 {}）",
                    key,
                    config_keys::ALL.join(" / ")
                ))
            })
    }

    fn validate_value(key: &str, value: &str) -> ApiResult<()> {
        match key {
            config_keys::TEXT_UPPERCASE => match value.to_uppercase().as_str() {
                "1" | "TRUE" | "Y" | "YES" | "0" | "FALSE" | "N" | "NO" => Ok(()),
                _ => Err(ApiError::ConfigError(format!(
                    "{} 只接受 true / false: '{}'",
                    key, value
                ))),
            },
            config_keys::SEARCH_RESULT_LIMIT => match value.parse::<usize>() {
                Ok(limit) if limit > 0 => Ok(()),
                _ => Err(ApiError::ConfigError(format!(
                    "{} 必须是正整数: '{}'",
                    key, value
                ))),
            },
            _ => Ok(()),
        }
    }
}

// ==========================================
// DTO 类型定义
// ==========================================

/// 配置项（global 作用域）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigItem {
    /// 配置键
    pub key: String,

    /// 配置值
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn api() -> ConfigApi {
        let conn = Connection::open_in_memory().unwrap();
        let manager = ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap();
        ConfigApi::new(Arc::new(manager))
    }

    #[test]
    fn test_update_and_list() {
        let api = api();
        api.update_config("search_result_limit", " 50 ").unwrap();

        let item = api.get_config("search_result_limit").unwrap().unwrap();
        assert_eq!(item.value, "50");
        assert_eq!(api.list_configs().unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_unknown_key_and_bad_value() {
        let api = api();

        assert!(matches!(
            api.update_config("colour", "red"),
            Err(ApiError::ConfigError(_))
        ));
        assert!(matches!(
            api.update_config("search_result_limit", "0"),
            Err(ApiError::ConfigError(_))
        ));
        assert!(matches!(
            api.update_config("text_uppercase", "maybe"),
            Err(ApiError::ConfigError(_))
        ));
        assert!(api.get_config("text_uppercase").unwrap().is_none());
    }
}
