// ==========================================
// 车队维修流转跟踪 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换仓储/解析错误为用户可读的单条消息
// 红线: 每条消息必须指明出问题的字段或工单
// ==========================================

use crate::domain::record::RecordField;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("工单已存在: {0}")]
    DuplicateKey(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 编辑输入无法解析（整次编辑被拒绝）
    #[error("无效输入: {message}")]
    InvalidInput {
        fields: Vec<RecordField>,
        message: String,
    },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 导入/配置错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("配置错误: {0}")]
    ConfigError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateKey(key) => ApiError::DuplicateKey(key.to_string()),
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}({})不存在", entity, id))
            }

            // 数据库错误
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }

            // 通用错误
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::MalformedDate { .. }
            | ImportError::NonNumericPieceCount(_)
            | ImportError::UnknownStatus(_)
            | ImportError::UnknownPartsFlag(_)
            | ImportError::PlateMissing => ApiError::InvalidInput {
                fields: err.fields(),
                message: err.to_string(),
            },
            ImportError::DatabaseError(msg) => ApiError::DatabaseError(msg),
            ImportError::ConfigError(msg) => ApiError::ConfigError(msg),
            ImportError::Other(err) => ApiError::Other(err),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::RecordKey;
    use crate::importer::error::MalformedField;

    #[test]
    fn test_repository_error_conversion() {
        let api_err: ApiError = RepositoryError::DuplicateKey(RecordKey::new("AB123CD", None)).into();
        match api_err {
            ApiError::DuplicateKey(msg) => assert_eq!(msg, "AB123CD @ -"),
            _ => panic!("Expected DuplicateKey"),
        }

        let api_err: ApiError = RepositoryError::NotFound {
            entity: "ServiceRecord".to_string(),
            id: "AB123CD @ 01/04/2024".to_string(),
        }
        .into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("ServiceRecord"));
                assert!(msg.contains("AB123CD"));
            }
            _ => panic!("Expected NotFound"),
        }
    }

    #[test]
    fn test_import_error_conversion_keeps_fields() {
        let api_err: ApiError = ImportError::MalformedDate {
            fields: vec![MalformedField {
                field: RecordField::IntakeDate,
                value: "1 aprile".to_string(),
            }],
        }
        .into();

        match &api_err {
            ApiError::InvalidInput { fields, .. } => {
                assert_eq!(fields, &vec![RecordField::IntakeDate]);
            }
            _ => panic!("Expected InvalidInput"),
        }
        assert!(api_err.to_string().contains("ENTRATA='1 aprile'"));

        let api_err: ApiError = ImportError::FileNotFound("data.xlsx".to_string()).into();
        assert!(matches!(api_err, ApiError::ImportError(_)));
    }
}
