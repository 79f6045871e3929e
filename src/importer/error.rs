// ==========================================
// 车队维修流转跟踪 - 导入/解析错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::record::RecordField;
use thiserror::Error;

/// 无法解析的单个字段（字段 + 原始文本）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedField {
    pub field: RecordField,
    pub value: String,
}

fn describe_fields(fields: &[MalformedField]) -> String {
    fields
        .iter()
        .map(|f| format!("{}='{}'", f.field, f.value))
        .collect::<Vec<_>>()
        .join(", ")
}

/// 导入/解析错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("工作表不存在: {0}")]
    SheetNotFound(String),

    #[error("缺少必需列: {0}")]
    MissingColumn(String),

    // ===== 字段解析错误 =====
    #[error("日期格式错误（期望 DD/MM/YYYY）: {}", describe_fields(.fields))]
    MalformedDate { fields: Vec<MalformedField> },

    #[error("钣金件数不是整数: '{0}'")]
    NonNumericPieceCount(String),

    #[error("未知车辆状态: '{0}'")]
    UnknownStatus(String),

    #[error("未知配件标记: '{0}'（可选 SÌ / NO）")]
    UnknownPartsFlag(String),

    #[error("车牌不能为空")]
    PlateMissing,

    // ===== 配置/数据库错误 =====
    #[error("配置读取失败: {0}")]
    ConfigError(String),

    #[error("数据库操作失败: {0}")]
    DatabaseError(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 错误涉及的字段（用于生成行级 DQ 记录）
    pub fn fields(&self) -> Vec<RecordField> {
        match self {
            ImportError::MalformedDate { fields } => fields.iter().map(|f| f.field).collect(),
            ImportError::NonNumericPieceCount(_) => vec![RecordField::BodyworkPieceCount],
            ImportError::UnknownStatus(_) => vec![RecordField::Status],
            ImportError::UnknownPartsFlag(_) => vec![RecordField::PartsNeeded],
            ImportError::PlateMissing => vec![RecordField::Plate],
            _ => Vec::new(),
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::DatabaseError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
