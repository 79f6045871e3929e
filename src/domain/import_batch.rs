// ==========================================
// 车队维修流转跟踪 - 导入批次与报告
// ==========================================

use crate::domain::record::DqViolation;
use crate::domain::types::DqLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// DqSummary - 数据质量汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DqSummary {
    pub total_rows: usize, // 总行数（不含空白行）
    pub success: usize,    // 成功导入
    pub blocked: usize,    // 阻断（ERROR）
    pub warning: usize,    // 已导入但带警告
    pub conflict: usize,   // 冲突（主键重复,跳过）
}

// ==========================================
// ImportReport - 旧表格导入报告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub batch_id: String,          // 批次 ID（UUID）
    pub file_name: Option<String>, // 源文件名
    pub file_path: String,         // 源文件路径
    pub imported_at: DateTime<Utc>,
    pub summary: DqSummary,
    pub violations: Vec<DqViolation>,
    pub elapsed_ms: u64,
}

impl ImportReport {
    pub fn violations_at(&self, level: DqLevel) -> impl Iterator<Item = &DqViolation> {
        self.violations.iter().filter(move |v| v.level == level)
    }
}
