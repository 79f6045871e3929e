// ==========================================
// 车队维修流转跟踪 - 解析/导入组件 Trait
// ==========================================
// 职责: 定义解析管道各阶段接口（不包含实现）
// 阶段: 文件解析 → 字段映射（依赖清洗）→ 冲突检测
// ==========================================

use crate::domain::record::{DqViolation, RecordEdit, RecordKey, ServiceRecord};
use crate::importer::error::ImportResult;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行记录（HashMap<列名, 值>）
    ///
    /// 完全空白的行被跳过；返回值附带文件中的数据行号（表头为第 1 行）
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRow>>;
}

/// 文件中的一行原始数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub row_number: usize,
    pub cells: HashMap<String, String>,
}

// ==========================================
// DataCleaner Trait
// ==========================================
// 实现者: DataCleaner
pub trait DataCleaner: Send + Sync {
    /// 清洗文本字段（TRIM, 可选 UPPER）
    fn clean_text(&self, value: &str, uppercase: bool) -> String;

    /// 标准化 NULL 值（空字符串/空白 → None）
    fn normalize_null(&self, value: Option<String>) -> Option<String>;

    /// 解析编辑界面日期 (DD/MM/YYYY)
    ///
    /// # 返回
    /// - Ok(None): 空白
    /// - Err: 非空且无法解析
    fn parse_date(&self, value: &str) -> Result<Option<NaiveDate>, chrono::ParseError>;

    /// 解析旧表格日期（DD/MM/YYYY、YYYY-MM-DD、YYYY-MM-DD HH:MM:SS）
    fn parse_legacy_date(&self, value: &str) -> Result<Option<NaiveDate>, chrono::ParseError>;

    /// 解析钣金件数
    ///
    /// # 参数
    /// - allow_integral_float: 是否接受 "2.0" 这类整数值浮点（旧表格）
    fn parse_piece_count(&self, value: &str, allow_integral_float: bool)
        -> ImportResult<Option<u32>>;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 实现者: FieldMapper
pub trait FieldMapper: Send + Sync {
    /// 将编辑套用到已有工单（只改原始字段,派生字段由引擎重算）
    ///
    /// # 返回
    /// - Ok((工单, 警告)): 件数非数字等可恢复问题记为 WARNING
    /// - Err: 任一日期无法解析 / 状态或配件标记不在词表中 / 车牌被清空
    ///
    /// 所有日期先于任何赋值解析完毕,失败时 base 不受影响
    fn apply_edit(
        &self,
        base: &ServiceRecord,
        edit: &RecordEdit,
    ) -> ImportResult<(ServiceRecord, Vec<DqViolation>)>;

    /// 将旧表格的一行映射为工单
    ///
    /// 未知状态/配件标记降级为 WARNING,字段置空
    fn map_legacy_row(&self, row: &RawRow) -> ImportResult<MappedRow>;
}

/// 映射后的旧表格行
#[derive(Debug, Clone)]
pub struct MappedRow {
    pub row_number: usize,
    pub record: ServiceRecord,
    pub violations: Vec<DqViolation>,
}

// ==========================================
// ConflictHandler Trait
// ==========================================
// 实现者: ConflictHandler
pub trait ConflictHandler: Send + Sync {
    /// 检测同批次内重复主键
    ///
    /// # 返回
    /// - Vec<(行号, 主键)>: 重复记录列表（不包括第一次出现）
    fn detect_duplicates(&self, keys: &[(usize, RecordKey)]) -> Vec<(usize, RecordKey)>;

    /// 检测与库中已有工单重复的主键
    fn detect_cross_batch_duplicates(
        &self,
        keys: &[(usize, RecordKey)],
        existing: &HashSet<RecordKey>,
    ) -> Vec<(usize, RecordKey)>;
}
