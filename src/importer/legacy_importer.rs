// ==========================================
// 车队维修流转跟踪 - 旧表格导入器
// ==========================================
// 职责: 整合导入流程，从 data.xlsx / CSV 到数据库
// 流程: 解析 → 映射 → 冲突检测 → 计划出厂日 → 派生 → 落库（单事务）→ 报告
// ==========================================

use crate::config::WorkshopConfigReader;
use crate::domain::import_batch::{DqSummary, ImportReport};
use crate::domain::record::{DqViolation, RecordField, ServiceRecord, PLANNED_EXIT_OFFSET_DAYS};
use crate::domain::types::DqLevel;
use crate::engine::{BusinessCalendar, RecordDerivationEngine};
use crate::importer::conflict_handler::ConflictHandler as ConflictHandlerImpl;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper as FieldMapperImpl;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::importer_trait::{ConflictHandler, FieldMapper, FileParser, MappedRow, RawRow};
use crate::repository::ServiceRecordRepository;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// LegacyImporter - 旧表格导入器
// ==========================================
pub struct LegacyImporter {
    // 数据访问层
    record_repo: Arc<ServiceRecordRepository>,

    // 导入组件
    file_parser: Box<dyn FileParser>,
    field_mapper: Box<dyn FieldMapper>,
    conflict_handler: Box<dyn ConflictHandler>,

    // 派生引擎
    derivation_engine: RecordDerivationEngine,
}

impl LegacyImporter {
    pub fn new(
        record_repo: Arc<ServiceRecordRepository>,
        file_parser: Box<dyn FileParser>,
        field_mapper: Box<dyn FieldMapper>,
        conflict_handler: Box<dyn ConflictHandler>,
    ) -> Self {
        Self {
            record_repo,
            file_parser,
            field_mapper,
            conflict_handler,
            derivation_engine: RecordDerivationEngine::new(),
        }
    }

    /// 按车间配置组装默认组件
    pub fn from_config<C: WorkshopConfigReader + ?Sized>(
        record_repo: Arc<ServiceRecordRepository>,
        config: &C,
    ) -> ImportResult<Self> {
        let uppercase = config
            .get_text_uppercase()
            .map_err(|e| ImportError::ConfigError(e.to_string()))?;
        let sheet_name = config
            .get_import_sheet_name()
            .map_err(|e| ImportError::ConfigError(e.to_string()))?;

        Ok(Self::new(
            record_repo,
            Box::new(UniversalFileParser::new(sheet_name)),
            Box::new(FieldMapperImpl::new(uppercase)),
            Box::new(ConflictHandlerImpl),
        ))
    }

    /// 导入旧表格文件
    ///
    /// # 返回
    /// - Ok(ImportReport): 行级问题都记在报告里,不中断导入
    /// - Err: 文件无法读取 / 缺少 TARGA 列 / 落库失败
    #[instrument(skip(self, file_path), fields(batch_id))]
    pub fn import_file(&self, file_path: &Path) -> ImportResult<ImportReport> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());
        info!(batch_id = %batch_id, file_path = %file_path.display(), "开始导入旧表格");

        // === 步骤 1: 解析文件 ===
        let raw_rows = self.file_parser.parse_to_raw_records(file_path)?;
        Self::ensure_plate_column(&raw_rows)?;
        let total_rows = raw_rows.len();
        info!(total_rows, "文件解析完成");

        let mut violations: Vec<DqViolation> = Vec::new();

        // === 步骤 2: 字段映射 ===
        let mut mapped: Vec<MappedRow> = Vec::with_capacity(total_rows);
        let mut blocked = 0usize;
        for row in &raw_rows {
            match self.field_mapper.map_legacy_row(row) {
                Ok(m) => mapped.push(m),
                Err(e) => {
                    warn!(row_number = row.row_number, error = %e, "行映射失败");
                    blocked += 1;
                    violations.extend(Self::blocking_violations(row, &e));
                }
            }
        }
        debug!(mapped = mapped.len(), blocked, "字段映射完成");

        // === 步骤 3: 冲突检测 ===
        let keys: Vec<_> = mapped
            .iter()
            .map(|m| (m.row_number, m.record.key()))
            .collect();
        let existing: HashSet<_> = self
            .record_repo
            .list_keys()
            .map_err(|e| ImportError::DatabaseError(e.to_string()))?
            .into_iter()
            .collect();

        let mut conflict_rows: HashMap<usize, String> = HashMap::new();
        for (row_number, key) in self
            .conflict_handler
            .detect_cross_batch_duplicates(&keys, &existing)
        {
            conflict_rows.insert(row_number, format!("工单 {} 已存在于库中", key));
        }
        for (row_number, key) in self.conflict_handler.detect_duplicates(&keys) {
            conflict_rows
                .entry(row_number)
                .or_insert_with(|| format!("工单 {} 在文件中重复,保留首次出现的行", key));
        }

        // === 步骤 4-5: 计划出厂日 + 派生 ===
        let mut accepted: Vec<ServiceRecord> = Vec::with_capacity(mapped.len());
        let mut warning_rows = 0usize;
        for row in mapped {
            if let Some(message) = conflict_rows.get(&row.row_number) {
                violations.push(DqViolation {
                    row_number: Some(row.row_number),
                    plate: Some(row.record.plate.clone()),
                    level: DqLevel::Conflict,
                    field: RecordField::Plate,
                    message: message.clone(),
                });
                continue;
            }

            let mut record = row.record;
            if record.planned_exit_date.is_none() {
                record.planned_exit_date = record.intake_date.and_then(|intake| {
                    BusinessCalendar::planned_exit_date(intake, PLANNED_EXIT_OFFSET_DAYS)
                });
            }

            let outcome = self.derivation_engine.derive(&record);
            let mut row_violations = row.violations;
            row_violations.extend(
                outcome
                    .violations
                    .into_iter()
                    .map(|v| v.at_row(row.row_number, Some(outcome.record.plate.clone()))),
            );
            if row_violations.iter().any(|v| v.level == DqLevel::Warning) {
                warning_rows += 1;
            }
            violations.extend(row_violations);
            accepted.push(outcome.record);
        }

        // === 步骤 6: 落库（单事务）===
        let success = self
            .record_repo
            .insert_batch(&accepted)
            .map_err(|e| ImportError::DatabaseError(e.to_string()))?;

        // === 步骤 7: 报告 ===
        violations.sort_by_key(|v| v.row_number);
        let summary = DqSummary {
            total_rows,
            success,
            blocked,
            warning: warning_rows,
            conflict: conflict_rows.len(),
        };
        let elapsed_ms = u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            batch_id = %batch_id,
            total = summary.total_rows,
            success = summary.success,
            blocked = summary.blocked,
            warning = summary.warning,
            conflicts = summary.conflict,
            elapsed_ms,
            "旧表格导入完成"
        );

        Ok(ImportReport {
            batch_id,
            file_name: file_path
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string),
            file_path: file_path.display().to_string(),
            imported_at: Utc::now(),
            summary,
            violations,
            elapsed_ms,
        })
    }

    /// 表头必须包含 TARGA（空文件不检查）
    fn ensure_plate_column(rows: &[RawRow]) -> ImportResult<()> {
        let label = RecordField::Plate.sheet_label();
        match rows.first() {
            Some(first)
                if !first
                    .cells
                    .keys()
                    .any(|header| header.trim().eq_ignore_ascii_case(label)) =>
            {
                Err(ImportError::MissingColumn(label.to_string()))
            }
            _ => Ok(()),
        }
    }

    /// 行被阻断时,每个问题字段记一条 ERROR
    fn blocking_violations(row: &RawRow, error: &ImportError) -> Vec<DqViolation> {
        let plate = row
            .cells
            .iter()
            .find(|(header, _)| {
                header
                    .trim()
                    .eq_ignore_ascii_case(RecordField::Plate.sheet_label())
            })
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let mut fields = error.fields();
        if fields.is_empty() {
            fields.push(RecordField::Plate);
        }

        fields
            .into_iter()
            .map(|field| DqViolation {
                row_number: Some(row.row_number),
                plate: plate.clone(),
                level: DqLevel::Error,
                field,
                message: error.to_string(),
            })
            .collect()
    }
}
