// ==========================================
// 车队维修流转跟踪 - 字段映射器实现
// ==========================================
// 职责: 编辑文本 / 旧表格行 → 类型化工单字段
// 红线: 日期全部解析成功之前,不改动任何字段
// ==========================================

use crate::domain::record::{DqViolation, RecordEdit, RecordField, ServiceRecord};
use crate::domain::types::{PartsNeeded, VehicleStatus};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult, MalformedField};
use crate::importer::importer_trait::{
    DataCleaner as DataCleanerTrait, FieldMapper as FieldMapperTrait, MappedRow, RawRow,
};
use chrono::NaiveDate;

pub struct FieldMapper {
    cleaner: DataCleaner,
    uppercase_text: bool,
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new(true)
    }
}

impl FieldMapper {
    /// # 参数
    /// - uppercase_text: 文本字段是否统一转大写
    pub fn new(uppercase_text: bool) -> Self {
        Self {
            cleaner: DataCleaner,
            uppercase_text,
        }
    }
}

impl FieldMapperTrait for FieldMapper {
    fn apply_edit(
        &self,
        base: &ServiceRecord,
        edit: &RecordEdit,
    ) -> ImportResult<(ServiceRecord, Vec<DqViolation>)> {
        // === 阶段 1: 解析全部日期 ===
        let mut malformed = Vec::new();
        let intake_date =
            self.edit_date(edit.intake_date.as_deref(), RecordField::IntakeDate, &mut malformed);
        let mechanical_start = self.edit_date(
            edit.mechanical_start.as_deref(),
            RecordField::MechanicalStart,
            &mut malformed,
        );
        let mechanical_end = self.edit_date(
            edit.mechanical_end.as_deref(),
            RecordField::MechanicalEnd,
            &mut malformed,
        );
        let bodywork_start = self.edit_date(
            edit.bodywork_start.as_deref(),
            RecordField::BodyworkStart,
            &mut malformed,
        );
        let bodywork_end = self.edit_date(
            edit.bodywork_end.as_deref(),
            RecordField::BodyworkEnd,
            &mut malformed,
        );
        if !malformed.is_empty() {
            return Err(ImportError::MalformedDate { fields: malformed });
        }

        // === 阶段 2: 词表字段与车牌 ===
        let status = edit
            .status
            .as_deref()
            .map(|raw| self.parse_status(raw))
            .transpose()?;
        let parts_needed = edit
            .parts_needed
            .as_deref()
            .map(|raw| self.parse_parts_needed(raw))
            .transpose()?;
        let plate = match edit.plate.as_deref() {
            Some(raw) => {
                let plate = self.cleaner.clean_text(raw, self.uppercase_text);
                if plate.is_empty() {
                    return Err(ImportError::PlateMissing);
                }
                Some(plate)
            }
            None => None,
        };

        // === 阶段 3: 赋值 ===
        let mut record = base.clone();
        let mut violations = Vec::new();

        if let Some(plate) = plate {
            record.plate = plate;
        }
        if let Some(raw) = &edit.fleet_id {
            record.fleet_id = self.optional_text(raw);
        }
        if let Some(raw) = &edit.model {
            record.model = self.optional_text(raw);
        }
        if let Some(raw) = &edit.company {
            record.company = self.optional_text(raw);
        }

        if let Some(date) = intake_date {
            record.intake_date = date;
        }
        if let Some(date) = mechanical_start {
            record.mechanical_start = date;
        }
        if let Some(date) = mechanical_end {
            record.mechanical_end = date;
        }
        if let Some(date) = bodywork_start {
            record.bodywork_start = date;
        }
        if let Some(date) = bodywork_end {
            record.bodywork_end = date;
        }

        if let Some(raw) = &edit.bodywork_piece_count {
            record.bodywork_piece_count =
                self.piece_count_or_warn(raw, false, &mut violations);
        }
        if let Some(status) = status {
            record.status = status;
        }
        if let Some(parts_needed) = parts_needed {
            record.parts_needed = parts_needed;
        }

        Ok((record, violations))
    }

    fn map_legacy_row(&self, row: &RawRow) -> ImportResult<MappedRow> {
        // === 阶段 1: 解析全部日期 ===
        let mut malformed = Vec::new();
        let intake_date = self.legacy_date(row, RecordField::IntakeDate, &mut malformed);
        let planned_exit_date = self.legacy_date(row, RecordField::PlannedExitDate, &mut malformed);
        let mechanical_start = self.legacy_date(row, RecordField::MechanicalStart, &mut malformed);
        let mechanical_end = self.legacy_date(row, RecordField::MechanicalEnd, &mut malformed);
        let bodywork_start = self.legacy_date(row, RecordField::BodyworkStart, &mut malformed);
        let bodywork_end = self.legacy_date(row, RecordField::BodyworkEnd, &mut malformed);
        if !malformed.is_empty() {
            return Err(ImportError::MalformedDate { fields: malformed });
        }

        let plate = Self::cell(row, RecordField::Plate)
            .map(|raw| self.cleaner.clean_text(raw, self.uppercase_text))
            .ok_or(ImportError::PlateMissing)?;

        // === 阶段 2: 可降级字段 ===
        let mut violations = Vec::new();

        let status = Self::cell(row, RecordField::Status).and_then(|raw| {
            self.parse_status(raw).unwrap_or_else(|e| {
                violations.push(DqViolation::warning(RecordField::Status, e.to_string()));
                None
            })
        });
        let parts_needed = Self::cell(row, RecordField::PartsNeeded).and_then(|raw| {
            self.parse_parts_needed(raw).unwrap_or_else(|e| {
                violations.push(DqViolation::warning(RecordField::PartsNeeded, e.to_string()));
                None
            })
        });
        let bodywork_piece_count = Self::cell(row, RecordField::BodyworkPieceCount)
            .and_then(|raw| self.piece_count_or_warn(raw, true, &mut violations));

        let record = ServiceRecord {
            fleet_id: Self::cell(row, RecordField::FleetId).and_then(|v| self.optional_text(v)),
            plate: plate.clone(),
            model: Self::cell(row, RecordField::Model).and_then(|v| self.optional_text(v)),
            company: Self::cell(row, RecordField::Company).and_then(|v| self.optional_text(v)),
            intake_date,
            mechanical_start,
            mechanical_end,
            bodywork_start,
            bodywork_end,
            bodywork_piece_count,
            status,
            parts_needed,
            planned_exit_date,
            ..Default::default()
        };

        let violations = violations
            .into_iter()
            .map(|v| v.at_row(row.row_number, Some(plate.clone())))
            .collect();

        Ok(MappedRow {
            row_number: row.row_number,
            record,
            violations,
        })
    }
}

impl FieldMapper {
    /// 按旧表格列名取值（列名忽略首尾空白与大小写,空白值 → None）
    fn cell(row: &RawRow, field: RecordField) -> Option<&str> {
        let label = field.sheet_label();
        row.cells
            .iter()
            .find(|(header, _)| header.trim().eq_ignore_ascii_case(label))
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }

    fn optional_text(&self, raw: &str) -> Option<String> {
        self.cleaner
            .normalize_null(Some(self.cleaner.clean_text(raw, self.uppercase_text)))
    }

    /// 外层 None = 未改动；内层 None = 清空
    fn edit_date(
        &self,
        raw: Option<&str>,
        field: RecordField,
        malformed: &mut Vec<MalformedField>,
    ) -> Option<Option<NaiveDate>> {
        let raw = raw?;
        match self.cleaner.parse_date(raw) {
            Ok(date) => Some(date),
            Err(_) => {
                malformed.push(MalformedField {
                    field,
                    value: raw.trim().to_string(),
                });
                None
            }
        }
    }

    fn legacy_date(
        &self,
        row: &RawRow,
        field: RecordField,
        malformed: &mut Vec<MalformedField>,
    ) -> Option<NaiveDate> {
        let raw = Self::cell(row, field)?;
        match self.cleaner.parse_legacy_date(raw) {
            Ok(date) => date,
            Err(_) => {
                malformed.push(MalformedField {
                    field,
                    value: raw.to_string(),
                });
                None
            }
        }
    }

    fn parse_status(&self, raw: &str) -> ImportResult<Option<VehicleStatus>> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        VehicleStatus::from_label(trimmed)
            .map(Some)
            .ok_or_else(|| ImportError::UnknownStatus(trimmed.to_string()))
    }

    fn parse_parts_needed(&self, raw: &str) -> ImportResult<Option<PartsNeeded>> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        PartsNeeded::from_label(trimmed)
            .map(Some)
            .ok_or_else(|| ImportError::UnknownPartsFlag(trimmed.to_string()))
    }

    /// 件数无法解析时置空并记录 WARNING
    fn piece_count_or_warn(
        &self,
        raw: &str,
        allow_integral_float: bool,
        violations: &mut Vec<DqViolation>,
    ) -> Option<u32> {
        match self.cleaner.parse_piece_count(raw, allow_integral_float) {
            Ok(count) => count,
            Err(e) => {
                violations.push(DqViolation::warning(
                    RecordField::BodyworkPieceCount,
                    e.to_string(),
                ));
                None
            }
        }
    }
}
