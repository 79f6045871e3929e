// ==========================================
// 车队维修流转跟踪 - 维修工单领域模型
// ==========================================
// 职责: ServiceRecord 实体、主键、字段枚举、编辑输入、DQ 违规记录
// 红线: 派生字段只能由派生引擎写入,不得人工编辑
// ==========================================

use crate::domain::types::{DqLevel, PartsNeeded, VehicleStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 计划出厂日 = 进厂日 + 10 个自然日
pub const PLANNED_EXIT_OFFSET_DAYS: u64 = 10;

/// 与编辑界面交换的日期格式 (DD/MM/YYYY)
pub const DATE_FORMAT: &str = "%d/%m/%Y";

// ==========================================
// ServiceRecord - 维修工单
// ==========================================
// 未设置 = None,与空字符串/0 严格区分
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    // ===== 基础信息 =====
    pub fleet_id: Option<String>, // 车队 (FLOTTA)
    pub plate: String,            // 车牌 (TARGA)
    pub model: Option<String>,    // 车型 (MODELLO)
    pub company: Option<String>,  // 委托公司 (DITTA)

    // ===== 原始日期 =====
    pub intake_date: Option<NaiveDate>,      // 进厂日 (ENTRATA)
    pub mechanical_start: Option<NaiveDate>, // 机修开始 (INIZIO.MECC)
    pub mechanical_end: Option<NaiveDate>,   // 机修结束 (FINE MECC)
    pub bodywork_start: Option<NaiveDate>,   // 钣金开始 (INIZIO CARR)
    pub bodywork_end: Option<NaiveDate>,     // 钣金结束 (FINE CARR)

    // ===== 工单属性 =====
    pub bodywork_piece_count: Option<u32>, // 钣金件数 (PZ CARR), None/0 = 无钣金
    pub status: Option<VehicleStatus>,     // 状态 (STATO)
    pub parts_needed: Option<PartsNeeded>, // 需要配件 (RICAMBI)

    // ===== 派生字段 =====
    pub planned_exit_date: Option<NaiveDate>,    // 计划出厂日 (PREV.USCITA), 仅创建时写入
    pub days_to_start_mechanical: Option<i64>,   // GG.INIZ.MECC
    pub mechanical_working_days: Option<i64>,    // GG.LAV.MECC
    pub days_to_start_bodywork: Option<i64>,     // GG.INIZIO.CARR.
    pub bodywork_working_days: Option<i64>,      // GG.LAV.CAR
    pub last_activity_date: Option<NaiveDate>,   // DATA ULTIMA ATTIVITA'
    pub vehicle_idle_days: Option<i64>,          // FER. VET
    pub downtime_days: Option<i64>,              // DOWN TIME
    pub technical_stoppage_days: Option<i64>,    // FERMO TECNICO
}

impl ServiceRecord {
    /// 工单主键 (plate, intake_date)
    pub fn key(&self) -> RecordKey {
        RecordKey {
            plate: self.plate.clone(),
            intake_date: self.intake_date,
        }
    }

    /// 钣金是否适用（件数 > 0）
    pub fn has_bodywork(&self) -> bool {
        matches!(self.bodywork_piece_count, Some(count) if count > 0)
    }

    /// 将指定字段置为未设置
    ///
    /// 只对可置空字段生效；车牌为主键组成部分,不可置空
    pub fn clear(&mut self, field: RecordField) {
        match field {
            RecordField::FleetId => self.fleet_id = None,
            RecordField::Plate => {}
            RecordField::Model => self.model = None,
            RecordField::Company => self.company = None,
            RecordField::IntakeDate => self.intake_date = None,
            RecordField::MechanicalStart => self.mechanical_start = None,
            RecordField::MechanicalEnd => self.mechanical_end = None,
            RecordField::BodyworkStart => self.bodywork_start = None,
            RecordField::BodyworkEnd => self.bodywork_end = None,
            RecordField::BodyworkPieceCount => self.bodywork_piece_count = None,
            RecordField::Status => self.status = None,
            RecordField::PartsNeeded => self.parts_needed = None,
            RecordField::PlannedExitDate => self.planned_exit_date = None,
            RecordField::DaysToStartMechanical => self.days_to_start_mechanical = None,
            RecordField::MechanicalWorkingDays => self.mechanical_working_days = None,
            RecordField::DaysToStartBodywork => self.days_to_start_bodywork = None,
            RecordField::BodyworkWorkingDays => self.bodywork_working_days = None,
            RecordField::LastActivityDate => self.last_activity_date = None,
            RecordField::VehicleIdleDays => self.vehicle_idle_days = None,
            RecordField::DowntimeDays => self.downtime_days = None,
            RecordField::TechnicalStoppageDays => self.technical_stoppage_days = None,
        }
    }
}

// ==========================================
// RecordKey - 工单主键
// ==========================================
// 用于重复检测与更新匹配
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub plate: String,
    pub intake_date: Option<NaiveDate>,
}

impl RecordKey {
    pub fn new(plate: impl Into<String>, intake_date: Option<NaiveDate>) -> Self {
        Self {
            plate: plate.into(),
            intake_date,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.intake_date {
            Some(date) => write!(f, "{} @ {}", self.plate, date.format(DATE_FORMAT)),
            None => write!(f, "{} @ -", self.plate),
        }
    }
}

// ==========================================
// RecordField - 工单字段
// ==========================================
// 同时承载: 旧表格列名 / 数据库列名 / 是否派生 / 是否可编辑
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordField {
    FleetId,
    Plate,
    Model,
    Company,
    IntakeDate,
    MechanicalStart,
    MechanicalEnd,
    BodyworkStart,
    BodyworkEnd,
    BodyworkPieceCount,
    Status,
    PartsNeeded,
    PlannedExitDate,
    DaysToStartMechanical,
    MechanicalWorkingDays,
    DaysToStartBodywork,
    BodyworkWorkingDays,
    LastActivityDate,
    VehicleIdleDays,
    DowntimeDays,
    TechnicalStoppageDays,
}

impl RecordField {
    /// 旧表格列顺序
    pub const SHEET_ORDER: [RecordField; 21] = [
        RecordField::FleetId,
        RecordField::Plate,
        RecordField::Model,
        RecordField::IntakeDate,
        RecordField::PlannedExitDate,
        RecordField::VehicleIdleDays,
        RecordField::Company,
        RecordField::DaysToStartMechanical,
        RecordField::MechanicalStart,
        RecordField::MechanicalWorkingDays,
        RecordField::MechanicalEnd,
        RecordField::DaysToStartBodywork,
        RecordField::BodyworkStart,
        RecordField::BodyworkWorkingDays,
        RecordField::BodyworkEnd,
        RecordField::BodyworkPieceCount,
        RecordField::Status,
        RecordField::DowntimeDays,
        RecordField::LastActivityDate,
        RecordField::PartsNeeded,
        RecordField::TechnicalStoppageDays,
    ];

    /// 旧表格列名
    pub fn sheet_label(&self) -> &'static str {
        match self {
            RecordField::FleetId => "FLOTTA",
            RecordField::Plate => "TARGA",
            RecordField::Model => "MODELLO",
            RecordField::Company => "DITTA",
            RecordField::IntakeDate => "ENTRATA",
            RecordField::MechanicalStart => "INIZIO.MECC",
            RecordField::MechanicalEnd => "FINE MECC",
            RecordField::BodyworkStart => "INIZIO CARR",
            RecordField::BodyworkEnd => "FINE CARR",
            RecordField::BodyworkPieceCount => "PZ CARR",
            RecordField::Status => "STATO",
            RecordField::PartsNeeded => "RICAMBI",
            RecordField::PlannedExitDate => "PREV.USCITA",
            RecordField::DaysToStartMechanical => "GG.INIZ.MECC",
            RecordField::MechanicalWorkingDays => "GG.LAV.MECC",
            RecordField::DaysToStartBodywork => "GG.INIZIO.CARR.",
            RecordField::BodyworkWorkingDays => "GG.LAV.CAR",
            RecordField::LastActivityDate => "DATA ULTIMA ATTIVITA'",
            RecordField::VehicleIdleDays => "FER. VET",
            RecordField::DowntimeDays => "DOWN TIME",
            RecordField::TechnicalStoppageDays => "FERMO TECNICO",
        }
    }

    /// 数据库列名
    pub fn column_name(&self) -> &'static str {
        match self {
            RecordField::FleetId => "fleet_id",
            RecordField::Plate => "plate",
            RecordField::Model => "model",
            RecordField::Company => "company",
            RecordField::IntakeDate => "intake_date",
            RecordField::MechanicalStart => "mechanical_start",
            RecordField::MechanicalEnd => "mechanical_end",
            RecordField::BodyworkStart => "bodywork_start",
            RecordField::BodyworkEnd => "bodywork_end",
            RecordField::BodyworkPieceCount => "bodywork_piece_count",
            RecordField::Status => "status",
            RecordField::PartsNeeded => "parts_needed",
            RecordField::PlannedExitDate => "planned_exit_date",
            RecordField::DaysToStartMechanical => "days_to_start_mechanical",
            RecordField::MechanicalWorkingDays => "mechanical_working_days",
            RecordField::DaysToStartBodywork => "days_to_start_bodywork",
            RecordField::BodyworkWorkingDays => "bodywork_working_days",
            RecordField::LastActivityDate => "last_activity_date",
            RecordField::VehicleIdleDays => "vehicle_idle_days",
            RecordField::DowntimeDays => "downtime_days",
            RecordField::TechnicalStoppageDays => "technical_stoppage_days",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sheet_label())
    }
}

// ==========================================
// RecordEdit - 编辑界面提交的原始文本
// ==========================================
// None = 未改动; Some("") = 清空
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordEdit {
    pub fleet_id: Option<String>,
    pub plate: Option<String>,
    pub model: Option<String>,
    pub company: Option<String>,
    pub intake_date: Option<String>,
    pub mechanical_start: Option<String>,
    pub mechanical_end: Option<String>,
    pub bodywork_start: Option<String>,
    pub bodywork_end: Option<String>,
    pub bodywork_piece_count: Option<String>,
    pub status: Option<String>,
    pub parts_needed: Option<String>,
}

impl RecordEdit {
    /// 是否没有任何字段改动
    pub fn is_empty(&self) -> bool {
        self.fleet_id.is_none()
            && self.plate.is_none()
            && self.model.is_none()
            && self.company.is_none()
            && self.intake_date.is_none()
            && self.mechanical_start.is_none()
            && self.mechanical_end.is_none()
            && self.bodywork_start.is_none()
            && self.bodywork_end.is_none()
            && self.bodywork_piece_count.is_none()
            && self.status.is_none()
            && self.parts_needed.is_none()
    }

    /// 填了值的阶段日期字段（机修/钣金开始、结束）
    pub fn phase_date_fields(&self) -> Vec<RecordField> {
        [
            (RecordField::MechanicalStart, &self.mechanical_start),
            (RecordField::MechanicalEnd, &self.mechanical_end),
            (RecordField::BodyworkStart, &self.bodywork_start),
            (RecordField::BodyworkEnd, &self.bodywork_end),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_some_and(|v| !v.trim().is_empty()))
        .map(|(field, _)| field)
        .collect()
    }
}

// ==========================================
// DqViolation - 数据质量违规记录
// ==========================================
// row_number: 导入时为文件行号,交互编辑时为 None
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DqViolation {
    pub row_number: Option<usize>,
    pub plate: Option<String>,
    pub level: DqLevel,
    pub field: RecordField,
    pub message: String,
}

impl DqViolation {
    pub fn warning(field: RecordField, message: impl Into<String>) -> Self {
        Self {
            row_number: None,
            plate: None,
            level: DqLevel::Warning,
            field,
            message: message.into(),
        }
    }

    /// 附加行号与车牌（导入场景）
    pub fn at_row(mut self, row_number: usize, plate: Option<String>) -> Self {
        self.row_number = Some(row_number);
        self.plate = plate;
        self
    }
}

impl fmt::Display for DqViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row_number {
            Some(row) => write!(f, "[{}] 行 {} {}: {}", self.level, row, self.field, self.message),
            None => write!(f, "[{}] {}: {}", self.level, self.field, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_bodywork() {
        let mut record = ServiceRecord::default();
        assert!(!record.has_bodywork());

        record.bodywork_piece_count = Some(0);
        assert!(!record.has_bodywork());

        record.bodywork_piece_count = Some(3);
        assert!(record.has_bodywork());
    }

    #[test]
    fn test_clear_keeps_plate() {
        let mut record = ServiceRecord {
            plate: "AB123CD".to_string(),
            bodywork_working_days: Some(4),
            ..Default::default()
        };

        record.clear(RecordField::Plate);
        record.clear(RecordField::BodyworkWorkingDays);

        assert_eq!(record.plate, "AB123CD");
        assert_eq!(record.bodywork_working_days, None);
    }

    #[test]
    fn test_sheet_order_is_unique() {
        let mut labels: Vec<&str> = RecordField::SHEET_ORDER
            .iter()
            .map(|f| f.sheet_label())
            .collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), 21);
    }

    #[test]
    fn test_key_display() {
        let key = RecordKey::new("AB123CD", NaiveDate::from_ymd_opt(2024, 4, 1));
        assert_eq!(key.to_string(), "AB123CD @ 01/04/2024");
        assert_eq!(RecordKey::new("AB123CD", None).to_string(), "AB123CD @ -");
    }
}
