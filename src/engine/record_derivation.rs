// ==========================================
// 车队维修流转跟踪 - 工单派生引擎
// ==========================================
// 职责: 从工单原始日期重算全部派生字段
// 流程: 阶段工作日 → 最后作业日 → 停放/停机天数 → 技术停工 → 依赖字段失效
// 红线: 纯函数,无状态、无 I/O；计划出厂日只在创建时写入,此处透传
// ==========================================

use crate::domain::record::{DqViolation, RecordField, ServiceRecord};
use crate::domain::types::DqLevel;
use crate::engine::business_days::BusinessCalendar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ==========================================
// 依赖字段失效规则表
// ==========================================

/// 失效条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationCondition {
    /// 钣金件数未设置或为 0
    NoBodyworkPieces,
}

impl InvalidationCondition {
    pub fn holds(&self, record: &ServiceRecord) -> bool {
        match self {
            InvalidationCondition::NoBodyworkPieces => !record.has_bodywork(),
        }
    }
}

/// 失效规则: 条件成立时清空的字段
#[derive(Debug, Clone, Copy)]
pub struct InvalidationRule {
    pub condition: InvalidationCondition,
    pub clears: &'static [RecordField],
}

/// 派生完成后统一执行的失效规则
///
/// 新增依赖字段时只需扩展此表
pub const INVALIDATION_RULES: &[InvalidationRule] = &[InvalidationRule {
    condition: InvalidationCondition::NoBodyworkPieces,
    clears: &[
        RecordField::BodyworkStart,
        RecordField::BodyworkEnd,
        RecordField::BodyworkWorkingDays,
        RecordField::DaysToStartBodywork,
    ],
}];

// ==========================================
// DerivationOutcome - 派生结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationOutcome {
    pub record: ServiceRecord,
    pub violations: Vec<DqViolation>,
}

impl DerivationOutcome {
    pub fn warnings(&self) -> impl Iterator<Item = &DqViolation> {
        self.violations
            .iter()
            .filter(|v| matches!(v.level, DqLevel::Warning))
    }
}

// ==========================================
// RecordDerivationEngine
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordDerivationEngine;

impl RecordDerivationEngine {
    pub fn new() -> Self {
        Self
    }

    /// 重算工单全部派生字段（主入口）
    ///
    /// # 参数
    /// - record: 当前工单（原始字段已包含用户最新编辑）
    ///
    /// # 返回
    /// - DerivationOutcome: 派生后的工单 + 数据质量违规（区间倒置为 WARNING）
    ///
    /// # 规则
    /// 1. GG.INIZ.MECC = 工作日(进厂, 机修开始)
    /// 2. GG.LAV.MECC = 工作日(机修开始, 机修结束)
    /// 3. GG.INIZIO.CARR. = 工作日(进厂, 钣金开始)，仅钣金适用
    /// 4. GG.LAV.CAR = 工作日(钣金开始, 钣金结束)，仅钣金适用
    /// 5. 最后作业日 = max(机修结束, 钣金结束)
    /// 6. FER. VET = 工作日(进厂, 最后作业日)
    /// 7. DOWN TIME = 与 FER. VET 同口径
    /// 8. FERMO TECNICO = 工作日(最早阶段开始, 最晚阶段结束)
    /// 9. 执行失效规则表
    pub fn derive(&self, record: &ServiceRecord) -> DerivationOutcome {
        let mut derived = record.clone();
        let mut violations = Vec::new();

        // 钣金不适用时,钣金日期不参与任何派生
        let bodywork_applies = record.has_bodywork();
        let (bodywork_start, bodywork_end) = if bodywork_applies {
            (record.bodywork_start, record.bodywork_end)
        } else {
            (None, None)
        };

        // === 步骤 1-4: 阶段工作日 ===
        derived.days_to_start_mechanical = Self::span(
            record.intake_date,
            record.mechanical_start,
            RecordField::DaysToStartMechanical,
            &mut violations,
        );
        derived.mechanical_working_days = Self::span(
            record.mechanical_start,
            record.mechanical_end,
            RecordField::MechanicalWorkingDays,
            &mut violations,
        );
        derived.days_to_start_bodywork = Self::span(
            record.intake_date,
            bodywork_start,
            RecordField::DaysToStartBodywork,
            &mut violations,
        );
        derived.bodywork_working_days = Self::span(
            bodywork_start,
            bodywork_end,
            RecordField::BodyworkWorkingDays,
            &mut violations,
        );

        // === 步骤 5: 最后作业日 ===
        derived.last_activity_date = Self::latest(record.mechanical_end, bodywork_end);

        // === 步骤 6-7: 停放天数 / 停机天数 ===
        derived.vehicle_idle_days = Self::span(
            record.intake_date,
            derived.last_activity_date,
            RecordField::VehicleIdleDays,
            &mut violations,
        );
        derived.downtime_days = Self::span(
            record.intake_date,
            derived.last_activity_date,
            RecordField::DowntimeDays,
            &mut violations,
        );

        // === 步骤 8: 技术停工 ===
        let earliest_start = Self::earliest(record.mechanical_start, bodywork_start);
        let latest_end = Self::latest(record.mechanical_end, bodywork_end);
        derived.technical_stoppage_days = Self::span(
            earliest_start,
            latest_end,
            RecordField::TechnicalStoppageDays,
            &mut violations,
        );

        // === 步骤 9: 依赖字段失效 ===
        Self::apply_invalidation_rules(&mut derived, &mut violations);

        debug!(
            plate = %derived.plate,
            bodywork_applies,
            violations = violations.len(),
            "工单派生完成"
        );

        DerivationOutcome {
            record: derived,
            violations,
        }
    }

    /// 执行失效规则表
    ///
    /// 用户填写过、但被规则清空的原始日期记为 INFO
    fn apply_invalidation_rules(record: &mut ServiceRecord, violations: &mut Vec<DqViolation>) {
        for rule in INVALIDATION_RULES {
            if !rule.condition.holds(record) {
                continue;
            }

            for &field in rule.clears {
                let discarded = match field {
                    RecordField::BodyworkStart => record.bodywork_start,
                    RecordField::BodyworkEnd => record.bodywork_end,
                    _ => None,
                };
                if let Some(date) = discarded {
                    violations.push(DqViolation {
                        row_number: None,
                        plate: None,
                        level: DqLevel::Info,
                        field,
                        message: format!(
                            "钣金件数为空或 0,已丢弃日期 {}",
                            date.format("%d/%m/%Y")
                        ),
                    });
                }
                record.clear(field);
            }
        }
    }

    /// 区间工作日；倒置时字段置空并记录 WARNING
    fn span(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        field: RecordField,
        violations: &mut Vec<DqViolation>,
    ) -> Option<i64> {
        match BusinessCalendar::business_days_opt(start, end) {
            Ok(days) => days,
            Err(inverted) => {
                violations.push(DqViolation::warning(
                    field,
                    format!("区间倒置: {}", inverted),
                ));
                None
            }
        }
    }

    fn earliest(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<NaiveDate> {
        match (a, b) {
            (Some(x), Some(y)) => Some(x.min(y)),
            (x, y) => x.or(y),
        }
    }

    fn latest(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<NaiveDate> {
        match (a, b) {
            (Some(x), Some(y)) => Some(x.max(y)),
            (x, y) => x.or(y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, day)
    }

    fn base_record() -> ServiceRecord {
        ServiceRecord {
            plate: "GH456JK".to_string(),
            intake_date: d(2024, 4, 1),
            ..Default::default()
        }
    }

    #[test]
    fn test_days_to_start_mechanical() {
        let mut record = base_record();
        record.mechanical_start = d(2024, 4, 3);

        let outcome = RecordDerivationEngine::new().derive(&record);

        assert_eq!(outcome.record.days_to_start_mechanical, Some(2));
        assert!(outcome.violations.is_empty());
    }

    #[test]
    fn test_missing_endpoint_leaves_field_unset() {
        let mut record = base_record();
        record.mechanical_start = d(2024, 4, 3);
        // 旧值必须被清掉,不能残留
        record.mechanical_working_days = Some(7);
        record.vehicle_idle_days = Some(7);

        let outcome = RecordDerivationEngine::new().derive(&record);

        assert_eq!(outcome.record.mechanical_working_days, None);
        assert_eq!(outcome.record.vehicle_idle_days, None);
        assert_eq!(outcome.record.last_activity_date, None);
        assert_eq!(outcome.record.technical_stoppage_days, None);
    }

    #[test]
    fn test_last_activity_takes_later_end() {
        let mut record = base_record();
        record.bodywork_piece_count = Some(2);
        record.mechanical_start = d(2024, 4, 2);
        record.mechanical_end = d(2024, 4, 10);
        record.bodywork_start = d(2024, 4, 11);
        record.bodywork_end = d(2024, 4, 19);

        let outcome = RecordDerivationEngine::new().derive(&record);
        let derived = outcome.record;

        assert_eq!(derived.last_activity_date, d(2024, 4, 19));
        assert_eq!(derived.days_to_start_bodywork, Some(8));
        assert_eq!(derived.bodywork_working_days, Some(6));
        // 进厂 04-01 → 最后作业 04-19: 14 个工作日
        assert_eq!(derived.vehicle_idle_days, Some(14));
        assert_eq!(derived.downtime_days, Some(14));
        // 机修开始 04-02 → 钣金结束 04-19
        assert_eq!(derived.technical_stoppage_days, Some(13));
    }

    #[test]
    fn test_technical_stoppage_across_phases() {
        // 只有钣金开始 + 机修结束,也能解析出跨度
        let mut record = base_record();
        record.bodywork_piece_count = Some(1);
        record.bodywork_start = d(2024, 4, 2);
        record.mechanical_end = d(2024, 4, 4);

        let outcome = RecordDerivationEngine::new().derive(&record);

        assert_eq!(outcome.record.technical_stoppage_days, Some(2));
        assert_eq!(outcome.record.mechanical_working_days, None);
        assert_eq!(outcome.record.bodywork_working_days, None);
    }

    #[test]
    fn test_no_bodywork_discards_bodywork_dates() {
        let mut record = base_record();
        record.bodywork_piece_count = Some(0);
        record.mechanical_end = d(2024, 4, 3);
        record.bodywork_start = d(2024, 5, 1);
        record.bodywork_end = d(2024, 5, 10);
        record.days_to_start_bodywork = Some(22);

        let outcome = RecordDerivationEngine::new().derive(&record);
        let derived = &outcome.record;

        assert_eq!(derived.bodywork_start, None);
        assert_eq!(derived.bodywork_end, None);
        assert_eq!(derived.bodywork_working_days, None);
        assert_eq!(derived.days_to_start_bodywork, None);
        // 钣金结束不参与最后作业日
        assert_eq!(derived.last_activity_date, d(2024, 4, 3));

        let infos: Vec<_> = outcome
            .violations
            .iter()
            .filter(|v| v.level == DqLevel::Info)
            .collect();
        assert_eq!(infos.len(), 2);
    }

    #[test]
    fn test_inverted_interval_is_warning() {
        let mut record = base_record();
        record.mechanical_start = d(2024, 4, 10);
        record.mechanical_end = d(2024, 4, 8);

        let outcome = RecordDerivationEngine::new().derive(&record);

        assert_eq!(outcome.record.mechanical_working_days, None);
        assert!(outcome
            .warnings()
            .any(|v| v.field == RecordField::MechanicalWorkingDays));
        assert!(outcome
            .warnings()
            .any(|v| v.field == RecordField::TechnicalStoppageDays));
    }

    #[test]
    fn test_planned_exit_passes_through() {
        let mut record = base_record();
        record.planned_exit_date = d(2024, 4, 11);
        record.intake_date = d(2024, 4, 3);

        let outcome = RecordDerivationEngine::new().derive(&record);

        assert_eq!(outcome.record.planned_exit_date, d(2024, 4, 11));
    }

    #[test]
    fn test_derive_is_idempotent() {
        let mut record = base_record();
        record.bodywork_piece_count = Some(3);
        record.mechanical_start = d(2024, 4, 2);
        record.mechanical_end = d(2024, 4, 5);
        record.bodywork_start = d(2024, 4, 8);

        let engine = RecordDerivationEngine::new();
        let first = engine.derive(&record);
        let second = engine.derive(&first.record);

        assert_eq!(first.record, second.record);
    }
}
