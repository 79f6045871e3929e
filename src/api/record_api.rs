// ==========================================
// 车队维修流转跟踪 - 维修工单 API
// ==========================================
// 职责: 工单创建/编辑/查询、车队看板
// 红线: 编辑必须整体成功或整体拒绝；派生字段只由派生引擎写入
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::WorkshopConfigReader;
use crate::domain::record::{
    DqViolation, RecordEdit, RecordKey, ServiceRecord, PLANNED_EXIT_OFFSET_DAYS,
};
use crate::engine::{BusinessCalendar, FleetStatusBoard, RecordDerivationEngine};
use crate::importer::{DataCleaner, DataCleanerImpl, FieldMapper, FieldMapperImpl, ImportError};
use crate::repository::{RepositoryError, ServiceRecordRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 工单写入响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordResponse {
    /// 落库后的工单
    pub record: ServiceRecord,
    /// 本次写入产生的警告/提示（不阻断保存）
    pub violations: Vec<DqViolation>,
}

// ==========================================
// ServiceRecordApi - 维修工单 API
// ==========================================
pub struct ServiceRecordApi {
    record_repo: Arc<ServiceRecordRepository>,
    config: Arc<dyn WorkshopConfigReader>,
    derivation_engine: RecordDerivationEngine,
}

impl ServiceRecordApi {
    pub fn new(
        record_repo: Arc<ServiceRecordRepository>,
        config: Arc<dyn WorkshopConfigReader>,
    ) -> Self {
        Self {
            record_repo,
            config,
            derivation_engine: RecordDerivationEngine::new(),
        }
    }

    fn text_uppercase(&self) -> ApiResult<bool> {
        self.config
            .get_text_uppercase()
            .map_err(|e| ApiError::ConfigError(e.to_string()))
    }

    /// 按当前配置构造字段映射器
    fn field_mapper(&self) -> ApiResult<FieldMapperImpl> {
        Ok(FieldMapperImpl::new(self.text_uppercase()?))
    }

    /// 查找用主键: 车牌按录入规则清洗,与落库值一致
    fn lookup_key(&self, key: &RecordKey) -> ApiResult<RecordKey> {
        let plate = DataCleanerImpl.clean_text(&key.plate, self.text_uppercase()?);
        Ok(RecordKey::new(plate, key.intake_date))
    }

    fn search_limit(&self) -> ApiResult<usize> {
        self.config
            .get_search_result_limit()
            .map_err(|e| ApiError::ConfigError(e.to_string()))
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 创建工单
    ///
    /// # 说明
    /// - 车牌必填
    /// - 机修/钣金阶段日期不在创建时录入（首次编辑时填写并派生）
    /// - 计划出厂日 = 进厂日 + 10 天,其余派生字段留空
    ///
    /// # 错误
    /// - InvalidInput: 日期/词表字段无法解析,车牌为空,或带有阶段日期
    /// - DuplicateKey: (车牌, 进厂日) 已存在
    #[instrument(skip(self, edit))]
    pub fn create_record(&self, edit: &RecordEdit) -> ApiResult<RecordResponse> {
        let phase_fields = edit.phase_date_fields();
        if !phase_fields.is_empty() {
            let labels: Vec<&str> = phase_fields.iter().map(|f| f.sheet_label()).collect();
            return Err(ApiError::InvalidInput {
                message: format!("创建工单时不能录入阶段日期: {}", labels.join(", ")),
                fields: phase_fields,
            });
        }

        let mapper = self.field_mapper()?;
        let (mut record, violations) = mapper.apply_edit(&ServiceRecord::default(), edit)?;

        if record.plate.is_empty() {
            return Err(ImportError::PlateMissing.into());
        }

        record.planned_exit_date = record
            .intake_date
            .and_then(|intake| BusinessCalendar::planned_exit_date(intake, PLANNED_EXIT_OFFSET_DAYS));

        let row_no = self.record_repo.insert(&record).map_err(|e| {
            if let RepositoryError::DuplicateKey(key) = &e {
                warn!(key = %key, "工单已存在,拒绝创建");
            }
            ApiError::from(e)
        })?;

        info!(row_no, key = %record.key(), warnings = violations.len(), "工单已创建");
        Ok(RecordResponse { record, violations })
    }

    /// 编辑工单
    ///
    /// # 参数
    /// - original: 编辑前的 (车牌, 进厂日)
    /// - edit: 本次改动的字段文本
    ///
    /// # 说明
    /// 读取、应用编辑、重新派生、写回在同一事务内完成；
    /// 计划出厂日不随进厂日变化
    ///
    /// # 错误
    /// - NotFound: 原工单不存在
    /// - InvalidInput: 任一字段无法解析（不写入任何改动）
    /// - DuplicateKey: 新主键属于另一张工单
    #[instrument(skip(self, edit), fields(original = %original))]
    pub fn update_record(
        &self,
        original: &RecordKey,
        edit: &RecordEdit,
    ) -> ApiResult<RecordResponse> {
        let mapper = self.field_mapper()?;
        let original = self.lookup_key(original)?;
        let mut violations = Vec::new();

        let record = self.record_repo.update_with(&original, |current| {
            let (edited, edit_violations) = mapper.apply_edit(current, edit)?;
            let outcome = self.derivation_engine.derive(&edited);
            violations.extend(edit_violations);
            violations.extend(outcome.violations);
            Ok::<_, ApiError>(outcome.record)
        })?;

        info!(key = %record.key(), warnings = violations.len(), "工单已更新");
        Ok(RecordResponse { record, violations })
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get_record(&self, key: &RecordKey) -> ApiResult<ServiceRecord> {
        let key = self.lookup_key(key)?;
        self.record_repo
            .find_by_key(&key)?
            .ok_or_else(|| RepositoryError::record_not_found(&key).into())
    }

    /// 车牌模糊查询（结果数受 search_result_limit 限制）
    pub fn search_by_plate(&self, query: &str) -> ApiResult<Vec<ServiceRecord>> {
        let limit = self.search_limit()?;
        Ok(self.record_repo.search_by_plate(query, Some(limit))?)
    }

    /// 车队模糊查询（结果数受 search_result_limit 限制）
    pub fn search_by_fleet(&self, query: &str) -> ApiResult<Vec<ServiceRecord>> {
        let limit = self.search_limit()?;
        Ok(self.record_repo.search_by_fleet(query, Some(limit))?)
    }

    /// 车队状态看板（统计全部匹配工单,不受查询上限影响）
    pub fn fleet_status_board(&self, fleet_query: &str) -> ApiResult<FleetStatusBoard> {
        let records = self.record_repo.search_by_fleet(fleet_query, None)?;
        Ok(FleetStatusBoard::build(fleet_query, &records))
    }
}
