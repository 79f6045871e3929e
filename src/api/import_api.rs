// ==========================================
// 车队维修流转跟踪 - 旧表格导入 API
// ==========================================
// 职责: 封装旧表格 (data.xlsx / CSV) 导入
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::WorkshopConfigReader;
use crate::domain::import_batch::ImportReport;
use crate::importer::LegacyImporter;
use crate::repository::ServiceRecordRepository;
use std::path::Path;
use std::sync::Arc;

/// 导入API
pub struct ImportApi {
    record_repo: Arc<ServiceRecordRepository>,
    config: Arc<dyn WorkshopConfigReader>,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(
        record_repo: Arc<ServiceRecordRepository>,
        config: Arc<dyn WorkshopConfigReader>,
    ) -> Self {
        Self {
            record_repo,
            config,
        }
    }

    /// 导入旧表格
    ///
    /// # 参数
    /// - file_path: .xlsx / .xls / .csv 文件路径
    ///
    /// # 返回
    /// - Ok(ImportReport): 导入报告（行级问题在 violations 中）
    /// - Err(ApiError): 文件级错误或落库失败
    pub fn import_legacy_file(&self, file_path: &str) -> ApiResult<ImportReport> {
        if file_path.trim().is_empty() {
            return Err(ApiError::ImportError("文件路径不能为空".to_string()));
        }

        let importer = LegacyImporter::from_config(self.record_repo.clone(), self.config.as_ref())?;
        Ok(importer.import_file(Path::new(file_path))?)
    }
}
