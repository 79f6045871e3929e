// ==========================================
// 车队维修流转跟踪 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod import_batch;
pub mod record;
pub mod types;

// 重导出核心类型
pub use import_batch::{DqSummary, ImportReport};
pub use record::{
    DqViolation, RecordEdit, RecordField, RecordKey, ServiceRecord, DATE_FORMAT,
    PLANNED_EXIT_OFFSET_DAYS,
};
pub use types::{DqLevel, PartsNeeded, VehicleStatus};
