// ==========================================
// 车队维修流转跟踪 - 引擎层
// ==========================================
// 职责: 派生字段计算、工作日计数、车队看板
// 红线: Engine 不拼 SQL, 不做 I/O
// ==========================================

pub mod business_days;
pub mod fleet_board;
pub mod record_derivation;

// 重导出核心引擎
pub use business_days::{BusinessCalendar, InvertedInterval};
pub use fleet_board::{FleetStatusBoard, StatusColumn};
pub use record_derivation::{
    DerivationOutcome, InvalidationCondition, InvalidationRule, RecordDerivationEngine,
    INVALIDATION_RULES,
};
