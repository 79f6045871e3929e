// ==========================================
// 车队维修流转跟踪 - 应用层
// ==========================================
// 职责: 组装仓储/配置/API,供命令行与集成测试使用
// ==========================================

pub mod state;

// 重导出
pub use state::AppState;
