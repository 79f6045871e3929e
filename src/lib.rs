// ==========================================
// 车队维修流转跟踪 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 维修工单记录与派生计算 (人工录入,系统只算派生字段)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 派生规则
pub mod engine;

// 导入层 - 编辑输入解析与旧表格导入
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DqLevel, PartsNeeded, VehicleStatus};

// 领域实体
pub use domain::{
    DqSummary, DqViolation, ImportReport, RecordEdit, RecordField, RecordKey, ServiceRecord,
};

// 引擎
pub use engine::{BusinessCalendar, DerivationOutcome, FleetStatusBoard, RecordDerivationEngine};

// API
pub use api::{ApiError, ApiResult, ConfigApi, ImportApi, ServiceRecordApi};

// 应用
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "车队维修流转跟踪";
