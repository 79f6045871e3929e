// ==========================================
// 车队维修流转跟踪 - 车间配置读取 Trait
// ==========================================
// 职责: 定义解析/查询/导入所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use std::error::Error;

// ==========================================
// WorkshopConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait WorkshopConfigReader: Send + Sync {
    /// 文本字段是否统一转大写
    ///
    /// # 默认值
    /// - true
    fn get_text_uppercase(&self) -> Result<bool, Box<dyn Error>>;

    /// 车牌/车队查询最多返回的工单数
    ///
    /// # 默认值
    /// - 500
    fn get_search_result_limit(&self) -> Result<usize, Box<dyn Error>>;

    /// 导入 Excel 时读取的工作表
    ///
    /// # 返回
    /// - None: 第一个工作表（默认）
    fn get_import_sheet_name(&self) -> Result<Option<String>, Box<dyn Error>>;
}
