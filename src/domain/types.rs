// ==========================================
// 车队维修流转跟踪 - 领域类型定义
// ==========================================
// 职责: 车辆状态词表、配件标记、数据质量级别
// 红线: 词表顺序即看板列顺序,不得随意调整
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 车辆状态 (Vehicle Status)
// ==========================================
// 取值为车间固定词表,序列化为原始标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleStatus {
    #[serde(rename = "ATT.PERZ.")]
    AwaitingAppraisal, // 等待定损
    #[serde(rename = "ATT.AUT.")]
    AwaitingAuthorization, // 等待授权
    #[serde(rename = "ATT.RIC.")]
    AwaitingParts, // 等待配件
    #[serde(rename = "LAV.CAR1")]
    Bodywork1, // 钣金 1
    #[serde(rename = "LAV.CAR2")]
    Bodywork2, // 钣金 2
    #[serde(rename = "LAV.CAR3")]
    Bodywork3, // 钣金 3
    #[serde(rename = "LAV.CAR4")]
    Bodywork4, // 钣金 4
    #[serde(rename = "LAV.MECC.")]
    MechanicalRepair, // 机修中
    #[serde(rename = "FIN")]
    Finished, // 完工
    #[serde(rename = "ALTRI LAVORI")]
    OtherWork, // 其他作业
    #[serde(rename = "DA FATTURARE")]
    ToInvoice, // 待开票
    #[serde(rename = "PRONTA")]
    Ready, // 可交车
    #[serde(rename = "PRE-CONSEGNA")]
    PreDelivery, // 交车前检查
}

impl VehicleStatus {
    /// 全部状态（看板列顺序）
    pub const ALL: [VehicleStatus; 13] = [
        VehicleStatus::AwaitingAppraisal,
        VehicleStatus::AwaitingAuthorization,
        VehicleStatus::AwaitingParts,
        VehicleStatus::Bodywork1,
        VehicleStatus::Bodywork2,
        VehicleStatus::Bodywork3,
        VehicleStatus::Bodywork4,
        VehicleStatus::MechanicalRepair,
        VehicleStatus::Finished,
        VehicleStatus::OtherWork,
        VehicleStatus::ToInvoice,
        VehicleStatus::Ready,
        VehicleStatus::PreDelivery,
    ];

    /// 车间标签
    pub fn label(&self) -> &'static str {
        match self {
            VehicleStatus::AwaitingAppraisal => "ATT.PERZ.",
            VehicleStatus::AwaitingAuthorization => "ATT.AUT.",
            VehicleStatus::AwaitingParts => "ATT.RIC.",
            VehicleStatus::Bodywork1 => "LAV.CAR1",
            VehicleStatus::Bodywork2 => "LAV.CAR2",
            VehicleStatus::Bodywork3 => "LAV.CAR3",
            VehicleStatus::Bodywork4 => "LAV.CAR4",
            VehicleStatus::MechanicalRepair => "LAV.MECC.",
            VehicleStatus::Finished => "FIN",
            VehicleStatus::OtherWork => "ALTRI LAVORI",
            VehicleStatus::ToInvoice => "DA FATTURARE",
            VehicleStatus::Ready => "PRONTA",
            VehicleStatus::PreDelivery => "PRE-CONSEGNA",
        }
    }

    /// 从标签解析（TRIM + 忽略大小写）
    pub fn from_label(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.label() == normalized)
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ==========================================
// 是否需要配件 (Parts Needed)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartsNeeded {
    #[serde(rename = "SÌ")]
    Yes,
    #[serde(rename = "NO")]
    No,
}

impl PartsNeeded {
    pub fn label(&self) -> &'static str {
        match self {
            PartsNeeded::Yes => "SÌ",
            PartsNeeded::No => "NO",
        }
    }

    /// 解析配件标记
    ///
    /// 旧表格里存在编码错乱的 "SÃŒ"，同样视为"是"
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "SÌ" | "SI" | "SÍ" | "YES" | "Y" | "SÃŒ" => Some(PartsNeeded::Yes),
            "NO" | "N" => Some(PartsNeeded::No),
            _ => None,
        }
    }
}

impl fmt::Display for PartsNeeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ==========================================
// DqLevel - 数据质量级别
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DqLevel {
    Error,    // 错误（阻断写入）
    Warning,  // 警告（允许写入,字段置空）
    Info,     // 提示（仅记录）
    Conflict, // 冲突（主键重复,跳过）
}

impl fmt::Display for DqLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DqLevel::Error => write!(f, "ERROR"),
            DqLevel::Warning => write!(f, "WARNING"),
            DqLevel::Info => write!(f, "INFO"),
            DqLevel::Conflict => write!(f, "CONFLICT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_label() {
        assert_eq!(
            VehicleStatus::from_label("LAV.MECC."),
            Some(VehicleStatus::MechanicalRepair)
        );
        // 忽略首尾空白与大小写
        assert_eq!(
            VehicleStatus::from_label("  pronta "),
            Some(VehicleStatus::Ready)
        );
        assert_eq!(
            VehicleStatus::from_label("altri lavori"),
            Some(VehicleStatus::OtherWork)
        );
        assert_eq!(VehicleStatus::from_label("RIPARATA"), None);
    }

    #[test]
    fn test_status_label_roundtrip_covers_vocabulary() {
        for status in VehicleStatus::ALL {
            assert_eq!(VehicleStatus::from_label(status.label()), Some(status));
        }
    }

    #[test]
    fn test_parts_needed_spellings() {
        assert_eq!(PartsNeeded::from_label("Sì"), Some(PartsNeeded::Yes));
        assert_eq!(PartsNeeded::from_label("si"), Some(PartsNeeded::Yes));
        assert_eq!(PartsNeeded::from_label("SÃŒ"), Some(PartsNeeded::Yes));
        assert_eq!(PartsNeeded::from_label("no"), Some(PartsNeeded::No));
        assert_eq!(PartsNeeded::from_label("forse"), None);
    }

    #[test]
    fn test_status_serde_uses_label() {
        let json = serde_json::to_string(&VehicleStatus::ToInvoice).unwrap();
        assert_eq!(json, "\"DA FATTURARE\"");
    }
}
