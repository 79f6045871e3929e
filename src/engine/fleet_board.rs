// ==========================================
// 车队维修流转跟踪 - 车队状态看板
// ==========================================
// 职责: 按状态分列汇总车队在修车辆
// 红线: 纯函数；只产出数据,不负责渲染
// ==========================================

use crate::domain::record::ServiceRecord;
use crate::domain::types::VehicleStatus;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 看板单列: 一个状态下的车牌（保持工单顺序）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusColumn {
    pub status: VehicleStatus,
    pub plates: Vec<String>,
    pub count: usize,
}

/// 车队状态看板
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetStatusBoard {
    pub fleet_query: String,
    pub columns: Vec<StatusColumn>,
    /// 看板行数 = 最长列的长度
    pub row_count: usize,
    /// 匹配工单中的不重复车牌数（无状态的工单也计入）
    pub total_plates: usize,
}

impl FleetStatusBoard {
    /// 由已按车队过滤的工单构建看板
    pub fn build(fleet_query: &str, records: &[ServiceRecord]) -> Self {
        let columns: Vec<StatusColumn> = VehicleStatus::ALL
            .iter()
            .map(|&status| {
                let plates: Vec<String> = records
                    .iter()
                    .filter(|r| r.status == Some(status))
                    .map(|r| r.plate.clone())
                    .collect();
                StatusColumn {
                    status,
                    count: plates.len(),
                    plates,
                }
            })
            .collect();

        let row_count = columns.iter().map(|c| c.count).max().unwrap_or(0);
        let total_plates = records
            .iter()
            .map(|r| r.plate.as_str())
            .collect::<HashSet<_>>()
            .len();

        Self {
            fleet_query: fleet_query.to_string(),
            columns,
            row_count,
            total_plates,
        }
    }

    pub fn column(&self, status: VehicleStatus) -> Option<&StatusColumn> {
        self.columns.iter().find(|c| c.status == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(plate: &str, status: Option<VehicleStatus>) -> ServiceRecord {
        ServiceRecord {
            plate: plate.to_string(),
            fleet_id: Some("ALFA".to_string()),
            status,
            ..Default::default()
        }
    }

    #[test]
    fn test_board_groups_by_status() {
        let records = vec![
            record("AA111AA", Some(VehicleStatus::Ready)),
            record("BB222BB", Some(VehicleStatus::MechanicalRepair)),
            record("CC333CC", Some(VehicleStatus::Ready)),
            record("DD444DD", None),
        ];

        let board = FleetStatusBoard::build("alfa", &records);

        assert_eq!(board.columns.len(), 13);
        assert_eq!(board.columns[0].status, VehicleStatus::AwaitingAppraisal);

        let ready = board.column(VehicleStatus::Ready).unwrap();
        assert_eq!(ready.plates, vec!["AA111AA", "CC333CC"]);
        assert_eq!(ready.count, 2);

        assert_eq!(board.row_count, 2);
        assert_eq!(board.total_plates, 4);
    }

    #[test]
    fn test_board_counts_distinct_plates() {
        let records = vec![
            record("AA111AA", Some(VehicleStatus::Finished)),
            record("AA111AA", Some(VehicleStatus::ToInvoice)),
        ];

        let board = FleetStatusBoard::build("ALFA", &records);

        assert_eq!(board.total_plates, 1);
        assert_eq!(board.row_count, 1);
    }

    #[test]
    fn test_empty_board() {
        let board = FleetStatusBoard::build("NESSUNA", &[]);
        assert_eq!(board.row_count, 0);
        assert_eq!(board.total_plates, 0);
        assert!(board.columns.iter().all(|c| c.plates.is_empty()));
    }
}
