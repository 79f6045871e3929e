// ==========================================
// 车队维修流转跟踪 - 冲突处理器实现
// ==========================================
// 职责: 检测同批次内 / 与库中已有工单重复的 (车牌, 进厂日)
// 策略: 首次出现者保留,后续重复行跳过
// ==========================================

use crate::domain::record::RecordKey;
use crate::importer::importer_trait::ConflictHandler as ConflictHandlerTrait;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default, Clone, Copy)]
pub struct ConflictHandler;

impl ConflictHandlerTrait for ConflictHandler {
    /// 检测同批次内重复主键
    ///
    /// # 返回
    /// - Vec<(行号, 主键)>: 重复记录列表（不包括第一次出现）
    fn detect_duplicates(&self, keys: &[(usize, RecordKey)]) -> Vec<(usize, RecordKey)> {
        let mut first_occurrence: HashMap<&RecordKey, usize> = HashMap::new();
        let mut duplicates = Vec::new();

        for (row_number, key) in keys {
            if first_occurrence.contains_key(key) {
                duplicates.push((*row_number, key.clone()));
            } else {
                first_occurrence.insert(key, *row_number);
            }
        }

        duplicates
    }

    /// 检测与库中已有工单重复的主键
    ///
    /// # 参数
    /// - keys: 待导入行的主键
    /// - existing: 库中已存在的主键集合
    fn detect_cross_batch_duplicates(
        &self,
        keys: &[(usize, RecordKey)],
        existing: &HashSet<RecordKey>,
    ) -> Vec<(usize, RecordKey)> {
        keys.iter()
            .filter(|(_, key)| existing.contains(key))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn key(plate: &str, day: Option<u32>) -> RecordKey {
        RecordKey::new(plate, day.and_then(|d| NaiveDate::from_ymd_opt(2024, 4, d)))
    }

    #[test]
    fn test_detect_duplicates_none() {
        let handler = ConflictHandler;
        let keys = vec![(2, key("AA111AA", Some(1))), (3, key("AA111AA", Some(2)))];

        assert!(handler.detect_duplicates(&keys).is_empty());
    }

    #[test]
    fn test_detect_duplicates_keeps_first() {
        let handler = ConflictHandler;
        let keys = vec![
            (2, key("AA111AA", Some(1))),
            (3, key("BB222BB", Some(1))),
            (4, key("AA111AA", Some(1))),
            (5, key("AA111AA", Some(1))),
        ];

        let duplicates = handler.detect_duplicates(&keys);

        assert_eq!(duplicates.len(), 2);
        assert_eq!(duplicates[0].0, 4);
        assert_eq!(duplicates[1].0, 5);
    }

    #[test]
    fn test_unset_intake_dates_collide() {
        let handler = ConflictHandler;
        let keys = vec![(2, key("AA111AA", None)), (3, key("AA111AA", None))];

        assert_eq!(handler.detect_duplicates(&keys).len(), 1);
    }

    #[test]
    fn test_detect_cross_batch_duplicates() {
        let handler = ConflictHandler;
        let keys = vec![(2, key("AA111AA", Some(1))), (3, key("BB222BB", Some(1)))];
        let existing: HashSet<RecordKey> = [key("BB222BB", Some(1))].into_iter().collect();

        let duplicates = handler.detect_cross_batch_duplicates(&keys, &existing);

        assert_eq!(duplicates, vec![(3, key("BB222BB", Some(1)))]);
    }
}
