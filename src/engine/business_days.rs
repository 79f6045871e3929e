// ==========================================
// 车队维修流转跟踪 - 工作日计算纯函数库
// ==========================================
// 职责: 工作日计数 (周一至周五,无节假日日历)、计划出厂日
// 红线: 无状态、无副作用、无 I/O 操作
// ==========================================

use chrono::{Datelike, Days, NaiveDate};
use std::fmt;

/// 区间倒置: 结束日早于开始日
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvertedInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for InvertedInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "结束日 {} 早于开始日 {}",
            self.end.format("%d/%m/%Y"),
            self.start.format("%d/%m/%Y")
        )
    }
}

impl std::error::Error for InvertedInterval {}

// ==========================================
// BusinessCalendar - 纯函数工具类
// ==========================================
pub struct BusinessCalendar;

impl BusinessCalendar {
    /// 计算两个日期之间的工作日数
    ///
    /// # 规则
    /// - 统计半开区间 [start, end) 内的周一至周五天数
    /// - 同一天 → 0
    /// - end < start → Err(InvertedInterval)，不返回负数
    ///
    /// # 示例
    /// ```
    /// use chrono::NaiveDate;
    /// use fleet_workshop::engine::BusinessCalendar;
    ///
    /// // 周五 → 下周一: 只经过周五 1 个工作日
    /// let friday = NaiveDate::from_ymd_opt(2024, 4, 5).unwrap();
    /// let monday = NaiveDate::from_ymd_opt(2024, 4, 8).unwrap();
    /// assert_eq!(BusinessCalendar::business_days_between(friday, monday), Ok(1));
    /// ```
    pub fn business_days_between(
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64, InvertedInterval> {
        if end < start {
            return Err(InvertedInterval { start, end });
        }

        let total_days = end.signed_duration_since(start).num_days();
        let full_weeks = total_days / 7;
        let remainder = total_days % 7;

        // 整周贡献 5 天,余下不足一周的部分逐日判定（最多 6 天）
        let mut count = full_weeks * 5;
        let mut weekday = start.weekday().num_days_from_monday();
        for _ in 0..remainder {
            if weekday < 5 {
                count += 1;
            }
            weekday = (weekday + 1) % 7;
        }

        Ok(count)
    }

    /// 可选端点版本: 任一端点缺失 → Ok(None)
    pub fn business_days_opt(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Option<i64>, InvertedInterval> {
        match (start, end) {
            (Some(s), Some(e)) => Self::business_days_between(s, e).map(Some),
            _ => Ok(None),
        }
    }

    /// 是否工作日
    pub fn is_business_day(date: NaiveDate) -> bool {
        date.weekday().num_days_from_monday() < 5
    }

    /// 计算计划出厂日（自然日偏移）
    ///
    /// 日期溢出（超出 chrono 可表示范围）时返回 None
    pub fn planned_exit_date(intake_date: NaiveDate, offset_days: u64) -> Option<NaiveDate> {
        intake_date.checked_add_days(Days::new(offset_days))
    }
}
