// ==========================================
// 车队维修流转跟踪 - 数据清洗器实现
// ==========================================
// 职责: TRIM / UPPER / NULL 标准化 / 日期与件数解析
// ==========================================

use crate::domain::record::DATE_FORMAT;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::DataCleaner as DataCleanerTrait;
use chrono::{NaiveDate, NaiveDateTime};

/// 旧表格中出现过的日期写法（按优先级）
const LEGACY_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d-%m-%Y"];
const LEGACY_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Default, Clone, Copy)]
pub struct DataCleaner;

impl DataCleanerTrait for DataCleaner {
    fn clean_text(&self, value: &str, uppercase: bool) -> String {
        let trimmed = value.trim();
        if uppercase {
            trimmed.to_uppercase()
        } else {
            trimmed.to_string()
        }
    }

    fn normalize_null(&self, value: Option<String>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    fn parse_date(&self, value: &str) -> Result<Option<NaiveDate>, chrono::ParseError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map(Some)
    }

    fn parse_legacy_date(&self, value: &str) -> Result<Option<NaiveDate>, chrono::ParseError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        // 表格工具回写的带时间戳日期
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, LEGACY_DATETIME_FORMAT) {
            return Ok(Some(datetime.date()));
        }

        let mut result = NaiveDate::parse_from_str(trimmed, DATE_FORMAT);
        for format in LEGACY_DATE_FORMATS {
            if result.is_ok() {
                break;
            }
            result = NaiveDate::parse_from_str(trimmed, format);
        }
        result.map(Some)
    }

    fn parse_piece_count(
        &self,
        value: &str,
        allow_integral_float: bool,
    ) -> ImportResult<Option<u32>> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        if let Ok(count) = trimmed.parse::<u32>() {
            return Ok(Some(count));
        }

        if allow_integral_float {
            if let Ok(float) = trimmed.parse::<f64>() {
                if float.is_finite()
                    && float.fract() == 0.0
                    && float >= 0.0
                    && float <= u32::MAX as f64
                {
                    return Ok(Some(float as u32));
                }
            }
        }

        Err(ImportError::NonNumericPieceCount(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_clean_text_basic() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.clean_text("  fiat panda  ", false), "fiat panda");
        assert_eq!(cleaner.clean_text("  fiat panda  ", true), "FIAT PANDA");
    }

    #[test]
    fn test_normalize_null() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.normalize_null(Some("  ".to_string())), None);
        assert_eq!(cleaner.normalize_null(Some("".to_string())), None);
        assert_eq!(
            cleaner.normalize_null(Some("  value  ".to_string())),
            Some("value".to_string())
        );
        assert_eq!(cleaner.normalize_null(None), None);
    }

    #[test]
    fn test_parse_date() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_date("01/04/2024").unwrap(), Some(d(2024, 4, 1)));
        assert_eq!(cleaner.parse_date("  ").unwrap(), None);
        assert!(cleaner.parse_date("2024-04-01").is_err());
        assert!(cleaner.parse_date("31/02/2024").is_err());
        assert!(cleaner.parse_date("domani").is_err());
    }

    #[test]
    fn test_parse_legacy_date() {
        let cleaner = DataCleaner;
        assert_eq!(
            cleaner.parse_legacy_date("01/04/2024").unwrap(),
            Some(d(2024, 4, 1))
        );
        assert_eq!(
            cleaner.parse_legacy_date("2024-04-01").unwrap(),
            Some(d(2024, 4, 1))
        );
        assert_eq!(
            cleaner.parse_legacy_date("2024-04-01 00:00:00").unwrap(),
            Some(d(2024, 4, 1))
        );
        assert!(cleaner.parse_legacy_date("aprile").is_err());
    }

    #[test]
    fn test_parse_piece_count() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_piece_count("3", false).unwrap(), Some(3));
        assert_eq!(cleaner.parse_piece_count("", false).unwrap(), None);
        assert_eq!(cleaner.parse_piece_count("2.0", true).unwrap(), Some(2));
        assert!(cleaner.parse_piece_count("2.0", false).is_err());
        assert!(cleaner.parse_piece_count("2.5", true).is_err());
        assert!(cleaner.parse_piece_count("-1", true).is_err());
        assert!(matches!(
            cleaner.parse_piece_count("tanti", false),
            Err(ImportError::NonNumericPieceCount(v)) if v == "tanti"
        ));
    }
}
