// ==========================================
// 车队维修流转跟踪 - 维修工单仓储
// ==========================================
// 职责: 管理 service_record 表
// 约束: (plate, intake_date) 唯一；intake_date 为空时按 IS 比较
// 红线: Repository 不含业务逻辑,派生字段原样读写
// ==========================================

use crate::db::{configure_sqlite_connection, init_schema};
use crate::domain::record::{RecordField, RecordKey, ServiceRecord};
use crate::domain::types::{PartsNeeded, VehicleStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

// ==========================================
// 词表字段 <-> TEXT 列
// ==========================================

impl ToSql for VehicleStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.label()))
    }
}

impl FromSql for VehicleStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        VehicleStatus::from_label(text)
            .ok_or_else(|| FromSqlError::Other(format!("未知车辆状态: {}", text).into()))
    }
}

impl ToSql for PartsNeeded {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.label()))
    }
}

impl FromSql for PartsNeeded {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        PartsNeeded::from_label(text)
            .ok_or_else(|| FromSqlError::Other(format!("未知配件标记: {}", text).into()))
    }
}

/// 读写列（顺序与旧表格列顺序一致）
const RECORD_COLUMNS: &str = "fleet_id, plate, model, intake_date, planned_exit_date, \
     vehicle_idle_days, company, days_to_start_mechanical, mechanical_start, \
     mechanical_working_days, mechanical_end, days_to_start_bodywork, bodywork_start, \
     bodywork_working_days, bodywork_end, bodywork_piece_count, status, downtime_days, \
     last_activity_date, parts_needed, technical_stoppage_days";

const KEY_PREDICATE: &str = "plate = ?1 AND intake_date IS ?2";

/// 与 RECORD_COLUMNS 同序的绑定参数
fn record_params(record: &ServiceRecord) -> [&dyn ToSql; 21] {
    [
        &record.fleet_id,
        &record.plate,
        &record.model,
        &record.intake_date,
        &record.planned_exit_date,
        &record.vehicle_idle_days,
        &record.company,
        &record.days_to_start_mechanical,
        &record.mechanical_start,
        &record.mechanical_working_days,
        &record.mechanical_end,
        &record.days_to_start_bodywork,
        &record.bodywork_start,
        &record.bodywork_working_days,
        &record.bodywork_end,
        &record.bodywork_piece_count,
        &record.status,
        &record.downtime_days,
        &record.last_activity_date,
        &record.parts_needed,
        &record.technical_stoppage_days,
    ]
}

fn map_record(row: &Row<'_>) -> rusqlite::Result<ServiceRecord> {
    Ok(ServiceRecord {
        fleet_id: row.get("fleet_id")?,
        plate: row.get("plate")?,
        model: row.get("model")?,
        company: row.get("company")?,
        intake_date: row.get("intake_date")?,
        mechanical_start: row.get("mechanical_start")?,
        mechanical_end: row.get("mechanical_end")?,
        bodywork_start: row.get("bodywork_start")?,
        bodywork_end: row.get("bodywork_end")?,
        bodywork_piece_count: row.get("bodywork_piece_count")?,
        status: row.get("status")?,
        parts_needed: row.get("parts_needed")?,
        planned_exit_date: row.get("planned_exit_date")?,
        days_to_start_mechanical: row.get("days_to_start_mechanical")?,
        mechanical_working_days: row.get("mechanical_working_days")?,
        days_to_start_bodywork: row.get("days_to_start_bodywork")?,
        bodywork_working_days: row.get("bodywork_working_days")?,
        last_activity_date: row.get("last_activity_date")?,
        vehicle_idle_days: row.get("vehicle_idle_days")?,
        downtime_days: row.get("downtime_days")?,
        technical_stoppage_days: row.get("technical_stoppage_days")?,
    })
}

/// LIMIT 参数: None → -1（SQLite 不限）
fn sql_limit(limit: Option<usize>) -> i64 {
    limit
        .and_then(|l| i64::try_from(l).ok())
        .unwrap_or(-1)
}

// ==========================================
// ServiceRecordRepository
// ==========================================
pub struct ServiceRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ServiceRecordRepository {
    /// 从已有连接创建（会对连接重新应用 PRAGMA 并确保表存在,幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            init_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== 内部查询（在调用方的连接/事务上执行）=====

    fn find_row(conn: &Connection, key: &RecordKey) -> RepositoryResult<Option<(i64, ServiceRecord)>> {
        let sql = format!(
            "SELECT row_no, {} FROM service_record WHERE {} ORDER BY row_no LIMIT 1",
            RECORD_COLUMNS, KEY_PREDICATE
        );
        let found = conn
            .query_row(&sql, params![key.plate, key.intake_date], |row| {
                Ok((row.get::<_, i64>("row_no")?, map_record(row)?))
            })
            .optional()?;
        Ok(found)
    }

    fn key_row_no(conn: &Connection, key: &RecordKey) -> RepositoryResult<Option<i64>> {
        let sql = format!(
            "SELECT row_no FROM service_record WHERE {} ORDER BY row_no LIMIT 1",
            KEY_PREDICATE
        );
        let row_no = conn
            .query_row(&sql, params![key.plate, key.intake_date], |row| row.get(0))
            .optional()?;
        Ok(row_no)
    }

    fn insert_row(conn: &Connection, record: &ServiceRecord) -> RepositoryResult<i64> {
        let key = record.key();
        if Self::key_row_no(conn, &key)?.is_some() {
            return Err(RepositoryError::DuplicateKey(key));
        }

        let placeholders = (1..=RecordField::SHEET_ORDER.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO service_record ({}) VALUES ({})",
            RECORD_COLUMNS, placeholders
        );
        conn.execute(&sql, record_params(record).as_slice())?;
        Ok(conn.last_insert_rowid())
    }

    // ===== 写入 =====

    /// 插入新工单（主键已存在 → DuplicateKey）
    ///
    /// # 返回
    /// - row_no: 插入顺序号
    pub fn insert(&self, record: &ServiceRecord) -> RepositoryResult<i64> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let row_no = Self::insert_row(&tx, record)?;
        tx.commit()?;

        debug!(row_no, key = %record.key(), "工单已插入");
        Ok(row_no)
    }

    /// 批量插入（单事务；任一主键重复则整体回滚）
    pub fn insert_batch(&self, records: &[ServiceRecord]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        for record in records {
            Self::insert_row(&tx, record)?;
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// 按原主键读取 → 变换 → 写回（同一事务内完成）
    ///
    /// # 参数
    /// - original: 工单当前主键
    /// - f: 由当前工单计算新工单；返回 Err 时不写入
    ///
    /// # 错误
    /// - NotFound: 原主键不存在
    /// - DuplicateKey: 新主键属于另一张工单
    pub fn update_with<F, E>(&self, original: &RecordKey, f: F) -> Result<ServiceRecord, E>
    where
        F: FnOnce(&ServiceRecord) -> Result<ServiceRecord, E>,
        E: From<RepositoryError>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction().map_err(RepositoryError::from)?;

        let (row_no, current) = Self::find_row(&tx, original)?
            .ok_or_else(|| RepositoryError::record_not_found(original))?;

        let updated = f(&current)?;

        let new_key = updated.key();
        if &new_key != original {
            if let Some(other) = Self::key_row_no(&tx, &new_key)? {
                if other != row_no {
                    return Err(RepositoryError::DuplicateKey(new_key).into());
                }
            }
        }

        let assignments = RecordField::SHEET_ORDER
            .iter()
            .enumerate()
            .map(|(i, field)| format!("{} = ?{}", field.column_name(), i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE service_record SET {} WHERE row_no = ?{}",
            assignments,
            RecordField::SHEET_ORDER.len() + 1
        );
        let mut values: Vec<&dyn ToSql> = record_params(&updated).to_vec();
        values.push(&row_no);
        tx.execute(&sql, values.as_slice())
            .map_err(RepositoryError::from)?;
        tx.commit().map_err(RepositoryError::from)?;

        debug!(row_no, from = %original, to = %new_key, "工单已更新");
        Ok(updated)
    }

    /// 按原主键整体覆盖工单
    pub fn update_by_key(
        &self,
        original: &RecordKey,
        record: &ServiceRecord,
    ) -> RepositoryResult<()> {
        self.update_with(original, |_| Ok::<_, RepositoryError>(record.clone()))?;
        Ok(())
    }

    // ===== 查询 =====

    pub fn find_by_key(&self, key: &RecordKey) -> RepositoryResult<Option<ServiceRecord>> {
        let conn = self.get_conn()?;
        Ok(Self::find_row(&conn, key)?.map(|(_, record)| record))
    }

    pub fn exists_key(&self, key: &RecordKey) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        Ok(Self::key_row_no(&conn, key)?.is_some())
    }

    /// 全部主键（插入顺序）
    pub fn list_keys(&self) -> RepositoryResult<Vec<RecordKey>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT plate, intake_date FROM service_record ORDER BY row_no")?;
        let keys = stmt
            .query_map([], |row| Ok(RecordKey::new(row.get::<_, String>(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    /// 全部工单（插入顺序）
    pub fn list_all(&self) -> RepositoryResult<Vec<ServiceRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM service_record ORDER BY row_no",
            RECORD_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map([], map_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// 车牌模糊查询（忽略大小写的子串匹配）
    pub fn search_by_plate(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> RepositoryResult<Vec<ServiceRecord>> {
        self.search_by_column("plate", query, limit)
    }

    /// 车队模糊查询（忽略大小写的子串匹配）
    pub fn search_by_fleet(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> RepositoryResult<Vec<ServiceRecord>> {
        self.search_by_column("fleet_id", query, limit)
    }

    fn search_by_column(
        &self,
        column: &'static str,
        query: &str,
        limit: Option<usize>,
    ) -> RepositoryResult<Vec<ServiceRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM service_record \
             WHERE instr(upper({}), upper(?1)) > 0 \
             ORDER BY row_no LIMIT ?2",
            RECORD_COLUMNS, column
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![query.trim(), sql_limit(limit)], map_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM service_record", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn repo() -> ServiceRecordRepository {
        let conn = Connection::open_in_memory().unwrap();
        ServiceRecordRepository::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    fn record(plate: &str, day: Option<u32>) -> ServiceRecord {
        ServiceRecord {
            plate: plate.to_string(),
            fleet_id: Some("ALFA".to_string()),
            intake_date: day.and_then(|d| NaiveDate::from_ymd_opt(2024, 4, d)),
            status: Some(VehicleStatus::AwaitingParts),
            parts_needed: Some(PartsNeeded::Yes),
            bodywork_piece_count: Some(0),
            ..Default::default()
        }
    }

    #[test]
    fn test_record_columns_follow_sheet_order() {
        let expected = RecordField::SHEET_ORDER
            .iter()
            .map(|f| f.column_name())
            .collect::<Vec<_>>()
            .join(", ");
        let actual = RECORD_COLUMNS.split_whitespace().collect::<Vec<_>>().join(" ");
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_insert_and_find_roundtrip_keeps_nulls() {
        let repo = repo();
        let original = record("AB123CD", Some(1));

        repo.insert(&original).unwrap();
        let found = repo.find_by_key(&original.key()).unwrap().unwrap();

        assert_eq!(found, original);
        // 0 与未设置严格区分
        assert_eq!(found.bodywork_piece_count, Some(0));
        assert_eq!(found.model, None);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let repo = repo();
        repo.insert(&record("AB123CD", Some(1))).unwrap();

        let err = repo.insert(&record("AB123CD", Some(1))).unwrap_err();

        assert!(matches!(err, RepositoryError::DuplicateKey(_)));
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_unset_intake_keys_collide() {
        let repo = repo();
        repo.insert(&record("AB123CD", None)).unwrap();

        assert!(repo.exists_key(&RecordKey::new("AB123CD", None)).unwrap());
        assert!(matches!(
            repo.insert(&record("AB123CD", None)),
            Err(RepositoryError::DuplicateKey(_))
        ));
        // 有进厂日的同车牌不冲突
        repo.insert(&record("AB123CD", Some(2))).unwrap();
    }

    #[test]
    fn test_update_by_key_moves_key() {
        let repo = repo();
        let original = record("AB123CD", Some(1));
        repo.insert(&original).unwrap();

        let mut moved = original.clone();
        moved.intake_date = NaiveDate::from_ymd_opt(2024, 4, 5);
        repo.update_by_key(&original.key(), &moved).unwrap();

        assert!(!repo.exists_key(&original.key()).unwrap());
        assert!(repo.exists_key(&moved.key()).unwrap());
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_update_into_existing_key_rejected() {
        let repo = repo();
        let first = record("AB123CD", Some(1));
        let second = record("AB123CD", Some(2));
        repo.insert(&first).unwrap();
        repo.insert(&second).unwrap();

        let err = repo.update_by_key(&second.key(), &first).unwrap_err();

        assert!(matches!(err, RepositoryError::DuplicateKey(_)));
        assert!(repo.exists_key(&second.key()).unwrap());
    }

    #[test]
    fn test_update_missing_key_is_not_found() {
        let repo = repo();
        let missing = record("ZZ999ZZ", Some(1));
        assert!(matches!(
            repo.update_by_key(&missing.key(), &missing),
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let repo = repo();
        repo.insert(&record("AB123CD", Some(1))).unwrap();
        repo.insert(&record("XY123ZZ", Some(1))).unwrap();
        repo.insert(&record("EF456GH", Some(1))).unwrap();

        let found = repo.search_by_plate("123", None).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].plate, "AB123CD");

        assert_eq!(repo.search_by_plate("ab1", None).unwrap().len(), 1);
        assert_eq!(repo.search_by_plate("123", Some(1)).unwrap().len(), 1);
        assert_eq!(repo.search_by_fleet("alf", None).unwrap().len(), 3);
    }

    #[test]
    fn test_insert_batch_rolls_back_on_duplicate() {
        let repo = repo();
        let batch = vec![record("AB123CD", Some(1)), record("AB123CD", Some(1))];

        assert!(repo.insert_batch(&batch).is_err());
        assert_eq!(repo.count().unwrap(), 0);
    }
}
