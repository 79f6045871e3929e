// ==========================================
// 车队维修流转跟踪 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表幂等（CREATE TABLE IF NOT EXISTS）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;
use tracing::{info, warn};

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接、应用统一配置并确保表结构存在
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// 建表（幂等）
///
/// - service_record: 一列一个字段,NULL 表示未设置；row_no 保持插入顺序
/// - config_kv: 全局配置键值
/// - schema_version: 表结构版本
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS service_record (
          row_no INTEGER PRIMARY KEY AUTOINCREMENT,
          fleet_id TEXT,
          plate TEXT NOT NULL,
          model TEXT,
          company TEXT,
          intake_date TEXT,
          planned_exit_date TEXT,
          vehicle_idle_days INTEGER,
          days_to_start_mechanical INTEGER,
          mechanical_start TEXT,
          mechanical_working_days INTEGER,
          mechanical_end TEXT,
          days_to_start_bodywork INTEGER,
          bodywork_start TEXT,
          bodywork_working_days INTEGER,
          bodywork_end TEXT,
          bodywork_piece_count INTEGER,
          status TEXT,
          downtime_days INTEGER,
          last_activity_date TEXT,
          parts_needed TEXT,
          technical_stoppage_days INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_service_record_key
          ON service_record(plate, intake_date);
        CREATE INDEX IF NOT EXISTS idx_service_record_fleet
          ON service_record(fleet_id);

        CREATE TABLE IF NOT EXISTS config_kv (
          scope_id TEXT NOT NULL DEFAULT 'global',
          key TEXT NOT NULL,
          value TEXT NOT NULL,
          updated_at TEXT NOT NULL DEFAULT (datetime('now')),
          PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS schema_version (
          version INTEGER PRIMARY KEY,
          applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;

    let current = read_schema_version(conn)?;
    match current {
        None => {
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [CURRENT_SCHEMA_VERSION],
            )?;
            info!(version = CURRENT_SCHEMA_VERSION, "数据库表结构已初始化");
        }
        Some(v) if v != CURRENT_SCHEMA_VERSION => {
            warn!(
                found = v,
                expected = CURRENT_SCHEMA_VERSION,
                "数据库 schema_version 与当前程序不一致"
            );
        }
        Some(_) => {}
    }

    Ok(())
}

/// 读取 schema_version（表不存在或为空时返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
