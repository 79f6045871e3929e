// ==========================================
// 车队维修流转跟踪 - 命令行入口
// ==========================================
// 输出: stdout 为 JSON,日志写 stderr
// ==========================================

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use fleet_workshop::config::AppConfig;
use fleet_workshop::domain::{RecordEdit, RecordKey, DATE_FORMAT};
use fleet_workshop::{logging, AppState};

#[derive(Parser)]
#[command(name = "fleet-workshop")]
#[command(version)]
#[command(about = "车队维修流转跟踪: 工单录入、派生计算、车队看板")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 数据库文件路径（覆盖 FLEET_WORKSHOP_DB_PATH）
    #[arg(long, global = true)]
    db: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 创建工单（阶段日期通过 update 录入）
    Insert {
        #[command(flatten)]
        edit: EditArgs,
    },

    /// 编辑工单（按原车牌 + 原进厂日定位）
    Update {
        /// 原车牌
        original_plate: String,

        /// 原进厂日 (DD/MM/YYYY)，不填表示进厂日未设置
        #[arg(long = "at")]
        original_intake: Option<String>,

        #[command(flatten)]
        edit: EditArgs,
    },

    /// 查看单张工单
    Show {
        plate: String,

        /// 进厂日 (DD/MM/YYYY)
        #[arg(long = "at")]
        intake: Option<String>,
    },

    /// 按车牌模糊查询
    Search { query: String },

    /// 车队状态看板
    Fleet {
        query: String,

        /// 输出匹配的工单而不是看板
        #[arg(long)]
        list: bool,
    },

    /// 导入旧表格 (data.xlsx / .csv)
    Import { file: String },

    /// 配置管理
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// 列出已写入的配置
    List,
    /// 读取单个配置
    Get { key: String },
    /// 写入配置
    Set { key: String, value: String },
}

/// 可编辑字段；传空字符串表示清空
#[derive(Args, Debug, Default)]
struct EditArgs {
    /// 车队 (FLOTTA)
    #[arg(long)]
    fleet: Option<String>,
    /// 车牌 (TARGA)
    #[arg(long)]
    plate: Option<String>,
    /// 车型 (MODELLO)
    #[arg(long)]
    model: Option<String>,
    /// 委托公司 (DITTA)
    #[arg(long)]
    company: Option<String>,
    /// 进厂日 (ENTRATA)
    #[arg(long)]
    intake: Option<String>,
    /// 机修开始 (INIZIO.MECC)
    #[arg(long)]
    mech_start: Option<String>,
    /// 机修结束 (FINE MECC)
    #[arg(long)]
    mech_end: Option<String>,
    /// 钣金开始 (INIZIO CARR)
    #[arg(long)]
    body_start: Option<String>,
    /// 钣金结束 (FINE CARR)
    #[arg(long)]
    body_end: Option<String>,
    /// 钣金件数 (PZ CARR)
    #[arg(long)]
    pieces: Option<String>,
    /// 状态 (STATO)
    #[arg(long)]
    status: Option<String>,
    /// 需要配件 (RICAMBI): SÌ / NO
    #[arg(long)]
    parts: Option<String>,
}

impl From<EditArgs> for RecordEdit {
    fn from(args: EditArgs) -> Self {
        RecordEdit {
            fleet_id: args.fleet,
            plate: args.plate,
            model: args.model,
            company: args.company,
            intake_date: args.intake,
            mechanical_start: args.mech_start,
            mechanical_end: args.mech_end,
            bodywork_start: args.body_start,
            bodywork_end: args.body_end,
            bodywork_piece_count: args.pieces,
            status: args.status,
            parts_needed: args.parts,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let app_config = AppConfig::from_env();
    logging::init(&app_config.log_filter);

    let db_path = cli.db.clone().unwrap_or(app_config.db_path);
    tracing::info!(version = fleet_workshop::VERSION, db_path = %db_path, "{}", fleet_workshop::APP_NAME);

    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;
    run(&state, cli.command)
}

fn run(state: &AppState, command: Commands) -> Result<()> {
    match command {
        Commands::Insert { edit } => {
            let response = state.record_api.create_record(&edit.into())?;
            print_json(&response)
        }
        Commands::Update {
            original_plate,
            original_intake,
            edit,
        } => {
            let edit: RecordEdit = edit.into();
            if edit.is_empty() {
                bail!("没有任何字段改动");
            }
            let key = record_key(&original_plate, original_intake.as_deref())?;
            let response = state.record_api.update_record(&key, &edit)?;
            print_json(&response)
        }
        Commands::Show { plate, intake } => {
            let key = record_key(&plate, intake.as_deref())?;
            print_json(&state.record_api.get_record(&key)?)
        }
        Commands::Search { query } => print_json(&state.record_api.search_by_plate(&query)?),
        Commands::Fleet { query, list } => {
            if list {
                print_json(&state.record_api.search_by_fleet(&query)?)
            } else {
                print_json(&state.record_api.fleet_status_board(&query)?)
            }
        }
        Commands::Import { file } => print_json(&state.import_api.import_legacy_file(&file)?),
        Commands::Config { action } => match action {
            ConfigAction::List => print_json(&state.config_api.list_configs()?),
            ConfigAction::Get { key } => print_json(&state.config_api.get_config(&key)?),
            ConfigAction::Set { key, value } => {
                state.config_api.update_config(&key, &value)?;
                print_json(&state.config_api.get_config(&key)?)
            }
        },
    }
}

/// 进厂日为空表示未设置
fn record_key(plate: &str, intake: Option<&str>) -> Result<RecordKey> {
    let intake_date = match intake.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) => Some(
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .with_context(|| format!("进厂日格式错误（期望 DD/MM/YYYY）: '{}'", text))?,
        ),
        None => None,
    };
    Ok(RecordKey::new(plate.trim(), intake_date))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
