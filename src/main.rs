// ==========================================
// 文档库 Excel 导入 - 命令行入口
// ==========================================
// 子命令:
//   run            执行一次客户批次导入
//   check-schema   校验客户 Schema 文件
//   validate-file  本地文件试运行（不落库、不写回）
// ==========================================

use anyhow::Result;
use clap::{Parser, Subcommand};
use excel_loader::config::app_config::default_schema_dir;
use excel_loader::i18n::{is_supported, DEFAULT_LOCALE};
use excel_loader::{
    logging, process_local_file, AppConfig, BatchImporter, GraphConnector, SchemaRegistry,
    SqliteSink,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "excel-loader")]
#[command(author, version, about = "文档库 Excel 导入 - 校验 - 落库批处理")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// 以 JSON 格式输出日志
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 执行一次客户批次导入
    Run {
        /// 客户编码
        #[arg(short, long)]
        customer: String,

        /// .env 文件路径
        #[arg(long)]
        env_file: Option<PathBuf>,

        /// 以 JSON 输出批次报告
        #[arg(long)]
        json: bool,
    },

    /// 校验客户 Schema 文件
    CheckSchema {
        /// 客户编码
        #[arg(short, long)]
        customer: String,

        /// Schema 目录
        #[arg(long, env = "SCHEMA_DIR")]
        schema_dir: Option<PathBuf>,
    },

    /// 本地文件试运行
    ValidateFile {
        /// 客户编码
        #[arg(short, long)]
        customer: String,

        /// 待校验文件
        #[arg(short, long)]
        file: PathBuf,

        /// Schema 目录
        #[arg(long, env = "SCHEMA_DIR")]
        schema_dir: Option<PathBuf>,

        /// 错误描述语言
        #[arg(long, env = "LOADER_LOCALE", default_value = DEFAULT_LOCALE)]
        locale: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }
    info!(version = excel_loader::VERSION, "{} 启动", excel_loader::APP_NAME);

    match cli.command {
        Command::Run {
            customer,
            env_file,
            json,
        } => run(&customer, env_file, json).await,
        Command::CheckSchema {
            customer,
            schema_dir,
        } => check_schema(&customer, schema_dir),
        Command::ValidateFile {
            customer,
            file,
            schema_dir,
            locale,
        } => validate_file(&customer, &file, schema_dir, &locale),
    }
}

async fn run(customer: &str, env_file: Option<PathBuf>, json: bool) -> Result<()> {
    let config = AppConfig::from_env(env_file.as_deref())?;
    info!(
        schema_dir = %config.schema_dir.display(),
        database = %config.database.path.display(),
        locale = %config.locale,
        "配置加载完成"
    );

    let schema = SchemaRegistry::new(&config.schema_dir).load(customer)?;
    let source = GraphConnector::new(config.graph.clone())?;
    let sink = SqliteSink::new(&config.database.path)?;

    let importer = BatchImporter::with_default_pipeline(source, sink, schema, &config.locale);
    let report = importer.run().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "批次 {}  客户 {}  列出 {}  跳过 {}  成功 {}  失败 {}  未写回 {}  耗时 {} ms",
            report.run_id,
            report.customer_id,
            report.listed,
            report.skipped,
            report.loaded_count(),
            report.failed_count(),
            report.unreported_count(),
            report.elapsed_ms
        );
        for file in &report.files {
            println!(
                "  [{}] {} ({} 行){}",
                file.status,
                file.file_name,
                file.rows_loaded,
                file.error_description
                    .as_deref()
                    .map(|d| format!(" - {}", d))
                    .unwrap_or_default()
            );
        }
    }
    Ok(())
}

fn check_schema(customer: &str, schema_dir: Option<PathBuf>) -> Result<()> {
    let registry = SchemaRegistry::new(schema_dir.unwrap_or_else(default_schema_dir));
    let schema = registry.load(customer)?;

    println!(
        "客户 {} → 表 {}（{} 列）",
        schema.customer_id(),
        schema.target_table(),
        schema.columns().len()
    );
    for column in schema.columns() {
        println!("  {} → {} [{}]", column.source, column.target, column.type_tag);
    }
    Ok(())
}

fn validate_file(
    customer: &str,
    file: &std::path::Path,
    schema_dir: Option<PathBuf>,
    locale: &str,
) -> Result<()> {
    if !is_supported(locale) {
        anyhow::bail!("不支持的语言: {}", locale);
    }

    let registry = SchemaRegistry::new(schema_dir.unwrap_or_else(default_schema_dir));
    let schema = registry.load(customer)?;

    let bytes = std::fs::read(file)?;
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    match process_local_file(&bytes, &file_name, &schema) {
        Ok(table) => {
            println!(
                "{} 校验通过: {} 行, 列 {:?}",
                file_name,
                table.row_count(),
                table.column_names()
            );
            Ok(())
        }
        Err(err) => {
            let stage = err
                .stage()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("[{}] {}", stage, err.localized_description(locale, &file_name));
            Err(err.into())
        }
    }
}
