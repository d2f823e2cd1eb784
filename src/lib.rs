// ==========================================
// 文档库 Excel 导入 - 核心库
// ==========================================
// 技术栈: tokio + reqwest (Microsoft Graph) + calamine + SQLite
// 系统定位: 按客户 Schema 将文档库中的 Excel 文件校验后落库，
//           并把处理结果写回文档库目录的 Status 字段
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - Schema / 表格 / 候选文件
pub mod domain;

// 导入层 - 物化 / 校验 / 批次编排
pub mod importer;

// 文档库访问层 - 列表 / 下载 / 状态写回
pub mod source;

// 落库层
pub mod repository;

// 配置层 - Schema 注册表 / 应用配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

pub use config::{AppConfig, SchemaRegistry};
pub use domain::{
    BatchReport, CandidateFile, CatalogStatus, FileReport, FileStage, SchemaDefinition, Table,
    TypeTag,
};
pub use importer::{process_local_file, BatchImporter, ImportError, ImportResult};
pub use repository::{SqliteSink, TableSink};
pub use source::{GraphConnector, SourceConnector};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "excel-loader";
