// ==========================================
// 文档库 Excel 导入 - 配置层
// ==========================================
// 职责: 客户 Schema 注册表 + 进程级应用配置
// 存储: schemas/{客户编码}.yaml；环境变量 / .env
// ==========================================

pub mod app_config;
pub mod schema_registry;

// 重导出核心配置类型
pub use app_config::{AppConfig, DatabaseConfig, GraphConfig};
pub use schema_registry::{parse_schema, SchemaRegistry};
