// ==========================================
// 文档库 Excel 导入 - 领域模型层
// ==========================================
// 职责: 定义 Schema、表格、候选文件、处理报告等领域类型
// 红线: 不含数据访问逻辑,不含网络调用
// ==========================================

pub mod candidate;
pub mod schema;
pub mod table;
pub mod types;

// 重导出核心类型
pub use candidate::{BatchReport, CandidateFile, FileReport};
pub use schema::{ColumnSpec, SchemaDefinition, SourceLocator};
pub use table::{Column, ColumnValues, Table};
pub use types::{CatalogStatus, FileStage, TypeTag};
