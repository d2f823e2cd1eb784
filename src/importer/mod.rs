// ==========================================
// 文档库 Excel 导入 - 导入层
// ==========================================
// 职责: 文件物化 → Schema 校验 / 规范化 → 批次编排
// 支持: Excel, ODS, CSV
// ==========================================

// 模块声明
pub mod batch_importer;
pub mod coercion;
pub mod error;
pub mod file_parser;
pub mod importer_trait;
pub mod schema_validator;

// 重导出核心类型
pub use batch_importer::{process_local_file, BatchImporter};
pub use coercion::ConversionFailure;
pub use error::{ImportError, ImportResult, MaterializeFailure};
pub use file_parser::{materialize, CsvMaterializer, SpreadsheetMaterializer, UniversalMaterializer};
pub use schema_validator::{SchemaValidator, CUSTOMER_COLUMN};

// 重导出 Trait 接口
pub use importer_trait::{FileMaterializer, TableValidator};
