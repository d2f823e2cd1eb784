// ==========================================
// 文档库 Excel 导入 - 落库层
// ==========================================
// 职责: 规范化表格写入目标数据库
// 红线: 不含校验规则，只做事务化写入
// ==========================================

pub mod sink;
pub mod sqlite_sink;

pub use sink::TableSink;
pub use sqlite_sink::SqliteSink;
