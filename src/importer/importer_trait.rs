// ==========================================
// 文档库 Excel 导入 - 导入管道 Trait
// ==========================================
// 职责: 定义物化 / 校验两个同步阶段的接口（不包含实现）
// 红线: 两个阶段均为纯计算，不做 IO，不挂起
// ==========================================

use crate::domain::schema::SchemaDefinition;
use crate::domain::table::Table;
use crate::importer::error::ImportResult;

// ==========================================
// FileMaterializer Trait
// ==========================================
// 用途: 文件字节 → 全文本表格
// 实现者: SpreadsheetMaterializer, CsvMaterializer, UniversalMaterializer
pub trait FileMaterializer: Send + Sync {
    /// 物化文件内容
    ///
    /// # 参数
    /// - bytes: 文件原始字节（只读）
    /// - file_name: 文件名（用于格式判断和错误信息）
    ///
    /// # 返回
    /// - Ok(Table): 所有单元格均为未解释的文本
    /// - Err(MultiSheet): 工作簿包含多个工作表
    /// - Err(Materialization): 字节损坏或格式不支持
    fn materialize(&self, bytes: &[u8], file_name: &str) -> ImportResult<Table>;
}

// ==========================================
// TableValidator Trait
// ==========================================
// 用途: 按客户 Schema 校验并规范化表格
// 实现者: SchemaValidator
pub trait TableValidator: Send + Sync {
    /// 校验并规范化
    ///
    /// # 参数
    /// - table: 物化后的全文本表格（失败时整体丢弃）
    /// - schema: 客户 Schema（只读共享）
    ///
    /// # 返回
    /// - Ok(Table): 类型化、重命名、投影并追加客户列后的表格
    /// - Err(EmptyTable / MissingColumns / ColumnConversion)
    fn validate(&self, table: Table, schema: &SchemaDefinition) -> ImportResult<Table>;
}
