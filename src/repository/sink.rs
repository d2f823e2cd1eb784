// ==========================================
// 文档库 Excel 导入 - 落库 Trait
// ==========================================
// 职责: 将规范化后的表格追加到目标表
// 红线: 单个文件的行要么全部提交，要么全部回滚
// ==========================================

use crate::domain::table::Table;
use crate::importer::error::ImportResult;
use async_trait::async_trait;

// ==========================================
// TableSink Trait
// ==========================================
// 实现者: SqliteSink
#[async_trait]
pub trait TableSink: Send + Sync {
    /// 追加表格全部行
    ///
    /// # 参数
    /// - table_name: 目标表名
    /// - table: 已规范化的表格
    ///
    /// # 返回
    /// - Ok(usize): 写入行数
    /// - Err(SinkWrite): 写入失败（整个事务回滚）
    async fn append_rows(&self, table_name: &str, table: &Table) -> ImportResult<usize>;
}
