// ==========================================
// 文档库 Excel 导入 - 候选文件与处理报告
// ==========================================
// 职责: 单次运行内的文件生命周期对象（运行结束即丢弃，不持久化）
// ==========================================

use crate::domain::table::Table;
use crate::domain::types::{CatalogStatus, FileStage};
use serde::Serialize;

// ==========================================
// CandidateFile - 候选文件
// ==========================================
// 所有权: 由单个编排任务独占，文件之间不共享
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub id: String,                 // 文档库文件 ID
    pub name: String,               // 文件名
    pub catalog_entry_id: String,   // 目录条目 ID（状态写回句柄）
    pub status: Option<String>,     // 目录 Status 字段
    pub table: Option<Table>,       // 物化后写入一次，校验后整体替换一次
}

impl CandidateFile {
    pub fn new(id: &str, name: &str, catalog_entry_id: &str, status: Option<String>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            catalog_entry_id: catalog_entry_id.to_string(),
            status,
            table: None,
        }
    }

    /// 是否需要（重新）处理
    ///
    /// # 规则
    /// - Status 为 null 或恰为 "Error" → 处理
    /// - 其他任何值（含空串）→ 已处理，跳过
    pub fn is_eligible(&self) -> bool {
        match self.status.as_deref() {
            None => true,
            Some(s) => s == CatalogStatus::Error.as_field_value(),
        }
    }
}

// ==========================================
// FileReport - 单文件终态报告
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file_id: String,
    pub file_name: String,
    pub catalog_entry_id: String,
    pub stage: FileStage,                // 处理终止阶段（Loaded 或某个失败态）
    pub status: CatalogStatus,           // 写回目录的状态
    pub error_description: Option<String>, // 写回目录的错误描述
    pub rows_loaded: usize,
    pub status_reported: bool,           // 状态写回是否成功
    pub report_error: Option<String>,    // 状态写回失败原因（不重试）
}

impl FileReport {
    pub fn is_loaded(&self) -> bool {
        self.status == CatalogStatus::Loaded
    }
}

// ==========================================
// BatchReport - 批次报告
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub run_id: String,
    pub customer_id: String,
    pub listed: usize,
    pub skipped: usize,
    pub files: Vec<FileReport>,
    pub elapsed_ms: u128,
}

impl BatchReport {
    pub fn loaded_count(&self) -> usize {
        self.files.iter().filter(|f| f.is_loaded()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.files.iter().filter(|f| !f.is_loaded()).count()
    }

    pub fn unreported_count(&self) -> usize {
        self.files.iter().filter(|f| !f.status_reported).count()
    }
}
