// ==========================================
// 文档库 Excel 导入 - 文档库连接器 Trait
// ==========================================
// 职责: 列出待处理文件 / 下载文件内容 / 写回目录状态
// 说明: 唯一的网络边界，所有方法均可能挂起
// ==========================================

use crate::importer::error::ImportResult;
use async_trait::async_trait;

// ==========================================
// DriveItemEntry - 文件夹列表条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveItemEntry {
    pub id: String,               // 文件 ID
    pub name: String,             // 文件名
    pub catalog_entry_id: String, // 目录条目 ID
    pub status: Option<String>,   // 目录 Status 字段
}

// ==========================================
// SourceConnector Trait
// ==========================================
// 实现者: GraphConnector（生产）、测试中的内存连接器
#[async_trait]
pub trait SourceConnector: Send + Sync {
    /// 列出文件夹下的全部文件（内部处理分页）
    ///
    /// # 返回
    /// - Err(SourceRequest): 请求失败（批次级致命错误）
    async fn list_folder_children(
        &self,
        library_id: &str,
        folder_id: &str,
    ) -> ImportResult<Vec<DriveItemEntry>>;

    /// 下载文件内容
    async fn fetch_content(&self, library_id: &str, file_id: &str) -> ImportResult<Vec<u8>>;

    /// 写回目录状态
    ///
    /// # 参数
    /// - status: "Cargado" / "Error"
    /// - error_description: 错误描述（成功时为 None）
    async fn patch_catalog_status(
        &self,
        site_id: &str,
        list_id: &str,
        catalog_entry_id: &str,
        status: &str,
        error_description: Option<&str>,
    ) -> ImportResult<()>;
}
