// ==========================================
// 文档库 Excel 导入 - 文档库访问层
// ==========================================
// 职责: 文件夹列表、文件下载、目录状态写回
// 实现: Microsoft Graph（reqwest）
// ==========================================

pub mod connector;
pub mod graph_connector;

pub use connector::{DriveItemEntry, SourceConnector};
pub use graph_connector::GraphConnector;
