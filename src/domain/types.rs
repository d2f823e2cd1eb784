// ==========================================
// 文档库 Excel 导入 - 领域类型定义
// ==========================================
// 职责: 列类型标签 / 目录状态 / 单文件处理阶段
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 列类型标签 (Type Tag)
// ==========================================
// 持久化格式: int / float / str / date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    #[serde(rename = "int")]
    Integer,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "str")]
    String,
    #[serde(rename = "date")]
    Date,
}

impl TypeTag {
    /// 持久化标签
    pub fn as_tag(&self) -> &'static str {
        match self {
            TypeTag::Integer => "int",
            TypeTag::Float => "float",
            TypeTag::String => "str",
            TypeTag::Date => "date",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

impl FromStr for TypeTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "int" => Ok(TypeTag::Integer),
            "float" => Ok(TypeTag::Float),
            "str" => Ok(TypeTag::String),
            "date" => Ok(TypeTag::Date),
            other => Err(format!("未知的类型标签: '{}'（仅支持 int/float/str/date）", other)),
        }
    }
}

// ==========================================
// 目录状态 (Catalog Status)
// ==========================================
// 写回文档库目录条目的 Status 字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogStatus {
    Loaded, // 已落库
    Error,  // 处理失败（附错误描述）
}

impl CatalogStatus {
    /// 写回目录的字段值
    pub fn as_field_value(&self) -> &'static str {
        match self {
            CatalogStatus::Loaded => "Cargado",
            CatalogStatus::Error => "Error",
        }
    }
}

impl fmt::Display for CatalogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_field_value())
    }
}

// ==========================================
// 单文件处理阶段 (File Stage)
// ==========================================
// Listed → (Skipped | Materializing → Materialized | MaterializeFailed
//   → Validating → Loaded | ValidateFailed | LoadFailed) → StatusReported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileStage {
    Listed,
    Skipped,
    Materializing,
    Materialized,
    MaterializeFailed,
    Validating,
    ValidateFailed,
    Loaded,
    LoadFailed,
    StatusReported,
}

impl FileStage {
    /// 终态映射到目录状态（仅对三个失败态与 Loaded 有意义）
    pub fn catalog_status(&self) -> Option<CatalogStatus> {
        match self {
            FileStage::Loaded => Some(CatalogStatus::Loaded),
            FileStage::MaterializeFailed | FileStage::ValidateFailed | FileStage::LoadFailed => {
                Some(CatalogStatus::Error)
            }
            _ => None,
        }
    }
}

impl fmt::Display for FileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileStage::Listed => "LISTED",
            FileStage::Skipped => "SKIPPED",
            FileStage::Materializing => "MATERIALIZING",
            FileStage::Materialized => "MATERIALIZED",
            FileStage::MaterializeFailed => "MATERIALIZE_FAILED",
            FileStage::Validating => "VALIDATING",
            FileStage::ValidateFailed => "VALIDATE_FAILED",
            FileStage::Loaded => "LOADED",
            FileStage::LoadFailed => "LOAD_FAILED",
            FileStage::StatusReported => "STATUS_REPORTED",
        };
        write!(f, "{}", s)
    }
}
