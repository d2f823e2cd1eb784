// ==========================================
// 文档库 Excel 导入 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 单文件错误在编排器边界被捕获并写回目录；
//       SchemaLoad / Config / 列表请求失败属于批次级致命错误
// ==========================================

use crate::domain::types::FileStage;
use crate::i18n::t_in;
use crate::importer::coercion::ConversionFailure;
use std::fmt;
use thiserror::Error;

// ==========================================
// MaterializeFailure - 物化失败原因
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterializeFailure {
    /// 扩展名不在支持列表中
    UnsupportedFormat { extension: String },
    /// 工作簿不含工作表
    NoSheets,
    /// 字节无法解析（detail 为解析库原文）
    Unreadable { detail: String },
}

impl MaterializeFailure {
    /// 按 locale 渲染失败原因
    pub fn localized(&self, locale: &str) -> String {
        match self {
            MaterializeFailure::UnsupportedFormat { extension } => t_in(
                locale,
                "materialize.unsupported_format",
                &[("extension", extension)],
            ),
            MaterializeFailure::NoSheets => t_in(locale, "materialize.no_sheets", &[]),
            MaterializeFailure::Unreadable { detail } => {
                t_in(locale, "materialize.unreadable", &[("detail", detail)])
            }
        }
    }
}

impl fmt::Display for MaterializeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterializeFailure::UnsupportedFormat { extension } => {
                write!(f, "不支持的文件格式: '{}'", extension)
            }
            MaterializeFailure::NoSheets => write!(f, "工作簿不包含任何工作表"),
            MaterializeFailure::Unreadable { detail } => write!(f, "内容无法解析: {}", detail),
        }
    }
}

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 配置相关错误 =====
    #[error("客户 {customer} 的 schema 加载失败: {message}")]
    SchemaLoad { customer: String, message: String },

    #[error("配置错误: {0}")]
    Config(String),

    // ===== 文档库相关错误 =====
    #[error("文档库请求失败: {0}")]
    SourceRequest(String),

    // ===== 文件物化错误 =====
    #[error("文件包含多个工作表 {sheets:?}，待处理文件只能包含 1 个工作表")]
    MultiSheet { sheets: Vec<String> },

    #[error("文件解析失败: {0}")]
    Materialization(MaterializeFailure),

    // ===== 校验错误 =====
    #[error("文件为空或包含多个工作表，无法处理")]
    EmptyTable,

    #[error("缺少以下列: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("列 {column} 类型转换失败: {failure}")]
    ColumnConversion {
        column: String,
        failure: ConversionFailure,
    },

    // ===== 落库错误 =====
    #[error("数据写入失败: {0}")]
    SinkWrite(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 构造 SchemaLoad 错误
    pub fn schema_load(customer: &str, message: impl Into<String>) -> Self {
        ImportError::SchemaLoad {
            customer: customer.to_string(),
            message: message.into(),
        }
    }

    /// 错误对应的单文件失败阶段
    ///
    /// # 返回
    /// - None: 批次级错误（SchemaLoad / Config / Other），不属于单文件状态机
    pub fn stage(&self) -> Option<FileStage> {
        match self {
            ImportError::SourceRequest(_)
            | ImportError::MultiSheet { .. }
            | ImportError::Materialization(_) => Some(FileStage::MaterializeFailed),
            ImportError::EmptyTable
            | ImportError::MissingColumns { .. }
            | ImportError::ColumnConversion { .. } => Some(FileStage::ValidateFailed),
            ImportError::SinkWrite(_) => Some(FileStage::LoadFailed),
            ImportError::SchemaLoad { .. } | ImportError::Config(_) | ImportError::Other(_) => None,
        }
    }

    /// 生成写回目录的错误描述（按 locale 本地化）
    ///
    /// 描述只由本地化模板与结构化字段组成；SourceRequest / SinkWrite 附带
    /// 上游返回的原文，批次级错误只给出通用描述
    ///
    /// # 参数
    /// - locale: 语言代码（"es" / "en" / "zh-CN"）
    /// - file_name: 出错文件名
    pub fn localized_description(&self, locale: &str, file_name: &str) -> String {
        match self {
            ImportError::MultiSheet { sheets } => t_in(
                locale,
                "error.multi_sheet",
                &[("file", file_name), ("sheets", &sheets.join(", "))],
            ),
            ImportError::Materialization(failure) => t_in(
                locale,
                "error.materialization",
                &[("file", file_name), ("message", &failure.localized(locale))],
            ),
            ImportError::SourceRequest(message) => t_in(
                locale,
                "error.source_request",
                &[("file", file_name), ("message", message)],
            ),
            ImportError::EmptyTable => t_in(locale, "error.empty_table", &[("file", file_name)]),
            ImportError::MissingColumns { missing } => t_in(
                locale,
                "error.missing_columns",
                &[("file", file_name), ("columns", &missing.join(", "))],
            ),
            ImportError::ColumnConversion { column, failure } => t_in(
                locale,
                "error.column_conversion",
                &[
                    ("file", file_name),
                    ("column", column),
                    ("message", &failure.localized(locale)),
                ],
            ),
            ImportError::SinkWrite(message) => t_in(
                locale,
                "error.sink_write",
                &[("file", file_name), ("message", message)],
            ),
            ImportError::SchemaLoad { .. } | ImportError::Config(_) | ImportError::Other(_) => {
                t_in(locale, "error.other", &[("file", file_name)])
            }
        }
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::SinkWrite(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::Materialization(MaterializeFailure::Unreadable {
            detail: err.to_string(),
        })
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::Materialization(MaterializeFailure::Unreadable {
            detail: err.to_string(),
        })
    }
}

// 实现 From<serde_yaml::Error>
impl From<serde_yaml::Error> for ImportError {
    fn from(err: serde_yaml::Error) -> Self {
        ImportError::Config(format!("YAML 解析失败: {}", err))
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::Materialization(MaterializeFailure::Unreadable {
            detail: err.to_string(),
        })
    }
}

// 实现 From<reqwest::Error>
impl From<reqwest::Error> for ImportError {
    fn from(err: reqwest::Error) -> Self {
        ImportError::SourceRequest(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::TypeTag;

    #[test]
    fn test_missing_columns_display_lists_every_column() {
        let err = ImportError::MissingColumns {
            missing: vec!["Fecha".to_string(), "Monto".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Fecha"));
        assert!(msg.contains("Monto"));
    }

    fn has_cjk(text: &str) -> bool {
        text.chars().any(|c| ('\u{4E00}'..='\u{9FFF}').contains(&c))
    }

    #[test]
    fn test_localized_description_mentions_file_column_and_value() {
        let err = ImportError::ColumnConversion {
            column: "Monto".to_string(),
            failure: ConversionFailure {
                row: 4,
                value: Some("abc".to_string()),
                type_tag: TypeTag::Float,
            },
        };
        let desc = err.localized_description("es", "ventas.xlsx");
        assert!(desc.contains("ventas.xlsx"));
        assert!(desc.contains("Monto"));
        assert!(desc.contains("'abc'"));
        assert!(desc.contains("4"));
        assert!(!has_cjk(&desc));
    }

    #[test]
    fn test_spanish_descriptions_have_no_chinese_text() {
        let errors = vec![
            ImportError::Materialization(MaterializeFailure::NoSheets),
            ImportError::Materialization(MaterializeFailure::UnsupportedFormat {
                extension: "txt".to_string(),
            }),
            calamine::Error::Msg("Cannot detect file format").into(),
            ImportError::MultiSheet {
                sheets: vec!["Hoja1".to_string(), "Hoja2".to_string()],
            },
            ImportError::EmptyTable,
            ImportError::MissingColumns {
                missing: vec!["Fecha".to_string()],
            },
            ImportError::ColumnConversion {
                column: "Cantidad".to_string(),
                failure: ConversionFailure {
                    row: 1,
                    value: None,
                    type_tag: TypeTag::Integer,
                },
            },
            ImportError::schema_load("FN1", "列名重复"),
            ImportError::Config("缺少环境变量 TENANT_ID".to_string()),
        ];
        for err in errors {
            let desc = err.localized_description("es", "roto.xlsx");
            assert!(desc.contains("roto.xlsx"), "{}", desc);
            assert!(!has_cjk(&desc), "{}", desc);
        }
    }

    #[test]
    fn test_localized_description_english() {
        let err = ImportError::EmptyTable;
        let desc = err.localized_description("en", "empty.xlsx");
        assert!(desc.contains("empty.xlsx"));
        assert!(desc.contains("empty"));
    }

    #[test]
    fn test_stage_groups_errors_by_pipeline_step() {
        assert_eq!(
            ImportError::MultiSheet { sheets: vec![] }.stage(),
            Some(FileStage::MaterializeFailed)
        );
        assert_eq!(ImportError::EmptyTable.stage(), Some(FileStage::ValidateFailed));
        assert_eq!(
            ImportError::SinkWrite("locked".to_string()).stage(),
            Some(FileStage::LoadFailed)
        );
        assert_eq!(ImportError::Config("x".to_string()).stage(), None);
    }

    #[test]
    fn test_calamine_error_maps_to_materialization() {
        let err: ImportError = calamine::Error::Msg("bad zip").into();
        assert!(matches!(err, ImportError::Materialization(_)));
    }
}
