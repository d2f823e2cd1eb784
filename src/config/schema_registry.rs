// ==========================================
// 文档库 Excel 导入 - 客户 Schema 注册表
// ==========================================
// 职责: 从 {schema_dir}/{客户编码}.yaml 加载客户 Schema
// 存储格式:
//   source:  { site_id, library_id, folder_id, list_id }
//   target:  { table }
//   columns: { <源列名>: { sql_field, type: int|float|str|date } }
// ==========================================

use crate::domain::schema::{ColumnSpec, SchemaDefinition, SourceLocator};
use crate::domain::types::TypeTag;
use crate::importer::error::{ImportError, ImportResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct SchemaDocument {
    source: SourceSection,
    target: TargetSection,
    // serde_yaml::Mapping 保持声明顺序，且重复键会报错
    columns: serde_yaml::Mapping,
}

#[derive(Debug, Deserialize)]
struct SourceSection {
    site_id: String,
    library_id: String,
    folder_id: String,
    list_id: String,
}

#[derive(Debug, Deserialize)]
struct TargetSection {
    table: String,
}

#[derive(Debug, Deserialize)]
struct ColumnEntry {
    sql_field: String,
    #[serde(rename = "type")]
    type_tag: String,
}

/// 解析 Schema 文档（纯函数，无 IO）
///
/// # 参数
/// - customer_id: 客户编码
/// - yaml: YAML 文本
///
/// # 返回
/// - Ok(SchemaDefinition): 满足键集不变量的 Schema
/// - Err(SchemaLoad): 缺键 / 类型标签未知 / 列名重复 / 格式错误
pub fn parse_schema(customer_id: &str, yaml: &str) -> ImportResult<SchemaDefinition> {
    let doc: SchemaDocument = serde_yaml::from_str(yaml)
        .map_err(|e| ImportError::schema_load(customer_id, format!("YAML 格式错误: {}", e)))?;

    let mut columns = Vec::with_capacity(doc.columns.len());
    for (key, value) in &doc.columns {
        let source = match key {
            serde_yaml::Value::String(s) => s.trim().to_string(),
            serde_yaml::Value::Number(n) => n.to_string(),
            other => {
                return Err(ImportError::schema_load(
                    customer_id,
                    format!("列名必须为字符串: {:?}", other),
                ))
            }
        };

        let entry: ColumnEntry = serde_yaml::from_value(value.clone()).map_err(|e| {
            ImportError::schema_load(customer_id, format!("列 {} 定义错误: {}", source, e))
        })?;

        let type_tag: TypeTag = entry.type_tag.parse().map_err(|e: String| {
            ImportError::schema_load(customer_id, format!("列 {}: {}", source, e))
        })?;

        columns.push(ColumnSpec {
            source,
            target: entry.sql_field.trim().to_string(),
            type_tag,
        });
    }

    let locator = SourceLocator {
        site_id: required(customer_id, "source.site_id", doc.source.site_id)?,
        library_id: required(customer_id, "source.library_id", doc.source.library_id)?,
        folder_id: required(customer_id, "source.folder_id", doc.source.folder_id)?,
        list_id: required(customer_id, "source.list_id", doc.source.list_id)?,
    };

    SchemaDefinition::new(customer_id, doc.target.table.trim(), locator, columns)
}

fn required(customer_id: &str, key: &str, value: String) -> ImportResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ImportError::schema_load(customer_id, format!("{} 为空", key)));
    }
    Ok(trimmed.to_string())
}

// ==========================================
// SchemaRegistry - Schema 注册表
// ==========================================
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schema_dir: PathBuf,
}

impl SchemaRegistry {
    /// 创建注册表
    ///
    /// # 参数
    /// - schema_dir: Schema 文件目录
    pub fn new(schema_dir: impl Into<PathBuf>) -> Self {
        Self {
            schema_dir: schema_dir.into(),
        }
    }

    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// 加载客户 Schema
    ///
    /// # 返回
    /// - Err(SchemaLoad): 文件缺失或内容不合法
    pub fn load(&self, customer_id: &str) -> ImportResult<SchemaDefinition> {
        let code = customer_id.trim();
        if code.is_empty() || code.contains(['/', '\\']) || code.contains("..") {
            return Err(ImportError::schema_load(customer_id, "客户编码不合法"));
        }

        let path = self.schema_path(code).ok_or_else(|| {
            ImportError::schema_load(
                code,
                format!(
                    "Schema 文件不存在: {}",
                    self.schema_dir.join(format!("{}.yaml", code)).display()
                ),
            )
        })?;
        debug!(path = %path.display(), "读取客户 schema");

        let yaml = std::fs::read_to_string(&path).map_err(|e| {
            ImportError::schema_load(code, format!("读取 {} 失败: {}", path.display(), e))
        })?;

        let schema = parse_schema(code, &yaml)?;
        info!(
            customer = code,
            table = schema.target_table(),
            columns = schema.columns().len(),
            "客户 schema 加载完成"
        );
        Ok(schema)
    }

    fn schema_path(&self, code: &str) -> Option<PathBuf> {
        ["yaml", "yml"]
            .iter()
            .map(|ext| self.schema_dir.join(format!("{}.{}", code, ext)))
            .find(|p| p.is_file())
    }
}
