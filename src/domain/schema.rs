// ==========================================
// 文档库 Excel 导入 - 客户 Schema 定义
// ==========================================
// 职责: 每客户一份、加载后不可变的列契约
// 不变量: expected_columns == rename 键集 == type 键集
// ==========================================

use crate::domain::types::TypeTag;
use crate::importer::error::{ImportError, ImportResult};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

// ==========================================
// SourceLocator - 文档库定位信息
// ==========================================
// 仅供 SourceConnector 使用，核心逻辑不解释其内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocator {
    pub site_id: String,    // 站点 ID（目录条目写回）
    pub library_id: String, // 文档库（drive）ID
    pub folder_id: String,  // 待处理文件夹 ID
    pub list_id: String,    // 目录列表 ID（Status 字段所在列表）
}

// ==========================================
// ColumnSpec - 单列契约
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub source: String,    // 源文件列名
    pub target: String,    // 目标表字段名
    pub type_tag: TypeTag, // 目标类型
}

// ==========================================
// SchemaDefinition - 客户 Schema
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaDefinition {
    customer_id: String,
    target_table: String,
    source_locator: SourceLocator,
    // 类型映射顺序：类型转换按此顺序进行
    columns: Vec<ColumnSpec>,
    // 重命名映射顺序：投影按此顺序输出（columns 的下标）
    projection_order: Vec<usize>,
}

impl SchemaDefinition {
    /// 由列契约列表构造 Schema
    ///
    /// # 返回
    /// - Err(SchemaLoad): 列为空 / 源列名重复 / 目标字段名重复 / 名称为空
    pub fn new(
        customer_id: &str,
        target_table: &str,
        source_locator: SourceLocator,
        columns: Vec<ColumnSpec>,
    ) -> ImportResult<Self> {
        if customer_id.trim().is_empty() {
            return Err(ImportError::schema_load(customer_id, "客户编码为空"));
        }
        if target_table.trim().is_empty() {
            return Err(ImportError::schema_load(customer_id, "target.table 为空"));
        }
        if columns.is_empty() {
            return Err(ImportError::schema_load(customer_id, "columns 不能为空"));
        }

        let mut sources = HashSet::new();
        let mut targets = HashSet::new();
        for col in &columns {
            if col.source.trim().is_empty() || col.target.trim().is_empty() {
                return Err(ImportError::schema_load(customer_id, "列名或 sql_field 为空"));
            }
            if !sources.insert(col.source.as_str()) {
                return Err(ImportError::schema_load(
                    customer_id,
                    format!("源列名重复: {}", col.source),
                ));
            }
            if !targets.insert(col.target.as_str()) {
                return Err(ImportError::schema_load(
                    customer_id,
                    format!("目标字段名重复: {}", col.target),
                ));
            }
        }

        let projection_order = (0..columns.len()).collect();
        Ok(Self {
            customer_id: customer_id.to_string(),
            target_table: target_table.to_string(),
            source_locator,
            columns,
            projection_order,
        })
    }

    /// 由三份独立映射构造 Schema，并校验键集一致
    ///
    /// # 参数
    /// - expected_columns: 期望列集合（不允许重复）
    /// - column_rename: 源列名 → 目标字段名（有序）
    /// - column_type: 源列名 → 类型（有序，决定转换顺序）
    pub fn from_parts(
        customer_id: &str,
        target_table: &str,
        source_locator: SourceLocator,
        expected_columns: &[&str],
        column_rename: &[(&str, &str)],
        column_type: &[(&str, TypeTag)],
    ) -> ImportResult<Self> {
        let expected: BTreeSet<&str> = expected_columns.iter().copied().collect();
        if expected.len() != expected_columns.len() {
            return Err(ImportError::schema_load(customer_id, "期望列存在重复"));
        }

        let rename_keys: BTreeSet<&str> = column_rename.iter().map(|(s, _)| *s).collect();
        let type_keys: BTreeSet<&str> = column_type.iter().map(|(s, _)| *s).collect();
        if rename_keys.len() != column_rename.len() || type_keys.len() != column_type.len() {
            return Err(ImportError::schema_load(customer_id, "映射键存在重复"));
        }
        if rename_keys != expected || type_keys != expected {
            return Err(ImportError::schema_load(
                customer_id,
                "重命名映射、类型映射与期望列的键集不一致",
            ));
        }

        let columns: Vec<ColumnSpec> = column_type
            .iter()
            .map(|(source, type_tag)| ColumnSpec {
                source: source.to_string(),
                target: column_rename
                    .iter()
                    .find(|(s, _)| s == source)
                    .map(|(_, t)| t.to_string())
                    .unwrap_or_default(),
                type_tag: *type_tag,
            })
            .collect();

        let mut schema = Self::new(customer_id, target_table, source_locator, columns)?;
        schema.projection_order = column_rename
            .iter()
            .filter_map(|(source, _)| schema.columns.iter().position(|c| c.source == *source))
            .collect();
        Ok(schema)
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn target_table(&self) -> &str {
        &self.target_table
    }

    pub fn source_locator(&self) -> &SourceLocator {
        &self.source_locator
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// 期望列集合（有序集合，便于差集比较与报告）
    pub fn expected_columns(&self) -> BTreeSet<&str> {
        self.columns.iter().map(|c| c.source.as_str()).collect()
    }

    /// 重命名映射（投影顺序）
    pub fn column_rename(&self) -> impl Iterator<Item = (&str, &str)> {
        self.projection_order
            .iter()
            .map(|&i| (self.columns[i].source.as_str(), self.columns[i].target.as_str()))
    }

    /// 类型映射（声明顺序）
    pub fn column_type(&self) -> impl Iterator<Item = (&str, TypeTag)> {
        self.columns.iter().map(|c| (c.source.as_str(), c.type_tag))
    }

    /// 目标字段名（投影顺序）
    pub fn target_columns(&self) -> Vec<&str> {
        self.column_rename().map(|(_, target)| target).collect()
    }
}
