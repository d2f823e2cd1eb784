// ==========================================
// 文档库 Excel 导入 - Schema 校验 / 规范化器
// ==========================================
// 流程:
//   1. 缺列检查（零行表 → EmptyTable，否则 → MissingColumns）
//   2. 按类型映射顺序逐列转换（首个失败列即终止）
//   3. 重命名 + 按重命名映射顺序投影
//   4. 追加客户编码常量列
// ==========================================

use crate::domain::schema::SchemaDefinition;
use crate::domain::table::{ColumnValues, Table};
use crate::importer::coercion::coerce_column;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::TableValidator;
use std::collections::BTreeSet;
use tracing::debug;

/// 客户编码列名
pub const CUSTOMER_COLUMN: &str = "customer_code";

pub struct SchemaValidator;

impl TableValidator for SchemaValidator {
    fn validate(&self, mut table: Table, schema: &SchemaDefinition) -> ImportResult<Table> {
        // 1. 缺列检查
        let present: BTreeSet<&str> = table.column_names().into_iter().collect();
        let missing: Vec<String> = schema
            .expected_columns()
            .difference(&present)
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            if table.is_empty() {
                return Err(ImportError::EmptyTable);
            }
            return Err(ImportError::MissingColumns { missing });
        }

        // 2. 类型转换（全部列成功后才写回表格）
        let mut converted = Vec::new();
        for (source, type_tag) in schema.column_type() {
            let column = table.column(source).ok_or_else(|| ImportError::MissingColumns {
                missing: vec![source.to_string()],
            })?;
            let values = match &column.values {
                ColumnValues::Text(values) => coerce_column(values, type_tag).map_err(|failure| {
                    ImportError::ColumnConversion {
                        column: source.to_string(),
                        failure,
                    }
                })?,
                typed => typed.clone(),
            };
            converted.push((source, values));
        }
        for (source, values) in converted {
            if let Some(column) = table.column_mut(source) {
                column.values = values;
            }
        }

        // 3. 重命名 + 投影
        let mapping: Vec<(&str, &str)> = schema.column_rename().collect();
        table.project(&mapping)?;

        // 4. 客户编码列
        table.add_constant_text_column(CUSTOMER_COLUMN, schema.customer_id())?;

        debug!(
            customer = schema.customer_id(),
            rows = table.row_count(),
            columns = table.columns().len(),
            "表格校验完成"
        );
        Ok(table)
    }
}
