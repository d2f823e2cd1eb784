// ==========================================
// 文档库 Excel 导入 - 表格数据模型
// ==========================================
// 职责: 有序列集合，每列一个类型化向量，所有列等长
// 用途: 物化层产出全文本表；校验层原地转换为类型化、重命名、投影后的表
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use chrono::NaiveDateTime;
use rusqlite::types::Value;

/// 日期写出格式（落库 / 文本渲染）
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// ColumnValues - 列数据
// ==========================================
// 空单元格为 None；整数列不允许空值
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Text(Vec<Option<String>>),
    Integer(Vec<i64>),
    Float(Vec<Option<f64>>),
    Date(Vec<Option<NaiveDateTime>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Text(v) => v.len(),
            ColumnValues::Integer(v) => v.len(),
            ColumnValues::Float(v) => v.len(),
            ColumnValues::Date(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// SQLite 列亲和类型
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnValues::Text(_) | ColumnValues::Date(_) => "TEXT",
            ColumnValues::Integer(_) => "INTEGER",
            ColumnValues::Float(_) => "REAL",
        }
    }

    /// 取第 row 行的 SQL 值
    pub fn sql_value(&self, row: usize) -> Value {
        match self {
            ColumnValues::Text(v) => v[row].clone().map(Value::Text).unwrap_or(Value::Null),
            ColumnValues::Integer(v) => Value::Integer(v[row]),
            ColumnValues::Float(v) => v[row].map(Value::Real).unwrap_or(Value::Null),
            ColumnValues::Date(v) => v[row]
                .map(|d| Value::Text(d.format(DATETIME_FORMAT).to_string()))
                .unwrap_or(Value::Null),
        }
    }
}

// ==========================================
// Column - 命名列
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

impl Column {
    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Text(values),
        }
    }
}

// ==========================================
// Table - 表格
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由文本列构造表格（物化层使用）
    pub fn from_text_columns(columns: Vec<(String, Vec<Option<String>>)>) -> ImportResult<Self> {
        let mut table = Table::new();
        for (name, values) in columns {
            table.push_column(Column::text(name, values))?;
        }
        Ok(table)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// 追加一列（长度必须与现有行数一致；首列决定行数）
    pub fn push_column(&mut self, column: Column) -> ImportResult<()> {
        if self.columns.is_empty() {
            self.row_count = column.values.len();
        } else if column.values.len() != self.row_count {
            return Err(ImportError::Other(anyhow::anyhow!(
                "列 {} 长度 {} 与表格行数 {} 不一致",
                column.name,
                column.values.len(),
                self.row_count
            )));
        }
        self.columns.push(column);
        Ok(())
    }

    /// 重命名投影：仅保留映射中的源列，改为目标名，并按映射顺序排列
    ///
    /// # 参数
    /// - mapping: (源列名, 目标列名) 列表
    ///
    /// # 返回
    /// - Err: 某源列不存在（此时表格保持不变）
    pub fn project(&mut self, mapping: &[(&str, &str)]) -> ImportResult<()> {
        if let Some((source, _)) = mapping.iter().find(|(s, _)| self.column(s).is_none()) {
            return Err(ImportError::Other(anyhow::anyhow!("投影列不存在: {}", source)));
        }

        let mut remaining = std::mem::take(&mut self.columns);
        let mut projected = Vec::with_capacity(mapping.len());
        for (source, target) in mapping {
            if let Some(idx) = remaining.iter().position(|c| c.name == *source) {
                let mut column = remaining.remove(idx);
                column.name = target.to_string();
                projected.push(column);
            }
        }
        self.columns = projected;
        if self.columns.is_empty() {
            self.row_count = 0;
        }
        Ok(())
    }

    /// 追加常量文本列（同名列已存在时覆盖其值）
    pub fn add_constant_text_column(&mut self, name: &str, value: &str) -> ImportResult<()> {
        let values = vec![Some(value.to_string()); self.row_count];
        match self.column_mut(name) {
            Some(column) => {
                column.values = ColumnValues::Text(values);
                Ok(())
            }
            None => self.push_column(Column::text(name, values)),
        }
    }

    /// 第 row 行的全部 SQL 值（列顺序）
    pub fn row_values(&self, row: usize) -> Vec<Value> {
        self.columns.iter().map(|c| c.values.sql_value(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_text_columns(vec![
            ("A".to_string(), vec![Some("1".to_string()), Some("2".to_string())]),
            ("B".to_string(), vec![Some("x".to_string()), None]),
            ("C".to_string(), vec![None, None]),
        ])
        .unwrap()
    }

    #[test]
    fn test_push_column_rejects_length_mismatch() {
        let mut table = sample();
        let result = table.push_column(Column::text("D", vec![Some("only one".to_string())]));
        assert!(result.is_err());
        assert_eq!(table.columns().len(), 3);
    }

    #[test]
    fn test_project_reorders_renames_and_drops() {
        let mut table = sample();
        table.project(&[("C", "colC"), ("A", "colA")]).unwrap();
        assert_eq!(table.column_names(), vec!["colC", "colA"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_project_swapping_names_does_not_collide() {
        let mut table = sample();
        table.project(&[("A", "B"), ("B", "A")]).unwrap();
        assert_eq!(table.column_names(), vec!["B", "A"]);
        assert_eq!(
            table.column("B").unwrap().values,
            ColumnValues::Text(vec![Some("1".to_string()), Some("2".to_string())])
        );
    }

    #[test]
    fn test_project_missing_column_fails() {
        let mut table = sample();
        assert!(table.project(&[("Z", "z")]).is_err());
        assert_eq!(table.columns().len(), 3);
    }

    #[test]
    fn test_constant_column_and_row_values() {
        let mut table = sample();
        table.add_constant_text_column("customer_code", "FN1").unwrap();
        let row = table.row_values(1);
        assert_eq!(row.len(), 4);
        assert_eq!(row[1], Value::Null);
        assert_eq!(row[3], Value::Text("FN1".to_string()));
    }
}
