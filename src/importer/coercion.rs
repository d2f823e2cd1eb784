// ==========================================
// 文档库 Excel 导入 - 单元格类型转换
// ==========================================
// 职责: 文本列 → 类型化列（整列成功或整列失败）
// 规则:
//   int   - 去空白后按 i64 解析，空单元格视为失败
//   float - 去空白后按 f64 解析，空单元格 → NULL
//   str   - 原样保留
//   date  - 按固定格式链解析，空单元格 → NULL
// ==========================================

use crate::domain::table::ColumnValues;
use crate::domain::types::TypeTag;
use crate::i18n::t_in;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt;

/// 日期时间格式链（按顺序尝试，先月后日）
const DATETIME_FORMATS: [&str; 9] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y%m%d%H%M%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// 纯日期格式链（按顺序尝试，先月后日）
const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
];

/// 单元格无法解析为目标类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidCell;

// ==========================================
// ConversionFailure - 列转换失败原因
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionFailure {
    pub row: usize,            // 数据行号（从 1 开始）
    pub value: Option<String>, // 原始单元格（空单元格为 None）
    pub type_tag: TypeTag,     // 目标类型
}

impl ConversionFailure {
    /// 按 locale 渲染失败原因（写回目录使用）
    pub fn localized(&self, locale: &str) -> String {
        let row = self.row.to_string();
        let type_name = t_in(locale, &format!("type_name.{}", self.type_tag.as_tag()), &[]);
        match self.value.as_deref() {
            Some(value) => t_in(
                locale,
                "conversion.invalid_value",
                &[("row", &row), ("value", value), ("type", &type_name)],
            ),
            None => t_in(
                locale,
                "conversion.empty_value",
                &[("row", &row), ("type", &type_name)],
            ),
        }
    }
}

impl fmt::Display for ConversionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(
                f,
                "第 {} 行 '{}' 无法转换为 {}",
                self.row, value, self.type_tag
            ),
            None => write!(f, "第 {} 行为空，无法转换为 {}", self.row, self.type_tag),
        }
    }
}

/// 解析整数（空单元格视为失败）
pub fn parse_integer(value: Option<&str>) -> Result<i64, InvalidCell> {
    match value.map(str::trim) {
        None | Some("") => Err(InvalidCell),
        Some(v) => v.parse::<i64>().map_err(|_| InvalidCell),
    }
}

/// 解析浮点数
pub fn parse_float(value: Option<&str>) -> Result<Option<f64>, InvalidCell> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v.parse::<f64>().map(Some).map_err(|_| InvalidCell),
    }
}

/// 解析日期 / 日期时间
pub fn parse_datetime(value: Option<&str>) -> Result<Option<NaiveDateTime>, InvalidCell> {
    let v = match value.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(v) => v,
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(v) {
        return Ok(Some(dt.naive_utc()));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(v, fmt) {
            return Ok(Some(dt));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(v, fmt) {
            return Ok(d.and_hms_opt(0, 0, 0));
        }
    }
    Err(InvalidCell)
}

/// 将文本列转换为目标类型
///
/// # 返回
/// - Err(ConversionFailure): 第一个无法转换的单元格
pub fn coerce_column(
    values: &[Option<String>],
    type_tag: TypeTag,
) -> Result<ColumnValues, ConversionFailure> {
    let failure = |row: usize, value: &Option<String>| ConversionFailure {
        row: row + 1,
        value: value.clone(),
        type_tag,
    };

    match type_tag {
        TypeTag::String => Ok(ColumnValues::Text(values.to_vec())),
        TypeTag::Integer => values
            .iter()
            .enumerate()
            .map(|(i, v)| parse_integer(v.as_deref()).map_err(|_| failure(i, v)))
            .collect::<Result<Vec<_>, _>>()
            .map(ColumnValues::Integer),
        TypeTag::Float => values
            .iter()
            .enumerate()
            .map(|(i, v)| parse_float(v.as_deref()).map_err(|_| failure(i, v)))
            .collect::<Result<Vec<_>, _>>()
            .map(ColumnValues::Float),
        TypeTag::Date => values
            .iter()
            .enumerate()
            .map(|(i, v)| parse_datetime(v.as_deref()).map_err(|_| failure(i, v)))
            .collect::<Result<Vec<_>, _>>()
            .map(ColumnValues::Date),
    }
}
