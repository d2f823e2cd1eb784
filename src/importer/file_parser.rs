// ==========================================
// 文档库 Excel 导入 - 文件物化器实现
// ==========================================
// 职责: 文件字节 → 全文本表格（不做类型推断）
// 支持: Excel (.xlsx/.xlsm/.xlsb/.xls) / ODS (.ods) / CSV (.csv)
// 规则: 首行为表头；工作簿必须恰好 1 个工作表
// ==========================================

use crate::domain::table::{Table, DATETIME_FORMAT};
use crate::importer::error::{ImportError, ImportResult, MaterializeFailure};
use crate::importer::importer_trait::FileMaterializer;
use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::io::Cursor;
use tracing::debug;

/// 支持的电子表格扩展名
const SPREADSHEET_EXTENSIONS: [&str; 7] = ["xlsx", "xlsm", "xlsb", "xls", "xla", "xlam", "ods"];

// ==========================================
// 表头 + 行 → Table（两种格式共用）
// ==========================================

/// 规范化表头
///
/// - 去除首尾空白（含 UTF-8 BOM）
/// - 空表头 → "Unnamed: {列下标}"
/// - 重名表头 → "名称.1", "名称.2" ...
fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.into_iter()
        .enumerate()
        .map(|(idx, h)| {
            let trimmed = h.trim_start_matches('\u{feff}').trim().to_string();
            let base = if trimmed.is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                trimmed
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

/// 按列组装表格
///
/// - 短行用空单元格补齐，超出表头的单元格丢弃
/// - 完全空白的行跳过
fn build_table<I>(headers: Vec<String>, rows: I) -> ImportResult<Table>
where
    I: IntoIterator<Item = Vec<Option<String>>>,
{
    let headers = normalize_headers(headers);
    let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];

    for mut row in rows {
        if row.iter().all(|cell| cell.is_none()) {
            continue;
        }
        row.resize(headers.len(), None);
        for (col, cell) in columns.iter_mut().zip(row) {
            col.push(cell);
        }
    }

    Table::from_text_columns(headers.into_iter().zip(columns).collect())
}

/// 原始文本 → 单元格（空串视为空单元格）
fn text_cell(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// calamine 单元格 → 文本单元格
fn data_cell(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => text_cell(s),
        Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_datetime() {
            Some(dt) => Some(dt.format(DATETIME_FORMAT).to_string()),
            None => text_cell(&cell.to_string()),
        },
        other => text_cell(&other.to_string()),
    }
}

// ==========================================
// CSV Materializer 实现
// ==========================================
// CSV 视为单工作表
pub struct CsvMaterializer;

impl FileMaterializer for CsvMaterializer {
    fn materialize(&self, bytes: &[u8], file_name: &str) -> ImportResult<Table> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if headers.iter().all(|h| h.trim().is_empty()) {
            debug!(file = file_name, "CSV 文件无表头，返回空表");
            return Ok(Table::new());
        }

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(text_cell).collect());
        }

        let table = build_table(headers, rows)?;
        debug!(
            file = file_name,
            rows = table.row_count(),
            columns = table.columns().len(),
            "CSV 物化完成"
        );
        Ok(table)
    }
}

// ==========================================
// Spreadsheet Materializer 实现
// ==========================================
// 格式由字节内容自动识别
pub struct SpreadsheetMaterializer;

impl FileMaterializer for SpreadsheetMaterializer {
    fn materialize(&self, bytes: &[u8], file_name: &str) -> ImportResult<Table> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

        let sheet_names = workbook.sheet_names();
        match sheet_names.len() {
            0 => return Err(ImportError::Materialization(MaterializeFailure::NoSheets)),
            1 => {}
            _ => return Err(ImportError::MultiSheet { sheets: sheet_names }),
        }

        let range = workbook.worksheet_range(&sheet_names[0])?;

        // 提取表头（第一行）
        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row
                .iter()
                .map(|cell| data_cell(cell).unwrap_or_default())
                .collect(),
            None => {
                debug!(file = file_name, sheet = %sheet_names[0], "工作表为空");
                return Ok(Table::new());
            }
        };

        let table = build_table(
            headers,
            rows.map(|row| row.iter().map(data_cell).collect::<Vec<_>>()),
        )?;
        debug!(
            file = file_name,
            sheet = %sheet_names[0],
            rows = table.row_count(),
            columns = table.columns().len(),
            "工作表物化完成"
        );
        Ok(table)
    }
}

// ==========================================
// 通用物化器（根据扩展名自动选择）
// ==========================================
pub struct UniversalMaterializer;

impl FileMaterializer for UniversalMaterializer {
    fn materialize(&self, bytes: &[u8], file_name: &str) -> ImportResult<Table> {
        let ext = std::path::Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvMaterializer.materialize(bytes, file_name),
            e if SPREADSHEET_EXTENSIONS.contains(&e) => {
                SpreadsheetMaterializer.materialize(bytes, file_name)
            }
            _ => Err(ImportError::Materialization(
                MaterializeFailure::UnsupportedFormat { extension: ext.clone() },
            )),
        }
    }
}

/// 物化文件（按扩展名分派）
pub fn materialize(bytes: &[u8], file_name: &str) -> ImportResult<Table> {
    UniversalMaterializer.materialize(bytes, file_name)
}
