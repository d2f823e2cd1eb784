// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供内存文档库连接器、xlsx 文件生成、临时数据库、测试 Schema
// ==========================================

#![allow(dead_code)]

use async_trait::async_trait;
use excel_loader::domain::{SchemaDefinition, SourceLocator, TypeTag};
use excel_loader::importer::{ImportError, ImportResult};
use excel_loader::source::{DriveItemEntry, SourceConnector};
use excel_loader::SqliteSink;
use rusqlite::Connection;
use rust_xlsxwriter::Workbook;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

// ==========================================
// Schema
// ==========================================

pub const CUSTOMER: &str = "FN000354";
pub const TARGET_TABLE: &str = "ventas";

pub fn test_locator() -> SourceLocator {
    SourceLocator {
        site_id: "site-1".to_string(),
        library_id: "drive-1".to_string(),
        folder_id: "folder-1".to_string(),
        list_id: "list-1".to_string(),
    }
}

/// Cantidad:int → cantidad, Fecha:date → fecha
pub fn ventas_schema() -> SchemaDefinition {
    SchemaDefinition::from_parts(
        CUSTOMER,
        TARGET_TABLE,
        test_locator(),
        &["Cantidad", "Fecha"],
        &[("Cantidad", "cantidad"), ("Fecha", "fecha")],
        &[("Cantidad", TypeTag::Integer), ("Fecha", TypeTag::Date)],
    )
    .expect("测试 schema 应合法")
}

/// 简单 Schema: A:int → colA, B:date → colB
pub fn ab_schema() -> SchemaDefinition {
    SchemaDefinition::from_parts(
        CUSTOMER,
        TARGET_TABLE,
        test_locator(),
        &["A", "B"],
        &[("A", "colA"), ("B", "colB")],
        &[("A", TypeTag::Integer), ("B", TypeTag::Date)],
    )
    .expect("测试 schema 应合法")
}

// ==========================================
// xlsx 文件生成
// ==========================================

/// 生成单工作表 xlsx（所有单元格写为文本）
pub fn xlsx_bytes(rows: &[&[&str]]) -> Vec<u8> {
    multi_sheet_xlsx(&[rows])
}

/// 生成多工作表 xlsx
pub fn multi_sheet_xlsx(sheets: &[&[&[&str]]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    for rows in sheets {
        let sheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                sheet
                    .write_string(r as u32, c as u16, *value)
                    .expect("写入单元格失败");
            }
        }
    }
    workbook.save_to_buffer().expect("生成 xlsx 失败")
}

/// 生成一份合法的 ventas 文件
pub fn valid_ventas_xlsx(cantidad: &str) -> Vec<u8> {
    xlsx_bytes(&[&["Cantidad", "Fecha"], &[cantidad, "2024-01-02"]])
}

// ==========================================
// 临时数据库
// ==========================================

/// 创建临时数据库，返回（临时文件, 共享连接）
///
/// 临时文件需要保持存活
pub fn create_test_db() -> (NamedTempFile, Arc<Mutex<Connection>>) {
    let temp_file = NamedTempFile::new().expect("创建临时文件失败");
    let conn = excel_loader::db::open_sqlite_connection(temp_file.path()).expect("打开数据库失败");
    (temp_file, Arc::new(Mutex::new(conn)))
}

pub fn sink_on(conn: &Arc<Mutex<Connection>>) -> SqliteSink {
    SqliteSink::from_connection(conn.clone())
}

// ==========================================
// 内存文档库连接器
// ==========================================

/// 一次状态写回调用
#[derive(Debug, Clone, PartialEq)]
pub struct PatchCall {
    pub site_id: String,
    pub list_id: String,
    pub catalog_entry_id: String,
    pub status: String,
    pub error_description: Option<String>,
}

#[derive(Default)]
pub struct FakeConnector {
    entries: Vec<DriveItemEntry>,
    contents: HashMap<String, Vec<u8>>,
    fail_listing: bool,
    fail_patch_for: HashSet<String>,
    patches: Arc<Mutex<Vec<PatchCall>>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个文件（id 同时作为目录条目 ID 的后缀）
    pub fn with_file(mut self, id: &str, name: &str, status: Option<&str>, bytes: Vec<u8>) -> Self {
        self.entries.push(DriveItemEntry {
            id: id.to_string(),
            name: name.to_string(),
            catalog_entry_id: format!("entry-{}", id),
            status: status.map(str::to_string),
        });
        self.contents.insert(id.to_string(), bytes);
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn failing_patch_for(mut self, catalog_entry_id: &str) -> Self {
        self.fail_patch_for.insert(catalog_entry_id.to_string());
        self
    }

    /// 状态写回记录（运行后查看）
    pub fn patch_log(&self) -> Arc<Mutex<Vec<PatchCall>>> {
        self.patches.clone()
    }
}

#[async_trait]
impl SourceConnector for FakeConnector {
    async fn list_folder_children(
        &self,
        library_id: &str,
        folder_id: &str,
    ) -> ImportResult<Vec<DriveItemEntry>> {
        assert_eq!(library_id, "drive-1");
        assert_eq!(folder_id, "folder-1");
        if self.fail_listing {
            return Err(ImportError::SourceRequest("HTTP 503 unavailable".to_string()));
        }
        Ok(self.entries.clone())
    }

    async fn fetch_content(&self, _library_id: &str, file_id: &str) -> ImportResult<Vec<u8>> {
        self.contents
            .get(file_id)
            .cloned()
            .ok_or_else(|| ImportError::SourceRequest(format!("HTTP 404 {}", file_id)))
    }

    async fn patch_catalog_status(
        &self,
        site_id: &str,
        list_id: &str,
        catalog_entry_id: &str,
        status: &str,
        error_description: Option<&str>,
    ) -> ImportResult<()> {
        if self.fail_patch_for.contains(catalog_entry_id) {
            return Err(ImportError::SourceRequest("HTTP 500 patch failed".to_string()));
        }
        self.patches.lock().unwrap().push(PatchCall {
            site_id: site_id.to_string(),
            list_id: list_id.to_string(),
            catalog_entry_id: catalog_entry_id.to_string(),
            status: status.to_string(),
            error_description: error_description.map(str::to_string),
        });
        Ok(())
    }
}
