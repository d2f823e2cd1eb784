// ==========================================
// 批次导入测试
// ==========================================
// 测试目标: 验证并发处理、故障隔离、跳过语义、状态写回
// ==========================================

mod test_helpers;

use excel_loader::domain::{CatalogStatus, FileStage};
use excel_loader::importer::{process_local_file, BatchImporter, ImportError};
use excel_loader::logging;
use test_helpers::*;

#[tokio::test]
async fn test_one_corrupt_file_does_not_affect_others() {
    logging::init_test();
    let (_temp_file, conn) = create_test_db();

    let source = FakeConnector::new()
        .with_file("1", "enero.xlsx", None, valid_ventas_xlsx("1"))
        .with_file("2", "febrero.xlsx", None, valid_ventas_xlsx("2"))
        .with_file("3", "marzo.xlsx", None, b"PK\x03\x04 corrupt bytes".to_vec())
        .with_file("4", "abril.xlsx", Some("Error"), valid_ventas_xlsx("4"))
        .with_file("5", "mayo.xlsx", None, valid_ventas_xlsx("5"));
    let patches = source.patch_log();

    let importer =
        BatchImporter::with_default_pipeline(source, sink_on(&conn), ventas_schema(), "es");
    let report = importer.run().await.expect("批次不应失败");

    assert_eq!(report.listed, 5);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.loaded_count(), 4);
    assert_eq!(report.failed_count(), 1);

    let failed = report.files.iter().find(|f| !f.is_loaded()).unwrap();
    assert_eq!(failed.file_id, "3");
    assert_eq!(failed.stage, FileStage::MaterializeFailed);
    assert!(failed.error_description.as_deref().unwrap().contains("marzo.xlsx"));

    let patches = patches.lock().unwrap();
    assert_eq!(patches.len(), 5);
    assert_eq!(patches.iter().filter(|p| p.status == "Cargado").count(), 4);
    assert_eq!(patches.iter().filter(|p| p.status == "Error").count(), 1);
    assert!(patches
        .iter()
        .filter(|p| p.status == "Cargado")
        .all(|p| p.error_description.is_none()));
    assert!(patches.iter().all(|p| p.site_id == "site-1" && p.list_id == "list-1"));

    assert_eq!(sink_on(&conn).count_rows(TARGET_TABLE).unwrap(), 4);
}

#[tokio::test]
async fn test_already_processed_files_are_skipped() {
    logging::init_test();
    let (_temp_file, conn) = create_test_db();

    let source = FakeConnector::new()
        .with_file("1", "nuevo.xlsx", None, valid_ventas_xlsx("1"))
        .with_file("2", "cargado.xlsx", Some("Cargado"), valid_ventas_xlsx("2"))
        .with_file("3", "reintento.xlsx", Some("Error"), valid_ventas_xlsx("3"))
        .with_file("4", "en_blanco.xlsx", Some(""), valid_ventas_xlsx("4"));
    let patches = source.patch_log();

    let importer =
        BatchImporter::with_default_pipeline(source, sink_on(&conn), ventas_schema(), "es");
    let report = importer.run().await.unwrap();

    // 空串状态视为已处理，与 "Cargado" 一样跳过
    assert_eq!(report.listed, 4);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.files.len(), 2);
    assert!(report
        .files
        .iter()
        .all(|f| f.file_id != "2" && f.file_id != "4"));

    let patches = patches.lock().unwrap();
    assert_eq!(patches.len(), 2);
    assert!(patches
        .iter()
        .all(|p| p.catalog_entry_id != "entry-2" && p.catalog_entry_id != "entry-4"));
    assert_eq!(sink_on(&conn).count_rows(TARGET_TABLE).unwrap(), 2);
}

#[tokio::test]
async fn test_round_trip_row_lands_in_sink() {
    logging::init_test();
    let (_temp_file, conn) = create_test_db();

    let bytes = xlsx_bytes(&[&["A", "B", "Notas"], &["1", "2024-01-02", "se descarta"]]);
    let source = FakeConnector::new().with_file("1", "ab.xlsx", None, bytes);

    let importer = BatchImporter::with_default_pipeline(source, sink_on(&conn), ab_schema(), "es");
    let report = importer.run().await.unwrap();
    assert_eq!(report.loaded_count(), 1);
    assert_eq!(report.files[0].rows_loaded, 1);
    assert_eq!(report.files[0].stage, FileStage::Loaded);
    assert_eq!(report.files[0].status, CatalogStatus::Loaded);

    let conn = conn.lock().unwrap();
    let (col_a, col_b, customer): (i64, String, String) = conn
        .query_row(
            "SELECT \"colA\", \"colB\", \"customer_code\" FROM \"ventas\"",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(col_a, 1);
    assert_eq!(col_b, "2024-01-02 00:00:00");
    assert_eq!(customer, CUSTOMER);

    // 投影后仅保留目标列 + 客户列
    let column_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM pragma_table_info('ventas')", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(column_count, 3);
}

#[tokio::test]
async fn test_fail_fast_reports_first_type_map_column() {
    logging::init_test();
    let (_temp_file, conn) = create_test_db();

    let bytes = xlsx_bytes(&[&["Cantidad", "Fecha"], &["uno", "ayer"]]);
    let source = FakeConnector::new().with_file("1", "malo.xlsx", None, bytes);

    let importer =
        BatchImporter::with_default_pipeline(source, sink_on(&conn), ventas_schema(), "es");
    let report = importer.run().await.unwrap();

    let file = &report.files[0];
    assert_eq!(file.stage, FileStage::ValidateFailed);
    assert_eq!(file.status, CatalogStatus::Error);
    let description = file.error_description.as_deref().unwrap();
    assert!(description.contains("Cantidad"));
    assert!(!description.contains("Fecha"));
    assert!(!description.contains("ayer"));
}

fn has_cjk(text: &str) -> bool {
    text.chars().any(|c| ('\u{4E00}'..='\u{9FFF}').contains(&c))
}

#[tokio::test]
async fn test_spanish_descriptions_are_fully_spanish() {
    logging::init_test();
    let (_temp_file, conn) = create_test_db();

    let source = FakeConnector::new()
        .with_file(
            "1",
            "cantidad.xlsx",
            None,
            xlsx_bytes(&[&["Cantidad", "Fecha"], &["uno", "2024-01-02"]]),
        )
        .with_file("2", "roto.xlsx", None, b"PK\x03\x04 no es un libro".to_vec())
        .with_file("3", "notas.txt", None, b"Cantidad,Fecha\n1,2024-01-02\n".to_vec())
        .with_file(
            "4",
            "fecha.xlsx",
            None,
            xlsx_bytes(&[&["Cantidad", "Fecha"], &["1", "ayer"]]),
        );

    let importer =
        BatchImporter::with_default_pipeline(source, sink_on(&conn), ventas_schema(), "es");
    let report = importer.run().await.unwrap();
    assert_eq!(report.failed_count(), 4);

    for file in &report.files {
        let description = file.error_description.as_deref().unwrap();
        assert!(!has_cjk(description), "{}", description);
        assert!(description.contains(&file.file_name), "{}", description);
    }

    let by_id = |id: &str| report.files.iter().find(|f| f.file_id == id).unwrap();
    let cantidad = by_id("1").error_description.as_deref().unwrap();
    assert!(cantidad.contains("'uno'"));
    assert!(cantidad.contains("fila 1"));
    assert!(cantidad.contains("número entero"));
    assert!(by_id("3")
        .error_description
        .as_deref()
        .unwrap()
        .contains("'txt'"));
    assert!(by_id("4")
        .error_description
        .as_deref()
        .unwrap()
        .contains("'ayer'"));
}

#[tokio::test]
async fn test_multi_sheet_and_empty_files_report_error() {
    logging::init_test();
    let (_temp_file, conn) = create_test_db();

    let two_sheets = multi_sheet_xlsx(&[
        &[&["Cantidad", "Fecha"], &["1", "2024-01-02"]],
        &[&["Cantidad", "Fecha"], &["2", "2024-01-03"]],
    ]);
    let empty = xlsx_bytes(&[]);
    let missing = xlsx_bytes(&[&["Cantidad"], &["1"]]);
    let source = FakeConnector::new()
        .with_file("1", "dos_hojas.xlsx", None, two_sheets)
        .with_file("2", "vacio.xlsx", None, empty)
        .with_file("3", "sin_fecha.xlsx", None, missing);

    let importer =
        BatchImporter::with_default_pipeline(source, sink_on(&conn), ventas_schema(), "en");
    let report = importer.run().await.unwrap();
    assert_eq!(report.failed_count(), 3);

    let by_id = |id: &str| report.files.iter().find(|f| f.file_id == id).unwrap();

    assert_eq!(by_id("1").stage, FileStage::MaterializeFailed);
    assert!(by_id("1").error_description.as_deref().unwrap().contains("sheets"));

    assert_eq!(by_id("2").stage, FileStage::ValidateFailed);
    assert!(by_id("2").error_description.as_deref().unwrap().contains("empty"));

    assert_eq!(by_id("3").stage, FileStage::ValidateFailed);
    let missing_desc = by_id("3").error_description.as_deref().unwrap();
    assert!(missing_desc.contains("missing"));
    assert!(missing_desc.contains("Fecha"));
}

#[tokio::test]
async fn test_listing_failure_is_fatal() {
    logging::init_test();
    let (_temp_file, conn) = create_test_db();

    let source = FakeConnector::new()
        .with_file("1", "enero.xlsx", None, valid_ventas_xlsx("1"))
        .failing_listing();
    let patches = source.patch_log();

    let importer =
        BatchImporter::with_default_pipeline(source, sink_on(&conn), ventas_schema(), "es");
    let err = importer.run().await.unwrap_err();

    assert!(matches!(err, ImportError::SourceRequest(_)));
    assert!(patches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_status_patch_failure_is_recorded_not_fatal() {
    logging::init_test();
    let (_temp_file, conn) = create_test_db();

    let source = FakeConnector::new()
        .with_file("1", "enero.xlsx", None, valid_ventas_xlsx("1"))
        .with_file("2", "febrero.xlsx", None, valid_ventas_xlsx("2"))
        .failing_patch_for("entry-1");
    let patches = source.patch_log();

    let importer =
        BatchImporter::with_default_pipeline(source, sink_on(&conn), ventas_schema(), "es");
    let report = importer.run().await.unwrap();

    assert_eq!(report.loaded_count(), 2);
    assert_eq!(report.unreported_count(), 1);

    let unreported = report.files.iter().find(|f| !f.status_reported).unwrap();
    assert_eq!(unreported.file_id, "1");
    assert!(unreported.report_error.is_some());
    assert_eq!(patches.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_sink_failure_reports_load_failed() {
    logging::init_test();
    let (_temp_file, conn) = create_test_db();

    // 目标表已存在但缺少 fecha 列
    conn.lock()
        .unwrap()
        .execute_batch("CREATE TABLE ventas (cantidad INTEGER, customer_code TEXT);")
        .unwrap();

    let source = FakeConnector::new().with_file("1", "enero.xlsx", None, valid_ventas_xlsx("1"));
    let patches = source.patch_log();

    let importer =
        BatchImporter::with_default_pipeline(source, sink_on(&conn), ventas_schema(), "es");
    let report = importer.run().await.unwrap();

    assert_eq!(report.files[0].stage, FileStage::LoadFailed);
    assert_eq!(report.files[0].status, CatalogStatus::Error);
    assert_eq!(patches.lock().unwrap()[0].status, "Error");
    assert_eq!(sink_on(&conn).count_rows(TARGET_TABLE).unwrap(), 0);
}

#[test]
fn test_process_local_file_dry_run() {
    let bytes = valid_ventas_xlsx("42");
    let table = process_local_file(&bytes, "local.xlsx", &ventas_schema()).unwrap();

    assert_eq!(table.row_count(), 1);
    assert_eq!(table.column_names(), vec!["cantidad", "fecha", "customer_code"]);
}
