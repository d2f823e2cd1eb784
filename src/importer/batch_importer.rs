// ==========================================
// 文档库 Excel 导入 - 批次编排器
// ==========================================
// 职责: 一次运行处理一个客户文件夹下的全部待处理文件
// 流程: 列表 → 筛选 → 并发（下载 → 物化 → 校验 → 落库 → 状态写回）
// 状态机:
//   Listed → Skipped
//   Listed → Materializing → Materialized | MaterializeFailed
//          → Validating → Loaded | ValidateFailed | LoadFailed
//          → StatusReported
// ==========================================

use crate::domain::candidate::{BatchReport, CandidateFile, FileReport};
use crate::domain::schema::SchemaDefinition;
use crate::domain::table::Table;
use crate::domain::types::{CatalogStatus, FileStage};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalMaterializer;
use crate::importer::importer_trait::{FileMaterializer, TableValidator};
use crate::importer::schema_validator::SchemaValidator;
use crate::repository::sink::TableSink;
use crate::source::connector::SourceConnector;
use futures::future::join_all;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn, Span};
use uuid::Uuid;

// ==========================================
// BatchImporter - 批次编排器
// ==========================================
pub struct BatchImporter<S, K>
where
    S: SourceConnector,
    K: TableSink,
{
    // 外部边界
    source: S,
    sink: K,

    // 客户 Schema（所有文件任务只读共享）
    schema: SchemaDefinition,

    // 管道组件
    materializer: Box<dyn FileMaterializer>,
    validator: Box<dyn TableValidator>,

    // 写回目录的错误描述语言
    locale: String,
}

impl<S, K> BatchImporter<S, K>
where
    S: SourceConnector,
    K: TableSink,
{
    /// 创建编排器
    ///
    /// # 参数
    /// - source: 文档库连接器
    /// - sink: 落库实现
    /// - schema: 客户 Schema
    /// - materializer: 文件物化器
    /// - validator: 表格校验器
    /// - locale: 错误描述语言
    pub fn new(
        source: S,
        sink: K,
        schema: SchemaDefinition,
        materializer: Box<dyn FileMaterializer>,
        validator: Box<dyn TableValidator>,
        locale: &str,
    ) -> Self {
        Self {
            source,
            sink,
            schema,
            materializer,
            validator,
            locale: locale.to_string(),
        }
    }

    /// 使用默认管道组件创建编排器（按扩展名物化 + Schema 校验）
    pub fn with_default_pipeline(source: S, sink: K, schema: SchemaDefinition, locale: &str) -> Self {
        Self::new(
            source,
            sink,
            schema,
            Box::new(UniversalMaterializer),
            Box::new(SchemaValidator),
            locale,
        )
    }

    pub fn schema(&self) -> &SchemaDefinition {
        &self.schema
    }

    /// 执行一次批次
    ///
    /// # 返回
    /// - Ok(BatchReport): 每个待处理文件恰好一条报告（已处理文件不在其中）
    /// - Err(SourceRequest): 文件夹列表失败（批次级致命错误）
    #[instrument(skip(self), fields(customer = %self.schema.customer_id(), run_id))]
    pub async fn run(&self) -> ImportResult<BatchReport> {
        let start_time = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        Span::current().record("run_id", run_id.as_str());

        let locator = self.schema.source_locator();
        info!(
            library = %locator.library_id,
            folder = %locator.folder_id,
            "开始批次导入"
        );

        // ===== 列表 + 筛选 =====
        let entries = self
            .source
            .list_folder_children(&locator.library_id, &locator.folder_id)
            .await?;
        let listed = entries.len();

        let (eligible, skipped): (Vec<CandidateFile>, Vec<CandidateFile>) = entries
            .into_iter()
            .map(|e| CandidateFile::new(&e.id, &e.name, &e.catalog_entry_id, e.status))
            .partition(CandidateFile::is_eligible);

        for candidate in &skipped {
            debug!(
                file = %candidate.name,
                status = candidate.status.as_deref().unwrap_or(""),
                stage = %FileStage::Skipped,
                "文件已处理，跳过"
            );
        }
        info!(listed, eligible = eligible.len(), skipped = skipped.len(), "文件筛选完成");

        // ===== 并发处理（全部收集，不短路）=====
        let tasks = eligible
            .into_iter()
            .map(|candidate| self.process_file(candidate, &run_id));
        let files = join_all(tasks).await;

        let report = BatchReport {
            run_id,
            customer_id: self.schema.customer_id().to_string(),
            listed,
            skipped: skipped.len(),
            files,
            elapsed_ms: start_time.elapsed().as_millis(),
        };

        info!(
            loaded = report.loaded_count(),
            failed = report.failed_count(),
            unreported = report.unreported_count(),
            elapsed_ms = report.elapsed_ms,
            "批次导入完成"
        );
        Ok(report)
    }

    /// 单文件任务：处理 + 状态写回（任何失败都收敛为报告，不向上传播）
    #[instrument(skip(self, candidate, run_id), fields(file = %candidate.name))]
    async fn process_file(&self, mut candidate: CandidateFile, run_id: &str) -> FileReport {
        debug!(run_id, stage = %FileStage::Listed, "开始处理文件");

        let (stage, error_description, rows_loaded) = match self.load_file(&mut candidate).await {
            Ok(rows) => {
                info!(rows, stage = %FileStage::Loaded, "文件导入成功");
                (FileStage::Loaded, None, rows)
            }
            Err((stage, err)) => {
                warn!(stage = %stage, error = %err, "文件导入失败");
                let description = err.localized_description(&self.locale, &candidate.name);
                (stage, Some(description), 0)
            }
        };
        // 三个失败态统一收敛为 Error
        let status = stage.catalog_status().unwrap_or(CatalogStatus::Error);

        // ===== 状态写回（不重试）=====
        let locator = self.schema.source_locator();
        let (status_reported, report_error) = match self
            .source
            .patch_catalog_status(
                &locator.site_id,
                &locator.list_id,
                &candidate.catalog_entry_id,
                status.as_field_value(),
                error_description.as_deref(),
            )
            .await
        {
            Ok(()) => {
                debug!(status = %status, stage = %FileStage::StatusReported, "目录状态已写回");
                (true, None)
            }
            Err(e) => {
                error!(status = %status, error = %e, "目录状态写回失败");
                (false, Some(e.to_string()))
            }
        };

        FileReport {
            file_id: candidate.id,
            file_name: candidate.name,
            catalog_entry_id: candidate.catalog_entry_id,
            stage,
            status,
            error_description,
            rows_loaded,
            status_reported,
            report_error,
        }
    }

    /// 下载 → 物化 → 校验 → 落库（严格顺序）
    ///
    /// # 返回
    /// - Ok(usize): 写入行数
    /// - Err((失败阶段, 错误))
    async fn load_file(&self, candidate: &mut CandidateFile) -> Result<usize, (FileStage, ImportError)> {
        let locator = self.schema.source_locator();

        // ===== 物化 =====
        debug!(stage = %FileStage::Materializing, "下载并物化文件");
        let bytes = self
            .source
            .fetch_content(&locator.library_id, &candidate.id)
            .await
            .map_err(|e| (FileStage::MaterializeFailed, e))?;
        let raw = self
            .materializer
            .materialize(&bytes, &candidate.name)
            .map_err(|e| (FileStage::MaterializeFailed, e))?;
        debug!(
            stage = %FileStage::Materialized,
            rows = raw.row_count(),
            columns = raw.columns().len(),
            "物化完成"
        );
        candidate.table = Some(raw);

        // ===== 校验（整体替换表格）=====
        debug!(stage = %FileStage::Validating, "校验表格");
        let raw = candidate.table.take().unwrap_or_default();
        let normalized = self
            .validator
            .validate(raw, &self.schema)
            .map_err(|e| (FileStage::ValidateFailed, e))?;
        let table = candidate.table.insert(normalized);

        // ===== 落库 =====
        self.sink
            .append_rows(self.schema.target_table(), table)
            .await
            .map_err(|e| (FileStage::LoadFailed, e))
    }
}

/// 本地文件试运行：仅物化 + 校验，不落库、不写回状态
///
/// # 参数
/// - bytes: 文件内容
/// - file_name: 文件名（决定解析格式）
/// - schema: 客户 Schema
pub fn process_local_file(
    bytes: &[u8],
    file_name: &str,
    schema: &SchemaDefinition,
) -> ImportResult<Table> {
    let raw = UniversalMaterializer.materialize(bytes, file_name)?;
    SchemaValidator.validate(raw, schema)
}
