// ==========================================
// 文档库 Excel 导入 - SQLite 落库实现
// ==========================================
// 职责: 按表格列类型建表（不存在时）并事务化追加
// 类型: INTEGER / REAL / TEXT（日期按 YYYY-MM-DD HH:MM:SS 文本存储）
// ==========================================

use crate::db::{open_sqlite_connection, quote_identifier};
use crate::domain::table::Table;
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::sink::TableSink;
use async_trait::async_trait;
use rusqlite::{params_from_iter, Connection, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task;
use tracing::debug;

// ==========================================
// SqliteSink
// ==========================================
pub struct SqliteSink {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSink {
    /// 打开数据库文件创建落库实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &Path) -> ImportResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    /// 使用已有连接创建落库实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 统计目标表行数
    pub fn count_rows(&self, table_name: &str) -> ImportResult<usize> {
        let conn = lock_connection(&self.conn)?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_identifier(table_name)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// 单事务写入整张表（同步执行，失败整体回滚）
    fn append_blocking(
        conn: &Mutex<Connection>,
        table_name: &str,
        table: &Table,
    ) -> ImportResult<usize> {
        let conn = lock_connection(conn)?;
        let tx = conn.unchecked_transaction()?;

        Self::create_table_tx(&tx, table_name, table)?;
        let count = Self::insert_rows_tx(&tx, table_name, table)?;

        tx.commit()?;
        Ok(count)
    }

    /// 在事务中建表（不存在时）
    fn create_table_tx(tx: &Transaction, table_name: &str, table: &Table) -> ImportResult<()> {
        let columns: Vec<String> = table
            .columns()
            .iter()
            .map(|c| format!("{} {}", quote_identifier(&c.name), c.values.sql_type()))
            .collect();
        tx.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} ({});",
            quote_identifier(table_name),
            columns.join(", ")
        ))?;
        Ok(())
    }

    /// 在事务中批量插入
    fn insert_rows_tx(tx: &Transaction, table_name: &str, table: &Table) -> ImportResult<usize> {
        let names: Vec<String> = table
            .columns()
            .iter()
            .map(|c| quote_identifier(&c.name))
            .collect();
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{}", i)).collect();

        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(table_name),
            names.join(", "),
            placeholders.join(", ")
        ))?;

        let mut count = 0;
        for row in 0..table.row_count() {
            stmt.execute(params_from_iter(table.row_values(row)))?;
            count += 1;
        }
        Ok(count)
    }
}

#[async_trait]
impl TableSink for SqliteSink {
    async fn append_rows(&self, table_name: &str, table: &Table) -> ImportResult<usize> {
        if table.columns().is_empty() {
            debug!(table = table_name, "表格无列，跳过落库");
            return Ok(0);
        }

        // SQLite 调用为同步 IO，移到阻塞线程池执行
        let conn = Arc::clone(&self.conn);
        let target = table_name.to_string();
        let rows = table.clone();
        let count = task::spawn_blocking(move || Self::append_blocking(&conn, &target, &rows))
            .await
            .map_err(|e| ImportError::SinkWrite(e.to_string()))??;

        debug!(table = table_name, rows = count, "落库完成");
        Ok(count)
    }
}

fn lock_connection(conn: &Mutex<Connection>) -> ImportResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| ImportError::SinkWrite(e.to_string()))
}
