// ==========================================
// 文档库 Excel 导入 - 应用配置
// ==========================================
// 来源: 环境变量（可选 .env 文件，由 dotenvy 加载）
// 职责: 进程启动时构造一次，显式传入连接器与落库组件
// ==========================================

use crate::i18n::{available_locales, is_supported, DEFAULT_LOCALE};
use crate::importer::error::{ImportError, ImportResult};
use std::fmt;
use std::path::{Path, PathBuf};

/// Graph API 默认地址
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// OAuth2 授权服务默认地址
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// 请求默认超时（秒）
pub const DEFAULT_GRAPH_TIMEOUT_SECS: u64 = 120;

/// 默认数据库文件名
pub const DEFAULT_DATABASE_FILE: &str = "excel_loader.db";

/// 应用目录名（位于用户数据目录 / 配置目录下）
pub const APP_DIR_NAME: &str = "excel-loader";

// ==========================================
// GraphConfig - 文档库连接配置
// ==========================================
#[derive(Clone)]
pub struct GraphConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub graph_base_url: String,
    pub authority_host: String,
    pub timeout_secs: u64,
}

// client_secret 不进日志
impl fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("graph_base_url", &self.graph_base_url)
            .field("authority_host", &self.authority_host)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// ==========================================
// DatabaseConfig - 落库配置
// ==========================================
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

// ==========================================
// AppConfig - 应用配置
// ==========================================
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub graph: GraphConfig,
    pub database: DatabaseConfig,
    pub schema_dir: PathBuf,
    pub locale: String,
}

impl AppConfig {
    /// 从环境变量加载配置
    ///
    /// # 参数
    /// - env_file: 指定 .env 文件；None 时尝试加载当前目录的 .env（不存在不报错）
    ///
    /// # 返回
    /// - Err(Config): 必填项缺失或取值非法
    pub fn from_env(env_file: Option<&Path>) -> ImportResult<Self> {
        match env_file {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| {
                    ImportError::Config(format!("加载 {} 失败: {}", path.display(), e))
                })?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源构造配置（便于测试，不读写进程环境）
    pub fn from_lookup<F>(lookup: F) -> ImportResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &str| {
            optional(key).ok_or_else(|| ImportError::Config(format!("缺少环境变量 {}", key)))
        };

        let timeout_secs = match optional("GRAPH_TIMEOUT_SECS") {
            Some(v) => v.parse::<u64>().map_err(|_| {
                ImportError::Config(format!("GRAPH_TIMEOUT_SECS 取值非法: {}", v))
            })?,
            None => DEFAULT_GRAPH_TIMEOUT_SECS,
        };

        let graph = GraphConfig {
            tenant_id: required("TENANT_ID")?,
            client_id: required("CLIENT_ID")?,
            client_secret: required("CLIENT_SECRET")?,
            graph_base_url: optional("GRAPH_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GRAPH_BASE_URL.to_string()),
            authority_host: optional("GRAPH_AUTHORITY_HOST")
                .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string()),
            timeout_secs,
        };

        let database = DatabaseConfig {
            path: optional("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_database_path),
        };

        let schema_dir = optional("SCHEMA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_schema_dir);

        let locale = optional("LOADER_LOCALE").unwrap_or_else(|| DEFAULT_LOCALE.to_string());
        if !is_supported(&locale) {
            return Err(ImportError::Config(format!(
                "LOADER_LOCALE 不支持: {}（可用: {}）",
                locale,
                available_locales().join(", ")
            )));
        }

        Ok(Self {
            graph,
            database,
            schema_dir,
            locale,
        })
    }
}

/// 默认数据库路径: {data_dir}/excel-loader/excel_loader.db，无法获取时回退到当前目录
pub fn default_database_path() -> PathBuf {
    match dirs::data_dir() {
        Some(data_dir) => data_dir.join(APP_DIR_NAME).join(DEFAULT_DATABASE_FILE),
        None => PathBuf::from(DEFAULT_DATABASE_FILE),
    }
}

/// 默认 Schema 目录: 当前目录存在 schemas/ 时优先使用，否则 {config_dir}/excel-loader/schemas
pub fn default_schema_dir() -> PathBuf {
    let local = PathBuf::from("schemas");
    if local.is_dir() {
        return local;
    }
    match dirs::config_dir() {
        Some(config_dir) => config_dir.join(APP_DIR_NAME).join("schemas"),
        None => local,
    }
}
