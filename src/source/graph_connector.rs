// ==========================================
// 文档库 Excel 导入 - Microsoft Graph 连接器
// ==========================================
// 认证: OAuth2 client-credentials，令牌缓存至过期前 60 秒
// 接口:
//   GET   /drives/{drive}/items/{folder}/children   列表（@odata.nextLink 分页）
//   GET   /drives/{drive}/items/{item}/content      下载
//   PATCH /sites/{site}/lists/{list}/items/{id}/fields  状态写回
// ==========================================

use crate::config::app_config::GraphConfig;
use crate::importer::error::{ImportError, ImportResult};
use crate::source::connector::{DriveItemEntry, SourceConnector};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// 令牌作用域
pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// 令牌提前刷新余量
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// 列表请求的字段选择
const CHILDREN_SELECT: &str = "id,name,file";
const CHILDREN_EXPAND: &str = "listItem($expand=fields)";

// ==========================================
// Graph 响应结构
// ==========================================
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct ChildrenPage {
    #[serde(default)]
    value: Vec<DriveItem>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DriveItem {
    id: String,
    name: String,
    file: Option<serde_json::Value>,
    #[serde(rename = "listItem")]
    list_item: Option<ListItem>,
}

#[derive(Debug, Deserialize)]
struct ListItem {
    id: String,
    #[serde(default)]
    fields: HashMap<String, serde_json::Value>,
}

impl DriveItem {
    /// 转换为列表条目（文件夹或无目录条目的项返回 None）
    fn into_entry(self) -> Option<DriveItemEntry> {
        self.file.as_ref()?;
        let list_item = self.list_item?;
        let status = list_item
            .fields
            .get("Status")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        Some(DriveItemEntry {
            id: self.id,
            name: self.name,
            catalog_entry_id: list_item.id,
            status,
        })
    }
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

// ==========================================
// GraphConnector
// ==========================================
pub struct GraphConnector {
    client: Client,
    config: GraphConfig,
    token: Mutex<Option<CachedToken>>,
}

impl GraphConnector {
    /// 创建连接器
    ///
    /// # 参数
    /// - config: 文档库连接配置（进程启动时构造）
    pub fn new(config: GraphConfig) -> ImportResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            token: Mutex::new(None),
        })
    }

    fn graph_url(&self, path: &str) -> String {
        format!("{}{}", self.config.graph_base_url.trim_end_matches('/'), path)
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.config.authority_host.trim_end_matches('/'),
            self.config.tenant_id
        )
    }

    /// 获取访问令牌（缓存命中则直接返回）
    async fn access_token(&self) -> ImportResult<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() + TOKEN_REFRESH_MARGIN < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        debug!(tenant = %self.config.tenant_id, "请求访问令牌");
        let response = self
            .client
            .post(self.token_url())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("scope", GRAPH_SCOPE),
            ])
            .send()
            .await?;
        let token: TokenResponse = check_status(response, "获取访问令牌").await?.json().await?;

        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(access_token)
    }
}

/// 非 2xx 响应 → SourceRequest（只携带状态码、请求路径与响应体原文）
async fn check_status(response: Response, action: &str) -> ImportResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let path = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();
    warn!(action, status = status.as_u16(), path = %path, "Graph 请求失败");
    Err(ImportError::SourceRequest(format!(
        "HTTP {} {}: {}",
        status.as_u16(),
        path,
        body.trim()
    )))
}

#[async_trait]
impl SourceConnector for GraphConnector {
    async fn list_folder_children(
        &self,
        library_id: &str,
        folder_id: &str,
    ) -> ImportResult<Vec<DriveItemEntry>> {
        let token = self.access_token().await?;

        let first = self
            .client
            .get(self.graph_url(&format!("/drives/{}/items/{}/children", library_id, folder_id)))
            .query(&[("$select", CHILDREN_SELECT), ("$expand", CHILDREN_EXPAND)])
            .bearer_auth(&token)
            .send()
            .await?;
        let mut page: ChildrenPage = check_status(first, "列出文件夹").await?.json().await?;

        let mut entries = Vec::new();
        let mut pages = 1usize;
        loop {
            entries.extend(page.value.into_iter().filter_map(DriveItem::into_entry));

            let next = match page.next_link {
                Some(link) => link,
                None => break,
            };
            let response = self.client.get(next).bearer_auth(&token).send().await?;
            page = check_status(response, "列出文件夹").await?.json().await?;
            pages += 1;
        }

        info!(
            library = library_id,
            folder = folder_id,
            pages,
            files = entries.len(),
            "文件夹列表完成"
        );
        Ok(entries)
    }

    async fn fetch_content(&self, library_id: &str, file_id: &str) -> ImportResult<Vec<u8>> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(self.graph_url(&format!("/drives/{}/items/{}/content", library_id, file_id)))
            .bearer_auth(&token)
            .send()
            .await?;
        let bytes = check_status(response, "下载文件").await?.bytes().await?;
        debug!(file_id, size = bytes.len(), "文件下载完成");
        Ok(bytes.to_vec())
    }

    async fn patch_catalog_status(
        &self,
        site_id: &str,
        list_id: &str,
        catalog_entry_id: &str,
        status: &str,
        error_description: Option<&str>,
    ) -> ImportResult<()> {
        let token = self.access_token().await?;
        let response = self
            .client
            .patch(self.graph_url(&format!(
                "/sites/{}/lists/{}/items/{}/fields",
                site_id, list_id, catalog_entry_id
            )))
            .bearer_auth(&token)
            .json(&json!({
                "Status": status,
                "ErrorDescription": error_description.unwrap_or(""),
            }))
            .send()
            .await?;
        check_status(response, "写回目录状态").await?;
        debug!(catalog_entry_id, status, "目录状态已写回");
        Ok(())
    }
}
