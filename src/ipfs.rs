use std::time::Instant;

use axum::http::{HeaderMap, HeaderValue};
use reqwest::header;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::publish::ContentStore;

/// 默认上传端点
pub const DEFAULT_UPLOAD_URL: &str = "https://api.web3.storage";

/// 公共 IPFS 网关
pub const IPFS_GATEWAY: &str = "https://w3s.link/ipfs/";

/// web3.storage 上传客户端
///
/// 将文章正文作为不透明文件上传到内容寻址存储网络，返回 CID。
#[derive(Clone)]
pub struct Web3StorageClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for Web3StorageClient {
    /// 从环境变量 WEB3_STORAGE_TOKEN（可选 WEB3_STORAGE_URL）创建默认客户端
    ///
    /// - Panics
    ///
    /// 如果 WEB3_STORAGE_TOKEN 未设置，会 panic
    fn default() -> Self {
        Self::new(
            std::env::var("WEB3_STORAGE_URL").unwrap_or_else(|_| DEFAULT_UPLOAD_URL.to_string()),
            std::env::var("WEB3_STORAGE_TOKEN").expect("WEB3_STORAGE_TOKEN not set"),
        )
    }
}

impl Web3StorageClient {
    pub fn new(base_url: impl Into<String>, token: impl AsRef<str>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .default_headers({
                let mut headers = HeaderMap::new();
                headers.insert(
                    header::AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {}", token.as_ref()))
                        .expect("Failed to create Authorization header"),
                );
                headers
            })
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

/// 从上传响应中提取 CID
fn extract_cid(body: &Value) -> Option<String> {
    body.pointer("/cid")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// CID 对应的公共网关地址
pub fn gateway_url(cid: &str) -> String {
    format!("{IPFS_GATEWAY}{cid}")
}

/// CID 对应的 `ipfs://` URI
pub fn ipfs_uri(cid: &str) -> String {
    format!("ipfs://{cid}")
}

impl ContentStore for Web3StorageClient {
    async fn upload(&self, content: &str) -> Result<String> {
        let url = format!("{}/upload", self.base_url);

        tracing::info!("Writing article content to IPFS");
        let start = Instant::now();

        let response = self
            .client
            .post(&url)
            .body(content.to_string())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Upload(format!(
                "upload failed: {} {}",
                response.status(),
                response
                    .status()
                    .canonical_reason()
                    .unwrap_or("Unknown error")
            )));
        }

        let body: Value = response.json().await?;
        let cid = extract_cid(&body)
            .ok_or_else(|| Error::Upload("upload response missing cid".to_string()))?;

        tracing::info!(%cid, elapsed = ?start.elapsed(), "Uploaded to IPFS");
        Ok(cid)
    }
}
