use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::Query;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApiError, Querier, Result};

use crate::{
    ipfs,
    ledger::Ledger,
    moderation::Moderator,
    publish::ContentStore,
    state::AppState,
    storage::DBPool,
};

/// 配置公开阅读视图的路由。
///
/// 路由包括：
/// - `GET /articles`：已发布文章列表
/// - `GET /articles/{id}`：获取单篇已发布文章
/// - `GET /tags`：获取所有已发布文章的标签
pub fn setup_route<L, C, M>() -> Router<AppState<L, C, M>>
where
    L: Ledger + Clone + Send + Sync + 'static,
    C: ContentStore + Clone + Send + Sync + 'static,
    M: Moderator + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/articles", get(articles_list))
        .route("/articles/{id}", get(article))
        .route("/tags", get(tag_list))
}

/// 文章元信息，用于列表展示。
#[derive(Debug, Serialize)]
pub struct ArticleMeta {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub ipfs_cid: Option<String>,
    pub created_at: i64,
    pub published_at: Option<i64>,
}

/// 完整文章，包括元信息、正文与去中心化副本地址。
#[derive(Debug, Serialize)]
pub struct ArticleDetail {
    #[serde(flatten)]
    meta: ArticleMeta,

    content: String,
    gateway_url: Option<String>,
    ipfs_uri: Option<String>,
}

/// 根据 id 获取单篇已发布文章。
///
/// 返回 [`ArticleDetail`]，如果文章不存在或未发布返回 [`ApiError::NotFound`]。
async fn article(
    Path(id): Path<Uuid>,
    State(pool): State<DBPool>,
) -> Result<Json<ArticleDetail>> {
    let article = pool.published_one(id).await?.ok_or(ApiError::NotFound)?;

    let gateway_url = article.ipfs_cid.as_deref().map(ipfs::gateway_url);
    let ipfs_uri = article.ipfs_cid.as_deref().map(ipfs::ipfs_uri);

    Ok(Json(ArticleDetail {
        meta: ArticleMeta {
            id: article.id,
            title: article.title,
            summary: article.summary,
            tags: article.tags,
            author: article.author,
            ipfs_cid: article.ipfs_cid,
            created_at: article.created_at.timestamp_millis(),
            published_at: article.published_at.map(|t| t.timestamp_millis()),
        },
        content: article.content,
        gateway_url,
        ipfs_uri,
    }))
}

/// 获取所有已发布文章的标签。
///
/// 返回标签列表。
async fn tag_list(State(pool): State<DBPool>) -> Result<Json<Vec<String>>> {
    pool.tags().await.map(Json).map_err(Into::into)
}

/// 查询参数，用于文章列表分页和标签筛选。
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct QueryParams {
    limit: i32,
    page: i32,
    tags: String,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            limit: 13,
            page: 1,
            tags: Default::default(),
        }
    }
}

/// 获取已发布文章列表。
///
/// 支持分页与标签筛选，按发布时间倒序。
/// 返回 [`ArticleMeta`] 列表。
async fn articles_list(
    Query(params): Query<QueryParams>,
    State(pool): State<DBPool>,
) -> Result<Json<Vec<ArticleMeta>>> {
    match pool
        .published_list(
            params.page,
            params.limit,
            params
                .tags
                .split(",")
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>(),
        )
        .await
    {
        Ok(data) => Ok(Json(
            data.into_iter()
                .map(|a| ArticleMeta {
                    id: a.id,
                    title: a.title,
                    summary: a.summary,
                    tags: a.tags,
                    author: a.author,
                    ipfs_cid: a.ipfs_cid,
                    created_at: a.created_at.timestamp_millis(),
                    published_at: a.published_at.map(|t| t.timestamp_millis()),
                })
                .collect(),
        )),
        Err(e) => Err(e.into()),
    }
}
