use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::Query;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApiError, Error, Querier, Result};

use crate::{
    ledger::Ledger,
    moderation::Moderator,
    publish::{self, ContentStore, PublishOutcome},
    state::AppState,
    storage::{DBPool, Draft, DraftStore, DraftSummary},
    workflow::{DraftInput, ReviewAction},
};

/// 配置草稿工作流路由。
///
/// 路由包括：
/// - `POST /drafts`、`GET /drafts`：创建草稿、按钱包地址列出草稿
/// - `GET /drafts/{id}`、`PUT /drafts/{id}`：读取与编辑
/// - `POST /drafts/{id}/submit`：提交审核
/// - `POST /drafts/{id}/review`：审核动作
/// - `POST /drafts/{id}/publish`：发布
/// - `GET /reviews`：审核队列
/// - `POST /reconcile`：发布对账
/// - `GET /articles/{id}/provenance`：链上登记交叉校验
pub fn setup_route<L, C, M>() -> Router<AppState<L, C, M>>
where
    L: Ledger + Clone + Send + Sync + 'static,
    C: ContentStore + Clone + Send + Sync + 'static,
    M: Moderator + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/drafts", post(create_draft).get(list_drafts))
        .route("/drafts/{id}", get(get_draft).put(update_draft))
        .route("/drafts/{id}/submit", post(submit_draft))
        .route("/drafts/{id}/review", post(review_draft))
        .route("/drafts/{id}/publish", post(publish_article::<L, C, M>))
        .route("/reviews", get(review_queue))
        .route("/reconcile", post(reconcile::<L, C, M>))
        .route("/articles/{id}/provenance", get(provenance::<L, C, M>))
}

/// 创建草稿
///
/// 保存草稿只要求标题非空，其余字段可以留待后续编辑。
async fn create_draft(
    State(pool): State<DBPool>,
    Json(input): Json<DraftInput>,
) -> Result<Json<Draft>> {
    input.validate_draft()?;
    let draft = pool.insert(&input).await?;
    Ok(Json(draft))
}

/// 查询单条草稿（任意状态）
async fn get_draft(Path(id): Path<Uuid>, State(pool): State<DBPool>) -> Result<Json<Draft>> {
    let draft = pool.get_draft(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(draft))
}

/// 编辑草稿
///
/// 只有记录归属的钱包地址可以编辑；已发布的记录不可编辑。
async fn update_draft(
    Path(id): Path<Uuid>,
    State(pool): State<DBPool>,
    Json(input): Json<DraftInput>,
) -> Result<Json<Draft>> {
    input.validate_draft()?;

    let existing = pool.get_draft(id).await?.ok_or(ApiError::NotFound)?;
    if existing.wallet_address.is_some() && existing.wallet_address != input.wallet_address {
        return Err(ApiError::Forbidden("only the draft owner may edit").into());
    }

    let draft = DraftStore::update(&pool, id, &input)
        .await?
        .ok_or(ApiError::Conflict("published drafts cannot be edited"))?;
    Ok(Json(draft))
}

/// 工作台筛选条件
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ListFilter {
    #[default]
    All,
    Drafts,
    Published,
}

#[derive(Debug, Deserialize)]
struct ListParams {
    wallet_address: String,

    #[serde(default)]
    filter: ListFilter,
}

/// 按钱包地址列出草稿，按创建时间倒序。
async fn list_drafts(
    Query(params): Query<ListParams>,
    State(pool): State<DBPool>,
) -> Result<Json<Vec<DraftSummary>>> {
    let drafts = pool.drafts_by_wallet(&params.wallet_address).await?;

    let drafts = drafts
        .into_iter()
        .filter(|d| match params.filter {
            ListFilter::All => true,
            ListFilter::Drafts => !d.is_published,
            ListFilter::Published => d.is_published,
        })
        .collect();

    Ok(Json(drafts))
}

/// 提交审核
///
/// 校验必填字段后将 `draft`/`rejected` 转移到 `under_review`，
/// 重新提交会清空上一轮审核记录。
async fn submit_draft(
    Path(id): Path<Uuid>,
    State(pool): State<DBPool>,
    Json(input): Json<DraftInput>,
) -> Result<Json<Draft>> {
    input.validate_submission()?;

    match pool.submit(id, &input).await? {
        Some(draft) => Ok(Json(draft)),
        None => {
            pool.get_draft(id).await?.ok_or(ApiError::NotFound)?;
            Err(ApiError::Conflict("draft cannot be submitted in its current status").into())
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReviewRequest {
    reviewer: String,
    action: ReviewAction,
}

/// 审核动作
///
/// 转移条件在一条条件更新里判定，拒绝自审、重复审核与已离开审核状态的记录。
async fn review_draft(
    Path(id): Path<Uuid>,
    State(pool): State<DBPool>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<Draft>> {
    let reviewer = req.reviewer.trim();
    if reviewer.is_empty() {
        return Err(ApiError::Forbidden("reviewer identity is required").into());
    }

    match pool
        .record_review(id, reviewer, req.action.as_status().as_str())
        .await?
    {
        Some(draft) => Ok(Json(draft)),
        None => Err(classify_review_refusal(&pool, id, reviewer).await?),
    }
}

/// 条件更新零行命中后重读记录，仅用于区分拒绝原因。
async fn classify_review_refusal(pool: &DBPool, id: Uuid, reviewer: &str) -> Result<Error> {
    let draft = pool.get_draft(id).await?.ok_or(ApiError::NotFound)?;

    if draft.wallet_address.as_deref() == Some(reviewer) {
        return Ok(ApiError::Forbidden("authors cannot review their own draft").into());
    }
    if draft.reviewed_by.iter().any(|r| r == reviewer) {
        return Ok(ApiError::Conflict("reviewer has already acted on this draft").into());
    }
    Ok(ApiError::Conflict("draft is no longer under review").into())
}

/// 审核队列：`under_review` 与 `approved` 的草稿。
async fn review_queue(State(pool): State<DBPool>) -> Result<Json<Vec<Draft>>> {
    pool.review_queue().await.map(Json).map_err(Into::into)
}

#[derive(Debug, Deserialize)]
struct PublishRequest {
    wallet_address: String,
}

/// 发布已批准的草稿（仅限记录归属的钱包触发）。
async fn publish_article<L, C, M>(
    Path(id): Path<Uuid>,
    State(app): State<AppState<L, C, M>>,
    Json(req): Json<PublishRequest>,
) -> Result<Json<PublishOutcome>>
where
    L: Ledger + Clone + Send + Sync + 'static,
    C: ContentStore + Clone + Send + Sync + 'static,
    M: Moderator + Clone + Send + Sync + 'static,
{
    let outcome = publish::publish_draft(
        app.store(),
        app.content_store(),
        app.ledger(),
        id,
        req.wallet_address.trim(),
    )
    .await?;

    Ok(Json(outcome))
}

#[derive(Debug, Serialize)]
struct ReconcileResponse {
    finalized: u32,
}

/// 发布对账：完成遗留的落库，清理已回滚的交易。
async fn reconcile<L, C, M>(
    State(app): State<AppState<L, C, M>>,
) -> Result<Json<ReconcileResponse>>
where
    L: Ledger + Clone + Send + Sync + 'static,
    C: ContentStore + Clone + Send + Sync + 'static,
    M: Moderator + Clone + Send + Sync + 'static,
{
    let finalized = publish::reconcile_pending(app.store(), app.ledger()).await?;
    Ok(Json(ReconcileResponse { finalized }))
}

#[derive(Debug, Serialize)]
struct LedgerEntry {
    author: String,
    ipfs_hash: String,
    title: String,
    timestamp: u64,
}

#[derive(Debug, Serialize)]
struct Provenance {
    article_index: i64,
    matches: bool,
    ledger: Option<LedgerEntry>,
}

/// 已发布文章与链上登记的交叉校验。
///
/// 按存储的文章索引读取链上条目，比对标题与内容标识。
async fn provenance<L, C, M>(
    Path(id): Path<Uuid>,
    State(app): State<AppState<L, C, M>>,
) -> Result<Json<Provenance>>
where
    L: Ledger + Clone + Send + Sync + 'static,
    C: ContentStore + Clone + Send + Sync + 'static,
    M: Moderator + Clone + Send + Sync + 'static,
{
    let draft = app
        .querier()
        .published_one(id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let article_index = draft.article_index.ok_or(ApiError::NotFound)?;

    let entry = app.ledger().article_at(article_index as u64).await?;

    let matches = entry
        .as_ref()
        .map(|e| {
            Some(e.ipfs_hash.as_str()) == draft.ipfs_cid.as_deref() && e.title == draft.title
        })
        .unwrap_or(false);

    Ok(Json(Provenance {
        article_index,
        matches,
        ledger: entry.map(|e| LedgerEntry {
            author: e.author,
            ipfs_hash: e.ipfs_hash,
            title: e.title,
            timestamp: e.timestamp,
        }),
    }))
}
