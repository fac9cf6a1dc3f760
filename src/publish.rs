use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::{ApiError, Error, Result},
    ledger::Ledger,
    storage::DraftStore,
    workflow::Status,
};

/// 内容寻址存储的能力接口
pub trait ContentStore: Send + Sync {
    /// 上传正文内容，返回内容标识符（CID）
    fn upload(&self, content: &str) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// 发布管线对外的四值状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Idle,
    Uploading,
    Success,
    Error,
}

/// 发布结果
#[derive(Debug, Serialize)]
pub struct PublishOutcome {
    pub status: UploadStatus,
    pub message: &'static str,
    pub tx_hash: String,
    pub ipfs_cid: String,
    pub article_index: i64,
}

const MSG_PREPARING: &str = "Preparing upload...";
const MSG_UPLOADING: &str = "Uploading to IPFS...";
const MSG_SENDING: &str = "Sending transaction to blockchain...";
const MSG_WAITING: &str = "Waiting for confirmation...";
const MSG_SAVING: &str = "Saving metadata...";
const MSG_DONE: &str = "Article published to IPFS and blockchain!";

fn phase(percent: u8, message: &'static str) {
    tracing::info!(percent, "{message}");
}

/// 发布一篇已批准的草稿
///
/// 顺序执行：上传正文 → 读取链上计数 → 提交交易 → 落库待确认信息 →
/// 等待确认 → 完成落库。上传或提交阶段失败时记录保持 `approved`，可直接重试。
///
/// 已携带交易哈希的草稿重试时不会再次提交交易，只恢复确认与落库两步。
pub async fn publish_draft<S, C, L>(
    store: &S,
    content_store: &C,
    ledger: &L,
    id: Uuid,
    wallet: &str,
) -> Result<PublishOutcome>
where
    S: DraftStore,
    C: ContentStore,
    L: Ledger,
{
    let draft = store.get(id).await?.ok_or(ApiError::NotFound)?;

    if draft.wallet_address.as_deref() != Some(wallet) {
        return Err(ApiError::Forbidden("only the draft owner may publish").into());
    }

    if draft.is_published {
        return Err(ApiError::Conflict("draft is already published").into());
    }

    // 重试路径：交易已经提交过，只恢复确认与落库
    if let Some(tx_hash) = draft.tx_hash.clone() {
        let ipfs_cid = draft.ipfs_cid.clone().unwrap_or_default();
        let article_index = draft.article_index.unwrap_or_default();
        phase(95, MSG_WAITING);
        return confirm_and_finalize(store, ledger, id, &tx_hash, &ipfs_cid, article_index).await;
    }

    if Status::parse(&draft.status) != Some(Status::Approved) {
        return Err(ApiError::Conflict("draft is not approved for publication").into());
    }

    phase(0, MSG_PREPARING);

    phase(10, MSG_UPLOADING);
    let ipfs_cid = content_store.upload(&draft.content).await?;

    let article_index = ledger.article_count().await? as i64;

    phase(90, MSG_SENDING);
    let tx_hash = ledger.submit_article(&draft.title, &ipfs_cid).await?;

    // 确认前先落库交易信息，之后的任何失败都能凭交易哈希恢复
    store
        .mark_pending_publish(id, &tx_hash, &ipfs_cid, article_index)
        .await?
        .ok_or(ApiError::Conflict(
            "draft left the approved state during publication",
        ))?;

    phase(95, MSG_WAITING);
    confirm_and_finalize(store, ledger, id, &tx_hash, &ipfs_cid, article_index).await
}

async fn confirm_and_finalize<S, L>(
    store: &S,
    ledger: &L,
    id: Uuid,
    tx_hash: &str,
    ipfs_cid: &str,
    article_index: i64,
) -> Result<PublishOutcome>
where
    S: DraftStore,
    L: Ledger,
{
    if !ledger.confirm(tx_hash).await? {
        store.clear_pending_publish(id, tx_hash).await?;
        return Err(Error::Ledger(format!("transaction {tx_hash} reverted")));
    }

    phase(98, MSG_SAVING);
    store
        .finalize_publish(id, tx_hash)
        .await?
        .ok_or_else(|| Error::Ledger(format!("no draft carries transaction {tx_hash}")))?;

    phase(100, MSG_DONE);
    Ok(PublishOutcome {
        status: UploadStatus::Success,
        message: MSG_DONE,
        tx_hash: tx_hash.to_string(),
        ipfs_cid: ipfs_cid.to_string(),
        article_index,
    })
}

/// 对账：处理已提交交易但未完成落库的草稿
///
/// 已出块成功的完成落库；已回滚的清除发布信息；仍未出块的保持不变。
/// 返回本次完成落库的数量。
pub async fn reconcile_pending<S, L>(store: &S, ledger: &L) -> Result<u32>
where
    S: DraftStore,
    L: Ledger,
{
    let mut finalized = 0;

    for draft in store.pending_publications().await? {
        let Some(tx_hash) = draft.tx_hash.clone() else {
            continue;
        };

        match ledger.confirm(&tx_hash).await {
            Ok(true) => {
                store.finalize_publish(draft.id, &tx_hash).await?;
                finalized += 1;
            }
            Ok(false) => {
                tracing::warn!(draft_id = %draft.id, %tx_hash, "transaction reverted, clearing pending publication");
                store.clear_pending_publish(draft.id, &tx_hash).await?;
            }
            Err(e) => {
                tracing::warn!(draft_id = %draft.id, %tx_hash, %e, "confirmation still pending");
            }
        }
    }

    Ok(finalized)
}
