use uuid::Uuid;

use super::{DBPool, Draft};
use crate::error;
use crate::workflow::DraftInput;

/// 草稿的写入接口
///
/// 所有状态转移都是单条条件更新：转移条件直接写入 `WHERE` 谓词，
/// 零行命中即为转移失败，调用方不依赖先读后写。
pub trait DraftStore: Send + Sync {
    /// 按 id 读取草稿
    fn get(
        &self,
        id: Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Draft>, error::Error>>;

    /// 插入新草稿，初始状态为 `draft`
    fn insert(
        &self,
        input: &DraftInput,
    ) -> impl std::future::Future<Output = Result<Draft, error::Error>>;

    /// 更新草稿内容字段，已发布的记录不可更新
    fn update(
        &self,
        id: Uuid,
        input: &DraftInput,
    ) -> impl std::future::Future<Output = Result<Option<Draft>, error::Error>>;

    /// 提交审核
    ///
    /// `draft`/`rejected`/`under_review` 转移到 `under_review`，
    /// 刷新内容字段与提交时间，并清空上一轮审核记录。
    fn submit(
        &self,
        id: Uuid,
        input: &DraftInput,
    ) -> impl std::future::Future<Output = Result<Option<Draft>, error::Error>>;

    /// 审核动作
    ///
    /// 仅当记录仍处于 `under_review`、审核者不是作者、且本轮未投过票时生效，
    /// 同时追加审核者记录。零行命中返回 `None`。
    fn record_review(
        &self,
        id: Uuid,
        reviewer: &str,
        status: &str,
    ) -> impl std::future::Future<Output = Result<Option<Draft>, error::Error>>;

    /// 写入最近一次风险分析标签
    fn set_risk_level(
        &self,
        id: Uuid,
        label: &str,
    ) -> impl std::future::Future<Output = Result<(), error::Error>>;

    /// 记录已提交、尚未确认的发布交易
    ///
    /// 仅对 `approved` 且未携带交易哈希的记录生效。
    fn mark_pending_publish(
        &self,
        id: Uuid,
        tx_hash: &str,
        ipfs_cid: &str,
        article_index: i64,
    ) -> impl std::future::Future<Output = Result<Option<Draft>, error::Error>>;

    /// 完成发布落库，按交易哈希幂等
    fn finalize_publish(
        &self,
        id: Uuid,
        tx_hash: &str,
    ) -> impl std::future::Future<Output = Result<Option<Draft>, error::Error>>;

    /// 清除已回滚交易的发布信息，记录回到可重试的 `approved`
    fn clear_pending_publish(
        &self,
        id: Uuid,
        tx_hash: &str,
    ) -> impl std::future::Future<Output = Result<(), error::Error>>;

    /// 待对账列表：已有交易哈希但尚未完成落库的记录
    fn pending_publications(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Draft>, error::Error>>;
}

impl DraftStore for DBPool {
    async fn get(&self, id: Uuid) -> Result<Option<Draft>, error::Error> {
        let draft = sqlx::query_as::<_, Draft>("SELECT * FROM drafts WHERE id = $1 LIMIT 1")
            .bind(id)
            .fetch_optional(self)
            .await?;
        Ok(draft)
    }

    async fn insert(&self, input: &DraftInput) -> Result<Draft, error::Error> {
        let draft = sqlx::query_as::<_, Draft>(
            r#"
            INSERT INTO drafts (title, summary, tags, content, author, wallet_address)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(input.title.trim())
        .bind(input.summary.trim())
        .bind(&input.tags)
        .bind(&input.content)
        .bind(&input.author)
        .bind(&input.wallet_address)
        .fetch_one(self)
        .await?;
        Ok(draft)
    }

    async fn update(&self, id: Uuid, input: &DraftInput) -> Result<Option<Draft>, error::Error> {
        let draft = sqlx::query_as::<_, Draft>(
            r#"
            UPDATE drafts
            SET title = $2, summary = $3, tags = $4, content = $5, author = $6
            WHERE id = $1
            AND is_published = FALSE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.title.trim())
        .bind(input.summary.trim())
        .bind(&input.tags)
        .bind(&input.content)
        .bind(&input.author)
        .fetch_optional(self)
        .await?;
        Ok(draft)
    }

    async fn submit(&self, id: Uuid, input: &DraftInput) -> Result<Option<Draft>, error::Error> {
        let draft = sqlx::query_as::<_, Draft>(
            r#"
            UPDATE drafts
            SET title = $2,
                summary = $3,
                tags = $4,
                content = $5,
                author = $6,
                wallet_address = $7,
                status = 'under_review',
                submitted_at = now(),
                reviewed_by = '{}'
            WHERE id = $1
            AND status IN ('draft', 'rejected', 'under_review')
            AND is_published = FALSE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.title.trim())
        .bind(input.summary.trim())
        .bind(input.normalized_tags())
        .bind(&input.content)
        .bind(&input.author)
        .bind(&input.wallet_address)
        .fetch_optional(self)
        .await?;
        Ok(draft)
    }

    async fn record_review(
        &self,
        id: Uuid,
        reviewer: &str,
        status: &str,
    ) -> Result<Option<Draft>, error::Error> {
        let draft = sqlx::query_as::<_, Draft>(
            r#"
            UPDATE drafts
            SET status = $2, reviewed_by = array_append(reviewed_by, $3)
            WHERE id = $1
            AND status = 'under_review'
            AND wallet_address IS DISTINCT FROM $3
            AND NOT ($3 = ANY(reviewed_by))
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(reviewer)
        .fetch_optional(self)
        .await?;
        Ok(draft)
    }

    async fn set_risk_level(&self, id: Uuid, label: &str) -> Result<(), error::Error> {
        sqlx::query("UPDATE drafts SET risk_level = $2 WHERE id = $1")
            .bind(id)
            .bind(label)
            .execute(self)
            .await?;
        Ok(())
    }

    async fn mark_pending_publish(
        &self,
        id: Uuid,
        tx_hash: &str,
        ipfs_cid: &str,
        article_index: i64,
    ) -> Result<Option<Draft>, error::Error> {
        let draft = sqlx::query_as::<_, Draft>(
            r#"
            UPDATE drafts
            SET tx_hash = $2, ipfs_cid = $3, article_index = $4
            WHERE id = $1
            AND status = 'approved'
            AND is_published = FALSE
            AND tx_hash IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tx_hash)
        .bind(ipfs_cid)
        .bind(article_index)
        .fetch_optional(self)
        .await?;
        Ok(draft)
    }

    async fn finalize_publish(
        &self,
        id: Uuid,
        tx_hash: &str,
    ) -> Result<Option<Draft>, error::Error> {
        let draft = sqlx::query_as::<_, Draft>(
            r#"
            UPDATE drafts
            SET is_published = TRUE,
                status = 'published',
                published_at = COALESCE(published_at, now())
            WHERE id = $1
            AND tx_hash = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tx_hash)
        .fetch_optional(self)
        .await?;
        Ok(draft)
    }

    async fn clear_pending_publish(&self, id: Uuid, tx_hash: &str) -> Result<(), error::Error> {
        sqlx::query(
            r#"
            UPDATE drafts
            SET tx_hash = NULL, ipfs_cid = NULL, article_index = NULL
            WHERE id = $1
            AND tx_hash = $2
            AND is_published = FALSE
            "#,
        )
        .bind(id)
        .bind(tx_hash)
        .execute(self)
        .await?;
        Ok(())
    }

    async fn pending_publications(&self) -> Result<Vec<Draft>, error::Error> {
        let drafts = sqlx::query_as::<_, Draft>(
            r#"
            SELECT *
            FROM drafts
            WHERE tx_hash IS NOT NULL
            AND is_published = FALSE
            "#,
        )
        .fetch_all(self)
        .await?;
        Ok(drafts)
    }
}
