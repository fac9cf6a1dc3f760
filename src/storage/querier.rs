use uuid::Uuid;

use super::{DBPool, Draft, DraftSummary};

const SUMMARY_COLUMNS: &str = "id, title, summary, tags, author, wallet_address, status, \
     is_published, ipfs_cid, created_at, submitted_at, published_at";

/// 草稿与已发布文章的查询接口
///
/// 提供工作台、审核队列与公开阅读视图所需的全部读取操作。
pub trait Querier: Send + Sync {
    type Error;

    /// 按 id 查询单条草稿（任意状态）
    ///
    /// 返回 [`Draft`]，不存在时返回 `None`。
    fn get_draft(
        &self,
        id: Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Draft>, Self::Error>>;

    /// 查询某钱包地址名下的全部草稿，按创建时间倒序
    fn drafts_by_wallet(
        &self,
        wallet: &str,
    ) -> impl std::future::Future<Output = Result<Vec<DraftSummary>, Self::Error>>;

    /// 审核队列：`under_review` 与 `approved` 的草稿，按提交时间倒序
    fn review_queue(&self)
    -> impl std::future::Future<Output = Result<Vec<Draft>, Self::Error>>;

    /// 分页查询已发布文章，可按标签过滤，按发布时间倒序
    fn published_list(
        &self,
        page: i32,
        size: i32,
        tags: Vec<&str>,
    ) -> impl std::future::Future<Output = Result<Vec<DraftSummary>, Self::Error>>;

    /// 按 id 查询单篇已发布文章
    fn published_one(
        &self,
        id: Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Draft>, Self::Error>>;

    /// 所有已发布文章的标签集合
    fn tags(&self) -> impl std::future::Future<Output = Result<Vec<String>, Self::Error>>;
}

impl Querier for DBPool {
    type Error = sqlx::Error;

    async fn get_draft(&self, id: Uuid) -> Result<Option<Draft>, Self::Error> {
        sqlx::query_as::<_, Draft>(
            r#"
            SELECT *
            FROM drafts
            WHERE id = $1
            LIMIT 1
            "#,
        )
        .bind(id)
        .fetch_optional(self)
        .await
    }

    async fn drafts_by_wallet(&self, wallet: &str) -> Result<Vec<DraftSummary>, Self::Error> {
        sqlx::query_as::<_, DraftSummary>(&format!(
            r#"
            SELECT {SUMMARY_COLUMNS}
            FROM drafts
            WHERE wallet_address = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(wallet)
        .fetch_all(self)
        .await
    }

    async fn review_queue(&self) -> Result<Vec<Draft>, Self::Error> {
        sqlx::query_as::<_, Draft>(
            r#"
            SELECT *
            FROM drafts
            WHERE status IN ('under_review', 'approved')
            ORDER BY submitted_at DESC NULLS LAST
            "#,
        )
        .fetch_all(self)
        .await
    }

    async fn published_list(
        &self,
        page: i32,
        size: i32,
        tags: Vec<&str>,
    ) -> Result<Vec<DraftSummary>, Self::Error> {
        let offset = (page.max(1) - 1) * size;
        let mut builder = sqlx::QueryBuilder::new(format!(
            r#"
            SELECT {SUMMARY_COLUMNS}
            FROM drafts
            "#
        ));

        builder.push("WHERE is_published = TRUE");
        if !tags.is_empty() {
            builder.push(" AND tags && ").push_bind(tags);
        }

        builder.push(" ORDER BY published_at DESC ");
        builder.push(" LIMIT ").push_bind(size);
        builder.push(" OFFSET ").push_bind(offset);

        let query = builder.build_query_as::<DraftSummary>();
        query.fetch_all(self).await
    }

    async fn published_one(&self, id: Uuid) -> Result<Option<Draft>, Self::Error> {
        sqlx::query_as::<_, Draft>(
            r#"
            SELECT *
            FROM drafts
            WHERE id = $1
            AND is_published = TRUE
            LIMIT 1
            "#,
        )
        .bind(id)
        .fetch_optional(self)
        .await
    }

    async fn tags(&self) -> Result<Vec<String>, Self::Error> {
        sqlx::query_scalar(
            r#"
            SELECT DISTINCT UNNEST(tags) AS "tag"
            FROM drafts
            WHERE is_published = TRUE
            ORDER BY tag
            "#,
        )
        .fetch_all(self)
        .await
    }
}
