use chrono::{DateTime, Local};
use serde::Serialize;
use uuid::Uuid;

/// 草稿完整记录
///
/// 覆盖从编辑到发布的全部生命周期字段。
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Draft {
    /// 记录唯一标识，由存储生成
    pub id: Uuid,
    /// 标题
    pub title: String,
    /// 摘要
    pub summary: String,
    /// 标签列表
    pub tags: Vec<String>,
    /// 富文本正文
    pub content: String,
    /// 作者展示名
    pub author: Option<String>,
    /// 所属钱包地址
    pub wallet_address: Option<String>,
    /// 生命周期状态，参见 [`crate::workflow::Status`]
    pub status: String,
    pub is_published: bool,
    /// 当前审核周期内已投票的审核者
    pub reviewed_by: Vec<String>,
    /// 最近一次风险分析标签
    pub risk_level: Option<String>,
    /// 内容寻址存储标识
    pub ipfs_cid: Option<String>,
    /// 账本合约中的文章索引
    pub article_index: Option<i64>,
    /// 发布交易哈希，确认前即落库
    pub tx_hash: Option<String>,
    pub created_at: DateTime<Local>,
    pub submitted_at: Option<DateTime<Local>>,
    pub published_at: Option<DateTime<Local>>,
}

/// 草稿摘要，用于列表展示，不含正文
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DraftSummary {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub wallet_address: Option<String>,
    pub status: String,
    pub is_published: bool,
    pub ipfs_cid: Option<String>,
    pub created_at: DateTime<Local>,
    pub submitted_at: Option<DateTime<Local>>,
    pub published_at: Option<DateTime<Local>>,
}
