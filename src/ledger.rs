mod evm;

pub use evm::{EvmLedger, LedgerConfig};

use crate::error::Result;

/// 链上登记的文章条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerArticle {
    pub author: String,
    pub ipfs_hash: String,
    pub title: String,
    pub timestamp: u64,
}

/// 文章登记合约的能力接口
///
/// 提交与确认拆分为两步，确认可以凭持久化的交易哈希在任意时刻恢复。
pub trait Ledger: Send + Sync {
    /// 读取合约中已登记的文章总数
    fn article_count(&self) -> impl std::future::Future<Output = Result<u64>> + Send;

    /// 提交发布交易，返回交易哈希，不等待确认
    fn submit_article(
        &self,
        title: &str,
        ipfs_hash: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    /// 轮询交易回执直到出块，返回交易是否执行成功
    fn confirm(&self, tx_hash: &str) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// 按索引读取链上文章，越界返回 `None`
    fn article_at(
        &self,
        index: u64,
    ) -> impl std::future::Future<Output = Result<Option<LedgerArticle>>> + Send;
}
