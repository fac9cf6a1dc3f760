use axum::extract::FromRef;

use crate::{ledger::Ledger, moderation::Moderator, publish::ContentStore, storage::DBPool};

/// 应用程序上下文
///
/// [`AppState`] 封装数据库连接池与三个外部能力客户端：
/// 账本合约、内容寻址存储、内容审核。能力以泛型注入，测试时可替换为替身。
#[derive(Clone)]
pub struct AppState<L, C, M> {
    pool: DBPool,
    ledger: L,
    content_store: C,
    moderator: M,
}

impl<L, C, M> AppState<L, C, M>
where
    L: Ledger,
    C: ContentStore,
    M: Moderator,
{
    /// 创建一个新的 [`AppState`] 实例
    pub fn new(pool: DBPool, ledger: L, content_store: C, moderator: M) -> Self {
        Self {
            pool,
            ledger,
            content_store,
            moderator,
        }
    }

    /// 获取查询对象
    pub fn querier(&self) -> &DBPool {
        &self.pool
    }

    /// 获取仓储对象
    pub fn store(&self) -> &DBPool {
        &self.pool
    }

    /// 获取账本客户端
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// 获取内容存储客户端
    pub fn content_store(&self) -> &C {
        &self.content_store
    }

    /// 获取内容审核客户端
    pub fn moderator(&self) -> &M {
        &self.moderator
    }
}

impl<L: Clone, C: Clone, M: Clone> FromRef<AppState<L, C, M>> for DBPool {
    fn from_ref(state: &AppState<L, C, M>) -> Self {
        state.pool.clone()
    }
}
