use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::Request,
    http::{Response, StatusCode},
};
use serde_json::{Value, json};
use tower::util::ServiceExt;
use uuid::Uuid;

use knowledgehub::{
    api,
    error::Result,
    ledger::{Ledger, LedgerArticle},
    moderation::{AskMode, Moderator, RiskLabel},
    publish::ContentStore,
    state::AppState,
    storage::{DBPool, init_db_from_env, migrate},
};

/// 内存账本替身：提交即出块
#[derive(Clone, Default)]
struct FakeLedger {
    articles: Arc<Mutex<Vec<(String, String)>>>,
}

impl Ledger for FakeLedger {
    async fn article_count(&self) -> Result<u64> {
        Ok(self.articles.lock().unwrap().len() as u64)
    }

    async fn submit_article(&self, title: &str, ipfs_hash: &str) -> Result<String> {
        let mut articles = self.articles.lock().unwrap();
        articles.push((title.to_string(), ipfs_hash.to_string()));
        Ok(format!("0x{:064x}", articles.len()))
    }

    async fn confirm(&self, _tx_hash: &str) -> Result<bool> {
        Ok(true)
    }

    async fn article_at(&self, index: u64) -> Result<Option<LedgerArticle>> {
        Ok(self.articles.lock().unwrap().get(index as usize).map(
            |(title, ipfs_hash)| LedgerArticle {
                author: "0x0000000000000000000000000000000000000000".to_string(),
                ipfs_hash: ipfs_hash.clone(),
                title: title.clone(),
                timestamp: 1,
            },
        ))
    }
}

#[derive(Clone)]
struct FakeContentStore;

impl ContentStore for FakeContentStore {
    async fn upload(&self, content: &str) -> Result<String> {
        Ok(format!("bafy{:08x}", content.len()))
    }
}

#[derive(Clone)]
struct FakeModerator;

impl Moderator for FakeModerator {
    async fn classify(&self, _article: &str) -> Result<RiskLabel> {
        Ok(RiskLabel::Safe)
    }

    async fn complete(&self, _article: &str, _question: &str, mode: AskMode) -> Result<String> {
        Ok(match mode {
            AskMode::Rewrite => "a calmer version".to_string(),
            AskMode::Ask => "an answer".to_string(),
        })
    }
}

struct TestApp {
    router: Router,
}

impl TestApp {
    async fn new() -> Self {
        let db = init_db_from_env().await;

        migrate(&db, "sql/01-CREATE_TABLE.sql")
            .await
            .expect("初始化sql失败");

        Self::with_pool(db)
    }

    /// 不连接数据库的应用，只用于覆盖入库前就返回的路径
    fn detached() -> Self {
        let db = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/knowledgehub_detached")
            .expect("创建惰性连接池失败");

        Self::with_pool(db)
    }

    fn with_pool(db: DBPool) -> Self {
        let app = AppState::new(db, FakeLedger::default(), FakeContentStore, FakeModerator);
        let router = api::setup_route(app);

        Self { router }
    }

    pub async fn request(&self, req: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(req)
            .await
            .expect("oneshot fail")
    }
}

impl TestApp {
    async fn post_json(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::post(path)
            .header("Content-Type", "application/json")
            .body(Body::new(body.to_string()))
            .expect("请求失败");
        let resp = self.request(req).await;
        let status = resp.status();
        let data = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("读取数据失败");
        let json = serde_json::from_slice(&data).unwrap_or(Value::Null);
        (status, json)
    }

    async fn get_json(&self, path: &str, code: StatusCode, msg: &str) -> Value {
        let req = Request::get(path).body(Body::empty()).expect("请求失败");
        let resp = self.request(req).await;
        assert_eq!(resp.status(), code, "{}", msg);
        let data = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("读取数据失败");
        serde_json::from_slice(&data).unwrap_or(Value::Null)
    }
}

#[tokio::test]
async fn test_risk_analysis_requires_article() {
    let app = TestApp::detached();

    let (status, body) = app.post_json("/api/risk-analysis", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["riskLevel"], "Unknown");

    let (status, body) = app
        .post_json("/api/risk-analysis", json!({"article": ""}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "空正文应和缺失一样处理");
    assert_eq!(body["riskLevel"], "Unknown");
}

#[tokio::test]
async fn test_risk_analysis_returns_fixed_label() {
    let app = TestApp::detached();

    let (status, body) = app
        .post_json("/api/risk-analysis", json!({"article": "<p>hello</p>"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["riskLevel"], "Safe");
}

#[tokio::test]
async fn test_ask_article_requires_input() {
    let app = TestApp::detached();

    let (status, body) = app
        .post_json("/api/ask-article", json!({"question": "why?"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["answer"], "Invalid input.");

    let (status, _) = app
        .post_json("/api/ask-article", json!({"article": "<p>x</p>"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "缺失问题也应拒绝");
}

#[tokio::test]
async fn test_ask_article_modes() {
    let app = TestApp::detached();

    let (status, body) = app
        .post_json(
            "/api/ask-article",
            json!({"article": "<p>x</p>", "question": "make it safe", "mode": "rewrite"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "a calmer version");
}

#[tokio::test]
async fn test_submission_validation_rejects_before_storage() {
    let app = TestApp::detached();
    let id = Uuid::new_v4();

    // 摘要缺失
    let (status, body) = app
        .post_json(
            &format!("/api/drafts/{id}/submit"),
            json!({"title": "A", "summary": "", "content": "<p>C</p>"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["summary"], "Summary is required.");

    // 标签超限
    let (status, body) = app
        .post_json(
            &format!("/api/drafts/{id}/submit"),
            json!({
                "title": "A",
                "summary": "B",
                "content": "<p>C</p>",
                "tags": ["1", "2", "3", "4", "5", "6"]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["tags"], "Please limit tags to a maximum of 5.");

    // 正文去除标记后为空
    let (status, body) = app
        .post_json(
            &format!("/api/drafts/{id}/submit"),
            json!({"title": "A", "summary": "B", "content": "<p><br></p>"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["content"], "Content cannot be empty.");
}

#[tokio::test]
async fn test_create_draft_requires_title() {
    let app = TestApp::detached();

    let (status, body) = app
        .post_json("/api/drafts", json!({"summary": "B"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["title"], "Title is required.");
}

#[tokio::test]
#[ignore = "API测试 依赖真实数据库"]
async fn test_publish_workflow() {
    let app = TestApp::new().await;

    let owner = format!("0xowner{}", Uuid::new_v4().simple());
    let reviewer = format!("0xreviewer{}", Uuid::new_v4().simple());

    // 保存草稿
    let (status, draft) = app
        .post_json(
            "/api/drafts",
            json!({
                "title": "A",
                "summary": "B",
                "content": "<p>C</p>",
                "tags": ["Web3"],
                "author": "tester",
                "wallet_address": owner
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "保存草稿");
    assert_eq!(draft["status"], "draft");
    let id = draft["id"].as_str().expect("缺少 id").to_string();

    // 提交审核
    let (status, submitted) = app
        .post_json(
            &format!("/api/drafts/{id}/submit"),
            json!({
                "title": "A",
                "summary": "B",
                "content": "<p>C</p>",
                "tags": ["Web3"],
                "author": "tester",
                "wallet_address": owner
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "提交审核");
    assert_eq!(submitted["status"], "under_review");
    assert_eq!(submitted["tags"][0], "web3", "提交时标签应转为小写");

    // 作者不能审核自己的草稿
    let (status, _) = app
        .post_json(
            &format!("/api/drafts/{id}/review"),
            json!({"reviewer": owner, "action": "approved"}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "禁止自审");

    // 第二个钱包批准
    let (status, approved) = app
        .post_json(
            &format!("/api/drafts/{id}/review"),
            json!({"reviewer": reviewer, "action": "approved"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "审核通过");
    assert_eq!(approved["status"], "approved");

    // 同一审核者不能重复投票
    let (status, _) = app
        .post_json(
            &format!("/api/drafts/{id}/review"),
            json!({"reviewer": reviewer, "action": "rejected"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "禁止重复审核");

    // 非作者不能发布
    let (status, _) = app
        .post_json(
            &format!("/api/drafts/{id}/publish"),
            json!({"wallet_address": reviewer}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "仅作者可以发布");

    // 作者发布
    let (status, outcome) = app
        .post_json(
            &format!("/api/drafts/{id}/publish"),
            json!({"wallet_address": owner}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "发布");
    assert_eq!(outcome["status"], "success");
    assert!(outcome["tx_hash"].as_str().is_some_and(|s| !s.is_empty()));
    assert!(outcome["ipfs_cid"].as_str().is_some_and(|s| !s.is_empty()));
    let article_index = outcome["article_index"].as_i64().expect("缺少文章索引");

    // 落库状态
    let record = app
        .get_json(&format!("/api/drafts/{id}"), StatusCode::OK, "读取发布后的记录")
        .await;
    assert_eq!(record["status"], "published");
    assert_eq!(record["is_published"], true);
    assert_eq!(record["article_index"].as_i64(), Some(article_index));

    // 公开阅读视图
    let article = app
        .get_json(&format!("/api/articles/{id}"), StatusCode::OK, "公开文章")
        .await;
    assert_eq!(article["title"], "A");
    assert!(
        article["gateway_url"]
            .as_str()
            .is_some_and(|s| s.starts_with("https://w3s.link/ipfs/"))
    );

    // 链上交叉校验
    let provenance = app
        .get_json(
            &format!("/api/articles/{id}/provenance"),
            StatusCode::OK,
            "链上校验",
        )
        .await;
    assert_eq!(provenance["matches"], true);

    // 重复发布被拒绝
    let (status, _) = app
        .post_json(
            &format!("/api/drafts/{id}/publish"),
            json!({"wallet_address": owner}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "已发布的记录不可重复发布");

    // 工作台筛选
    let mine = app
        .get_json(
            &format!("/api/drafts?wallet_address={owner}&filter=published"),
            StatusCode::OK,
            "已发布筛选",
        )
        .await;
    assert_eq!(mine.as_array().map(Vec::len), Some(1));

    // 对账通路：已完成落库的记录不再出现在待对账列表里
    let (status, body) = app.post_json("/api/reconcile", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["finalized"].as_u64().is_some(), "对账应返回完成数量");
}

#[tokio::test]
#[ignore = "API测试 依赖真实数据库"]
async fn test_rejected_draft_can_be_resubmitted() {
    let app = TestApp::new().await;

    let owner = format!("0xowner{}", Uuid::new_v4().simple());
    let reviewer = format!("0xreviewer{}", Uuid::new_v4().simple());

    let payload = json!({
        "title": "A",
        "summary": "B",
        "content": "<p>C</p>",
        "wallet_address": owner
    });

    let (_, draft) = app.post_json("/api/drafts", payload.clone()).await;
    let id = draft["id"].as_str().expect("缺少 id").to_string();

    let (status, _) = app
        .post_json(&format!("/api/drafts/{id}/submit"), payload.clone())
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, rejected) = app
        .post_json(
            &format!("/api/drafts/{id}/review"),
            json!({"reviewer": reviewer, "action": "rejected"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "驳回");
    assert_eq!(rejected["status"], "rejected");

    // 重新提交开启新一轮审核，上一轮的审核记录被清空
    let (status, resubmitted) = app
        .post_json(&format!("/api/drafts/{id}/submit"), payload)
        .await;
    assert_eq!(status, StatusCode::OK, "重新提交");
    assert_eq!(resubmitted["status"], "under_review");
    assert_eq!(resubmitted["reviewed_by"].as_array().map(Vec::len), Some(0));

    // 上一轮驳回过的审核者可以再次投票
    let (status, approved) = app
        .post_json(
            &format!("/api/drafts/{id}/review"),
            json!({"reviewer": reviewer, "action": "approved"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "新一轮审核");
    assert_eq!(approved["status"], "approved");
}
