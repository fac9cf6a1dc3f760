use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    content::strip_html,
    ledger::Ledger,
    moderation::{AskMode, Moderator, RiskLabel},
    publish::ContentStore,
    state::AppState,
    storage::DraftStore,
};

/// 配置内容审核代理路由。
///
/// 路由包括：
/// - `POST /risk-analysis`：内容风险分析
/// - `POST /ask-article`：文章问答与安全改写
pub fn setup_route<L, C, M>() -> Router<AppState<L, C, M>>
where
    L: Ledger + Clone + Send + Sync + 'static,
    C: ContentStore + Clone + Send + Sync + 'static,
    M: Moderator + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/risk-analysis", post(risk_analysis::<L, C, M>))
        .route("/ask-article", post(ask_article::<L, C, M>))
}

#[derive(Debug, Deserialize)]
struct RiskRequest {
    #[serde(default)]
    article: String,

    /// 可选：同时把分析结果写回对应草稿
    #[serde(default)]
    id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
struct RiskResponse {
    #[serde(rename = "riskLevel")]
    risk_level: RiskLabel,
}

/// 内容风险分析代理
///
/// 正文缺失返回 400；上游失败返回 500；响应体始终包含 riskLevel 字段。
/// 正文在转发前去除标记。
async fn risk_analysis<L, C, M>(
    State(app): State<AppState<L, C, M>>,
    Json(req): Json<RiskRequest>,
) -> (StatusCode, Json<RiskResponse>)
where
    L: Ledger + Clone + Send + Sync + 'static,
    C: ContentStore + Clone + Send + Sync + 'static,
    M: Moderator + Clone + Send + Sync + 'static,
{
    if req.article.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(RiskResponse {
                risk_level: RiskLabel::Unknown,
            }),
        );
    }

    let plain = strip_html(&req.article);

    match app.moderator().classify(&plain).await {
        Ok(label) => {
            if let Some(id) = req.id {
                if let Err(e) = app.store().set_risk_level(id, label.as_str()).await {
                    tracing::error!(%e, "failed to record risk label");
                }
            }
            (StatusCode::OK, Json(RiskResponse { risk_level: label }))
        }
        Err(e) => {
            tracing::error!(%e, "risk analysis failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RiskResponse {
                    risk_level: RiskLabel::Unknown,
                }),
            )
        }
    }
}

const INVALID_INPUT: &str = "Invalid input.";
const EMPTY_ANSWER: &str = "Sorry, no valid response received from AI.";
const UPSTREAM_FAILED: &str = "Something went wrong. Please try again later.";

#[derive(Debug, Deserialize)]
struct AskRequest {
    #[serde(default)]
    article: String,

    #[serde(default)]
    question: String,

    #[serde(default)]
    mode: AskMode,
}

#[derive(Debug, Serialize)]
struct AskResponse {
    answer: String,
}

/// 文章问答与安全改写代理
///
/// 正文或问题缺失返回 400；上游失败返回 500；
/// 上游返回空文本时用固定提示语占位。
async fn ask_article<L, C, M>(
    State(app): State<AppState<L, C, M>>,
    Json(req): Json<AskRequest>,
) -> (StatusCode, Json<AskResponse>)
where
    L: Ledger + Clone + Send + Sync + 'static,
    C: ContentStore + Clone + Send + Sync + 'static,
    M: Moderator + Clone + Send + Sync + 'static,
{
    if req.article.is_empty() || req.question.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(AskResponse {
                answer: INVALID_INPUT.to_string(),
            }),
        );
    }

    let plain = strip_html(&req.article);

    match app.moderator().complete(&plain, &req.question, req.mode).await {
        Ok(answer) if answer.is_empty() => (
            StatusCode::OK,
            Json(AskResponse {
                answer: EMPTY_ANSWER.to_string(),
            }),
        ),
        Ok(answer) => (StatusCode::OK, Json(AskResponse { answer })),
        Err(e) => {
            tracing::error!(%e, "ask-article failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AskResponse {
                    answer: UPSTREAM_FAILED.to_string(),
                }),
            )
        }
    }
}
