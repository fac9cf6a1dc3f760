use axum::http::{HeaderMap, HeaderValue};
use reqwest::header;
use serde::Serialize;
use serde_json::Value;

use super::{AskMode, Moderator, RiskLabel};
use crate::error::Result;

const CHAT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.2";

const CLASSIFY_PROMPT: &str = r#"You are a content risk analysis expert.
Your task is to strictly classify an article into one of the following four labels:
- "Safe"
- "Sensitive"
- "Offensive"
- "Unknown"

Instructions:
- Analyze the article carefully.
- Choose ONLY one label from the above list.
- DO NOT provide explanations, summaries, or any extra text.
- Just return the exact one-word label.

Example Format:
Safe"#;

const REWRITE_PROMPT: &str = r#"You are a professional content rewriting assistant.
Your task:
- Rewrite the given article to make it fully SAFE, avoiding any sensitive, offensive, or controversial content.
- Maintain the original meaning as much as possible but rephrase it into neutral, positive, and professional tone.
- DO NOT explain anything, only output the rewritten article text itself."#;

const ASK_PROMPT: &str = r#"You are a knowledgeable AI assistant.
- Read the article carefully.
- When answering, rely strictly on the article content.
- If the article lacks enough information, attempt to answer meaningfully or politely say it's insufficient.
- DO NOT invent any facts.
- Keep responses professional, concise, and clear."#;

/// Together AI 补全接口客户端
///
/// 固定使用 [`CHAT_MODEL`]，温度 0.2，非流式。
#[derive(Clone)]
pub struct TogetherAiClient {
    client: reqwest::Client,
    api_url: String,
}

impl Default for TogetherAiClient {
    /// 从环境变量 TOGETHER_API_URL / TOGETHER_API_KEY 创建默认客户端
    ///
    /// - Panics
    ///
    /// 任一环境变量未设置时 panic
    fn default() -> Self {
        Self::new(
            std::env::var("TOGETHER_API_URL").expect("TOGETHER_API_URL not set"),
            std::env::var("TOGETHER_API_KEY").expect("TOGETHER_API_KEY not set"),
        )
    }
}

impl TogetherAiClient {
    pub fn new(api_url: impl Into<String>, api_key: impl AsRef<str>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .default_headers({
                let mut headers = HeaderMap::new();
                headers.insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                headers.insert(
                    header::AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {}", api_key.as_ref()))
                        .expect("Failed to create Authorization header"),
                );
                headers
            })
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            api_url: api_url.into(),
        }
    }

    async fn chat(&self, system: &'static str, user: String) -> Result<Option<String>> {
        let resp = self
            .client
            .post(&self.api_url)
            .json(&ChatRequest {
                model: CHAT_MODEL,
                messages: vec![
                    ChatMessage {
                        role: "system",
                        content: system.to_string(),
                    },
                    ChatMessage {
                        role: "user",
                        content: user,
                    },
                ],
                temperature: 0.2,
                stream: false,
            })
            .send()
            .await?
            .error_for_status()?;

        let body: Value = resp.json().await?;
        Ok(extract_content(&body))
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: &'static str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

/// 从补全响应中取出首个消息文本
fn extract_content(body: &Value) -> Option<String> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl Moderator for TogetherAiClient {
    async fn classify(&self, article: &str) -> Result<RiskLabel> {
        let answer = self
            .chat(CLASSIFY_PROMPT, format!("Article:\n\n{article}"))
            .await?;

        Ok(answer
            .map(|s| RiskLabel::parse(&s))
            .unwrap_or(RiskLabel::Unknown))
    }

    async fn complete(&self, article: &str, question: &str, mode: AskMode) -> Result<String> {
        let system = match mode {
            AskMode::Rewrite => REWRITE_PROMPT,
            AskMode::Ask => ASK_PROMPT,
        };

        let answer = self
            .chat(system, format!("Article:\n\n{article}\n\nQuestion:\n{question}"))
            .await?;

        Ok(answer.unwrap_or_default())
    }
}
