use std::fmt;

use serde::{Deserialize, Serialize};

use crate::content;

/// 单条草稿允许的标签上限
pub const MAX_TAGS: usize = 5;

/// 草稿生命周期状态
///
/// 状态转移：`draft → under_review → {approved, rejected}`，
/// `approved → published` 为终态；`rejected` 可重新提交回到 `under_review`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Draft,
    UnderReview,
    Approved,
    Rejected,
    Published,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::UnderReview => "under_review",
            Status::Approved => "approved",
            Status::Rejected => "rejected",
            Status::Published => "published",
        }
    }

    /// 从存储的状态字符串解析，未知值返回 `None`
    pub fn parse(s: &str) -> Option<Status> {
        match s {
            "draft" => Some(Status::Draft),
            "under_review" => Some(Status::UnderReview),
            "approved" => Some(Status::Approved),
            "rejected" => Some(Status::Rejected),
            "published" => Some(Status::Published),
            _ => None,
        }
    }

    /// 是否允许（重新）提交审核
    pub fn can_submit(&self) -> bool {
        matches!(self, Status::Draft | Status::Rejected | Status::UnderReview)
    }

    /// 是否允许审核动作
    pub fn can_review(&self) -> bool {
        matches!(self, Status::UnderReview)
    }

    /// 是否允许发布
    pub fn can_publish(&self) -> bool {
        matches!(self, Status::Approved)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 审核决定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Approved,
    Rejected,
}

impl ReviewAction {
    pub fn as_status(&self) -> Status {
        match self {
            ReviewAction::Approved => Status::Approved,
            ReviewAction::Rejected => Status::Rejected,
        }
    }
}

/// 字段级校验错误，序列化后作为 400 响应体返回
#[derive(Debug, Default, Serialize, thiserror::Error)]
#[error("validation failed")]
pub struct ValidationErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<&'static str>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.summary.is_none()
            && self.content.is_none()
            && self.tags.is_none()
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// 创建、编辑与提交草稿的请求体
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DraftInput {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub wallet_address: Option<String>,
}

impl DraftInput {
    /// 保存草稿的最小校验：标题必填
    pub fn validate_draft(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.title.trim().is_empty() {
            errors.title = Some("Title is required.");
        }
        errors.into_result()
    }

    /// 提交审核的完整校验
    ///
    /// 标题、摘要非空，正文去除标记后非空，标签至多 [`MAX_TAGS`] 个。
    /// 校验不通过时不触发任何网络或存储调用。
    pub fn validate_submission(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.title.trim().is_empty() {
            errors.title = Some("Title is required.");
        }
        if self.summary.trim().is_empty() {
            errors.summary = Some("Summary is required.");
        }
        if content::is_content_empty(&self.content) {
            errors.content = Some("Content cannot be empty.");
        }
        if self.tags.len() > MAX_TAGS {
            errors.tags = Some("Please limit tags to a maximum of 5.");
        }
        errors.into_result()
    }

    /// 规范化标签：去除空白并转为小写，丢弃空项
    pub fn normalized_tags(&self) -> Vec<String> {
        self.tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> DraftInput {
        DraftInput {
            title: "A".to_string(),
            summary: "B".to_string(),
            tags: vec!["Web3".to_string()],
            content: "<p>C</p>".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_submission_requires_title_and_summary() {
        let mut input = valid_input();
        input.title = "  ".to_string();
        input.summary = String::new();

        let errors = input.validate_submission().unwrap_err();
        assert_eq!(errors.title, Some("Title is required."));
        assert_eq!(errors.summary, Some("Summary is required."));
        assert!(errors.content.is_none());
    }

    #[test]
    fn test_submission_requires_rendered_content() {
        let mut input = valid_input();
        input.content = "<p><br></p>".to_string();

        let errors = input.validate_submission().unwrap_err();
        assert_eq!(errors.content, Some("Content cannot be empty."));
    }

    #[test]
    fn test_submission_limits_tags() {
        let mut input = valid_input();
        input.tags = (0..6).map(|i| format!("t{i}")).collect();

        let errors = input.validate_submission().unwrap_err();
        assert_eq!(errors.tags, Some("Please limit tags to a maximum of 5."));
    }

    #[test]
    fn test_draft_validation_only_checks_title() {
        let input = DraftInput {
            title: "draft".to_string(),
            ..Default::default()
        };
        assert!(input.validate_draft().is_ok());
        assert!(input.validate_submission().is_err());
    }

    #[test]
    fn test_tag_normalization() {
        let mut input = valid_input();
        input.tags = vec![" Web3 ".to_string(), "RUST".to_string(), "  ".to_string()];
        assert_eq!(input.normalized_tags(), vec!["web3", "rust"]);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            Status::Draft,
            Status::UnderReview,
            Status::Approved,
            Status::Rejected,
            Status::Published,
        ] {
            assert_eq!(Status::parse(status.as_str()), Some(status));
        }
        assert_eq!(Status::parse("unknown"), None);
    }

    #[test]
    fn test_transitions() {
        assert!(Status::Draft.can_submit());
        assert!(Status::Rejected.can_submit());
        assert!(!Status::Approved.can_submit());
        assert!(!Status::Published.can_submit());

        assert!(Status::UnderReview.can_review());
        assert!(!Status::Approved.can_review());

        assert!(Status::Approved.can_publish());
        assert!(!Status::UnderReview.can_publish());
    }
}
