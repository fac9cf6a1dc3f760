mod together;

pub use together::TogetherAiClient;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// 内容风险标签
///
/// 上游分类结果被严格收敛到四个固定标签，无法识别的输出一律归为
/// [`RiskLabel::Unknown`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    Safe,
    Sensitive,
    Offensive,
    Unknown,
}

impl RiskLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::Safe => "Safe",
            RiskLabel::Sensitive => "Sensitive",
            RiskLabel::Offensive => "Offensive",
            RiskLabel::Unknown => "Unknown",
        }
    }

    /// 宽松解析上游返回的标签文本
    pub fn parse(s: &str) -> RiskLabel {
        match s.trim() {
            "Safe" => RiskLabel::Safe,
            "Sensitive" => RiskLabel::Sensitive,
            "Offensive" => RiskLabel::Offensive,
            _ => RiskLabel::Unknown,
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 问答接口的工作模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AskMode {
    #[default]
    Ask,
    Rewrite,
}

/// 内容审核的能力接口
///
/// 对上游补全 API 的每次调用都是单次请求，不做重试。
pub trait Moderator: Send + Sync {
    /// 将纯文本文章分类为四个固定风险标签之一
    ///
    /// 上游响应结构异常时返回 [`RiskLabel::Unknown`]，仅在传输失败时返回错误。
    fn classify(
        &self,
        article: &str,
    ) -> impl std::future::Future<Output = Result<RiskLabel>> + Send;

    /// 基于文章内容回答问题，或生成中性语气的安全改写
    ///
    /// 上游未返回有效文本时得到空字符串。
    fn complete(
        &self,
        article: &str,
        question: &str,
        mode: AskMode,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parse_is_exact() {
        assert_eq!(RiskLabel::parse("Safe"), RiskLabel::Safe);
        assert_eq!(RiskLabel::parse(" Offensive \n"), RiskLabel::Offensive);
        assert_eq!(RiskLabel::parse("safe"), RiskLabel::Unknown);
        assert_eq!(RiskLabel::parse("Totally fine"), RiskLabel::Unknown);
        assert_eq!(RiskLabel::parse(""), RiskLabel::Unknown);
    }

    #[test]
    fn test_label_serializes_verbatim() {
        assert_eq!(
            serde_json::to_string(&RiskLabel::Sensitive).unwrap(),
            "\"Sensitive\""
        );
    }
}
