use std::sync::LazyLock;

use regex::Regex;

static BREAK_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static PARAGRAPH_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</p>").unwrap());
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>?").unwrap());
static ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&[^;]+;").unwrap());

/// 将富文本标记转换为纯文本
///
/// - `<br>` 与 `</p>` 转换为换行
/// - 其余标签直接移除
/// - 常见 HTML 实体还原为对应字符，未知实体移除
pub fn strip_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let text = BREAK_TAG.replace_all(html, "\n");
    let text = PARAGRAPH_END.replace_all(&text, "\n");
    let text = ANY_TAG.replace_all(&text, "");

    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&mdash;", "—")
        .replace("&ndash;", "–")
        .replace("&rsquo;", "’")
        .replace("&lsquo;", "‘")
        .replace("&ldquo;", "“")
        .replace("&rdquo;", "”");

    ENTITY.replace_all(&text, "").into_owned()
}

/// 正文在去除标记后是否为空
pub fn is_content_empty(html: &str) -> bool {
    strip_html(html).trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_html("<p>hello <b>world</b></p>"), "hello world\n");
        assert_eq!(strip_html("a<br>b<br />c"), "a\nb\nc");
    }

    #[test]
    fn test_entities() {
        assert_eq!(strip_html("a &amp; b &lt;c&gt;"), "a & b <c>");
        assert_eq!(strip_html("x&nbsp;y"), "x y");
        assert_eq!(strip_html("&copy;2024"), "2024");
    }

    #[test]
    fn test_unterminated_tag() {
        assert_eq!(strip_html("text<img src=\"x\""), "text");
    }

    #[test]
    fn test_empty_content() {
        assert!(is_content_empty(""));
        assert!(is_content_empty("<p> </p>"));
        assert!(is_content_empty("<p><br></p>"));
        assert!(!is_content_empty("<p>C</p>"));
    }
}
