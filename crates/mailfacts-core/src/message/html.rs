//! Naive HTML to text conversion.

use crate::extract::patterns::HTML_TAG;

/// Strip markup tags and decode the handful of entities common in mail.
pub fn strip_html(html: &str) -> String {
    HTML_TAG
        .replace_all(html, "")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strip_tags() {
        let html = "<html><body><p>Amount due: <b>$12.00</b></p></body></html>";
        assert_eq!(strip_html(html), "Amount due: $12.00");
    }

    #[test]
    fn test_entities() {
        assert_eq!(strip_html("Fish&nbsp;&amp;&nbsp;Chips &lt;3"), "Fish & Chips <3");
    }

    #[test]
    fn test_unclosed_tag_is_kept() {
        assert_eq!(strip_html("a < b"), "a < b");
    }
}
