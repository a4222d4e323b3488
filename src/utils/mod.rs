/// Cache directive for successful search results.
pub const SEARCH_CACHE_CONTROL: &str = "public, s-maxage=300, stale-while-revalidate=600";

/// Cache directive for business detail records.
pub const BUSINESS_CACHE_CONTROL: &str = "public, s-maxage=600, stale-while-revalidate=1200";

/// Escapes the HTML metacharacters `< > " ' &`.
///
/// Not idempotent: running it over its own output escapes the `&` of each
/// entity again.
pub fn sanitize_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_every_metacharacter() {
        assert_eq!(
            sanitize_string(r#"<a href="x">Tom's & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom&#x27;s &amp; Jerry&#x27;s&lt;/a&gt;"
        );
    }

    #[test]
    fn leaves_plain_text_alone() {
        for s in ["coffee", "pizza near 60601", "café über", ""] {
            assert_eq!(sanitize_string(s), s);
            assert_eq!(sanitize_string(&sanitize_string(s)), s);
        }
    }

    #[test]
    fn script_tag_escapes_to_entities() {
        assert_eq!(sanitize_string("<script>"), "&lt;script&gt;");
    }

    #[test]
    fn second_pass_double_escapes() {
        let once = sanitize_string("<script>");
        let twice = sanitize_string(&once);
        assert_eq!(twice, "&amp;lt;script&amp;gt;");
        assert_ne!(once, twice);
    }

    #[test]
    fn ampersand_in_business_names_is_escaped() {
        assert_eq!(sanitize_string("Mom & Pop"), "Mom &amp; Pop");
    }
}
