//! Markdown rendering for note content.
//!
//! Model output is rendered with pulldown-cmark. Raw HTML inside the markdown
//! is emitted as escaped text and script link targets are replaced, so note
//! content can never inject markup into a report.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

/// Escape text for use in HTML element content or attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render markdown to an HTML fragment.
pub fn render_markdown(input: &str) -> String {
    let parser = Parser::new_ext(input, build_options()).map(neutralize);

    let mut html_output = String::with_capacity(input.len() * 2);
    html::push_html(&mut html_output, parser);
    html_output
}

fn build_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

fn is_script_url(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    lower.starts_with("javascript:") || lower.starts_with("vbscript:") || lower.starts_with("data:")
}

/// Turn raw HTML into text and defuse script URLs.
fn neutralize(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) if is_script_url(&dest_url) => Event::Start(Tag::Link {
            link_type,
            dest_url: CowStr::Borrowed("#"),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) if is_script_url(&dest_url) => Event::Start(Tag::Image {
            link_type,
            dest_url: CowStr::Borrowed("#"),
            title,
            id,
        }),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_bold_renders_as_strong() {
        let html = render_markdown("This is the **key** idea.");
        assert!(html.contains("<strong>key</strong>"));
        assert!(!html.contains("**"));
    }

    #[test]
    fn test_lists_render() {
        let html = render_markdown("- one\n- two\n");
        assert!(html.contains("<ul>"));
        assert!(html.contains("<li>one</li>"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = render_markdown("Hello <script>alert(1)</script> world\n\n<div onclick=\"x\">block</div>");
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<div onclick"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_script_links_defused() {
        let html = render_markdown("[click](javascript:alert(1)) and [ok](https://example.com)");
        assert!(!html.contains("javascript:"));
        assert!(html.contains(r##"href="#""##));
        assert!(html.contains(r#"href="https://example.com""#));
    }

    #[test]
    fn test_malformed_markdown_degrades_to_text() {
        let html = render_markdown("**unclosed and [broken](link");
        assert!(html.contains("**unclosed"));
        assert!(html.contains("[broken](link"));
    }
}
