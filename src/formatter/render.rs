use pulldown_cmark::escape::{escape_href, escape_html};

use super::{Block, Inline};

/// Renders formatter blocks as HTML. Text nodes are escaped, so markup that
/// arrived in the raw reply is displayed rather than interpreted.
pub fn to_html(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        match block {
            Block::Paragraph(inlines) => {
                out.push_str("<p>");
                push_inlines(&mut out, inlines);
                out.push_str("</p>");
            }
            Block::List(items) => {
                out.push_str("<ul>");
                for item in items {
                    out.push_str("<li>");
                    push_inlines(&mut out, item);
                    out.push_str("</li>");
                }
                out.push_str("</ul>");
            }
        }
    }
    out
}

fn push_inlines(out: &mut String, inlines: &[Inline]) {
    for inline in inlines {
        match inline {
            Inline::Text(text) => push_escaped(out, text),
            Inline::SoftBreak => out.push_str("<br>"),
            Inline::Link(url) => {
                out.push_str("<a href=\"");
                // Writing into a String cannot fail.
                let _ = escape_href(&mut *out, url);
                out.push_str("\" target=\"_blank\" rel=\"noopener noreferrer\">");
                push_escaped(out, url);
                out.push_str("</a>");
            }
            Inline::Grouped(digits) => out.push_str(digits),
            Inline::Strong(digits) => {
                out.push_str("<strong>");
                out.push_str(digits);
                out.push_str("</strong>");
            }
        }
    }
}

fn push_escaped(out: &mut String, text: &str) {
    let _ = escape_html(&mut *out, text);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_list_inlines() {
        let blocks = vec![Block::List(vec![vec![
            Inline::Text("Call ".into()),
            Inline::Strong("108".into()),
        ]])];
        assert_eq!(to_html(&blocks), "<ul><li>Call <strong>108</strong></li></ul>");
    }

    #[test]
    fn link_href_is_escaped() {
        let blocks = vec![Block::Paragraph(vec![Inline::Link(
            "https://x.io/?a=1&b=2".into(),
        )])];
        let html = to_html(&blocks);
        assert!(html.contains("href=\"https://x.io/?a=1&amp;b=2\""));
        assert!(html.ends_with(">https://x.io/?a=1&amp;b=2</a></p>"));
    }
}
