//! Turns raw chat-service replies into display markup.
//!
//! Text is first split into blocks (paragraphs and bullet lists), then a fixed
//! sequence of [`Stage`]s rewrites the plain text nodes inside those blocks.
//! A stage only ever looks at [`Inline::Text`]; whatever an earlier stage
//! produced (a link, a regrouped number) is left alone by later ones.

mod render;
pub mod rules;

use serde::{Deserialize, Serialize};

pub use render::to_html;
pub use rules::format_indian_currency;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    SoftBreak,
    Link(String),
    /// A digit run rewritten with lakh/crore separators.
    Grouped(String),
    /// A short code (3 or 4 digits) shown in bold.
    Strong(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<Inline>),
    List(Vec<Vec<Inline>>),
}

impl Block {
    fn rewrite(&mut self, stage: Stage) {
        match self {
            Block::Paragraph(inlines) => *inlines = apply(stage, std::mem::take(inlines)),
            Block::List(items) => {
                for item in items.iter_mut() {
                    *item = apply(stage, std::mem::take(item));
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Linkify,
    GroupDigits,
    EmphasizeShortNumbers,
}

/// Stage order. Links claim their spans first so digits inside a URL are
/// never regrouped or emphasized; grouping must precede emphasis.
pub const PIPELINE: [Stage; 3] = [
    Stage::Linkify,
    Stage::GroupDigits,
    Stage::EmphasizeShortNumbers,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FormatOptions {
    pub linkify: bool,
    pub group_digits: bool,
    pub emphasize_short_numbers: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            linkify: true,
            group_digits: true,
            emphasize_short_numbers: true,
        }
    }
}

impl FormatOptions {
    fn enabled(&self, stage: Stage) -> bool {
        match stage {
            Stage::Linkify => self.linkify,
            Stage::GroupDigits => self.group_digits,
            Stage::EmphasizeShortNumbers => self.emphasize_short_numbers,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Formatter {
    options: FormatOptions,
}

impl Formatter {
    pub fn new(options: FormatOptions) -> Self {
        Formatter { options }
    }

    pub fn options(&self) -> FormatOptions {
        self.options
    }

    /// Structured form of `raw`, ready for any renderer.
    pub fn parse(&self, raw: &str) -> Vec<Block> {
        let mut blocks = split_blocks(raw);
        for stage in PIPELINE {
            if !self.options.enabled(stage) {
                continue;
            }
            for block in blocks.iter_mut() {
                block.rewrite(stage);
            }
        }
        blocks
    }

    pub fn format(&self, raw: &str) -> String {
        to_html(&self.parse(raw))
    }
}

/// Formats `raw` with every stage enabled.
pub fn format(raw: &str) -> String {
    Formatter::default().format(raw)
}

fn split_blocks(raw: &str) -> Vec<Block> {
    let text = raw.replace("\r\n", "\n");
    if text.contains(rules::BULLET) {
        list_blocks(&text)
    } else {
        paragraph_blocks(&text)
    }
}

fn text_node(s: &str) -> Vec<Inline> {
    if s.is_empty() {
        Vec::new()
    } else {
        vec![Inline::Text(s.to_string())]
    }
}

fn list_blocks(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut open_list: Option<Vec<Vec<Inline>>> = None;

    for line in text.split('\n') {
        if rules::is_bullet_line(line) {
            open_list
                .get_or_insert_with(Vec::new)
                .push(text_node(rules::strip_bullet(line)));
            continue;
        }

        if let Some(items) = open_list.take() {
            blocks.push(Block::List(items));
        }
        if !line.trim().is_empty() {
            blocks.push(Block::Paragraph(text_node(line)));
        }
    }

    if let Some(items) = open_list {
        blocks.push(Block::List(items));
    }
    blocks
}

fn paragraph_blocks(text: &str) -> Vec<Block> {
    text.split("\n\n")
        .filter(|segment| !segment.trim().is_empty())
        .map(|segment| {
            let mut inlines = Vec::new();
            for (i, line) in segment.split('\n').enumerate() {
                if i > 0 {
                    inlines.push(Inline::SoftBreak);
                }
                inlines.extend(text_node(line));
            }
            Block::Paragraph(inlines)
        })
        .collect()
}

fn apply(stage: Stage, inlines: Vec<Inline>) -> Vec<Inline> {
    let mut out = Vec::with_capacity(inlines.len());
    for inline in inlines {
        match inline {
            Inline::Text(text) => match stage {
                Stage::Linkify => linkify(&text, &mut out),
                Stage::GroupDigits => group_digits(&text, &mut out),
                Stage::EmphasizeShortNumbers => emphasize_short_numbers(&text, &mut out),
            },
            other => out.push(other),
        }
    }
    out
}

fn push_text(out: &mut Vec<Inline>, s: &str) {
    if !s.is_empty() {
        out.push(Inline::Text(s.to_string()));
    }
}

fn linkify(text: &str, out: &mut Vec<Inline>) {
    let mut last = 0;
    for range in rules::find_urls(text) {
        push_text(out, &text[last..range.start]);
        out.push(Inline::Link(text[range.clone()].to_string()));
        last = range.end;
    }
    push_text(out, &text[last..]);
}

fn group_digits(text: &str, out: &mut Vec<Inline>) {
    let mut last = 0;
    for range in rules::digit_runs(text) {
        let run = &text[range.clone()];
        if !rules::qualifies_for_grouping(run, &text[range.end..]) {
            continue;
        }
        push_text(out, &text[last..range.start]);
        out.push(Inline::Grouped(rules::group_south_asian(run)));
        last = range.end;
    }
    push_text(out, &text[last..]);
}

fn emphasize_short_numbers(text: &str, out: &mut Vec<Inline>) {
    let mut last = 0;
    for range in rules::digit_runs(text) {
        let run = &text[range.clone()];
        if !rules::is_short_number(run) {
            continue;
        }
        push_text(out, &text[last..range.start]);
        out.push(Inline::Strong(run.to_string()));
        last = range.end;
    }
    push_text(out, &text[last..]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    #[test]
    fn empty_and_blank_input_render_nothing() {
        assert_eq!(format(""), "");
        assert_eq!(format("   \n\n  "), "");
        assert!(Formatter::default().parse("\n").is_empty());
    }

    #[test]
    fn double_newline_splits_paragraphs() {
        assert_eq!(format("A\n\nB"), "<p>A</p><p>B</p>");
    }

    #[test]
    fn single_newline_is_a_soft_break() {
        assert_eq!(
            Formatter::default().parse("first\nsecond"),
            vec![Block::Paragraph(vec![
                text("first"),
                Inline::SoftBreak,
                text("second")
            ])]
        );
        assert_eq!(format("first\nsecond"), "<p>first<br>second</p>");
    }

    #[test]
    fn whole_input_is_one_paragraph_without_breaks_or_bullets() {
        let blocks = Formatter::default().parse("Drink fluids and rest. See a doctor if it persists.");
        assert_eq!(blocks.len(), 1);
        assert!(matches!(blocks[0], Block::Paragraph(_)));
    }

    #[test]
    fn bullets_become_one_list() {
        assert_eq!(format("• one\n• two"), "<ul><li>one</li><li>two</li></ul>");
    }

    #[test]
    fn list_closes_before_following_paragraph() {
        let raw = "Symptoms:\n• fever\n• cough\n\nRest well.";
        assert_eq!(
            Formatter::default().parse(raw),
            vec![
                Block::Paragraph(vec![text("Symptoms:")]),
                Block::List(vec![vec![text("fever")], vec![text("cough")]]),
                Block::Paragraph(vec![text("Rest well.")]),
            ]
        );
    }

    #[test]
    fn separate_bullet_runs_make_separate_lists() {
        let blocks = Formatter::default().parse("• a\nbreak\n• b");
        assert_eq!(blocks.len(), 3);
        assert!(matches!(&blocks[2], Block::List(items) if items.len() == 1));
    }

    #[test]
    fn stray_bullet_mid_line_switches_to_line_mode() {
        // No line starts with the marker, but its presence selects line mode,
        // so each non-blank line is its own paragraph.
        assert_eq!(format("a • b\nc"), "<p>a • b</p><p>c</p>");
    }

    #[test]
    fn lone_bullet_yields_empty_item() {
        assert_eq!(format("•"), "<ul><li></li></ul>");
    }

    #[test]
    fn large_numbers_are_regrouped() {
        assert_eq!(format("1234567"), "<p>12,34,567</p>");
        assert_eq!(format("Cost: 150000 rupees"), "<p>Cost: 1,50,000 rupees</p>");
    }

    #[test]
    fn years_are_not_regrouped() {
        let blocks = Formatter::default().parse("2023");
        assert_eq!(blocks, vec![Block::Paragraph(vec![Inline::Strong("2023".into())])]);
        assert_eq!(format("2023"), "<p><strong>2023</strong></p>");
    }

    #[test]
    fn short_codes_are_emphasized() {
        assert_eq!(format("911"), "<p><strong>911</strong></p>");
        assert_eq!(format("Dial 108 now"), "<p>Dial <strong>108</strong> now</p>");
    }

    #[test]
    fn regrouped_digits_are_not_emphasized() {
        let blocks = Formatter::default().parse("12345");
        assert_eq!(blocks, vec![Block::Paragraph(vec![Inline::Grouped("12,345".into())])]);
    }

    #[test]
    fn decimal_fractions_stay_intact() {
        assert_eq!(format("123456.78"), "<p>123456.78</p>");
    }

    #[test]
    fn urls_become_links() {
        assert_eq!(
            format("Visit https://example.com now"),
            "<p>Visit <a href=\"https://example.com\" target=\"_blank\" \
             rel=\"noopener noreferrer\">https://example.com</a> now</p>"
        );
    }

    #[test]
    fn digits_inside_urls_are_left_alone() {
        let blocks = Formatter::default().parse("Report: https://example.com/2024/123456 and 123456");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                text("Report: "),
                Inline::Link("https://example.com/2024/123456".into()),
                text(" and "),
                Inline::Grouped("1,23,456".into()),
            ])]
        );
    }

    #[test]
    fn stages_inside_list_items() {
        let blocks = Formatter::default().parse("• Call 112\n• Budget 250000");
        assert_eq!(
            blocks,
            vec![Block::List(vec![
                vec![text("Call "), Inline::Strong("112".into())],
                vec![text("Budget "), Inline::Grouped("2,50,000".into())],
            ])]
        );
    }

    #[test]
    fn raw_markup_is_escaped() {
        assert_eq!(
            format("<script>alert(1)</script>"),
            "<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>"
        );
    }

    #[test]
    fn disabled_stages_are_skipped() {
        let plain = Formatter::new(FormatOptions {
            linkify: false,
            group_digits: false,
            emphasize_short_numbers: false,
        });
        assert_eq!(
            plain.format("911 https://x.io 123456"),
            "<p>911 https://x.io 123456</p>"
        );
    }

    #[test]
    fn crlf_counts_as_newline() {
        assert_eq!(format("A\r\n\r\nB"), "<p>A</p><p>B</p>");
    }

    #[test]
    fn reformatting_output_is_not_idempotent() {
        let once = format("Call 108 or pay 250000");
        assert_eq!(once, "<p>Call <strong>108</strong> or pay 2,50,000</p>");

        // The second pass escapes the first pass's tags and emphasizes the
        // digit runs it finds between them, including the trailing `000`.
        let twice = format(&once);
        assert_eq!(
            twice,
            "<p>&lt;p&gt;Call &lt;strong&gt;<strong>108</strong>&lt;/strong&gt; \
             or pay 2,50,<strong>000</strong>&lt;/p&gt;</p>"
        );
    }
}
