//! Rendering boundary for untrusted bot text.
//!
//! Answers arrive as markdown from a service that does not sanitize them.
//! Text is parsed as CommonMark, then only a small subset is honoured: paragraphs, links, unordered lists, and
//! ordered lists.  Everything else is flattened to text:
//!
//! - raw HTML stays literal and is entity-escaped on HTML output
//! - heading, block quote, and code fence markers are dropped
//! - emphasis and inline code markers are dropped, their text kept
//! - nested lists are folded into the enclosing item as marked lines
//! - link targets must be `http`, `https`, `mailto`, or site-relative
//! - control characters other than newline and tab are removed
//!
//! A parsed [`Document`] is already sanitized; both renderers trust it.

use std::fmt::Write as _;

use pulldown_cmark::{Event, LinkType, Parser, Tag, TagEnd};
use url::Url;

/// Inline content of a paragraph or list item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    /// Plain text.
    Text(String),

    /// A link whose target passed the scheme check.
    Link {
        /// The visible link text.
        text: String,
        /// The vetted target.
        href: String,
    },

    /// A line break inside a paragraph or list item.
    SoftBreak,
}

/// A block in the constrained subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// A run of text lines.
    Paragraph(Vec<Inline>),

    /// A bulleted list.
    UnorderedList(Vec<Vec<Inline>>),

    /// A numbered list starting at `start`.
    OrderedList {
        /// Number of the first item.
        start: u64,
        /// The list items.
        items: Vec<Vec<Inline>>,
    },
}

/// Sanitized markdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Blocks in display order.
    pub blocks: Vec<Block>,
}

/// Parse untrusted markdown into the constrained subset.
pub fn parse(text: &str) -> Document {
    let text = strip_control_chars(text);
    let mut builder = DocumentBuilder::default();
    for event in Parser::new(&text) {
        builder.event(event);
    }
    builder.finish()
}

/// Parse and render untrusted markdown as HTML.
pub fn to_html(text: &str) -> String {
    parse(text).to_html()
}

/// Parse and render untrusted markdown as terminal text.
pub fn to_plain_text(text: &str) -> String {
    parse(text).to_plain_text()
}

impl Document {
    /// Render as HTML using only `p`, `ul`, `ol`, `li`, and `a`.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            match block {
                Block::Paragraph(inlines) => {
                    out.push_str("<p>");
                    inlines_to_html(inlines, &mut out);
                    out.push_str("</p>\n");
                }
                Block::UnorderedList(items) => {
                    out.push_str("<ul>\n");
                    items_to_html(items, &mut out);
                    out.push_str("</ul>\n");
                }
                Block::OrderedList { start, items } => {
                    if *start == 1 {
                        out.push_str("<ol>\n");
                    } else {
                        let _ = writeln!(out, "<ol start=\"{start}\">");
                    }
                    items_to_html(items, &mut out);
                    out.push_str("</ol>\n");
                }
            }
        }
        out
    }

    /// Render as plain text for a terminal.
    ///
    /// Blocks are separated by a blank line; links show their target after
    /// the text unless the two are identical.
    pub fn to_plain_text(&self) -> String {
        let mut blocks = Vec::with_capacity(self.blocks.len());
        for block in &self.blocks {
            let mut out = String::new();
            match block {
                Block::Paragraph(inlines) => {
                    inlines_to_plain(inlines, "", &mut out);
                }
                Block::UnorderedList(items) => {
                    for (index, item) in items.iter().enumerate() {
                        if index > 0 {
                            out.push('\n');
                        }
                        out.push_str("  • ");
                        inlines_to_plain(item, "    ", &mut out);
                    }
                }
                Block::OrderedList { start, items } => {
                    for (index, item) in items.iter().enumerate() {
                        if index > 0 {
                            out.push('\n');
                        }
                        let number = start.saturating_add(index as u64);
                        let marker = format!("  {number}. ");
                        let indent = " ".repeat(marker.chars().count());
                        out.push_str(&marker);
                        inlines_to_plain(item, &indent, &mut out);
                    }
                }
            }
            blocks.push(out);
        }
        blocks.join("\n\n")
    }
}

fn items_to_html(items: &[Vec<Inline>], out: &mut String) {
    for item in items {
        out.push_str("<li>");
        inlines_to_html(item, out);
        out.push_str("</li>\n");
    }
}

fn inlines_to_html(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push_str(&escape_html(text)),
            Inline::Link { text, href } => {
                let _ = write!(
                    out,
                    "<a href=\"{}\" rel=\"nofollow noopener noreferrer\">{}</a>",
                    escape_html(href),
                    escape_html(text)
                );
            }
            Inline::SoftBreak => out.push('\n'),
        }
    }
}

fn inlines_to_plain(inlines: &[Inline], indent: &str, out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push_str(text),
            Inline::Link { text, href } => {
                if text.is_empty() || same_target(text, href) {
                    out.push_str(href);
                } else {
                    let _ = write!(out, "{text} <{href}>");
                }
            }
            Inline::SoftBreak => {
                out.push('\n');
                out.push_str(indent);
            }
        }
    }
}

/// True when link text already shows the target, ignoring a trailing slash
/// added by URL normalization.
fn same_target(text: &str, href: &str) -> bool {
    text == href || text.trim_end_matches('/') == href.trim_end_matches('/')
}

/// Escape text for use in HTML content or a double-quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Remove control characters other than newline and tab.
///
/// Used on its own for text that is displayed verbatim rather than parsed.
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| *c == '\n' || *c == '\t' || !c.is_control())
        .collect()
}

/// Returns the link target to emit, or `None` if it must not be linked.
fn vet_href(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with('#') || (href.starts_with('/') && !href.starts_with("//")) {
        return Some(href.to_string());
    }
    match Url::parse(href) {
        Ok(url) if matches!(url.scheme(), "http" | "https" | "mailto") => {
            Some(url.as_str().to_string())
        }
        _ => None,
    }
}

////////////////////////////////////////// Event mapping //////////////////////////////////////////

/// Inline content being collected for one paragraph or list item.
#[derive(Default)]
struct InlineBuffer {
    inlines: Vec<Inline>,
    pending_break: bool,
}

impl InlineBuffer {
    fn push(&mut self, inline: Inline) {
        if std::mem::take(&mut self.pending_break) && !self.inlines.is_empty() {
            self.inlines.push(Inline::SoftBreak);
        }
        if let Inline::Text(text) = &inline
            && let Some(Inline::Text(previous)) = self.inlines.last_mut()
        {
            previous.push_str(text);
            return;
        }
        self.inlines.push(inline);
    }

    fn push_text(&mut self, text: &str) {
        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                self.soft_break();
            }
            if !line.is_empty() {
                self.push(Inline::Text(line.to_string()));
            }
        }
    }

    /// Breaks the line before the next inline, if one arrives.
    fn soft_break(&mut self) {
        self.pending_break = true;
    }

    fn take(&mut self) -> Vec<Inline> {
        self.pending_break = false;
        std::mem::take(&mut self.inlines)
    }
}

struct ListFrame {
    start: Option<u64>,
    items: Vec<Vec<Inline>>,
    current: InlineBuffer,
}

struct LinkFrame {
    href: Option<String>,
    text: String,
}

/// Folds CommonMark events into the constrained block model.
///
/// Paragraphs, lists, items, and links map directly.  Headings, code blocks,
/// and HTML blocks become paragraphs of their text; nested lists are folded
/// into the enclosing item as marked lines.
#[derive(Default)]
struct DocumentBuilder {
    blocks: Vec<Block>,
    paragraph: InlineBuffer,
    lists: Vec<ListFrame>,
    link: Option<LinkFrame>,
}

impl DocumentBuilder {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) | Event::Code(text) | Event::Html(text) | Event::InlineHtml(text) => {
                self.text(&text)
            }
            Event::SoftBreak | Event::HardBreak => self.soft_break(),
            Event::Rule => self.finish_block(),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.flush_paragraph();
                }
                self.lists.push(ListFrame {
                    start,
                    items: Vec::new(),
                    current: InlineBuffer::default(),
                });
            }
            Tag::Link {
                link_type,
                dest_url,
                ..
            } => {
                let dest: &str = &dest_url;
                let href = if matches!(link_type, LinkType::Email) {
                    format!("mailto:{dest}")
                } else {
                    dest.to_string()
                };
                self.link = Some(LinkFrame {
                    href: vet_href(&href),
                    text: String::new(),
                });
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::CodeBlock | TagEnd::HtmlBlock => {
                self.finish_block()
            }
            TagEnd::Item => {
                if let Some(frame) = self.lists.last_mut() {
                    let item = frame.current.take();
                    frame.items.push(item);
                }
            }
            TagEnd::List(_) => self.finish_list(),
            TagEnd::Link => self.finish_link(),
            _ => {}
        }
    }

    fn target(&mut self) -> &mut InlineBuffer {
        match self.lists.last_mut() {
            Some(frame) => &mut frame.current,
            None => &mut self.paragraph,
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(link) = &mut self.link {
            link.text.push_str(&text.replace('\n', " "));
            return;
        }
        self.target().push_text(text);
    }

    fn soft_break(&mut self) {
        if let Some(link) = &mut self.link {
            link.text.push(' ');
            return;
        }
        self.target().soft_break();
    }

    fn finish_block(&mut self) {
        if let Some(frame) = self.lists.last_mut() {
            frame.current.soft_break();
            return;
        }
        self.flush_paragraph();
    }

    fn flush_paragraph(&mut self) {
        let inlines = self.paragraph.take();
        if !inlines.is_empty() {
            self.blocks.push(Block::Paragraph(inlines));
        }
    }

    fn finish_link(&mut self) {
        let Some(link) = self.link.take() else {
            return;
        };
        let inline = match link.href {
            Some(href) if link.text.is_empty() => Inline::Link {
                text: href.clone(),
                href,
            },
            Some(href) => Inline::Link {
                text: link.text,
                href,
            },
            None if link.text.is_empty() => return,
            None => Inline::Text(link.text),
        };
        self.target().push(inline);
    }

    fn finish_list(&mut self) {
        let Some(frame) = self.lists.pop() else {
            return;
        };
        match self.lists.last_mut() {
            Some(parent) => {
                for (index, item) in frame.items.into_iter().enumerate() {
                    let marker = match frame.start {
                        Some(start) => format!("{}. ", start.saturating_add(index as u64)),
                        None => "• ".to_string(),
                    };
                    parent.current.soft_break();
                    parent.current.push(Inline::Text(marker));
                    for inline in item {
                        parent.current.push(inline);
                    }
                }
                parent.current.soft_break();
            }
            None => self.blocks.push(match frame.start {
                Some(start) => Block::OrderedList {
                    start,
                    items: frame.items,
                },
                None => Block::UnorderedList(frame.items),
            }),
        }
    }

    fn finish(mut self) -> Document {
        self.finish_link();
        while !self.lists.is_empty() {
            self.finish_list();
        }
        self.flush_paragraph();
        Document {
            blocks: self.blocks,
        }
    }
}
