//! Serializes the block tree to its HTML persisted form.
//!
//! The writer is the single source of the wire shape: consecutive list
//! items of one kind regain their `<ul>`/`<ol>` wrapper, empty blocks
//! carry a filler `<br>` so they keep height when rendered, and marks
//! nest in a fixed order so equal documents always serialize to equal
//! strings.

use crate::editing::document::{Alignment, Block, Document, ListKind, Run, TextBlock, TextKind};
use crate::editing::figure::FigureBlock;

/// Serialize a document to HTML
pub fn write_document(doc: &Document) -> String {
    let mut out = String::new();
    let mut open_list: Option<ListKind> = None;

    for block in doc.blocks() {
        let item_kind = match block {
            Block::Text(text) => match text.kind {
                TextKind::ListItem { kind } => Some(kind),
                _ => None,
            },
            Block::Figure(_) => None,
        };

        match (open_list, item_kind) {
            (Some(open), Some(kind)) if open != kind => {
                close_list(&mut out, open);
                open_list = Some(kind);
                open_list_wrapper(&mut out, kind);
            }
            (Some(open), None) => {
                close_list(&mut out, open);
                open_list = None;
            }
            (None, Some(kind)) => {
                open_list = Some(kind);
                open_list_wrapper(&mut out, kind);
            }
            _ => {}
        }

        match block {
            Block::Text(text) => write_text_block(&mut out, text),
            Block::Figure(figure) => write_figure(&mut out, figure),
        }
    }

    if let Some(open) = open_list {
        close_list(&mut out, open);
    }
    out
}

fn list_tag(kind: ListKind) -> &'static str {
    match kind {
        ListKind::Unordered => "ul",
        ListKind::Ordered => "ol",
    }
}

fn open_list_wrapper(out: &mut String, kind: ListKind) {
    out.push('<');
    out.push_str(list_tag(kind));
    out.push('>');
}

fn close_list(out: &mut String, kind: ListKind) {
    out.push_str("</");
    out.push_str(list_tag(kind));
    out.push('>');
}

fn write_text_block(out: &mut String, block: &TextBlock) {
    let tag = match block.kind {
        TextKind::Paragraph => "p".to_string(),
        TextKind::Div => "div".to_string(),
        TextKind::Heading { level } => format!("h{level}"),
        TextKind::Quote => "blockquote".to_string(),
        TextKind::ListItem { .. } => "li".to_string(),
    };

    out.push('<');
    out.push_str(&tag);
    push_align(out, block.align);
    out.push('>');

    if block.runs.is_empty() {
        // Filler break so an empty block keeps its height in a renderer
        out.push_str("<br>");
    } else {
        for run in &block.runs {
            write_run(out, run);
        }
    }

    out.push_str("</");
    out.push_str(&tag);
    out.push('>');
}

fn push_align(out: &mut String, align: Alignment) {
    let value = match align {
        Alignment::Left => return,
        Alignment::Center => "center",
        Alignment::Right => "right",
    };
    out.push_str(" style=\"text-align: ");
    out.push_str(value);
    out.push('"');
}

/// Marks wrap the run text in a fixed order, link outermost
fn write_run(out: &mut String, run: &Run) {
    if let Some(href) = &run.marks.link {
        out.push_str("<a href=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(href));
        out.push_str("\">");
    }
    if run.marks.bold {
        out.push_str("<b>");
    }
    if run.marks.italic {
        out.push_str("<i>");
    }
    if run.marks.underline {
        out.push_str("<u>");
    }

    out.push_str(&html_escape::encode_text(&run.text));

    if run.marks.underline {
        out.push_str("</u>");
    }
    if run.marks.italic {
        out.push_str("</i>");
    }
    if run.marks.bold {
        out.push_str("</b>");
    }
    if run.marks.link.is_some() {
        out.push_str("</a>");
    }
}

fn write_figure(out: &mut String, figure: &FigureBlock) {
    out.push_str("<figure><img src=\"");
    out.push_str(&html_escape::encode_double_quoted_attribute(&figure.src));
    out.push_str("\" alt=\"");
    out.push_str(&html_escape::encode_double_quoted_attribute(&figure.alt));
    out.push('"');
    if let Some(width) = figure.width {
        out.push_str(&format!(" style=\"width: {width}px\""));
    }
    out.push('>');

    if let Some(caption) = &figure.caption {
        out.push_str("<figcaption>");
        out.push_str(&html_escape::encode_text(caption));
        out.push_str("</figcaption>");
    }

    // The drag handle travels with the figure markup; the reader drops
    // it again on the way back in
    out.push_str("<span class=\"resize-handle\"></span></figure>");
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::editing::document::MarkSet;
    use crate::editing::figure::FigureBlock;

    fn doc_of(blocks: Vec<Block>) -> Document {
        Document::from_blocks(blocks)
    }

    fn item(kind: ListKind, text: &str) -> Block {
        Block::Text(TextBlock::with_text(TextKind::ListItem { kind }, text))
    }

    #[test]
    fn writes_a_paragraph() {
        let doc = doc_of(vec![Block::Text(TextBlock::with_text(
            TextKind::Paragraph,
            "Hello world",
        ))]);

        assert_eq!(write_document(&doc), "<p>Hello world</p>");
    }

    #[test]
    fn empty_blocks_carry_a_filler_break() {
        assert_eq!(write_document(&Document::new()), "<p><br></p>");
    }

    #[test]
    fn heading_level_picks_the_tag() {
        let doc = doc_of(vec![Block::Text(TextBlock::with_text(
            TextKind::Heading { level: 2 },
            "Title",
        ))]);

        assert_eq!(write_document(&doc), "<h2>Title</h2>");
    }

    #[test]
    fn alignment_becomes_a_style_attribute() {
        let mut block = TextBlock::with_text(TextKind::Paragraph, "mid");
        block.align = Alignment::Center;
        let doc = doc_of(vec![Block::Text(block)]);

        assert_eq!(
            write_document(&doc),
            r#"<p style="text-align: center">mid</p>"#
        );
    }

    #[test]
    fn marks_nest_in_a_fixed_order() {
        let mut block = TextBlock::empty(TextKind::Paragraph);
        block.runs.push(Run::marked(
            "all",
            MarkSet {
                bold: true,
                italic: true,
                underline: true,
                link: Some("https://example.com".to_string()),
            },
        ));
        let doc = doc_of(vec![Block::Text(block)]);

        assert_eq!(
            write_document(&doc),
            r#"<p><a href="https://example.com"><b><i><u>all</u></i></b></a></p>"#
        );
    }

    #[test]
    fn consecutive_items_share_a_list_wrapper() {
        let doc = doc_of(vec![
            item(ListKind::Unordered, "a"),
            item(ListKind::Unordered, "b"),
            item(ListKind::Ordered, "c"),
            Block::Text(TextBlock::with_text(TextKind::Paragraph, "after")),
        ]);

        assert_eq!(
            write_document(&doc),
            "<ul><li>a</li><li>b</li></ul><ol><li>c</li></ol><p>after</p>"
        );
    }

    #[test]
    fn list_at_document_end_still_closes() {
        let doc = doc_of(vec![item(ListKind::Ordered, "last")]);

        assert_eq!(write_document(&doc), "<ol><li>last</li></ol>");
    }

    #[test]
    fn text_and_attributes_are_escaped() {
        let mut block = TextBlock::with_text(TextKind::Paragraph, "2 < 3 & cats");
        block.runs[0].marks.link = Some("/q?a=1&b=2".to_string());
        let doc = doc_of(vec![Block::Text(block)]);

        assert_eq!(
            write_document(&doc),
            r#"<p><a href="/q?a=1&amp;b=2">2 &lt; 3 &amp; cats</a></p>"#
        );
    }

    #[test]
    fn figure_markup_carries_image_caption_and_handle() {
        let figure = FigureBlock {
            id: crate::editing::document::BlockId::new(),
            src: "pic.jpg".to_string(),
            alt: "A pic".to_string(),
            caption: Some("Sunset — Jane".to_string()),
            width: Some(300.0),
        };
        let doc = doc_of(vec![
            Block::Figure(figure),
            Block::Text(TextBlock::empty(TextKind::Paragraph)),
        ]);

        insta::assert_snapshot!(
            write_document(&doc),
            @r#"<figure><img src="pic.jpg" alt="A pic" style="width: 300px"><figcaption>Sunset — Jane</figcaption><span class="resize-handle"></span></figure><p><br></p>"#
        );
    }

    #[test]
    fn widthless_image_omits_the_style() {
        let figure = FigureBlock {
            id: crate::editing::document::BlockId::new(),
            src: "x.png".to_string(),
            alt: String::new(),
            caption: None,
            width: None,
        };
        let doc = doc_of(vec![
            Block::Figure(figure),
            Block::Text(TextBlock::empty(TextKind::Paragraph)),
        ]);

        assert_eq!(
            write_document(&doc),
            concat!(
                r#"<figure><img src="x.png" alt="">"#,
                r#"<span class="resize-handle"></span></figure><p><br></p>"#
            )
        );
    }

    #[test]
    fn read_write_round_trip_is_stable() {
        let html = concat!(
            "<h1>Title</h1>",
            r#"<p style="text-align: right">lead <b>bold</b></p>"#,
            "<ul><li>one</li><li>two</li></ul>",
            "<blockquote>said</blockquote>",
            "<p><br></p>"
        );
        let doc = Document::from_html(html).unwrap();

        assert_eq!(write_document(&doc), html);
    }
}
