//! Lenient HTML reader for seeding a document.
//!
//! The reader accepts whatever markup a host hands over and produces a
//! valid block tree: recognized block tags become blocks, unknown tags
//! dissolve into their content, stray text collects into implicit
//! blocks, and input with no block markup at all is wrapped line by
//! line like a paste. Nothing here panics on malformed input; the one
//! structured failure is a nesting depth cap.

use std::sync::OnceLock;

use regex::Regex;

use crate::editing::document::{
    Alignment, Block, BlockId, Document, ListKind, MarkSet, Run, TextBlock, TextKind,
};
use crate::editing::figure::{FigureBlock, MIN_IMAGE_WIDTH};
use crate::editing::paste;

/// Containers nested deeper than this abort the read
pub(crate) const MAX_NESTING_DEPTH: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("markup nested deeper than {limit} levels", limit = MAX_NESTING_DEPTH)]
    TooDeep,
}

/// Parse serialized markup into a document
///
/// Input with no recognizable block tag is treated as plain lines and
/// wrapped the way a paste is. A figure at the end of the input gains
/// the empty trailing block the editing invariants expect.
pub fn read_document(html: &str) -> Result<Document, ReadError> {
    let mut blocks = if has_block_markup(html) {
        let mut parser = BlockParser::new(html);
        parser.parse_blocks(None, 0)?
    } else {
        wrap_plain_lines(html)
    };

    if blocks.last().is_some_and(Block::is_figure) {
        blocks.push(Block::Text(TextBlock::empty(TextKind::Paragraph)));
    }

    Ok(Document::from_blocks(blocks))
}

static BLOCK_TAG_REGEX: OnceLock<Regex> = OnceLock::new();

fn has_block_markup(html: &str) -> bool {
    let regex = BLOCK_TAG_REGEX.get_or_init(|| {
        Regex::new(r"(?i)<(p|div|h[1-6]|ul|ol|li|blockquote|figure|img)[\s/>]")
            .expect("Invalid block tag regex")
    });
    regex.is_match(html)
}

/// Tag-free seeds reuse the paste rules, then run each line through the
/// inline reader so stray marks like `<b>` still apply
fn wrap_plain_lines(input: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    for line in paste::split_lines(input) {
        let mut parser = BlockParser::new(&line);
        let segments = parser.parse_inline(&[]);
        let runs = join_segments(segments);
        let mut block = TextBlock::empty(TextKind::Div);
        block.runs = runs;
        block.normalize();
        if !block.is_empty() {
            blocks.push(Block::Text(block));
        }
    }
    blocks
}

// ---------------------------------------------------------------------
// Tag scanning
// ---------------------------------------------------------------------

/// Byte cursor over the input with cheap save and restore
#[derive(Debug, Clone)]
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ScannedTag {
    /// Lowercased tag name
    name: String,
    closing: bool,
    attrs: Vec<(String, String)>,
}

impl ScannedTag {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn alignment(&self) -> Option<Alignment> {
        let style = self.attr("style")?;
        match style_value(style, "text-align")? {
            v if v.eq_ignore_ascii_case("center") => Some(Alignment::Center),
            v if v.eq_ignore_ascii_case("right") => Some(Alignment::Right),
            v if v.eq_ignore_ascii_case("left") => Some(Alignment::Left),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Text(&'a str),
    Tag(ScannedTag),
    /// Comments and doctype declarations, consumed and dropped
    Skip,
}

/// Pull one CSS declaration's value out of an inline style string
fn style_value<'v>(style: &'v str, property: &str) -> Option<&'v str> {
    for declaration in style.split(';') {
        if let Some((name, value)) = declaration.split_once(':')
            && name.trim().eq_ignore_ascii_case(property)
        {
            return Some(value.trim());
        }
    }
    None
}

/// Parse a pixel length such as `300px` or `300.5`
fn parse_px(value: &str) -> Option<f64> {
    let digits = value
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_alphabetic());
    digits.trim().parse().ok()
}

// ---------------------------------------------------------------------
// Block parsing
// ---------------------------------------------------------------------

/// What loose inline content should become at the current position
#[derive(Debug, Clone, Copy)]
enum LooseContext {
    /// Each break-separated segment becomes its own plain block
    TopLevel,
    /// Everything folds into a single list item of this kind
    List(ListKind),
}

impl LooseContext {
    fn item_kind(&self) -> ListKind {
        match self {
            LooseContext::TopLevel => ListKind::Unordered,
            LooseContext::List(kind) => *kind,
        }
    }
}

struct BlockParser<'a> {
    cur: Cursor<'a>,
}

impl<'a> BlockParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            cur: Cursor::new(input),
        }
    }

    /// Scan the next token, or `None` at end of input
    fn next_token(&mut self) -> Option<Token<'a>> {
        if self.cur.eof() {
            return None;
        }
        if self.cur.peek() == Some('<') {
            if self.cur.starts_with("<!--") {
                self.skip_comment();
                return Some(Token::Skip);
            }
            if self.cur.starts_with("<!") {
                self.skip_to_tag_end();
                return Some(Token::Skip);
            }
            if let Some(tag) = self.try_scan_tag() {
                return Some(Token::Tag(tag));
            }
            // Lone '<' that opens no tag reads as text
            self.cur.bump();
            return Some(Token::Text("<"));
        }
        let start = self.cur.pos;
        while !self.cur.eof() && self.cur.peek() != Some('<') {
            self.cur.bump();
        }
        Some(Token::Text(&self.cur.input[start..self.cur.pos]))
    }

    fn skip_comment(&mut self) {
        self.cur.bump_n(4);
        while !self.cur.eof() && !self.cur.starts_with("-->") {
            self.cur.bump();
        }
        if self.cur.starts_with("-->") {
            self.cur.bump_n(3);
        }
    }

    fn skip_to_tag_end(&mut self) {
        while let Some(ch) = self.cur.bump() {
            if ch == '>' {
                break;
            }
        }
    }

    /// Scan `<name attr="v">` or `</name>`; restores the cursor and
    /// returns `None` when no well-formed tag starts here
    fn try_scan_tag(&mut self) -> Option<ScannedTag> {
        let saved = self.cur.clone();
        self.cur.bump(); // '<'

        let closing = self.cur.peek() == Some('/');
        if closing {
            self.cur.bump();
        }

        let name_start = self.cur.pos;
        while self.cur.peek().is_some_and(|c| c.is_ascii_alphanumeric()) {
            self.cur.bump();
        }
        let name = &self.cur.input[name_start..self.cur.pos];
        if !name.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.cur = saved;
            return None;
        }

        let mut attrs = Vec::new();
        loop {
            while self.cur.peek().is_some_and(char::is_whitespace) {
                self.cur.bump();
            }
            match self.cur.peek() {
                None => {
                    // Unterminated tag degrades to text
                    self.cur = saved;
                    return None;
                }
                Some('>') => {
                    self.cur.bump();
                    break;
                }
                Some('/') => {
                    self.cur.bump();
                }
                Some(c) if c.is_ascii_alphabetic() => {
                    if let Some(attr) = self.scan_attr() {
                        attrs.push(attr);
                    }
                }
                Some(_) => {
                    self.cur.bump();
                }
            }
        }

        Some(ScannedTag {
            name: name.to_ascii_lowercase(),
            closing,
            attrs,
        })
    }

    fn scan_attr(&mut self) -> Option<(String, String)> {
        let name_start = self.cur.pos;
        while self
            .cur
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            self.cur.bump();
        }
        let name = self.cur.input[name_start..self.cur.pos].to_ascii_lowercase();
        if name.is_empty() {
            return None;
        }

        while self.cur.peek().is_some_and(char::is_whitespace) {
            self.cur.bump();
        }
        if self.cur.peek() != Some('=') {
            return Some((name, String::new()));
        }
        self.cur.bump();
        while self.cur.peek().is_some_and(char::is_whitespace) {
            self.cur.bump();
        }

        let value = match self.cur.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.cur.bump();
                let start = self.cur.pos;
                while !self.cur.eof() && self.cur.peek() != Some(quote) {
                    self.cur.bump();
                }
                let raw = &self.cur.input[start..self.cur.pos];
                self.cur.bump(); // closing quote, if any
                raw
            }
            _ => {
                let start = self.cur.pos;
                while self
                    .cur
                    .peek()
                    .is_some_and(|c| !c.is_whitespace() && c != '>' && c != '/')
                {
                    self.cur.bump();
                }
                &self.cur.input[start..self.cur.pos]
            }
        };

        Some((name, html_escape::decode_html_entities(value).into_owned()))
    }

    /// Parse blocks until end of input or the named close tag
    fn parse_blocks(&mut self, until: Option<&str>, depth: usize) -> Result<Vec<Block>, ReadError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(ReadError::TooDeep);
        }

        let mut out = Vec::new();
        loop {
            let saved = self.cur.clone();
            let Some(token) = self.next_token() else {
                break;
            };
            match token {
                Token::Skip => {}
                Token::Tag(tag) if tag.closing => {
                    if until == Some(tag.name.as_str()) {
                        break;
                    }
                    // Stray close tag, drop it
                }
                Token::Tag(tag) => {
                    self.handle_tag(&tag, &saved, depth, LooseContext::TopLevel, &mut out)?;
                }
                Token::Text(text) => {
                    if text.trim().is_empty() {
                        continue;
                    }
                    self.cur = saved;
                    self.parse_loose(LooseContext::TopLevel, &mut out);
                }
            }
        }
        Ok(out)
    }

    /// Dispatch one opening tag. `saved` points just before the tag so
    /// unknown markup can be rewound into the inline reader.
    fn handle_tag(
        &mut self,
        tag: &ScannedTag,
        saved: &Cursor<'a>,
        depth: usize,
        ctx: LooseContext,
        out: &mut Vec<Block>,
    ) -> Result<(), ReadError> {
        match tag.name.as_str() {
            "p" => self.parse_text_block(tag, TextKind::Paragraph, "p", out),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = tag.name[1..].parse::<u8>().unwrap_or(1).min(3);
                let close = tag.name.clone();
                self.parse_text_block(tag, TextKind::Heading { level }, &close, out);
            }
            "li" => self.parse_list_item(tag, ctx.item_kind(), out),
            "ul" => self.parse_list(ListKind::Unordered, "ul", depth + 1, out)?,
            "ol" => self.parse_list(ListKind::Ordered, "ol", depth + 1, out)?,
            "blockquote" => self.parse_quote(tag, depth + 1, out)?,
            "div" => self.parse_div(tag, depth + 1, out)?,
            "figure" => self.parse_figure(out),
            "img" => out.push(figure_from_img(tag)),
            "br" => {}
            _ => {
                // Unknown tag: rewind and let the inline reader fold it
                // into loose content
                self.cur = saved.clone();
                self.parse_loose(ctx, out);
            }
        }
        Ok(())
    }

    /// A span of loose inline content becomes an implicit block (or list
    /// item when it sits inside a list)
    fn parse_loose(&mut self, ctx: LooseContext, out: &mut Vec<Block>) {
        let segments = self.parse_inline(&[]);
        match ctx {
            LooseContext::TopLevel => {
                for runs in segments {
                    let mut block = TextBlock::empty(TextKind::Div);
                    block.runs = runs;
                    block.normalize();
                    if !block.is_empty() {
                        out.push(Block::Text(block));
                    }
                }
            }
            LooseContext::List(kind) => {
                let runs = join_segments(segments);
                let mut block = TextBlock::empty(TextKind::ListItem { kind });
                block.runs = runs;
                block.normalize();
                if !block.is_empty() {
                    out.push(Block::Text(block));
                }
            }
        }
    }

    fn parse_text_block(
        &mut self,
        tag: &ScannedTag,
        kind: TextKind,
        close: &str,
        out: &mut Vec<Block>,
    ) {
        let align = tag.alignment().unwrap_or_default();
        let segments = self.parse_inline(&[close]);
        for runs in segments {
            let mut block = TextBlock::empty(kind);
            block.align = align;
            block.runs = runs;
            block.normalize();
            out.push(Block::Text(block));
        }
    }

    fn parse_list_item(&mut self, tag: &ScannedTag, kind: ListKind, out: &mut Vec<Block>) {
        let align = tag.alignment().unwrap_or_default();
        let segments = self.parse_inline(&["li"]);
        // Breaks inside an item stay inside it
        let runs = join_segments(segments);
        let mut block = TextBlock::empty(TextKind::ListItem { kind });
        block.align = align;
        block.runs = runs;
        block.normalize();
        out.push(Block::Text(block));
    }

    fn parse_list(
        &mut self,
        kind: ListKind,
        close: &str,
        depth: usize,
        out: &mut Vec<Block>,
    ) -> Result<(), ReadError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(ReadError::TooDeep);
        }
        loop {
            let saved = self.cur.clone();
            let Some(token) = self.next_token() else {
                break;
            };
            match token {
                Token::Skip => {}
                Token::Tag(tag) if tag.closing => {
                    if tag.name == close {
                        break;
                    }
                    // Unmatched close inside the list, drop it
                }
                Token::Tag(tag) => {
                    self.handle_tag(&tag, &saved, depth, LooseContext::List(kind), out)?;
                }
                Token::Text(text) => {
                    if text.trim().is_empty() {
                        continue;
                    }
                    self.cur = saved;
                    self.parse_loose(LooseContext::List(kind), out);
                }
            }
        }
        Ok(())
    }

    /// Quote contents parse as nested blocks; plain children pick up the
    /// quote kind, anything structured keeps its own
    fn parse_quote(
        &mut self,
        tag: &ScannedTag,
        depth: usize,
        out: &mut Vec<Block>,
    ) -> Result<(), ReadError> {
        let align = tag.alignment();
        let children = self.parse_blocks(Some("blockquote"), depth)?;
        if children.is_empty() {
            out.push(Block::Text(TextBlock::empty(TextKind::Quote)));
            return Ok(());
        }
        for mut child in children {
            if let Block::Text(text) = &mut child {
                if matches!(text.kind, TextKind::Paragraph | TextKind::Div) {
                    text.kind = TextKind::Quote;
                }
                if let Some(align) = align
                    && text.align == Alignment::Left
                {
                    text.align = align;
                }
            }
            out.push(child);
        }
        Ok(())
    }

    /// A div is a block when it holds only inline content and a
    /// transparent wrapper when it holds blocks
    fn parse_div(
        &mut self,
        tag: &ScannedTag,
        depth: usize,
        out: &mut Vec<Block>,
    ) -> Result<(), ReadError> {
        let align = tag.alignment();
        let children = self.parse_blocks(Some("div"), depth)?;
        if children.is_empty() {
            let mut block = TextBlock::empty(TextKind::Div);
            block.align = align.unwrap_or_default();
            out.push(Block::Text(block));
            return Ok(());
        }
        for mut child in children {
            if let Block::Text(text) = &mut child
                && let Some(align) = align
                && text.align == Alignment::Left
            {
                text.align = align;
            }
            out.push(child);
        }
        Ok(())
    }

    /// Collect the image, caption and handle marker of a figure; the
    /// handle is reconstructed on write, so it is simply dropped here
    fn parse_figure(&mut self, out: &mut Vec<Block>) {
        let mut src: Option<String> = None;
        let mut alt = String::new();
        let mut width: Option<f64> = None;
        let mut caption = String::new();

        loop {
            let Some(token) = self.next_token() else {
                break;
            };
            match token {
                Token::Skip | Token::Text(_) => {}
                Token::Tag(tag) if tag.closing => {
                    if tag.name == "figure" {
                        break;
                    }
                }
                Token::Tag(tag) => match tag.name.as_str() {
                    "img" => {
                        src = Some(tag.attr("src").unwrap_or_default().to_string());
                        alt = tag.attr("alt").unwrap_or_default().to_string();
                        width = img_width(&tag);
                    }
                    "figcaption" => {
                        caption = self.collect_text_until("figcaption");
                    }
                    _ => {}
                },
            }
        }

        match src {
            Some(src) => out.push(Block::Figure(FigureBlock {
                id: BlockId::new(),
                src,
                alt,
                caption: {
                    let trimmed = caption.trim();
                    (!trimmed.is_empty()).then(|| trimmed.to_string())
                },
                width,
            })),
            // An image-less figure degrades to its caption text
            None => {
                if !caption.trim().is_empty() {
                    out.push(Block::Text(TextBlock::with_text(
                        TextKind::Div,
                        caption.trim(),
                    )));
                }
            }
        }
    }

    /// Flat decoded text up to a close tag, marks stripped
    fn collect_text_until(&mut self, close: &str) -> String {
        let mut text = String::new();
        loop {
            let Some(token) = self.next_token() else {
                break;
            };
            match token {
                Token::Text(raw) => {
                    text.push_str(&html_escape::decode_html_entities(raw));
                }
                Token::Tag(tag) if tag.closing && tag.name == close => break,
                Token::Tag(_) | Token::Skip => {}
            }
        }
        collapse_whitespace(&text)
    }

    /// Inline reader: walks text and mark tags until one of the
    /// terminator close tags, a block boundary, or end of input.
    /// Returns break-separated segments of runs.
    fn parse_inline(&mut self, terminators: &[&str]) -> Vec<Vec<Run>> {
        let mut inline = InlineBuilder::new();
        loop {
            let saved = self.cur.clone();
            let Some(token) = self.next_token() else {
                break;
            };
            match token {
                Token::Skip => {}
                Token::Text(raw) => inline.text(&html_escape::decode_html_entities(raw)),
                Token::Tag(tag) if tag.closing => {
                    if terminators.contains(&tag.name.as_str()) {
                        break;
                    }
                    if is_mark_tag(&tag.name) {
                        inline.close_mark(&tag.name);
                    } else if is_block_tag(&tag.name) {
                        // A structural close we do not own ends the block;
                        // the enclosing parser consumes it
                        self.cur = saved;
                        break;
                    }
                    // Unknown close tags dissolve
                }
                Token::Tag(tag) => {
                    if tag.name == "br" {
                        inline.line_break();
                    } else if is_mark_tag(&tag.name) {
                        inline.open_mark(&tag);
                    } else if is_block_tag(&tag.name) {
                        self.cur = saved;
                        break;
                    }
                    // Unknown open tags dissolve
                }
            }
        }
        inline.finish()
    }
}

fn figure_from_img(tag: &ScannedTag) -> Block {
    Block::Figure(FigureBlock {
        id: BlockId::new(),
        src: tag.attr("src").unwrap_or_default().to_string(),
        alt: tag.attr("alt").unwrap_or_default().to_string(),
        caption: None,
        width: img_width(tag),
    })
}

fn img_width(tag: &ScannedTag) -> Option<f64> {
    let from_style = tag
        .attr("style")
        .and_then(|style| style_value(style, "width"))
        .and_then(parse_px);
    let width = from_style.or_else(|| tag.attr("width").and_then(parse_px))?;
    Some(width.max(MIN_IMAGE_WIDTH))
}

fn is_mark_tag(name: &str) -> bool {
    matches!(name, "b" | "strong" | "i" | "em" | "u" | "a")
}

fn is_block_tag(name: &str) -> bool {
    matches!(
        name,
        "p" | "div"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "ul"
            | "ol"
            | "li"
            | "blockquote"
            | "figure"
            | "figcaption"
            | "img"
    )
}

/// Mark families: `strong` folds into `b`, `em` into `i`
fn mark_family(name: &str) -> &'static str {
    match name {
        "b" | "strong" => "b",
        "i" | "em" => "i",
        "u" => "u",
        _ => "a",
    }
}

/// Merge break-separated segments back into one run sequence with
/// single spaces at the seams
fn join_segments(segments: Vec<Vec<Run>>) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for (i, segment) in segments.into_iter().enumerate() {
        if i > 0 && !runs.is_empty() && !segment.is_empty() {
            runs.push(Run::plain(" "));
        }
        runs.extend(segment);
    }
    runs
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

// ---------------------------------------------------------------------
// Inline state
// ---------------------------------------------------------------------

/// Accumulates runs under a stack of open mark tags
struct InlineBuilder {
    segments: Vec<Vec<Run>>,
    runs: Vec<Run>,
    pending: String,
    marks: MarkSet,
    /// Open mark tags with the mark set to restore when each closes
    stack: Vec<(&'static str, MarkSet)>,
}

impl InlineBuilder {
    fn new() -> Self {
        Self {
            segments: Vec::new(),
            runs: Vec::new(),
            pending: String::new(),
            marks: MarkSet::plain(),
            stack: Vec::new(),
        }
    }

    fn text(&mut self, decoded: &str) {
        self.pending.push_str(&collapse_whitespace(decoded));
    }

    fn flush_text(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.pending);
        self.runs.push(Run::marked(&text, self.marks.clone()));
    }

    fn open_mark(&mut self, tag: &ScannedTag) {
        self.flush_text();
        let family = mark_family(&tag.name);
        self.stack.push((family, self.marks.clone()));
        match family {
            "b" => self.marks.bold = true,
            "i" => self.marks.italic = true,
            "u" => self.marks.underline = true,
            _ => self.marks.link = Some(tag.attr("href").unwrap_or_default().to_string()),
        }
    }

    fn close_mark(&mut self, name: &str) {
        let family = mark_family(name);
        let Some(position) = self.stack.iter().rposition(|(f, _)| *f == family) else {
            return; // close without open, ignore
        };
        self.flush_text();
        // Marks opened after the one being closed are abandoned with it
        let (_, restored) = self.stack[position].clone();
        self.stack.truncate(position);
        self.marks = restored;
    }

    fn line_break(&mut self) {
        self.flush_text();
        self.segments.push(std::mem::take(&mut self.runs));
    }

    fn finish(mut self) -> Vec<Vec<Run>> {
        self.flush_text();
        let last = std::mem::take(&mut self.runs);
        let trailing_filler = last.is_empty() && !self.segments.is_empty();
        if !trailing_filler {
            self.segments.push(last);
        }
        for segment in &mut self.segments {
            trim_segment(segment);
        }
        self.segments
    }
}

/// Strip the whitespace HTML pretty-printing leaves at block edges
fn trim_segment(runs: &mut Vec<Run>) {
    if let Some(first) = runs.first_mut() {
        first.text = first.text.trim_start().to_string();
    }
    if let Some(last) = runs.last_mut() {
        last.text = last.text.trim_end().to_string();
    }
    runs.retain(|r| !r.text.is_empty());
}
