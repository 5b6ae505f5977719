use std::collections::HashSet;
use std::ops::Range;

use uuid::Uuid;

use crate::editing::figure::{FigureBlock, MIN_IMAGE_WIDTH};

/// Stable identifier for a block that survives edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(Uuid);

impl BlockId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Inline formatting carried by a run of text
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkSet {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Link target; an empty href is still a link
    pub link: Option<String>,
}

impl MarkSet {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn is_plain(&self) -> bool {
        !self.bold && !self.italic && !self.underline && self.link.is_none()
    }
}

/// A maximal span of text sharing one mark set
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub marks: MarkSet,
}

impl Run {
    pub fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            marks: MarkSet::plain(),
        }
    }

    pub fn marked(text: &str, marks: MarkSet) -> Self {
        Self {
            text: text.to_string(),
            marks,
        }
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Horizontal alignment of a text block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Flavor of a list item block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Unordered,
    Ordered,
}

/// Structural kind of a text block
///
/// List items are stored flat: each item is its own block, and the
/// serializer wraps consecutive items of the same kind in one list
/// element. `Paragraph` and `Div` behave identically during editing and
/// differ only in the tag they serialize to; pasted lines become `Div`
/// blocks while authored paragraphs stay `Paragraph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Paragraph,
    Div,
    Heading { level: u8 },
    Quote,
    ListItem { kind: ListKind },
}

/// A block holding inline-formatted text
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub id: BlockId,
    pub kind: TextKind,
    pub align: Alignment,
    pub runs: Vec<Run>,
}

impl TextBlock {
    pub fn empty(kind: TextKind) -> Self {
        Self {
            id: BlockId::new(),
            kind,
            align: Alignment::default(),
            runs: Vec::new(),
        }
    }

    pub fn with_text(kind: TextKind, text: &str) -> Self {
        let mut block = Self::empty(kind);
        if !text.is_empty() {
            block.runs.push(Run::plain(text));
        }
        block
    }

    /// Concatenated text of all runs
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Length in characters (offsets into a block are char offsets)
    pub fn char_len(&self) -> usize {
        self.runs.iter().map(Run::char_len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.is_empty())
    }

    /// Drop empty runs and merge neighbours that share a mark set
    pub fn normalize(&mut self) {
        let mut merged: Vec<Run> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            if run.text.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(prev) if prev.marks == run.marks => prev.text.push_str(&run.text),
                _ => merged.push(run),
            }
        }
        self.runs = merged;
    }

    /// Split the run sequence at a char offset, cutting the straddling run
    pub fn split_runs_at(&self, offset: usize) -> (Vec<Run>, Vec<Run>) {
        split_runs(&self.runs, offset)
    }

    /// Insert text at a char offset with the given marks
    pub fn insert_text(&mut self, offset: usize, text: &str, marks: MarkSet) {
        let (mut runs, after) = self.split_runs_at(offset);
        runs.push(Run::marked(text, marks));
        runs.extend(after);
        self.runs = runs;
        self.normalize();
    }

    /// Remove the chars in `range`
    pub fn delete_range(&mut self, range: Range<usize>) {
        let (runs, tail) = split_runs(&self.runs, range.end);
        let (mut head, _) = split_runs(&runs, range.start);
        head.extend(tail);
        self.runs = head;
        self.normalize();
    }

    /// Rewrite the marks of every char in `range`
    pub fn update_marks(&mut self, range: Range<usize>, update: impl Fn(&mut MarkSet)) {
        let (covered, tail) = split_runs(&self.runs, range.end);
        let (mut runs, mut middle) = split_runs(&covered, range.start);
        for run in &mut middle {
            update(&mut run.marks);
        }
        runs.extend(middle);
        runs.extend(tail);
        self.runs = runs;
        self.normalize();
    }

    /// Marks in effect at a collapsed caret: those of the char before the
    /// offset, or of the first char when the caret sits at the block start
    pub fn marks_at(&self, offset: usize) -> MarkSet {
        if self.runs.is_empty() {
            return MarkSet::plain();
        }
        let target = if offset == 0 { 0 } else { offset - 1 };
        let mut seen = 0;
        for run in &self.runs {
            let len = run.char_len();
            if target < seen + len {
                return run.marks.clone();
            }
            seen += len;
        }
        self.runs[self.runs.len() - 1].marks.clone()
    }

    /// True when `range` covers at least one char and every covered char
    /// satisfies the predicate
    pub fn range_fully_marked(&self, range: Range<usize>, pred: impl Fn(&MarkSet) -> bool) -> bool {
        if range.is_empty() {
            return false;
        }
        let mut seen = 0;
        let mut covered = false;
        for run in &self.runs {
            let start = seen;
            let end = seen + run.char_len();
            seen = end;
            if end <= range.start || start >= range.end {
                continue;
            }
            covered = true;
            if !pred(&run.marks) {
                return false;
            }
        }
        covered
    }
}

/// Split a run sequence at a char offset
fn split_runs(runs: &[Run], offset: usize) -> (Vec<Run>, Vec<Run>) {
    let mut before = Vec::new();
    let mut after = Vec::new();
    let mut seen = 0;
    for run in runs {
        let len = run.char_len();
        if seen + len <= offset {
            before.push(run.clone());
        } else if seen >= offset {
            after.push(run.clone());
        } else {
            let cut = byte_of_char(&run.text, offset - seen);
            before.push(Run::marked(&run.text[..cut], run.marks.clone()));
            after.push(Run::marked(&run.text[cut..], run.marks.clone()));
        }
        seen += len;
    }
    (before, after)
}

fn byte_of_char(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// A top-level node of the document
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Text(TextBlock),
    Figure(FigureBlock),
}

impl Block {
    pub fn id(&self) -> BlockId {
        match self {
            Block::Text(b) => b.id,
            Block::Figure(b) => b.id,
        }
    }

    pub fn as_text(&self) -> Option<&TextBlock> {
        match self {
            Block::Text(b) => Some(b),
            Block::Figure(_) => None,
        }
    }

    pub fn as_figure(&self) -> Option<&FigureBlock> {
        match self {
            Block::Text(_) => None,
            Block::Figure(b) => Some(b),
        }
    }

    pub fn is_figure(&self) -> bool {
        matches!(self, Block::Figure(_))
    }
}

/// One end of a text selection: a block and a char offset into its text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caret {
    pub block: BlockId,
    pub offset: usize,
}

impl Caret {
    pub fn new(block: BlockId, offset: usize) -> Self {
        Self { block, offset }
    }
}

/// An anchor/head pair over text blocks
///
/// `anchor` is where the selection started, `head` is where it grew to;
/// the head may sit before the anchor in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Caret,
    pub head: Caret,
}

impl Selection {
    pub fn caret(at: Caret) -> Self {
        Self {
            anchor: at,
            head: at,
        }
    }

    pub fn new(anchor: Caret, head: Caret) -> Self {
        Self { anchor, head }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    /// Order the ends by document position. Returns `None` when either end
    /// points at a block that no longer exists.
    pub fn normalized(&self, doc: &Document) -> Option<(Caret, Caret)> {
        let anchor_index = doc.index_of(self.anchor.block)?;
        let head_index = doc.index_of(self.head.block)?;
        if (anchor_index, self.anchor.offset) <= (head_index, self.head.offset) {
            Some((self.anchor, self.head))
        } else {
            Some((self.head, self.anchor))
        }
    }
}

/// The document: an ordered sequence of top-level blocks
///
/// Every element is a block-level container (paragraph, div, heading,
/// list item, quote, or image figure); bare inline content never appears
/// at the top level. The sequence is never empty: removal paths that
/// would drain it leave one empty paragraph behind so a caret always has
/// somewhere to land.
///
/// All mutation flows through the command interpreter; the version
/// counter increments once per applied command so hosts can cheaply
/// detect staleness.
pub struct Document {
    pub(crate) blocks: Vec<Block>,
    pub(crate) version: u64,
}

impl Document {
    /// An empty document: a single empty paragraph
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::Text(TextBlock::empty(TextKind::Paragraph))],
            version: 0,
        }
    }

    /// Parse a document from its serialized HTML form
    pub fn from_html(html: &str) -> Result<Self, crate::html::ReadError> {
        crate::html::read_document(html)
    }

    pub(crate) fn from_blocks(blocks: Vec<Block>) -> Self {
        let mut doc = Self { blocks, version: 0 };
        doc.ensure_not_empty();
        doc
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }

    pub fn index_of(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| b.id() == id)
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id() == id)
    }

    pub(crate) fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id() == id)
    }

    pub fn text_block(&self, id: BlockId) -> Option<&TextBlock> {
        self.block(id).and_then(Block::as_text)
    }

    pub(crate) fn text_block_mut(&mut self, id: BlockId) -> Option<&mut TextBlock> {
        match self.block_mut(id) {
            Some(Block::Text(b)) => Some(b),
            _ => None,
        }
    }

    pub fn first_text_block(&self) -> Option<&TextBlock> {
        self.blocks.iter().find_map(Block::as_text)
    }

    pub fn last_text_block(&self) -> Option<&TextBlock> {
        self.blocks.iter().rev().find_map(Block::as_text)
    }

    pub(crate) fn insert_block(&mut self, index: usize, block: Block) {
        let index = index.min(self.blocks.len());
        self.blocks.insert(index, block);
    }

    /// Remove a block by id. Removing an id that is already gone is a
    /// no-op, so deletion paths can be re-entered safely.
    pub(crate) fn remove_block(&mut self, id: BlockId) -> Option<Block> {
        let index = self.index_of(id)?;
        Some(self.blocks.remove(index))
    }

    /// Restore the never-empty guarantee after removals
    pub(crate) fn ensure_not_empty(&mut self) {
        if self.blocks.is_empty() {
            self.blocks
                .push(Block::Text(TextBlock::empty(TextKind::Paragraph)));
        }
    }

    /// Tag-free text of the whole document, captions included, with
    /// blocks joined by single spaces
    pub fn plain_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        for block in &self.blocks {
            match block {
                Block::Text(b) => parts.push(b.text()),
                Block::Figure(f) => {
                    if let Some(caption) = &f.caption {
                        parts.push(caption.clone());
                    }
                }
            }
        }
        parts.retain(|p| !p.is_empty());
        parts.join(" ")
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Document {
    fn clone(&self) -> Self {
        Self {
            blocks: self.blocks.clone(),
            version: self.version,
        }
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("blocks", &self.blocks.len())
            .field("version", &self.version)
            .finish()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.blocks == other.blocks
    }
}

/// Structural checks run after every applied command in debug builds
pub(crate) fn check_invariants(doc: &Document) {
    assert!(!doc.blocks.is_empty(), "document must keep at least one block");

    let mut ids = HashSet::new();
    for block in &doc.blocks {
        assert!(ids.insert(block.id()), "block ids must be unique");
        match block {
            Block::Text(text) => {
                for run in &text.runs {
                    assert!(!run.text.is_empty(), "normalized blocks hold no empty runs");
                }
                for pair in text.runs.windows(2) {
                    assert!(
                        pair[0].marks != pair[1].marks,
                        "adjacent runs with equal marks must be merged"
                    );
                }
                if let TextKind::Heading { level } = text.kind {
                    assert!((1..=3).contains(&level), "heading level must be 1..=3");
                }
            }
            Block::Figure(figure) => {
                if let Some(width) = figure.width {
                    assert!(width >= MIN_IMAGE_WIDTH, "figure width below minimum");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold() -> MarkSet {
        MarkSet {
            bold: true,
            ..MarkSet::plain()
        }
    }

    // ============ Run and normalize tests ============

    #[test]
    fn test_normalize_merges_equal_neighbours() {
        let mut block = TextBlock::empty(TextKind::Paragraph);
        block.runs = vec![Run::plain("Hello "), Run::plain("World")];
        block.normalize();

        assert_eq!(block.runs.len(), 1);
        assert_eq!(block.runs[0].text, "Hello World");
    }

    #[test]
    fn test_normalize_drops_empty_runs() {
        let mut block = TextBlock::empty(TextKind::Paragraph);
        block.runs = vec![Run::plain(""), Run::marked("x", bold()), Run::plain("")];
        block.normalize();

        assert_eq!(block.runs.len(), 1);
        assert_eq!(block.runs[0].text, "x");
    }

    #[test]
    fn test_normalize_keeps_distinct_marks_apart() {
        let mut block = TextBlock::empty(TextKind::Paragraph);
        block.runs = vec![Run::plain("a"), Run::marked("b", bold())];
        block.normalize();

        assert_eq!(block.runs.len(), 2);
    }

    // ============ Text editing primitive tests ============

    #[test]
    fn test_insert_text_into_empty_block() {
        let mut block = TextBlock::empty(TextKind::Paragraph);
        block.insert_text(0, "Hello", MarkSet::plain());

        assert_eq!(block.text(), "Hello");
        assert_eq!(block.char_len(), 5);
    }

    #[test]
    fn test_insert_text_mid_run_with_other_marks() {
        let mut block = TextBlock::with_text(TextKind::Paragraph, "Hello World");
        block.insert_text(5, "!", bold());

        assert_eq!(block.text(), "Hello! World");
        assert_eq!(block.runs.len(), 3);
        assert!(block.runs[1].marks.bold);
    }

    #[test]
    fn test_delete_range_within_run() {
        let mut block = TextBlock::with_text(TextKind::Paragraph, "Hello World");
        block.delete_range(5..11);

        assert_eq!(block.text(), "Hello");
    }

    #[test]
    fn test_delete_range_rejoins_marks() {
        let mut block = TextBlock::empty(TextKind::Paragraph);
        block.runs = vec![Run::plain("ab"), Run::marked("XX", bold()), Run::plain("cd")];
        block.delete_range(2..4);

        assert_eq!(block.text(), "abcd");
        assert_eq!(block.runs.len(), 1);
    }

    #[test]
    fn test_split_runs_at_char_boundary_in_multibyte_text() {
        let block = TextBlock::with_text(TextKind::Paragraph, "héllo");
        let (before, after) = block.split_runs_at(2);

        assert_eq!(before[0].text, "hé");
        assert_eq!(after[0].text, "llo");
    }

    #[test]
    fn test_update_marks_over_partial_range() {
        let mut block = TextBlock::with_text(TextKind::Paragraph, "Hello World");
        block.update_marks(0..5, |m| m.bold = true);

        assert_eq!(block.runs.len(), 2);
        assert!(block.runs[0].marks.bold);
        assert_eq!(block.runs[0].text, "Hello");
        assert!(!block.runs[1].marks.bold);
    }

    #[test]
    fn test_marks_at_start_uses_first_char() {
        let mut block = TextBlock::empty(TextKind::Paragraph);
        block.runs = vec![Run::marked("ab", bold()), Run::plain("cd")];

        assert!(block.marks_at(0).bold);
        assert!(block.marks_at(2).bold);
        assert!(!block.marks_at(3).bold);
    }

    #[test]
    fn test_range_fully_marked() {
        let mut block = TextBlock::empty(TextKind::Paragraph);
        block.runs = vec![Run::marked("ab", bold()), Run::plain("cd")];

        assert!(block.range_fully_marked(0..2, |m| m.bold));
        assert!(!block.range_fully_marked(0..4, |m| m.bold));
        assert!(!block.range_fully_marked(2..2, |m| m.bold));
    }

    // ============ Document structure tests ============

    #[test]
    fn test_new_document_holds_one_empty_paragraph() {
        let doc = Document::new();

        assert_eq!(doc.blocks().len(), 1);
        let block = doc.blocks()[0].as_text().unwrap();
        assert_eq!(block.kind, TextKind::Paragraph);
        assert!(block.is_empty());
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn test_remove_block_is_idempotent() {
        let mut doc = Document::new();
        let id = doc.blocks()[0].id();

        assert!(doc.remove_block(id).is_some());
        assert!(doc.remove_block(id).is_none());
    }

    #[test]
    fn test_ensure_not_empty_restores_a_paragraph() {
        let mut doc = Document::new();
        let id = doc.blocks()[0].id();
        doc.remove_block(id);
        doc.ensure_not_empty();

        assert_eq!(doc.blocks().len(), 1);
        assert!(doc.blocks()[0].as_text().is_some());
    }

    #[test]
    fn test_plain_text_joins_blocks_and_captions() {
        let mut doc = Document::new();
        doc.blocks = vec![
            Block::Text(TextBlock::with_text(TextKind::Paragraph, "Hello world")),
            Block::Figure(FigureBlock {
                id: BlockId::new(),
                src: "img.png".to_string(),
                alt: String::new(),
                caption: Some("A caption".to_string()),
                width: None,
            }),
            Block::Text(TextBlock::with_text(TextKind::Paragraph, "Bye")),
        ];

        assert_eq!(doc.plain_text(), "Hello world A caption Bye");
    }

    #[test]
    fn test_plain_text_skips_empty_blocks() {
        let mut doc = Document::new();
        doc.blocks = vec![
            Block::Text(TextBlock::with_text(TextKind::Paragraph, "One")),
            Block::Text(TextBlock::empty(TextKind::Paragraph)),
            Block::Text(TextBlock::with_text(TextKind::Paragraph, "Two")),
        ];

        assert_eq!(doc.plain_text(), "One Two");
    }

    // ============ Selection tests ============

    #[test]
    fn test_selection_normalized_orders_backward_selection() {
        let mut doc = Document::new();
        doc.blocks = vec![
            Block::Text(TextBlock::with_text(TextKind::Paragraph, "one")),
            Block::Text(TextBlock::with_text(TextKind::Paragraph, "two")),
        ];
        let first = doc.blocks()[0].id();
        let second = doc.blocks()[1].id();

        let selection = Selection::new(Caret::new(second, 1), Caret::new(first, 2));
        let (start, end) = selection.normalized(&doc).unwrap();

        assert_eq!(start.block, first);
        assert_eq!(end.block, second);
    }

    #[test]
    fn test_selection_normalized_rejects_stale_ids() {
        let mut doc = Document::new();
        let id = doc.blocks()[0].id();
        doc.remove_block(id);
        doc.ensure_not_empty();

        let selection = Selection::caret(Caret::new(id, 0));
        assert!(selection.normalized(&doc).is_none());
    }

    #[test]
    fn test_invariants_hold_for_new_document() {
        let doc = Document::new();
        check_invariants(&doc);
    }
}
