//! Derives the toolbar-facing format state from the current selection.

use std::ops::Range;

use crate::editing::document::{
    Alignment, BlockId, Caret, Document, ListKind, MarkSet, Selection, TextKind,
};

/// Active formatting at the current selection
///
/// Ephemeral and derived; never persisted. Hosts recompute it after
/// every selection change and after every applied command to keep
/// toolbar toggles in sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Heading level of the block at the selection start, when it is one
    pub heading: Option<u8>,
    pub quote: bool,
    pub list: Option<ListKind>,
    pub align: Alignment,
}

/// Compute the format state for a selection
///
/// Block-level context comes from the block holding the selection
/// start. An inline mark is active only when every selected char
/// carries it; at a collapsed caret it comes from the preceding char,
/// with pending marks taking precedence. A missing or stale selection
/// reports everything inactive.
pub(crate) fn derive(
    doc: &Document,
    selection: Option<&Selection>,
    pending: Option<&MarkSet>,
) -> FormatState {
    let Some(selection) = selection else {
        return FormatState::default();
    };
    let Some((start, end)) = selection.normalized(doc) else {
        return FormatState::default();
    };

    let mut state = FormatState::default();
    if let Some(block) = doc.text_block(start.block) {
        state.align = block.align;
        match block.kind {
            TextKind::Heading { level } => state.heading = Some(level),
            TextKind::Quote => state.quote = true,
            TextKind::ListItem { kind } => state.list = Some(kind),
            TextKind::Paragraph | TextKind::Div => {}
        }
    }

    if start == end {
        let marks = match pending {
            Some(pending) => pending.clone(),
            None => doc
                .text_block(start.block)
                .map(|block| block.marks_at(start.offset))
                .unwrap_or_default(),
        };
        state.bold = marks.bold;
        state.italic = marks.italic;
        state.underline = marks.underline;
    } else {
        state.bold = selection_fully_marked(doc, start, end, &|m| m.bold);
        state.italic = selection_fully_marked(doc, start, end, &|m| m.italic);
        state.underline = selection_fully_marked(doc, start, end, &|m| m.underline);
    }
    state
}

/// The char range each text block contributes to a normalized selection,
/// in document order. Figures hold no chars and are skipped.
pub(crate) fn covered_ranges(
    doc: &Document,
    start: Caret,
    end: Caret,
) -> Vec<(BlockId, Range<usize>)> {
    let (Some(first), Some(last)) = (doc.index_of(start.block), doc.index_of(end.block)) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for index in first..=last {
        let Some(text) = doc.blocks()[index].as_text() else {
            continue;
        };
        let from = if index == first { start.offset } else { 0 };
        let to = if index == last {
            end.offset
        } else {
            text.char_len()
        };
        out.push((text.id, from..to));
    }
    out
}

/// True when the selection covers at least one char and every covered
/// char satisfies the predicate
pub(crate) fn selection_fully_marked(
    doc: &Document,
    start: Caret,
    end: Caret,
    pred: &dyn Fn(&MarkSet) -> bool,
) -> bool {
    let mut any = false;
    for (id, range) in covered_ranges(doc, start, end) {
        if range.is_empty() {
            continue;
        }
        let Some(block) = doc.text_block(id) else {
            continue;
        };
        any = true;
        if !block.range_fully_marked(range, pred) {
            return false;
        }
    }
    any
}
