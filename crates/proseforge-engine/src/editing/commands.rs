//! Toolbar and text-editing commands over the editor state.
//!
//! Every document mutation flows through [`apply`]: one command in, one
//! bool out saying whether the document changed. The surface wraps this
//! with version bumping and change emission, so nothing here touches the
//! version counter itself.

use crate::editing::document::{
    Alignment, Block, BlockId, Caret, Document, ListKind, MarkSet, Selection, TextBlock, TextKind,
};
use crate::editing::figure::{DragState, FigureBlock, MIN_IMAGE_WIDTH};
use crate::editing::format;
use crate::editing::paste;
use crate::models::ImageAsset;
use crate::surface::Editor;

/// An editing command
///
/// Commands are plain data so hosts can construct them from toolbar
/// clicks and key events alike, and log or replay them if they want to.
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    /// Insert text at the caret, replacing any active selection
    InsertText { text: String },
    /// Split the current block at the caret
    InsertParagraph,
    /// Backspace: selected figure first, adjacent figure second, text last
    DeleteBackward,
    /// Forward delete, the mirror of [`Cmd::DeleteBackward`]
    DeleteForward,
    /// Insert clipboard plain text, one block per non-blank line
    Paste { text: String },
    ToggleBold,
    ToggleItalic,
    ToggleUnderline,
    /// Make covered blocks items of this list kind, or unwrap them back to
    /// paragraphs when they all already are
    ToggleList { kind: ListKind },
    /// Retag covered blocks as headings; levels outside 1..=3 are rejected
    SetHeading { level: u8 },
    /// Reset covered blocks to plain paragraphs
    SetParagraph,
    SetAlignment { align: Alignment },
    /// Link the selected text to `href`; empty strings are honored
    InsertLink { href: String },
    /// Insert an image figure at the caret
    InsertImage { asset: ImageAsset },
    SelectAll,
    /// Select a figure exclusively, dropping any text selection
    SelectFigure { id: BlockId },
    /// Remove a figure by id; unknown ids are ignored
    RemoveFigure { id: BlockId },
    /// Commit a figure width in pixels
    ResizeFigure { id: BlockId, width: f64 },
}

/// Apply one command to the editor state
///
/// Returns true when the document changed. Selection-only commands and
/// no-ops return false so the caller can skip emission.
pub(crate) fn apply(ed: &mut Editor, cmd: &Cmd) -> bool {
    match cmd {
        Cmd::InsertText { text } => insert_text(ed, text),
        Cmd::InsertParagraph => insert_paragraph(ed),
        Cmd::DeleteBackward => delete_backward(ed),
        Cmd::DeleteForward => delete_forward(ed),
        Cmd::Paste { text } => paste_text(ed, text),
        Cmd::ToggleBold => toggle_mark(ed, &|m| m.bold, &|m, on| m.bold = on),
        Cmd::ToggleItalic => toggle_mark(ed, &|m| m.italic, &|m, on| m.italic = on),
        Cmd::ToggleUnderline => toggle_mark(ed, &|m| m.underline, &|m, on| m.underline = on),
        Cmd::ToggleList { kind } => toggle_list(ed, *kind),
        Cmd::SetHeading { level } => set_heading(ed, *level),
        Cmd::SetParagraph => set_kind(ed, TextKind::Paragraph),
        Cmd::SetAlignment { align } => set_alignment(ed, *align),
        Cmd::InsertLink { href } => insert_link(ed, href),
        Cmd::InsertImage { asset } => insert_image(ed, asset),
        Cmd::SelectAll => select_all(ed),
        Cmd::SelectFigure { id } => select_figure(ed, *id),
        Cmd::RemoveFigure { id } => remove_figure(ed, *id),
        Cmd::ResizeFigure { id, width } => resize_figure(ed, *id, *width),
    }
}

/// The normalized text selection, when one is active and both ends still
/// point at text blocks
fn text_selection(ed: &Editor) -> Option<(Caret, Caret)> {
    let selection = ed.selection.as_ref()?;
    let (start, end) = selection.normalized(&ed.doc)?;
    ed.doc.text_block(start.block)?;
    ed.doc.text_block(end.block)?;
    Some((start, end))
}

fn set_caret(ed: &mut Editor, caret: Caret) {
    ed.selection = Some(Selection::caret(caret));
}

/// Delete the chars a non-collapsed selection covers. Blocks strictly
/// inside the range vanish (figures included) and the end blocks merge.
/// Returns the collapsed caret.
fn delete_selected_range(ed: &mut Editor, start: Caret, end: Caret) -> Caret {
    if start.block == end.block {
        if let Some(block) = ed.doc.text_block_mut(start.block) {
            block.delete_range(start.offset..end.offset);
        }
        return start;
    }

    let (Some(first), Some(last)) = (ed.doc.index_of(start.block), ed.doc.index_of(end.block))
    else {
        return start;
    };
    let tail = match ed.doc.text_block(end.block) {
        Some(block) => block.split_runs_at(end.offset).1,
        None => Vec::new(),
    };
    ed.doc.blocks.drain(first + 1..=last);
    if let Some(block) = ed.doc.text_block_mut(start.block) {
        let head = block.split_runs_at(start.offset).0;
        block.runs = head;
        block.runs.extend(tail);
        block.normalize();
    }
    start
}

// ---------------------------------------------------------------------
// Text editing
// ---------------------------------------------------------------------

fn insert_text(ed: &mut Editor, text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let Some((start, end)) = text_selection(ed) else {
        return false;
    };
    let caret = if start == end {
        start
    } else {
        delete_selected_range(ed, start, end)
    };

    // Pending marks from a collapsed toggle are consumed by exactly one
    // insertion; otherwise the insertion picks up its surroundings
    let marks = match ed.pending_marks.take() {
        Some(marks) => marks,
        None => match ed.doc.text_block(caret.block) {
            Some(block) => block.marks_at(caret.offset),
            None => MarkSet::plain(),
        },
    };

    let inserted = text.chars().count();
    let Some(block) = ed.doc.text_block_mut(caret.block) else {
        return false;
    };
    block.insert_text(caret.offset, text, marks);
    set_caret(ed, Caret::new(caret.block, caret.offset + inserted));
    true
}

fn insert_paragraph(ed: &mut Editor) -> bool {
    let Some((start, end)) = text_selection(ed) else {
        return false;
    };
    let caret = if start == end {
        start
    } else {
        delete_selected_range(ed, start, end)
    };
    let Some(index) = ed.doc.index_of(caret.block) else {
        return false;
    };
    let Some(block) = ed.doc.text_block_mut(caret.block) else {
        return false;
    };

    // Enter on an empty list item steps out of the list
    if matches!(block.kind, TextKind::ListItem { .. }) && block.is_empty() {
        block.kind = TextKind::Paragraph;
        set_caret(ed, Caret::new(caret.block, 0));
        return true;
    }

    let at_end = caret.offset >= block.char_len();
    let (head, tail) = block.split_runs_at(caret.offset);
    // Typing past a heading lands in a paragraph; splitting one mid-text
    // leaves a heading on both sides
    let tail_kind = match block.kind {
        TextKind::Heading { .. } if at_end => TextKind::Paragraph,
        kind => kind,
    };
    let align = block.align;
    block.runs = head;
    block.normalize();

    let mut rest = TextBlock::empty(tail_kind);
    rest.align = align;
    rest.runs = tail;
    rest.normalize();
    let rest_id = rest.id;
    ed.doc.insert_block(index + 1, Block::Text(rest));
    set_caret(ed, Caret::new(rest_id, 0));
    true
}

fn delete_backward(ed: &mut Editor) -> bool {
    if let Some(id) = ed.selected_figure.take() {
        return remove_figure(ed, id);
    }
    let Some((start, end)) = text_selection(ed) else {
        return false;
    };
    if start != end {
        let caret = delete_selected_range(ed, start, end);
        set_caret(ed, caret);
        return true;
    }

    let caret = start;
    if caret.offset > 0 {
        if let Some(block) = ed.doc.text_block_mut(caret.block) {
            block.delete_range(caret.offset - 1..caret.offset);
        }
        set_caret(ed, Caret::new(caret.block, caret.offset - 1));
        return true;
    }

    // Caret at block start: the previous block takes the hit
    let Some(index) = ed.doc.index_of(caret.block) else {
        return false;
    };
    if index == 0 {
        return false;
    }
    if ed.doc.blocks[index - 1].is_figure() {
        let id = ed.doc.blocks[index - 1].id();
        return remove_figure(ed, id);
    }
    merge_into_previous(ed, index)
}

fn delete_forward(ed: &mut Editor) -> bool {
    if let Some(id) = ed.selected_figure.take() {
        return remove_figure(ed, id);
    }
    let Some((start, end)) = text_selection(ed) else {
        return false;
    };
    if start != end {
        let caret = delete_selected_range(ed, start, end);
        set_caret(ed, caret);
        return true;
    }

    let caret = start;
    let Some(len) = ed.doc.text_block(caret.block).map(TextBlock::char_len) else {
        return false;
    };
    if caret.offset < len {
        if let Some(block) = ed.doc.text_block_mut(caret.block) {
            block.delete_range(caret.offset..caret.offset + 1);
        }
        set_caret(ed, caret);
        return true;
    }

    let Some(index) = ed.doc.index_of(caret.block) else {
        return false;
    };
    if index + 1 >= ed.doc.blocks.len() {
        return false;
    }
    if ed.doc.blocks[index + 1].is_figure() {
        let id = ed.doc.blocks[index + 1].id();
        if remove_figure(ed, id) {
            set_caret(ed, caret);
            return true;
        }
        return false;
    }
    merge_into_previous(ed, index + 1)
}

/// Merge the text block at `index` into the text block before it.
/// The caret lands at the seam.
fn merge_into_previous(ed: &mut Editor, index: usize) -> bool {
    if index == 0 || ed.doc.blocks[index - 1].as_text().is_none() {
        return false;
    }
    let current_id = ed.doc.blocks[index].id();
    let moved = match ed.doc.text_block_mut(current_id) {
        Some(block) => std::mem::take(&mut block.runs),
        None => return false,
    };
    let target = ed.doc.blocks[index - 1].id();
    let Some(prev) = ed.doc.text_block_mut(target) else {
        return false;
    };
    let at = prev.char_len();
    prev.runs.extend(moved);
    prev.normalize();
    ed.doc.remove_block(current_id);
    set_caret(ed, Caret::new(target, at));
    true
}

// ---------------------------------------------------------------------
// Inline marks
// ---------------------------------------------------------------------

fn toggle_mark(
    ed: &mut Editor,
    get: &dyn Fn(&MarkSet) -> bool,
    set: &dyn Fn(&mut MarkSet, bool),
) -> bool {
    let Some((start, end)) = text_selection(ed) else {
        return false;
    };

    if start == end {
        // Collapsed caret: flip the mark on the pending set the next
        // insertion will consume. The document itself is untouched.
        let mut marks = match ed.pending_marks.take() {
            Some(marks) => marks,
            None => ed
                .doc
                .text_block(start.block)
                .map(|block| block.marks_at(start.offset))
                .unwrap_or_default(),
        };
        let active = get(&marks);
        set(&mut marks, !active);
        ed.pending_marks = Some(marks);
        return false;
    }

    // Remove only when the whole selection already carries the mark
    let all = format::selection_fully_marked(&ed.doc, start, end, get);
    let mut changed = false;
    for (id, range) in format::covered_ranges(&ed.doc, start, end) {
        if range.is_empty() {
            continue;
        }
        if let Some(block) = ed.doc.text_block_mut(id) {
            block.update_marks(range, |marks| set(marks, !all));
            changed = true;
        }
    }
    changed
}

fn insert_link(ed: &mut Editor, href: &str) -> bool {
    let Some((start, end)) = text_selection(ed) else {
        return false;
    };
    if start == end {
        return false;
    }
    let mut changed = false;
    for (id, range) in format::covered_ranges(&ed.doc, start, end) {
        if range.is_empty() {
            continue;
        }
        if let Some(block) = ed.doc.text_block_mut(id) {
            block.update_marks(range, |marks| marks.link = Some(href.to_string()));
            changed = true;
        }
    }
    changed
}

// ---------------------------------------------------------------------
// Block commands
// ---------------------------------------------------------------------

/// Text blocks the selection touches, for block-level retagging
fn covered_block_ids(ed: &Editor) -> Vec<BlockId> {
    let Some((start, end)) = text_selection(ed) else {
        return Vec::new();
    };
    let (Some(first), Some(last)) = (ed.doc.index_of(start.block), ed.doc.index_of(end.block))
    else {
        return Vec::new();
    };
    ed.doc.blocks[first..=last]
        .iter()
        .filter_map(|block| block.as_text().map(|text| text.id))
        .collect()
}

fn set_kind(ed: &mut Editor, kind: TextKind) -> bool {
    let mut changed = false;
    for id in covered_block_ids(ed) {
        if let Some(block) = ed.doc.text_block_mut(id)
            && block.kind != kind
        {
            block.kind = kind;
            changed = true;
        }
    }
    changed
}

fn set_heading(ed: &mut Editor, level: u8) -> bool {
    if !(1..=3).contains(&level) {
        return false;
    }
    set_kind(ed, TextKind::Heading { level })
}

fn set_alignment(ed: &mut Editor, align: Alignment) -> bool {
    let mut changed = false;
    for id in covered_block_ids(ed) {
        if let Some(block) = ed.doc.text_block_mut(id)
            && block.align != align
        {
            block.align = align;
            changed = true;
        }
    }
    changed
}

fn toggle_list(ed: &mut Editor, kind: ListKind) -> bool {
    let ids = covered_block_ids(ed);
    if ids.is_empty() {
        return false;
    }
    let all_items = ids.iter().all(|&id| {
        ed.doc
            .text_block(id)
            .is_some_and(|block| block.kind == TextKind::ListItem { kind })
    });
    let target = if all_items {
        TextKind::Paragraph
    } else {
        TextKind::ListItem { kind }
    };
    let mut changed = false;
    for id in ids {
        if let Some(block) = ed.doc.text_block_mut(id)
            && block.kind != target
        {
            block.kind = target;
            changed = true;
        }
    }
    changed
}

// ---------------------------------------------------------------------
// Paste
// ---------------------------------------------------------------------

fn paste_text(ed: &mut Editor, text: &str) -> bool {
    let pasted = paste::blocks_from_plain_text(text);
    if pasted.is_empty() {
        return false;
    }
    let Some((start, end)) = text_selection(ed) else {
        return false;
    };
    let caret = if start == end {
        start
    } else {
        delete_selected_range(ed, start, end)
    };

    let Some(index) = ed.doc.index_of(caret.block) else {
        return false;
    };
    let (target_empty, len) = match ed.doc.text_block(caret.block) {
        Some(block) => (block.is_empty(), block.char_len()),
        None => return false,
    };

    let mut insert_at = if target_empty {
        // Pasting over an empty block replaces it outright
        ed.doc.blocks.remove(index);
        index
    } else if caret.offset == 0 {
        index
    } else if caret.offset >= len {
        index + 1
    } else {
        // Split the target; pasted blocks slide in between the halves
        let Some(block) = ed.doc.text_block_mut(caret.block) else {
            return false;
        };
        let (head, tail) = block.split_runs_at(caret.offset);
        let kind = block.kind;
        let align = block.align;
        block.runs = head;
        block.normalize();
        let mut rest = TextBlock::empty(kind);
        rest.align = align;
        rest.runs = tail;
        rest.normalize();
        ed.doc.insert_block(index + 1, Block::Text(rest));
        index + 1
    };

    let mut last_caret = caret;
    for block in pasted {
        last_caret = Caret::new(block.id, block.char_len());
        ed.doc.insert_block(insert_at, Block::Text(block));
        insert_at += 1;
    }
    set_caret(ed, last_caret);
    true
}

// ---------------------------------------------------------------------
// Figures
// ---------------------------------------------------------------------

fn insert_image(ed: &mut Editor, asset: &ImageAsset) -> bool {
    let figure = Block::Figure(FigureBlock::from_asset(asset));
    let trailing = TextBlock::empty(TextKind::Paragraph);
    let trailing_id = trailing.id;

    let at = match text_selection(ed) {
        Some((start, end)) => {
            let caret = if start == end {
                start
            } else {
                delete_selected_range(ed, start, end)
            };
            let Some(index) = ed.doc.index_of(caret.block) else {
                return false;
            };
            let len = ed
                .doc
                .text_block(caret.block)
                .map(TextBlock::char_len)
                .unwrap_or(0);
            if caret.offset == 0 {
                index
            } else if caret.offset >= len {
                index + 1
            } else {
                // Mid-block: split and slide the figure in between
                let Some(block) = ed.doc.text_block_mut(caret.block) else {
                    return false;
                };
                let (head, tail) = block.split_runs_at(caret.offset);
                let kind = block.kind;
                let align = block.align;
                block.runs = head;
                block.normalize();
                let mut rest = TextBlock::empty(kind);
                rest.align = align;
                rest.runs = tail;
                rest.normalize();
                ed.doc.insert_block(index + 1, Block::Text(rest));
                index + 1
            }
        }
        // No caret anywhere: the figure lands at the end of the document
        None => ed.doc.blocks.len(),
    };

    // A fresh empty paragraph always follows the figure so the caret has
    // somewhere to continue typing
    ed.doc.insert_block(at, figure);
    ed.doc.insert_block(at + 1, Block::Text(trailing));
    ed.selected_figure = None;
    set_caret(ed, Caret::new(trailing_id, 0));
    true
}

fn remove_figure(ed: &mut Editor, id: BlockId) -> bool {
    let Some(index) = ed.doc.index_of(id) else {
        // Unknown or already removed; removal stays idempotent
        if ed.selected_figure == Some(id) {
            ed.selected_figure = None;
        }
        return false;
    };
    if !ed.doc.blocks[index].is_figure() {
        return false;
    }
    ed.doc.blocks.remove(index);
    if ed.selected_figure == Some(id) {
        ed.selected_figure = None;
    }
    if let DragState::Resizing { figure, .. } = ed.drag
        && figure == id
    {
        ed.drag = DragState::Idle;
    }
    ed.doc.ensure_not_empty();
    if let Some(caret) = caret_near(&ed.doc, index) {
        set_caret(ed, caret);
    }
    true
}

/// A caret adjacent to a removal site: the start of the next text block,
/// or the end of the nearest one before it
fn caret_near(doc: &Document, index: usize) -> Option<Caret> {
    let index = index.min(doc.blocks().len());
    for block in &doc.blocks()[index..] {
        if let Some(text) = block.as_text() {
            return Some(Caret::new(text.id, 0));
        }
    }
    for block in doc.blocks()[..index].iter().rev() {
        if let Some(text) = block.as_text() {
            return Some(Caret::new(text.id, text.char_len()));
        }
    }
    None
}

fn resize_figure(ed: &mut Editor, id: BlockId, width: f64) -> bool {
    let Some(Block::Figure(figure)) = ed.doc.block_mut(id) else {
        return false;
    };
    let width = width.max(MIN_IMAGE_WIDTH);
    if figure.width == Some(width) {
        return false;
    }
    figure.width = Some(width);
    true
}

// ---------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------

fn select_all(ed: &mut Editor) -> bool {
    let Some(first) = ed.doc.first_text_block() else {
        return false;
    };
    let Some(last) = ed.doc.last_text_block() else {
        return false;
    };
    ed.selection = Some(Selection::new(
        Caret::new(first.id, 0),
        Caret::new(last.id, last.char_len()),
    ));
    ed.selected_figure = None;
    false
}

/// Exclusive figure selection; selection-only, so never a change
fn select_figure(ed: &mut Editor, id: BlockId) -> bool {
    if !ed.doc.block(id).is_some_and(Block::is_figure) {
        return false;
    }
    ed.selected_figure = Some(id);
    ed.selection = None;
    ed.pending_marks = None;
    false
}
