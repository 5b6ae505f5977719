//! The editing surface: the stateful façade hosts drive.
//!
//! An [`Editor`] owns the document plus the transient state around it
//! (selection, pending marks, figure selection, drag session) and turns
//! host events into commands. Hosts render from the document and the
//! serialized HTML; the engine never touches a DOM.

use crate::editing::commands::{self, Cmd};
use crate::editing::document::{Block, BlockId, Caret, Document, MarkSet, Selection};
use crate::editing::figure::{self, DragState};
use crate::editing::format::{self, FormatState};
use crate::editing::patch::ChangeSummary;
use crate::html::{self, ReadError};
use crate::models::{self, LinkPrompt};

/// Keys the surface cares about; everything else stays with the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Backspace,
    Delete,
    Enter,
    Escape,
}

/// Whether a key event was consumed by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResult {
    Handled,
    Ignored,
}

/// The headless editor
///
/// All mutation runs through [`Editor::apply`]; everything else is
/// event plumbing and read access. One instance per editing surface,
/// single-threaded.
#[derive(Debug, Clone)]
pub struct Editor {
    pub(crate) doc: Document,
    pub(crate) selection: Option<Selection>,
    /// Mark set the next insertion will use, armed by a toggle at a
    /// collapsed caret and dropped when the selection moves
    pub(crate) pending_marks: Option<MarkSet>,
    pub(crate) selected_figure: Option<BlockId>,
    pub(crate) drag: DragState,
}

impl Editor {
    /// An editor over a single empty paragraph, caret at the start
    pub fn new() -> Self {
        Self::with_document(Document::new())
    }

    /// Seed an editor from serialized HTML
    pub fn from_html(html: &str) -> Result<Self, ReadError> {
        Ok(Self::with_document(Document::from_html(html)?))
    }

    fn with_document(doc: Document) -> Self {
        let selection = doc
            .first_text_block()
            .map(|block| Selection::caret(Caret::new(block.id, 0)));
        Self {
            doc,
            selection,
            pending_marks: None,
            selected_figure: None,
            drag: DragState::Idle,
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn version(&self) -> u64 {
        self.doc.version()
    }

    /// The document in its HTML persisted form
    pub fn serialize(&self) -> String {
        html::write_document(&self.doc)
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn selected_figure(&self) -> Option<BlockId> {
        self.selected_figure
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    /// Active formatting at the current selection, for toolbar toggles
    pub fn format_state(&self) -> FormatState {
        format::derive(&self.doc, self.selection.as_ref(), self.pending_marks.as_ref())
    }

    // -----------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------

    /// Apply one command
    ///
    /// When the document changes this bumps the version and returns the
    /// change summary for the host to persist; no-ops return `None`.
    pub fn apply(&mut self, cmd: &Cmd) -> Option<ChangeSummary> {
        let changed = commands::apply(self, cmd);
        log::debug!("apply {cmd:?}: changed={changed}");
        if !changed {
            return None;
        }
        self.doc.bump_version();
        #[cfg(debug_assertions)]
        crate::editing::document::check_invariants(&self.doc);
        Some(self.emit())
    }

    /// Ask the prompt for a target and link the selection to it.
    /// Cancellation leaves the document alone; an empty answer is
    /// honored and still creates the link.
    pub fn insert_link(&mut self, prompt: &dyn LinkPrompt) -> Option<ChangeSummary> {
        let href = prompt.request_url()?;
        self.apply(&Cmd::InsertLink { href })
    }

    /// Replace the whole document from the host
    ///
    /// Input equal to the live serialization is the echo of our own
    /// emission and is dropped untouched, which keeps the host binding
    /// loop from recursing. Unreadable input is logged and dropped.
    pub fn set_content(&mut self, html: &str) -> Option<ChangeSummary> {
        if html == self.serialize() {
            return None;
        }
        let doc = match Document::from_html(html) {
            Ok(doc) => doc,
            Err(err) => {
                log::warn!("replacement content rejected: {err}");
                return None;
            }
        };
        let version = self.doc.version() + 1;
        self.doc = doc;
        self.doc.version = version;
        self.selection = None;
        self.pending_marks = None;
        self.selected_figure = None;
        self.drag = DragState::Idle;
        Some(self.emit())
    }

    fn emit(&self) -> ChangeSummary {
        let word_count = models::word_count(&self.doc);
        ChangeSummary {
            html: self.serialize(),
            word_count,
            reading_time_mins: models::reading_time_mins(word_count),
            version: self.doc.version(),
        }
    }

    // -----------------------------------------------------------------
    // Host events
    // -----------------------------------------------------------------

    /// The host's selection moved
    ///
    /// Pending marks survive only an echo of the selection they were
    /// armed at; any different value drops them. A live text selection
    /// also deselects any figure.
    pub fn on_selection_change(&mut self, selection: Option<Selection>) {
        if selection != self.selection {
            self.pending_marks = None;
        }
        if selection.is_some() {
            self.selected_figure = None;
        }
        self.selection = selection;
    }

    /// A click landed on `block` (or on none of them)
    ///
    /// Clicking a figure selects it and drops the text selection;
    /// clicking anywhere else deselects figures.
    pub fn on_click(&mut self, block: Option<BlockId>) {
        match block {
            Some(id) if self.doc.block(id).is_some_and(Block::is_figure) => {
                self.apply(&Cmd::SelectFigure { id });
            }
            _ => self.selected_figure = None,
        }
    }

    /// Route a key event. Deletion keys and Enter always belong to the
    /// engine; Escape is consumed only when it cancels a resize.
    pub fn on_keydown(&mut self, key: Key) -> (KeyResult, Option<ChangeSummary>) {
        match key {
            Key::Backspace => (KeyResult::Handled, self.apply(&Cmd::DeleteBackward)),
            Key::Delete => (KeyResult::Handled, self.apply(&Cmd::DeleteForward)),
            Key::Enter => (KeyResult::Handled, self.apply(&Cmd::InsertParagraph)),
            Key::Escape => {
                if self.cancel_resize() {
                    (KeyResult::Handled, None)
                } else {
                    (KeyResult::Ignored, None)
                }
            }
        }
    }

    // -----------------------------------------------------------------
    // Drag-resize
    // -----------------------------------------------------------------

    /// Start a resize from a pointer-down on a figure's handle
    ///
    /// `rendered_width` is the figure's current on-screen width and
    /// `container_width` the parent's, both captured by the host at the
    /// moment of the event. Returns false when a session is already
    /// running or the id is not a figure.
    pub fn pointer_down_on_handle(
        &mut self,
        figure: BlockId,
        x: f64,
        rendered_width: f64,
        container_width: f64,
    ) -> bool {
        if self.drag.is_resizing() {
            return false;
        }
        let Some(Block::Figure(_)) = self.doc.block(figure) else {
            return false;
        };
        self.drag = DragState::Resizing {
            figure,
            start_x: x,
            start_width: rendered_width,
            max_width: container_width,
        };
        true
    }

    /// The clamped width for the current pointer position, for live
    /// painting. Nothing is committed and no state changes.
    pub fn pointer_move(&self, x: f64) -> Option<f64> {
        let DragState::Resizing {
            start_x,
            start_width,
            max_width,
            ..
        } = self.drag
        else {
            return None;
        };
        Some(figure::resized_width(start_width, x - start_x, max_width))
    }

    /// Finish the resize at the release position and commit the width
    pub fn pointer_up(&mut self, x: f64) -> Option<ChangeSummary> {
        let DragState::Resizing {
            figure,
            start_x,
            start_width,
            max_width,
        } = self.drag
        else {
            return None;
        };
        self.drag = DragState::Idle;
        let width = figure::resized_width(start_width, x - start_x, max_width);
        self.apply(&Cmd::ResizeFigure { id: figure, width })
    }

    /// Abandon a running resize without committing anything
    pub fn cancel_resize(&mut self) -> bool {
        if self.drag.is_resizing() {
            self.drag = DragState::Idle;
            return true;
        }
        false
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}
