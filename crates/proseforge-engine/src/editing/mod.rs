/*!
 * # Editing Core Module
 *
 * The command-based editing core behind the article surface.
 *
 * ## Architecture Overview
 *
 * ### 1. Single Source of Truth: the Block Tree
 * - The whole article lives in one `Document`: a flat sequence of
 *   tagged blocks (text blocks and image figures)
 * - Inline formatting is part of the data (`Run`s with mark sets),
 *   never a styling concern; HTML exists only at the `html` boundary
 * - A version counter increments once per applied command so hosts can
 *   cheaply detect staleness
 *
 * ### 2. Command-Based Editing
 * - All edits are **Commands** (`Cmd` enum) applied through one
 *   interpreter; there is no second mutation path
 * - Commands are plain data, so hosts can construct them from toolbar
 *   clicks and key events alike
 * - Each application reports whether the document changed, which drives
 *   change emission and keeps no-ops silent
 *
 * ### 3. Stable Block IDs
 * - Every block carries a `BlockId` assigned at creation and preserved
 *   across edits
 * - Selections, figure selection and resize sessions reference blocks
 *   by id, never by index, so they survive structural edits
 *
 * ### 4. Derived, Never Stored
 * - Toolbar state (`FormatState`) is recomputed from the selection on
 *   demand and never persisted
 * - Word count and reading time are derived from the tree at emission
 *   time
 *
 * ## Module Structure
 *
 * - **`document`**: the block tree, runs, marks, selection primitives
 * - **`commands`**: the `Cmd` enum and the command interpreter
 * - **`figure`**: image figure blocks, captions, drag-resize math
 * - **`format`**: format state derivation over selections
 * - **`paste`**: clipboard plain-text normalization into blocks
 * - **`patch`**: the change summary emitted after each mutation
 *
 * ## Usage Pattern
 *
 * ```rust
 * use proseforge_engine::{Cmd, Editor};
 *
 * // 1. Seed from persisted HTML; the caret lands at the start
 * let mut editor = Editor::from_html("<p>world</p>").unwrap();
 *
 * // 2. Apply edits via commands
 * let summary = editor
 *     .apply(&Cmd::InsertText { text: "Hello, ".to_string() })
 *     .unwrap();
 *
 * // 3. Persist the emitted form
 * assert_eq!(summary.html, "<p>Hello, world</p>");
 * assert_eq!(summary.word_count, 2);
 * ```
 */

pub mod commands;
pub mod document;
pub mod figure;
pub mod format;
pub mod paste;
pub mod patch;

pub use commands::Cmd;
pub use document::{
    Alignment, Block, BlockId, Caret, Document, ListKind, MarkSet, Run, Selection, TextBlock,
    TextKind,
};
pub use figure::{DragState, FigureBlock, MIN_IMAGE_WIDTH};
pub use format::FormatState;
pub use patch::ChangeSummary;
