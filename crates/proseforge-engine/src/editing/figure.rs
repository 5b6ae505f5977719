use crate::editing::document::BlockId;
use crate::models::ImageAsset;

/// Narrowest width a drag can shrink an embedded image to, in pixels
pub const MIN_IMAGE_WIDTH: f64 = 120.0;

/// An embedded image: one image, an optional caption, and a resize handle
/// in its rendered form
#[derive(Debug, Clone, PartialEq)]
pub struct FigureBlock {
    pub id: BlockId,
    pub src: String,
    pub alt: String,
    pub caption: Option<String>,
    /// Rendered width in pixels once a resize has committed; `None` means
    /// the host's natural sizing applies
    pub width: Option<f64>,
}

impl FigureBlock {
    /// Build a figure from an image library asset
    pub fn from_asset(asset: &ImageAsset) -> Self {
        Self {
            id: BlockId::new(),
            src: asset.image_url.clone(),
            alt: asset.alt_text.clone(),
            caption: caption_text(asset),
            width: None,
        }
    }
}

/// Caption text for an asset: description and source joined with an em
/// dash when both are present, whichever one is set otherwise, falling
/// back to the pre-formatted caption
pub(crate) fn caption_text(asset: &ImageAsset) -> Option<String> {
    let description = asset.description.trim();
    let source = asset.source.trim();
    match (description.is_empty(), source.is_empty()) {
        (false, false) => Some(format!("{description} — {source}")),
        (false, true) => Some(description.to_string()),
        (true, false) => Some(source.to_string()),
        (true, true) => {
            let formatted = asset.formatted_caption.trim();
            (!formatted.is_empty()).then(|| formatted.to_string())
        }
    }
}

/// Drag-resize session state, owned by the editor
///
/// At most one session exists at a time; a pointer-down while already
/// resizing is ignored. `max_width` is the parent container width
/// captured when the drag started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Resizing {
        figure: BlockId,
        start_x: f64,
        start_width: f64,
        max_width: f64,
    },
}

impl DragState {
    pub fn is_resizing(&self) -> bool {
        matches!(self, DragState::Resizing { .. })
    }
}

/// Width after dragging the handle by `delta` pixels, clamped to
/// `[MIN_IMAGE_WIDTH, max_width]`
pub(crate) fn resized_width(start_width: f64, delta: f64, max_width: f64) -> f64 {
    let upper = max_width.max(MIN_IMAGE_WIDTH);
    (start_width + delta).clamp(MIN_IMAGE_WIDTH, upper)
}
