use serde::{Deserialize, Serialize};

/// Asset descriptor handed over by the image library collaborator
///
/// The engine consumes exactly these fields to build a figure's image and
/// caption; fetching, uploading and searching stay outside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub image_url: String,
    pub alt_text: String,
    pub description: String,
    pub source: String,
    pub formatted_caption: String,
}

/// Synchronous acquisition of a link target from the user
///
/// `None` means the user cancelled and nothing happens. An empty string
/// is a deliberate answer and still creates the link.
pub trait LinkPrompt {
    fn request_url(&self) -> Option<String>;
}
