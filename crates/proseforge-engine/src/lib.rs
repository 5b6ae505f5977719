pub mod editing;
pub mod html;
pub mod models;
pub mod surface;

// Re-export key types for easier usage
pub use editing::{commands::*, document::*, figure::*, format::*, patch::*};
pub use html::*;
pub use models::*;
pub use surface::*;
