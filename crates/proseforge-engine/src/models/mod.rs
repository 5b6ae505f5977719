//! Data models shared with host applications: the image library's asset
//! descriptor, the link prompt seam, and document metrics.

pub mod asset;
pub mod stats;

pub use asset::{ImageAsset, LinkPrompt};
pub use stats::{WORDS_PER_MINUTE, reading_time_mins, word_count};
