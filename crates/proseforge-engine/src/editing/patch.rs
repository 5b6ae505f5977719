/// Result of a mutating operation, handed outward after every
/// user-visible change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSummary {
    /// Serialized document markup
    pub html: String,
    /// Whitespace-delimited token count of the tag-free text
    pub word_count: usize,
    /// Estimated reading time in whole minutes, rounded up
    pub reading_time_mins: usize,
    /// Document version after the change
    pub version: u64,
}
