use crate::editing::Document;

/// Reading speed behind the reading time estimate, in words per minute
pub const WORDS_PER_MINUTE: usize = 225;

/// Whitespace-delimited token count of the document's tag-free text
pub fn word_count(doc: &Document) -> usize {
    doc.plain_text().split_whitespace().count()
}

/// Estimated reading time in whole minutes, rounded up; zero for an
/// empty document
pub fn reading_time_mins(word_count: usize) -> usize {
    word_count.div_ceil(WORDS_PER_MINUTE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_counts_zero_words() {
        let doc = Document::new();

        assert_eq!(word_count(&doc), 0);
        assert_eq!(reading_time_mins(0), 0);
    }

    #[test]
    fn two_word_document_reads_in_one_minute() {
        let doc = Document::from_html("<p>Hello world</p>").unwrap();

        assert_eq!(word_count(&doc), 2);
        assert_eq!(reading_time_mins(2), 1);
    }

    #[test]
    fn reading_time_rounds_up_at_the_boundary() {
        assert_eq!(reading_time_mins(225), 1);
        assert_eq!(reading_time_mins(226), 2);
        assert_eq!(reading_time_mins(450), 2);
    }

    #[test]
    fn repeated_whitespace_does_not_inflate_the_count() {
        let doc = Document::from_html("<p>one   two\tthree</p>").unwrap();

        assert_eq!(word_count(&doc), 3);
    }
}
