/// Default maximum characters per translation unit
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 512;

/// Sentence delimiter used for splitting. Deliberately naive: "Mr. Smith" is
/// split, and a period without a following space is not a boundary.
const SENTENCE_DELIMITER: &str = ". ";

/// Split text into ordered translation units of at most `max_chunk_size`
/// characters.
///
/// Newlines become spaces, fragments are separated on ". " and greedily packed,
/// each re-suffixed with ". ". A single fragment longer than the limit is passed
/// through as its own unit.
pub fn split_text_into_chunks(text: &str, max_chunk_size: usize) -> Vec<String> {
    let normalized = text.replace('\n', " ");

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for sentence in normalized.split(SENTENCE_DELIMITER) {
        let sentence_len = sentence.chars().count();

        if current_len + sentence_len + SENTENCE_DELIMITER.len() > max_chunk_size && !current.is_empty() {
            chunks.push(current.trim().to_string());
            current.clear();
            current_len = 0;
        }

        current.push_str(sentence);
        current.push_str(SENTENCE_DELIMITER);
        current_len += sentence_len + SENTENCE_DELIMITER.len();
    }

    if !current.is_empty() {
        chunks.push(current.trim().to_string());
    }

    chunks
}
