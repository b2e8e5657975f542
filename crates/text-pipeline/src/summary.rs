//! Extractive summary for long reviews: first sentence plus last sentence.

/// Reviews longer than this many characters get summarized
pub const SUMMARY_THRESHOLD: usize = 200;

pub fn summarize(text: &str) -> String {
    summarize_with_threshold(text, SUMMARY_THRESHOLD)
}

/// Summarize `text` if it is longer than `threshold` characters, otherwise
/// return it unchanged.
pub fn summarize_with_threshold(text: &str, threshold: usize) -> String {
    if text.chars().count() <= threshold {
        return text.to_string();
    }

    let sentences = split_sentences(text);
    match sentences.as_slice() {
        [] => text.to_string(),
        [only] => only.to_string(),
        [first, .., last] => format!("{} {}", first, last),
    }
}

/// Split on `.`, `!` or `?` followed by whitespace or end of text.
/// Terminators stay attached to their sentence.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let at_boundary = match chars.peek() {
            Some((_, next)) => next.is_whitespace(),
            None => true,
        };
        if at_boundary {
            let end = idx + c.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}
