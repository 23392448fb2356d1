use std::collections::HashSet;

/// Characters replaced by spaces during normalization.
pub const PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', ';', ':', '(', ')', '[', ']', '{', '}', '"', '\'', '«', '»', '-', '–',
    '—', '/', '\\', '|', '*', '+', '=', '<', '>', '…', '#', '&',
];

/// Lowercases, trims, strips [`PUNCTUATION`] and collapses whitespace.
pub fn normalize(text: &str) -> String {
    let replaced: String = text
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if PUNCTUATION.contains(&c) { ' ' } else { c })
        .collect();

    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased whitespace-separated words.
pub fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Strips trailing punctuation from a single token.
pub fn strip_trailing_punctuation(token: &str) -> &str {
    token.trim_end_matches(|c: char| c.is_ascii_punctuation() || PUNCTUATION.contains(&c))
}
