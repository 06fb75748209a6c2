/// Lowercases, trims and collapses runs of whitespace.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercase alphanumeric tokens; punctuation separates words.
pub fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// `normalize` with punctuation stripped: `"Three."` → `"three"`.
pub fn strip_punctuation(text: &str) -> String {
    tokens(text).join(" ")
}

/// Whether `needle` occurs in `haystack` as a whole run of words.
pub fn contains_words(haystack: &str, needle: &str) -> bool {
    let hay: Vec<&str> = haystack.split_whitespace().collect();
    let want: Vec<&str> = needle.split_whitespace().collect();
    if want.is_empty() || want.len() > hay.len() {
        return false;
    }
    hay.windows(want.len()).any(|window| window == want.as_slice())
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
