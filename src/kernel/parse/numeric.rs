use super::text::strip_punctuation;

// Spoken numbers one..ten plus the misrecognitions speech engines commonly
// produce for them.
const WORD_VALUES: &[(&str, u8)] = &[
    ("one", 1), ("won", 1), ("wan", 1), ("juan", 1),
    ("two", 2), ("to", 2), ("too", 2), ("tu", 2),
    ("three", 3), ("tree", 3), ("free", 3), ("thee", 3),
    ("four", 4), ("for", 4), ("fore", 4), ("foe", 4),
    ("five", 5), ("fife", 5), ("fiv", 5), ("hive", 5),
    ("six", 6), ("sex", 6), ("sics", 6), ("sicks", 6), ("sax", 6),
    ("seven", 7), ("sevan", 7), ("sevin", 7), ("seben", 7),
    ("eight", 8), ("ate", 8), ("ait", 8), ("eit", 8),
    ("nine", 9), ("nyne", 9), ("nein", 9), ("nain", 9),
    ("ten", 10), ("tin", 10), ("tan", 10), ("tenn", 10),
];

pub const MIN_STEP: u8 = 1;
pub const MAX_STEP: u8 = 10;

pub fn word_value(word: &str) -> Option<u8> {
    WORD_VALUES
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, v)| *v)
}

/// A single token as a step count: digits 1..=10 or a number word.
pub fn token_value(token: &str) -> Option<u8> {
    if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
        return token
            .parse::<u8>()
            .ok()
            .filter(|v| (MIN_STEP..=MAX_STEP).contains(v));
    }
    word_value(token)
}

/// Reads an answer to "How much?" or "Which one?".
///
/// Accepts one token (`"3"`, `"three"`, `"tree"`), optionally wrapped as
/// `"number three"` or `"three steps"`. Anything else is `None`.
pub fn parse_numeric(text: &str) -> Option<u8> {
    let cleaned = strip_punctuation(text);
    let mut words: Vec<&str> = cleaned.split_whitespace().collect();
    if words.len() > 1 && words[0] == "number" {
        words.remove(0);
    }
    if words.len() > 1 && matches!(words[words.len() - 1], "step" | "steps") {
        words.pop();
    }
    match words.as_slice() {
        [single] => token_value(single),
        _ => None,
    }
}

// Homophones that are ordinary words once they sit inside a phrase ("up to 50").
const PHRASE_WORDS: &[&str] = &["to", "too", "for", "fore", "won", "ate"];

/// First step count anywhere in a longer phrase ("louder by three").
pub fn extract_steps(text: &str) -> Option<u8> {
    parse_numeric(text).or_else(|| {
        strip_punctuation(text)
            .split_whitespace()
            .filter(|word| !PHRASE_WORDS.contains(word))
            .find_map(token_value)
    })
}

/// First run of digits in the text, unbounded ("set volume to 40 percent").
pub fn first_integer(text: &str) -> Option<u32> {
    text.split(|c: char| !c.is_ascii_digit())
        .find(|run| !run.is_empty())
        .and_then(|run| run.parse().ok())
}

/// Clamps an arbitrary magnitude into the supported step range.
pub fn clamp_steps(steps: i64) -> u8 {
    steps.clamp(i64::from(MIN_STEP), i64::from(MAX_STEP)) as u8
}
