use super::text::tokens;

/// A command with a delay attached: "open chrome in 30 seconds".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayRequest {
    pub action_text: String,
    pub delay_seconds: u64,
    pub form: DelayForm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayForm {
    /// "in 30 seconds open chrome", "open chrome after two minutes"
    Prefix,
    /// "open chrome 30 seconds", "open chrome 30"
    Postfix { unit: bool },
}

impl DelayRequest {
    /// A trailing bare number with no unit. Ambiguous with a step magnitude.
    pub fn is_bare_trailing_number(&self) -> bool {
        self.form == DelayForm::Postfix { unit: false }
    }
}

const NUMBER_WORDS: &[(&str, u64)] = &[
    ("one", 1), ("two", 2), ("three", 3), ("four", 4), ("five", 5),
    ("six", 6), ("seven", 7), ("eight", 8), ("nine", 9), ("ten", 10),
    ("eleven", 11), ("twelve", 12), ("thirteen", 13), ("fourteen", 14), ("fifteen", 15),
    ("sixteen", 16), ("seventeen", 17), ("eighteen", 18), ("nineteen", 19), ("twenty", 20),
    ("thirty", 30), ("forty", 40), ("fifty", 50), ("sixty", 60),
];

// "settings"/"sekends" are how recognisers tend to hear "seconds".
const UNITS: &[&str] = &[
    "second", "seconds", "sec", "secs", "s",
    "settings", "setting", "setings", "seting",
    "sekends", "sekend", "sekkonds",
    "minute", "minutes", "min", "mins", "m",
];

fn number(token: &str) -> Option<u64> {
    if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
        return token.parse().ok();
    }
    NUMBER_WORDS.iter().find(|(w, _)| *w == token).map(|(_, v)| *v)
}

fn is_unit(token: &str) -> bool {
    UNITS.contains(&token)
}

fn unit_seconds(unit: Option<&str>) -> u64 {
    match unit {
        Some(u) if u.starts_with("set") || u.starts_with("sek") => 1,
        Some(u) if u.starts_with('m') => 60,
        _ => 1,
    }
}

/// Splits a delayed command into the command text and the delay.
///
/// A missing unit means seconds. Zero delays and empty commands are rejected.
pub fn parse_delay(text: &str) -> Option<DelayRequest> {
    let toks = tokens(text);
    if toks.len() < 2 {
        return None;
    }

    // "in/after N [unit]" anywhere in the phrase
    for (i, tok) in toks.iter().enumerate() {
        if tok != "in" && tok != "after" {
            continue;
        }
        let Some(n) = toks.get(i + 1).and_then(|t| number(t)) else {
            continue;
        };
        let unit = toks.get(i + 2).map(String::as_str).filter(|t| is_unit(t));
        let delay_seconds = n.checked_mul(unit_seconds(unit))?;
        if delay_seconds == 0 {
            return None;
        }
        let resume = i + if unit.is_some() { 3 } else { 2 };
        let action: Vec<&str> = toks[..i]
            .iter()
            .chain(toks[resume..].iter())
            .map(String::as_str)
            .collect();
        if action.is_empty() {
            return None;
        }
        return Some(DelayRequest {
            action_text: action.join(" "),
            delay_seconds,
            form: DelayForm::Prefix,
        });
    }

    // "<command> N [unit]"
    let last = toks.len() - 1;
    let (n_idx, unit) = if is_unit(&toks[last]) {
        (last.checked_sub(1)?, Some(toks[last].as_str()))
    } else {
        (last, None)
    };
    let n = number(&toks[n_idx])?;
    let delay_seconds = n.checked_mul(unit_seconds(unit))?;
    if delay_seconds == 0 || n_idx == 0 {
        return None;
    }
    Some(DelayRequest {
        action_text: toks[..n_idx].join(" "),
        delay_seconds,
        form: DelayForm::Postfix { unit: unit.is_some() },
    })
}
