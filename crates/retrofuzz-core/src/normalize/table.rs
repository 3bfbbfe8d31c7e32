//! Character and word substitution table used by canonicalization.
//!
//! The defaults are tuned against libretro thumbnail names, which replace
//! characters forbidden in filenames (`&*/:`<>?\|"`) with `_`.

use serde::{Deserialize, Serialize};

/// Substitutions applied after case folding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstitutionTable {
    /// Articles dropped at the start (`the x`) or after a comma (`x, the`).
    pub articles: Vec<String>,
    /// Ordered literal replacements.
    pub replacements: Vec<(String, String)>,
    /// Characters deleted outright.
    pub removed: String,
    /// Characters turned into spaces.
    pub spaced: String,
    /// Whole-word replacements, ignoring surrounding brackets.
    pub words: Vec<(String, String)>,
    /// Whole-word replacements applied only inside brackets or after one of
    /// `ordinal_words`, for numerals that are also ordinary words.
    pub lone_numerals: Vec<(String, String)>,
    pub ordinal_words: Vec<String>,
}

impl Default for SubstitutionTable {
    fn default() -> Self {
        let pairs = |items: &[(&str, &str)]| -> Vec<(String, String)> {
            items
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect()
        };

        Self {
            articles: [
                "the", "a", "an", "le", "la", "les", "der", "die", "das", "el", "los", "las", "o",
                "os", "as", "il", "lo",
            ]
            .iter()
            .map(|a| a.to_string())
            .collect(),
            replacements: pairs(&[
                (" _ ", " and "),
                ("&", " and "),
                ("_ ", " "),
            ]),
            removed: "'\u{2019}`\".!?#".to_string(),
            spaced: ",:;/~".to_string(),
            words: pairs(&[
                ("ii", "2"),
                ("iii", "3"),
                ("iv", "4"),
                ("v", "5"),
                ("vi", "6"),
                ("vii", "7"),
                ("viii", "8"),
                ("ix", "9"),
                ("x", "10"),
            ]),
            lone_numerals: pairs(&[("i", "1")]),
            ordinal_words: [
                "episode", "part", "chapter", "volume", "vol", "act", "book", "disc", "disk",
            ]
            .iter()
            .map(|w| w.to_string())
            .collect(),
        }
    }
}

impl SubstitutionTable {
    /// Case fold and apply the character-level rules.
    pub fn fold(&self, text: &str) -> String {
        let mut out = self.strip_articles(&text.to_lowercase());
        for (from, to) in &self.replacements {
            if !from.is_empty() {
                out = out.replace(from.as_str(), to);
            }
        }
        out.chars()
            .filter(|c| !self.removed.contains(*c))
            .map(|c| if self.spaced.contains(c) { ' ' } else { c })
            .collect()
    }

    /// Split folded text into canonical tokens.
    pub fn tokens(&self, folded: &str) -> Vec<String> {
        let mut tokens: Vec<String> = Vec::new();
        for token in folded
            .split_whitespace()
            .map(collapse_dashes)
            .filter(|token| token != "-")
        {
            let after_ordinal = tokens
                .last()
                .map(|previous| trim_brackets(previous))
                .is_some_and(|previous| self.ordinal_words.iter().any(|w| w == previous));
            tokens.push(self.replace_word(token, after_ordinal));
        }
        tokens
    }

    fn strip_articles(&self, text: &str) -> String {
        let mut out = text.trim().to_string();

        for article in &self.articles {
            let prefix = format!("{} ", article);
            if out.len() > prefix.len() && out.starts_with(&prefix) {
                out = out[prefix.len()..].to_string();
                break;
            }
        }

        for article in &self.articles {
            let needle = format!(", {}", article);
            let mut from = 0;
            while let Some(pos) = out[from..].find(&needle) {
                let start = from + pos;
                let end = start + needle.len();
                let at_boundary = out[end..]
                    .chars()
                    .next()
                    .map_or(true, |c| c.is_whitespace() || matches!(c, '(' | '[' | ',' | ':' | '-'));
                if at_boundary {
                    out.replace_range(start..end, "");
                    from = start;
                } else {
                    from = end;
                }
            }
        }

        out
    }

    fn replace_word(&self, token: String, after_ordinal: bool) -> String {
        let core = trim_brackets(&token);
        if core.is_empty() {
            return token;
        }
        for (from, to) in &self.words {
            if core == from {
                return token.replacen(core, to, 1);
            }
        }
        if after_ordinal || core.len() != token.len() {
            for (from, to) in &self.lone_numerals {
                if core == from {
                    return token.replacen(core, to, 1);
                }
            }
        }
        token
    }
}

fn trim_brackets(token: &str) -> &str {
    token.trim_matches(|c| matches!(c, '(' | ')' | '[' | ']'))
}

fn collapse_dashes(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut previous_dash = false;
    for c in token.chars() {
        if c == '-' {
            if !previous_dash {
                out.push(c);
            }
            previous_dash = true;
        } else {
            out.push(c);
            previous_dash = false;
        }
    }
    out
}
