//! Thumbnail file naming.
//!
//! RetroArch looks thumbnails up by the playlist label with every character
//! that is unsafe in filenames replaced by `_`.

use regex::Regex;
use std::sync::LazyLock;

/// Control characters plus `"<>|:*?\/&`.
static FORBIDDEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\x00-\x1f"<>|:*?\\/&]"#).unwrap());

/// File stem RetroArch expects for a label.
///
/// ```
/// use retrofuzz_core::naming::thumbnail_stem;
///
/// assert_eq!(thumbnail_stem("Ren & Stimpy: Time Warp"), "Ren _ Stimpy_ Time Warp");
/// ```
pub fn thumbnail_stem(label: &str) -> String {
    FORBIDDEN.replace_all(label, "_").into_owned()
}

/// Stem for the `n`-th artifact of a label, counting from 1.
pub fn numbered_stem(stem: &str, n: usize) -> String {
    if n <= 1 {
        stem.to_string()
    } else {
        format!("{} ({})", stem, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_characters_replaced() {
        assert_eq!(thumbnail_stem("AC/DC"), "AC_DC");
        assert_eq!(thumbnail_stem(r#"What? "Why" <*> a\b|c"#), "What_ _Why_ ___ a_b_c");
        assert_eq!(thumbnail_stem("Tab\there"), "Tab_here");
    }

    #[test]
    fn test_safe_characters_kept() {
        let label = "Monkey Island 2 - LeChuck's Revenge (Europe) [!]";
        assert_eq!(thumbnail_stem(label), label);
    }

    #[test]
    fn test_numbered_stem() {
        assert_eq!(numbered_stem("Doom", 1), "Doom");
        assert_eq!(numbered_stem("Doom", 3), "Doom (3)");
    }
}
