use once_cell::sync::Lazy;
use regex::Regex;

static LEGACY_CODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\x{00A7}[0-9a-fk-or]").unwrap());

/// Removes every legacy marker+code pair, leaving the plain chat line.
pub fn strip_codes(text: &str) -> String {
    LEGACY_CODE_REGEX.replace_all(text, "").into_owned()
}

/// Replaces each non-overlapping pair of spaces with a single space.
pub fn collapse_double_spaces(text: &str) -> String {
    text.replace("  ", " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_colors_and_styles() {
        assert_eq!(strip_codes("§cHello §lWorld§r!"), "Hello World!");
        assert_eq!(strip_codes("§Kmagic §Ocase"), "magic case");
    }

    #[test]
    fn keeps_unknown_codes() {
        assert_eq!(strip_codes("§zodd"), "§zodd");
        assert_eq!(strip_codes("no codes"), "no codes");
    }

    #[test]
    fn collapses_pairs_only() {
        assert_eq!(collapse_double_spaces("a  b"), "a b");
        assert_eq!(collapse_double_spaces("a   b"), "a  b");
        assert_eq!(collapse_double_spaces("a    b"), "a  b");
    }
}
