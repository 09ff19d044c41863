//! Token font styles — the `fontStyle` setting of a token-color rule.
//!
//! VS Code reads `fontStyle` as a space-separated word list. An empty string
//! is meaningful ("reset to plain"), so an empty [`FontStyle`] is a valid
//! value distinct from an absent setting.

use std::fmt;

bitflags::bitflags! {
    /// Style words a token rule may apply.
    ///
    /// ```
    /// use hf_theme::font::FontStyle;
    ///
    /// let style = FontStyle::parse("bold  italic").unwrap();
    /// assert!(style.contains(FontStyle::BOLD | FontStyle::ITALIC));
    /// assert_eq!(style.to_string(), "italic bold");
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct FontStyle: u8 {
        const ITALIC        = 1 << 0;
        const BOLD          = 1 << 1;
        const UNDERLINE     = 1 << 2;
        const STRIKETHROUGH = 1 << 3;
    }
}

/// A word in a `fontStyle` string that is not one of the four known styles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown font style {word:?} (expected italic, bold, underline, or strikethrough)")]
pub struct UnknownFontStyle {
    pub word: String,
}

/// Canonical output order.
const WORDS: [(FontStyle, &str); 4] = [
    (FontStyle::ITALIC, "italic"),
    (FontStyle::BOLD, "bold"),
    (FontStyle::UNDERLINE, "underline"),
    (FontStyle::STRIKETHROUGH, "strikethrough"),
];

impl FontStyle {
    /// Parse a whitespace-separated style list. Case-insensitive; repeats are
    /// harmless; `none` and the empty string both mean no style.
    ///
    /// # Errors
    ///
    /// Returns the first unrecognized word.
    pub fn parse(text: &str) -> Result<Self, UnknownFontStyle> {
        let mut style = Self::empty();
        for word in text.split_whitespace() {
            let lower = word.to_ascii_lowercase();
            if lower == "none" {
                continue;
            }
            let flag = WORDS
                .iter()
                .find(|(_, name)| *name == lower)
                .map(|(flag, _)| *flag)
                .ok_or_else(|| UnknownFontStyle {
                    word: word.to_string(),
                })?;
            style |= flag;
        }
        Ok(style)
    }
}

impl fmt::Display for FontStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (flag, name) in WORDS {
            if self.contains(flag) {
                if !first {
                    f.write_str(" ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_none_are_plain() {
        assert_eq!(FontStyle::parse("").unwrap(), FontStyle::empty());
        assert_eq!(FontStyle::parse("none").unwrap(), FontStyle::empty());
        assert_eq!(FontStyle::empty().to_string(), "");
    }

    #[test]
    fn parses_all_words() {
        let all = FontStyle::parse("Strikethrough underline BOLD italic").unwrap();
        assert_eq!(all, FontStyle::all());
        assert_eq!(all.to_string(), "italic bold underline strikethrough");
    }

    #[test]
    fn repeats_collapse() {
        assert_eq!(FontStyle::parse("bold bold").unwrap(), FontStyle::BOLD);
    }

    #[test]
    fn unknown_word_is_reported() {
        let err = FontStyle::parse("italic oblique").unwrap_err();
        assert_eq!(err.word, "oblique");
    }
}
