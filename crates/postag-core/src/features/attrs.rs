//! Lexical attributes computed from a single word.

use serde::{Deserialize, Serialize};

/// Number of characters kept by the prefix and suffix attributes.
pub const AFFIX_LEN: usize = 3;

/// Words of at least this many characters get the constant shape `LONG`.
const MAX_SHAPE_INPUT: usize = 100;

/// Runs of the same shape character are cut after this many repetitions.
const MAX_SHAPE_RUN: usize = 4;

/// A lexical attribute of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attr {
    /// The verbatim form.
    Orth,
    /// Lowercased form.
    Lower,
    /// Orthographic shape, e.g. `Xxxxx` or `dd.dd`.
    Shape,
    /// First three characters.
    Prefix,
    /// Last three characters.
    Suffix,
}

impl Attr {
    /// The default feature columns: lower, shape, prefix, suffix.
    pub const DEFAULT: [Attr; 4] = [Attr::Lower, Attr::Shape, Attr::Prefix, Attr::Suffix];

    /// Compute the attribute string for a word.
    pub fn value(&self, word: &str) -> String {
        match self {
            Attr::Orth => word.to_string(),
            Attr::Lower => word.to_lowercase(),
            Attr::Shape => word_shape(word),
            Attr::Prefix => word.chars().take(AFFIX_LEN).collect(),
            Attr::Suffix => {
                let n = word.chars().count();
                word.chars().skip(n.saturating_sub(AFFIX_LEN)).collect()
            }
        }
    }
}

/// Orthographic shape of a word.
///
/// Uppercase letters become `X`, other letters `x`, ASCII digits `d`; anything else
/// is kept. A run of the same shape character is cut after four.
///
/// # Examples
/// ```
/// use postag_core::features::word_shape;
///
/// assert_eq!(word_shape("Madrid"), "Xxxxx");
/// assert_eq!(word_shape("1.984"), "d.ddd");
/// ```
pub fn word_shape(word: &str) -> String {
    if word.chars().count() >= MAX_SHAPE_INPUT {
        return "LONG".to_string();
    }

    let mut shape = String::with_capacity(word.len());
    let mut last: Option<char> = None;
    let mut run = 0usize;

    for c in word.chars() {
        let s = if c.is_alphabetic() {
            if c.is_uppercase() { 'X' } else { 'x' }
        } else if c.is_ascii_digit() {
            'd'
        } else {
            c
        };

        if Some(s) == last {
            run += 1;
        } else {
            run = 0;
            last = Some(s);
        }

        if run < MAX_SHAPE_RUN {
            shape.push(s);
        }
    }

    shape
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_basic() {
        assert_eq!(word_shape("gato"), "xxxx");
        assert_eq!(word_shape("Barcelona"), "Xxxxx");
        assert_eq!(word_shape("ONU"), "XXX");
        assert_eq!(word_shape("1998"), "dddd");
        assert_eq!(word_shape("3,5"), "d,d");
        assert_eq!(word_shape("C-3PO"), "X-dXX");
    }

    #[test]
    fn test_shape_long_word() {
        let word = "a".repeat(120);
        assert_eq!(word_shape(&word), "LONG");
    }

    #[test]
    fn test_shape_length_boundary() {
        assert_eq!(word_shape(&"a".repeat(100)), "LONG");
        assert_eq!(word_shape(&"a".repeat(99)), "xxxx");
    }

    #[test]
    fn test_shape_only_decimal_digits_become_d() {
        assert_eq!(word_shape("½"), "½");
        assert_ne!(word_shape("Ⅻ"), "d");
        assert_eq!(word_shape("3½"), "d½");
    }

    #[test]
    fn test_shape_empty() {
        assert_eq!(word_shape(""), "");
    }

    #[test]
    fn test_affixes_are_char_based() {
        assert_eq!(Attr::Prefix.value("añadir"), "aña");
        assert_eq!(Attr::Suffix.value("canción"), "ión");
        assert_eq!(Attr::Prefix.value("y"), "y");
        assert_eq!(Attr::Suffix.value("de"), "de");
    }

    #[test]
    fn test_lower_and_orth() {
        assert_eq!(Attr::Lower.value("España"), "españa");
        assert_eq!(Attr::Orth.value("España"), "España");
    }
}
