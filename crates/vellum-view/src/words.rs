//! Word-boundary rules used for line breaking and justification.
//!
//! Offsets here are char indices into the text being examined (the same
//! addressing the content layer uses).

use unicode_segmentation::UnicodeSegmentation;

/// Char offsets of every word boundary in `text`, including `0` and the
/// final offset. Line breaking only ever splits at these positions (or at
/// forced hard breaks), so a produced boundary can never fall inside a word.
pub fn word_break_offsets(text: &str) -> Vec<usize> {
    let mut offsets = vec![0];
    let mut chars = 0;
    for segment in text.split_word_bounds() {
        chars += segment.chars().count();
        offsets.push(chars);
    }
    offsets.dedup();
    offsets
}

/// True when `offset` is a word boundary of `text`.
pub fn is_word_break(text: &str, offset: usize) -> bool {
    word_break_offsets(text).binary_search(&offset).is_ok()
}

/// Char offsets at which a new word *starts* (a non-whitespace segment
/// follows a whitespace segment or the text start). Justification subdivides
/// a line's chunk group at these positions so extra space lands between
/// words.
pub fn word_start_offsets(text: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut chars = 0;
    let mut prev_was_space = true;
    for segment in text.split_word_bounds() {
        let is_space = segment.chars().all(char::is_whitespace);
        if !is_space && prev_was_space && chars > 0 {
            starts.push(chars);
        }
        prev_was_space = is_space;
        chars += segment.chars().count();
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_bracket_words() {
        let offsets = word_break_offsets("foo bar");
        assert_eq!(offsets, vec![0, 3, 4, 7]);
        assert!(is_word_break("foo bar", 4));
        assert!(!is_word_break("foo bar", 5));
    }

    #[test]
    fn word_starts_skip_leading_text() {
        assert_eq!(word_start_offsets("foo bar baz"), vec![4, 8]);
        assert_eq!(word_start_offsets("foo"), Vec::<usize>::new());
        assert_eq!(word_start_offsets("  lead"), vec![2]);
    }

    #[test]
    fn punctuation_is_its_own_segment() {
        let offsets = word_break_offsets("a,b");
        assert!(offsets.contains(&1));
        assert!(offsets.contains(&2));
    }

    #[test]
    fn multibyte_offsets_are_char_based() {
        let offsets = word_break_offsets("héllo wörld");
        assert_eq!(*offsets.last().unwrap(), 11);
        assert!(is_word_break("héllo wörld", 6));
    }
}
