//! Token comparator used to refine line differences.

use std::ops::Range;

use super::RangeComparator;

/// Compares text token by token.
///
/// Tokens are maximal runs of word characters (alphanumerics and `_`),
/// maximal runs of horizontal whitespace, single line terminators (`\n` or
/// `\r\n`), and single characters of anything else.
#[derive(Debug, Clone)]
pub struct TokenComparator {
    keys: Vec<String>,
    extents: Vec<Range<usize>>,
    text_len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Word,
    Space,
    Newline,
    Other,
}

fn classify(c: char) -> Class {
    if c == '\n' || c == '\r' {
        Class::Newline
    } else if c.is_whitespace() {
        Class::Space
    } else if c.is_alphanumeric() || c == '_' {
        Class::Word
    } else {
        Class::Other
    }
}

impl TokenComparator {
    /// Tokenizes `text`. With `ignore_whitespace` every whitespace run
    /// compares equal to every other.
    #[must_use]
    pub fn new(text: &str, ignore_whitespace: bool) -> Self {
        let extents = tokenize(text);
        let keys = extents
            .iter()
            .map(|range| {
                let token = &text[range.clone()];
                match token.chars().next().map(classify) {
                    Some(Class::Space) if ignore_whitespace => String::new(),
                    _ => token.to_string(),
                }
            })
            .collect();
        Self {
            keys,
            extents,
            text_len: text.len(),
        }
    }
}

fn tokenize(text: &str) -> Vec<Range<usize>> {
    let mut tokens: Vec<Range<usize>> = Vec::new();
    let mut current: Option<(Class, usize)> = None;

    for (i, c) in text.char_indices() {
        let class = classify(c);
        match current {
            Some((Class::Newline, start)) if &text[start..i] == "\r" && c == '\n' => {
                // Keep "\r\n" as one terminator.
                tokens.push(start..i + 1);
                current = None;
                continue;
            }
            Some((prev, _)) if prev == class && matches!(class, Class::Word | Class::Space) => {
                continue;
            }
            Some((_, start)) => tokens.push(start..i),
            None => {}
        }
        current = Some((class, i));
    }
    if let Some((_, start)) = current {
        tokens.push(start..text.len());
    }
    tokens
}

impl RangeComparator for TokenComparator {
    fn range_count(&self) -> usize {
        self.keys.len()
    }

    fn element(&self, index: usize) -> &str {
        &self.keys[index]
    }

    fn extent(&self, index: usize) -> Range<usize> {
        self.extents[index].clone()
    }

    fn text_len(&self) -> usize {
        self.text_len
    }
}
