//! Line comparator.

use std::ops::Range;

use super::RangeComparator;

/// Compares text line by line.
///
/// Each element is one line including its terminator. Terminators never take
/// part in the comparison, so a last line without a newline equals the same
/// line with one. An empty text has no lines.
#[derive(Debug, Clone)]
pub struct LineComparator {
    keys: Vec<String>,
    extents: Vec<Range<usize>>,
    text_len: usize,
}

impl LineComparator {
    /// Splits `text` into lines. With `ignore_whitespace` all whitespace is
    /// dropped from the comparison keys.
    #[must_use]
    pub fn new(text: &str, ignore_whitespace: bool) -> Self {
        let mut keys = Vec::new();
        let mut extents = Vec::new();
        let mut offset = 0;
        for line in text.split_inclusive('\n') {
            let content = line.trim_end_matches(['\n', '\r']);
            let key = if ignore_whitespace {
                content.chars().filter(|c| !c.is_whitespace()).collect()
            } else {
                content.to_string()
            };
            keys.push(key);
            extents.push(offset..offset + line.len());
            offset += line.len();
        }
        Self {
            keys,
            extents,
            text_len: text.len(),
        }
    }
}

impl RangeComparator for LineComparator {
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
