//! Range comparators: equality views over comparable elements.
//!
//! The diff algorithms never look at text directly. They walk two or three
//! comparators and ask whether element `i` of one equals element `j` of the
//! other. Each comparator also remembers where its elements live in the
//! source text so differences can be anchored back into documents.

mod line;
mod token;

use std::ops::Range;

pub use line::LineComparator;
pub use token::TokenComparator;

/// A sequence of comparable elements with a pluggable equality policy.
pub trait RangeComparator {
    /// Number of elements.
    fn range_count(&self) -> usize;

    /// The normalized comparison key of element `index`.
    ///
    /// Policies such as whitespace-insensitivity are applied when the key is
    /// built, so plain key equality is the comparison.
    fn element(&self, index: usize) -> &str;

    /// Byte range of element `index` in the compared text.
    fn extent(&self, index: usize) -> Range<usize>;

    /// Length in bytes of the compared text.
    fn text_len(&self) -> usize;

    /// Whether element `index` equals element `other_index` of `other`.
    fn ranges_equal(&self, index: usize, other: &dyn RangeComparator, other_index: usize) -> bool {
        self.element(index) == other.element(other_index)
    }

    /// Byte range covered by the element range `elements`.
    ///
    /// An empty element range maps to the empty byte range where element
    /// `elements.start` begins, or to the end of the text past the last
    /// element.
    fn text_range(&self, elements: Range<usize>) -> Range<usize> {
        let start = self.boundary(elements.start);
        if elements.is_empty() {
            return start..start;
        }
        let end = self.extent(elements.end - 1).end;
        start..end
    }

    /// Byte offset of the boundary before element `index`.
    fn boundary(&self, index: usize) -> usize {
        if index < self.range_count() {
            self.extent(index).start
        } else {
            self.text_len()
        }
    }
}

/// Element-wise equality of two element ranges.
#[must_use]
pub fn ranges_match(
    a: &dyn RangeComparator,
    a_range: Range<usize>,
    b: &dyn RangeComparator,
    b_range: Range<usize>,
) -> bool {
    a_range.len() == b_range.len() && a_range.zip(b_range).all(|(i, j)| a.ranges_equal(i, b, j))
}

/// Builds a token comparator for a piece of text.
///
/// The second argument is the whitespace policy.
pub type TokenComparatorFactory = std::rc::Rc<dyn Fn(&str, bool) -> Box<dyn RangeComparator>>;

/// The default factory, producing [`TokenComparator`]s.
#[must_use]
pub fn default_token_factory() -> TokenComparatorFactory {
    std::rc::Rc::new(|text: &str, ignore_whitespace: bool| {
        Box::new(TokenComparator::new(text, ignore_whitespace)) as Box<dyn RangeComparator>
    })
}
