//! Prefix sums of block heights for scroll mapping.
//!
//! Every top-level node is one block. A block is as tall, virtually, as its
//! tallest present contributor; shorter sides are stretched. Real lines map
//! to virtual lines proportionally inside a block, so
//! `to_real(to_virtual(line)) == line` for every line, while
//! `to_virtual(to_real(v)) == v` holds only at block starts where the
//! contributor has lines. Inside a stretched block the virtual-to-real
//! direction is monotonic, not exact.

use std::rc::Rc;

use super::Diff;
use crate::contributor::Contributor;

/// Cumulative real and virtual heights of a sequence's blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeightIndex {
    present: [bool; 3],
    real_ends: [Vec<usize>; 3],
    heights: [Vec<usize>; 3],
    virtual_ends: Vec<usize>,
    virtual_heights: Vec<usize>,
}

impl HeightIndex {
    /// Indexes `diffs` as consecutive blocks.
    #[must_use]
    pub fn new(diffs: &[Rc<Diff>]) -> Self {
        let mut index = Self::default();
        if let Some(first) = diffs.first() {
            for c in first.contributors() {
                index.present[c.index()] = true;
            }
        }
        let mut virtual_end = 0;
        let mut real_end = [0; 3];
        for diff in diffs {
            let vh = diff.max_height();
            virtual_end += vh;
            index.virtual_ends.push(virtual_end);
            index.virtual_heights.push(vh);
            for c in Contributor::ALL {
                let h = diff.height(c);
                real_end[c.index()] += h;
                index.real_ends[c.index()].push(real_end[c.index()]);
                index.heights[c.index()].push(h);
            }
        }
        index
    }

    /// Number of blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.virtual_ends.len()
    }

    /// Total virtual height.
    #[must_use]
    pub fn virtual_height(&self) -> usize {
        self.virtual_ends.last().copied().unwrap_or(0)
    }

    /// Total real height of `contributor`.
    #[must_use]
    pub fn real_height(&self, contributor: Contributor) -> usize {
        self.real_ends[contributor.index()]
            .last()
            .copied()
            .unwrap_or(0)
    }

    /// The block containing virtual line `v`.
    #[must_use]
    pub fn block_at_virtual(&self, v: usize) -> Option<usize> {
        let i = self.virtual_ends.partition_point(|&end| end <= v);
        (i < self.block_count()).then_some(i)
    }

    /// Virtual line of `line` on `contributor`. Lines past the last block,
    /// and every line of an absent contributor, map one to one.
    #[must_use]
    pub fn to_virtual(&self, contributor: Contributor, line: usize) -> usize {
        let c = contributor.index();
        if !self.present[c] {
            return line;
        }
        let i = self.real_ends[c].partition_point(|&end| end <= line);
        if i == self.block_count() {
            return self.virtual_height() + (line - self.real_height(contributor));
        }
        let h = self.heights[c][i];
        let delta = line - (self.real_ends[c][i] - h);
        let vh = self.virtual_heights[i];
        self.virtual_ends[i] - vh + delta * vh / h
    }

    /// Real line on `contributor` shown at virtual line `v`.
    #[must_use]
    pub fn to_real(&self, contributor: Contributor, v: usize) -> usize {
        let c = contributor.index();
        if !self.present[c] {
            return v;
        }
        let Some(i) = self.block_at_virtual(v) else {
            return self.real_height(contributor) + (v - self.virtual_height());
        };
        let h = self.heights[c][i];
        let start = self.real_ends[c][i] - h;
        if h == 0 {
            return start;
        }
        let vh = self.virtual_heights[i];
        let delta = v - (self.virtual_ends[i] - vh);
        start + delta * h / vh
    }
}
