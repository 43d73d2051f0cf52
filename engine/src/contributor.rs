//! Contributor roles in a comparison.
//!
//! A comparison has up to three contributors. Two-way compares bind only
//! `Left` and `Right`; three-way compares also bind the common `Ancestor`.

use std::fmt;

/// One of the (up to) three roles in a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Contributor {
    /// The common base both sides were derived from.
    Ancestor,
    /// The left (local) side.
    Left,
    /// The right (remote) side.
    Right,
}

impl Contributor {
    /// All contributors in storage order.
    pub const ALL: [Self; 3] = [Self::Ancestor, Self::Left, Self::Right];

    /// Index into per-contributor arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Ancestor => 0,
            Self::Left => 1,
            Self::Right => 2,
        }
    }

    /// The other side of a Left/Right pair. The ancestor has no opposite.
    #[must_use]
    pub const fn opposite(self) -> Option<Self> {
        match self {
            Self::Ancestor => None,
            Self::Left => Some(Self::Right),
            Self::Right => Some(Self::Left),
        }
    }

    /// Source and destination of a merge copy in the given direction.
    #[must_use]
    pub const fn copy_direction(left_to_right: bool) -> (Self, Self) {
        if left_to_right {
            (Self::Left, Self::Right)
        } else {
            (Self::Right, Self::Left)
        }
    }
}

impl fmt::Display for Contributor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ancestor => write!(f, "ancestor"),
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_match_storage_order() {
        for (i, c) in Contributor::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }

    #[test]
    fn opposite_pairs_sides() {
        assert_eq!(Contributor::Left.opposite(), Some(Contributor::Right));
        assert_eq!(Contributor::Right.opposite(), Some(Contributor::Left));
        assert_eq!(Contributor::Ancestor.opposite(), None);
    }

    #[test]
    fn copy_direction() {
        assert_eq!(
            Contributor::copy_direction(true),
            (Contributor::Left, Contributor::Right)
        );
        assert_eq!(
            Contributor::copy_direction(false),
            (Contributor::Right, Contributor::Left)
        );
    }
}
