// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Priority lanes for update arbitration.
//!
//! A lane is a bit (or union of bits) in a shared priority space. Pending
//! work on a root is the OR of the lanes of its outstanding updates; a flush
//! selects the highest-priority pending lane and renders against it.
//!
//! Only [`Lanes::SYNC`] is scheduled end to end today. The algebra is kept
//! general so additional lane classes can be introduced without changing
//! any call sites.

/// A set of priority lanes.
///
/// Lower bits are higher priority. The empty set means no pending work.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Lanes(pub(crate) u32);

impl Lanes {
    /// No lanes.
    pub const NONE: Self = Self(0);

    /// The synchronous lane: flushed in the same task as the update request.
    pub const SYNC: Self = Self(1 << 0);

    /// Construct a lane set from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the underlying bit representation.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if no lanes are set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every lane in `other` is also in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of two lane sets.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Removes the lanes in `other` from `self`.
    #[must_use]
    pub const fn remove(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Extracts the highest-priority lane (the lowest set bit).
    ///
    /// Returns [`Lanes::NONE`] when the set is empty.
    #[must_use]
    pub const fn highest_priority(self) -> Self {
        Self(self.0 & self.0.wrapping_neg())
    }
}

impl core::ops::BitOr for Lanes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.merge(rhs)
    }
}

impl core::ops::BitOrAssign for Lanes {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.merge(rhs);
    }
}

impl core::ops::BitAnd for Lanes {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highest_priority_is_lowest_bit() {
        let lanes = Lanes::from_bits(0b1100);
        assert_eq!(lanes.highest_priority(), Lanes::from_bits(0b0100));
        assert_eq!(Lanes::NONE.highest_priority(), Lanes::NONE);
    }

    #[test]
    fn merge_and_remove() {
        let mut pending = Lanes::NONE;
        pending |= Lanes::SYNC;
        pending |= Lanes::from_bits(0b10);
        assert!(pending.contains(Lanes::SYNC));

        let pending = pending.remove(Lanes::SYNC);
        assert!(!pending.contains(Lanes::SYNC));
        assert!(!pending.is_empty());
    }

    #[test]
    fn sync_wins_arbitration() {
        let pending = Lanes::SYNC.merge(Lanes::from_bits(0b1000));
        assert_eq!(pending.highest_priority(), Lanes::SYNC);
    }
}
