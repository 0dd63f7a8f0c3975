// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mutation flags bubbled through the fiber tree.

bitflags::bitflags! {
    /// Pending host-tree work recorded on a fiber during the render phase
    /// and consumed by the commit phase.
    ///
    /// `subtree_flags` on a fiber is the OR of the `flags | subtree_flags`
    /// of its children; the commit walk descends into a subtree only while
    /// that bubbled set intersects the mask it is processing.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub(crate) struct FiberFlags: u8 {
        /// The fiber's host subtree must be (re)attached at its new position.
        const PLACEMENT      = 0b0000_0001;
        /// Committed content (text, attributes) differs from pending content.
        const CONTENT_UPDATE = 0b0000_0010;
        /// One or more children were removed during the last diff.
        const CHILD_DELETION = 0b0000_0100;
        /// A state cell on this fiber has a passive effect to flush.
        const PASSIVE        = 0b0000_1000;

        /// Flags handled by the mutation pass of the commit phase.
        const MUTATION_MASK = Self::PLACEMENT.bits()
            | Self::CONTENT_UPDATE.bits()
            | Self::CHILD_DELETION.bits();
        /// Flags that require passive-effect collection during commit.
        const PASSIVE_MASK = Self::PASSIVE.bits() | Self::CHILD_DELETION.bits();
    }
}

bitflags::bitflags! {
    /// Tags on an effect cell.
    ///
    /// `PASSIVE` marks the cell's kind; `HAS_EFFECT` marks that this render
    /// observed changed dependencies, so the update-flavored flush must run
    /// the cell's destroy/create pair. Unmount-flavored flushing keys off
    /// `PASSIVE` alone: a deleted component's cleanups always run.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub(crate) struct EffectTags: u8 {
        /// Deferred effect, flushed after host mutations are visible.
        const PASSIVE    = 0b0000_0001;
        /// The pending side effect must run in the next flush.
        const HAS_EFFECT = 0b0000_0010;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_cover_their_flags() {
        assert!(FiberFlags::MUTATION_MASK.contains(FiberFlags::PLACEMENT));
        assert!(FiberFlags::MUTATION_MASK.contains(FiberFlags::CONTENT_UPDATE));
        assert!(FiberFlags::MUTATION_MASK.contains(FiberFlags::CHILD_DELETION));
        assert!(!FiberFlags::MUTATION_MASK.contains(FiberFlags::PASSIVE));
        assert!(FiberFlags::PASSIVE_MASK.contains(FiberFlags::PASSIVE));
        assert!(FiberFlags::PASSIVE_MASK.contains(FiberFlags::CHILD_DELETION));
    }
}
