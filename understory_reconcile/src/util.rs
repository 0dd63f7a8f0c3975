// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Small internal helpers.

use alloc::vec;
use alloc::vec::Vec;

/// Marks the positions forming a longest increasing subsequence.
///
/// `old_indices[i]` is the previous-generation index of the reused child now
/// at position `i`, or `None` for a freshly created child. The returned
/// vector has one flag per position; `true` means the child's relative order
/// is already correct and it needs no move. Fresh children are never marked.
///
/// O(n log n) patience sort with parent links.
pub(crate) fn stable_positions(old_indices: &[Option<u32>]) -> Vec<bool> {
    let mut stable = vec![false; old_indices.len()];
    // tails[k] = position holding the smallest tail value of any increasing
    // run of length k + 1.
    let mut tails: Vec<usize> = Vec::new();
    let mut parent: Vec<Option<usize>> = vec![None; old_indices.len()];

    for (pos, &old) in old_indices.iter().enumerate() {
        let Some(value) = old else { continue };
        let found = tails.partition_point(|&tail_pos| {
            old_indices[tail_pos].expect("tails hold reused positions") < value
        });
        if found > 0 {
            parent[pos] = Some(tails[found - 1]);
        }
        if found == tails.len() {
            tails.push(pos);
        } else {
            tails[found] = pos;
        }
    }

    let mut cursor = tails.last().copied();
    while let Some(pos) = cursor {
        stable[pos] = true;
        cursor = parent[pos];
    }
    stable
}
